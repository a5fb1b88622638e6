//! CLI wrapper for the moccaccino bridge.
//!
//! Usage:
//!   moccaccino <file>              # Execute a script file
//!   moccaccino -e "code"           # Evaluate a script
//!   moccaccino                     # Start REPL (interactive mode)
//!
//! The core native types are registered. A bridge config file is read from
//! `MOCCACCINO_CONFIG` when set; `RUST_LOG` controls logging.

use moccaccino::runner::ds::value::JsValue;
use moccaccino::runner::plugin::{Bridge, BridgeConfig, BridgeError, MemberCatalog, TypeRegistry};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

const CONFIG_ENV_VAR: &str = "MOCCACCINO_CONFIG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let bridge = match build_bridge() {
        Ok(bridge) => bridge,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match args.len() {
        1 => run_repl(&bridge),
        2 => {
            let arg = &args[1];
            if arg == "-h" || arg == "--help" {
                print_usage();
                process::exit(0);
            }
            run_file(&bridge, arg);
        }
        3 if args[1] == "-e" || args[1] == "--eval" => eval_code(&bridge, &args[2]),
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}

fn build_bridge() -> Result<Bridge, BridgeError> {
    let registry = TypeRegistry::with_core();
    let config = match env::var_os(CONFIG_ENV_VAR) {
        Some(path) => BridgeConfig::load(Path::new(&path))?,
        None => BridgeConfig::default(),
    };
    Ok(Bridge::builder()
        .with_config(&config, &MemberCatalog::with_core())?
        .build(registry))
}

fn print_usage() {
    eprintln!("moccaccino - lazy native-type bridge");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  moccaccino <file>              Execute a script file");
    eprintln!("  moccaccino -e \"code\"           Evaluate a script");
    eprintln!("  moccaccino --eval \"code\"       Evaluate a script");
    eprintln!("  moccaccino                     Start REPL (interactive mode)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {}              Path to a bridge config file (TOML)", CONFIG_ENV_VAR);
    eprintln!("  RUST_LOG                       Log filter, e.g. bridge=debug");
}

fn run_file(bridge: &Bridge, filename: &str) {
    let source = match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", filename, e);
            process::exit(1);
        }
    };
    if let Err(e) = bridge.evaluate(&source) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn eval_code(bridge: &Bridge, code: &str) {
    match bridge.evaluate(code) {
        Ok(value) => print_value(&value),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn print_value(value: &JsValue) {
    if !value.is_undefined() {
        println!("{}", value);
    }
}

fn run_repl(bridge: &Bridge) {
    println!("moccaccino v{}", env!("CARGO_PKG_VERSION"));
    println!("Type code and press Enter. Type .exit to quit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let input = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
            None => break, // EOF
        };
        let input = input.trim();

        if input == ".exit" || input == ".quit" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        match bridge.evaluate(input) {
            Ok(value) => print_value(&value),
            Err(e) => eprintln!("{}", e),
        }
    }

    println!("Goodbye!");
}

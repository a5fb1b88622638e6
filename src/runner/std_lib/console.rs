//! Console native type.
//!
//! Provides console.log, console.error, console.warn, and console.info. The
//! type declares its own script surface, so the bridge leaves it alone.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::realm::EvalContext;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::TypeRegistry;
use crate::runner::plugin::types::NativeType;

/// Register the console type with the registry.
pub fn register(registry: &mut TypeRegistry) {
    let console = NativeType::new("console")
        .exports_script_surface()
        .add_static_method("log", console_log)
        .add_static_method("error", console_error)
        .add_static_method("warn", console_warn)
        .add_static_method("info", console_info);

    registry.register_type(console);
}

/// Format all arguments for console output.
fn format_args(args: &[JsValue]) -> String {
    args.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// console.log - Log to stdout.
fn console_log(
    _ctx: &EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    println!("{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.error - Log to stderr.
fn console_error(
    _ctx: &EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    eprintln!("{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.warn - Log warning to stderr.
fn console_warn(
    _ctx: &EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    eprintln!("Warning: {}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.info - Log info to stdout.
fn console_info(
    _ctx: &EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    println!("{}", format_args(&args));
    Ok(JsValue::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::value::JsNumberType;

    #[test]
    fn test_format_args_joins_with_spaces() {
        let args = vec![
            JsValue::from("answer:"),
            JsValue::Number(JsNumberType::Integer(42)),
            JsValue::Null,
            JsValue::Undefined,
        ];
        assert_eq!(format_args(&args), "answer: 42 null undefined");
    }

    #[test]
    fn test_registers_self_describing_type() {
        let mut registry = TypeRegistry::new();
        register(&mut registry);
        let console = registry.get_type("console").unwrap();
        assert!(console.declares_script_surface());
        let names: Vec<&str> = console.static_methods().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["log", "error", "warn", "info"]);
    }
}

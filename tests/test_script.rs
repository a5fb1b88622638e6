extern crate moccaccino;

use moccaccino::parser::ScriptParser;
use moccaccino::runner::ds::error::JErrorType;
use moccaccino::runner::ds::heap::OBJECT_COST;
use moccaccino::runner::ds::realm::{ClassDefinition, ContextOptions, EvalContext, GlobalContext};
use moccaccino::runner::ds::object::JsObjectType;
use moccaccino::runner::ds::value::{JsNumberType, JsValue};
use moccaccino::runner::plugin::{NativeType, TypeRegistry};

fn context() -> GlobalContext {
    GlobalContext::create(None, ContextOptions::default())
}

#[test]
fn test_parse_error_is_syntax_error() {
    let ctx = context();
    match ctx.evaluate_script("var = 1") {
        Err(JErrorType::SyntaxError(message)) => assert!(message.contains("at line 1, column")),
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn test_program_ast_spans_whole_script() {
    let script = "var a = 1;\n/* block */ a";
    let program = ScriptParser::parse_to_ast_from_str(script).unwrap();
    assert_eq!(program.body.len(), 2);
    assert_eq!(program.meta.end_index, script.len());
}

#[test]
fn test_equality_operators() {
    let ctx = context();
    let cases = [
        ("1 === 1", true),
        ("1 === 1.0", true),
        ("'1' === 1", false),
        ("null == undefined", true),
        ("null === undefined", false),
        ("true !== false", true),
        ("'a' != 'a'", false),
        ("!null", true),
        ("!!'x'", true),
    ];
    for (code, expected) in cases.iter() {
        assert_eq!(
            ctx.evaluate_script(code).unwrap(),
            JsValue::Boolean(*expected),
            "{}",
            code
        );
    }
}

#[test]
fn test_typeof_values() {
    let ctx = context();
    let cases = [
        ("typeof 1", "number"),
        ("typeof 'x'", "string"),
        ("typeof true", "boolean"),
        ("typeof null", "object"),
        ("typeof undefined", "undefined"),
        ("typeof hasOwnProperty", "function"),
    ];
    for (code, expected) in cases.iter() {
        assert_eq!(ctx.evaluate_script(code).unwrap(), JsValue::from(*expected), "{}", code);
    }
}

#[test]
fn test_string_length() {
    let ctx = context();
    assert_eq!(
        ctx.evaluate_script("'héllo'.length").unwrap(),
        JsValue::Number(JsNumberType::Integer(5))
    );
}

fn constant_hook(
    _ctx: &EvalContext,
    _object: &JsObjectType,
    name: &str,
    _exception: &mut Option<JErrorType>,
) -> Option<JsValue> {
    if name == "answer" {
        Some(JsValue::Number(JsNumberType::Integer(42)))
    } else {
        None
    }
}

#[test]
fn test_hook_answers_script_identifiers() {
    let ctx = GlobalContext::create(
        Some(ClassDefinition::new("Answering").with_get_property(constant_hook)),
        ContextOptions::default(),
    );
    assert_eq!(ctx.class_name(), "Answering");
    assert_eq!(
        ctx.evaluate_script("answer === 42").unwrap(),
        JsValue::Boolean(true)
    );
    // An own global wins over the hook.
    assert_eq!(
        ctx.evaluate_script("var answer = 'own'; answer").unwrap(),
        JsValue::from("own")
    );
}

fn initialize_widget(
    ctx: &EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let size = args.into_iter().next().unwrap_or(JsValue::Undefined);
    ctx.set_property(&this, "size", size)?;
    Ok(JsValue::Undefined)
}

fn widget_area(
    ctx: &EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match ctx.get_property(&this, "size")? {
        JsValue::Number(n) => Ok(JsValue::Number(JsNumberType::Float(n.as_f64() * n.as_f64()))),
        _ => Err(JErrorType::TypeError("size is not a number".to_string())),
    }
}

#[test]
fn test_boxed_self_describing_type() {
    let ctx = context();
    let mut registry = TypeRegistry::new();
    let ty = registry.register_type(
        NativeType::new("Square")
            .exports_script_surface()
            .with_constructor(initialize_widget)
            .add_method("area", widget_area)
            .add_property("sides", JsValue::Number(JsNumberType::Integer(4))),
    );

    let before = ctx.heap_allocated();
    let class_value = ctx.wrap_native_type(&ty).unwrap();
    assert_eq!(ctx.heap_allocated() - before, 3 * OBJECT_COST);
    ctx.declare_global("Square", Some(class_value.clone())).unwrap();

    assert_eq!(
        ctx.evaluate_script("new Square(3).area()").unwrap(),
        JsValue::Number(JsNumberType::Float(9.0))
    );
    assert_eq!(
        ctx.evaluate_script("Square.sides").unwrap(),
        JsValue::Number(JsNumberType::Integer(4))
    );
    assert_eq!(ctx.evaluate_script("Square.name").unwrap(), JsValue::from("Square"));
    assert!(matches!(
        ctx.evaluate_script("Square()"),
        Err(JErrorType::TypeError(message)) if message.contains("without 'new'")
    ));
    assert_eq!(ctx.native_type_name(&class_value), Some("Square".to_string()));
    assert_eq!(ctx.wrap_native_type(&ty).unwrap(), class_value);
}

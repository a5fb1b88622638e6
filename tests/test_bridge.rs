extern crate moccaccino;

use moccaccino::runner::ds::error::JErrorType;
use moccaccino::runner::ds::heap::OBJECT_COST;
use moccaccino::runner::ds::object::JsObjectType;
use moccaccino::runner::ds::realm::{ContextLedger, EvalContext};
use moccaccino::runner::ds::value::JsValue;
use moccaccino::runner::plugin::{
    Bridge, BridgeConfig, MemberBinding, MemberCatalog, NativeType, TypeRegistry,
    DEFAULT_MARKER_ATTRIBUTE,
};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

fn widget_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::with_core();
    registry.register_type(NativeType::new("Widget"));
    registry
}

fn prototype_of(ctx: &EvalContext, class_value: &JsValue) -> JsObjectType {
    ctx.get_property(class_value, "prototype")
        .unwrap()
        .as_object()
        .cloned()
        .unwrap()
}

fn is_marked(prototype: &JsObjectType) -> bool {
    prototype
        .borrow()
        .get_own_property(DEFAULT_MARKER_ATTRIBUTE)
        .map(|desc| desc.value.is_truthy())
        .unwrap_or(false)
}

// ── Widget / Gadget / Object ─────────────────────────────────────────

#[test]
fn test_widget_gadget_object_scenario() {
    let shared = Rc::new(RefCell::new(widget_registry()));
    let bridge = Bridge::new(shared.clone());
    let ctx = bridge.context();

    // Object is ignored although the registry knows it.
    assert!(shared.borrow().has_type("Object"));
    assert!(bridge.is_ignored("Object"));
    assert_eq!(ctx.get_global("Object").unwrap(), JsValue::Undefined);

    // Reach Widget's class value through the engine first, without the hook.
    let widget_type = shared.borrow().get_type("Widget").unwrap();
    let boxed = ctx.wrap_native_type(&widget_type).unwrap();
    let prototype = prototype_of(ctx, &boxed);
    assert!(!is_marked(&prototype));

    let first = ctx.get_global("Widget").unwrap();
    assert_eq!(first, boxed);
    assert_eq!(first.type_of(), "function");
    assert!(is_marked(&prototype));
    let members_after_first = prototype.borrow().own_property_keys();
    assert_eq!(bridge.installation_count("Widget"), 1);

    let second = ctx.get_global("Widget").unwrap();
    assert_eq!(second, first);
    assert!(is_marked(&prototype));
    assert_eq!(prototype.borrow().own_property_keys(), members_after_first);
    assert_eq!(bridge.installation_count("Widget"), 1);

    // Unregistered: not handled, the engine answers undefined.
    assert_eq!(ctx.get_global("Gadget").unwrap(), JsValue::Undefined);
    assert_eq!(bridge.evaluate("typeof Gadget").unwrap(), JsValue::from("undefined"));
}

#[test]
fn test_script_sees_bridging_member() {
    let bridge = Bridge::new(widget_registry());
    assert_eq!(
        bridge.evaluate("var w = new Widget(); w.test()").unwrap(),
        JsValue::Undefined
    );
    assert_eq!(
        bridge.evaluate("typeof w.test").unwrap(),
        JsValue::from("function")
    );
    assert_eq!(
        bridge.evaluate("w.constructor === Widget").unwrap(),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_marker_is_hidden_and_read_only() {
    let bridge = Bridge::new(widget_registry());
    bridge.evaluate("Widget").unwrap();
    assert_eq!(
        bridge
            .evaluate("Widget.prototype.__moccaccino_bridged__ = false; Widget.prototype.__moccaccino_bridged__")
            .unwrap(),
        JsValue::Boolean(true)
    );
    let prototype = prototype_of(bridge.context(), &bridge.evaluate("Widget").unwrap());
    let desc = prototype
        .borrow()
        .get_own_property(DEFAULT_MARKER_ATTRIBUTE)
        .cloned()
        .unwrap();
    assert!(!desc.writable);
    assert!(!desc.enumerable);
}

#[test]
fn test_ignored_names_never_resolve() {
    let mut registry = widget_registry();
    registry.register_type(NativeType::new("Secret"));
    let bridge = Bridge::builder()
        .with_ignore(vec!["Object", "Secret"])
        .build(registry);
    assert_eq!(bridge.evaluate("typeof Secret").unwrap(), JsValue::from("undefined"));
    assert_eq!(bridge.evaluate("typeof Object").unwrap(), JsValue::from("undefined"));
    assert_eq!(bridge.installation_count("Secret"), 0);
}

#[test]
fn test_empty_ignore_set_exposes_object() {
    let bridge = Bridge::builder().with_ignore(Vec::<String>::new()).build(widget_registry());
    assert_eq!(bridge.evaluate("typeof Object").unwrap(), JsValue::from("function"));
    assert_eq!(
        bridge.evaluate("var o = new Object(); o.hasOwnProperty('x')").unwrap(),
        JsValue::Boolean(false)
    );
}

// ── Re-entrancy ──────────────────────────────────────────────────────

#[test]
fn test_reentrant_alias_installs_once() {
    let bridge = Bridge::builder()
        .with_member(MemberBinding::alias("kind", "Widget"))
        .build(widget_registry());

    assert_eq!(
        bridge.evaluate("Widget.prototype.kind === Widget").unwrap(),
        JsValue::Boolean(true)
    );
    assert_eq!(
        bridge.evaluate("new Widget().kind === Widget").unwrap(),
        JsValue::Boolean(true)
    );
    assert_eq!(bridge.installation_count("Widget"), 1);
}

#[test]
fn test_alias_to_related_type_augments_both() {
    let mut registry = widget_registry();
    registry.register_type(NativeType::new("Gadget"));
    let bridge = Bridge::builder()
        .with_member(MemberBinding::alias("peer", "Gadget"))
        .build(registry);

    // Widget's `peer` pulls in Gadget, whose own `peer` refers to itself.
    assert_eq!(
        bridge.evaluate("Widget.prototype.peer === Gadget").unwrap(),
        JsValue::Boolean(true)
    );
    assert_eq!(bridge.installation_count("Widget"), 1);
    assert_eq!(bridge.installation_count("Gadget"), 1);
    bridge.evaluate("Gadget; Gadget.prototype.peer; Widget").unwrap();
    assert_eq!(bridge.installation_count("Gadget"), 1);
}

// ── Self-describing types ────────────────────────────────────────────

#[test]
fn test_self_describing_type_is_never_marked() {
    let bridge = Bridge::new(widget_registry());
    for _ in 0..3 {
        assert_eq!(
            bridge.evaluate("typeof console.log").unwrap(),
            JsValue::from("function")
        );
    }
    assert_eq!(bridge.evaluate("console.info('hello', 1)").unwrap(), JsValue::Undefined);

    let console = bridge.evaluate("console").unwrap();
    let prototype = prototype_of(bridge.context(), &console);
    assert!(!is_marked(&prototype));
    assert_eq!(prototype.borrow().own_property_keys(), vec!["constructor"]);
    assert_eq!(bridge.evaluate("typeof console.prototype.test").unwrap(), JsValue::from("undefined"));
    assert_eq!(bridge.installation_count("console"), 0);
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn test_frozen_prototype_raises_in_script() {
    let shared = Rc::new(RefCell::new(widget_registry()));
    let bridge = Bridge::new(shared.clone());
    let widget_type = shared.borrow().get_type("Widget").unwrap();
    let class_value = bridge.context().wrap_native_type(&widget_type).unwrap();
    let prototype = prototype_of(bridge.context(), &class_value);
    prototype.borrow_mut().freeze();

    for _ in 0..2 {
        let err = bridge.evaluate("new Widget()").unwrap_err();
        assert_eq!(
            err,
            JErrorType::TypeError(format!(
                "Cannot define property {}, object is not extensible",
                DEFAULT_MARKER_ATTRIBUTE
            ))
        );
        assert!(!is_marked(&prototype));
    }
    assert_eq!(bridge.installation_count("Widget"), 0);
}

#[test]
fn test_failed_augmentation_is_retried_on_next_access() {
    let shared = Rc::new(RefCell::new(widget_registry()));
    shared.borrow_mut().register_type(NativeType::new("Peer"));
    let bridge = Bridge::builder()
        .with_member(MemberBinding::alias("peer", "Peer"))
        .build(shared.clone());

    // Peer cannot be augmented, so neither can Widget, which refers to it.
    let peer_type = shared.borrow().get_type("Peer").unwrap();
    let frozen_peer = bridge.context().wrap_native_type(&peer_type).unwrap();
    prototype_of(bridge.context(), &frozen_peer).borrow_mut().freeze();

    assert!(matches!(bridge.evaluate("Widget"), Err(JErrorType::TypeError(_))));
    let widget_type = shared.borrow().get_type("Widget").unwrap();
    let widget = bridge.context().wrap_native_type(&widget_type).unwrap();
    let widget_prototype = prototype_of(bridge.context(), &widget);
    assert!(!is_marked(&widget_prototype));
    assert_eq!(widget_prototype.borrow().own_property_keys(), vec!["constructor"]);

    // A fresh Peer descriptor gets a fresh, unfrozen class value.
    shared.borrow_mut().register_type(NativeType::new("Peer"));
    assert_eq!(bridge.evaluate("Widget === Widget.prototype.constructor").unwrap(), JsValue::Boolean(true));
    assert!(is_marked(&widget_prototype));
    assert_eq!(
        bridge.evaluate("Widget.prototype.peer === Peer").unwrap(),
        JsValue::Boolean(true)
    );
    assert_eq!(bridge.installation_count("Widget"), 1);
}

#[test]
fn test_boxing_failure_falls_back_to_undefined() {
    // Too small for a class value and its prototype.
    let bridge = Bridge::builder().with_heap_limit(64).build(widget_registry());
    assert_eq!(bridge.evaluate("typeof Widget").unwrap(), JsValue::from("undefined"));
    assert!(matches!(
        bridge.evaluate("new Widget()"),
        Err(JErrorType::TypeError(_))
    ));
    assert_eq!(bridge.installation_count("Widget"), 0);
}

// ── Instances and lifetime ───────────────────────────────────────────

#[test]
fn test_independent_bridges_share_nothing() {
    let first = Bridge::new(widget_registry());
    let second = Bridge::new(widget_registry());

    first.evaluate("Widget").unwrap();
    assert_eq!(first.installation_count("Widget"), 1);
    assert_eq!(second.installation_count("Widget"), 0);

    second.evaluate("Widget").unwrap();
    assert_eq!(second.installation_count("Widget"), 1);
    assert_ne!(
        first.evaluate("Widget").unwrap(),
        second.evaluate("Widget").unwrap()
    );
    assert_ne!(first.context().context_id(), second.context().context_id());
}

#[test]
fn test_root_scopes_released_with_bridges() {
    let ledger = ContextLedger::new();
    {
        let first = Bridge::builder().with_ledger(ledger.clone()).build(widget_registry());
        let second = Bridge::builder().with_ledger(ledger.clone()).build(widget_registry());
        first.evaluate("new Widget().test()").unwrap();
        second.evaluate("var w = new Widget(); w.kind = Widget").unwrap();
        assert_eq!(ledger.created(), 2);
        assert_eq!(ledger.live(), 2);
    }
    assert_eq!(ledger.created(), ledger.destroyed());
    assert_eq!(ledger.live(), 0);
}

#[test]
fn test_replaced_type_is_freed_with_bridge() {
    let shared = Rc::new(RefCell::new(widget_registry()));
    let bridge = Bridge::new(shared.clone());

    let old_class = Rc::downgrade(bridge.evaluate("Widget").unwrap().as_object().unwrap());
    shared.borrow_mut().register_type(NativeType::new("Widget"));
    let new_class = Rc::downgrade(bridge.evaluate("Widget").unwrap().as_object().unwrap());
    assert!(!Rc::ptr_eq(&old_class.upgrade().unwrap(), &new_class.upgrade().unwrap()));

    drop(bridge);
    assert!(old_class.upgrade().is_none());
    assert!(new_class.upgrade().is_none());
}

#[test]
fn test_script_cycles_are_freed_with_bridge() {
    let bridge = Bridge::new(widget_registry());
    let instance = Rc::downgrade(
        bridge
            .evaluate("var w = new Widget(); w.self = w; w.peer = Widget; w")
            .unwrap()
            .as_object()
            .unwrap(),
    );

    drop(bridge);
    assert!(instance.upgrade().is_none());
}

#[test]
fn test_dropped_instances_give_their_heap_back() {
    let mut registry = widget_registry();
    registry.register_type(NativeType::new("Gadget"));
    let bridge = Bridge::builder()
        .with_heap_limit(8 * OBJECT_COST)
        .build(registry);

    bridge.evaluate("new Widget()").unwrap();
    let settled = bridge.context().heap_allocated();
    for _ in 0..20 {
        bridge.evaluate("new Widget(); new Widget(); new Widget()").unwrap();
    }
    assert_eq!(bridge.context().heap_allocated(), settled);
    assert_eq!(bridge.evaluate("typeof Gadget").unwrap(), JsValue::from("function"));

    // Instances that are still reachable keep their charge.
    assert!(matches!(
        bridge.evaluate("var a = new Gadget(), b = new Gadget(), c = new Gadget()"),
        Err(JErrorType::RangeError(_))
    ));
}

#[test]
fn test_handle_after_bridge_drop_errors() {
    let bridge = Bridge::new(widget_registry());
    bridge.evaluate("Widget").unwrap();
    let handle = bridge.context().clone();
    drop(bridge);

    assert!(handle.is_released());
    assert!(handle.get_global("Widget").is_err());
    assert!(handle.evaluate_script("Widget").is_err());
}

#[test]
fn test_late_registration_is_visible() {
    let shared = Rc::new(RefCell::new(TypeRegistry::new()));
    let bridge = Bridge::new(shared.clone());
    assert_eq!(bridge.evaluate("typeof Late").unwrap(), JsValue::from("undefined"));

    shared.borrow_mut().register_type(NativeType::new("Late"));
    assert_eq!(bridge.evaluate("typeof Late").unwrap(), JsValue::from("function"));
}

#[test]
fn test_declared_global_shadows_native_type() {
    let bridge = Bridge::new(widget_registry());
    assert_eq!(
        bridge.evaluate("var Widget = 'mine'; Widget").unwrap(),
        JsValue::from("mine")
    );
    assert_eq!(bridge.installation_count("Widget"), 0);
}

// ── Configuration ────────────────────────────────────────────────────

#[test]
fn test_config_file_drives_bridge() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
marker = "__bridged__"
ignore = ["Object", "Gadget"]

[[members]]
name = "describe"
native = "describe"

[[members]]
name = "bridgeVersion"
value = "1.0"
"#
    )
    .unwrap();

    let config = BridgeConfig::load(file.path()).unwrap();
    let mut registry = widget_registry();
    registry.register_type(NativeType::new("Gadget"));
    let bridge = Bridge::builder()
        .with_config(&config, &MemberCatalog::with_core())
        .unwrap()
        .build(registry);

    assert_eq!(
        bridge.evaluate("new Widget().describe()").unwrap(),
        JsValue::from("[NativeType Widget]")
    );
    assert_eq!(
        bridge.evaluate("Widget.prototype.bridgeVersion").unwrap(),
        JsValue::from("1.0")
    );
    assert_eq!(
        bridge.evaluate("Widget.prototype.__bridged__").unwrap(),
        JsValue::Boolean(true)
    );
    assert_eq!(bridge.evaluate("typeof Widget.prototype.test").unwrap(), JsValue::from("undefined"));
    assert_eq!(bridge.evaluate("typeof Gadget").unwrap(), JsValue::from("undefined"));
}

#[test]
fn test_missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = BridgeConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().starts_with("Failed to read config file"));
}

#[test]
fn test_closure_member_from_catalog() {
    let mut catalog = MemberCatalog::with_core();
    catalog.register_closure("greet", |ctx, this, _args| {
        let name = ctx.native_type_name(&this).unwrap_or_default();
        Ok(JsValue::String(format!("hello from {}", name)))
    });
    let config = BridgeConfig::parse(
        r#"
        [[members]]
        name = "greet"
        native = "greet"
        "#,
    )
    .unwrap();
    let bridge = Bridge::builder()
        .with_config(&config, &catalog)
        .unwrap()
        .build(widget_registry());
    assert_eq!(
        bridge.evaluate("new Widget().greet()").unwrap(),
        JsValue::from("hello from Widget")
    );
}

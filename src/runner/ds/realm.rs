//! Global contexts: the engine's root scopes.
//!
//! A [`GlobalContext`] owns one global object plus the intrinsic prototypes,
//! the allocation heap, and the per-context cache of boxed native types.
//! Every object the context charges to its heap is also tracked weakly: its
//! bytes are given back once it is dropped, and releasing the context clears
//! whatever is still alive, which breaks reference cycles built by scripts or
//! left behind by replaced native types.
//! Native code never sees the owner directly; every callback receives an
//! [`EvalContext`], a cheap handle congruent with the owning context that stays
//! safe to use (and reports an error) after the context has been released.
//!
//! ## Property interception
//!
//! A context can be created from a [`ClassDefinition`] carrying a
//! `get_property` hook. The hook is a plain `fn` pointer, so it cannot capture
//! host state; a host recovers its state through the global object's private
//! slot instead (see [`JsObject::set_private`]).
//!
//! ```text
//! Global lookup order:
//! 1. Own property of the global object
//! 2. get_property hook            <- may answer, decline, or raise
//! 3. Prototype chain of the global object
//! 4. undefined
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use pest::error::LineColLocation;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::parser::ScriptParser;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{BuiltInFn, FunctionObject};
use crate::runner::ds::heap::{Heap, HeapConfig};
use crate::runner::ds::object::{get_property, put_value, JsObject, JsObjectType, ObjectKind};
use crate::runner::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::eval::statement::execute_program;
use crate::runner::plugin::types::NativeTypeRef;

/// Interception hook consulted when a global name is not an own property of
/// the global object.
///
/// Returning `None` without touching `exception` means "not handled": the
/// lookup continues along the global object's prototype chain. Setting
/// `exception` makes the lookup throw, whatever the return value.
pub type GetPropertyCallback = fn(
    ctx: &EvalContext,
    object: &JsObjectType,
    property_name: &str,
    exception: &mut Option<JErrorType>,
) -> Option<JsValue>;

/// Describes the class of a global object.
#[derive(Clone)]
pub struct ClassDefinition {
    pub class_name: String,
    pub get_property: Option<GetPropertyCallback>,
}

impl ClassDefinition {
    pub fn new(class_name: impl Into<String>) -> Self {
        ClassDefinition {
            class_name: class_name.into(),
            get_property: None,
        }
    }

    pub fn with_get_property(mut self, callback: GetPropertyCallback) -> Self {
        self.get_property = Some(callback);
        self
    }
}

impl Default for ClassDefinition {
    fn default() -> Self {
        Self::new("GlobalObject")
    }
}

#[derive(Debug, Default)]
struct LedgerCounts {
    created: Cell<usize>,
    destroyed: Cell<usize>,
}

/// Counts global contexts created and released. Share one ledger between
/// several contexts to check that none of them leaks.
#[derive(Debug, Clone, Default)]
pub struct ContextLedger {
    counts: Rc<LedgerCounts>,
}

impl ContextLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.counts.created.get()
    }

    pub fn destroyed(&self) -> usize {
        self.counts.destroyed.get()
    }

    pub fn live(&self) -> usize {
        self.created() - self.destroyed()
    }

    fn record_created(&self) {
        self.counts.created.set(self.created() + 1);
    }

    fn record_destroyed(&self) {
        self.counts.destroyed.set(self.destroyed() + 1);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub heap: HeapConfig,
    pub ledger: Option<ContextLedger>,
}

#[derive(Clone)]
struct Realm {
    global: JsObjectType,
    object_prototype: JsObjectType,
    function_prototype: JsObjectType,
}

struct ContextInner {
    id: Uuid,
    class_definition: ClassDefinition,
    realm: RefCell<Option<Realm>>,
    heap: RefCell<Heap>,
    wrappers: RefCell<HashMap<String, (NativeTypeRef, JsObjectType)>>,
    objects: RefCell<Vec<Weak<RefCell<JsObject>>>>,
    ledger: Option<ContextLedger>,
}

/// Handle to a global context, passed to native functions and hooks.
#[derive(Clone)]
pub struct EvalContext {
    inner: Rc<ContextInner>,
}

impl EvalContext {
    pub fn context_id(&self) -> String {
        self.inner.id.to_hyphenated().to_string()
    }

    pub fn class_name(&self) -> &str {
        &self.inner.class_definition.class_name
    }

    pub fn is_released(&self) -> bool {
        self.inner.realm.borrow().is_none()
    }

    fn realm(&self) -> Result<Realm, JErrorType> {
        self.inner
            .realm
            .borrow()
            .clone()
            .ok_or_else(|| JErrorType::TypeError("global context has been released".to_string()))
    }

    pub fn global_object(&self) -> Result<JsObjectType, JErrorType> {
        Ok(self.realm()?.global)
    }

    /// Bytes charged for objects that are still alive.
    pub fn heap_allocated(&self) -> usize {
        self.reclaim();
        self.inner.heap.borrow().get_allocated()
    }

    /// Gives back the bytes of tracked objects that have been dropped.
    fn reclaim(&self) {
        let mut objects = self.inner.objects.borrow_mut();
        let before = objects.len();
        objects.retain(|o| o.strong_count() > 0);
        let freed = before - objects.len();
        if freed > 0 {
            self.inner.heap.borrow_mut().deallocate_objects(freed);
            trace!(target: "engine", context = %self.inner.id, freed, "reclaimed objects");
        }
    }

    fn charge_objects(&self, count: usize) -> Result<(), JErrorType> {
        self.reclaim();
        self.inner.heap.borrow_mut().allocate_objects(count)
    }

    /// Every tracked object must have been charged exactly once.
    fn track(&self, object: &JsObjectType) {
        self.inner.objects.borrow_mut().push(Rc::downgrade(object));
    }

    pub fn new_object(&self) -> Result<JsObjectType, JErrorType> {
        let realm = self.realm()?;
        self.charge_objects(1)?;
        let object = JsObject::new_ordinary(Some(realm.object_prototype)).into_object_type();
        self.track(&object);
        Ok(object)
    }

    pub fn new_function(&self, name: &str, behavior: BuiltInFn) -> Result<JsValue, JErrorType> {
        let realm = self.realm()?;
        self.charge_objects(1)?;
        let func = make_function(name, behavior, &realm.function_prototype);
        self.track(&func);
        Ok(JsValue::Object(func))
    }

    /// Resolves an identifier against the global scope.
    pub fn get_global(&self, name: &str) -> Result<JsValue, JErrorType> {
        let global = self.global_object()?;
        let own = global
            .borrow()
            .get_own_property(name)
            .map(|desc| desc.value.clone());
        if let Some(value) = own {
            return Ok(value);
        }

        if let Some(hook) = self.inner.class_definition.get_property {
            trace!(target: "engine", name, "consulting get_property hook");
            let handle = self.clone();
            let mut exception = None;
            let answer = hook(&handle, &global, name, &mut exception);
            if let Some(error) = exception {
                return Err(error);
            }
            if let Some(value) = answer {
                return Ok(value);
            }
        }

        Ok(get_property(&global, name).unwrap_or(JsValue::Undefined))
    }

    /// `var name = value`.
    pub fn declare_global(&self, name: &str, value: Option<JsValue>) -> Result<(), JErrorType> {
        let global = self.global_object()?;
        let exists = global.borrow().has_own_property(name);
        match (exists, value) {
            (true, Some(value)) => {
                put_value(&global, name, value);
            }
            (true, None) => {}
            (false, value) => {
                let desc = PropertyDescriptor::with_attributes(
                    value.unwrap_or(JsValue::Undefined),
                    PropertyAttributes::DONT_DELETE,
                );
                if !global.borrow_mut().define_own_property(name, desc) {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot declare global variable '{}'",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Assignment to an identifier. Refused writes are ignored, as in sloppy mode.
    pub fn set_global(&self, name: &str, value: JsValue) -> Result<bool, JErrorType> {
        let global = self.global_object()?;
        Ok(put_value(&global, name, value))
    }

    pub fn get_property(&self, target: &JsValue, name: &str) -> Result<JsValue, JErrorType> {
        match target {
            JsValue::Object(o) => {
                let global = self.global_object()?;
                if Rc::ptr_eq(o, &global) {
                    self.get_global(name)
                } else {
                    Ok(get_property(o, name).unwrap_or(JsValue::Undefined))
                }
            }
            JsValue::String(s) if name == "length" => {
                Ok(JsValue::Number(JsNumberType::Integer(s.chars().count() as i64)))
            }
            JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
                "Cannot read property '{}' of {}",
                name, target
            ))),
            _ => Ok(JsValue::Undefined),
        }
    }

    pub fn set_property(
        &self,
        target: &JsValue,
        name: &str,
        value: JsValue,
    ) -> Result<bool, JErrorType> {
        match target {
            JsValue::Object(o) => Ok(put_value(o, name, value)),
            JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
                "Cannot set property '{}' of {}",
                name, target
            ))),
            _ => Ok(false),
        }
    }

    /// Defines an own property with host-chosen attributes, raising a
    /// `TypeError` when the object refuses the definition.
    pub fn define_property(
        &self,
        object: &JsObjectType,
        name: &str,
        value: JsValue,
        attributes: PropertyAttributes,
    ) -> Result<(), JErrorType> {
        let desc = PropertyDescriptor::with_attributes(value, attributes);
        let mut o = object.borrow_mut();
        if o.define_own_property(name, desc) {
            Ok(())
        } else if o.has_own_property(name) {
            Err(JErrorType::TypeError(format!("Cannot redefine property: {}", name)))
        } else {
            Err(JErrorType::TypeError(format!(
                "Cannot define property {}, object is not extensible",
                name
            )))
        }
    }

    pub fn delete_property(&self, object: &JsObjectType, name: &str) -> bool {
        object.borrow_mut().delete(name)
    }

    pub fn call(
        &self,
        callee: &JsValue,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        let behavior = match callee {
            JsValue::Object(o) => match o.borrow().kind() {
                ObjectKind::Function(f) => Some(f.behavior.clone()),
                ObjectKind::Class(ty) => {
                    return Err(JErrorType::TypeError(format!(
                        "Class constructor {} cannot be invoked without 'new'",
                        ty.name()
                    )))
                }
                _ => None,
            },
            _ => None,
        };
        match behavior {
            Some(behavior) => behavior.call(self, this, args),
            None => Err(JErrorType::TypeError(format!("{} is not a function", callee))),
        }
    }

    pub fn construct(&self, target: &JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        let class = match target {
            JsValue::Object(o) => o.clone(),
            _ => {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a constructor",
                    target
                )))
            }
        };
        let ty = match class.borrow().kind() {
            ObjectKind::Class(ty) => ty.clone(),
            _ => {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a constructor",
                    target
                )))
            }
        };
        let prototype = get_property(&class, "prototype").and_then(|p| p.as_object().cloned());
        self.realm()?;
        self.charge_objects(1)?;

        let instance = JsObject::new(ObjectKind::Instance(ty.clone()), prototype).into_object_type();
        self.track(&instance);
        let this = JsValue::Object(instance);
        if let Some(initializer) = ty.constructor() {
            let result = initializer.call(self, this.clone(), args)?;
            if let JsValue::Object(_) = result {
                return Ok(result);
            }
        }
        Ok(this)
    }

    /// Converts a native type into its class value for this context.
    ///
    /// The first call per type creates the class object and its prototype and
    /// charges them to the heap; later calls return the same class object. For a
    /// type that declares its own script surface the exported methods are
    /// installed here, by the engine. Fails only when the heap is exhausted.
    pub fn wrap_native_type(&self, ty: &NativeTypeRef) -> Result<JsValue, JErrorType> {
        if let Some(class) = self.cached_wrapper(ty) {
            return Ok(JsValue::Object(class));
        }
        let realm = self.realm()?;

        let exported = if ty.declares_script_surface() {
            ty.methods().len() + ty.static_methods().len()
        } else {
            0
        };
        if let Err(e) = self.charge_objects(2 + exported) {
            warn!(target: "engine", type_name = ty.name(), "cannot box native type: {}", e);
            return Err(e);
        }

        let prototype = JsObject::new(
            ObjectKind::Prototype(ty.name().to_string()),
            Some(realm.object_prototype.clone()),
        )
        .into_object_type();
        let class = JsObject::new(
            ObjectKind::Class(ty.clone()),
            Some(realm.function_prototype.clone()),
        )
        .into_object_type();
        self.track(&prototype);
        self.track(&class);

        {
            let mut c = class.borrow_mut();
            c.define_own_property(
                "prototype",
                PropertyDescriptor::with_attributes(
                    JsValue::Object(prototype.clone()),
                    PropertyAttributes::all(),
                ),
            );
            c.define_own_property(
                "name",
                PropertyDescriptor::with_attributes(
                    ty.name().into(),
                    PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_ENUM,
                ),
            );
            for (name, value) in ty.properties() {
                c.define_own_property(
                    name,
                    PropertyDescriptor::with_attributes(
                        value.clone(),
                        PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_DELETE,
                    ),
                );
            }
        }
        prototype.borrow_mut().define_own_property(
            "constructor",
            PropertyDescriptor::with_attributes(
                JsValue::Object(class.clone()),
                PropertyAttributes::DONT_ENUM,
            ),
        );

        if ty.declares_script_surface() {
            let methods = install_functions(&prototype, ty.methods(), &realm.function_prototype);
            let statics = install_functions(&class, ty.static_methods(), &realm.function_prototype);
            for func in methods.iter().chain(statics.iter()) {
                self.track(func);
            }
        }

        debug!(
            target: "engine",
            context = %self.inner.id,
            type_name = ty.name(),
            exported,
            "boxed native type"
        );
        // A replaced wrapper stays tracked until release; scripts may still hold it.
        self.inner
            .wrappers
            .borrow_mut()
            .insert(ty.name().to_string(), (ty.clone(), class.clone()));
        Ok(JsValue::Object(class))
    }

    fn cached_wrapper(&self, ty: &NativeTypeRef) -> Option<JsObjectType> {
        let wrappers = self.inner.wrappers.borrow();
        match wrappers.get(ty.name()) {
            Some((cached_ty, class)) if Rc::ptr_eq(cached_ty, ty) => Some(class.clone()),
            _ => None,
        }
    }

    /// Name of the native type behind a class value, one of its instances, or
    /// its prototype.
    pub fn native_type_name(&self, value: &JsValue) -> Option<String> {
        let mut current = value.as_object().cloned();
        while let Some(o) = current {
            let o_ref = o.borrow();
            match o_ref.kind() {
                ObjectKind::Class(ty) | ObjectKind::Instance(ty) => {
                    return Some(ty.name().to_string())
                }
                ObjectKind::Prototype(name) => return Some(name.clone()),
                _ => {}
            }
            let next = o_ref.get_prototype_of();
            drop(o_ref);
            current = next;
        }
        None
    }

    /// Parses and runs a script, returning the value of the last expression
    /// statement.
    pub fn evaluate_script(&self, source: &str) -> Result<JsValue, JErrorType> {
        let program = ScriptParser::parse_to_ast_from_str(source).map_err(|e| {
            let (line, column) = match &e.line_col {
                LineColLocation::Pos(start) | LineColLocation::Span(start, _) => *start,
            };
            JErrorType::SyntaxError(format!(
                "{} at line {}, column {}",
                e.variant.message(),
                line,
                column
            ))
        })?;
        execute_program(&program, self)
    }

    fn release(&self) {
        let realm = self.inner.realm.borrow_mut().take();
        let realm = match realm {
            Some(realm) => realm,
            None => return,
        };
        self.inner.wrappers.borrow_mut().clear();
        let live: Vec<JsObjectType> = self
            .inner
            .objects
            .borrow_mut()
            .drain(..)
            .filter_map(|o| o.upgrade())
            .collect();
        for object in &live {
            object.borrow_mut().clear();
        }
        realm.global.borrow_mut().clear();
        realm.object_prototype.borrow_mut().clear();
        realm.function_prototype.borrow_mut().clear();

        if let Some(ledger) = &self.inner.ledger {
            ledger.record_destroyed();
        }
        debug!(target: "engine", context = %self.inner.id, "global context released");
    }
}

fn make_function(name: &str, behavior: BuiltInFn, function_prototype: &JsObjectType) -> JsObjectType {
    let func = JsObject::new(
        ObjectKind::Function(FunctionObject::new(name, behavior)),
        Some(function_prototype.clone()),
    )
    .into_object_type();
    func.borrow_mut().define_own_property(
        "name",
        PropertyDescriptor::with_attributes(
            name.into(),
            PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_ENUM,
        ),
    );
    func
}

fn install_functions(
    target: &JsObjectType,
    functions: &[(String, BuiltInFn)],
    function_prototype: &JsObjectType,
) -> Vec<JsObjectType> {
    let mut installed = Vec::with_capacity(functions.len());
    for (name, behavior) in functions {
        let func = make_function(name, behavior.clone(), function_prototype);
        target.borrow_mut().define_own_property(
            name,
            PropertyDescriptor::with_attributes(
                JsValue::Object(func.clone()),
                PropertyAttributes::DONT_ENUM,
            ),
        );
        installed.push(func);
    }
    installed
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(
    _ctx: &EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let name = args.first().map(|a| a.to_string()).unwrap_or_default();
    Ok(JsValue::Boolean(match this {
        JsValue::Object(o) => o.borrow().has_own_property(&name),
        _ => false,
    }))
}

/// Object.prototype.toString
fn object_to_string(
    _ctx: &EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this.to_string()))
}

/// Owner of a root scope. Dropping it releases the context: the global object
/// and every object the context allocated that is still alive are cleared,
/// and outstanding [`EvalContext`] handles start failing with a `TypeError`.
pub struct GlobalContext {
    handle: EvalContext,
}

impl GlobalContext {
    pub fn create(class_definition: Option<ClassDefinition>, options: ContextOptions) -> Self {
        let object_prototype = JsObject::new_ordinary(None).into_object_type();
        let function_prototype =
            JsObject::new_ordinary(Some(object_prototype.clone())).into_object_type();
        install_functions(
            &object_prototype,
            &[
                (
                    "hasOwnProperty".to_string(),
                    BuiltInFn::Native(object_has_own_property),
                ),
                ("toString".to_string(), BuiltInFn::Native(object_to_string)),
            ],
            &function_prototype,
        );
        let global =
            JsObject::new(ObjectKind::Global, Some(object_prototype.clone())).into_object_type();

        let id = Uuid::new_v4();
        let class_definition = class_definition.unwrap_or_default();
        if let Some(ledger) = &options.ledger {
            ledger.record_created();
        }
        debug!(
            target: "engine",
            context = %id,
            class = %class_definition.class_name,
            intercepts = class_definition.get_property.is_some(),
            "global context created"
        );

        GlobalContext {
            handle: EvalContext {
                inner: Rc::new(ContextInner {
                    id,
                    class_definition,
                    realm: RefCell::new(Some(Realm {
                        global,
                        object_prototype,
                        function_prototype,
                    })),
                    heap: RefCell::new(Heap::new(options.heap)),
                    wrappers: RefCell::new(HashMap::new()),
                    objects: RefCell::new(Vec::new()),
                    ledger: options.ledger,
                }),
            },
        }
    }

    /// A handle for callbacks or for code that must not own the context.
    pub fn handle(&self) -> EvalContext {
        self.handle.clone()
    }
}

impl Deref for GlobalContext {
    type Target = EvalContext;

    fn deref(&self) -> &EvalContext {
        &self.handle
    }
}

impl Drop for GlobalContext {
    fn drop(&mut self) {
        self.handle.release();
    }
}

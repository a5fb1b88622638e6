//! Native type descriptors.

use std::rc::Rc;

use crate::runner::ds::function_object::{BuiltInFn, NativeFn};
use crate::runner::ds::value::JsValue;

pub type NativeTypeRef = Rc<NativeType>;

/// Describes one native type that can be exposed to scripts.
///
/// A type either declares its own script surface (its exported methods and
/// statics are installed by the engine when it is boxed) or it does not, in
/// which case the bridge augments its prototype with the configured members.
pub struct NativeType {
    name: String,
    declares_script_surface: bool,
    constructor: Option<BuiltInFn>,
    methods: Vec<(String, BuiltInFn)>,
    static_methods: Vec<(String, BuiltInFn)>,
    properties: Vec<(String, JsValue)>,
}

impl NativeType {
    pub fn new(name: impl Into<String>) -> Self {
        NativeType {
            name: name.into(),
            declares_script_surface: false,
            constructor: None,
            methods: Vec::new(),
            static_methods: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Mark the type as fully controlling its script-exported surface.
    pub fn exports_script_surface(mut self) -> Self {
        self.declares_script_surface = true;
        self
    }

    /// Add an exported instance method.
    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.push((name.into(), BuiltInFn::Native(func)));
        self
    }

    /// Add an exported static method.
    pub fn add_static_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.static_methods.push((name.into(), BuiltInFn::Native(func)));
        self
    }

    /// Add a static property; always visible on the class value.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    /// Set the initializer run by `new`.
    pub fn with_constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some(BuiltInFn::Native(constructor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declares_script_surface(&self) -> bool {
        self.declares_script_surface
    }

    pub fn constructor(&self) -> Option<&BuiltInFn> {
        self.constructor.as_ref()
    }

    pub fn methods(&self) -> &[(String, BuiltInFn)] {
        &self.methods
    }

    pub fn static_methods(&self) -> &[(String, BuiltInFn)] {
        &self.static_methods
    }

    pub fn properties(&self) -> &[(String, JsValue)] {
        &self.properties
    }
}

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::NativeTypeRef;

pub type JsObjectType = Rc<RefCell<JsObject>>;

pub enum ObjectKind {
    Ordinary,
    /// The root scope object. Only this kind carries a private slot.
    Global,
    Function(FunctionObject),
    /// A boxed native type: callable with `new`, exposes `prototype`.
    Class(NativeTypeRef),
    /// Prototype object created for the named native type.
    Prototype(String),
    Instance(NativeTypeRef),
}

pub struct JsObject {
    kind: ObjectKind,
    properties: HashMap<String, PropertyDescriptor>,
    prototype: Option<JsObjectType>,
    is_extensible: bool,
    private: Option<Weak<dyn Any>>,
}

impl JsObject {
    pub fn new(kind: ObjectKind, prototype: Option<JsObjectType>) -> Self {
        JsObject {
            kind,
            properties: HashMap::new(),
            prototype,
            is_extensible: true,
            private: None,
        }
    }

    pub fn new_ordinary(prototype: Option<JsObjectType>) -> Self {
        Self::new(ObjectKind::Ordinary, prototype)
    }

    pub fn into_object_type(self) -> JsObjectType {
        Rc::new(RefCell::new(self))
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_) | ObjectKind::Class(_))
    }

    pub fn get_prototype_of(&self) -> Option<JsObjectType> {
        self.prototype.clone()
    }

    pub fn is_extensible(&self) -> bool {
        self.is_extensible
    }

    pub fn prevent_extensions(&mut self) -> bool {
        self.is_extensible = false;
        true
    }

    /// Makes every own property read-only and non-configurable and stops
    /// new properties from being added.
    pub fn freeze(&mut self) {
        self.prevent_extensions();
        for desc in self.properties.values_mut() {
            desc.writable = false;
            desc.configurable = false;
        }
    }

    pub fn get_own_property(&self, property: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(property)
    }

    pub fn has_own_property(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    /// Returns `false` when the definition is rejected: a new property on a
    /// non-extensible object, or an incompatible change to a non-configurable one.
    pub fn define_own_property(&mut self, property: &str, descriptor: PropertyDescriptor) -> bool {
        match self.properties.get(property) {
            Some(current) if !current.configurable => {
                if *current == descriptor {
                    return true;
                }
                let only_value_or_lock = current.writable
                    && !descriptor.configurable
                    && current.enumerable == descriptor.enumerable;
                if !only_value_or_lock {
                    return false;
                }
            }
            Some(_) => {}
            None => {
                if !self.is_extensible {
                    return false;
                }
            }
        }
        self.properties.insert(property.to_string(), descriptor);
        true
    }

    pub fn delete(&mut self, property: &str) -> bool {
        match self.properties.get(property) {
            None => true,
            Some(pd) => {
                if pd.configurable {
                    self.properties.remove(property);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Own property names in a stable (sorted) order.
    pub fn own_property_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.properties.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn set_private(&mut self, data: Option<Weak<dyn Any>>) -> bool {
        match self.kind {
            ObjectKind::Global => {
                self.private = data;
                true
            }
            _ => false,
        }
    }

    pub fn get_private(&self) -> Option<Weak<dyn Any>> {
        self.private.clone()
    }

    /// Drops every outgoing reference so that reference cycles through this
    /// object (e.g. `prototype.constructor`) can be reclaimed.
    pub(crate) fn clear(&mut self) {
        self.properties.clear();
        self.prototype = None;
        self.private = None;
    }
}

/// Looks up `property` on `object` and then along its prototype chain.
pub fn find_property(object: &JsObjectType, property: &str) -> Option<PropertyDescriptor> {
    let mut current = Some(object.clone());
    while let Some(o) = current {
        let o_ref = o.borrow();
        if let Some(desc) = o_ref.get_own_property(property) {
            return Some(desc.clone());
        }
        let next = o_ref.get_prototype_of();
        drop(o_ref);
        current = next;
    }
    None
}

pub fn get_property(object: &JsObjectType, property: &str) -> Option<JsValue> {
    find_property(object, property).map(|desc| desc.value)
}

/// Ordinary [[Set]] for data properties. Returns `false` when the write is
/// refused (read-only own or inherited property, or a non-extensible object).
pub fn put_value(object: &JsObjectType, property: &str, value: JsValue) -> bool {
    {
        let mut o = object.borrow_mut();
        if let Some(desc) = o.properties.get_mut(property) {
            return if desc.writable {
                desc.value = value;
                true
            } else {
                false
            };
        }
    }
    let prototype = object.borrow().get_prototype_of();
    if let Some(p) = prototype {
        if let Some(inherited) = find_property(&p, property) {
            if !inherited.writable {
                return false;
            }
        }
    }
    object
        .borrow_mut()
        .define_own_property(property, PropertyDescriptor::new_default(value))
}

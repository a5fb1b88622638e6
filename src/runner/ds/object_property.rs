use bitflags::bitflags;

use crate::runner::ds::value::JsValue;

bitflags! {
    /// Attributes applied when a host defines a property on an engine object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyAttributes: u8 {
        const READ_ONLY = 0b0001;
        const DONT_ENUM = 0b0010;
        const DONT_DELETE = 0b0100;
    }
}

impl Default for PropertyAttributes {
    fn default() -> Self {
        PropertyAttributes::empty()
    }
}

/// A data property. The engine has no accessor properties: every read is a
/// plain value lookup, which keeps prototype walks free of script callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyDescriptor {
    /// Descriptor for properties created by ordinary assignment.
    pub fn new_default(value: JsValue) -> Self {
        PropertyDescriptor {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    pub fn with_attributes(value: JsValue, attributes: PropertyAttributes) -> Self {
        PropertyDescriptor {
            value,
            writable: !attributes.contains(PropertyAttributes::READ_ONLY),
            enumerable: !attributes.contains(PropertyAttributes::DONT_ENUM),
            configurable: !attributes.contains(PropertyAttributes::DONT_DELETE),
        }
    }

    pub fn attributes(&self) -> PropertyAttributes {
        let mut attributes = PropertyAttributes::empty();
        if !self.writable {
            attributes |= PropertyAttributes::READ_ONLY;
        }
        if !self.enumerable {
            attributes |= PropertyAttributes::DONT_ENUM;
        }
        if !self.configurable {
            attributes |= PropertyAttributes::DONT_DELETE;
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_round_trip_through_descriptor() {
        let attrs = PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_ENUM;
        let desc = PropertyDescriptor::with_attributes(JsValue::Boolean(true), attrs);
        assert!(!desc.writable);
        assert!(!desc.enumerable);
        assert!(desc.configurable);
        assert_eq!(desc.attributes(), attrs);
    }
}

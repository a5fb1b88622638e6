use tracing::warn;

use crate::runner::ds::realm::EvalContext;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::NativeTypeRef;

/// Converts native types into class values using the engine's wrapping facility.
#[derive(Debug, Default)]
pub struct TypeBoxer;

impl TypeBoxer {
    pub fn new() -> Self {
        TypeBoxer
    }

    /// `None` when the engine cannot represent the type; callers treat that
    /// the same as a resolution miss.
    pub fn box_type(&self, ctx: &EvalContext, ty: &NativeTypeRef) -> Option<JsValue> {
        match ctx.wrap_native_type(ty) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(target: "bridge", type_name = ty.name(), "boxing failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::heap::HeapConfig;
    use crate::runner::ds::realm::{ContextOptions, GlobalContext};
    use crate::runner::plugin::types::NativeType;
    use std::rc::Rc;

    #[test]
    fn test_box_is_stable_per_context() {
        let ctx = GlobalContext::create(None, ContextOptions::default());
        let ty = Rc::new(NativeType::new("Widget"));
        let boxer = TypeBoxer::new();

        let first = boxer.box_type(&ctx, &ty).unwrap();
        let second = boxer.box_type(&ctx, &ty).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.type_of(), "function");
    }

    #[test]
    fn test_box_fails_on_exhausted_heap() {
        let ctx = GlobalContext::create(
            None,
            ContextOptions {
                heap: HeapConfig::with_limit(0),
                ledger: None,
            },
        );
        let ty = Rc::new(NativeType::new("Widget"));
        assert!(TypeBoxer::new().box_type(&ctx, &ty).is_none());
    }
}

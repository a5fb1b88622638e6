//! The global property hook: lazy exposure of native types.
//!
//! The bridge installs [`intercept_global_get`] as the `get_property` hook of
//! its global context. The engine calls it for every global name that is not
//! an own property of the global object:
//!
//! ```text
//! JavaScript: new Widget().test()
//!      ↓
//! 1. Global object has no own "Widget"   → engine calls the hook
//! 2. Recover the bridge from the global object's private slot
//! 3. TypeResolver: "Widget" → native type (ignore set checked first)
//! 4. TypeBoxer: native type → class value (cached by the engine)
//! 5. PrototypeAugmenter: install bridging members, once per prototype
//! 6. Hand the class value back to the engine
//! ```
//!
//! A miss at step 3 or 4 returns `None`, which lets the engine continue with
//! its normal lookup; it does not assert that the name is undefined. Only
//! engine errors raised while augmenting are reported, through the exception
//! slot.
//!
//! ## Back-reference
//!
//! Hooks are plain function pointers and capture nothing, so the bridge stores
//! a `Weak` reference to its state in the global object's private slot. The
//! hook upgrades it for the duration of one call only and never stores the
//! result; the engine alone decides how long the global object lives. A
//! reference that no longer upgrades (the bridge is gone) is logged and
//! treated as "not handled".

use std::rc::Rc;

use tracing::{debug, warn};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::realm::EvalContext;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::augmenter::PrototypeAugmenter;
use crate::runner::plugin::boxer::TypeBoxer;
use crate::runner::plugin::resolver::TypeResolver;

/// Bridge state reachable from the global object's private slot.
pub(crate) struct BridgeState {
    pub(crate) resolver: TypeResolver,
    pub(crate) boxer: TypeBoxer,
    pub(crate) augmenter: PrototypeAugmenter,
}

impl BridgeState {
    fn resolve_global(
        &self,
        ctx: &EvalContext,
        name: &str,
        exception: &mut Option<JErrorType>,
    ) -> Option<JsValue> {
        let ty = self.resolver.resolve(name)?;
        let class_value = self.boxer.box_type(ctx, &ty)?;
        if ty.declares_script_surface() {
            debug!(target: "bridge", name, "exposed self-describing type");
            return Some(class_value);
        }

        let outcome = prototype_of(ctx, &class_value)
            .and_then(|prototype| self.augmenter.ensure_augmented(ctx, &prototype, &ty));
        match outcome {
            Ok(augmentation) => {
                debug!(target: "bridge", name, ?augmentation, "exposed native type");
                Some(class_value)
            }
            Err(e) => {
                *exception = Some(e);
                None
            }
        }
    }
}

fn prototype_of(ctx: &EvalContext, class_value: &JsValue) -> Result<JsObjectType, JErrorType> {
    match ctx.get_property(class_value, "prototype")? {
        JsValue::Object(prototype) => Ok(prototype),
        other => Err(JErrorType::TypeError(format!(
            "prototype of {} is {}, not an object",
            class_value, other
        ))),
    }
}

/// Borrows the bridge state behind `global`'s private slot, if it is still alive.
fn recover_bridge(global: &JsObjectType) -> Option<Rc<BridgeState>> {
    let private = global.borrow().get_private()?;
    private.upgrade()?.downcast::<BridgeState>().ok()
}

/// `get_property` hook of a bridge's global context.
pub(crate) fn intercept_global_get(
    ctx: &EvalContext,
    global: &JsObjectType,
    property_name: &str,
    exception: &mut Option<JErrorType>,
) -> Option<JsValue> {
    match recover_bridge(global) {
        Some(state) => state.resolve_global(ctx, property_name, exception),
        None => {
            warn!(
                target: "bridge",
                context = %ctx.context_id(),
                name = property_name,
                "global object has no live bridge; lookup not handled"
            );
            None
        }
    }
}

use anyhow::Result;

use crate::models::Context;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Looks up what is on screen for a captured event. Implemented by the
/// platform accessibility layer.
///
/// Lookups run inside input callbacks, so implementations must be quick.
/// They may fail (the element can vanish mid-query); callers degrade the
/// failure to an empty context.
pub trait ContextResolver: Send + Sync {
    /// Control, window and process under a screen point.
    fn resolve_at(&self, x: u32, y: u32) -> Result<Context>;

    /// Control, window and process that currently has keyboard focus.
    fn resolve_focused(&self) -> Result<Context>;
}

/// Resolver for platforms without an accessibility layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl ContextResolver for NullResolver {
    fn resolve_at(&self, _x: u32, _y: u32) -> Result<Context> {
        Ok(Context::default())
    }

    fn resolve_focused(&self) -> Result<Context> {
        Ok(Context::default())
    }
}

/// Where a context lookup should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget {
    Point { x: u32, y: u32 },
    Focused,
}

/// Resolve a context, turning any failure into an empty context.
pub fn resolve_or_empty(resolver: &dyn ContextResolver, target: LookupTarget) -> Context {
    let result = match target {
        LookupTarget::Point { x, y } => resolver.resolve_at(x, y),
        LookupTarget::Focused => resolver.resolve_focused(),
    };

    match result {
        Ok(context) => context,
        Err(err) => {
            log_warn!("context lookup for {target:?} failed: {err:#}");
            Context::default()
        }
    }
}

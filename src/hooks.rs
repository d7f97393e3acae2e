//! Version-gated update hooks.
//!
//! Hooks run after the first caching pass and before the structural merge,
//! in registration order. Each one decides for itself whether it applies
//! (usually by comparing [`version_to_int`] values against thresholds) and
//! may then do anything to the context: edit cached documents, rewrite files
//! on disk, change the tracked file list.
//!
//! The cache is not refreshed between hooks. A hook that writes a file and
//! wants the cached copy to match must call
//! [`UpdateContext::reload`] itself. The pipeline reloads everything once all
//! hooks have run.

use log::{debug, info};

use crate::context::UpdateContext;
use crate::document::{Document, TomlDocument};
use crate::error::{HookError, UpdateError};

/// A version-specific transformation.
pub trait UpdateHook<D: Document = TomlDocument> {
    /// Name used in logs, errors and reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether this hook should run for the current pass.
    fn applies(&self, ctx: &UpdateContext<D>) -> bool;

    /// Perform the transformation.
    fn apply(&self, ctx: &mut UpdateContext<D>) -> Result<(), HookError>;
}

/// An [`UpdateHook`] built from two closures. See [`hook_fn`].
pub struct FnHook<A, F> {
    name: String,
    applies: A,
    apply: F,
}

/// Build a hook from an `applies` predicate and an `apply` procedure.
pub fn hook_fn<D, A, F>(name: &str, applies: A, apply: F) -> FnHook<A, F>
where
    D: Document,
    A: Fn(&UpdateContext<D>) -> bool,
    F: Fn(&mut UpdateContext<D>) -> Result<(), HookError>,
{
    FnHook {
        name: name.to_string(),
        applies,
        apply,
    }
}

impl<D, A, F> UpdateHook<D> for FnHook<A, F>
where
    D: Document,
    A: Fn(&UpdateContext<D>) -> bool,
    F: Fn(&mut UpdateContext<D>) -> Result<(), HookError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn applies(&self, ctx: &UpdateContext<D>) -> bool {
        (self.applies)(ctx)
    }

    fn apply(&self, ctx: &mut UpdateContext<D>) -> Result<(), HookError> {
        (self.apply)(ctx)
    }
}

/// Run every applicable hook in order, stopping at the first failure.
///
/// Returns the names of the hooks that applied.
pub fn run_hooks<D: Document>(
    hooks: &[Box<dyn UpdateHook<D>>],
    ctx: &mut UpdateContext<D>,
) -> Result<Vec<String>, UpdateError> {
    let mut applied = Vec::new();
    for hook in hooks {
        if !hook.applies(ctx) {
            debug!("Skipping update hook {}", hook.name());
            continue;
        }
        info!("Running update hook {}", hook.name());
        hook.apply(ctx).map_err(|source| UpdateError::HookFailed {
            hook: hook.name().to_string(),
            source,
        })?;
        applied.push(hook.name().to_string());
    }
    Ok(applied)
}

/// Turn a dotted version into an integer by dropping the dots.
///
/// `"1.10.0"` becomes `1100`. This is not a semantic version comparison:
/// multi-digit components make the result ambiguous (`"1.15"` → `115` sorts
/// above `"1.2.0"` → `120` only by accident of length). Hooks written
/// against these numbers depend on exactly this behavior.
pub fn version_to_int(version: &str) -> Result<i64, UpdateError> {
    version
        .replace('.', "")
        .parse()
        .map_err(|source| UpdateError::InvalidVersion {
            version: version.to_string(),
            source,
        })
}

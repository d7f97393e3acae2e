//! Structural merge of a disk document against its bundled reference.
//!
//! Two independent passes, each enabled by its own flag:
//!
//! 1. **Merge-missing**: every path in the reference that the disk document
//!    lacks is copied over with its value, leading comments and inline
//!    comments. A missing subtree is copied whole, so its children are not
//!    visited separately.
//! 2. **Delete-unknown**: every path in the disk document that the reference
//!    lacks is unset, comments included. The path list is captured before the
//!    first removal.
//!
//! Paths present in both documents are never touched, whatever their values.
//! A reference path whose disk-side ancestor is a leaf value (the user turned
//! a section into a scalar) is skipped rather than clobbering that value.

use log::{debug, info};

use crate::context::UpdateContext;
use crate::document::{Document, PATH_SEPARATOR};
use crate::error::UpdateError;
use crate::report::FileReport;
use crate::settings::UpdateSettings;

/// Which merge passes run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub merge_missing: bool,
    pub delete_unknown: bool,
}

impl From<&UpdateSettings> for MergeOptions {
    fn from(settings: &UpdateSettings) -> Self {
        Self {
            merge_missing: settings.merge_missing_nodes,
            delete_unknown: settings.delete_unknown_nodes,
        }
    }
}

/// Paths changed by [`merge_document`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Merge `reference` into `disk` in place.
pub fn merge_document<D: Document>(
    disk: &mut D,
    reference: &D,
    options: MergeOptions,
) -> MergeReport {
    merge_document_keeping(disk, reference, options, &[])
}

/// [`merge_document`], except that delete-unknown leaves the `kept` paths,
/// their ancestors and their descendants alone.
pub(crate) fn merge_document_keeping<D: Document>(
    disk: &mut D,
    reference: &D,
    options: MergeOptions,
    kept: &[&str],
) -> MergeReport {
    let mut report = MergeReport::default();

    if options.merge_missing {
        for path in reference.all_paths(true) {
            if disk.has_path(&path) {
                continue;
            }
            if let Some(blocker) = leaf_ancestor(disk, &path) {
                debug!("Not adding {path}: {blocker} is a value on disk");
                continue;
            }
            let Some(value) = reference.get(&path) else {
                continue;
            };
            disk.set(&path, value.clone());
            disk.set_leading_comments(&path, &reference.leading_comments(&path));
            disk.set_inline_comments(&path, &reference.inline_comments(&path));
            debug!("Added {path}");
            report.added.push(path);
        }
    }

    if options.delete_unknown {
        let snapshot = disk.all_paths(true);
        for path in snapshot {
            // An earlier removal may already have taken this path's parent.
            if reference.has_path(&path) || !disk.has_path(&path) {
                continue;
            }
            if kept.iter().any(|k| on_same_branch(&path, k)) {
                debug!("Keeping {path}");
                continue;
            }
            disk.unset(&path);
            debug!("Removed {path}");
            report.removed.push(path);
        }
    }

    report
}

/// The nearest ancestor of `path` that exists in `doc` as a leaf value.
fn leaf_ancestor<'p, D: Document>(doc: &D, path: &'p str) -> Option<&'p str> {
    path.match_indices(PATH_SEPARATOR)
        .map(|(i, _)| &path[..i])
        .find(|ancestor| doc.has_path(ancestor) && !doc.is_section(ancestor))
}

/// True when one path is the other or lies beneath it.
fn on_same_branch(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long.strip_prefix(short)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(PATH_SEPARATOR))
}

/// Merge every cached tracked file and persist the ones that changed.
///
/// Files without an on-disk copy, or without a bundled reference, are
/// skipped. When version rewriting is enabled, the primary settings file
/// gets the target version re-asserted and is always persisted.
pub(crate) fn merge_files<D: Document>(
    ctx: &mut UpdateContext<D>,
) -> Result<Vec<FileReport>, UpdateError> {
    let options = MergeOptions::from(ctx.settings());
    let mark_version = ctx.settings().update_config_version;
    let version_key = ctx.settings().version_key.clone();
    let target = ctx.target_version().to_string();

    let mut reports = Vec::new();
    for name in ctx.resolved_files() {
        if !ctx.storage().exists(&name) {
            continue;
        }
        let version_marked = mark_version && ctx.is_settings_file(&name);
        let Some((disk, reference)) = ctx.cache_mut().pair_mut(&name) else {
            debug!("Skipping {name}: nothing to merge against");
            continue;
        };

        info!("Trying to update {name}");
        let kept = if version_marked {
            vec![version_key.as_str()]
        } else {
            Vec::new()
        };
        let merged = merge_document_keeping(disk, reference, options, &kept);
        if version_marked {
            disk.set_str(&version_key, &target);
        }

        let written = merged.changed() || version_marked;
        if written {
            let text = disk.persist();
            ctx.storage().write(&name, &text)?;
            info!("Updated {name}");
        } else {
            info!("No changes in {name}, skipping");
        }

        reports.push(FileReport {
            name,
            added: merged.added,
            removed: merged.removed,
            version_marked,
            written,
        });
    }
    Ok(reports)
}

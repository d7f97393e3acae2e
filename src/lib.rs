//! Version-gated, comment-preserving updates of on-disk config files.
//!
//! Applications ship default config files and users edit their copies. When
//! a new release adds keys, drops keys or reshapes a section, the user's copy
//! has to catch up without losing the values and comments they wrote.
//! Confmend does that catching up: it notices the version changed, backs up
//! the old files, runs your migration hooks, and then structurally merges
//! each file against the copy bundled with the new release.
//!
//! ```ignore
//! let mut updater = ConfigUpdater::builder()
//!     .storage(FsStorage::new(data_dir).with_resources(BundledResources::Dir(defaults_dir)))
//!     .files(["config", "messages_%lang%"])
//!     .placeholder("%lang%", "language")
//!     .current_version(&stored_version)
//!     .target_version(env!("CARGO_PKG_VERSION"))
//!     .merge_missing_nodes(true)
//!     .delete_unknown_nodes(true)
//!     .hook(hook_fn("rename-port", |ctx| ctx.current_version_number().is_ok_and(|v| v < 200), rename_port))
//!     .build()?;
//!
//! let outcome = updater.update()?;
//! println!("{outcome}");
//! ```
//!
//! # The update pass
//!
//! [`ConfigUpdater::update`] walks a fixed sequence of stages, visible
//! through [`UpdateState`]:
//!
//! ```text
//! Idle → VersionGate → BackingUp → Caching → RunningHooks
//!      → RewritingVersion (optional) → ReCaching → Merging → Done
//! ```
//!
//! - **Version gate.** If the stored and target versions match after
//!   Unicode lowercasing, the pass stops here. Nothing is read, copied or
//!   written.
//! - **Backup.** Each tracked file present on disk is copied to
//!   `backup-<epoch millis>/<name>`. A failed copy aborts the pass before
//!   anything destructive happens.
//! - **Caching.** Disk documents and their bundled references are parsed
//!   into a [`DocumentCache`]. Files absent on disk are simply not tracked
//!   this pass.
//! - **Hooks.** Every [`UpdateHook`] whose `applies` returns true runs, in
//!   registration order, with mutable access to the [`UpdateContext`].
//! - **Version rewrite.** With `update_config_version`, the target version
//!   is written into the primary settings file (`config.toml` by default).
//! - **Re-caching.** Everything is parsed again so hook edits on disk are
//!   seen by the merge.
//! - **Merge.** See below. Files that end up unchanged are not rewritten.
//!
//! Any error leaves the updater in [`UpdateState::Failed`] and is returned
//! as an [`UpdateError`]. There is no rollback; the backup is the way back.
//!
//! # Structural merge
//!
//! [`merge_document`] compares a disk document with its reference by dotted
//! path (`server.port`) and never looks at values of paths both sides share.
//! Two flags control it:
//!
//! - **`merge_missing_nodes`** copies every reference path the disk copy
//!   lacks, value and comments together. Whole missing sections come over
//!   in one piece.
//! - **`delete_unknown_nodes`** removes every disk path the reference lacks,
//!   comments included.
//!
//! User values always win and merging twice gives the same result as merging
//! once. Arrays are leaves: they are copied or kept whole, never diffed.
//!
//! # Documents
//!
//! The merge and the pipeline work against the [`Document`] trait. The
//! provided [`TomlDocument`] sits on `toml_edit`, so formatting and comments
//! of keys the update does not touch come out exactly as they went in.
//!
//! # Tracked files and placeholders
//!
//! Tracked files are named without extension, optionally with placeholder
//! tokens. With `.placeholder("%lang%", "language")`, the template
//! `messages_%lang%` resolves to `messages_en.toml` when the `language` key
//! of `config.toml` is `"en"`. A [`variable_resolver`](ConfigUpdaterBuilder::variable_resolver)
//! can supply variables from elsewhere.
//!
//! # Settings
//!
//! The updater's knobs live in [`UpdateSettings`], a confique struct. Load
//! them from your own TOML file with [`UpdateSettings::from_file`], or set
//! them one by one on the builder.
//!
//! # Logging
//!
//! Stage boundaries are logged at `info` through the [`log`] facade
//! ("Backed up old files to ...", "Trying to update ...", "Updated ...",
//! "No changes in ..., skipping"), per-path merge decisions at `debug`.
//! Install any logger you like; without one the output is dropped.

pub mod error;
pub mod types;

mod backup;
mod builder;
mod cache;
mod context;
mod document;
mod hooks;
mod merge;
mod report;
mod settings;
mod storage;

#[cfg(test)]
mod fixtures;

pub use backup::Backup;
pub use builder::{ConfigUpdater, ConfigUpdaterBuilder};
pub use cache::DocumentCache;
pub use context::UpdateContext;
pub use document::{Document, PATH_SEPARATOR, TomlDocument};
pub use error::{HookError, UpdateError};
pub use hooks::{FnHook, UpdateHook, hook_fn, version_to_int};
pub use merge::{MergeOptions, MergeReport, merge_document};
pub use report::{FileReport, UpdateOutcome, UpdateReport};
pub use settings::UpdateSettings;
pub use storage::{BundledResources, FsStorage, Storage};
pub use types::{Placeholder, UpdateState, VariableSource};

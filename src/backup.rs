//! Pre-update backups of tracked files.
//!
//! Every tracked file that exists on disk is copied to
//! `{backup_prefix}-{pass start millis}/{resolved name}` before anything is
//! mutated. A failed copy aborts the pass: nothing destructive runs without
//! a backup.

use log::{debug, info};

use crate::context::UpdateContext;
use crate::document::Document;
use crate::error::UpdateError;

/// Files copied by [`backup_files`] and where they went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub dir: String,
    pub files: Vec<String>,
}

/// Name of the backup directory for a pass started at `started_at` millis.
pub fn backup_dir_name(prefix: &str, started_at: i64) -> String {
    format!("{prefix}-{started_at}")
}

pub fn backup_files<D: Document>(ctx: &UpdateContext<D>) -> Result<Backup, UpdateError> {
    let dir = backup_dir_name(&ctx.settings().backup_prefix, ctx.started_at());
    let mut files = Vec::new();

    for name in ctx.resolved_files() {
        if !ctx.storage().exists(&name) {
            debug!("Not backing up {name}: no file on disk");
            continue;
        }
        ctx.storage().copy(&name, &format!("{dir}/{name}"))?;
        files.push(name);
    }

    info!("Backed up old files to {dir}");
    Ok(Backup { dir, files })
}

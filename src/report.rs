//! Results of an update pass, returned to the caller for display.

use std::fmt;

/// What [`update()`](crate::ConfigUpdater::update) did.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Stored and target versions match; nothing was touched.
    UpToDate { version: String },
    /// A full pass ran.
    Updated(UpdateReport),
}

/// Summary of a completed pass.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub from_version: String,
    pub to_version: String,
    /// Logical directory holding this pass's backups.
    pub backup_dir: String,
    /// Resolved names of the files copied into `backup_dir`.
    pub backed_up: Vec<String>,
    /// Names of the hooks that applied, in run order.
    pub hooks_applied: Vec<String>,
    /// Whether the version rewrite stage wrote the primary settings file.
    pub version_rewritten: bool,
    /// One entry per merged file.
    pub files: Vec<FileReport>,
}

/// Merge result for one tracked file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub version_marked: bool,
    /// Whether the file was persisted. Unchanged files are left alone.
    pub written: bool,
}

impl UpdateOutcome {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, UpdateOutcome::UpToDate { .. })
    }

    pub fn report(&self) -> Option<&UpdateReport> {
        match self {
            UpdateOutcome::UpToDate { .. } => None,
            UpdateOutcome::Updated(report) => Some(report),
        }
    }
}

impl UpdateReport {
    pub fn file(&self, name: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::UpToDate { version } => {
                write!(f, "Config files are up to date ({version})")
            }
            UpdateOutcome::Updated(report) => write!(f, "{report}"),
        }
    }
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Updated config files {} -> {}",
            self.from_version, self.to_version
        )?;
        write!(
            f,
            "Backed up {} file(s) to {}",
            self.backed_up.len(),
            self.backup_dir
        )?;
        for hook in &self.hooks_applied {
            write!(f, "\nApplied hook {hook}")?;
        }
        for file in &self.files {
            write!(f, "\n{file}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.written {
            return write!(f, "{}: unchanged", self.name);
        }
        write!(
            f,
            "{}: {} added, {} removed",
            self.name,
            self.added.len(),
            self.removed.len()
        )?;
        if self.version_marked {
            write!(f, ", version marked")?;
        }
        Ok(())
    }
}

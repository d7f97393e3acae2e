//! Updater settings, loadable through confique like any other app config.
//!
//! Every field has a compiled default, so `UpdateSettings::builder().load()`
//! always succeeds. Hosts that keep these knobs in their own TOML file can
//! point [`UpdateSettings::from_file`] at it; a missing file yields defaults.

use std::path::Path;

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::error::UpdateError;

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpdateSettings {
    /// Copy keys present in the bundled reference but missing on disk.
    #[config(default = false)]
    pub merge_missing_nodes: bool,

    /// Remove keys present on disk but absent from the bundled reference.
    #[config(default = false)]
    pub delete_unknown_nodes: bool,

    /// Write the target version into the primary settings file.
    #[config(default = false)]
    pub update_config_version: bool,

    /// Logical name (without extension) of the primary settings file.
    #[config(default = "config")]
    pub settings_file: String,

    /// Dotted path of the version marker inside the primary settings file.
    #[config(default = "config-version")]
    pub version_key: String,

    /// Extension appended to every resolved file name.
    #[config(default = "toml")]
    pub extension: String,

    /// Backups go to `{backup_prefix}-{epoch millis}/`.
    #[config(default = "backup")]
    pub backup_prefix: String,
}

impl UpdateSettings {
    /// Compiled defaults only.
    pub fn defaults() -> Result<Self, UpdateError> {
        Ok(Self::builder().load()?)
    }

    /// Defaults overlaid with the keys found in the TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, UpdateError> {
        Ok(Self::builder().file(path).load()?)
    }

    /// A commented TOML template documenting every setting.
    pub fn template() -> String {
        confique::toml::template::<Self>(confique::toml::FormatOptions::default())
    }

    /// File name of the primary settings file, extension included.
    pub fn settings_file_name(&self) -> String {
        format!("{}.{}", self.settings_file, self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_conservative() {
        let settings = UpdateSettings::defaults().unwrap();
        assert!(!settings.merge_missing_nodes);
        assert!(!settings.delete_unknown_nodes);
        assert!(!settings.update_config_version);
        assert_eq!(settings.settings_file, "config");
        assert_eq!(settings.version_key, "config-version");
        assert_eq!(settings.extension, "toml");
        assert_eq!(settings.backup_prefix, "backup");
    }

    #[test]
    fn from_file_overlays_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("updater.toml");
        fs::write(&path, "merge_missing_nodes = true\nextension = \"yml\"\n").unwrap();

        let settings = UpdateSettings::from_file(&path).unwrap();
        assert!(settings.merge_missing_nodes);
        assert!(!settings.delete_unknown_nodes);
        assert_eq!(settings.extension, "yml");
        assert_eq!(settings.version_key, "config-version");
    }

    #[test]
    fn from_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = UpdateSettings::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, UpdateSettings::defaults().unwrap());
    }

    #[test]
    fn from_file_rejects_wrong_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("updater.toml");
        fs::write(&path, "merge_missing_nodes = \"yes\"\n").unwrap();
        assert!(matches!(
            UpdateSettings::from_file(&path),
            Err(UpdateError::ConfigError(_))
        ));
    }

    #[test]
    fn template_documents_settings() {
        let template = UpdateSettings::template();
        assert!(template.contains("merge_missing_nodes"));
        assert!(template.contains("bundled reference"));
    }

    #[test]
    fn settings_file_name_appends_extension() {
        let settings = UpdateSettings::defaults().unwrap();
        assert_eq!(settings.settings_file_name(), "config.toml");
    }
}

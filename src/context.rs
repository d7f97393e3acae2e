//! The state an update pass threads through every stage and hook.

use std::fmt;

use crate::cache::DocumentCache;
use crate::document::{Document, TomlDocument};
use crate::error::UpdateError;
use crate::hooks::version_to_int;
use crate::settings::UpdateSettings;
use crate::storage::Storage;

/// Everything a stage or an [`UpdateHook`](crate::UpdateHook) can see and
/// change during a pass: tracked files, versions, settings, storage and the
/// document cache.
pub struct UpdateContext<D: Document = TomlDocument> {
    files: Vec<String>,
    current_version: String,
    target_version: String,
    settings: UpdateSettings,
    bindings: Vec<(String, String)>,
    storage: Box<dyn Storage>,
    cache: DocumentCache<D>,
    started_at: i64,
}

impl<D: Document> UpdateContext<D> {
    pub(crate) fn new(
        storage: Box<dyn Storage>,
        files: Vec<String>,
        current_version: String,
        target_version: String,
        settings: UpdateSettings,
    ) -> Self {
        Self {
            files,
            current_version,
            target_version,
            settings,
            bindings: Vec::new(),
            storage,
            cache: DocumentCache::new(),
            started_at: 0,
        }
    }

    /// Reset per-pass state: placeholder values, start time and the cache.
    pub(crate) fn begin_pass(&mut self, bindings: Vec<(String, String)>, started_at: i64) {
        self.bindings = bindings;
        self.started_at = started_at;
        self.cache.clear();
    }

    /// Tracked file templates, before placeholder substitution.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Hooks may add or drop tracked files; later stages see the change.
    pub fn files_mut(&mut self) -> &mut Vec<String> {
        &mut self.files
    }

    /// The version the on-disk files were written for.
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// The version being updated to.
    pub fn target_version(&self) -> &str {
        &self.target_version
    }

    /// [`current_version`](Self::current_version) as an integer, with the
    /// separator-stripping semantics of [`version_to_int`].
    pub fn current_version_number(&self) -> Result<i64, UpdateError> {
        version_to_int(&self.current_version)
    }

    pub fn target_version_number(&self) -> Result<i64, UpdateError> {
        version_to_int(&self.target_version)
    }

    pub fn settings(&self) -> &UpdateSettings {
        &self.settings
    }

    /// Epoch milliseconds at which the current pass started.
    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    /// Substitute placeholder values into `template` and append the extension.
    pub fn resolve_name(&self, template: &str) -> String {
        let mut name = template.to_string();
        for (token, value) in &self.bindings {
            name = name.replace(token.as_str(), value);
        }
        format!("{name}.{}", self.settings.extension)
    }

    /// Resolved names of all tracked files, in tracking order.
    pub fn resolved_files(&self) -> Vec<String> {
        self.files.iter().map(|f| self.resolve_name(f)).collect()
    }

    /// Whether `name` is the primary settings file that holds the version marker.
    pub fn is_settings_file(&self, name: &str) -> bool {
        name == self.settings.settings_file_name()
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn cache(&self) -> &DocumentCache<D> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DocumentCache<D> {
        &mut self.cache
    }

    pub fn disk_document(&self, name: &str) -> Option<&D> {
        self.cache.disk(name)
    }

    pub fn disk_document_mut(&mut self, name: &str) -> Option<&mut D> {
        self.cache.disk_mut(name)
    }

    pub fn reference_document(&self, name: &str) -> Option<&D> {
        self.cache.reference(name)
    }

    /// Reload every tracked file into the cache, replacing its contents.
    pub fn cache_files(&mut self) -> Result<usize, UpdateError> {
        let names = self.resolved_files();
        self.cache.cache_files(self.storage.as_ref(), &names)
    }

    /// Reload one cached entry from storage.
    pub fn reload(&mut self, name: &str) -> Result<bool, UpdateError> {
        self.cache.reload(self.storage.as_ref(), name)
    }

    /// Write the cached disk document for `name` back to storage.
    /// Returns `false` if `name` is not cached.
    pub fn save(&self, name: &str) -> Result<bool, UpdateError> {
        match self.cache.disk(name) {
            Some(document) => {
                self.storage.write(name, &document.persist())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<D: Document> fmt::Debug for UpdateContext<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateContext")
            .field("files", &self.files)
            .field("current_version", &self.current_version)
            .field("target_version", &self.target_version)
            .field("settings", &self.settings)
            .field("cached", &self.cache.len())
            .field("started_at", &self.started_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::workspace;

    fn context(files: &[&str], current: &str) -> UpdateContext {
        let (_dir, storage) = workspace(&[], &[]);
        UpdateContext::new(
            Box::new(storage),
            files.iter().map(|s| s.to_string()).collect(),
            current.to_string(),
            "2.0.0".to_string(),
            UpdateSettings::defaults().unwrap(),
        )
    }

    #[test]
    fn resolve_name_substitutes_tokens_and_extension() {
        let mut ctx = context(&["messages_%lang%"], "1.0");
        ctx.begin_pass(vec![("%lang%".into(), "en".into())], 1);
        assert_eq!(ctx.resolve_name("messages_%lang%"), "messages_en.toml");
        assert_eq!(ctx.resolve_name("config"), "config.toml");
    }

    #[test]
    fn resolve_name_replaces_every_occurrence() {
        let mut ctx = context(&[], "1.0");
        ctx.begin_pass(vec![("%lang%".into(), "de".into())], 1);
        assert_eq!(
            ctx.resolve_name("%lang%/messages_%lang%"),
            "de/messages_de.toml"
        );
    }

    #[test]
    fn resolved_files_follow_file_edits() {
        let mut ctx = context(&["config"], "1.0");
        ctx.files_mut().push("extra".into());
        assert_eq!(ctx.resolved_files(), vec!["config.toml", "extra.toml"]);
    }

    #[test]
    fn settings_file_detection() {
        let ctx = context(&["config"], "1.0");
        assert!(ctx.is_settings_file("config.toml"));
        assert!(!ctx.is_settings_file("messages_en.toml"));
    }

    #[test]
    fn version_numbers() {
        let ctx = context(&[], "1.2.3");
        assert_eq!(ctx.current_version_number().unwrap(), 123);
        assert_eq!(ctx.target_version_number().unwrap(), 200);
    }

    #[test]
    fn save_uncached_is_false() {
        let ctx = context(&["config"], "1.0");
        assert!(!ctx.save("config.toml").unwrap());
    }
}

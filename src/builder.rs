use chrono::Utc;
use log::{debug, error, info};

use crate::backup;
use crate::cache::parse_document;
use crate::context::UpdateContext;
use crate::document::{Document, TomlDocument};
use crate::error::UpdateError;
use crate::hooks::{self, UpdateHook};
use crate::merge;
use crate::report::{UpdateOutcome, UpdateReport};
use crate::settings::UpdateSettings;
use crate::storage::Storage;
use crate::types::{Placeholder, UpdateState, VariableSource};

/// Runs version-gated update passes over a set of tracked config files.
///
/// Built with [`ConfigUpdater::builder()`]. Each call to
/// [`update()`](Self::update) is a full pass:
///
/// 1. **Version gate**: equal versions end the pass with no side effects.
///    Versions are compared after Unicode lowercasing, so `"1.0-RC"` and
///    `"1.0-rc"` match.
/// 2. **Backup**: every tracked file on disk is copied under
///    `backup-<millis>/`.
/// 3. **Cache**: disk and bundled documents are parsed.
/// 4. **Hooks**: applicable [`UpdateHook`]s run in registration order.
/// 5. **Version rewrite** (optional): the target version is written into the
///    primary settings file.
/// 6. **Re-cache**: everything is parsed again, picking up hook edits.
/// 7. **Merge**: each file is merged against its reference and persisted if
///    it changed.
pub struct ConfigUpdater<D: Document = TomlDocument> {
    context: UpdateContext<D>,
    hooks: Vec<Box<dyn UpdateHook<D>>>,
    placeholders: Vec<Placeholder>,
    variables: VariableSource,
    state: UpdateState,
}

impl ConfigUpdater<TomlDocument> {
    pub fn builder() -> ConfigUpdaterBuilder<TomlDocument> {
        ConfigUpdaterBuilder::new()
    }
}

impl<D: Document> ConfigUpdater<D> {
    /// Where the last (or current) pass got to.
    pub fn state(&self) -> UpdateState {
        self.state
    }

    pub fn context(&self) -> &UpdateContext<D> {
        &self.context
    }

    /// Run one update pass.
    ///
    /// On error the state is left at [`UpdateState::Failed`]. Nothing is
    /// rolled back; the backup directory named in the log is the way back.
    pub fn update(&mut self) -> Result<UpdateOutcome, UpdateError> {
        self.state = UpdateState::Idle;
        self.transition(UpdateState::VersionGate);

        let current = self.context.current_version().to_lowercase();
        let target = self.context.target_version().to_string();
        if current == target.to_lowercase() {
            debug!("Config files already at {target}");
            self.transition(UpdateState::Done);
            return Ok(UpdateOutcome::UpToDate { version: target });
        }

        match self.run_pass() {
            Ok(report) => {
                self.transition(UpdateState::Done);
                Ok(UpdateOutcome::Updated(report))
            }
            Err(e) => {
                error!("Config update failed during {:?}: {e}", self.state);
                self.state = UpdateState::Failed;
                Err(e)
            }
        }
    }

    fn run_pass(&mut self) -> Result<UpdateReport, UpdateError> {
        info!(
            "New version detected ({} -> {}), updating config files",
            self.context.current_version(),
            self.context.target_version()
        );

        let bindings = self.resolve_placeholders()?;
        self.context.begin_pass(bindings, Utc::now().timestamp_millis());

        self.transition(UpdateState::BackingUp);
        let backup = backup::backup_files(&self.context)?;

        self.transition(UpdateState::Caching);
        self.context.cache_files()?;

        self.transition(UpdateState::RunningHooks);
        let hooks_applied = hooks::run_hooks(&self.hooks, &mut self.context)?;

        let version_rewritten = if self.context.settings().update_config_version {
            self.transition(UpdateState::RewritingVersion);
            self.rewrite_version()?
        } else {
            false
        };

        self.transition(UpdateState::ReCaching);
        self.context.cache_files()?;

        self.transition(UpdateState::Merging);
        let files = merge::merge_files(&mut self.context)?;

        Ok(UpdateReport {
            from_version: self.context.current_version().to_string(),
            to_version: self.context.target_version().to_string(),
            backup_dir: backup.dir,
            backed_up: backup.files,
            hooks_applied,
            version_rewritten,
            files,
        })
    }

    /// Pair each placeholder token with its variable's current value.
    fn resolve_placeholders(&self) -> Result<Vec<(String, String)>, UpdateError> {
        if self.placeholders.is_empty() {
            return Ok(Vec::new());
        }

        // Loaded once, and only when some placeholder needs it.
        let settings_doc = match &self.variables {
            VariableSource::Settings => {
                let name = self.context.settings().settings_file_name();
                match self.context.storage().read(&name)? {
                    Some(text) => Some(parse_document::<D>(&name, &text)?),
                    None => None,
                }
            }
            VariableSource::Resolver(_) => None,
        };

        self.placeholders
            .iter()
            .map(|placeholder| {
                let value = match &self.variables {
                    VariableSource::Resolver(resolve) => resolve(&placeholder.variable),
                    VariableSource::Settings => settings_doc
                        .as_ref()
                        .and_then(|doc| doc.get_str(&placeholder.variable))
                        .map(str::to_string),
                };
                value
                    .map(|v| (placeholder.token.clone(), v))
                    .ok_or_else(|| UpdateError::UnresolvedVariable {
                        token: placeholder.token.clone(),
                        variable: placeholder.variable.clone(),
                    })
            })
            .collect()
    }

    /// Write the target version into the on-disk primary settings file.
    /// Returns `false` when that file does not exist.
    fn rewrite_version(&self) -> Result<bool, UpdateError> {
        let name = self.context.settings().settings_file_name();
        let Some(text) = self.context.storage().read(&name)? else {
            debug!("No {name} on disk, not writing config version");
            return Ok(false);
        };
        let target = self.context.target_version();
        let mut document = parse_document::<D>(&name, &text)?;
        document.set_str(&self.context.settings().version_key, target);
        self.context.storage().write(&name, &document.persist())?;
        info!("Updated config version to {target}");
        Ok(true)
    }

    fn transition(&mut self, next: UpdateState) {
        debug!("Update state {:?} -> {next:?}", self.state);
        self.state = next;
    }
}

/// Builder for [`ConfigUpdater`].
///
/// Storage, both versions, at least one tracked file and at least one hook
/// are required. Settings start from [`UpdateSettings`] defaults (or the
/// value given to [`settings()`](Self::settings)); the individual setters
/// override single fields regardless of call order.
pub struct ConfigUpdaterBuilder<D: Document = TomlDocument> {
    storage: Option<Box<dyn Storage>>,
    files: Vec<String>,
    current_version: Option<String>,
    target_version: Option<String>,
    hooks: Vec<Box<dyn UpdateHook<D>>>,
    settings: Option<UpdateSettings>,
    merge_missing_nodes: Option<bool>,
    delete_unknown_nodes: Option<bool>,
    update_config_version: Option<bool>,
    extension: Option<String>,
    placeholders: Vec<Placeholder>,
    variables: VariableSource,
}

impl<D: Document> Default for ConfigUpdaterBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> ConfigUpdaterBuilder<D> {
    pub fn new() -> Self {
        Self {
            storage: None,
            files: Vec::new(),
            current_version: None,
            target_version: None,
            hooks: Vec::new(),
            settings: None,
            merge_missing_nodes: None,
            delete_unknown_nodes: None,
            update_config_version: None,
            extension: None,
            placeholders: Vec::new(),
            variables: VariableSource::Settings,
        }
    }

    /// Where tracked files and their bundled references live.
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Track several file templates (names without extension).
    pub fn files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn file(mut self, file: &str) -> Self {
        self.files.push(file.to_string());
        self
    }

    /// The version the on-disk files were written by.
    pub fn current_version(mut self, version: &str) -> Self {
        self.current_version = Some(version.to_string());
        self
    }

    /// The version now running.
    pub fn target_version(mut self, version: &str) -> Self {
        self.target_version = Some(version.to_string());
        self
    }

    /// Register a hook. Hooks run in registration order.
    pub fn hook(mut self, hook: impl UpdateHook<D> + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn hooks(mut self, hooks: Vec<Box<dyn UpdateHook<D>>>) -> Self {
        self.hooks.extend(hooks);
        self
    }

    /// Base settings, e.g. from [`UpdateSettings::from_file`].
    pub fn settings(mut self, settings: UpdateSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn merge_missing_nodes(mut self, enabled: bool) -> Self {
        self.merge_missing_nodes = Some(enabled);
        self
    }

    pub fn delete_unknown_nodes(mut self, enabled: bool) -> Self {
        self.delete_unknown_nodes = Some(enabled);
        self
    }

    pub fn update_config_version(mut self, enabled: bool) -> Self {
        self.update_config_version = Some(enabled);
        self
    }

    /// Extension appended to resolved names (default: `"toml"`).
    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.to_string());
        self
    }

    /// Replace `token` in file templates with the value of `variable`.
    pub fn placeholder(mut self, token: &str, variable: &str) -> Self {
        self.placeholders.push(Placeholder::new(token, variable));
        self
    }

    /// Look placeholder variables up with `resolver` instead of reading the
    /// primary settings file.
    pub fn variable_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        self.variables = VariableSource::Resolver(Box::new(resolver));
        self
    }

    fn effective_settings(&self) -> Result<UpdateSettings, UpdateError> {
        let mut settings = match &self.settings {
            Some(settings) => settings.clone(),
            None => UpdateSettings::defaults()?,
        };
        if let Some(enabled) = self.merge_missing_nodes {
            settings.merge_missing_nodes = enabled;
        }
        if let Some(enabled) = self.delete_unknown_nodes {
            settings.delete_unknown_nodes = enabled;
        }
        if let Some(enabled) = self.update_config_version {
            settings.update_config_version = enabled;
        }
        if let Some(extension) = &self.extension {
            settings.extension = extension.clone();
        }
        Ok(settings)
    }

    /// Validate and assemble the updater. Performs no I/O.
    pub fn build(self) -> Result<ConfigUpdater<D>, UpdateError> {
        let settings = self.effective_settings()?;
        let storage = self.storage.ok_or(UpdateError::StorageRequired)?;
        let current = self
            .current_version
            .ok_or(UpdateError::CurrentVersionRequired)?;
        let target = self
            .target_version
            .ok_or(UpdateError::TargetVersionRequired)?;
        if self.files.is_empty() {
            return Err(UpdateError::NoTrackedFiles);
        }
        if self.hooks.is_empty() {
            return Err(UpdateError::NoUpdateHooks);
        }

        Ok(ConfigUpdater {
            context: UpdateContext::new(storage, self.files, current, target, settings),
            hooks: self.hooks,
            placeholders: self.placeholders,
            variables: self.variables,
            state: UpdateState::Idle,
        })
    }
}

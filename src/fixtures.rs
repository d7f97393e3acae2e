#[cfg(test)]
pub mod test {
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    use tempfile::TempDir;

    use crate::context::UpdateContext;
    use crate::document::Document;
    use crate::error::{HookError, UpdateError};
    use crate::hooks::UpdateHook;
    use crate::storage::{BundledResources, FsStorage, Storage};

    /// A temp data directory holding `disk` files, with `bundled` served
    /// as embedded references.
    pub fn workspace(disk: &[(&str, &str)], bundled: &[(&str, &str)]) -> (TempDir, FsStorage) {
        let dir = TempDir::new().unwrap();
        for (name, content) in disk {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        let resources = BundledResources::embedded(bundled.iter().copied());
        let storage = FsStorage::new(dir.path()).with_resources(resources);
        (dir, storage)
    }

    /// Appends its name to a shared log whenever it is applied.
    pub struct RecordingHook {
        name: String,
        applies: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl RecordingHook {
        pub fn new(name: &str, applies: bool, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                applies,
                log: Rc::clone(log),
            }
        }
    }

    impl<D: Document> UpdateHook<D> for RecordingHook {
        fn name(&self) -> &str {
            &self.name
        }

        fn applies(&self, _: &UpdateContext<D>) -> bool {
            self.applies
        }

        fn apply(&self, _: &mut UpdateContext<D>) -> Result<(), HookError> {
            self.log.borrow_mut().push(self.name.clone());
            Ok(())
        }
    }

    /// [`FsStorage`] that remembers the name of every write.
    pub struct RecordingStorage {
        inner: FsStorage,
        writes: Rc<RefCell<Vec<String>>>,
    }

    impl RecordingStorage {
        pub fn new(inner: FsStorage, writes: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                inner,
                writes: Rc::clone(writes),
            }
        }
    }

    impl Storage for RecordingStorage {
        fn exists(&self, name: &str) -> bool {
            self.inner.exists(name)
        }

        fn read(&self, name: &str) -> Result<Option<String>, UpdateError> {
            self.inner.read(name)
        }

        fn write(&self, name: &str, contents: &str) -> Result<(), UpdateError> {
            self.writes.borrow_mut().push(name.to_string());
            self.inner.write(name, contents)
        }

        fn copy(&self, from: &str, to: &str) -> Result<(), UpdateError> {
            self.inner.copy(from, to)
        }

        fn bundled(&self, name: &str) -> Result<Option<String>, UpdateError> {
            self.inner.bundled(name)
        }
    }

    #[test]
    fn workspace_writes_nested_files() {
        let (dir, storage) = workspace(
            &[
                ("config.toml", "a = 1\n"),
                ("lang/messages_en.toml", "b = 2\n"),
            ],
            &[("config.toml", "a = 0\n")],
        );
        assert!(dir.path().join("lang").join("messages_en.toml").is_file());
        let shipped = storage.bundled("config.toml").unwrap();
        assert_eq!(shipped.as_deref(), Some("a = 0\n"));
        assert_eq!(storage.bundled("lang/messages_en.toml").unwrap(), None);
    }

    #[test]
    fn recording_storage_logs_writes() {
        let (dir, storage) = workspace(&[], &[]);
        let writes = Rc::new(RefCell::new(Vec::new()));
        let storage = RecordingStorage::new(storage, &writes);
        storage.write("config.toml", "a = 1\n").unwrap();
        storage.copy("config.toml", "copy.toml").unwrap();
        assert_eq!(*writes.borrow(), vec!["config.toml"]);
        assert!(dir.path().join("copy.toml").is_file());
    }
}

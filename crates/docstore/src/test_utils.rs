use crate::config::StoreConfig;
use crate::registry::Registry;
use crate::store::FileDocumentStore;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub store: FileDocumentStore,
    pub root: PathBuf,
}

impl TestEnv {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_config(registry, |_| {})
    }

    /// Like [`TestEnv::new`], letting the caller adjust the config (the root
    /// is always the temp dir).
    pub fn with_config(registry: Arc<Registry>, adjust: impl FnOnce(&mut StoreConfig)) -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let mut config = StoreConfig::with_root(&root);
        adjust(&mut config);
        config.root = root.clone();
        let store = FileDocumentStore::open(registry, &config);
        Self {
            _temp_dir: temp_dir,
            store,
            root,
        }
    }

    /// Writes a raw file below the root, creating directories.
    pub fn write_fixture(&self, relative: &str, content: &str) -> PathBuf {
        let path = crate::paths::absolute_path(&self.root, relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        fs::write(&path, content).expect("failed to write fixture");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeKind;
    use crate::registry::DocumentTypeDef;

    fn registry() -> Arc<Registry> {
        Arc::new(
            Registry::builder()
                .register(
                    DocumentTypeDef::new("Note")
                        .directory("notes")
                        .file_suffix("note")
                        .attribute("unit", AttributeKind::Text),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn fixtures_are_visible_to_the_store() {
        let env = TestEnv::new(registry());
        let path = env.write_fixture("notes/deep/a.note", "- unit = kg\n");
        assert!(path.starts_with(&env.root));

        let doc = env.store.find("Note", "a").unwrap();
        assert_eq!(doc.sub_dirs(), ["deep".to_string()]);
        assert_eq!(doc.get_text("unit"), Some("kg"));
    }

    #[test]
    fn root_always_points_at_temp_dir() {
        let env = TestEnv::with_config(registry(), |config| {
            config.root = PathBuf::from("/elsewhere");
            config.check_duplicate_keys = true;
        });
        let mut doc = env.store.new_document("Note", "b").unwrap();
        env.store.save(&mut doc).unwrap();
        assert!(env.root.join("notes").join("b.note").is_file());
    }
}

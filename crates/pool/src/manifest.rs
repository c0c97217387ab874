use serde::{Deserialize, Serialize};
use std::path::Path;
use tickpool_common::TemplateKey;

/// Pre-allocation count used when a manifest entry omits `size`.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Errors from loading pool configuration.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("no template registered for pool \"{0}\"")]
    MissingTemplate(String),
}

/// Static configuration of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDefinition {
    /// Template name. The pool's lookup key is derived from it.
    pub name: String,
    /// Number of instances created at initialization.
    #[serde(default = "default_pool_size")]
    pub size: usize,
    /// The template knowingly has no lifecycle hooks; silences the startup warning.
    #[serde(default)]
    pub confirmed_not_poolable: bool,
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

impl PoolDefinition {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            confirmed_not_poolable: false,
        }
    }

    /// Mark the template as intentionally hook-less.
    pub fn confirm_not_poolable(mut self) -> Self {
        self.confirmed_not_poolable = true;
        self
    }

    pub fn key(&self) -> TemplateKey {
        TemplateKey::from_name(&self.name)
    }
}

/// A list of pool definitions, usually read from YAML.
///
/// ```yaml
/// pools:
///   - name: Bullet
///     size: 3
///   - name: Spark
///     confirmed_not_poolable: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolManifest {
    #[serde(default)]
    pub pools: Vec<PoolDefinition>,
}

impl PoolManifest {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PoolError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PoolError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&data)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PoolError> {
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let manifest = PoolManifest::from_yaml_str(
            "pools:\n  - name: Bullet\n    size: 3\n  - name: Spark\n    confirmed_not_poolable: true\n",
        )
        .unwrap();
        assert_eq!(manifest.pools.len(), 2);
        assert_eq!(manifest.pools[0], PoolDefinition::new("Bullet", 3));
        assert_eq!(manifest.pools[1].size, DEFAULT_POOL_SIZE);
        assert!(manifest.pools[1].confirmed_not_poolable);
    }

    #[test]
    fn empty_document_has_no_pools() {
        let manifest = PoolManifest::from_yaml_str("{}").unwrap();
        assert!(manifest.pools.is_empty());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = PoolManifest::from_yaml_str("pools: [name: ").unwrap_err();
        assert!(matches!(err, PoolError::Yaml(_)));
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let manifest = PoolManifest {
            pools: vec![
                PoolDefinition::new("Bullet", 3),
                PoolDefinition::new("Spark", 8).confirm_not_poolable(),
            ],
        };
        manifest.save(tmp.path()).unwrap();

        let loaded = PoolManifest::load(tmp.path()).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PoolManifest::load("/nonexistent/tickpool/pools.yaml").unwrap_err();
        assert!(matches!(err, PoolError::Io(_)));
    }

    #[test]
    fn key_follows_name() {
        assert_eq!(
            PoolDefinition::new("Bullet", 1).key(),
            TemplateKey::from_name("Bullet")
        );
    }
}

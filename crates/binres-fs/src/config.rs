use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use binres_types::PartitionName;

use crate::error::{ConfigError, ConfigResult};
use crate::partitions::PartitionMap;

/// TOML configuration for a [`FileResolver`](crate::FileResolver).
///
/// ```toml
/// create_dirs = true
///
/// [partitions]
/// partition = "/srv/binaries"
/// archive = "archive"   # relative to the config file's directory
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileResolverConfig {
    /// Create missing partition roots when building the resolver.
    #[serde(default)]
    pub create_dirs: bool,
    /// Partition name to directory root.
    #[serde(default)]
    pub partitions: BTreeMap<PartitionName, PathBuf>,
}

impl FileResolverConfig {
    /// Parse a configuration from TOML text. Relative roots are kept as-is.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        if config.partitions.is_empty() {
            return Err(ConfigError::NoPartitions);
        }
        Ok(config)
    }

    /// Load a configuration file. Relative roots are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            for root in config.partitions.values_mut() {
                if root.is_relative() {
                    *root = base.join(&*root);
                }
            }
        }
        debug!(path = %path.display(), partitions = config.partitions.len(), "config loaded");
        Ok(config)
    }

    /// Check the roots and produce the routing table.
    ///
    /// With `create_dirs`, missing roots are created. A root that exists but
    /// is not a directory is always an error.
    pub fn build_partitions(&self) -> ConfigResult<PartitionMap> {
        for (name, root) in &self.partitions {
            if self.create_dirs {
                fs::create_dir_all(root).map_err(|source| ConfigError::CreateRoot {
                    partition: name.to_string(),
                    path: root.clone(),
                    source,
                })?;
            }
            if root.exists() && !root.is_dir() {
                return Err(ConfigError::NotADirectory {
                    partition: name.to_string(),
                    path: root.clone(),
                });
            }
        }
        Ok(self.partitions.clone().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use binres_resolver::Resolver;
    use binres_types::ContentId;

    use crate::FileResolver;

    #[test]
    fn parses_partitions() {
        let config = FileResolverConfig::from_toml_str(
            r#"
            [partitions]
            partition = "/srv/binaries"
            archive = "/srv/archive"
            "#,
        )
        .unwrap();
        assert_eq!(config.partitions.len(), 2);
        assert!(!config.create_dirs);
        let p = PartitionName::new("partition").unwrap();
        assert_eq!(config.partitions[&p], PathBuf::from("/srv/binaries"));
    }

    #[test]
    fn rejects_empty_and_invalid() {
        assert!(matches!(
            FileResolverConfig::from_toml_str(""),
            Err(ConfigError::NoPartitions)
        ));
        assert!(matches!(
            FileResolverConfig::from_toml_str("[partitions]\n\"..\" = \"/x\"\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FileResolverConfig::from_toml_str("unknown = 1\n[partitions]\na = \"/x\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_resolves_relative_roots() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binres.toml");
        fs::write(&path, "[partitions]\npartition = \"data\"\nabs = \"/srv/abs\"\n").unwrap();

        let config = FileResolverConfig::load(&path).unwrap();
        let p = PartitionName::new("partition").unwrap();
        let abs = PartitionName::new("abs").unwrap();
        assert_eq!(config.partitions[&p], dir.path().join("data"));
        assert_eq!(config.partitions[&abs], PathBuf::from("/srv/abs"));
    }

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            FileResolverConfig::load(&dir.path().join("nope.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn create_dirs_builds_roots() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("a").join("b");
        let config = FileResolverConfig {
            partitions: BTreeMap::from([(PartitionName::new("partition").unwrap(), root.clone())]),
            create_dirs: true,
        };
        let resolver = FileResolver::from_config(&config).unwrap();
        assert!(root.is_dir());

        let p = PartitionName::new("partition").unwrap();
        let id = ContentId::parse("file:test.txt").unwrap();
        assert!(!resolver.exists(&p, &id).unwrap());
    }

    #[test]
    fn root_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        let config = FileResolverConfig {
            partitions: BTreeMap::from([(PartitionName::new("partition").unwrap(), file)]),
            create_dirs: false,
        };
        assert!(matches!(
            config.build_partitions(),
            Err(ConfigError::NotADirectory { .. })
        ));
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = FileResolverConfig {
            partitions: BTreeMap::from([(PartitionName::new("partition").unwrap(), PathBuf::from("/srv"))]),
            create_dirs: true,
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(FileResolverConfig::from_toml_str(&text).unwrap(), config);
    }
}

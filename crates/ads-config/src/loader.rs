//! YAML loading with `!include`, `!secret` and `!env_var`

use crate::error::{ConfigError, ConfigResult};
use crate::secrets::Secrets;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Loads YAML files and resolves custom tags
pub struct YamlLoader {
    config_dir: PathBuf,
    secrets: Secrets,
    /// Files currently being loaded, outermost first
    stack: Vec<PathBuf>,
}

impl YamlLoader {
    /// Loader rooted at `config_dir`, reading its `secrets.yaml`
    pub fn new(config_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let config_dir = config_dir.into();
        let secrets = Secrets::load(&config_dir)?;
        Ok(Self::with_secrets(config_dir, secrets))
    }

    pub fn with_secrets(config_dir: impl Into<PathBuf>, secrets: Secrets) -> Self {
        Self {
            config_dir: config_dir.into(),
            secrets,
            stack: Vec::new(),
        }
    }

    /// Load a file; relative paths are taken from the config directory
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let path = absolutize(&self.config_dir, path.as_ref());
        if self.stack.contains(&path) {
            return Err(ConfigError::CircularInclude { path });
        }
        debug!(path = %path.display(), "Loading YAML");

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;

        self.stack.push(path.clone());
        let result = self.load_str(&content, &path);
        self.stack.pop();
        result
    }

    /// Parse `content` as if read from `origin`
    pub fn load_str(&mut self, content: &str, origin: &Path) -> ConfigResult<Value> {
        let value: Value = serde_yaml::from_str(content).map_err(|source| ConfigError::ParseYaml {
            path: origin.to_path_buf(),
            source,
        })?;
        self.resolve(value, origin)
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn resolve(&mut self, value: Value, origin: &Path) -> ConfigResult<Value> {
        match value {
            Value::Tagged(tagged) => self.resolve_tag(*tagged, origin),
            Value::Mapping(entries) => {
                let mut resolved = Mapping::with_capacity(entries.len());
                for (key, value) in entries {
                    resolved.insert(self.resolve(key, origin)?, self.resolve(value, origin)?);
                }
                Ok(Value::Mapping(resolved))
            }
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.resolve(item, origin))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Sequence),
            scalar => Ok(scalar),
        }
    }

    fn resolve_tag(&mut self, tagged: TaggedValue, origin: &Path) -> ConfigResult<Value> {
        let TaggedValue { tag, value } = tagged;
        let name = tag.to_string();
        trace!(tag = %name, "Resolving tag");

        match name.as_str() {
            "!include" => {
                let target = tag_argument(&name, &value)?;
                let base = origin.parent().unwrap_or(&self.config_dir).to_path_buf();
                let path = absolutize(&base, Path::new(target));
                debug!(path = %path.display(), "Including file");
                self.load_file(path)
            }
            "!secret" => {
                let key = tag_argument(&name, &value)?;
                Ok(Value::String(self.secrets.get(key)?.to_string()))
            }
            "!env_var" => env_var(tag_argument(&name, &value)?),
            _ => {
                // Unknown tags pass through with their content resolved
                let value = self.resolve(value, origin)?;
                Ok(Value::Tagged(Box::new(TaggedValue { tag, value })))
            }
        }
    }
}

/// `VAR` or `VAR default`
fn env_var(argument: &str) -> ConfigResult<Value> {
    let mut parts = argument.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let default = parts.next().map(str::trim);

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(Value::String(value)),
        (Err(_), Some(default)) => {
            debug!(var = name, "Environment variable unset, using default");
            Ok(Value::String(default.to_string()))
        }
        (Err(_), None) => Err(ConfigError::EnvVarNotFound {
            var: name.to_string(),
        }),
    }
}

fn tag_argument<'a>(tag: &str, value: &'a Value) -> ConfigResult<&'a str> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim()),
        Value::String(_) if tag == "!include" => Err(ConfigError::InvalidIncludePath {
            path: String::new(),
            reason: "path is empty".to_string(),
        }),
        _ if tag == "!include" => Err(ConfigError::InvalidIncludePath {
            path: format!("{:?}", value),
            reason: "path must be a string".to_string(),
        }),
        _ => Err(ConfigError::invalid(tag, "argument must be a non-empty string")),
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Load `file` from `config_dir` with every tag resolved
pub fn load_yaml(config_dir: impl Into<PathBuf>, file: impl AsRef<Path>) -> ConfigResult<Value> {
    YamlLoader::new(config_dir)?.load_file(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn get<'a>(value: &'a Value, key: &str) -> &'a Value {
        value.get(key).unwrap_or_else(|| panic!("missing key {}", key))
    }

    #[test]
    fn test_nested_include_is_relative_to_including_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "conf/server.yaml", "port: 9000\nlimits: !include limits.yaml\n");
        write(dir.path(), "conf/limits.yaml", "max_rules: 50\n");
        write(dir.path(), "main.yaml", "server: !include conf/server.yaml\n");

        let value = load_yaml(dir.path(), "main.yaml").unwrap();
        let server = get(&value, "server");
        assert_eq!(get(server, "port").as_u64(), Some(9000));
        assert_eq!(get(get(server, "limits"), "max_rules").as_u64(), Some(50));
    }

    #[test]
    fn test_secret_substitution() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "secrets.yaml", "sandbox_token: s3cr3t\n");
        write(dir.path(), "main.yaml", "token: !secret sandbox_token\n");

        let value = load_yaml(dir.path(), "main.yaml").unwrap();
        assert_eq!(get(&value, "token").as_str(), Some("s3cr3t"));
    }

    #[test]
    fn test_missing_secret() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.yaml", "token: !secret nowhere\n");

        assert!(matches!(
            load_yaml(dir.path(), "main.yaml"),
            Err(ConfigError::SecretNotFound { .. })
        ));
    }

    #[test]
    fn test_env_var_with_and_without_default() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("ADS_CONFIG_TEST_LEVEL", "debug");
        std::env::remove_var("ADS_CONFIG_TEST_UNSET");
        write(
            dir.path(),
            "main.yaml",
            "level: !env_var ADS_CONFIG_TEST_LEVEL\nhost: !env_var ADS_CONFIG_TEST_UNSET 0.0.0.0\n",
        );

        let value = load_yaml(dir.path(), "main.yaml").unwrap();
        assert_eq!(get(&value, "level").as_str(), Some("debug"));
        assert_eq!(get(&value, "host").as_str(), Some("0.0.0.0"));

        write(dir.path(), "strict.yaml", "host: !env_var ADS_CONFIG_TEST_UNSET\n");
        assert!(matches!(
            load_yaml(dir.path(), "strict.yaml"),
            Err(ConfigError::EnvVarNotFound { ref var }) if var == "ADS_CONFIG_TEST_UNSET"
        ));

        std::env::remove_var("ADS_CONFIG_TEST_LEVEL");
    }

    #[test]
    fn test_circular_include() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.yaml", "b: !include b.yaml\n");
        write(dir.path(), "b.yaml", "a: !include a.yaml\n");

        assert!(matches!(
            load_yaml(dir.path(), "a.yaml"),
            Err(ConfigError::CircularInclude { .. })
        ));
    }

    #[test]
    fn test_same_file_included_twice_is_not_circular() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "shared.yaml", "x: 1\n");
        write(dir.path(), "main.yaml", "a: !include shared.yaml\nb: !include shared.yaml\n");

        let value = load_yaml(dir.path(), "main.yaml").unwrap();
        assert_eq!(get(&value, "a"), get(&value, "b"));
    }

    #[test]
    fn test_non_string_include() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.yaml", "a: !include [one, two]\n");

        assert!(matches!(
            load_yaml(dir.path(), "main.yaml"),
            Err(ConfigError::InvalidIncludePath { .. })
        ));
    }
}

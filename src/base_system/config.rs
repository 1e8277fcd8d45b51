//! 配置文件读写与带注释生成。
//!
//! 读取时先以默认值为底、用户值覆盖合并，缺字段时回写补全，
//! 保证旧版本的 config.yml 升级后仍然可用。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid yaml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("validation error: {0}")]
    Validation(String),
}

/// 单个配置字段的元信息，用于生成带注释的 yml。
#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    pub name: &'static str,
    pub description: &'static str,
}

pub trait ConfigSpec: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
    fn fields() -> &'static [FieldMeta];
}

pub fn load_or_create<T: ConfigSpec>(config_path: Option<&Path>) -> Result<T, ConfigError> {
    load_or_create_with_base::<T>(config_path, None)
}

/// 读取（或初始化）配置文件。
///
/// 路径解析：`config_path` 优先；否则落在 `base_dir/FILE_NAME`；
/// 两者都缺省时使用当前目录。
pub fn load_or_create_with_base<T: ConfigSpec>(
    config_path: Option<&Path>,
    base_dir: Option<&Path>,
) -> Result<T, ConfigError> {
    let path = resolve_path::<T>(config_path, base_dir);
    ensure_parent(&path)?;

    if !path.exists() {
        let default_config = T::default();
        write_with_comments(&default_config, &path)?;
        return Ok(default_config);
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    let user_yaml: Value = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    let mut merged = serde_yaml::to_value(T::default())
        .map_err(|err| ConfigError::Validation(err.to_string()))?;
    let incomplete = count_missing_fields::<T>(&user_yaml) > 0;
    merge_values(&mut merged, user_yaml);

    let config: T =
        serde_yaml::from_value(merged).map_err(|err| ConfigError::Validation(err.to_string()))?;

    // 用户文件缺字段时回写一份补全的版本（带注释）。
    if incomplete {
        write_with_comments(&config, &path)?;
    }

    Ok(config)
}

pub fn write_with_comments<T: ConfigSpec>(config: &T, path: &Path) -> Result<(), ConfigError> {
    ensure_parent(path)?;
    let yaml = generate_yaml_with_comments(config)?;
    fs::write(path, yaml).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn generate_yaml_with_comments<T: ConfigSpec>(config: &T) -> Result<String, ConfigError> {
    let value =
        serde_yaml::to_value(config).map_err(|err| ConfigError::Validation(err.to_string()))?;
    let Value::Mapping(mapping) = value else {
        return Err(ConfigError::Validation(
            "config must serialize to a mapping".to_string(),
        ));
    };

    let mut lines = Vec::new();
    for field in T::fields() {
        if !field.description.is_empty() {
            lines.push(format!("# {}", field.description.replace('\n', "\n# ")));
        }
        let key = Value::String(field.name.to_string());
        let val = mapping.get(&key).cloned().unwrap_or(Value::Null);
        let yaml_line = serde_yaml::to_string(&serde_yaml::Mapping::from_iter([(key, val)]))
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        lines.push(yaml_line.trim().to_string());
    }
    lines.push(String::new());

    Ok(lines.join("\n"))
}

fn count_missing_fields<T: ConfigSpec>(user_yaml: &Value) -> usize {
    let Value::Mapping(map) = user_yaml else {
        return T::fields().len();
    };
    T::fields()
        .iter()
        .filter(|f| !map.contains_key(&Value::String(f.name.to_string())))
        .count()
}

fn merge_values(default: &mut Value, user: Value) {
    match (default, user) {
        (Value::Mapping(dest), Value::Mapping(src)) => {
            for (key, user_val) in src {
                if let Some(dest_val) = dest.get_mut(&key) {
                    merge_values(dest_val, user_val);
                } else {
                    dest.insert(key, user_val);
                }
            }
        }
        (dest, user) => *dest = user,
    }
}

fn resolve_path<T: ConfigSpec>(config_path: Option<&Path>, base_dir: Option<&Path>) -> PathBuf {
    match (config_path, base_dir) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(dir)) => dir.join(T::FILE_NAME),
        (None, None) => PathBuf::from(T::FILE_NAME),
    }
}

fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_system::context::Config;

    #[test]
    fn creates_default_file_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg: Config = load_or_create_with_base(None, Some(dir.path())).unwrap();
        assert!(dir.path().join(Config::FILE_NAME).exists());
        assert_eq!(cfg.request_timeout, Config::default().request_timeout);
    }

    #[test]
    fn user_values_survive_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Config::FILE_NAME);
        fs::write(&path, "request_timeout: 42\n").unwrap();

        let cfg: Config = load_or_create_with_base(Some(&path), None).unwrap();
        assert_eq!(cfg.request_timeout, 42);
        // 缺字段触发回写，文件里应补全其余字段。
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("search_base"));
        assert!(rewritten.contains("request_timeout: 42"));
    }

    #[test]
    fn generated_yaml_carries_comments() {
        let yaml = generate_yaml_with_comments(&Config::default()).unwrap();
        assert!(yaml.lines().any(|l| l.starts_with('#')));
        assert!(yaml.contains("cover_base"));
    }
}

//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::env;
use std::path::Path;

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    /// Validated settings
    pub schema: ConfigSchema,
    /// File the settings came from, if any
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path or use defaults, then apply
    /// `MEDPHASE_*` environment overrides and validate.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::config_not_found(p));
            }
        }

        let config_path = path
            .map(String::from)
            .or_else(find_config_file);

        let mut schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        apply_env_overrides(&mut schema, |key| env::var(key).ok())?;
        schema.validate()?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Load with defaults only (no file, no environment)
    pub fn default() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [
        "medphase.toml",
        ".medphase.toml",
        ".config/medphase.toml",
    ];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
    }

    None
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read config file {}: {}", path, e)).with_source(e))?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("While parsing {}", path))
        .with_suggestion("Check the file against the [server], [cors] and [logging] sections")
}

/// Overlay environment variables on a parsed schema.
///
/// `lookup` abstracts the environment so tests do not have to mutate
/// process state.
pub(crate) fn apply_env_overrides<F>(schema: &mut ConfigSchema, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("MEDPHASE_HOST") {
        schema.server.host = host;
    }
    if let Some(port) = lookup("MEDPHASE_PORT") {
        schema.server.port = parse_value("MEDPHASE_PORT", &port)?;
    }
    if let Some(limit) = lookup("MEDPHASE_MAX_UPLOAD_BYTES") {
        schema.server.max_upload_bytes = parse_value("MEDPHASE_MAX_UPLOAD_BYTES", &limit)?;
    }
    if let Some(origins) = lookup("MEDPHASE_CORS_ORIGINS") {
        schema.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(level) = lookup("MEDPHASE_LOG_LEVEL") {
        schema.logging.level = level;
    }
    if let Some(json) = lookup("MEDPHASE_LOG_JSON") {
        schema.logging.json = parse_value("MEDPHASE_LOG_JSON", &json)?;
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        Error::new(
            crate::ErrorCode::InvalidConfigValue,
            format!("Invalid value for {}: {:?}", key, raw),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.server.port, 7860);
    }

    #[test]
    fn test_config_load_explicit_missing_file() {
        let err = Config::load(Some("/nonexistent/medphase.toml")).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 8080\n\n[cors]\nallowed_origins = [\"https://viewer.example.org\"]"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let schema = load_config_file(&path).unwrap();
        assert_eq!(schema.server.port, 8080);
        assert!(!schema.cors.allows_any_origin());
    }

    #[test]
    fn test_config_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let err = load_config_file(&path).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigParseError);
        assert!(err.context.as_deref().is_some_and(|c| c.contains(&path)));
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_env_overrides() {
        let mut schema = ConfigSchema::default();
        let lookup = env_of(&[
            ("MEDPHASE_PORT", "9100"),
            ("MEDPHASE_CORS_ORIGINS", "https://a.example.org, https://b.example.org,"),
            ("MEDPHASE_LOG_JSON", "true"),
        ]);

        apply_env_overrides(&mut schema, lookup).unwrap();
        assert_eq!(schema.server.port, 9100);
        assert_eq!(
            schema.cors.allowed_origins,
            vec!["https://a.example.org", "https://b.example.org"]
        );
        assert!(schema.logging.json);
    }

    #[test]
    fn test_env_override_rejects_garbage_port() {
        let mut schema = ConfigSchema::default();
        let err = apply_env_overrides(&mut schema, env_of(&[("MEDPHASE_PORT", "seventy")]))
            .unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::InvalidConfigValue);
    }
}

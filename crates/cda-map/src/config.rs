//! Loading and validating mapping template files.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use cda_model::{MappingTemplates, RecordKind};
use tracing::debug;

/// Built-in template set, used when no template file is given.
pub const DEFAULT_TEMPLATES: &str = include_str!("../templates/default.toml");
const DEFAULT_ORIGIN: &str = "<built-in templates>";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read template file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML templates {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("template `{kind}` field `{field}` lists no paths")]
    EmptyPaths { kind: String, field: String },

    #[error("unknown record kind `{key}` in templates")]
    UnknownKind { key: String },
}

pub fn load_templates(path: &Path) -> Result<MappingTemplates, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_templates(&contents, path)
}

pub fn parse_templates(contents: &str, origin: &Path) -> Result<MappingTemplates, ConfigError> {
    let templates: MappingTemplates =
        toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
    validate_templates(&templates)?;
    debug!(origin = %origin.display(), kinds = templates.len(), "loaded mapping templates");
    Ok(templates)
}

pub fn default_templates() -> Result<MappingTemplates, ConfigError> {
    parse_templates(DEFAULT_TEMPLATES, Path::new(DEFAULT_ORIGIN))
}

/// Every top-level key names a record kind and every leaf lists a path.
pub fn validate_templates(templates: &MappingTemplates) -> Result<(), ConfigError> {
    for (key, template) in templates.iter() {
        if RecordKind::from_template_key(key).is_none() {
            return Err(ConfigError::UnknownKind {
                key: key.to_string(),
            });
        }
        if let Some((field, _)) = template
            .leaves()
            .into_iter()
            .find(|(_, paths)| paths.paths.is_empty())
        {
            return Err(ConfigError::EmptyPaths {
                kind: key.to_string(),
                field,
            });
        }
    }
    Ok(())
}

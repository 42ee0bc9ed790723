//! Run settings from an optional `roster.toml` plus command-line overrides.
//!
//! ```toml
//! tenant = "uni-seoul"
//! store = "records.json"
//! identity_key_env = "ROSTER_IDENTITY_KEY"
//! min_confidence = 90
//!
//! [columns]
//! "비고" = ""            # leave unmapped
//! "Student Name" = "nameEn"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use roster_model::mapping::CONFIDENCE_FUZZY;
use roster_model::{ModelError, TargetField, TenantId};
use serde::Deserialize;
use thiserror::Error;

/// Config file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "roster.toml";
pub const DEFAULT_STORE_FILE: &str = "roster-records.json";
pub const DEFAULT_IDENTITY_KEY_ENV: &str = "ROSTER_IDENTITY_KEY";

/// Column override values that mean "leave this column unmapped".
const UNMAPPED_MARKERS: [&str; 3] = ["", "-", "none"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid column override '{column}'")]
    Column {
        column: String,
        #[source]
        source: ModelError,
    },

    #[error("column override must look like HEADER=FIELD: '{0}'")]
    ColumnSyntax(String),

    #[error("min_confidence must be between 1 and 100, got {0}")]
    MinConfidence(u8),

    #[error("invalid tenant")]
    Tenant(#[source] ModelError),

    #[error("no tenant configured; pass --tenant or set `tenant` in the config file")]
    MissingTenant,
}

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub tenant: Option<String>,
    pub store: Option<PathBuf>,
    pub identity_key_env: Option<String>,
    pub min_confidence: Option<u8>,
    /// Source header to field name; an empty value unmaps the column.
    pub columns: BTreeMap<String, String>,
}

impl FileConfig {
    /// Loads `path`, or `roster.toml` from the working directory when no path
    /// is given. Only an explicitly named file is required to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents, &path),
            Err(source) if source.kind() == io::ErrorKind::NotFound && !required => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line; each one beats the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub tenant: Option<String>,
    pub store: Option<PathBuf>,
    pub min_confidence: Option<u8>,
    /// Raw `HEADER=FIELD` arguments.
    pub columns: Vec<String>,
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tenant: Option<TenantId>,
    pub store: PathBuf,
    pub identity_key_env: String,
    pub min_confidence: u8,
    pub columns: BTreeMap<String, Option<TargetField>>,
}

impl Settings {
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self, ConfigError> {
        let tenant = overrides
            .tenant
            .or(file.tenant)
            .map(TenantId::new)
            .transpose()
            .map_err(ConfigError::Tenant)?;

        let min_confidence = overrides
            .min_confidence
            .or(file.min_confidence)
            .unwrap_or(CONFIDENCE_FUZZY);
        if !(1..=100).contains(&min_confidence) {
            return Err(ConfigError::MinConfidence(min_confidence));
        }

        let mut columns = BTreeMap::new();
        for (column, field) in &file.columns {
            columns.insert(column.trim().to_string(), parse_field(column, field)?);
        }
        for raw in &overrides.columns {
            let (column, field) = raw
                .split_once('=')
                .ok_or_else(|| ConfigError::ColumnSyntax(raw.clone()))?;
            columns.insert(column.trim().to_string(), parse_field(column, field)?);
        }

        Ok(Self {
            tenant,
            store: overrides
                .store
                .or(file.store)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE)),
            identity_key_env: file
                .identity_key_env
                .unwrap_or_else(|| DEFAULT_IDENTITY_KEY_ENV.to_string()),
            min_confidence,
            columns,
        })
    }

    /// The tenant, required by every command that touches the store.
    pub fn require_tenant(&self) -> Result<&TenantId, ConfigError> {
        self.tenant.as_ref().ok_or(ConfigError::MissingTenant)
    }
}

fn parse_field(column: &str, field: &str) -> Result<Option<TargetField>, ConfigError> {
    let field = field.trim();
    if UNMAPPED_MARKERS
        .iter()
        .any(|marker| marker.eq_ignore_ascii_case(field))
    {
        return Ok(None);
    }
    field
        .parse::<TargetField>()
        .map(Some)
        .map_err(|source| ConfigError::Column {
            column: column.trim().to_string(),
            source,
        })
}

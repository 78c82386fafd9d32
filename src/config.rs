use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Service configuration, read from an optional YAML file and overridden by
/// `INDIVIDUAL_*` environment variables.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub server: ServerConfig,
    pub perms: PermissionConfig,
    pub custom_filters: Vec<CustomFilterConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub database: String,
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            database: "individual.db".to_string(),
            cors_origin: None,
        }
    }
}

/// Right codes required by each operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    pub individual_search: Vec<String>,
    pub individual_create: Vec<String>,
    pub individual_update: Vec<String>,
    pub individual_delete: Vec<String>,
    pub group_search: Vec<String>,
    pub group_create: Vec<String>,
    pub group_update: Vec<String>,
    pub group_delete: Vec<String>,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        fn codes(code: &str) -> Vec<String> {
            vec![code.to_string()]
        }

        Self {
            individual_search: codes("159001"),
            individual_create: codes("159002"),
            individual_update: codes("159003"),
            individual_delete: codes("159004"),
            group_search: codes("180001"),
            group_create: codes("180002"),
            group_update: codes("180003"),
            group_delete: codes("180004"),
        }
    }
}

/// A custom-filter wizard definition: the `json_ext` attributes it exposes
/// for a `(module_name, object_type)` pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomFilterConfig {
    pub module_name: String,
    pub object_type: String,
    pub fields: Vec<CustomFilterFieldConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomFilterFieldConfig {
    pub field: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

impl RegistryConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_yaml(&content)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            Some(path) => {
                tracing::warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(database) = std::env::var("INDIVIDUAL_DATABASE") {
            self.server.database = database;
        }
        if let Ok(port) = std::env::var("INDIVIDUAL_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid INDIVIDUAL_PORT value '{}'", port),
            }
        }
    }
}

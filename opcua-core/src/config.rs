use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use opcua_types::ApplicationDescription;
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading/writing config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config failed validation: {0}")]
    Invalid(String),
}

/// Shared load/save/validate surface for any YAML-backed configuration
/// struct in this workspace, mirroring the split between generic
/// persistence (this trait) and the concrete knobs a particular config
/// type carries.
pub trait Config: Serialize + DeserializeOwned + Sized {
    fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        let mut file = File::create(path)?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError>;

    fn application_name(&self) -> String;
    fn application_uri(&self) -> String;
    fn product_uri(&self) -> String;
    fn discovery_urls(&self) -> Vec<String>;

    fn application_description(&self) -> ApplicationDescription {
        ApplicationDescription {
            application_uri: self.application_uri(),
            product_uri: self.product_uri(),
            application_name: self.application_name().as_str().into(),
            application_type: opcua_types::ApplicationType::Server,
            discovery_urls: self.discovery_urls(),
        }
    }
}

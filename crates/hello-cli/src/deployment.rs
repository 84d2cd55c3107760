//! `deployment.json`: the contract a later `interact` session joins

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Default location, relative to the working directory
pub const DEPLOYMENT_FILE: &str = "deployment.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
}

impl Deployment {
    pub fn new(contract_address: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            deployed_at: Some(Utc::now()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::DeploymentMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Deployment::load(&dir.path().join(DEPLOYMENT_FILE)).unwrap_err();
        assert!(err.to_string().starts_with("No "));
        assert!(err.to_string().contains("deployment.json found!"));
    }

    #[test]
    fn test_deployed_at_is_optional() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEPLOYMENT_FILE);
        std::fs::write(&path, r#"{ "contractAddress": "ab" }"#).unwrap();

        let deployment = Deployment::load(&path).unwrap();
        assert_eq!(deployment.contract_address, "ab");
        assert_eq!(deployment.deployed_at, None);

        Deployment::new("cd").save(&path).unwrap();
        let saved = Deployment::load(&path).unwrap();
        assert_eq!(saved.contract_address, "cd");
        assert!(saved.deployed_at.is_some());
    }
}

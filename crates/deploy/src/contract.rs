//! Compiled contract artifacts.
//!
//! The compiler toolchain is an external collaborator; this module only
//! consumes its output: the creation bytecode plus the ordered, typed
//! constructor parameter list.

use std::path::Path;

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Constructor parameter types the deployer can encode. Each occupies a
/// single static 32-byte word in the creation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParamType {
    Address,
    Uint256,
    Uint64,
    Bytes32,
}

/// One named, typed constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorParam {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
}

/// A deployable contract artifact: name, creation bytecode, and the
/// constructor signature its arguments must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifact {
    /// Contract name; together with the network key this addresses one
    /// deployment record.
    pub contract_name: String,
    /// Creation bytecode, without constructor arguments appended.
    pub bytecode: Bytes,
    /// Ordered constructor parameters.
    #[serde(default)]
    pub constructor: Vec<ConstructorParam>,
}

impl ContractArtifact {
    /// Load an artifact from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Contract artifact not found: {}", path.display());
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read artifact from {}", path.display()))?;
        let artifact: Self =
            serde_json::from_str(&content).context("Failed to parse contract artifact JSON")?;

        if artifact.contract_name.is_empty() {
            anyhow::bail!("Contract artifact has an empty contract_name");
        }
        if artifact.bytecode.is_empty() {
            anyhow::bail!(
                "Contract artifact '{}' has empty bytecode",
                artifact.contract_name
            );
        }

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    const ARTIFACT: &str = r#"{
        "contract_name": "LottOne",
        "bytecode": "0x6080604052",
        "constructor": [
            { "name": "token_address", "type": "address" },
            { "name": "coordinator_address", "type": "address" },
            { "name": "key_hash", "type": "bytes32" },
            { "name": "subscription_id", "type": "uint64" }
        ]
    }"#;

    #[test]
    fn test_load_artifact() {
        let temp_dir = TempDir::new("castor-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("LottOne.json");
        std::fs::write(&path, ARTIFACT).unwrap();

        let artifact = ContractArtifact::load_from_file(&path).unwrap();
        assert_eq!(artifact.contract_name, "LottOne");
        assert_eq!(artifact.constructor.len(), 4);
        assert_eq!(artifact.constructor[0].kind, ParamType::Address);
        assert_eq!(artifact.constructor[3].kind, ParamType::Uint64);
        assert_eq!(artifact.bytecode.len(), 5);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new("castor-test").expect("Failed to create temp dir");
        assert!(ContractArtifact::load_from_file(&temp_dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_empty_bytecode_rejected() {
        let temp_dir = TempDir::new("castor-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("empty.json");
        std::fs::write(
            &path,
            r#"{ "contract_name": "Empty", "bytecode": "0x", "constructor": [] }"#,
        )
        .unwrap();

        assert!(ContractArtifact::load_from_file(&path).is_err());
    }
}

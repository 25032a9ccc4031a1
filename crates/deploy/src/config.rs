//! Network registry: per-network deployment configuration.
//!
//! Networks are data entries in a single TOML table rather than one code path
//! per network. Adding a deployment target means adding a `[networks.<key>]`
//! section, not new logic:
//!
//! ```toml
//! [networks.bsc-testnet]
//! rpc_endpoint = "https://bsc-testnet.example"
//! chain_id = 97
//!
//! [networks.bsc-testnet.params]
//! token_address = "0xf59de020d650e69ef0755bf37f3d16b80ee132f5"
//! prize_fund = "100.0"
//! ```
//!
//! Resolution performs no network I/O. Validation is exhaustive: every
//! missing or malformed field of a profile is collected into a single
//! [`DeployError::ConfigInvalid`] so the operator can fix the file in one
//! pass.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use alloy_core::primitives::{Address, B256};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DeployError, FieldError};

/// A contract parameter value as it appears in the registry file.
///
/// TOML distinguishes integers from strings; everything richer (addresses,
/// hashes, decimal amounts) travels as a string and is typed against the
/// contract constructor by the parameter builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(u64),
    Text(String),
}

/// One deployable target, fully validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    /// Unique key identifying the network in the registry.
    pub network_key: String,
    /// JSON-RPC endpoint for the network.
    pub rpc_endpoint: Url,
    /// Chain id the endpoint must report before anything is signed.
    pub chain_id: u64,
    /// Address of the network's wrapped native token, when the contract
    /// needs one.
    pub native_token_address: Option<Address>,
    /// Contract-specific parameters, keyed by constructor parameter name.
    pub params: BTreeMap<String, ParamValue>,
}

/// Raw per-network entry as deserialized from the registry file. All fields
/// optional so validation can report every problem at once instead of failing
/// at the first serde error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawNetworkEntry {
    rpc_endpoint: Option<String>,
    chain_id: Option<i64>,
    native_token_address: Option<String>,
    #[serde(default)]
    params: BTreeMap<String, ParamValue>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    networks: BTreeMap<String, RawNetworkEntry>,
}

/// The configuration source for all deployable networks.
#[derive(Debug, Default)]
pub struct NetworkRegistry {
    entries: BTreeMap<String, RawNetworkEntry>,
}

impl NetworkRegistry {
    /// Load the registry from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, DeployError> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Network registry file not found: {}",
                path.display()
            )
            .into());
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read network registry from {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parse the registry from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, DeployError> {
        let file: RegistryFile =
            toml::from_str(content).context("Failed to parse network registry as TOML")?;
        Ok(Self {
            entries: file.networks,
        })
    }

    /// Keys of all networks in the registry, for CLI listings.
    pub fn network_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolve a network key into a validated [`NetworkProfile`].
    pub fn resolve(&self, network_key: &str) -> Result<NetworkProfile, DeployError> {
        let entry = self
            .entries
            .get(network_key)
            .ok_or_else(|| DeployError::ConfigNotFound {
                network: network_key.to_string(),
            })?;

        let mut fields = Vec::new();

        let rpc_endpoint = validate_endpoint(entry.rpc_endpoint.as_deref(), &mut fields);
        let chain_id = validate_chain_id(entry.chain_id, &mut fields);
        let native_token_address = match entry.native_token_address.as_deref() {
            Some(raw) => validate_address("native_token_address", raw, &mut fields),
            None => None,
        };

        for (name, value) in &entry.params {
            validate_param(name, value, &mut fields);
        }

        if !fields.is_empty() {
            return Err(DeployError::ConfigInvalid {
                network: network_key.to_string(),
                fields,
            });
        }

        Ok(NetworkProfile {
            network_key: network_key.to_string(),
            // Unwraps are unreachable: a None puts an entry in `fields` above.
            rpc_endpoint: rpc_endpoint.unwrap(),
            chain_id: chain_id.unwrap(),
            native_token_address,
            params: entry.params.clone(),
        })
    }
}

fn validate_endpoint(raw: Option<&str>, fields: &mut Vec<FieldError>) -> Option<Url> {
    let Some(raw) = raw else {
        fields.push(FieldError {
            field: "rpc_endpoint".to_string(),
            reason: "missing".to_string(),
        });
        return None;
    };
    if raw.is_empty() {
        fields.push(FieldError {
            field: "rpc_endpoint".to_string(),
            reason: "empty".to_string(),
        });
        return None;
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(url) => {
            fields.push(FieldError {
                field: "rpc_endpoint".to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
            None
        }
        Err(e) => {
            fields.push(FieldError {
                field: "rpc_endpoint".to_string(),
                reason: format!("not a valid URL: {e}"),
            });
            None
        }
    }
}

fn validate_chain_id(raw: Option<i64>, fields: &mut Vec<FieldError>) -> Option<u64> {
    match raw {
        None => {
            fields.push(FieldError {
                field: "chain_id".to_string(),
                reason: "missing".to_string(),
            });
            None
        }
        Some(id) if id <= 0 => {
            fields.push(FieldError {
                field: "chain_id".to_string(),
                reason: format!("must be a positive integer, got {id}"),
            });
            None
        }
        Some(id) => Some(id as u64),
    }
}

fn validate_address(field: &str, raw: &str, fields: &mut Vec<FieldError>) -> Option<Address> {
    match Address::from_str(raw) {
        Ok(addr) => Some(addr),
        Err(_) => {
            fields.push(FieldError {
                field: field.to_string(),
                reason: "not a well-formed 20-byte hex address".to_string(),
            });
            None
        }
    }
}

/// Shape-check a contract parameter. Naming conventions carry the expected
/// shape: `*_address` fields must parse as addresses and `*_hash` fields as
/// 32-byte hashes. Typing against the constructor happens later; this pass
/// catches the literal `"0x..."` placeholders the registry tends to
/// accumulate before any funds can be spent.
fn validate_param(name: &str, value: &ParamValue, fields: &mut Vec<FieldError>) {
    match value {
        ParamValue::Integer(_) => {}
        ParamValue::Text(text) if text.is_empty() => fields.push(FieldError {
            field: name.to_string(),
            reason: "empty".to_string(),
        }),
        ParamValue::Text(text) => {
            if name.ends_with("_address") && Address::from_str(text).is_err() {
                fields.push(FieldError {
                    field: name.to_string(),
                    reason: "not a well-formed 20-byte hex address".to_string(),
                });
            } else if name.ends_with("_hash") && B256::from_str(text).is_err() {
                fields.push(FieldError {
                    field: name.to_string(),
                    reason: "not a well-formed 32-byte hex value".to_string(),
                });
            }
        }
    }
}

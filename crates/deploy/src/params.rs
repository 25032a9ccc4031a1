//! Constructor argument assembly.
//!
//! Maps named fields of a [`NetworkProfile`] into the positional, typed
//! argument list a contract constructor declares, then ABI-encodes the
//! arguments onto the creation bytecode. Built once per attempt and never
//! mutated afterwards.

use std::str::FromStr;

use alloy_core::primitives::{Address, B256, Bytes, U256};

use crate::amount::{self, AmountError};
use crate::config::{NetworkProfile, ParamValue};
use crate::contract::{ContractArtifact, ParamType};
use crate::error::DeployError;

/// One typed constructor argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Address(Address),
    Uint256(U256),
    Uint64(u64),
    Bytes32(B256),
}

impl ArgValue {
    /// ABI-encode the value as a single static 32-byte word.
    fn abi_word(&self) -> [u8; 32] {
        match self {
            ArgValue::Address(addr) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(addr.as_slice());
                word
            }
            ArgValue::Uint256(value) => value.to_be_bytes::<32>(),
            ArgValue::Uint64(value) => {
                let mut word = [0u8; 32];
                word[24..].copy_from_slice(&value.to_be_bytes());
                word
            }
            ArgValue::Bytes32(hash) => hash.0,
        }
    }
}

/// The ordered, typed constructor arguments for one deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorArgumentSet {
    args: Vec<ArgValue>,
}

impl ConstructorArgumentSet {
    /// The arguments in constructor order.
    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    /// ABI-encode the arguments. All supported types are static single
    /// words, so the encoding is the concatenation of one word per argument.
    pub fn encode(&self) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(self.args.len() * 32);
        for arg in &self.args {
            encoded.extend_from_slice(&arg.abi_word());
        }
        encoded
    }

    /// The full contract-creation payload: creation bytecode with the
    /// encoded constructor arguments appended.
    pub fn creation_payload(&self, bytecode: &Bytes) -> Bytes {
        let mut payload = Vec::with_capacity(bytecode.len() + self.args.len() * 32);
        payload.extend_from_slice(bytecode);
        payload.extend_from_slice(&self.encode());
        payload.into()
    }
}

/// Build the constructor arguments for `artifact` from the named parameters
/// of `profile`.
///
/// `uint256` parameters given as decimal strings are treated as
/// human-readable fund amounts and shifted into base units by `decimals`
/// (exactly, never through floating point); `uint256` parameters given as
/// TOML integers are taken as base units verbatim.
pub fn build_arguments(
    profile: &NetworkProfile,
    artifact: &ContractArtifact,
    decimals: u32,
) -> Result<ConstructorArgumentSet, DeployError> {
    let mut args = Vec::with_capacity(artifact.constructor.len());

    for param in &artifact.constructor {
        let value =
            profile
                .params
                .get(&param.name)
                .ok_or_else(|| DeployError::MissingParameter {
                    network: profile.network_key.clone(),
                    contract: artifact.contract_name.clone(),
                    field: param.name.clone(),
                })?;

        args.push(coerce(&param.name, param.kind, value, decimals)?);
    }

    tracing::debug!(
        contract = %artifact.contract_name,
        network = %profile.network_key,
        count = args.len(),
        "Constructor arguments assembled"
    );

    Ok(ConstructorArgumentSet { args })
}

fn coerce(
    field: &str,
    kind: ParamType,
    value: &ParamValue,
    decimals: u32,
) -> Result<ArgValue, DeployError> {
    let mismatch = |reason: String| DeployError::TypeMismatch {
        field: field.to_string(),
        expected: kind.to_string(),
        reason,
    };

    match (kind, value) {
        (ParamType::Address, ParamValue::Text(text)) => Address::from_str(text)
            .map(ArgValue::Address)
            .map_err(|_| mismatch("not a well-formed 20-byte hex address".to_string())),
        (ParamType::Bytes32, ParamValue::Text(text)) => B256::from_str(text)
            .map(ArgValue::Bytes32)
            .map_err(|_| mismatch("not a well-formed 32-byte hex value".to_string())),
        (ParamType::Uint64, ParamValue::Integer(value)) => Ok(ArgValue::Uint64(*value)),
        (ParamType::Uint64, ParamValue::Text(text)) => text
            .parse::<u64>()
            .map(ArgValue::Uint64)
            .map_err(|_| mismatch("not an unsigned 64-bit integer".to_string())),
        (ParamType::Uint256, ParamValue::Integer(value)) => {
            Ok(ArgValue::Uint256(U256::from(*value)))
        }
        (ParamType::Uint256, ParamValue::Text(text)) => {
            amount::to_base_units(text, decimals).map(ArgValue::Uint256).map_err(|e| match e {
                AmountError::TooManyFractionalDigits { .. } => DeployError::AmountPrecision {
                    field: field.to_string(),
                    decimals,
                },
                AmountError::Malformed(_) | AmountError::Overflow { .. } => {
                    mismatch(e.to_string())
                }
            })
        }
        (ParamType::Address | ParamType::Bytes32, ParamValue::Integer(_)) => {
            Err(mismatch("integer supplied where hex data is required".to_string()))
        }
    }
}

//! Error taxonomy for the deployment pipeline.
//!
//! Every stage surfaces a typed [`DeployError`] so callers (and the CLI exit
//! code mapping) can distinguish configuration mistakes from secret problems
//! from on-chain failures without parsing message strings.

use alloy_core::primitives::{Address, B256};
use thiserror::Error;

/// A single invalid or missing configuration field, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Errors surfaced by the deployment pipeline.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The requested network key does not exist in the registry.
    #[error("no network named '{network}' in the registry")]
    ConfigNotFound { network: String },

    /// The network profile failed validation. All offending fields are
    /// collected so a misconfiguration is fixable in one pass.
    #[error("invalid configuration for network '{network}': [{}]", format_fields(.fields))]
    ConfigInvalid {
        network: String,
        fields: Vec<FieldError>,
    },

    /// The deployer key environment variable is not set.
    #[error("deployer key '{var}' is not set in the environment")]
    SecretMissing { var: String },

    /// The deployer key is present but malformed. Only the observed length is
    /// reported, never the value itself.
    #[error("deployer key '{var}' is malformed: expected exactly 64 hex characters without a 0x prefix, got {length} characters")]
    SecretMalformed { var: String, length: usize },

    /// The contract constructor requires a parameter the profile does not have.
    #[error("network '{network}' is missing parameter '{field}' required by the constructor of '{contract}'")]
    MissingParameter {
        network: String,
        contract: String,
        field: String,
    },

    /// A profile parameter cannot be coerced to the type the constructor
    /// declares.
    #[error("parameter '{field}' cannot be coerced to {expected}: {reason}")]
    TypeMismatch {
        field: String,
        expected: String,
        reason: String,
    },

    /// A decimal amount carries more fractional digits than the base-unit
    /// shift supports; truncating silently would spend the wrong amount.
    #[error("amount '{field}' has more fractional digits than the {decimals}-decimal base unit supports")]
    AmountPrecision { field: String, decimals: u32 },

    /// The connected endpoint reports a different chain than the profile
    /// declares. Nothing is signed when this fires.
    #[error("endpoint for network '{network}' reports chain id {reported}, expected {expected}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        reported: u64,
    },

    /// Broadcasting the deployment transaction failed after the retry budget.
    #[error("failed to submit deployment transaction for '{contract}' on '{network}'")]
    SubmissionFailed {
        network: String,
        contract: String,
        #[source]
        source: anyhow::Error,
    },

    /// The transaction was broadcast but not mined within the polling budget.
    /// A `Pending` record with the transaction hash was persisted; re-running
    /// resumes polling without resubmitting.
    #[error("transaction {tx_hash} not confirmed after {attempts} polling attempts; re-run to resume")]
    ConfirmationTimeout { tx_hash: B256, attempts: u32 },

    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    TransactionReverted {
        tx_hash: B256,
        reason: Option<String>,
    },

    /// A confirmed deployment already exists for this (network, contract)
    /// pair and no force flag was given.
    #[error("contract '{contract}' is already deployed on '{network}' at {address}; use --force to redeploy")]
    AlreadyDeployed {
        network: String,
        contract: String,
        address: Address,
    },

    /// Local I/O and serialization plumbing (record store, artifact files).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DeployError {
    /// Process exit code for the CLI: 0 is reserved for a confirmed
    /// deployment, the rest distinguish error categories.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::ConfigNotFound { .. }
            | DeployError::ConfigInvalid { .. }
            | DeployError::MissingParameter { .. }
            | DeployError::TypeMismatch { .. }
            | DeployError::AmountPrecision { .. } => 2,
            DeployError::SecretMissing { .. } | DeployError::SecretMalformed { .. } => 3,
            DeployError::ChainIdMismatch { .. }
            | DeployError::SubmissionFailed { .. }
            | DeployError::TransactionReverted { .. }
            | DeployError::AlreadyDeployed { .. } => 4,
            DeployError::ConfirmationTimeout { .. } => 5,
            DeployError::Other(_) => 1,
        }
    }
}

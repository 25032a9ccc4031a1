//! Main deployer that orchestrates one contract deployment end to end.
//!
//! Pipeline per `(network, contract)` request: resolve configuration,
//! resolve secrets, assemble constructor arguments, execute, record. Every
//! stage fails fast; nothing after the failing stage runs, and no record
//! exists unless the executor broadcast something.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{NetworkProfile, NetworkRegistry};
use crate::contract::ContractArtifact;
use crate::error::{DeployError, FieldError};
use crate::executor::{ChainClient, DeploymentExecutor, HttpChainClient, PollConfig};
use crate::params;
use crate::recorder::{DeploymentRecord, DeploymentRecorder, DeploymentStatus};
use crate::secrets::{Environment, SecretResolver};

/// The default name for the network registry file.
pub const NETWORKS_FILENAME: &str = "Networks.toml";

/// Decimal shift applied to human-readable fund amounts.
pub const DEFAULT_AMOUNT_DECIMALS: u32 = 18;

/// Orchestrates a contract deployment across the configured networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployer {
    /// Path to the network registry file.
    pub networks_file: PathBuf,
    /// Path to the compiled contract artifact.
    pub artifact_path: PathBuf,
    /// Directory holding one deployment record per (network, contract) pair.
    pub records_dir: PathBuf,
    /// Decimal shift for fund amounts.
    pub amount_decimals: u32,
    /// Polling and retry budgets.
    pub poll: PollConfig,
}

impl Deployer {
    /// Deploy the configured artifact to `network_key` over HTTP JSON-RPC.
    ///
    /// `force` redeploys over a previously confirmed record, which is
    /// discarded only once the replacement transaction is broadcast; without
    /// it a confirmed pair short-circuits with
    /// [`DeployError::AlreadyDeployed`] before any chain I/O.
    pub async fn deploy_contract(
        &self,
        network_key: &str,
        force: bool,
        env: &Environment,
    ) -> Result<DeploymentRecord, DeployError> {
        self.run(network_key, force, env, |profile| {
            Ok(Arc::new(HttpChainClient::new(profile.rpc_endpoint.clone())?))
        })
        .await
    }

    /// Run the pipeline, building the chain client from the resolved
    /// profile. Tests inject a scripted client through `make_client`.
    pub async fn run(
        &self,
        network_key: &str,
        force: bool,
        env: &Environment,
        make_client: impl FnOnce(&NetworkProfile) -> Result<Arc<dyn ChainClient>, DeployError>,
    ) -> Result<DeploymentRecord, DeployError> {
        let registry = NetworkRegistry::load_from_file(&self.networks_file)?;
        let profile = registry.resolve(network_key)?;
        let client = make_client(&profile)?;
        let artifact = ContractArtifact::load_from_file(&self.artifact_path)?;
        let recorder = DeploymentRecorder::new(&self.records_dir)?;

        // Serialize concurrent attempts at the same pair for the whole run.
        let _lock = recorder.lock(&profile.network_key, &artifact.contract_name)?;

        let executor = DeploymentExecutor::new(client, self.poll);

        let existing = recorder.load(&profile.network_key, &artifact.contract_name)?;
        if let Some(record) = &existing {
            check_recorded_chain_id(record, profile.chain_id)?;
        }

        match existing {
            Some(record) if record.status == DeploymentStatus::Confirmed => {
                if !force {
                    return Err(DeployError::AlreadyDeployed {
                        network: profile.network_key.clone(),
                        contract: artifact.contract_name.clone(),
                        address: record
                            .deployed_address
                            .unwrap_or_default(),
                    });
                }
                tracing::warn!(
                    network = %profile.network_key,
                    contract = %artifact.contract_name,
                    "Forced redeploy over a confirmed deployment"
                );
                // The confirmed record stays in place until the replacement
                // transaction is actually on the wire; a failure in any
                // earlier stage must leave the idempotency guard intact.
                self.fresh_attempt(&executor, &profile, &artifact, env, &recorder, true)
                    .await
            }
            Some(record) if record.status == DeploymentStatus::Pending => {
                // The transaction is already on the wire; skip parameter
                // assembly and signing entirely and just re-poll its hash.
                executor.resume(record, &profile, &recorder).await
            }
            _ => {
                // No record, or a failed attempt the operator is re-running
                // after investigation. Either way a fresh broadcast.
                self.fresh_attempt(&executor, &profile, &artifact, env, &recorder, false)
                    .await
            }
        }
    }

    async fn fresh_attempt(
        &self,
        executor: &DeploymentExecutor,
        profile: &NetworkProfile,
        artifact: &ContractArtifact,
        env: &Environment,
        recorder: &DeploymentRecorder,
        replace_existing: bool,
    ) -> Result<DeploymentRecord, DeployError> {
        let credential = SecretResolver::new(env.clone()).resolve()?;
        let args = params::build_arguments(profile, artifact, self.amount_decimals)?;

        executor
            .deploy(&credential, &args, artifact, profile, recorder, replace_existing)
            .await
    }
}

/// A profile whose chain id disagrees with the recorded deployment is a
/// configuration error, never a silent override.
fn check_recorded_chain_id(record: &DeploymentRecord, profile_chain_id: u64) -> Result<(), DeployError> {
    if record.chain_id != profile_chain_id {
        return Err(DeployError::ConfigInvalid {
            network: record.network_key.clone(),
            fields: vec![FieldError {
                field: "chain_id".to_string(),
                reason: format!(
                    "recorded deployment of '{}' used chain id {}, profile now says {}",
                    record.contract_name, record.chain_id, profile_chain_id
                ),
            }],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::B256;

    #[test]
    fn test_recorded_chain_id_is_immutable() {
        let record = DeploymentRecord::pending("bsc-testnet", "LottOne", 97, B256::repeat_byte(1));

        assert!(check_recorded_chain_id(&record, 97).is_ok());

        let Err(DeployError::ConfigInvalid { fields, .. }) = check_recorded_chain_id(&record, 56)
        else {
            panic!("expected ConfigInvalid");
        };
        assert_eq!(fields[0].field, "chain_id");
    }
}

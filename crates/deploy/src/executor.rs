//! Deployment execution: broadcast once, then poll to an outcome.
//!
//! The executor drives one contract-creation transaction through
//! `Submitted -> Confirmed` or `Submitted -> Failed`. Broadcast happens at
//! most once per invocation; polling retries never resubmit, and a polling
//! budget that runs out leaves a resumable `Pending` record rather than an
//! error state.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::NetworkProfile;
use crate::contract::ContractArtifact;
use crate::error::DeployError;
use crate::params::ConstructorArgumentSet;
use crate::recorder::{DeploymentRecord, DeploymentRecorder};
use crate::rpc;
use crate::secrets::Credential;

/// Outcome of a mined transaction, as reported by the chain client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Whether execution succeeded.
    pub status: bool,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Address of the created contract, for creation transactions.
    pub contract_address: Option<Address>,
    /// Revert reason, when the client exposes one.
    pub revert_reason: Option<String>,
}

/// The chain client boundary: the operations the executor consumes from
/// whatever RPC/wallet stack actually signs and broadcasts.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The chain id the connected endpoint reports.
    async fn chain_id(&self) -> Result<u64>;

    /// Sign and broadcast a contract-creation transaction carrying
    /// `payload`, returning its hash.
    async fn send_deployment(&self, credential: &Credential, payload: Bytes) -> Result<B256>;

    /// The receipt for a transaction, or `None` while it is unmined.
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>>;
}

/// JSON-RPC chain client. Signing is delegated to the node holding the
/// account (`eth_sendTransaction`); clients that sign locally implement
/// [`ChainClient`] themselves using the credential's signing key.
pub struct HttpChainClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpChainClient {
    pub fn new(endpoint: Url) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            endpoint,
        })
    }
}

/// `eth_getTransactionReceipt` response shape, reduced to the fields the
/// executor consumes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    status: String,
    #[serde(deserialize_with = "rpc::deserialize_u64_from_hex")]
    block_number: u64,
    contract_address: Option<Address>,
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn chain_id(&self) -> Result<u64> {
        let raw: String =
            rpc::json_rpc_call(&self.client, self.endpoint.as_str(), "eth_chainId", vec![]).await?;
        rpc::parse_hex_u64(&raw).context("Endpoint returned an invalid chain id")
    }

    async fn send_deployment(&self, credential: &Credential, payload: Bytes) -> Result<B256> {
        let raw: String = rpc::json_rpc_call(
            &self.client,
            self.endpoint.as_str(),
            "eth_sendTransaction",
            vec![serde_json::json!({
                "from": credential.address(),
                "data": payload,
            })],
        )
        .await
        .context("Failed to broadcast contract-creation transaction")?;

        B256::from_str(&raw).context("Endpoint returned an invalid transaction hash")
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>> {
        let raw: Option<RawReceipt> = rpc::json_rpc_call(
            &self.client,
            self.endpoint.as_str(),
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await?;

        Ok(raw.map(|receipt| TxReceipt {
            status: receipt.status == "0x1",
            block_number: receipt.block_number,
            contract_address: receipt.contract_address,
            // Receipts do not carry revert reasons over plain JSON-RPC.
            revert_reason: None,
        }))
    }
}

/// Polling and retry budgets for one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between receipt polls.
    pub interval_secs: u64,
    /// Receipt polls before giving up and leaving the record `Pending`.
    pub max_attempts: u32,
    /// Broadcast retries on transient RPC errors. Retries stop the moment a
    /// transaction hash is obtained.
    pub submit_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: 24,
            submit_retries: 3,
        }
    }
}

/// Executes deployment transactions against a [`ChainClient`].
pub struct DeploymentExecutor {
    client: Arc<dyn ChainClient>,
    poll: PollConfig,
}

impl DeploymentExecutor {
    pub fn new(client: Arc<dyn ChainClient>, poll: PollConfig) -> Self {
        Self { client, poll }
    }

    /// Verify the endpoint serves the chain the profile declares. Nothing is
    /// signed or broadcast until this passes.
    async fn verify_chain(&self, profile: &NetworkProfile, contract: &str) -> Result<(), DeployError> {
        let reported = self
            .client
            .chain_id()
            .await
            .map_err(|source| DeployError::SubmissionFailed {
                network: profile.network_key.clone(),
                contract: contract.to_string(),
                source: source.context("Failed to query endpoint chain id"),
            })?;

        if reported != profile.chain_id {
            return Err(DeployError::ChainIdMismatch {
                network: profile.network_key.clone(),
                expected: profile.chain_id,
                reported,
            });
        }
        Ok(())
    }

    /// Broadcast a fresh contract-creation transaction and poll it to an
    /// outcome. A `Pending` record is persisted as soon as the transaction
    /// hash is known, before any polling.
    ///
    /// With `replace_existing`, a settled record for the pair is removed
    /// right before the new `Pending` record is saved; nothing is removed
    /// unless the broadcast produced a transaction hash.
    pub async fn deploy(
        &self,
        credential: &Credential,
        args: &ConstructorArgumentSet,
        artifact: &ContractArtifact,
        profile: &NetworkProfile,
        recorder: &DeploymentRecorder,
        replace_existing: bool,
    ) -> Result<DeploymentRecord, DeployError> {
        self.verify_chain(profile, &artifact.contract_name).await?;

        let payload = args.creation_payload(&artifact.bytecode);

        tracing::info!(
            network = %profile.network_key,
            contract = %artifact.contract_name,
            signer = %credential.address(),
            payload_bytes = payload.len(),
            "Broadcasting contract-creation transaction"
        );

        let submit = || async { self.client.send_deployment(credential, payload.clone()).await };
        let tx_hash = submit
            .retry(
                ExponentialBuilder::default().with_max_times(self.poll.submit_retries as usize),
            )
            .notify(|err: &anyhow::Error, after: Duration| {
                tracing::warn!(error = %err, retry_in = ?after, "Submission failed, retrying");
            })
            .await
            .map_err(|source| DeployError::SubmissionFailed {
                network: profile.network_key.clone(),
                contract: artifact.contract_name.clone(),
                source,
            })?;

        if replace_existing {
            recorder.remove(&profile.network_key, &artifact.contract_name)?;
        }

        let record = DeploymentRecord::pending(
            &profile.network_key,
            &artifact.contract_name,
            profile.chain_id,
            tx_hash,
        );
        recorder.save(&record)?;

        self.poll_until_settled(record, recorder).await
    }

    /// Resume polling a previously broadcast transaction. Never submits.
    pub async fn resume(
        &self,
        record: DeploymentRecord,
        profile: &NetworkProfile,
        recorder: &DeploymentRecorder,
    ) -> Result<DeploymentRecord, DeployError> {
        self.verify_chain(profile, &record.contract_name).await?;

        tracing::info!(
            network = %record.network_key,
            contract = %record.contract_name,
            tx_hash = %record.tx_hash,
            "Resuming confirmation polling for a pending deployment"
        );

        self.poll_until_settled(record, recorder).await
    }

    /// Poll the transaction receipt until it settles or the attempt budget
    /// runs out. Transient receipt-query errors consume an attempt but do
    /// not abort: the transaction is already on the wire.
    async fn poll_until_settled(
        &self,
        record: DeploymentRecord,
        recorder: &DeploymentRecorder,
    ) -> Result<DeploymentRecord, DeployError> {
        let interval = Duration::from_secs(self.poll.interval_secs);

        for attempt in 1..=self.poll.max_attempts {
            match self.client.transaction_receipt(record.tx_hash).await {
                Ok(Some(receipt)) if receipt.status => {
                    let address = receipt
                        .contract_address
                        .context("Mined creation receipt carries no contract address")?;
                    let confirmed = record.confirmed(address, receipt.block_number);
                    recorder.save(&confirmed)?;

                    tracing::info!(
                        network = %confirmed.network_key,
                        contract = %confirmed.contract_name,
                        address = %address,
                        block = receipt.block_number,
                        "Deployment confirmed"
                    );
                    return Ok(confirmed);
                }
                Ok(Some(receipt)) => {
                    let reason = receipt.revert_reason.clone();
                    let failed = record.failed(receipt.block_number, receipt.revert_reason);
                    recorder.save(&failed)?;

                    return Err(DeployError::TransactionReverted {
                        tx_hash: failed.tx_hash,
                        reason,
                    });
                }
                Ok(None) => {
                    tracing::trace!(
                        tx_hash = %record.tx_hash,
                        attempt,
                        "Transaction not mined yet"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        tx_hash = %record.tx_hash,
                        attempt,
                        error = %e,
                        "Receipt query failed, will poll again"
                    );
                }
            }

            if attempt < self.poll.max_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(DeployError::ConfirmationTimeout {
            tx_hash: record.tx_hash,
            attempts: self.poll.max_attempts,
        })
    }
}

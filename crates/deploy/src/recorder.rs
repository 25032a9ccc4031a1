//! Persistent deployment records.
//!
//! One JSON file per `(network_key, contract_name)` pair under the records
//! directory. The recorder is the only writer; saves go through a temp file
//! and an atomic rename so a crash mid-write can never leave a half-written
//! record that parses on the next load. Status transitions are monotonic:
//! `Pending -> Confirmed` or `Pending -> Failed`, never back.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a deployment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeploymentStatus {
    /// Transaction broadcast, confirmation outcome unknown. Resumable.
    Pending,
    /// Mined successfully; the contract address is final.
    Confirmed,
    /// Mined but reverted. Requires operator investigation.
    Failed,
}

/// The persisted outcome of one deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub network_key: String,
    pub contract_name: String,
    /// Chain id the transaction was broadcast on. Immutable once recorded;
    /// a profile that later disagrees is a configuration error.
    pub chain_id: u64,
    pub status: DeploymentStatus,
    /// Hash of the broadcast contract-creation transaction.
    pub tx_hash: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// A fresh record for a just-broadcast transaction.
    pub fn pending(
        network_key: impl Into<String>,
        contract_name: impl Into<String>,
        chain_id: u64,
        tx_hash: B256,
    ) -> Self {
        Self {
            network_key: network_key.into(),
            contract_name: contract_name.into(),
            chain_id,
            status: DeploymentStatus::Pending,
            tx_hash,
            deployed_address: None,
            block_number: None,
            revert_reason: None,
            created_at: Utc::now(),
        }
    }

    /// Transition to `Confirmed` with the mined address and block.
    pub fn confirmed(mut self, address: Address, block_number: u64) -> Self {
        self.status = DeploymentStatus::Confirmed;
        self.deployed_address = Some(address);
        self.block_number = Some(block_number);
        self
    }

    /// Transition to `Failed`, capturing the revert reason when the chain
    /// client exposes one.
    pub fn failed(mut self, block_number: u64, revert_reason: Option<String>) -> Self {
        self.status = DeploymentStatus::Failed;
        self.block_number = Some(block_number);
        self.revert_reason = revert_reason;
        self
    }
}

/// Exclusive per-pair lock held for the duration of one orchestrated run.
///
/// Serializes concurrent attempts at the same `(network, contract)` pair so
/// two processes can never both broadcast for it.
pub struct RecordLock {
    file: File,
    path: PathBuf,
}

impl Drop for RecordLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release record lock");
        }
    }
}

/// Owns the deployment record store.
#[derive(Debug, Clone)]
pub struct DeploymentRecorder {
    records_dir: PathBuf,
}

impl DeploymentRecorder {
    /// Open (creating if needed) the records directory.
    pub fn new(records_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(records_dir).context(format!(
            "Failed to create records directory {}",
            records_dir.display()
        ))?;
        Ok(Self {
            records_dir: records_dir.to_path_buf(),
        })
    }

    fn record_path(&self, network_key: &str, contract_name: &str) -> PathBuf {
        self.records_dir
            .join(format!("{network_key}--{contract_name}.json"))
    }

    /// Take the exclusive lock for a `(network, contract)` pair. Fails
    /// immediately if another process holds it.
    pub fn lock(&self, network_key: &str, contract_name: &str) -> Result<RecordLock> {
        let path = self
            .records_dir
            .join(format!("{network_key}--{contract_name}.lock"));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .context(format!("Failed to open lock file {}", path.display()))?;

        FileExt::try_lock_exclusive(&file).map_err(|e| {
            if e.kind() == ErrorKind::WouldBlock {
                anyhow::anyhow!(
                    "Another deployment of '{}' on '{}' is in progress",
                    contract_name,
                    network_key
                )
            } else {
                anyhow::Error::from(e)
                    .context(format!("Failed to lock {}", path.display()))
            }
        })?;

        Ok(RecordLock { file, path })
    }

    /// Load the record for a pair, or `None` if no deployment was ever
    /// recorded.
    pub fn load(&self, network_key: &str, contract_name: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(network_key, contract_name);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .context(format!("Failed to read record from {}", path.display()))?;
        let record: DeploymentRecord = serde_json::from_str(&content)
            .context(format!("Failed to parse record {}", path.display()))?;
        Ok(Some(record))
    }

    /// Persist a record, atomically, enforcing monotonic status transitions.
    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        let path = self.record_path(&record.network_key, &record.contract_name);

        if let Some(existing) = self.load(&record.network_key, &record.contract_name)? {
            check_transition(&existing, record)?;
        }

        let json =
            serde_json::to_string_pretty(record).context("Failed to serialize deployment record")?;

        // Write-then-rename within the same directory; a crash leaves either
        // the previous record or the new one, never a torn file.
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)
            .context(format!("Failed to write record to {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .context(format!("Failed to move record into {}", path.display()))?;

        tracing::info!(
            network = %record.network_key,
            contract = %record.contract_name,
            status = %record.status,
            tx_hash = %record.tx_hash,
            "Deployment record saved"
        );
        Ok(())
    }

    /// Remove the record for a pair. Only the forced-redeploy path uses
    /// this; normal transitions never delete history.
    pub fn remove(&self, network_key: &str, contract_name: &str) -> Result<()> {
        let path = self.record_path(network_key, contract_name);
        if path.exists() {
            std::fs::remove_file(&path)
                .context(format!("Failed to remove record {}", path.display()))?;
            tracing::warn!(
                network = %network_key,
                contract = %contract_name,
                "Removed confirmed deployment record (forced redeploy)"
            );
        }
        Ok(())
    }
}

/// Reject status transitions that would rewrite a settled outcome.
fn check_transition(existing: &DeploymentRecord, next: &DeploymentRecord) -> Result<()> {
    use DeploymentStatus::*;

    let ok = match (existing.status, next.status) {
        // Polling updates and outcome settlement for the same broadcast.
        (Pending, _) if existing.tx_hash == next.tx_hash => true,
        // A fresh attempt may replace a failed one, starting over at Pending.
        (Failed, Pending) => true,
        // Idempotent re-save.
        _ => existing == next,
    };

    if !ok {
        anyhow::bail!(
            "Refusing record transition {} -> {} for '{}' on '{}'",
            existing.status,
            next.status,
            existing.contract_name,
            existing.network_key
        );
    }
    Ok(())
}

//! castor-deploy - Multi-network smart-contract deployment library.
//!
//! This crate provides the orchestration logic for deploying a compiled
//! contract to any network in a data-driven registry: configuration and
//! secret resolution, constructor argument assembly, transaction execution
//! with confirmation polling, and idempotent, resumable deployment records.

pub mod amount;
mod config;
mod contract;
mod deployer;
mod error;
mod executor;
mod params;
mod recorder;
pub mod rpc;
mod secrets;

pub use config::{NetworkProfile, NetworkRegistry, ParamValue};
pub use contract::{ConstructorParam, ContractArtifact, ParamType};
pub use deployer::{DEFAULT_AMOUNT_DECIMALS, Deployer, NETWORKS_FILENAME};
pub use error::{DeployError, FieldError};
pub use executor::{ChainClient, DeploymentExecutor, HttpChainClient, PollConfig, TxReceipt};
pub use params::{ArgValue, ConstructorArgumentSet, build_arguments};
pub use recorder::{DeploymentRecord, DeploymentRecorder, DeploymentStatus, RecordLock};
pub use secrets::{
    Credential, DEPLOYER_KEY_VAR, EXPLORER_KEY_VAR, Environment, SecretResolver,
};

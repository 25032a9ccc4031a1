use std::path::PathBuf;

use castor_deploy::{DEFAULT_AMOUNT_DECIMALS, NETWORKS_FILENAME, PollConfig};
use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "castor")]
#[command(
    author,
    version,
    about = "Deploy a compiled contract to any network in the registry"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "CASTOR_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The network key to deploy to, as declared in the registry file.
    #[arg(short, long, env = "CASTOR_NETWORK")]
    pub network: String,

    /// Path to the compiled contract artifact (JSON with contract_name,
    /// bytecode, and the constructor parameter list).
    #[arg(short, long, alias = "artifact", env = "CASTOR_CONTRACT")]
    pub contract: PathBuf,

    /// Path to the network registry file.
    #[arg(long, alias = "networks", env = "CASTOR_NETWORKS_FILE", default_value = NETWORKS_FILENAME)]
    pub networks_file: PathBuf,

    /// Directory where deployment records are stored, one per
    /// (network, contract) pair.
    #[arg(long, env = "CASTOR_RECORDS_DIR", default_value = "deployments")]
    pub records_dir: PathBuf,

    /// Redeploy even when a confirmed record already exists for this
    /// (network, contract) pair.
    #[arg(long, env = "CASTOR_FORCE", default_value_t = false)]
    pub force: bool,

    /// Decimal shift applied to human-readable fund amounts.
    #[arg(long, env = "CASTOR_AMOUNT_DECIMALS", default_value_t = DEFAULT_AMOUNT_DECIMALS)]
    pub amount_decimals: u32,

    /// Seconds between confirmation polls.
    #[arg(long, env = "CASTOR_POLL_INTERVAL", default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Confirmation polls before giving up and leaving the deployment
    /// pending (resumable by re-running).
    #[arg(long, env = "CASTOR_POLL_ATTEMPTS", default_value_t = 24)]
    pub poll_attempts: u32,

    /// Broadcast retries on transient RPC errors.
    #[arg(long, env = "CASTOR_SUBMIT_RETRIES", default_value_t = 3)]
    pub submit_retries: u32,
}

impl Cli {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval_secs: self.poll_interval_secs,
            max_attempts: self.poll_attempts,
            submit_retries: self.submit_retries,
        }
    }
}

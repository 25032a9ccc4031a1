//! castor is a CLI tool to deploy smart contracts across heterogeneous
//! networks from a single data-driven registry.

mod cli;

use anyhow::Result;
use castor_deploy::{Deployer, Environment};
use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let deployer = Deployer {
        networks_file: cli.networks_file.clone(),
        artifact_path: cli.contract.clone(),
        records_dir: cli.records_dir.clone(),
        amount_decimals: cli.amount_decimals,
        poll: cli.poll_config(),
    };

    tracing::info!(
        network = %cli.network,
        artifact = %cli.contract.display(),
        records_dir = %cli.records_dir.display(),
        "Starting deployment..."
    );

    let env = Environment::from_process();

    match deployer.deploy_contract(&cli.network, cli.force, &env).await {
        Ok(record) => {
            tracing::info!(
                network = %record.network_key,
                contract = %record.contract_name,
                address = ?record.deployed_address,
                tx_hash = %record.tx_hash,
                block = ?record.block_number,
                "Deployment confirmed"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Deployment failed");
            std::process::exit(e.exit_code());
        }
    }
}

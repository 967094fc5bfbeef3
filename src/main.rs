mod config;
mod constants;
mod demos;
mod error;
mod ethereum;
mod runner;
mod secret;

use alloy::primitives::Address;
use anyhow::{anyhow, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use config::Config;
use demos::Demo;
use ethereum::utils::validate_address;
use runner::DemoRunner;
use std::path::PathBuf;
use tracing::{error, info};

fn abi_arg() -> Arg {
    Arg::new("abi")
        .long("abi")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Interface file (JSON ABI or one signature per line) instead of the built-in ERC-20 one")
}

fn token_arg() -> Arg {
    Arg::new("token")
        .long("token")
        .value_name("ADDRESS")
        .default_value(constants::USDC)
        .help("ERC-20 contract address")
}

fn cli() -> Command {
    Command::new("eth-rpc-demos")
        .version("0.1.0")
        .about("Walkthrough of balance lookups, transfers, contract reads and writes, and event queries over JSON-RPC")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .value_name("NETWORK")
                .global(true)
                .help("Network to use (ethereum, sepolia, tenderly or any configured one)"),
        )
        .arg(
            Arg::new("rpc-url")
                .short('r')
                .long("rpc-url")
                .value_name("URL")
                .global(true)
                .help("RPC endpoint URL for the selected network"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .help("Print the result as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("balance")
                .about("Look up the ETH balance of an account")
                .arg(
                    Arg::new("address")
                        .long("address")
                        .value_name("ADDRESS")
                        .default_value(constants::DEMO_ACCOUNT),
                ),
        )
        .subcommand(
            Command::new("transfer")
                .about("Sign and send ETH, then wait for the receipt")
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("ADDRESS")
                        .default_value(constants::RECEIVER),
                )
                .arg(
                    Arg::new("amount")
                        .long("amount")
                        .value_name("ETH")
                        .default_value(constants::TRANSFER_AMOUNT),
                ),
        )
        .subcommand(
            Command::new("read")
                .about("Read name, symbol, decimals, supply and a balance from an ERC-20 token")
                .arg(token_arg())
                .arg(
                    Arg::new("holder")
                        .long("holder")
                        .value_name("ADDRESS")
                        .default_value(constants::USDC_HOLDER),
                )
                .arg(abi_arg()),
        )
        .subcommand(
            Command::new("write")
                .about("Transfer ERC-20 tokens and wait for the receipt")
                .arg(token_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("ADDRESS")
                        .default_value(constants::RECEIVER),
                )
                .arg(
                    Arg::new("amount")
                        .long("amount")
                        .value_name("TOKENS")
                        .default_value(constants::TOKEN_TRANSFER_AMOUNT),
                )
                .arg(abi_arg()),
        )
        .subcommand(
            Command::new("events")
                .about("Query and decode contract events from the latest blocks")
                .arg(token_arg())
                .arg(
                    Arg::new("event")
                        .long("event")
                        .value_name("NAME")
                        .default_value(constants::EVENT_NAME),
                )
                .arg(
                    Arg::new("blocks")
                        .long("blocks")
                        .value_name("N")
                        .value_parser(value_parser!(u64).range(1..))
                        .default_value("2")
                        .help("Number of blocks to scan, ending at the latest one"),
                )
                .arg(abi_arg()),
        )
}

fn address_arg(matches: &ArgMatches, id: &str) -> Result<Address> {
    let raw = matches
        .get_one::<String>(id)
        .ok_or_else(|| anyhow!("--{} is required", id))?;
    Ok(validate_address(raw)?)
}

fn string_arg(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

fn demo_from_matches(name: &str, matches: &ArgMatches) -> Result<Demo> {
    let abi = matches.try_get_one::<PathBuf>("abi").ok().flatten().cloned();

    let demo = match name {
        "balance" => Demo::Balance {
            address: address_arg(matches, "address")?,
        },
        "transfer" => Demo::Transfer {
            receiver: address_arg(matches, "to")?,
            amount: string_arg(matches, "amount"),
        },
        "read" => Demo::ReadContract {
            token: address_arg(matches, "token")?,
            holder: address_arg(matches, "holder")?,
            abi,
        },
        "write" => Demo::WriteContract {
            token: address_arg(matches, "token")?,
            receiver: address_arg(matches, "to")?,
            amount: string_arg(matches, "amount"),
            abi,
        },
        "events" => Demo::Events {
            token: address_arg(matches, "token")?,
            event: string_arg(matches, "event"),
            blocks: matches
                .get_one::<u64>("blocks")
                .copied()
                .unwrap_or(constants::EVENT_BLOCK_SPAN),
            abi,
        },
        other => return Err(anyhow!("Unknown demo '{}'", other)),
    };

    Ok(demo)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries demo output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = cli().get_matches();

    // Handle special commands first
    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Config::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default config path: {}", e);
                return Err(e);
            }
        }
    }

    let Some((name, sub_matches)) = matches.subcommand() else {
        cli().print_help()?;
        println!();
        return Ok(());
    };
    let demo = demo_from_matches(name, sub_matches)?;

    // Load configuration
    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = match Config::load_or_default(config_path).await {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    let network = matches.get_one::<String>("network").cloned();

    if let Some(rpc_url) = matches.get_one::<String>("rpc-url") {
        let target = runner::select_network(&config, network.as_deref(), &demo);
        config.set_rpc_url(&target, rpc_url.clone());
    }

    info!("Starting {} demo", demo.name());
    let runner = DemoRunner::new(config, network, matches.get_flag("json"));

    if let Err(e) = runner.run(demo).await {
        error!("Demo failed: {}", e);
        return Err(e);
    }

    Ok(())
}

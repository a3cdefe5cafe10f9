//! `krypt`: command-line front end for the Krypt transfer client.

use anyhow::Context;
use clap::Parser;
use krypt_node::{ClientConfig, KryptClient, ShutdownController};
use krypt_types::{Address, SessionState, TransactionDraft};
use krypt_utils::{init_logging, LogFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "krypt", about = "Send annotated transfers and browse the ledger history")]
struct Cli {
    /// JSON-RPC endpoint of the wallet provider.
    #[arg(long, env = "KRYPT_RPC_URL")]
    rpc_url: Option<String>,

    /// Address of the ledger contract.
    #[arg(long, env = "KRYPT_CONTRACT_ADDRESS")]
    contract: Option<Address>,

    /// JSON ABI descriptor (bare ABI array or build artifact) to verify the contract interface against.
    #[arg(long, env = "KRYPT_ABI_PATH")]
    abi: Option<PathBuf>,

    /// File holding the last-known transaction count.
    #[arg(long, env = "KRYPT_HINT_FILE")]
    hint_file: Option<PathBuf>,

    /// Seconds to wait for a ledger write to be mined.
    #[arg(long, env = "KRYPT_CONFIRMATION_TIMEOUT_SECS")]
    confirmation_timeout_secs: Option<u64>,

    /// Gas limit sent with the native transfer.
    #[arg(long, env = "KRYPT_GAS_LIMIT_HINT")]
    gas_limit: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "KRYPT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "KRYPT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "KRYPT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Probe the wallet and print the session and transaction count.
    Status,
    /// Ask the wallet to authorize an account.
    Connect,
    /// Send value to a recipient and record it on the ledger.
    Send {
        #[arg(long)]
        to: String,
        /// Decimal amount, e.g. "0.01".
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        keyword: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// List every transfer recorded on the ledger.
    History {
        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Follow wallet account changes until interrupted.
    Watch {
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
    },
}

impl Cli {
    /// Layer CLI flags and environment variables over the file settings.
    fn into_config(self, base: ClientConfig) -> (ClientConfig, Command) {
        let config = ClientConfig {
            rpc_url: self.rpc_url.or(base.rpc_url),
            contract_address: self.contract.or(base.contract_address),
            abi_path: self.abi.or(base.abi_path),
            hint_file: self.hint_file.unwrap_or(base.hint_file),
            confirmation_timeout_secs: self
                .confirmation_timeout_secs
                .unwrap_or(base.confirmation_timeout_secs),
            gas_limit_hint: self.gas_limit.unwrap_or(base.gas_limit_hint),
            log_level: self.log_level.unwrap_or(base.log_level),
            log_format: self.log_format.unwrap_or(base.log_format),
            ..base
        };
        (config, self.command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let (config, command) = cli.into_config(base);
    init_logging(config.log_format, &config.log_level);

    let client = Arc::new(KryptClient::from_config(config).context("failed to set up client")?);
    let state = client.start().await;
    tracing::debug!(%state, "wallet probed");

    match command {
        Command::Status => {
            if let Some(contract) = client.config().contract_address {
                println!("contract: {contract}");
            }
            println!("session: {state}");
            println!("transactions: {}", client.submission_state().count);
        }
        Command::Connect => {
            let account = client.connect().await?;
            println!("connected: {account}");
        }
        Command::Send {
            to,
            amount,
            keyword,
            message,
        } => {
            if !state.is_connected() {
                client.connect().await?;
            }
            let draft = TransactionDraft::new(to, amount, keyword, message);
            match client.submit(&draft).await {
                Ok(receipt) => {
                    println!("native transfer: {}", receipt.native_tx);
                    println!(
                        "ledger record:   {} (block {})",
                        receipt.ledger_receipt.transaction_hash, receipt.ledger_receipt.block_number
                    );
                    println!("transactions:    {}", receipt.count);
                }
                Err(e) => {
                    if e.value_moved_without_record() {
                        eprintln!("warning: value was sent but the ledger has no record of it");
                    }
                    return Err(e.into());
                }
            }
        }
        Command::History { json } => {
            let records = client.refresh().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&*records)?);
            } else if records.is_empty() {
                println!("no transactions");
            } else {
                for r in records.iter() {
                    println!(
                        "{}  {} -> {}  {}  [{}] {}",
                        r.timestamp_display(),
                        r.sender,
                        r.receiver,
                        r.amount,
                        r.keyword,
                        r.message
                    );
                }
            }
        }
        Command::Watch { interval_secs } => {
            println!("session: {state}");
            let mut sessions = client.subscribe_session();
            tokio::spawn(async move {
                while sessions.changed().await.is_ok() {
                    let state: SessionState = *sessions.borrow_and_update();
                    println!("session: {state}");
                }
            });

            let shutdown = Arc::new(ShutdownController::new());
            let signal = shutdown.subscribe();
            let waiter = shutdown.clone();
            tokio::spawn(async move { waiter.wait_for_signal().await });

            client
                .watch_session(Duration::from_secs(interval_secs.max(1)), signal)
                .await;
            tracing::info!("krypt exited cleanly");
        }
    }

    Ok(())
}

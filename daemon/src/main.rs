//! Oracle daemon: entry point for the signature collection server and the
//! transaction CLI.

mod commands;
mod config;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use oracle_chain::{BlockfrostClient, ChainContext};
use oracle_datum::{VoteTally, VoteUse};
use oracle_rpc::{AppState, RpcMetrics, RpcServer};
use oracle_store::SignatureStore;
use oracle_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment, Migrator};
use oracle_types::{NetworkId, PublicKey, ScriptHash, TransactionInput};
use oracle_utils::LogFormat;

use crate::commands::{EscrowArgs, Payer, RequestArgs, SignatureSource, DEFAULT_POLICY_ID};
use crate::config::DaemonConfig;

/// Named LMDB databases plus headroom.
const LMDB_MAX_DBS: u32 = 8;

#[derive(Parser)]
#[command(name = "oracle-daemon", about = "Oracle and escrow coordination for Cardano")]
struct Cli {
    /// Network: "mainnet", anything else selects the test network.
    /// When a config file is provided, defaults to the file's network value.
    #[arg(long, env = "NETWORK_MODE", value_parser = parse_network)]
    network: Option<NetworkId>,

    #[arg(long, env = "BLOCKFROST_PROJECT_ID", hide_env_values = true)]
    blockfrost_project_id: Option<String>,

    /// Blockfrost endpoint overriding the network default.
    #[arg(long, env = "BLOCKFROST_URL")]
    blockfrost_url: Option<String>,

    /// Data directory for the signature store.
    #[arg(long, env = "ORACLE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ORACLE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ORACLE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Compiled oracle validator.
    #[arg(long)]
    oracle_script: Option<PathBuf>,

    /// Compiled escrow validator.
    #[arg(long)]
    escrow_script: Option<PathBuf>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the signature collection server.
    Serve {
        #[arg(long, env = "ORACLE_RPC_BIND")]
        bind: Option<IpAddr>,

        #[arg(long, env = "ORACLE_RPC_PORT")]
        port: Option<u16>,
    },
    /// Oracle script transactions.
    Oracle {
        #[command(subcommand)]
        action: OracleAction,
    },
    /// Escrow script transactions.
    Escrow {
        #[command(subcommand)]
        action: EscrowAction,
    },
    /// Inspect on-chain datums.
    Datum {
        #[command(subcommand)]
        action: DatumAction,
    },
}

#[derive(clap::Subcommand)]
enum OracleAction {
    /// Lock a new proposal datum at the oracle script.
    Request {
        /// Signing key of the paying wallet.
        #[arg(short, long)]
        creator: String,

        #[arg(short, long, default_value = "test_proposal_id")]
        proposal_id: String,

        /// POSIX milliseconds.
        #[arg(short, long, default_value_t = 0)]
        deadline: u64,

        /// Oracle verification keys, hex.
        #[arg(short, long, num_args = 1.., required = true)]
        oracles: Vec<String>,

        #[arg(short, long)]
        min_signatures: u64,

        /// Address receiving the change when results are posted.
        #[arg(short = 'a', long)]
        payment_address: String,

        #[arg(long, default_value = DEFAULT_POLICY_ID)]
        policy_id: ScriptHash,

        /// Lovelace locked with the datum.
        #[arg(long, default_value_t = 10_000_000)]
        amount: u64,
    },
    /// Post signed results to a proposal.
    Respond {
        #[arg(short, long)]
        creator: String,

        /// Oracle output, `txhash#index`.
        #[arg(short, long)]
        input: TransactionInput,

        /// Results text the oracles signed.
        #[arg(short, long)]
        results: String,

        /// Signatures in oracle order, hex. Without them the signature store
        /// supplies the quorum.
        #[arg(short, long, num_args = 1..)]
        signatures: Vec<String>,
    },
    /// Sign a results string with an oracle key.
    Sign {
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        results: String,
    },
}

#[derive(clap::Subcommand)]
enum EscrowAction {
    /// Lock funds at the escrow script.
    Create {
        #[arg(short, long)]
        creator: String,

        #[arg(long, default_value = DEFAULT_POLICY_ID)]
        policy_id: ScriptHash,

        /// POSIX milliseconds after which the creator may reclaim.
        #[arg(short, long)]
        deadline: u64,

        #[arg(short, long, default_value_t = 0)]
        question_index: u64,

        #[arg(long, value_parser = parse_vote_use, default_value = "count")]
        vote_use: VoteUse,

        /// Payee key addresses, one per answer.
        #[arg(short, long, num_args = 1.., required = true)]
        payees: Vec<String>,

        #[arg(long)]
        amount: u64,
    },
    /// Pay out an escrow against a resolved oracle output.
    Claim {
        #[arg(short, long)]
        creator: String,

        #[arg(short, long)]
        escrow: TransactionInput,

        #[arg(short, long)]
        oracle: TransactionInput,

        #[arg(long)]
        receiver: String,

        /// Vote tally: questions split by `|`, votes by `,`, each `count:weight`.
        #[arg(short, long)]
        results: VoteTally,
    },
    /// Return an escrow to its creator after the deadline.
    Reclaim {
        #[arg(short, long)]
        creator: String,

        #[arg(short, long)]
        escrow: TransactionInput,

        /// First slot after the deadline.
        #[arg(long)]
        validity_start: u64,
    },
}

#[derive(clap::Subcommand)]
enum DatumAction {
    /// Print the oracle datum at `txhash#index` as JSON.
    Inspect {
        #[arg(short, long)]
        input: TransactionInput,
    },
}

fn parse_network(s: &str) -> Result<NetworkId, String> {
    Ok(NetworkId::from_mode(s))
}

fn parse_vote_use(s: &str) -> Result<VoteUse, String> {
    match s.to_ascii_lowercase().as_str() {
        "count" | "by-count" => Ok(VoteUse::ByCount),
        "weight" | "by-weight" => Ok(VoteUse::ByWeight),
        other => Err(format!("unknown vote use {other:?}, expected \"count\" or \"weight\"")),
    }
}

/// File settings (or defaults) with flags and env vars on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<DaemonConfig> {
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(project_id) = &cli.blockfrost_project_id {
        config.blockfrost_project_id = project_id.clone();
    }
    if let Some(url) = &cli.blockfrost_url {
        config.blockfrost_url = Some(url.clone());
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(path) = &cli.oracle_script {
        config.oracle_script = path.clone();
    }
    if let Some(path) = &cli.escrow_script {
        config.escrow_script = path.clone();
    }
    if let Command::Serve { bind, port } = &cli.command {
        config.rpc_bind = bind.unwrap_or(config.rpc_bind);
        config.rpc_port = port.unwrap_or(config.rpc_port);
    }
    Ok(config)
}

fn chain_client(config: &DaemonConfig) -> anyhow::Result<BlockfrostClient> {
    if config.blockfrost_project_id.is_empty() {
        bail!("BLOCKFROST_PROJECT_ID is not set");
    }
    Ok(BlockfrostClient::new(config.chain_config())?)
}

/// Open the signature store, creating and stamping it on first use.
fn open_store(config: &DaemonConfig) -> anyhow::Result<LmdbEnvironment> {
    check_data_dir(&config.data_dir).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(&config.data_dir, LMDB_MAX_DBS, config.lmdb_map_size)
        .with_context(|| format!("cannot open store in {}", config.data_dir.display()))?;
    Migrator::run(&env.meta_store())?;
    let report = check_integrity(env.env())?;
    if !report.is_healthy() {
        tracing::warn!(?report, "signature store integrity check failed");
    }
    Ok(env)
}

fn parse_oracle_keys(keys: &[String]) -> anyhow::Result<Vec<PublicKey>> {
    keys.iter()
        .map(|k| PublicKey::from_hex(k).with_context(|| format!("oracle key {k:?} is not valid")))
        .collect()
}

async fn serve(config: DaemonConfig) -> anyhow::Result<()> {
    let chain: Arc<dyn ChainContext> = Arc::new(chain_client(&config)?);
    let env = open_store(&config)?;
    let store: Arc<dyn SignatureStore> = Arc::new(env.signature_store());
    let metrics = Arc::new(RpcMetrics::new()?);

    tracing::info!(
        network = config.network.as_str(),
        data_dir = %config.data_dir.display(),
        signatures = store.signature_count()?,
        "starting oracle server"
    );
    RpcServer::new(config.rpc_addr())
        .start(AppState::new(chain, store, metrics))
        .await?;
    tracing::info!("oracle daemon exited cleanly");
    Ok(())
}

async fn oracle(config: DaemonConfig, action: OracleAction) -> anyhow::Result<()> {
    let network = config.network;
    match action {
        OracleAction::Request {
            creator,
            proposal_id,
            deadline,
            oracles,
            min_signatures,
            payment_address,
            policy_id,
            amount,
        } => {
            let payer = Payer::parse(&creator, network)?;
            let chain = chain_client(&config)?;
            let args = RequestArgs {
                proposal_id,
                policy_id,
                deadline,
                oracles: parse_oracle_keys(&oracles)?,
                min_signatures,
                payment: commands::payment_key_hash(&payment_address)?,
                amount,
            };
            let script = commands::load_script(&config.oracle_script)?;
            let tx_id = commands::oracle_request(&chain, &payer, script, args).await?;
            println!("Transaction {tx_id} submitted successfully");
        }
        OracleAction::Respond {
            creator,
            input,
            results,
            signatures,
        } => {
            let payer = Payer::parse(&creator, network)?;
            let chain = chain_client(&config)?;
            let script = commands::load_script(&config.oracle_script)?;
            let tx_id = if signatures.is_empty() {
                let store = open_store(&config)?.signature_store();
                let source = SignatureSource::Store(&store);
                commands::oracle_respond(&chain, &payer, script, input, &results, source).await?
            } else {
                let source = SignatureSource::Given(signatures);
                commands::oracle_respond(&chain, &payer, script, input, &results, source).await?
            };
            println!("Transaction {tx_id} submitted successfully");
        }
        OracleAction::Sign { key, results } => {
            let signed = commands::oracle_sign(&key, &results)?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
        }
    }
    Ok(())
}

async fn escrow(config: DaemonConfig, action: EscrowAction) -> anyhow::Result<()> {
    let network = config.network;
    let tx_id = match action {
        EscrowAction::Create {
            creator,
            policy_id,
            deadline,
            question_index,
            vote_use,
            payees,
            amount,
        } => {
            let payer = Payer::parse(&creator, network)?;
            let chain = chain_client(&config)?;
            let args = EscrowArgs {
                policy_id,
                deadline,
                question_index,
                vote_use,
                payees: payees
                    .iter()
                    .map(|p| commands::payment_key_hash(p.as_str()))
                    .collect::<anyhow::Result<_>>()?,
                amount,
            };
            let script = commands::load_script(&config.escrow_script)?;
            commands::escrow_create(&chain, &payer, script, args).await?
        }
        EscrowAction::Claim {
            creator,
            escrow,
            oracle,
            receiver,
            results,
        } => {
            let payer = Payer::parse(&creator, network)?;
            let chain = chain_client(&config)?;
            let receiver = oracle_crypto::decode_address(&receiver)?;
            let script = commands::load_script(&config.escrow_script)?;
            commands::escrow_claim(&chain, &payer, script, escrow, oracle, receiver, results)
                .await?
        }
        EscrowAction::Reclaim {
            creator,
            escrow,
            validity_start,
        } => {
            let payer = Payer::parse(&creator, network)?;
            let chain = chain_client(&config)?;
            let script = commands::load_script(&config.escrow_script)?;
            commands::escrow_reclaim(&chain, &payer, script, escrow, validity_start).await?
        }
    };
    println!("Transaction {tx_id} submitted successfully");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    oracle_utils::init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Serve { .. } => serve(config).await,
        Command::Oracle { action } => oracle(config, action).await,
        Command::Escrow { action } => escrow(config, action).await,
        Command::Datum {
            action: DatumAction::Inspect { input },
        } => {
            let chain = chain_client(&config)?;
            let view = commands::datum_inspect(&chain, input).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_file_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oracle.toml");
        std::fs::write(&path, "rpc_port = 9100\nlog_level = \"debug\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "oracle-daemon",
            "--config",
            path.to_str().unwrap(),
            "--network",
            "mainnet",
            "--log-level",
            "warn",
            "serve",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.network, NetworkId::Mainnet);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.rpc_port, 9100);
    }

    #[test]
    fn respond_accepts_input_and_signatures() {
        let cli = Cli::try_parse_from([
            "oracle-daemon",
            "oracle",
            "respond",
            "-c",
            "00",
            "-i",
            "14889cdb4b72ad10d4d4243c4f50141eea1d10a3482cd20a7da6245d05ea01f1#2",
            "-r",
            "1,2|3",
            "-s",
            "aa",
            "bb",
        ])
        .unwrap();
        match cli.command {
            Command::Oracle {
                action: OracleAction::Respond { input, signatures, .. },
            } => {
                assert_eq!(input.index, 2);
                assert_eq!(signatures, vec!["aa", "bb"]);
            }
            _ => panic!("expected oracle respond"),
        }
    }

    #[test]
    fn vote_use_names() {
        assert_eq!(parse_vote_use("weight"), Ok(VoteUse::ByWeight));
        assert_eq!(parse_vote_use("by-count"), Ok(VoteUse::ByCount));
        assert!(parse_vote_use("median").is_err());
    }
}

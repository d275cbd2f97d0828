//! lifeboat-node: the Lifeboat ledger node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the DB is fresh
//!   3. Start the JSON-RPC 2.0 server
//!   4. Run the main loop: apply queued transactions one at a time

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};

use lifeboat_core::transaction::Transaction;
use lifeboat_crypto::KeyPair;
use lifeboat_genesis::{apply_genesis, load_params, GenesisParams};
use lifeboat_rpc::server::RpcServerState;
use lifeboat_rpc::RpcServer;
use lifeboat_state::{StateDb, StateEngine};

#[derive(Parser, Debug)]
#[command(
    name = "lifeboat-node",
    version,
    about = "Lifeboat node: a token ledger with pre-registered backup recovery"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.lifeboat/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,

    /// Path to genesis params JSON (only read on first run).
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// Capacity of the inbound transaction queue.
    #[arg(long, default_value_t = 512)]
    queue_depth: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,lifeboat=debug")),
        )
        .init();

    let args = Args::parse();
    info!("Lifeboat node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);
    let engine = Arc::new(StateEngine::new(Arc::clone(&db)));

    // ── Genesis if fresh ──────────────────────────────────────────────────────
    if db.get_meta().context("reading ledger meta")?.is_none() {
        info!("fresh database, applying genesis");
        let params = load_or_generate_genesis_params(args.genesis_params.as_deref(), &data_dir)?;
        apply_genesis(&engine, &params).context("applying genesis")?;
    } else {
        info!("existing database found, skipping genesis");
    }

    // ── Inbound transaction queue ─────────────────────────────────────────────
    let (tx_sender, mut tx_receiver) = tokio::sync::mpsc::channel::<Transaction>(args.queue_depth);

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        db: Arc::clone(&db),
        tx_sender: Some(tx_sender),
    });
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    // ── Main loop: apply ──────────────────────────────────────────────────────
    info!("node ready");
    while let Some(tx) = tx_receiver.recv().await {
        match engine.apply(&tx) {
            Ok(receipt) => {
                for event in &receipt.events {
                    debug!(event = event.name(), detail = ?event, "event");
                }
                if let Err(e) = db.flush() {
                    warn!(error = %e, "flush failed");
                }
            }
            Err(e) => warn!(from = %tx.from, nonce = tx.nonce, call = tx.call.name(), error = %e, "transaction rejected"),
        }
    }

    Ok(())
}

/// Load genesis parameters from a JSON file, or deploy with a freshly
/// generated deployer key if no path is given.
///
/// # Warning
/// The generated deployer key is written to `<data_dir>/dev-deployer.json`
/// and holds the entire supply. Only use this for local development.
fn load_or_generate_genesis_params(path: Option<&Path>, data_dir: &Path) -> anyhow::Result<GenesisParams> {
    if let Some(p) = path {
        return load_params(p).with_context(|| format!("reading genesis params from {}", p.display()));
    }
    warn!("No --genesis-params provided. Generating a dev deployer key, DO NOT USE IN PRODUCTION.");
    let deployer = KeyPair::generate();
    let key_path = data_dir.join("dev-deployer.json");
    std::fs::write(&key_path, serde_json::to_string_pretty(&deployer)?)
        .with_context(|| format!("writing {}", key_path.display()))?;
    info!(deployer = %deployer.address, keyfile = %key_path.display(), "dev deployer key written");
    Ok(GenesisParams::new(deployer.address))
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

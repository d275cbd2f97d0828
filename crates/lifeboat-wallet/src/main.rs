//! lifeboat-wallet
//!
//! CLI wallet for Lifeboat. Manages secp256k1 keyfiles, builds and signs
//! transactions, signs recovery intents offline, and relays them to a
//! running node via JSON-RPC.
//!
//! Usage:
//!   lifeboat-wallet keygen           [--keyfile <path>]
//!   lifeboat-wallet balance          [--account <0x..>] [--rpc <url>]
//!   lifeboat-wallet transfer         --to <0x..> --amount <tokens>
//!   lifeboat-wallet approve          --spender <0x..> --amount <tokens>
//!   lifeboat-wallet register-backup  --backup <0x..>
//!   lifeboat-wallet sign-recovery    --out <file> [--chain-id <id> --contract <0x..>]
//!   lifeboat-wallet emergency-transfer --signed <file>
//!   lifeboat-wallet info

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use lifeboat_core::transaction::{body_bytes, Call, Transaction};
use lifeboat_core::types::{Address, Balance};
use lifeboat_crypto::{to_checksum, tx_hash, KeyPair};
use lifeboat_genesis::GenesisParams;
use lifeboat_recovery::{EmergencySigner, SignedRecovery};

mod rpc_client;
use rpc_client::WalletRpcClient;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "lifeboat-wallet",
    version,
    about = "Lifeboat wallet: sign and submit transactions, prepare emergency recovery"
)]
struct Args {
    /// Path to the keyfile (JSON).
    #[arg(long, global = true, default_value = "~/.lifeboat/wallet.json")]
    keyfile: PathBuf,

    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8545")]
    rpc: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new secp256k1 keypair and save it to the keyfile.
    Keygen,

    /// Print the keyfile's address.
    Address,

    /// Print balance, backup and blacklist state of an account.
    Balance {
        /// Account to query. Defaults to the keyfile's address.
        #[arg(long)]
        account: Option<String>,
    },

    /// Transfer tokens to another address.
    Transfer {
        #[arg(long)]
        to: String,
        /// Amount in whole tokens, fractional digits allowed (e.g. 1.5).
        #[arg(long)]
        amount: String,
    },

    /// Set the allowance of a spender over your balance.
    Approve {
        #[arg(long)]
        spender: String,
        /// Amount in whole tokens, or "max" for an unlimited allowance.
        #[arg(long)]
        amount: String,
    },

    /// Spend an allowance granted to you by `owner`.
    TransferFrom {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },

    /// Print the allowance `owner` granted `spender`.
    Allowance {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        spender: String,
    },

    /// Register (or replace) your backup address.
    RegisterBackup {
        #[arg(long)]
        backup: String,
    },

    /// Sign your emergency transfer authorization and write it to a file.
    /// Works offline when both --chain-id and --contract are given.
    SignRecovery {
        /// Where to write the signed recovery JSON.
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        chain_id: Option<u64>,
        #[arg(long)]
        contract: Option<String>,
    },

    /// Relay a signed recovery file. The keyfile pays for nothing and only
    /// authenticates the relaying transaction.
    EmergencyTransfer {
        /// Signed recovery JSON produced by `sign-recovery`.
        #[arg(long)]
        signed: PathBuf,
    },

    /// Print token and ledger info from the node.
    Info,

    /// Generate a deployer keypair and write genesis-params.json to the
    /// output directory. Run this once before launching a new ledger.
    GenesisParams {
        #[arg(long, default_value = "~/.lifeboat/genesis")]
        out_dir: PathBuf,
    },
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn,lifeboat_wallet=info")
        .init();

    let args = Args::parse();
    let keyfile = expand_tilde(&args.keyfile);
    let client = WalletRpcClient::new(&args.rpc);

    match args.command {
        Command::Keygen => cmd_keygen(&keyfile),

        Command::Address => {
            let kp = load_keypair(&keyfile)?;
            println!("{}", to_checksum(&kp.address));
            Ok(())
        }

        Command::Balance { account } => {
            let addr = match account {
                Some(a) => parse_address(&a)?,
                None => load_keypair(&keyfile)?.address,
            };
            let token = client.get_token_info().await?;
            let acc = client.get_account(&addr).await?;
            let bal: Balance = acc.balance.parse().context("parsing balance")?;
            println!("Account:     {}", acc.address);
            println!("Balance:     {} {}  ({} base units)", format_amount(bal, token.decimals), token.symbol, bal);
            println!("Backup:      {}", acc.backup_address.as_deref().unwrap_or("none"));
            println!("Status:      {}", acc.status);
            println!("Nonce:       {}", acc.nonce);
            Ok(())
        }

        Command::Transfer { to, amount } => {
            let kp = load_keypair(&keyfile)?;
            let to = parse_address(&to)?;
            let token = client.get_token_info().await?;
            let amount = parse_amount(&amount, token.decimals)?;
            let hash = submit(&kp, Call::Transfer { to, amount }, &client).await?;
            println!("Submitted: {}", hash);
            Ok(())
        }

        Command::Approve { spender, amount } => {
            let kp = load_keypair(&keyfile)?;
            let spender = parse_address(&spender)?;
            let amount = if amount.eq_ignore_ascii_case("max") {
                Balance::MAX
            } else {
                parse_amount(&amount, client.get_token_info().await?.decimals)?
            };
            let hash = submit(&kp, Call::Approve { spender, amount }, &client).await?;
            println!("Approval submitted: {}", hash);
            Ok(())
        }

        Command::TransferFrom { owner, to, amount } => {
            let kp = load_keypair(&keyfile)?;
            let owner = parse_address(&owner)?;
            let to = parse_address(&to)?;
            let amount = parse_amount(&amount, client.get_token_info().await?.decimals)?;
            let hash = submit(&kp, Call::TransferFrom { owner, to, amount }, &client).await?;
            println!("Submitted: {}", hash);
            Ok(())
        }

        Command::Allowance { owner, spender } => {
            let owner = parse_address(&owner)?;
            let spender = parse_address(&spender)?;
            let allowance = client.get_allowance(&owner, &spender).await?;
            if allowance == Balance::MAX {
                println!("Allowance: unlimited");
            } else {
                let token = client.get_token_info().await?;
                println!("Allowance: {} {}", format_amount(allowance, token.decimals), token.symbol);
            }
            Ok(())
        }

        Command::RegisterBackup { backup } => {
            let kp = load_keypair(&keyfile)?;
            let backup = parse_address(&backup)?;
            let hash = submit(&kp, Call::RegisterBackupAddress { backup }, &client).await?;
            println!("Backup registration submitted: {}", hash);
            println!("Backup: {}", to_checksum(&backup));
            Ok(())
        }

        Command::SignRecovery { out, chain_id, contract } => {
            let kp = load_keypair(&keyfile)?;
            let (chain_id, contract) = match (chain_id, contract) {
                (Some(id), Some(c)) => (id, parse_address(&c)?),
                (None, None) => {
                    let token = client.get_token_info().await?;
                    (token.chain_id, parse_address(&token.contract)?)
                }
                _ => bail!("--chain-id and --contract must be given together"),
            };
            let signed = EmergencySigner::new(&kp)
                .sign(chain_id, contract)
                .context("signing emergency transfer")?;
            let out = expand_tilde(&out);
            std::fs::write(&out, serde_json::to_string_pretty(&signed)?)
                .with_context(|| format!("writing {}", out.display()))?;
            info!(holder = %signed.holder, chain_id, "recovery authorization signed");
            println!("Signed recovery written to {}", out.display());
            println!("Anyone holding this file can move your whole balance to your registered backup.");
            Ok(())
        }

        Command::EmergencyTransfer { signed } => {
            let kp = load_keypair(&keyfile)?;
            let signed = load_signed_recovery(&expand_tilde(&signed))?;
            let token = client.get_token_info().await?;
            if signed.chain_id != token.chain_id || signed.contract != parse_address(&token.contract)? {
                bail!("signed recovery is for a different ledger");
            }
            let call = Call::EmergencyTransfer {
                holder: signed.holder,
                signature: signed.signature(),
            };
            let hash = submit(&kp, call, &client).await?;
            println!("Emergency transfer submitted: {}", hash);
            println!("Holder: {}", to_checksum(&signed.holder));
            Ok(())
        }

        Command::Info => {
            let info = client.get_token_info().await?;
            let supply: Balance = info.total_supply.parse().context("parsing total supply")?;
            println!("Token:            {} ({})", info.name, info.symbol);
            println!("Decimals:         {}", info.decimals);
            println!("Total supply:     {} {}", format_amount(supply, info.decimals), info.symbol);
            println!("Chain ID:         {}", info.chain_id);
            println!("Ledger address:   {}", info.contract);
            println!("Deployer:         {}", info.deployer);
            println!("Blacklist redirect: {}", info.blacklist_redirect);
            println!("Recovery domain:  {} v{}", info.domain_name, info.domain_version);
            println!("Domain separator: {}", info.domain_separator);
            Ok(())
        }

        Command::GenesisParams { out_dir } => {
            let dir = expand_tilde(&out_dir);
            cmd_genesis_params(&dir)
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_keygen(keyfile: &Path) -> anyhow::Result<()> {
    if keyfile.exists() {
        bail!(
            "Keyfile {} already exists. Delete it first to generate a new key.",
            keyfile.display()
        );
    }
    if let Some(parent) = keyfile.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let kp = KeyPair::generate();
    let json = serde_json::to_string_pretty(&kp)?;
    std::fs::write(keyfile, &json)
        .with_context(|| format!("writing keyfile to {}", keyfile.display()))?;

    println!("Generated new keypair.");
    println!("Address: {}", to_checksum(&kp.address));
    println!("Keyfile: {}", keyfile.display());
    println!("\nBACK UP YOUR KEYFILE. Register a backup address before you need one.");
    Ok(())
}

fn cmd_genesis_params(out_dir: &Path) -> anyhow::Result<()> {
    if out_dir.exists() {
        bail!(
            "Output directory {} already exists. Delete it first to avoid overwriting a previous deployment.",
            out_dir.display()
        );
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let deployer = KeyPair::generate();
    let key_path = out_dir.join("deployer.json");
    std::fs::write(&key_path, serde_json::to_string_pretty(&deployer)?)
        .with_context(|| format!("writing {}", key_path.display()))?;

    let params = GenesisParams::new(deployer.address);
    let params_path = out_dir.join("genesis-params.json");
    std::fs::write(&params_path, serde_json::to_string_pretty(&params)?)
        .with_context(|| format!("writing {}", params_path.display()))?;

    println!("Deployer");
    println!("  Address:  {}", to_checksum(&deployer.address));
    println!("  Keyfile:  {}", key_path.display());
    println!();
    println!("genesis-params.json written to: {}", params_path.display());
    println!("The deployer receives the entire supply. Keep deployer.json offline.");
    Ok(())
}

// ── Transaction builder ───────────────────────────────────────────────────────

async fn build_and_sign(kp: &KeyPair, call: Call, client: &WalletRpcClient) -> anyhow::Result<Transaction> {
    let token = client.get_token_info().await?;
    let contract = parse_address(&token.contract)?;
    let nonce = client.get_nonce(&kp.address).await?;

    let hash = tx_hash(token.chain_id, &contract, &body_bytes(&kp.address, nonce, &call));
    let signature = kp.sign_digest(&hash).context("signing transaction")?;
    info!(tx_hash = %hash, nonce, call = call.name(), "transaction signed");

    Ok(Transaction {
        from: kp.address,
        nonce,
        call,
        signature,
    })
}

async fn submit(kp: &KeyPair, call: Call, client: &WalletRpcClient) -> anyhow::Result<String> {
    let tx = build_and_sign(kp, call, client).await?;
    client.send_transaction(&tx).await
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_keypair(keyfile: &Path) -> anyhow::Result<KeyPair> {
    let json = std::fs::read_to_string(keyfile)
        .with_context(|| format!("reading keyfile {}", keyfile.display()))?;
    serde_json::from_str(&json).context("parsing keyfile, is it a valid Lifeboat keyfile?")
}

fn load_signed_recovery(path: &Path) -> anyhow::Result<SignedRecovery> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading signed recovery {}", path.display()))?;
    let signed: SignedRecovery = serde_json::from_str(&json).context("parsing signed recovery")?;
    if !signed.verify() {
        bail!("signature in {} does not recover to its holder", path.display());
    }
    Ok(signed)
}

fn parse_address(s: &str) -> anyhow::Result<Address> {
    s.parse::<Address>()
        .map_err(|e| anyhow::anyhow!("invalid address {s}: {e}"))
}

/// Parse a decimal token amount ("12", "0.5") into base units.
fn parse_amount(s: &str, decimals: u8) -> anyhow::Result<Balance> {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        bail!("empty amount");
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        bail!("invalid amount {s}");
    }
    if frac.len() > decimals as usize {
        bail!("amount {s} has more than {decimals} fractional digits");
    }
    let scale = 10u128
        .checked_pow(decimals as u32)
        .context("decimals out of range")?;
    let whole: Balance = if whole.is_empty() { 0 } else { whole.parse()? };
    let frac_units: Balance = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        padded.parse()?
    };
    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_units))
        .with_context(|| format!("amount {s} overflows"))
}

/// Render base units as a decimal token amount, trimming trailing zeros.
fn format_amount(units: Balance, decimals: u8) -> String {
    let Some(scale) = 10u128.checked_pow(decimals as u32) else {
        return units.to_string();
    };
    let whole = units / scale;
    let frac = units % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = decimals as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

/// ─── Lifeboat Protocol Constants ─────────────────────────────────────────────
///
/// A fungible token ledger where every holder can pre-register a backup
/// address and have a relayer evacuate the whole balance there with a single
/// signed authorization.
///
/// Base unit: the smallest denomination (1 token = 10^decimals units).

// ── Token defaults ───────────────────────────────────────────────────────────

/// Default token name used by deployment tooling when none is supplied.
pub const DEFAULT_TOKEN_NAME: &str = "Token";

/// Default ticker.
pub const DEFAULT_TOKEN_SYMBOL: &str = "TOKEN";

/// Default number of decimals (ERC-20 convention).
pub const DEFAULT_DECIMALS: u8 = 18;

/// 1 whole token expressed in base units at the default precision.
pub const UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Default total supply: 1,000,000 tokens.
pub const DEFAULT_TOTAL_SUPPLY: u128 = 1_000_000 * UNITS_PER_TOKEN;

/// Default network identifier (local development chain).
pub const DEFAULT_CHAIN_ID: u64 = 31_337;

// ── Recovery signing domain ──────────────────────────────────────────────────

/// Human-readable application name bound into every recovery signature.
pub const RECOVERY_DOMAIN_NAME: &str = "Approve Emergency Transfer";

/// Version tag bound into every recovery signature.
pub const RECOVERY_DOMAIN_VERSION: &str = "1";

/// Canonical EIP-712 domain type string.
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Canonical type string of the recovery intent struct.
pub const EMERGENCY_TRANSFER_TYPE: &str = "EmergencyTransfer(address from)";

// ── Blacklist conduit ────────────────────────────────────────────────────────

/// Maximum number of backup hops followed when redirecting a credit away
/// from a blacklisted recipient.
pub const MAX_REDIRECT_HOPS: usize = 16;

// ── Transaction envelope ─────────────────────────────────────────────────────

/// Domain tag mixed into the transaction hash so envelope signatures can never
/// be confused with recovery signatures.
pub const TX_DOMAIN_TAG: &[u8] = b"lifeboat-tx-v1";

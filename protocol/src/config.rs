//! # Protocol Configuration & Constants
//!
//! Every magic number in Assent lives here. Digest domains, the personal
//! message prefix and the receiver callback signatures are all part of the
//! signing surface: changing any of them invalidates every approval that
//! wallets have already produced, so treat this file as append-only.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// secp256k1 ECDSA with public-key recovery. Chosen so approvals can be
/// produced by any standard wallet's `personal_sign`.
pub const SIGNING_ALGORITHM: &str = "secp256k1-ECDSA";

/// Hash output length in bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Account identifiers are the last 20 bytes of the Keccak-256 hash of the
/// uncompressed public key.
pub const ADDRESS_LENGTH: usize = 20;

/// secp256k1 secret scalar length in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Recoverable signature length on the wire: `r || s || v`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset added to the recovery id in the `v` byte by most signing tools.
/// `v` values of `0/1` are accepted as well.
pub const RECOVERY_ID_OFFSET: u8 = 27;

/// Length of a callback selector / acceptance marker.
pub const SELECTOR_LENGTH: usize = 4;

/// Prefix applied to a 32-byte digest before recovery. Standard off-chain
/// signers apply it automatically, so the ledger has to as well.
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

// ---------------------------------------------------------------------------
// Mint Approval Domains
// ---------------------------------------------------------------------------

/// Domain tag for single-token mint approvals. Its Keccak-256 hash is the
/// first word of every single-mint digest.
pub const MINT_SINGLE_DOMAIN: &str = "assent.mint-approval.single.v1";

/// Domain tag for batch mint approvals.
pub const MINT_BATCH_DOMAIN: &str = "assent.mint-approval.batch.v1";

// ---------------------------------------------------------------------------
// Receiver Callbacks
// ---------------------------------------------------------------------------

/// Canonical signature of the single-mint receiver callback. The acceptance
/// marker is the first four bytes of its Keccak-256 hash.
pub const MINT_SINGLE_CALLBACK: &str = "onMintReceived(address,uint256,uint256,bytes)";

/// Canonical signature of the batch-mint receiver callback.
pub const MINT_BATCH_CALLBACK: &str = "onMintBatchReceived(address,uint256[],uint256[],bytes)";

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Placeholder substituted with the 64-digit hex token id when rendering a
/// token's metadata locator.
pub const TOKEN_ID_PLACEHOLDER: &str = "{id}";

/// Base URI a fresh ledger starts with.
pub const DEFAULT_BASE_URI: &str = "https://meta.assent.dev/tokens/{id}.json";

// ---------------------------------------------------------------------------
// Node Parameters
// ---------------------------------------------------------------------------

/// Default RPC API port.
pub const DEFAULT_RPC_PORT: u16 = 9841;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

/// Upper bound on the number of pairs a single RPC batch call may carry.
pub const MAX_RPC_BATCH_LEN: usize = 1024;

/// Broadcast channel capacity for live event streaming.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

use anchor_lang::prelude::*;
use solana_program::keccak;

use crate::crypto::field::{truncate_to_scalar, Scalar};

/// Domain tag for account-management digests signed by an account key
pub const ACCOUNT_DIGEST_TAG: &[u8] = b"committee-pool:account:v1";

/// Domain tag for deposit digests signed by the depositor
pub const DEPOSIT_DIGEST_TAG: &[u8] = b"committee-pool:deposit:v1";

/// Domain tag for per-entry deposit salts
pub const DEPOSIT_SALT_TAG: &[u8] = b"committee-pool:deposit-salt:v1";

/// Domain tag for the pool-wide nullifying key
pub const NULLIFYING_KEY_TAG: &[u8] = b"committee-pool:nullifying-key:v1";

/// Domain tag for external-data hashes
pub const EXT_DATA_TAG: &[u8] = b"committee-pool:ext-data:v1";

/// Domain tag for token identifiers lifted into the field
pub const TOKEN_FIELD_TAG: &[u8] = b"committee-pool:token:v1";

/// Compute keccak256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    keccak::hash(data).to_bytes()
}

/// Compute keccak256 hash of multiple inputs (concatenated)
pub fn keccak256_concat(inputs: &[&[u8]]) -> [u8; 32] {
    keccak::hashv(inputs).to_bytes()
}

/// Keccak over the concatenated inputs, truncated into Fr.
pub fn hash_to_scalar(inputs: &[&[u8]]) -> Scalar {
    truncate_to_scalar(&keccak256_concat(inputs))
}

/// Field encoding of a token address, shared by commitments and balance proofs.
pub fn token_field(token: &Pubkey) -> Scalar {
    hash_to_scalar(&[TOKEN_FIELD_TAG, token.as_ref()])
}

/// Derive the pool-wide nullifying key from the configured seed.
pub fn derive_nullifying_key(seed: &[u8; 32]) -> Scalar {
    hash_to_scalar(&[NULLIFYING_KEY_TAG, seed])
}

/// Salt for the deposit entry at `position`, bound to the whole deposit.
pub fn positional_salt(deposit_digest: &[u8; 32], position: u32) -> Scalar {
    hash_to_scalar(&[DEPOSIT_SALT_TAG, deposit_digest, &position.to_le_bytes()])
}

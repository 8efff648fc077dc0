//! ed25519 signature checks for relayer-submitted calls
//!
//! Account-management calls and deposits may be submitted by anyone holding
//! a signature from the identity they act for. Signatures are checked with
//! `verify_strict`, which rejects small-order keys and malleable encodings.

use anchor_lang::prelude::*;
use ed25519_dalek::{PublicKey, Signature};

/// Length of an ed25519 signature
pub const SIGNATURE_LEN: usize = 64;

/// True if `signature` is a valid ed25519 signature by `signer` over `message`.
///
/// Malformed keys or signatures yield `false`.
pub fn verify_signature(signer: &Pubkey, message: &[u8], signature: &[u8]) -> bool {
    if signature.len() != SIGNATURE_LEN {
        return false;
    }

    let public_key = match PublicKey::from_bytes(signer.as_ref()) {
        Ok(key) => key,
        Err(_) => {
            msg!("Signer {} is not a valid ed25519 point", signer);
            return false;
        }
    };

    let signature = match Signature::try_from(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    public_key.verify_strict(message, &signature).is_ok()
}

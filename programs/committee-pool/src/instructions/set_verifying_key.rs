//! Set Verifying Key Instruction
//!
//! Registers or overwrites verifying keys in one dispatch table. Only the
//! configured authority may call it.
//!
//! # Security Considerations
//! - Keys must come from a properly executed trusted setup ceremony
//! - The IC length must match the shape's public input count
//! - A batch is validated in full before any key is written

use anchor_lang::prelude::*;

use crate::events::{LedgerEvent, VerifyingKeySetEvent};
use crate::state::{ShapeKey, VerifyingKey, VerifyingKeyDispatch};

pub struct SetVerifyingKey<'a, S: ShapeKey> {
    pub authority: Pubkey,
    pub dispatch: &'a mut VerifyingKeyDispatch<S>,
}

fn key_set_event<S: ShapeKey>(shape: &S, vk_hash: [u8; 32]) -> LedgerEvent {
    msg!(
        "{} verifying key set for {:?}: {}",
        S::KIND,
        shape,
        hex::encode(vk_hash)
    );
    VerifyingKeySetEvent {
        kind: S::KIND.to_string(),
        dimensions: shape.dimensions(),
        vk_hash,
    }
    .into()
}

pub fn handler<S: ShapeKey>(
    accounts: SetVerifyingKey<S>,
    shape: S,
    vk: VerifyingKey,
) -> Result<Vec<LedgerEvent>> {
    let vk_hash = accounts
        .dispatch
        .set_verifying_key(&accounts.authority, shape, vk)?;
    Ok(vec![key_set_event(&shape, vk_hash)])
}

pub fn batch_handler<S: ShapeKey>(
    accounts: SetVerifyingKey<S>,
    shapes: &[S],
    vks: Vec<VerifyingKey>,
) -> Result<Vec<LedgerEvent>> {
    let hashes = accounts
        .dispatch
        .set_verifying_keys(&accounts.authority, shapes, vks)?;
    Ok(shapes
        .iter()
        .zip(hashes)
        .map(|(shape, vk_hash)| key_set_event(shape, vk_hash))
        .collect())
}

//! Deposit Instruction
//!
//! Moves assets into pool custody and commits one note per entry.
//!
//! # Flow
//!
//! 1. The sender signs the deposit digest (domain, sender, entries); any
//!    party holding that signature may submit the deposit
//! 2. Every entry is pulled from the sender through the Asset Ledger. If an
//!    entry fails, the entries already pulled are returned and nothing is
//!    committed. If a return itself fails the call ends with `RefundFailed`
//!    instead of `AssetTransferFailed`
//! 3. Each entry's commitment uses a salt derived from the deposit digest and
//!    the entry's position, so identical entries yield distinct notes

use anchor_lang::prelude::*;

use crate::asset_ledger::AssetLedger;
use crate::crypto::ed25519::verify_signature;
use crate::error::PoolError;
use crate::events::{CommitmentEvent, DepositEvent, LedgerEvent};
use crate::instructions::LedgerContext;
use crate::state::ShieldedPool;
use crate::types::{DepositData, PreCommitment};

pub struct DepositNotes<'a> {
    pub pool: &'a mut ShieldedPool,
    pub assets: &'a mut dyn AssetLedger,
}

/// True if `data` is non-empty, every entry is well-formed and `signature`
/// is the sender's signature over the deposit digest.
pub fn is_valid_deposit(pool: &ShieldedPool, data: &DepositData, signature: &[u8]) -> bool {
    if data.entries.is_empty() || !data.entries.iter().all(PreCommitment::is_valid) {
        return false;
    }

    match pool.deposit_digest(data) {
        Ok(digest) => verify_signature(&data.sender, &digest, signature),
        Err(_) => false,
    }
}

pub fn handler(
    ctx: LedgerContext<DepositNotes>,
    data: DepositData,
    signature: &[u8],
) -> Result<Vec<LedgerEvent>> {
    let DepositNotes { pool, assets } = ctx.accounts;

    // =========================================================================
    // INPUT VALIDATION
    // =========================================================================

    if !is_valid_deposit(pool, &data, signature) {
        msg!(
            "Deposit from {} rejected: {} entries, signature invalid or entries malformed",
            data.sender,
            data.entries.len()
        );
        return Err(error!(PoolError::InvalidSignature));
    }

    pool.ensure_capacity(data.entries.len() as u64)?;

    let digest = pool.deposit_digest(&data)?;
    let commitments = (0..data.entries.len())
        .map(|position| pool.deposit_commitment(&digest, &data, position))
        .collect::<Result<Vec<_>>>()?;

    // =========================================================================
    // ASSET MOVEMENT
    // =========================================================================

    for (position, entry) in data.entries.iter().enumerate() {
        let token = &entry.token_data;
        if let Err(err) = assets.transfer_in(&token.token, token.identifier, &data.sender, token.amount)
        {
            msg!("Deposit entry {} could not be pulled: {}", position, err);
            refund(assets, &data.sender, &data.entries[..position])?;
            return Err(error!(PoolError::AssetTransferFailed));
        }
    }

    // =========================================================================
    // STATE CHANGES
    // =========================================================================

    let indices = pool.insert_commitments(&commitments)?;

    let mut events = Vec::with_capacity(2 * commitments.len());
    for ((entry, commitment), index) in data.entries.iter().zip(&commitments).zip(indices) {
        let token = &entry.token_data;

        #[cfg(feature = "event-debug")]
        msg!(
            "Deposit debug: sender {} token {} identifier {} amount {}",
            data.sender,
            token.token,
            token.identifier,
            token.amount
        );

        events.push(
            CommitmentEvent {
                index,
                commitment: *commitment,
                encrypted_note: entry.encrypted_note.clone(),
            }
            .into(),
        );
        events.push(
            DepositEvent {
                index,
                sender: data.sender,
                token: token.token,
                identifier: token.identifier,
                amount: token.amount,
                commitment: *commitment,
            }
            .into(),
        );
    }

    msg!(
        "Deposit committed {} notes, pool root {}",
        commitments.len(),
        hex::encode(pool.root())
    );

    Ok(events)
}

/// Return already-pulled entries to the sender, newest first.
///
/// Every entry is attempted even after a failure. Any failure yields
/// `RefundFailed`: custody then holds assets no commitment accounts for.
fn refund(assets: &mut dyn AssetLedger, sender: &Pubkey, pulled: &[PreCommitment]) -> Result<()> {
    let mut stranded = 0usize;
    for entry in pulled.iter().rev() {
        let token = &entry.token_data;
        if let Err(err) = assets.transfer_out(&token.token, token.identifier, sender, token.amount) {
            msg!(
                "RECONCILE: refund of {} {} (id {}) to {} failed: {}",
                token.amount,
                token.token,
                token.identifier,
                sender,
                err
            );
            stranded += 1;
        }
    }

    if stranded > 0 {
        msg!(
            "Deposit rollback incomplete: {} of {} entries stranded in custody",
            stranded,
            pulled.len()
        );
        return Err(error!(PoolError::RefundFailed));
    }
    Ok(())
}

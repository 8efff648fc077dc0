//! Withdraw Instruction
//!
//! Spends input notes and pays `ext_data.token_data` out of custody to
//! `ext_data.account`. The output commitments are bound into the proof (they
//! carry any change back to the committee off-ledger) but are not inserted.
//!
//! # Ordering
//!
//! The Asset Ledger payout runs after every check and before the nullifiers
//! are marked spent, so a failed payout leaves the notes spendable.

use anchor_lang::prelude::*;

use crate::asset_ledger::AssetLedger;
use crate::error::PoolError;
use crate::events::{LedgerEvent, NullifierEvent, WithdrawalEvent};
use crate::instructions::transfer::validate_spend;
use crate::instructions::LedgerContext;
use crate::state::{AccountRegistry, ShieldedPool};
use crate::types::{ExtData, PublicData, TransferType};

pub struct Withdraw<'a> {
    pub pool: &'a mut ShieldedPool,
    pub registry: &'a AccountRegistry,
    pub assets: &'a mut dyn AssetLedger,
}

pub fn handler(
    ctx: LedgerContext<Withdraw>,
    proof: &[u8],
    public_data: PublicData,
    ext_data: ExtData,
) -> Result<Vec<LedgerEvent>> {
    let Withdraw {
        pool,
        registry,
        assets,
    } = ctx.accounts;

    validate_spend(
        pool,
        registry,
        ctx.proof_system,
        proof,
        &public_data,
        &ext_data,
        TransferType::Withdrawal,
    )?;

    // =========================================================================
    // ASSET MOVEMENT
    // =========================================================================

    let token = &ext_data.token_data;
    assets
        .transfer_out(&token.token, token.identifier, &ext_data.account, token.amount)
        .map_err(|err| {
            msg!("Withdrawal payout failed: {}", err);
            error!(PoolError::AssetTransferFailed)
        })?;

    #[cfg(feature = "event-debug")]
    msg!(
        "Withdraw debug: recipient {} token {} identifier {} amount {}",
        ext_data.account,
        token.token,
        token.identifier,
        token.amount
    );

    // =========================================================================
    // STATE CHANGES
    // =========================================================================

    pool.spend(&public_data.in_nullifiers, TransferType::Withdrawal)?;

    let mut events: Vec<LedgerEvent> = public_data
        .in_nullifiers
        .iter()
        .map(|value| NullifierEvent { value: *value }.into())
        .collect();
    events.push(
        WithdrawalEvent {
            account: ext_data.account,
            token: token.token,
            identifier: token.identifier,
            amount: token.amount,
        }
        .into(),
    );

    msg!("Withdrawal spent {} nullifiers", public_data.in_nullifiers.len());

    Ok(events)
}

//! Shared instruction argument types
//!
//! Everything a client submits to the ledger, plus the canonical digests
//! derived from it.

use anchor_lang::prelude::*;

use crate::crypto::field::{is_valid_fr, Scalar};
use crate::crypto::keccak::{
    hash_to_scalar, keccak256_concat, token_field, ACCOUNT_DIGEST_TAG, DEPOSIT_DIGEST_TAG,
    EXT_DATA_TAG,
};
use crate::error::PoolError;
use crate::state::MerkleProof;

/// Asset standards the Asset Ledger can move
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenStandard {
    /// Fungible token; `identifier` is ignored by the ledger
    Fungible = 0,
    /// Unique token; `amount` must be 1
    NonFungible = 1,
    /// Multi-token id with a balance per identifier
    MultiToken = 2,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct TokenData {
    pub standard: TokenStandard,
    pub token: Pubkey,
    pub identifier: u64,
    pub amount: u64,
}

impl TokenData {
    pub fn fungible(token: Pubkey, amount: u64) -> Self {
        Self {
            standard: TokenStandard::Fungible,
            token,
            identifier: 0,
            amount,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.amount > 0 && (self.standard != TokenStandard::NonFungible || self.amount == 1)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.is_valid() {
            msg!(
                "Invalid token data: {:?} amount {}",
                self.standard,
                self.amount
            );
            return Err(error!(PoolError::InvalidTokenData));
        }
        Ok(())
    }

    /// Field encoding of the token address
    pub fn token_field(&self) -> Scalar {
        token_field(&self.token)
    }
}

/// Which spend an `ExtData` authorizes
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransferType {
    Transfer = 0,
    Withdrawal = 1,
}

/// Metadata bound into a transfer or withdrawal proof through its hash.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub struct ExtData {
    pub chain_domain: u64,
    pub pool_index: u32,
    /// Withdrawal recipient; informational for transfers
    pub account: Pubkey,
    pub transfer_type: TransferType,
    /// Asset paid out by a withdrawal
    pub token_data: TokenData,
}

impl ExtData {
    /// Keccak over the borsh encoding, truncated into Fr.
    pub fn hash(&self) -> Result<Scalar> {
        let encoded = self.try_to_vec().map_err(|e| {
            msg!("ExtData encoding failed: {}", e);
            error!(PoolError::InvalidExtData)
        })?;
        Ok(hash_to_scalar(&[EXT_DATA_TAG, &encoded]))
    }
}

/// Public part of a transfer or withdrawal.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub struct PublicData {
    pub commitment_root: Scalar,
    pub registry_root: Scalar,
    /// First committee slot the authorizers occupy
    pub start_index: u32,
    /// Number of committee authorizers the proof carries
    pub count: u32,
    pub in_nullifiers: Vec<Scalar>,
    pub out_commitments: Vec<Scalar>,
    /// One encrypted note per output commitment
    pub encrypted_notes: Vec<Vec<u8>>,
}

/// One deposit entry: a note the depositor wants committed.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub struct PreCommitment {
    pub receiver_hash: Scalar,
    pub token_data: TokenData,
    pub encrypted_note: Vec<u8>,
}

impl PreCommitment {
    pub fn is_valid(&self) -> bool {
        self.token_data.is_valid() && is_valid_fr(&self.receiver_hash)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub struct DepositData {
    pub sender: Pubkey,
    pub entries: Vec<PreCommitment>,
}

impl DepositData {
    /// Digest the sender signs: domain tag, deployment, sender and entries.
    pub fn digest(&self, chain_domain: u64, pool_index: u32) -> Result<[u8; 32]> {
        let encoded = self.try_to_vec().map_err(|e| {
            msg!("DepositData encoding failed: {}", e);
            error!(PoolError::InvalidTokenData)
        })?;
        Ok(keccak256_concat(&[
            DEPOSIT_DIGEST_TAG,
            &chain_domain.to_le_bytes(),
            &pool_index.to_le_bytes(),
            &encoded,
        ]))
    }
}

/// Committee registration or update request.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub struct AccountData {
    pub identifier: Pubkey,
    pub committee_root: Scalar,
    pub quorum: u64,
    /// Path for the current leaf; `None` when registering
    pub registry_proof: Option<MerkleProof>,
    pub nonce: u64,
}

impl AccountData {
    /// Digest a relayer-submitted call must be signed over.
    /// The registry proof is not covered; it only locates the old leaf.
    pub fn digest(&self, chain_domain: u64) -> [u8; 32] {
        keccak256_concat(&[
            ACCOUNT_DIGEST_TAG,
            &chain_domain.to_le_bytes(),
            self.identifier.as_ref(),
            &self.committee_root,
            &self.quorum.to_le_bytes(),
            &self.nonce.to_le_bytes(),
        ])
    }
}

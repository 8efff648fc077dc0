//! Shared fixtures for unit and scenario tests

use anchor_lang::prelude::*;
use solana_sdk::signature::{Keypair, Signer};

use crate::asset_ledger::InMemoryAssetLedger;
use crate::crypto::alt_bn128_syscalls::G1_GENERATOR;
use crate::crypto::field::{u64_to_scalar, Scalar};
use crate::crypto::groth16_verifier::ProofSystem;
use crate::crypto::keccak::{keccak256_concat, token_field};
use crate::crypto::public_inputs::{BalancePublicInputs, TransferPublicInputs};
use crate::error::{error_code_of, PoolError};
use crate::state::{
    merkle_root_of, BalanceShape, MemberLeaf, PoolConfig, RegistryConfig, TransferShape,
    VerifyingKey,
};
use crate::types::{
    AccountData, DepositData, ExtData, PreCommitment, PublicData, TokenData, TransferType,
};
use crate::CommitteePool;

/// Proof system whose proofs are keccak(vk hash, inputs...). A proof
/// verifies exactly for the key and inputs it was made for.
pub(crate) struct HashBindingProofSystem;

impl HashBindingProofSystem {
    pub(crate) fn prove(vk: &VerifyingKey, public_inputs: &[Scalar]) -> Vec<u8> {
        let vk_hash = vk.hash();
        let mut parts: Vec<&[u8]> = vec![vk_hash.as_slice()];
        parts.extend(public_inputs.iter().map(|i| i.as_slice()));
        keccak256_concat(&parts).to_vec()
    }
}

impl ProofSystem for HashBindingProofSystem {
    fn verify(&self, vk: &VerifyingKey, proof: &[u8], public_inputs: &[Scalar]) -> Result<bool> {
        require!(proof.len() == 32, PoolError::InvalidProofFormat);
        Ok(proof == Self::prove(vk, public_inputs).as_slice())
    }
}

/// Structurally valid key with `ic_len` IC points.
pub(crate) fn dummy_vk(ic_len: usize) -> VerifyingKey {
    VerifyingKey {
        alpha_g1: G1_GENERATOR,
        beta_g2: [1u8; 128],
        gamma_g2: [2u8; 128],
        delta_g2: [3u8; 128],
        ic: (0..ic_len)
            .map(|i| {
                let mut point = [0u8; 64];
                point[63] = i as u8;
                point
            })
            .collect(),
    }
}

pub(crate) fn assert_pool_error<T: std::fmt::Debug>(result: Result<T>, expected: PoolError) {
    let err = result.expect_err("expected an error");
    assert_eq!(
        error_code_of(&err),
        Some(expected.into()),
        "expected {:?}, got {}",
        expected,
        err
    );
}

pub(crate) const CHAIN_DOMAIN: u64 = 7;
pub(crate) const POOL_INDEX: u32 = 0;

/// Ledger with a hash-binding proof system, an asset ledger and a token.
pub(crate) struct Fixture {
    pub ledger: CommitteePool,
    pub assets: InMemoryAssetLedger,
    pub authority: Pubkey,
    pub token: Pubkey,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_trees(8, 30)
    }

    pub fn with_trees(depth: u8, root_history_size: u16) -> Self {
        let authority = Pubkey::new_unique();
        let ledger = CommitteePool::new(
            RegistryConfig::new(authority, CHAIN_DOMAIN).with_tree(depth, root_history_size),
            PoolConfig::new(authority, CHAIN_DOMAIN, POOL_INDEX, [42u8; 32])
                .with_tree(depth, root_history_size),
            Box::new(HashBindingProofSystem),
        )
        .unwrap();

        Self {
            ledger,
            assets: InMemoryAssetLedger::new(Pubkey::new_unique()),
            authority,
            token: Pubkey::new_unique(),
        }
    }

    /// Committee root of `members` public keys, each a spender.
    pub fn committee_root(members: &[u64]) -> Scalar {
        let leaves: Vec<Scalar> = members
            .iter()
            .map(|m| {
                MemberLeaf::new(u64_to_scalar(*m), MemberLeaf::SPENDER)
                    .hash()
                    .unwrap()
            })
            .collect();
        merkle_root_of(&leaves, 4).unwrap()
    }

    /// Register `owner` with a committee of `members` and the given quorum.
    pub fn register(&mut self, owner: &Keypair, members: &[u64], quorum: u64) {
        let data = AccountData {
            identifier: owner.pubkey(),
            committee_root: Self::committee_root(members),
            quorum,
            registry_proof: None,
            nonce: 1,
        };
        self.ledger.manage_account(&owner.pubkey(), data, &[]).unwrap();
    }

    pub fn deposit_data(&self, sender: &Keypair, amounts: &[u64]) -> DepositData {
        DepositData {
            sender: sender.pubkey(),
            entries: amounts
                .iter()
                .enumerate()
                .map(|(i, amount)| PreCommitment {
                    receiver_hash: u64_to_scalar(900 + i as u64),
                    token_data: TokenData::fungible(self.token, *amount),
                    encrypted_note: vec![i as u8; 4],
                })
                .collect(),
        }
    }

    pub fn sign_deposit(&self, sender: &Keypair, data: &DepositData) -> Vec<u8> {
        let digest = self.ledger.pool().deposit_digest(data).unwrap();
        sender.sign_message(&digest).as_ref().to_vec()
    }

    /// Mint to `sender`, deposit `amounts` and return the new commitments
    /// with their leaf indices.
    pub fn deposit(&mut self, sender: &Keypair, amounts: &[u64]) -> Vec<(Scalar, u64)> {
        let total: u64 = amounts.iter().sum();
        self.assets
            .mint(&self.token, 0, &sender.pubkey(), total)
            .unwrap();

        let data = self.deposit_data(sender, amounts);
        let signature = self.sign_deposit(sender, &data);
        let digest = self.ledger.pool().deposit_digest(&data).unwrap();
        let first_index = self.ledger.pool().tree().next_index();
        let commitments: Vec<(Scalar, u64)> = (0..amounts.len())
            .map(|i| {
                let c = self
                    .ledger
                    .pool()
                    .deposit_commitment(&digest, &data, i)
                    .unwrap();
                (c, first_index + i as u64)
            })
            .collect();

        self.ledger
            .deposit(&mut self.assets, data, &signature)
            .unwrap();
        commitments
    }

    pub fn nullifier(&self, commitment: &Scalar, index: u64) -> Scalar {
        self.ledger
            .pool()
            .compute_nullifier(commitment, index)
            .unwrap()
    }

    pub fn register_transfer_shape(&mut self, shape: TransferShape) {
        let ic_len = shape_ic_len(TransferPublicInputs::BASE_COUNT, &[shape.inputs, shape.outputs]);
        self.ledger
            .set_transfer_verifying_key(&self.authority, shape, dummy_vk(ic_len))
            .unwrap();
    }

    pub fn register_balance_shape(&mut self, shape: BalanceShape) {
        let ic_len = shape_ic_len(BalancePublicInputs::BASE_COUNT, &[shape.inputs]);
        self.ledger
            .set_balance_verifying_key(&self.authority, shape, dummy_vk(ic_len))
            .unwrap();
    }

    pub fn ext_data(&self, account: Pubkey, transfer_type: TransferType, amount: u64) -> ExtData {
        ExtData {
            chain_domain: CHAIN_DOMAIN,
            pool_index: POOL_INDEX,
            account,
            transfer_type,
            token_data: TokenData::fungible(self.token, amount),
        }
    }

    /// Public data against the current roots.
    pub fn public_data(
        &self,
        in_nullifiers: Vec<Scalar>,
        out_commitments: Vec<Scalar>,
        count: u32,
    ) -> PublicData {
        let encrypted_notes = out_commitments.iter().map(|_| vec![0xee; 8]).collect();
        PublicData {
            commitment_root: self.ledger.pool().root(),
            registry_root: self.ledger.registry().root(),
            start_index: 0,
            count,
            in_nullifiers,
            out_commitments,
            encrypted_notes,
        }
    }

    /// Proof accepted by the transfer key registered for this spend's shape.
    pub fn prove_spend(&self, public_data: &PublicData, ext_data: &ExtData) -> Vec<u8> {
        let shape = TransferShape::new(
            public_data.in_nullifiers.len() as u32,
            public_data.out_commitments.len() as u32,
            public_data.count,
        );
        let vk = &self.ledger.pool().transfer_keys().get(&shape).unwrap().vk;
        let inputs = TransferPublicInputs {
            commitment_root: public_data.commitment_root,
            registry_root: public_data.registry_root,
            ext_data_hash: ext_data.hash().unwrap(),
            nullifiers: public_data.in_nullifiers.clone(),
            commitments: public_data.out_commitments.clone(),
        };
        HashBindingProofSystem::prove(vk, &inputs.to_field_elements())
    }

    pub fn prove_balance(
        &self,
        min_balance: u64,
        commitment_root: Scalar,
        registry_root: Scalar,
        nullifiers: &[Scalar],
    ) -> Vec<u8> {
        let shape = BalanceShape::new(nullifiers.len() as u32);
        let vk = &self.ledger.pool().balance_keys().get(&shape).unwrap().vk;
        let inputs = BalancePublicInputs {
            commitment_root,
            registry_root,
            token: token_field(&self.token),
            min_balance,
            nullifiers: nullifiers.to_vec(),
        };
        HashBindingProofSystem::prove(vk, &inputs.to_field_elements())
    }
}

fn shape_ic_len(base: usize, dimensions: &[u32]) -> usize {
    base + dimensions.iter().map(|d| *d as usize).sum::<usize>() + 1
}

//! End-to-end ledger scenarios against the hash-binding proof system

use anchor_lang::prelude::*;
use solana_sdk::signature::{Keypair, Signer};

use crate::crypto::field::{u64_to_scalar, Scalar};
use crate::asset_ledger::{AssetLedger, InMemoryAssetLedger};
use crate::error::PoolError;
use crate::events::LedgerEvent;
use crate::state::{merkle_root_of, BalanceShape, MembershipShape, TransferShape};
use crate::test_utils::{assert_pool_error, dummy_vk, Fixture, HashBindingProofSystem};
use crate::types::{AccountData, TokenData, TransferType};

fn note(fixture: &Fixture, amount: u64, salt: u64) -> Scalar {
    fixture
        .ledger
        .pool()
        .compute_commitment(
            &u64_to_scalar(31337),
            &TokenData::fungible(fixture.token, amount),
            &u64_to_scalar(salt),
        )
        .unwrap()
}

// =========================================================================
// SCENARIO
// =========================================================================

#[test]
fn test_deposit_transfer_withdraw_scenario() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    let recipient = Pubkey::new_unique();
    f.register(&owner, &[11, 12, 13], 2);
    f.register_transfer_shape(TransferShape::new(1, 1, 2));
    f.register_transfer_shape(TransferShape::new(1, 0, 2));

    // deposit 100 T
    let deposited = f.deposit(&owner, &[100]);
    let custody = *f.assets.custody();
    assert_eq!(f.assets.custody_balance(&f.token, 0), 100);
    let (deposit_commitment, deposit_index) = deposited[0];

    // transfer into a new 100 T note
    let n0 = f.nullifier(&deposit_commitment, deposit_index);
    let new_note = note(&f, 100, 1);
    let public_data = f.public_data(vec![n0], vec![new_note], 2);
    let ext_data = f.ext_data(owner.pubkey(), TransferType::Transfer, 100);
    let proof = f.prove_spend(&public_data, &ext_data);
    f.ledger.transfer(&proof, public_data, ext_data).unwrap();

    // withdraw the new note to the recipient
    let n1 = f.nullifier(&new_note, 1);
    let public_data = f.public_data(vec![n1], vec![], 2);
    let ext_data = f.ext_data(recipient, TransferType::Withdrawal, 100);
    let proof = f.prove_spend(&public_data, &ext_data);
    f.ledger
        .withdraw(&mut f.assets, &proof, public_data, ext_data)
        .unwrap();

    let pool = f.ledger.pool();
    assert_eq!(pool.nullifiers().len(), 2);
    assert!(pool.is_spent(&n0) && pool.is_spent(&n1));
    assert_eq!(pool.tree().leaves(), vec![deposit_commitment, new_note]);
    assert_eq!(f.assets.balance_of(&f.token, 0, &custody), 0);
    assert_eq!(f.assets.balance_of(&f.token, 0, &recipient), 100);
    assert_eq!(f.assets.balance_of(&f.token, 0, &owner.pubkey()), 0);

    let commitments: Vec<u64> = f.ledger.events().commitments().map(|c| c.index).collect();
    assert_eq!(commitments, vec![0, 1]);
    let nullifiers: Vec<Scalar> = f.ledger.events().nullifiers().map(|n| n.value).collect();
    assert_eq!(nullifiers, vec![n0, n1]);
    assert!(matches!(
        f.ledger.events().events().last(),
        Some(LedgerEvent::Withdrawal(w)) if w.account == recipient && w.amount == 100
    ));
}

// =========================================================================
// REGISTRY
// =========================================================================

#[test]
fn test_registry_root_matches_leaves() {
    let mut f = Fixture::new();
    let accounts: Vec<Keypair> = (0..4).map(|_| Keypair::new()).collect();
    for (i, account) in accounts.iter().enumerate() {
        f.register(account, &[i as u64 + 1, 100], 1);
    }

    // replace the committee of the second account
    let target = &accounts[1];
    let data = AccountData {
        identifier: target.pubkey(),
        committee_root: Fixture::committee_root(&[7, 8, 9]),
        quorum: 2,
        registry_proof: f.ledger.registry().registry_proof(&target.pubkey()),
        nonce: 2,
    };
    f.ledger.manage_account(&target.pubkey(), data, &[]).unwrap();

    let registry = f.ledger.registry();
    assert_eq!(registry.tree().next_index(), 4);
    let leaves: Vec<Scalar> = accounts
        .iter()
        .map(|a| registry.account(&a.pubkey()).unwrap().leaf_hash().unwrap())
        .collect();
    assert_eq!(registry.tree().leaves(), leaves);
    assert_eq!(registry.root(), merkle_root_of(&leaves, 8).unwrap());

    assert!(matches!(
        f.ledger.events().events().last(),
        Some(LedgerEvent::Update(u)) if u.account_index == 1 && u.new_leaf_hash == leaves[1]
    ));
}

#[test]
fn test_manage_account_nonce_and_authorization() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    let relayer = Pubkey::new_unique();
    let root = Fixture::committee_root(&[1, 2]);

    let data = AccountData {
        identifier: owner.pubkey(),
        committee_root: root,
        quorum: 2,
        registry_proof: None,
        nonce: 1,
    };

    // relayer without a signature
    assert_pool_error(
        f.ledger.manage_account(&relayer, data.clone(), &[]),
        PoolError::InvalidSignature,
    );

    // relayer with the owner's signature over the account digest
    let digest = f.ledger.registry().account_digest(&data);
    let signature = owner.sign_message(&digest);
    f.ledger
        .manage_account(&relayer, data.clone(), signature.as_ref())
        .unwrap();
    assert_eq!(f.ledger.registry().nonce(&owner.pubkey()), 1);

    // replaying the same request
    assert_pool_error(
        f.ledger.manage_account(&relayer, data, signature.as_ref()),
        PoolError::ReplayedNonce,
    );

    // skipping a nonce
    let skipped = AccountData {
        identifier: owner.pubkey(),
        committee_root: root,
        quorum: 1,
        registry_proof: f.ledger.registry().registry_proof(&owner.pubkey()),
        nonce: 3,
    };
    assert_pool_error(
        f.ledger.manage_account(&owner.pubkey(), skipped, &[]),
        PoolError::ReplayedNonce,
    );
    assert_eq!(f.ledger.events().len(), 1);
}

#[test]
fn test_manage_account_rejects_bad_data_and_proofs() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    let base = AccountData {
        identifier: owner.pubkey(),
        committee_root: Fixture::committee_root(&[1]),
        quorum: 1,
        registry_proof: None,
        nonce: 1,
    };

    let mut zero_quorum = base.clone();
    zero_quorum.quorum = 0;
    assert_pool_error(
        f.ledger.manage_account(&owner.pubkey(), zero_quorum, &[]),
        PoolError::InvalidAccountData,
    );

    let mut zero_root = base.clone();
    zero_root.committee_root = [0u8; 32];
    assert_pool_error(
        f.ledger.manage_account(&owner.pubkey(), zero_root, &[]),
        PoolError::InvalidAccountData,
    );

    // a new account carrying a proof
    let mut with_proof = base.clone();
    with_proof.registry_proof = Some(crate::state::MerkleProof {
        leaf_index: 0,
        siblings: vec![[0u8; 32]; 8],
    });
    assert_pool_error(
        f.ledger.manage_account(&owner.pubkey(), with_proof, &[]),
        PoolError::InvalidMerkleProof,
    );

    f.ledger.manage_account(&owner.pubkey(), base.clone(), &[]).unwrap();

    // an update without a proof
    let mut update = base;
    update.nonce = 2;
    update.committee_root = Fixture::committee_root(&[1, 2]);
    assert_pool_error(
        f.ledger.manage_account(&owner.pubkey(), update.clone(), &[]),
        PoolError::InvalidMerkleProof,
    );

    // an update with a stale proof
    let stale = f.ledger.registry().registry_proof(&owner.pubkey());
    f.register(&Keypair::new(), &[5], 1);
    update.registry_proof = stale;
    let root = f.ledger.registry().root();
    assert_pool_error(
        f.ledger.manage_account(&owner.pubkey(), update, &[]),
        PoolError::InvalidMerkleProof,
    );
    assert_eq!(f.ledger.registry().root(), root);
    assert_eq!(f.ledger.registry().nonce(&owner.pubkey()), 1);
}

#[test]
fn test_membership_verification() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    let message = u64_to_scalar(555);

    // unknown account is simply not a member
    assert!(!f.ledger.verify(&owner.pubkey(), message, 1, &[]).unwrap());

    f.register(&owner, &[1, 2], 1);
    assert_pool_error(
        f.ledger.verify(&owner.pubkey(), message, 1, &[]),
        PoolError::UnsupportedShape,
    );

    let authority = f.authority;
    f.ledger
        .set_membership_verifying_key(&authority, dummy_vk(4))
        .unwrap();
    let vk = &f.ledger.registry().membership_keys().get(&MembershipShape).unwrap().vk;
    let root = f.ledger.registry().committee_root(&owner.pubkey()).unwrap();
    let proof = HashBindingProofSystem::prove(vk, &[root, message, u64_to_scalar(1)]);

    assert!(f.ledger.verify(&owner.pubkey(), message, 1, &proof).unwrap());
    assert!(!f.ledger.verify(&owner.pubkey(), message, 2, &proof).unwrap());
    assert!(!f.ledger.verify(&owner.pubkey(), u64_to_scalar(556), 1, &proof).unwrap());
    // malformed proof is a rejection, not an abort
    assert!(!f.ledger.verify(&owner.pubkey(), message, 1, &[1, 2, 3]).unwrap());
}

// =========================================================================
// DEPOSITS
// =========================================================================

#[test]
fn test_is_valid_deposit_is_pure() {
    let mut f = Fixture::new();
    let sender = Keypair::new();
    f.deposit(&sender, &[10]);

    let data = f.deposit_data(&sender, &[5, 6]);
    let signature = f.sign_deposit(&sender, &data);
    let root = f.ledger.pool().root();
    let events = f.ledger.events().len();

    for _ in 0..3 {
        assert!(f.ledger.is_valid_deposit(&data, &signature));
    }
    assert!(!f.ledger.is_valid_deposit(&data, &signature[..63]));
    assert!(!f.ledger.is_valid_deposit(&f.deposit_data(&sender, &[5, 7]), &signature));
    assert!(!f.ledger.is_valid_deposit(&f.deposit_data(&sender, &[]), &signature));

    let other = Keypair::new();
    let forged = f.sign_deposit(&other, &data);
    assert!(!f.ledger.is_valid_deposit(&data, &forged));

    assert_eq!(f.ledger.pool().root(), root);
    assert_eq!(f.ledger.events().len(), events);
}

#[test]
fn test_deposit_events_and_positional_salts() {
    let mut f = Fixture::new();
    let sender = Keypair::new();
    let commitments = f.deposit(&sender, &[30, 30]);

    assert_ne!(commitments[0].0, commitments[1].0);
    assert_eq!(f.ledger.pool().tree().leaves(), vec![commitments[0].0, commitments[1].0]);

    let deposits: Vec<(u64, u64)> = f
        .ledger
        .events()
        .events()
        .iter()
        .filter_map(|e| match e {
            LedgerEvent::Deposit(d) => Some((d.index, d.amount)),
            _ => None,
        })
        .collect();
    assert_eq!(deposits, vec![(0, 30), (1, 30)]);
    assert_eq!(f.assets.custody_balance(&f.token, 0), 60);
}

#[test]
fn test_failed_deposit_refunds_pulled_entries() {
    let mut f = Fixture::new();
    let sender = Keypair::new();
    f.assets.mint(&f.token, 0, &sender.pubkey(), 100).unwrap();

    let data = f.deposit_data(&sender, &[60, 60]);
    let signature = f.sign_deposit(&sender, &data);
    let root = f.ledger.pool().root();

    assert_pool_error(
        f.ledger.deposit(&mut f.assets, data, &signature),
        PoolError::AssetTransferFailed,
    );
    assert_eq!(f.assets.balance_of(&f.token, 0, &sender.pubkey()), 100);
    assert_eq!(f.assets.custody_balance(&f.token, 0), 0);
    assert_eq!(f.ledger.pool().root(), root);
    assert!(f.ledger.events().is_empty());
}

/// Asset ledger whose payouts from custody can be switched off.
struct PayoutBlockedLedger {
    inner: InMemoryAssetLedger,
    block_payouts: bool,
}

impl AssetLedger for PayoutBlockedLedger {
    fn transfer_in(&mut self, token: &Pubkey, identifier: u64, from: &Pubkey, amount: u64)
        -> Result<()> {
        self.inner.transfer_in(token, identifier, from, amount)
    }

    fn transfer_out(&mut self, token: &Pubkey, identifier: u64, to: &Pubkey, amount: u64)
        -> Result<()> {
        require!(!self.block_payouts, PoolError::AssetTransferFailed);
        self.inner.transfer_out(token, identifier, to, amount)
    }
}

#[test]
fn test_failed_rollback_is_reported_separately() {
    let mut f = Fixture::new();
    let sender = Keypair::new();
    let mut assets = PayoutBlockedLedger {
        inner: InMemoryAssetLedger::new(Pubkey::new_unique()),
        block_payouts: true,
    };
    assets.inner.mint(&f.token, 0, &sender.pubkey(), 100).unwrap();

    let data = f.deposit_data(&sender, &[60, 60]);
    let signature = f.sign_deposit(&sender, &data);
    let root = f.ledger.pool().root();

    assert_pool_error(
        f.ledger.deposit(&mut assets, data.clone(), &signature),
        PoolError::RefundFailed,
    );
    // the first entry stays in custody with no commitment for it
    assert_eq!(assets.inner.custody_balance(&f.token, 0), 60);
    assert_eq!(assets.inner.balance_of(&f.token, 0, &sender.pubkey()), 40);
    assert_eq!(f.ledger.pool().root(), root);
    assert!(f.ledger.events().is_empty());

    // with payouts working the same shortfall rolls back cleanly
    assets.block_payouts = false;
    assets.inner.mint(&f.token, 0, &sender.pubkey(), 60).unwrap();
    assert_pool_error(
        f.ledger.deposit(&mut assets, data, &signature),
        PoolError::AssetTransferFailed,
    );
    assert_eq!(assets.inner.custody_balance(&f.token, 0), 60);
    assert_eq!(assets.inner.balance_of(&f.token, 0, &sender.pubkey()), 100);
    assert!(f.ledger.events().is_empty());
}

#[test]
fn test_deposit_requires_signature_and_capacity() {
    let mut f = Fixture::with_trees(4, 30);
    let sender = Keypair::new();
    f.assets.mint(&f.token, 0, &sender.pubkey(), 1_000).unwrap();

    let data = f.deposit_data(&sender, &[1]);
    assert_pool_error(
        f.ledger.deposit(&mut f.assets, data, &[0u8; 64]),
        PoolError::InvalidSignature,
    );

    let data = f.deposit_data(&sender, &[1; 17]);
    let signature = f.sign_deposit(&sender, &data);
    assert_pool_error(
        f.ledger.deposit(&mut f.assets, data, &signature),
        PoolError::CapacityExceeded,
    );
    assert_eq!(f.assets.custody_balance(&f.token, 0), 0);
}

// =========================================================================
// SPENDS
// =========================================================================

#[test]
fn test_nullifier_accepted_once() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    f.register(&owner, &[1, 2], 2);
    f.register_transfer_shape(TransferShape::new(1, 1, 2));
    f.register_transfer_shape(TransferShape::new(2, 1, 2));
    let (commitment, index) = f.deposit(&owner, &[50])[0];
    let nullifier = f.nullifier(&commitment, index);

    let public_data = f.public_data(vec![nullifier], vec![note(&f, 50, 1)], 2);
    let ext_data = f.ext_data(owner.pubkey(), TransferType::Transfer, 50);
    let proof = f.prove_spend(&public_data, &ext_data);
    f.ledger
        .transfer(&proof, public_data.clone(), ext_data.clone())
        .unwrap();

    // the same spend again, even against a still-recent root
    let root = f.ledger.pool().root();
    assert_pool_error(
        f.ledger.transfer(&proof, public_data, ext_data.clone()),
        PoolError::DoubleSpend,
    );
    assert_eq!(f.ledger.pool().root(), root);

    // a nullifier repeated within one call
    let (other, other_index) = f.deposit(&owner, &[50])[0];
    let fresh = f.nullifier(&other, other_index);
    let public_data = f.public_data(vec![fresh, fresh], vec![note(&f, 100, 2)], 2);
    let proof = f.prove_spend(&public_data, &ext_data);
    assert_pool_error(
        f.ledger.transfer(&proof, public_data, ext_data),
        PoolError::DoubleSpend,
    );
    assert!(!f.ledger.pool().is_spent(&fresh));
}

#[test]
fn test_stale_roots_rejected() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    f.register(&owner, &[1], 1);
    f.register_transfer_shape(TransferShape::new(1, 1, 1));

    let (commitment, index) = f.deposit(&owner, &[10])[0];
    let first_root = f.ledger.pool().root();
    // 30 more insertions push the first root out of a 30-entry history
    f.deposit(&owner, &[1; 30]);

    let nullifier = f.nullifier(&commitment, index);
    let mut public_data = f.public_data(vec![nullifier], vec![note(&f, 10, 1)], 1);
    public_data.commitment_root = first_root;
    let ext_data = f.ext_data(owner.pubkey(), TransferType::Transfer, 10);
    let proof = f.prove_spend(&public_data, &ext_data);
    assert_pool_error(
        f.ledger.transfer(&proof, public_data, ext_data.clone()),
        PoolError::StaleRoot,
    );

    let mut public_data = f.public_data(vec![nullifier], vec![note(&f, 10, 1)], 1);
    public_data.registry_root = u64_to_scalar(12345);
    let proof = f.prove_spend(&public_data, &ext_data);
    assert_pool_error(
        f.ledger.transfer(&proof, public_data, ext_data),
        PoolError::StaleRoot,
    );
    assert!(!f.ledger.pool().is_spent(&nullifier));
}

#[test]
fn test_spend_validation_order() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    f.register(&owner, &[1], 1);
    let (commitment, index) = f.deposit(&owner, &[10])[0];
    let nullifier = f.nullifier(&commitment, index);
    let output = note(&f, 10, 1);

    // wrong deployment
    let public_data = f.public_data(vec![nullifier], vec![output], 1);
    let mut ext_data = f.ext_data(owner.pubkey(), TransferType::Transfer, 10);
    ext_data.chain_domain += 1;
    assert_pool_error(
        f.ledger.transfer(&[0u8; 32], public_data.clone(), ext_data),
        PoolError::InvalidExtData,
    );

    // withdrawal ext data submitted as a transfer
    let ext_data = f.ext_data(owner.pubkey(), TransferType::Withdrawal, 10);
    assert_pool_error(
        f.ledger.transfer(&[0u8; 32], public_data.clone(), ext_data),
        PoolError::InvalidExtData,
    );

    // missing encrypted note, no authorizers, no inputs
    let ext_data = f.ext_data(owner.pubkey(), TransferType::Transfer, 10);
    let mut missing_note = public_data.clone();
    missing_note.encrypted_notes.clear();
    assert_pool_error(
        f.ledger.transfer(&[0u8; 32], missing_note, ext_data.clone()),
        PoolError::InvalidPublicData,
    );
    let mut no_authorizers = public_data.clone();
    no_authorizers.count = 0;
    assert_pool_error(
        f.ledger.transfer(&[0u8; 32], no_authorizers, ext_data.clone()),
        PoolError::InvalidPublicData,
    );
    let no_inputs = f.public_data(vec![], vec![output], 1);
    assert_pool_error(
        f.ledger.transfer(&[0u8; 32], no_inputs, ext_data.clone()),
        PoolError::InvalidPublicData,
    );

    // output commitment outside the scalar field
    let non_canonical = f.public_data(vec![nullifier], vec![[0xff; 32]], 1);
    assert_pool_error(
        f.ledger.transfer(&[0u8; 32], non_canonical, ext_data.clone()),
        PoolError::InvalidPublicData,
    );

    // no key for the shape
    assert_pool_error(
        f.ledger.transfer(&[0u8; 32], public_data.clone(), ext_data.clone()),
        PoolError::UnsupportedShape,
    );

    // key exists but the proof is bound to other data
    f.register_transfer_shape(TransferShape::new(1, 1, 1));
    let mut other_ext = ext_data.clone();
    other_ext.account = Pubkey::new_unique();
    let proof = f.prove_spend(&public_data, &other_ext);
    assert_pool_error(
        f.ledger.transfer(&proof, public_data.clone(), ext_data.clone()),
        PoolError::InvalidProof,
    );
    assert_pool_error(
        f.ledger.transfer(&[1u8; 7], public_data.clone(), ext_data.clone()),
        PoolError::InvalidProof,
    );

    assert!(!f.ledger.pool().is_spent(&nullifier));
    assert_eq!(f.ledger.pool().tree().next_index(), 1);

    let proof = f.prove_spend(&public_data, &ext_data);
    f.ledger.transfer(&proof, public_data, ext_data).unwrap();
    assert!(f.ledger.pool().is_spent(&nullifier));
}

#[test]
fn test_transfer_capacity_checked_before_spending() {
    let mut f = Fixture::with_trees(4, 30);
    let owner = Keypair::new();
    f.register(&owner, &[1], 1);
    f.register_transfer_shape(TransferShape::new(1, 2, 1));
    let deposited = f.deposit(&owner, &[1; 15]);
    let (commitment, index) = deposited[0];
    let nullifier = f.nullifier(&commitment, index);

    let public_data = f.public_data(vec![nullifier], vec![note(&f, 1, 1), note(&f, 1, 2)], 1);
    let ext_data = f.ext_data(owner.pubkey(), TransferType::Transfer, 1);
    let proof = f.prove_spend(&public_data, &ext_data);
    assert_pool_error(
        f.ledger.transfer(&proof, public_data, ext_data),
        PoolError::CapacityExceeded,
    );
    assert!(!f.ledger.pool().is_spent(&nullifier));
}

#[test]
fn test_outputs_conserve_deposited_value() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    let alice = Pubkey::new_unique();
    let bob = Pubkey::new_unique();
    f.register(&owner, &[1, 2], 2);
    f.register_transfer_shape(TransferShape::new(1, 2, 2));
    f.register_transfer_shape(TransferShape::new(1, 0, 2));

    let (commitment, index) = f.deposit(&owner, &[100])[0];
    let n0 = f.nullifier(&commitment, index);
    let sixty = note(&f, 60, 1);
    let forty = note(&f, 40, 2);
    let public_data = f.public_data(vec![n0], vec![sixty, forty], 2);
    let ext_data = f.ext_data(owner.pubkey(), TransferType::Transfer, 100);
    let proof = f.prove_spend(&public_data, &ext_data);
    f.ledger.transfer(&proof, public_data, ext_data).unwrap();

    for (commitment, index, to, amount) in [(sixty, 1, alice, 60), (forty, 2, bob, 40)] {
        let nullifier = f.nullifier(&commitment, index);
        let public_data = f.public_data(vec![nullifier], vec![], 2);
        let ext_data = f.ext_data(to, TransferType::Withdrawal, amount);
        let proof = f.prove_spend(&public_data, &ext_data);
        f.ledger
            .withdraw(&mut f.assets, &proof, public_data, ext_data)
            .unwrap();
    }

    let withdrawn = f.assets.balance_of(&f.token, 0, &alice) + f.assets.balance_of(&f.token, 0, &bob);
    assert_eq!(withdrawn, 100);
    assert_eq!(f.assets.custody_balance(&f.token, 0), 0);
}

#[test]
fn test_failed_payout_leaves_notes_spendable() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    f.register(&owner, &[1], 1);
    f.register_transfer_shape(TransferShape::new(1, 0, 1));
    let (commitment, index) = f.deposit(&owner, &[10])[0];
    let nullifier = f.nullifier(&commitment, index);

    // custody only holds 10
    let public_data = f.public_data(vec![nullifier], vec![], 1);
    let ext_data = f.ext_data(owner.pubkey(), TransferType::Withdrawal, 11);
    let proof = f.prove_spend(&public_data, &ext_data);
    let events = f.ledger.events().len();
    assert_pool_error(
        f.ledger.withdraw(&mut f.assets, &proof, public_data, ext_data),
        PoolError::AssetTransferFailed,
    );
    assert!(!f.ledger.pool().is_spent(&nullifier));
    assert_eq!(f.ledger.events().len(), events);
}

// =========================================================================
// BALANCE PROOFS
// =========================================================================

#[test]
fn test_balance_proof_false_once_spent() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    f.register(&owner, &[1], 1);
    f.register_balance_shape(BalanceShape::new(1));
    f.register_transfer_shape(TransferShape::new(1, 1, 1));
    let (commitment, index) = f.deposit(&owner, &[80])[0];
    let nullifier = f.nullifier(&commitment, index);

    let commitment_root = f.ledger.pool().root();
    let registry_root = f.ledger.registry().root();
    let proof = f.prove_balance(50, commitment_root, registry_root, &[nullifier]);
    let check = |f: &Fixture, min: u64| {
        f.ledger
            .verify_balance_of(&f.token, min, commitment_root, registry_root, &[nullifier], &proof)
    };

    assert!(check(&f, 50).unwrap());
    assert!(!check(&f, 60).unwrap());

    let public_data = f.public_data(vec![nullifier], vec![note(&f, 80, 1)], 1);
    let ext_data = f.ext_data(owner.pubkey(), TransferType::Transfer, 80);
    let spend = f.prove_spend(&public_data, &ext_data);
    f.ledger.transfer(&spend, public_data, ext_data).unwrap();

    // the roots are still recent, only the spent note makes it false
    assert!(!check(&f, 50).unwrap());
}

#[test]
fn test_balance_proof_aborts_on_stale_root_or_missing_shape() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    f.register(&owner, &[1], 1);
    let (commitment, index) = f.deposit(&owner, &[5])[0];
    let nullifier = f.nullifier(&commitment, index);
    let pool_root = f.ledger.pool().root();
    let registry_root = f.ledger.registry().root();

    assert_pool_error(
        f.ledger
            .verify_balance_of(&f.token, 1, pool_root, registry_root, &[nullifier], &[]),
        PoolError::UnsupportedShape,
    );
    assert_pool_error(
        f.ledger
            .verify_balance_of(&f.token, 1, [9u8; 32], registry_root, &[nullifier], &[]),
        PoolError::StaleRoot,
    );

    f.register_balance_shape(BalanceShape::new(1));
    assert!(!f
        .ledger
        .verify_balance_of(&f.token, 1, pool_root, registry_root, &[nullifier], &[0u8; 3])
        .unwrap());
}

#[test]
fn test_balance_proof_counts_each_note_once() {
    let mut f = Fixture::new();
    let owner = Keypair::new();
    f.register(&owner, &[1], 1);
    f.register_balance_shape(BalanceShape::new(2));
    let deposited = f.deposit(&owner, &[50, 50]);
    let first = f.nullifier(&deposited[0].0, deposited[0].1);
    let second = f.nullifier(&deposited[1].0, deposited[1].1);
    let commitment_root = f.ledger.pool().root();
    let registry_root = f.ledger.registry().root();

    let proof = f.prove_balance(100, commitment_root, registry_root, &[first, second]);
    assert!(f
        .ledger
        .verify_balance_of(&f.token, 100, commitment_root, registry_root, &[first, second], &proof)
        .unwrap());

    // one 50 note named twice must not attest 100
    let repeated = f.prove_balance(100, commitment_root, registry_root, &[first, first]);
    assert!(!f
        .ledger
        .verify_balance_of(&f.token, 100, commitment_root, registry_root, &[first, first], &repeated)
        .unwrap());
}

// =========================================================================
// VERIFYING KEY ADMINISTRATION
// =========================================================================

#[test]
fn test_verifying_key_administration() {
    let mut f = Fixture::new();
    let outsider = Pubkey::new_unique();
    let authority = f.authority;

    assert_pool_error(
        f.ledger.set_membership_verifying_key(&outsider, dummy_vk(4)),
        PoolError::Unauthorized,
    );
    assert_pool_error(
        f.ledger
            .set_balance_verifying_key(&authority, BalanceShape::new(2), dummy_vk(4)),
        PoolError::InvalidVerifyingKey,
    );

    let shapes = [TransferShape::new(1, 1, 1), TransferShape::new(2, 2, 3)];
    f.ledger
        .set_transfer_verifying_keys(&authority, &shapes, vec![dummy_vk(6), dummy_vk(8)])
        .unwrap();
    f.ledger
        .set_balance_verifying_keys(&authority, &[BalanceShape::new(2)], vec![dummy_vk(7)])
        .unwrap();

    let kinds: Vec<(String, Vec<u32>)> = f
        .ledger
        .events()
        .events()
        .iter()
        .filter_map(|e| match e {
            LedgerEvent::VerifyingKeySet(k) => Some((k.kind.clone(), k.dimensions.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("transfer".to_string(), vec![1, 1, 1]),
            ("transfer".to_string(), vec![2, 2, 3]),
            ("balance".to_string(), vec![2]),
        ]
    );
    assert_eq!(f.ledger.pool().transfer_keys().len(), 2);
}

#[test]
fn test_membership_key_batch_setter() {
    let mut f = Fixture::new();
    let authority = f.authority;

    assert_pool_error(
        f.ledger
            .set_membership_verifying_keys(&Pubkey::new_unique(), &[MembershipShape], vec![dummy_vk(4)]),
        PoolError::Unauthorized,
    );
    assert_pool_error(
        f.ledger
            .set_membership_verifying_keys(&authority, &[MembershipShape], vec![]),
        PoolError::InvalidVerifyingKey,
    );

    f.ledger
        .set_membership_verifying_keys(&authority, &[MembershipShape], vec![dummy_vk(4)])
        .unwrap();
    let keys = f.ledger.registry().membership_keys();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys.get(&MembershipShape).unwrap().vk, dummy_vk(4));
    assert!(matches!(
        f.ledger.events().events().last(),
        Some(LedgerEvent::VerifyingKeySet(k)) if k.kind == "membership" && k.dimensions.is_empty()
    ));
}

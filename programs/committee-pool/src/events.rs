use anchor_lang::prelude::*;

// ============================================================================
// COMPILE-TIME SAFETY CHECK
// ============================================================================

// Prevent accidental mainnet builds with debug logging enabled
#[cfg(all(feature = "event-debug", feature = "mainnet"))]
compile_error!(
    "SECURITY ERROR: event-debug feature must not be enabled for mainnet builds! \
     Debug logs leak privacy-sensitive data (recipient, amount, depositor). \
     Remove event-debug feature or mainnet feature to proceed."
);

// =========================================================================
// REGISTRY EVENTS
// =========================================================================

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterEvent {
    pub account_index: u64,
    pub account_id: Pubkey,
    pub leaf_hash: [u8; 32],
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateEvent {
    pub account_index: u64,
    pub account_id: Pubkey,
    pub old_leaf_hash: [u8; 32],
    pub new_leaf_hash: [u8; 32],
}

// =========================================================================
// POOL EVENTS
// =========================================================================

/// Emitted for every leaf appended to the commitment tree, in index order.
/// Clients replay these to keep a mirror tree in sync.
#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitmentEvent {
    pub index: u64,
    pub commitment: [u8; 32],
    pub encrypted_note: Vec<u8>,
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositEvent {
    pub index: u64,
    pub sender: Pubkey,
    pub token: Pubkey,
    pub identifier: u64,
    pub amount: u64,
    pub commitment: [u8; 32],
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NullifierEvent {
    pub value: [u8; 32],
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawalEvent {
    pub account: Pubkey,
    pub token: Pubkey,
    pub identifier: u64,
    pub amount: u64,
}

// =========================================================================
// ADMIN EVENTS
// =========================================================================

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKeySetEvent {
    pub kind: String,
    pub dimensions: Vec<u32>,
    pub vk_hash: [u8; 32],
}

// =========================================================================
// EVENT LOG
// =========================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    Register(RegisterEvent),
    Update(UpdateEvent),
    Commitment(CommitmentEvent),
    Deposit(DepositEvent),
    Nullifier(NullifierEvent),
    Withdrawal(WithdrawalEvent),
    VerifyingKeySet(VerifyingKeySetEvent),
}

macro_rules! ledger_event_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for LedgerEvent {
                fn from(event: $ty) -> Self {
                    LedgerEvent::$variant(event)
                }
            }
        )*
    };
}

ledger_event_from! {
    Register => RegisterEvent,
    Update => UpdateEvent,
    Commitment => CommitmentEvent,
    Deposit => DepositEvent,
    Nullifier => NullifierEvent,
    Withdrawal => WithdrawalEvent,
    VerifyingKeySet => VerifyingKeySetEvent,
}

impl LedgerEvent {
    /// Write the event to the program log.
    fn emit(&self) {
        match self {
            LedgerEvent::Register(e) => emit!(e.clone()),
            LedgerEvent::Update(e) => emit!(e.clone()),
            LedgerEvent::Commitment(e) => emit!(e.clone()),
            LedgerEvent::Deposit(e) => emit!(e.clone()),
            LedgerEvent::Nullifier(e) => emit!(e.clone()),
            LedgerEvent::Withdrawal(e) => emit!(e.clone()),
            LedgerEvent::VerifyingKeySet(e) => emit!(e.clone()),
        }
    }
}

/// Append-only log of every event the ledger produced.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<LedgerEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch produced by one committed instruction.
    pub fn record_all(&mut self, events: Vec<LedgerEvent>) {
        for event in events {
            event.emit();
            self.events.push(event);
        }
    }

    pub fn record(&mut self, event: impl Into<LedgerEvent>) {
        self.record_all(vec![event.into()]);
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Events appended at or after position `from`.
    pub fn since(&self, from: usize) -> &[LedgerEvent] {
        self.events.get(from..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Commitment events in insertion order.
    pub fn commitments(&self) -> impl Iterator<Item = &CommitmentEvent> {
        self.events.iter().filter_map(|e| match e {
            LedgerEvent::Commitment(c) => Some(c),
            _ => None,
        })
    }

    /// Spent nullifiers in spend order.
    pub fn nullifiers(&self) -> impl Iterator<Item = &NullifierEvent> {
        self.events.iter().filter_map(|e| match e {
            LedgerEvent::Nullifier(n) => Some(n),
            _ => None,
        })
    }
}


use anchor_lang::prelude::*;

#[error_code]
pub enum PoolError {
    // =========================================================================
    // AUTHORIZATION ERRORS
    // =========================================================================

    #[msg("Nonce must be exactly the stored nonce plus one")]
    ReplayedNonce,

    #[msg("Signature is missing or does not verify for the expected signer")]
    InvalidSignature,

    #[msg("Caller is not the configured authority")]
    Unauthorized,

    // =========================================================================
    // LEDGER ERRORS
    // =========================================================================

    #[msg("Root is not in the recent root history")]
    StaleRoot,

    #[msg("Nullifier already spent")]
    DoubleSpend,

    #[msg("Merkle tree is full")]
    CapacityExceeded,

    #[msg("Merkle proof does not authenticate the leaf under the current root")]
    InvalidMerkleProof,

    #[msg("Tree depth must be between 4 and 32")]
    InvalidTreeDepth,

    #[msg("Root history size below minimum")]
    InvalidRootHistorySize,

    // =========================================================================
    // PROOF & VERIFYING KEY ERRORS
    // =========================================================================

    #[msg("No verifying key registered for this shape")]
    UnsupportedShape,

    #[msg("Invalid proof: verification failed")]
    InvalidProof,

    #[msg("Invalid proof format: expected 256 bytes A || B || C")]
    InvalidProofFormat,

    #[msg("Verifying key IC length does not match the shape")]
    InvalidVerifyingKey,

    #[msg("Value is not a canonical BN254 scalar")]
    InvalidScalar,

    #[msg("Cryptographic operation failed")]
    CryptographyError,

    // =========================================================================
    // INPUT VALIDATION ERRORS
    // =========================================================================

    #[msg("Account data rejected: quorum must be at least 1 and the committee root non-zero")]
    InvalidAccountData,

    #[msg("Token data rejected: amount must be positive, non-fungible amount must be 1")]
    InvalidTokenData,

    #[msg("External data does not target this pool or carries the wrong transfer type")]
    InvalidExtData,

    #[msg("Public data is malformed")]
    InvalidPublicData,

    // =========================================================================
    // ASSET LEDGER ERRORS
    // =========================================================================

    #[msg("Asset ledger transfer failed")]
    AssetTransferFailed,

    #[msg("Deposit rollback failed: pulled assets could not be returned to the sender")]
    RefundFailed,

    #[msg("Insufficient balance")]
    InsufficientBalance,

    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl PoolError {
    /// Check if error is related to proof verification
    pub fn is_proof_error(&self) -> bool {
        matches!(
            self,
            PoolError::UnsupportedShape
                | PoolError::InvalidProof
                | PoolError::InvalidProofFormat
                | PoolError::InvalidVerifyingKey
                | PoolError::InvalidScalar
                | PoolError::CryptographyError
        )
    }

    /// Check if error is related to authorization
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            PoolError::ReplayedNonce | PoolError::InvalidSignature | PoolError::Unauthorized
        )
    }

    /// Check if error rejects a spend against ledger state
    pub fn is_ledger_error(&self) -> bool {
        matches!(
            self,
            PoolError::StaleRoot | PoolError::DoubleSpend | PoolError::CapacityExceeded
        )
    }
}

/// Numeric code carried by an anchor error, if it came from [`PoolError`]
/// or any other `#[error_code]` enum.
pub fn error_code_of(err: &Error) -> Option<u32> {
    match err {
        Error::AnchorError(e) => Some(e.error_code_number),
        Error::ProgramError(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let a: u32 = PoolError::StaleRoot.into();
        let b: u32 = PoolError::DoubleSpend.into();
        assert_ne!(a, b);
        assert!(a >= 6000);
    }

    #[test]
    fn test_error_code_of_round_trip() {
        let err: Error = error!(PoolError::DoubleSpend);
        assert_eq!(error_code_of(&err), Some(PoolError::DoubleSpend.into()));
    }

    #[test]
    fn test_classification() {
        assert!(PoolError::InvalidProof.is_proof_error());
        assert!(PoolError::ReplayedNonce.is_auth_error());
        assert!(PoolError::StaleRoot.is_ledger_error());
        assert!(!PoolError::StaleRoot.is_proof_error());
    }
}

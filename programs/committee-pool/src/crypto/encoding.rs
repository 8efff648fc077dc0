//! Verifying-Key and Proof Encoding
//!
//! Converts the JSON emitted by trusted-setup and proving tooling into the
//! byte layout the alt_bn128 operations expect.
//!
//! # Byte Layout (authoritative)
//! - G1 point: 64 bytes = x (32 BE) || y (32 BE)
//! - G2 point: 128 bytes = x_c1 || x_c0 || y_c1 || y_c0 (imaginary first)
//!
//! # Verifying-key tables
//! Tables are arrays of `{ins, outs, quorum, vk}` (transfer) or `{ins, vk}`
//! (balance). Each `vk` is `{alfa1, beta2, gamma2, delta2, IC}` with field
//! elements as decimal (or `0x` hex) strings. G2 coordinates in these tables
//! are already imaginary-first: `X = [x_c1, x_c0]`, `Y = [y_c1, y_c0]`.
//!
//! # snarkjs proofs
//! snarkjs `proof.json` lists G2 coordinates real-first (`[c0, c1]`), so
//! [`snarkjs_proof_to_bytes`] swaps them.

use anchor_lang::prelude::*;
use num_bigint::BigUint;
use serde::Deserialize;

use crate::crypto::alt_bn128_syscalls::{G1Point, G2Point};
use crate::crypto::field::is_valid_fp;
use crate::crypto::groth16_verifier::PROOF_DATA_LEN;
use crate::error::PoolError;
use crate::state::{BalanceShape, TransferShape, VerifyingKey};

// =============================================================================
// JSON SHAPES
// =============================================================================

#[derive(Clone, Debug, Deserialize)]
pub struct G1Json {
    #[serde(rename = "X")]
    pub x: String,
    #[serde(rename = "Y")]
    pub y: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct G2Json {
    #[serde(rename = "X")]
    pub x: [String; 2],
    #[serde(rename = "Y")]
    pub y: [String; 2],
}

#[derive(Clone, Debug, Deserialize)]
pub struct VerifyingKeyJson {
    pub alfa1: G1Json,
    pub beta2: G2Json,
    pub gamma2: G2Json,
    pub delta2: G2Json,
    #[serde(rename = "IC")]
    pub ic: Vec<G1Json>,
}

/// One row of a transfer key table; `quorum` is the authorizer count.
#[derive(Clone, Debug, Deserialize)]
pub struct TransferKeyEntry {
    pub ins: u32,
    pub outs: u32,
    pub quorum: u32,
    pub vk: VerifyingKeyJson,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BalanceKeyEntry {
    pub ins: u32,
    pub vk: VerifyingKeyJson,
}

/// snarkjs `proof.json`
#[derive(Clone, Debug, Deserialize)]
pub struct SnarkjsProof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
}

// =============================================================================
// FIELD ELEMENTS
// =============================================================================

/// Parse a decimal or `0x`-prefixed hex string into a 32-byte big-endian
/// base field element.
pub fn parse_field_element(s: &str) -> Result<[u8; 32]> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x") {
        Some(hex_digits) => BigUint::parse_bytes(hex_digits.as_bytes(), 16),
        None => BigUint::parse_bytes(s.as_bytes(), 10),
    };
    let value = parsed.ok_or_else(|| {
        msg!("Not a number: {}", s);
        error!(PoolError::InvalidVerifyingKey)
    })?;

    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        msg!("Field element wider than 32 bytes: {}", s);
        return Err(error!(PoolError::InvalidVerifyingKey));
    }

    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    require!(is_valid_fp(&out), PoolError::InvalidVerifyingKey);
    Ok(out)
}

fn g1_from_coords(x: &str, y: &str) -> Result<G1Point> {
    let mut point = [0u8; 64];
    point[0..32].copy_from_slice(&parse_field_element(x)?);
    point[32..64].copy_from_slice(&parse_field_element(y)?);
    Ok(point)
}

/// Build a G2 point from coordinates already in imaginary-first order.
fn g2_from_coords(x_c1: &str, x_c0: &str, y_c1: &str, y_c0: &str) -> Result<G2Point> {
    let mut point = [0u8; 128];
    point[0..32].copy_from_slice(&parse_field_element(x_c1)?);
    point[32..64].copy_from_slice(&parse_field_element(x_c0)?);
    point[64..96].copy_from_slice(&parse_field_element(y_c1)?);
    point[96..128].copy_from_slice(&parse_field_element(y_c0)?);
    Ok(point)
}

impl G1Json {
    pub fn to_bytes(&self) -> Result<G1Point> {
        g1_from_coords(&self.x, &self.y)
    }
}

impl G2Json {
    pub fn to_bytes(&self) -> Result<G2Point> {
        g2_from_coords(&self.x[0], &self.x[1], &self.y[0], &self.y[1])
    }
}

impl VerifyingKeyJson {
    pub fn to_verifying_key(&self) -> Result<VerifyingKey> {
        let ic = self
            .ic
            .iter()
            .map(G1Json::to_bytes)
            .collect::<Result<Vec<_>>>()?;

        Ok(VerifyingKey {
            alpha_g1: self.alfa1.to_bytes()?,
            beta_g2: self.beta2.to_bytes()?,
            gamma_g2: self.gamma2.to_bytes()?,
            delta_g2: self.delta2.to_bytes()?,
            ic,
        })
    }
}

// =============================================================================
// TABLE LOADERS
// =============================================================================

fn from_json<'a, T: Deserialize<'a>>(json: &'a str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| {
        msg!("Verifying key JSON rejected: {}", e);
        error!(PoolError::InvalidVerifyingKey)
    })
}

/// Parse a single `{alfa1, beta2, gamma2, delta2, IC}` object.
pub fn parse_verifying_key(json: &str) -> Result<VerifyingKey> {
    from_json::<VerifyingKeyJson>(json)?.to_verifying_key()
}

/// Parse a transfer key table into `(shape, key)` pairs ready for
/// `set_verifying_keys`.
pub fn parse_transfer_keys(json: &str) -> Result<Vec<(TransferShape, VerifyingKey)>> {
    from_json::<Vec<TransferKeyEntry>>(json)?
        .iter()
        .map(|entry| -> Result<(TransferShape, VerifyingKey)> {
            let shape = TransferShape::new(entry.ins, entry.outs, entry.quorum);
            Ok((shape, entry.vk.to_verifying_key()?))
        })
        .collect()
}

/// Parse a balance key table into `(shape, key)` pairs.
pub fn parse_balance_keys(json: &str) -> Result<Vec<(BalanceShape, VerifyingKey)>> {
    from_json::<Vec<BalanceKeyEntry>>(json)?
        .iter()
        .map(|entry| -> Result<(BalanceShape, VerifyingKey)> {
            Ok((BalanceShape::new(entry.ins), entry.vk.to_verifying_key()?))
        })
        .collect()
}

// =============================================================================
// PROOFS
// =============================================================================

/// Convert a snarkjs `proof.json` into the 256-byte A || B || C encoding.
///
/// The projective z coordinates (`"1"`, `["1", "0"]`) are ignored.
pub fn snarkjs_proof_to_bytes(json: &str) -> Result<[u8; PROOF_DATA_LEN]> {
    let proof: SnarkjsProof = serde_json::from_str(json).map_err(|e| {
        msg!("Proof JSON rejected: {}", e);
        error!(PoolError::InvalidProofFormat)
    })?;

    require!(
        proof.pi_a.len() >= 2
            && proof.pi_c.len() >= 2
            && proof.pi_b.len() >= 2
            && proof.pi_b[0].len() == 2
            && proof.pi_b[1].len() == 2,
        PoolError::InvalidProofFormat
    );

    let a = g1_from_coords(&proof.pi_a[0], &proof.pi_a[1])?;
    // snarkjs lists [c0, c1]; swap into imaginary-first order
    let b = g2_from_coords(
        &proof.pi_b[0][1],
        &proof.pi_b[0][0],
        &proof.pi_b[1][1],
        &proof.pi_b[1][0],
    )?;
    let c = g1_from_coords(&proof.pi_c[0], &proof.pi_c[1])?;

    let mut out = [0u8; PROOF_DATA_LEN];
    out[0..64].copy_from_slice(&a);
    out[64..192].copy_from_slice(&b);
    out[192..256].copy_from_slice(&c);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::alt_bn128_syscalls::G1_GENERATOR;
    use crate::crypto::groth16_verifier::tests::g2_generator;

    const G2_X_C1: &str =
        "11559732032986387107991004021392285783925812861821192530917403151452391805634";
    const G2_X_C0: &str =
        "10857046999023057135944570762232829481370756359578518086990519993285655852781";
    const G2_Y_C1: &str =
        "4082367875863433681332203403145435568316851327593401208105741076214120093531";
    const G2_Y_C0: &str =
        "8495653923123431417604973247489272438418190587263600148770280649306958101930";

    fn vk_json(ic_len: usize) -> String {
        let g2 = format!(
            r#"{{"X":["{}","{}"],"Y":["{}","{}"]}}"#,
            G2_X_C1, G2_X_C0, G2_Y_C1, G2_Y_C0
        );
        let ic = vec![r#"{"X":"1","Y":"2"}"#; ic_len].join(",");
        format!(
            r#"{{"alfa1":{{"X":"1","Y":"2"}},"beta2":{g2},"gamma2":{g2},"delta2":{g2},"IC":[{ic}]}}"#,
            g2 = g2,
            ic = ic
        )
    }

    #[test]
    fn test_parse_field_element() {
        let one = parse_field_element("1").unwrap();
        assert_eq!(one[31], 1);
        assert_eq!(parse_field_element("0x0102").unwrap()[30..], [1, 2]);
        assert!(parse_field_element("not a number").is_err());
        // p itself is not a canonical coordinate
        assert!(parse_field_element(
            "21888242871839275222246405745257275088696311157297823662689037894645226208583"
        )
        .is_err());
    }

    #[test]
    fn test_parse_verifying_key_g2_order() {
        let vk = parse_verifying_key(&vk_json(4)).unwrap();
        assert_eq!(vk.alpha_g1, G1_GENERATOR);
        assert_eq!(vk.beta_g2, g2_generator());
        assert_eq!(vk.ic.len(), 4);
    }

    #[test]
    fn test_parse_transfer_table() {
        let json = format!(
            r#"[{{"ins":1,"outs":2,"quorum":2,"vk":{}}},{{"ins":2,"outs":0,"quorum":1,"vk":{}}}]"#,
            vk_json(6),
            vk_json(6)
        );
        let table = parse_transfer_keys(&json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].0, TransferShape::new(1, 2, 2));
        assert_eq!(table[1].0, TransferShape::new(2, 0, 1));
    }

    #[test]
    fn test_parse_balance_table() {
        let json = format!(r#"[{{"ins":3,"vk":{}}}]"#, vk_json(8));
        let table = parse_balance_keys(&json).unwrap();
        assert_eq!(table[0].0, BalanceShape::new(3));
        assert_eq!(table[0].1.ic.len(), 8);
    }

    #[test]
    fn test_malformed_table_rejected() {
        assert!(parse_transfer_keys(r#"[{"ins":1}]"#).is_err());
    }

    #[test]
    fn test_snarkjs_proof_swaps_g2() {
        let json = format!(
            r#"{{"pi_a":["1","2","1"],"pi_b":[["{}","{}"],["{}","{}"],["1","0"]],"pi_c":["1","2","1"],"protocol":"groth16"}}"#,
            G2_X_C0, G2_X_C1, G2_Y_C0, G2_Y_C1
        );
        let bytes = snarkjs_proof_to_bytes(&json).unwrap();
        assert_eq!(&bytes[0..64], &G1_GENERATOR[..]);
        assert_eq!(&bytes[64..192], &g2_generator()[..]);
    }
}

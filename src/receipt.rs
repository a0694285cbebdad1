//! Settlement receipts: the ledger's signed-message digest and the signing capability.
//!
//! A receipt carries the settlement record, its signed-message digest and the signature the
//! counter-party (and ultimately the contract) checks. Signing is delegated to a
//! [`DigestSigner`], which may be local or remote; [`LocalSigner`] keeps a secp256k1 key in
//! process.

use std::future::Future;

use anyhow::Context;
use k256::{
    ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};
use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::{
    codec::field::decode_hex,
    error::CodecError,
    message_builder::encode_settlement_record,
    model::{Address, EthSignature, SettlementRecord, SpendReceipt, ADDRESS_SIZE},
};

const SIGNED_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(bytes));
    out
}

/// `keccak256("\x19Ethereum Signed Message:\n" || len || message)` with `len` the decimal
/// byte length of `message`.
pub fn personal_message_digest(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Signed-message digest of a hex message (leading `0x` optional).
pub fn signed_message_digest(message_hex: &str) -> Result<[u8; 32], CodecError> {
    Ok(personal_message_digest(&decode_hex(message_hex)?))
}

/// Single-shot signing capability: one digest in, exactly one signature or one error out.
pub trait DigestSigner {
    type Key;

    fn sign(
        &self,
        digest: &[u8; 32],
        key: &Self::Key,
    ) -> impl Future<Output = anyhow::Result<EthSignature>> + Send;
}

/// In-process secp256k1 signer.
///
/// Follows the wallet convention of signing the personal-message digest of its input, so the
/// signed prehash of a receipt is `personal_message_digest(receipt.hash)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSigner;

impl LocalSigner {
    pub fn sign_message(message: &[u8], key: &SigningKey) -> anyhow::Result<EthSignature> {
        sign_prehash(personal_message_digest(message), key)
    }
}

impl DigestSigner for LocalSigner {
    type Key = SigningKey;

    fn sign(
        &self,
        digest: &[u8; 32],
        key: &SigningKey,
    ) -> impl Future<Output = anyhow::Result<EthSignature>> + Send {
        std::future::ready(Self::sign_message(digest, key))
    }
}

fn sign_prehash(message_hash: [u8; 32], key: &SigningKey) -> anyhow::Result<EthSignature> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&message_hash)
        .context("signing prehash")?;
    let rs = signature.to_bytes();
    let (r_bytes, s_bytes) = rs.split_at(32);
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(r_bytes);
    s.copy_from_slice(s_bytes);
    let v = 27 + recovery_id.to_byte();
    let mut bytes = rs.to_vec();
    bytes.push(v);
    Ok(EthSignature {
        message_hash,
        r,
        s,
        v,
        signature: bytes,
    })
}

/// Parses a hex secp256k1 secret key.
pub fn signing_key_from_hex(secret_hex: &str) -> anyhow::Result<SigningKey> {
    let bytes = decode_hex(secret_hex.trim())?;
    SigningKey::from_slice(&bytes).context("invalid secp256k1 secret key")
}

pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.as_affine().to_encoded_point(false);
    // skip the 0x04 uncompressed marker
    let hash = keccak256(point.as_bytes().get(1..).unwrap_or_default());
    let mut address = [0u8; ADDRESS_SIZE];
    #[allow(clippy::indexing_slicing, reason = "hash is 32 bytes")]
    address.copy_from_slice(&hash[32 - ADDRESS_SIZE..]);
    Address(address)
}

pub fn address_from_key(key: &SigningKey) -> Address {
    address_of(key.verifying_key())
}

/// Address whose key produced `signature` (65 bytes, `r || s || v`) over `message_hash`.
pub fn recover_address(message_hash: &[u8; 32], signature: &[u8]) -> Result<Address, CodecError> {
    let (rs, v) = match signature {
        [rs @ .., v] if rs.len() == 64 => (rs, *v),
        _ => {
            return Err(CodecError::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                signature.len()
            )))
        }
    };
    let signature =
        Signature::from_slice(rs).map_err(|e| CodecError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(if v >= 27 { v - 27 } else { v })
        .ok_or_else(|| CodecError::InvalidSignature(format!("invalid recovery byte {v}")))?;
    let key = VerifyingKey::recover_from_prehash(message_hash, &signature, recovery_id)
        .map_err(|e| CodecError::InvalidSignature(e.to_string()))?;
    Ok(address_of(&key))
}

/// Address that signed `receipt`.
///
/// The digest is recomputed from `receipt.data`; a receipt whose `hash` or signed prehash
/// disagrees with it is rejected, so the returned address always vouches for the data.
pub fn recover_signer(receipt: &SpendReceipt) -> Result<Address, CodecError> {
    let hash = signed_message_digest(&receipt.data)?;
    if decode_hex(&receipt.hash)? != hash {
        return Err(CodecError::ReceiptMismatch("hash"));
    }
    let prehash = personal_message_digest(&hash);
    if receipt.signature.message_hash != prehash {
        return Err(CodecError::ReceiptMismatch("signed prehash"));
    }
    recover_address(&prehash, &receipt.signature.signature)
}

/// Produces signed settlement receipts through a [`DigestSigner`].
#[derive(Debug, Clone, Default)]
pub struct ReceiptSigner<S> {
    signer: S,
}

impl<S: DigestSigner> ReceiptSigner<S> {
    pub fn new(signer: S) -> Self {
        ReceiptSigner { signer }
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Signs the signed-message digest of `message_hex`.
    pub async fn sign(&self, message_hex: &str, key: &S::Key) -> Result<EthSignature, CodecError> {
        let digest = signed_message_digest(message_hex)?;
        self.signer
            .sign(&digest, key)
            .await
            .map_err(CodecError::Signing)
    }

    pub async fn build_spend_receipt(
        &self,
        record: &SettlementRecord,
        key: &S::Key,
    ) -> Result<SpendReceipt, CodecError> {
        let data = format!("0x{}", encode_settlement_record(record)?.to_hex());
        let hash = signed_message_digest(&data)?;
        debug!(
            channel_id = %record.channel_id,
            round = %record.round,
            "Signing settlement record"
        );
        let signature = self
            .signer
            .sign(&hash, key)
            .await
            .map_err(CodecError::Signing)?;
        Ok(SpendReceipt {
            data,
            hash: format!("0x{}", hex::encode(hash)),
            signed: format!("0x{}", hex::encode(&signature.signature)),
            signature,
        })
    }
}

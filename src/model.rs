//! Value types for every message the channel contract consumes.

use std::{fmt::Display, str::FromStr};

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DeserializeFromStr, SerializeDisplay};

use crate::{codec::field::decode_hex, error::CodecError};

pub const ADDRESS_SIZE: usize = 20;

/// 20-byte ledger account or contract address.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(SerializeDisplay, DeserializeFromStr)]
pub struct Address(pub [u8; ADDRESS_SIZE]);

impl Address {
    pub const ZERO: Address = Address([0; ADDRESS_SIZE]);

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; ADDRESS_SIZE] = bytes
            .try_into()
            .map_err(|_| CodecError::InvalidAddress(bytes.len()))?;
        Ok(Address(array))
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::try_from(decode_hex(s.trim())?.as_slice())
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Message envelope prepended to every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub channel_count: u16,
    /// Body length plus the header's own [`Header::SIZE`].
    pub total_length: u16,
}

impl Header {
    pub const SIZE: usize = 6;
}

/// Where a channel creation sends its funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    /// Open towards an explicit receiver, tag 1.
    Address(Address),
    /// Fund an existing channel, tag 2.
    Channel(U256),
}

impl ChannelTarget {
    pub const ADDRESS_TAG: u8 = 1;
    pub const CHANNEL_TAG: u8 = 2;

    pub fn tag(&self) -> u8 {
        match self {
            ChannelTarget::Address(_) => Self::ADDRESS_TAG,
            ChannelTarget::Channel(_) => Self::CHANNEL_TAG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCreationPayload {
    pub amount: U256,
    pub target: ChannelTarget,
}

impl ChannelCreationPayload {
    /// tag + amount + address
    pub const ADDRESS_FORM_SIZE: usize = 1 + 32 + ADDRESS_SIZE;
    /// tag + amount + channel id
    pub const CHANNEL_FORM_SIZE: usize = 1 + 32 + 32;

    pub fn encoded_len(&self) -> usize {
        match self.target {
            ChannelTarget::Address(_) => Self::ADDRESS_FORM_SIZE,
            ChannelTarget::Channel(_) => Self::CHANNEL_FORM_SIZE,
        }
    }
}

/// How the contract finds the target address of a chained call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// `to_address` is used as is.
    Literal,
    /// The address is read at `offset` in the output of command `result_id`.
    FromResult,
}

impl CallKind {
    pub fn tag(&self) -> u8 {
        match self {
            CallKind::Literal => 1,
            CallKind::FromResult => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, CodecError> {
        match tag {
            1 => Ok(CallKind::Literal),
            2 => Ok(CallKind::FromResult),
            tag => Err(CodecError::UnknownTag {
                what: "call type",
                tag,
            }),
        }
    }
}

/// Fixed part of a chained call; the call data follows it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainedCallCommand {
    pub kind: CallKind,
    pub data_length: u16,
    #[serde(default)]
    pub result_id: u16,
    #[serde(default)]
    pub offset: u16,
    #[serde(default)]
    pub to_address: Address,
}

impl ChainedCallCommand {
    pub const HEADER_SIZE: usize = 28;
    pub(crate) const ADDRESS_OFFSET: usize = 8;

    /// Call to a known address.
    pub fn literal(to_address: Address, call_data: &[u8]) -> Result<Self, CodecError> {
        Ok(ChainedCallCommand {
            kind: CallKind::Literal,
            data_length: data_length(call_data)?,
            result_id: 0,
            offset: 0,
            to_address,
        })
    }

    /// Call to the address found at byte `offset` of command `result_id`'s output.
    pub fn from_result(result_id: u16, offset: u16, call_data: &[u8]) -> Result<Self, CodecError> {
        Ok(ChainedCallCommand {
            kind: CallKind::FromResult,
            data_length: data_length(call_data)?,
            result_id,
            offset,
            to_address: Address::ZERO,
        })
    }

    pub fn encoded_len(&self) -> usize {
        Self::HEADER_SIZE + self.data_length as usize
    }
}

fn data_length(call_data: &[u8]) -> Result<u16, CodecError> {
    u16::try_from(call_data.len()).map_err(|_| CodecError::HeaderOverflow {
        what: "call data length",
        value: call_data.len(),
    })
}

/// Off-chain balance split both parties sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettlementRecord {
    pub channel_id: U256,
    pub round: U256,
    pub balance_a: U256,
    pub balance_b: U256,
}

impl SettlementRecord {
    pub const SIZE: usize = 4 * 32;
}

/// Recoverable secp256k1 signature, laid out the way ledger wallets return it.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthSignature {
    /// Prehash that was actually signed.
    #[serde_as(as = "serde_with::hex::Hex")]
    pub message_hash: [u8; 32],
    #[serde_as(as = "serde_with::hex::Hex")]
    pub r: [u8; 32],
    #[serde_as(as = "serde_with::hex::Hex")]
    pub s: [u8; 32],
    /// 27 + recovery id
    pub v: u8,
    /// `r || s || v`, 65 bytes.
    #[serde_as(as = "serde_with::hex::Hex")]
    pub signature: Vec<u8>,
}

/// Signed settlement record handed to the counter-party and later to the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendReceipt {
    /// `0x`-prefixed settlement record.
    pub data: String,
    /// `0x`-prefixed signed-message digest of `data`.
    pub hash: String,
    /// `0x`-prefixed 65-byte signature.
    pub signed: String,
    pub signature: EthSignature,
}

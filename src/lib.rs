//! # StateHub
//!
//! *Binary codec for off-chain payment channels settled by an on-chain contract.*
//!
//! Two parties exchange and co-sign balance updates off-chain and only touch the ledger
//! when opening, funding or settling a channel. This crate produces the fixed-layout
//! payloads the contract parses for those submissions, reads them back, and signs
//! settlement receipts.
//!
//! ## Wire formats
//!
//! All multi-byte integers are big-endian, all output is lowercase hex.
//!
//! * Header: `version:u16 | channelCount:u16 | totalLength:u16 | body`
//! * Channel creation: `tag:u8 | amount:32B | address:20B` (tag 1) or `| channelId:32B` (tag 2)
//! * Chained call: `type:u8 | dataLength:u16 | resultId:u16 | offset:u16 | 0:u8 | toAddress:20B | callData`
//! * Settlement record: `channelId:32B | round:32B | balanceA:32B | balanceB:32B`

pub mod codec;
pub mod command_chain;
pub mod decode;
pub mod error;
pub mod message_builder;
pub mod model;
pub mod receipt;
pub mod utils;

pub use codec::{
    byte_buffer::ByteBuffer,
    field::{field_from_hex, parse_field, strip_prefix, to_field_hex},
};
pub use command_chain::CommandChain;
pub use error::{CodecError, ErrorKind};
pub use message_builder::MessageBuilder;
pub use model::*;
pub use primitive_types::U256;
pub use receipt::{recover_signer, DigestSigner, LocalSigner, ReceiptSigner};

//! Parsers for the wire formats, mirroring what the contract reads.

use primitive_types::U256;

use crate::{
    codec::field::{decode_hex, field_from_bytes, FIELD_SIZE},
    error::CodecError,
    model::{
        Address, CallKind, ChainedCallCommand, ChannelCreationPayload, ChannelTarget, Header,
        SettlementRecord,
    },
};

/// Cursor over an input slice; every read checks the remaining length.
struct Reader<'a> {
    bytes: &'a [u8],
    what: &'static str,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], what: &'static str) -> Self {
        Reader { bytes, what }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.bytes.len() < len {
            return Err(CodecError::Truncated {
                what: self.what,
                needed: len,
                got: self.bytes.len(),
            });
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?.first().copied().unwrap_or_default())
    }

    fn u16_be(&mut self) -> Result<u16, CodecError> {
        let bytes = self.take(2)?;
        let pair = <[u8; 2]>::try_from(bytes).map_err(|_| CodecError::Truncated {
            what: self.what,
            needed: 2,
            got: bytes.len(),
        })?;
        Ok(u16::from_be_bytes(pair))
    }

    fn field(&mut self) -> Result<U256, CodecError> {
        field_from_bytes(self.take(FIELD_SIZE)?)
    }

    fn address(&mut self) -> Result<Address, CodecError> {
        Address::try_from(self.take(crate::model::ADDRESS_SIZE)?)
    }

    fn remaining(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Splits a header-wrapped message into its header and body.
pub fn decode_header(message_hex: &str) -> Result<(Header, Vec<u8>), CodecError> {
    let bytes = decode_hex(message_hex)?;
    let mut reader = Reader::new(&bytes, "header");
    let header = Header {
        version: reader.u16_be()?,
        channel_count: reader.u16_be()?,
        total_length: reader.u16_be()?,
    };
    if header.total_length as usize != bytes.len() {
        return Err(CodecError::LengthMismatch {
            declared: header.total_length as usize,
            actual: bytes.len(),
        });
    }
    Ok((header, reader.remaining().to_vec()))
}

pub fn decode_channel_creation(payload_hex: &str) -> Result<ChannelCreationPayload, CodecError> {
    let bytes = decode_hex(payload_hex)?;
    let mut reader = Reader::new(&bytes, "channel creation");
    let tag = reader.u8()?;
    let expected = match tag {
        ChannelTarget::ADDRESS_TAG => ChannelCreationPayload::ADDRESS_FORM_SIZE,
        ChannelTarget::CHANNEL_TAG => ChannelCreationPayload::CHANNEL_FORM_SIZE,
        tag => {
            return Err(CodecError::UnknownTag {
                what: "channel creation",
                tag,
            })
        }
    };
    if bytes.len() != expected {
        return Err(CodecError::LengthMismatch {
            declared: expected,
            actual: bytes.len(),
        });
    }
    let amount = reader.field()?;
    let target = if tag == ChannelTarget::ADDRESS_TAG {
        ChannelTarget::Address(reader.address()?)
    } else {
        ChannelTarget::Channel(reader.field()?)
    };
    Ok(ChannelCreationPayload { amount, target })
}

pub fn decode_settlement_record(record_hex: &str) -> Result<SettlementRecord, CodecError> {
    let bytes = decode_hex(record_hex)?;
    if bytes.len() != SettlementRecord::SIZE {
        return Err(CodecError::LengthMismatch {
            declared: SettlementRecord::SIZE,
            actual: bytes.len(),
        });
    }
    let mut reader = Reader::new(&bytes, "settlement record");
    Ok(SettlementRecord {
        channel_id: reader.field()?,
        round: reader.field()?,
        balance_a: reader.field()?,
        balance_b: reader.field()?,
    })
}

/// Reads back-to-back chained calls, enforcing the same ordering rule as
/// [`crate::CommandChain::append`].
pub fn decode_command_chain(
    chain_hex: &str,
) -> Result<Vec<(ChainedCallCommand, Vec<u8>)>, CodecError> {
    let bytes = decode_hex(chain_hex)?;
    let mut reader = Reader::new(&bytes, "chained call");
    let mut commands = vec![];
    while !reader.remaining().is_empty() {
        let kind = CallKind::from_tag(reader.u8()?)?;
        let data_length = reader.u16_be()?;
        let result_id = reader.u16_be()?;
        let offset = reader.u16_be()?;
        let reserved = reader.u8()?;
        if reserved != 0 {
            return Err(CodecError::ReservedByte(reserved));
        }
        let to_address = reader.address()?;
        let call_data = reader.take(data_length as usize)?.to_vec();
        if kind == CallKind::FromResult && result_id as usize >= commands.len() {
            return Err(CodecError::ForwardReference {
                result_id,
                chain_len: commands.len(),
            });
        }
        commands.push((
            ChainedCallCommand {
                kind,
                data_length,
                result_id,
                offset,
                to_address,
            },
            call_data,
        ));
    }
    Ok(commands)
}

//! Composes the hex messages submitted to the channel contract.

use primitive_types::U256;
use tracing::debug;

use crate::{
    codec::{
        byte_buffer::ByteBuffer,
        field::{decode_hex, to_field_bytes, FIELD_SIZE},
    },
    command_chain::CommandChain,
    error::CodecError,
    model::{
        Address, ChainedCallCommand, ChannelCreationPayload, ChannelTarget, Header,
        SettlementRecord,
    },
};

pub const DEFAULT_VERSION: u16 = 1;

/// A deposit registered on a builder, counted in the next header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEntry {
    pub id: U256,
    pub amount: U256,
}

/// Builds messages for one submission.
///
/// The builder owns the list of registered channel deposits; its length is written as the
/// header's channel count. Use [`MessageBuilder::reset`] or a new builder to start over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBuilder {
    version: u16,
    channels: Vec<ChannelEntry>,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}

impl MessageBuilder {
    pub fn new(version: u16) -> Self {
        MessageBuilder {
            version,
            channels: vec![],
        }
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    /// Bookkeeping only, nothing is encoded.
    pub fn register_channel_deposit(&mut self, channel_id: U256, amount: U256) {
        self.channels.push(ChannelEntry {
            id: channel_id,
            amount,
        });
    }

    pub fn channel_entries(&self) -> &[ChannelEntry] {
        &self.channels
    }

    pub fn reset(&mut self) {
        self.channels.clear();
    }

    /// `0x`-prefixed channel creation payload. A destination address wins over a channel id.
    pub fn build_channel_creation_message(
        &self,
        channel_id: Option<U256>,
        amount: U256,
        to_address: Option<Address>,
    ) -> Result<String, CodecError> {
        let target = match (to_address, channel_id) {
            (Some(address), _) => ChannelTarget::Address(address),
            (None, Some(id)) => ChannelTarget::Channel(id),
            (None, None) => return Err(CodecError::MissingChannelTarget),
        };
        let bytes = encode_channel_creation(&ChannelCreationPayload { amount, target })?;
        Ok(format!("0x{}", bytes.to_hex()))
    }

    /// Current header for a body of `body_len` bytes.
    pub fn header(&self, body_len: usize) -> Result<Header, CodecError> {
        let channel_count =
            u16::try_from(self.channels.len()).map_err(|_| CodecError::HeaderOverflow {
                what: "channel count",
                value: self.channels.len(),
            })?;
        let total = body_len + Header::SIZE;
        let total_length = u16::try_from(total).map_err(|_| CodecError::HeaderOverflow {
            what: "total length",
            value: total,
        })?;
        Ok(Header {
            version: self.version,
            channel_count,
            total_length,
        })
    }

    /// Header followed by the body, unprefixed. `body_hex` may carry a leading `0x`.
    pub fn build_header_wrapped(&self, body_hex: &str) -> Result<String, CodecError> {
        let body = decode_hex(body_hex)?;
        self.wrap_bytes(&body)
    }

    fn wrap_bytes(&self, body: &[u8]) -> Result<String, CodecError> {
        let header = self.header(body.len())?;
        debug!(
            version = header.version,
            channels = header.channel_count,
            total_length = header.total_length,
            "Wrapping message body"
        );
        let mut bytes = encode_header(&header)?.into_bytes();
        bytes.extend_from_slice(body);
        Ok(hex::encode(bytes))
    }

    /// Unprefixed encoding of one chained call.
    pub fn build_chained_call_command(
        &self,
        command: &ChainedCallCommand,
        call_data: &[u8],
    ) -> Result<String, CodecError> {
        Ok(encode_chained_call(command, call_data)?.to_hex())
    }

    /// `0x`-prefixed settlement record.
    pub fn build_settlement_record(&self, record: &SettlementRecord) -> Result<String, CodecError> {
        Ok(format!("0x{}", encode_settlement_record(record)?.to_hex()))
    }

    /// A whole submission: this builder's header around the serialized chain.
    pub fn build_payload(&self, chain: &CommandChain) -> Result<String, CodecError> {
        self.wrap_bytes(chain.as_bytes())
    }
}

pub fn encode_header(header: &Header) -> Result<ByteBuffer, CodecError> {
    let mut bytes = ByteBuffer::new(Header::SIZE);
    bytes.write_u16_be(header.version)?;
    bytes.write_u16_be(header.channel_count)?;
    bytes.write_u16_be(header.total_length)?;
    Ok(bytes)
}

pub fn encode_channel_creation(payload: &ChannelCreationPayload) -> Result<ByteBuffer, CodecError> {
    let mut bytes = ByteBuffer::new(payload.encoded_len());
    bytes.write_u8(payload.target.tag())?;
    bytes.copy_bytes(&to_field_bytes(&payload.amount), 1)?;
    match &payload.target {
        ChannelTarget::Address(address) => bytes.copy_bytes(address.as_bytes(), 1 + FIELD_SIZE)?,
        ChannelTarget::Channel(id) => bytes.copy_bytes(&to_field_bytes(id), 1 + FIELD_SIZE)?,
    }
    debug!(tag = payload.target.tag(), len = bytes.capacity(), "Encoded channel creation");
    Ok(bytes)
}

/// Encodes the 28-byte command header and its call data.
pub fn encode_chained_call(
    command: &ChainedCallCommand,
    call_data: &[u8],
) -> Result<ByteBuffer, CodecError> {
    if command.data_length as usize != call_data.len() {
        return Err(CodecError::DataLengthMismatch {
            declared: command.data_length as usize,
            actual: call_data.len(),
        });
    }

    let mut bytes = ByteBuffer::new(command.encoded_len());
    bytes.write_u8(command.kind.tag())?;
    bytes.write_u16_be(command.data_length)?;
    bytes.write_u16_be(command.result_id)?;
    bytes.write_u16_be(command.offset)?;
    // reserved
    bytes.write_u8(0)?;
    bytes.copy_bytes(
        command.to_address.as_bytes(),
        ChainedCallCommand::ADDRESS_OFFSET,
    )?;
    bytes.copy_bytes(call_data, ChainedCallCommand::HEADER_SIZE)?;
    Ok(bytes)
}

pub fn encode_settlement_record(record: &SettlementRecord) -> Result<ByteBuffer, CodecError> {
    let mut bytes = ByteBuffer::new(SettlementRecord::SIZE);
    let fields = [
        &record.channel_id,
        &record.round,
        &record.balance_a,
        &record.balance_b,
    ];
    for (i, field) in fields.into_iter().enumerate() {
        bytes.copy_bytes(&to_field_bytes(field), i * FIELD_SIZE)?;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CallKind;

    fn field(n: u64) -> String {
        format!("{:064x}", n)
    }

    #[test]
    fn test_channel_creation_channel_form() {
        let builder = MessageBuilder::default();
        let msg = builder
            .build_channel_creation_message(Some(U256::from(5)), U256::from(2500), None)
            .unwrap();
        let body = msg.strip_prefix("0x").unwrap();
        assert_eq!(body.len(), 130);
        assert_eq!(body, format!("02{}{}", field(2500), field(5)));
    }

    #[test]
    fn test_channel_creation_address_form() {
        let builder = MessageBuilder::default();
        let to = Address([0xab; 20]);
        let msg = builder
            .build_channel_creation_message(Some(U256::from(5)), U256::from(7), Some(to))
            .unwrap();
        let body = msg.strip_prefix("0x").unwrap();
        assert_eq!(body.len(), 106);
        assert_eq!(body, format!("01{}{}", field(7), "ab".repeat(20)));
    }

    #[test]
    fn test_channel_creation_needs_target() {
        let builder = MessageBuilder::default();
        assert!(matches!(
            builder.build_channel_creation_message(None, U256::one(), None),
            Err(CodecError::MissingChannelTarget)
        ));
    }

    #[test]
    fn test_header_counts_registered_channels() {
        let mut builder = MessageBuilder::new(1);
        assert_eq!(builder.build_header_wrapped("").unwrap(), "000100000006");

        builder.register_channel_deposit(U256::from(1), U256::from(100));
        builder.register_channel_deposit(U256::from(2), U256::from(200));
        assert_eq!(builder.channel_entries().len(), 2);
        // 3 body bytes + 6
        assert_eq!(
            builder.build_header_wrapped("0xaabbcc").unwrap(),
            "000100020009aabbcc"
        );

        builder.reset();
        assert_eq!(builder.build_header_wrapped("ff").unwrap(), "000100000007ff");
    }

    #[test]
    fn test_header_length_is_bytes_not_chars() {
        let builder = MessageBuilder::new(3);
        let body = "11".repeat(100);
        let wrapped = builder.build_header_wrapped(&body).unwrap();
        // 100 + 6 = 0x6a
        assert!(wrapped.starts_with("00030000006a"));
    }

    #[test]
    fn test_header_rejects_odd_length_body() {
        let builder = MessageBuilder::default();
        let err = builder.build_header_wrapped("abc").unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidHex(hex::FromHexError::OddLength)
        ));
        assert_eq!(err.kind(), crate::error::ErrorKind::Decode);
    }

    #[test]
    fn test_header_overflow() {
        let builder = MessageBuilder::default();
        let body = "00".repeat(u16::MAX as usize);
        assert!(matches!(
            builder.build_header_wrapped(&body),
            Err(CodecError::HeaderOverflow {
                what: "total length",
                ..
            })
        ));
    }

    #[test]
    fn test_chained_call_layout() {
        let builder = MessageBuilder::default();
        let to = Address([0x22; 20]);
        let data = [0xa9, 0x05, 0x9c, 0xbb, 0x01];
        let cmd = ChainedCallCommand {
            kind: CallKind::Literal,
            data_length: 5,
            result_id: 0x0102,
            offset: 0x0304,
            to_address: to,
        };
        let hex = builder.build_chained_call_command(&cmd, &data).unwrap();
        assert_eq!(hex.len(), 2 * (28 + 5));
        assert_eq!(
            hex,
            format!("01000501020304{}{}a9059cbb01", "00", "22".repeat(20))
        );
    }

    #[test]
    fn test_chained_call_length_mismatch() {
        let builder = MessageBuilder::default();
        let mut cmd = ChainedCallCommand::literal(Address::ZERO, &[1, 2, 3]).unwrap();
        cmd.data_length = 2;
        assert!(matches!(
            builder.build_chained_call_command(&cmd, &[1, 2, 3]),
            Err(CodecError::DataLengthMismatch {
                declared: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_settlement_record() {
        let builder = MessageBuilder::default();
        let record = SettlementRecord {
            channel_id: U256::from(1),
            round: U256::from(5),
            balance_a: U256::from(500),
            balance_b: U256::from(200),
        };
        let hex = builder.build_settlement_record(&record).unwrap();
        let body = hex.strip_prefix("0x").unwrap();
        assert_eq!(body.len(), 256);
        assert_eq!(
            body,
            [field(1), field(5), field(500), field(200)].concat()
        );
    }
}

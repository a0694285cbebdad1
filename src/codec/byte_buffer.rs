use crate::error::CodecError;

/// Fixed-capacity byte buffer with an append cursor.
///
/// The capacity is set at construction and never grows: every message format has a fixed
/// layout, and the contract parser reads fields at fixed offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
    cursor: usize,
}

impl ByteBuffer {
    /// Allocates `capacity` zeroed bytes.
    pub fn new(capacity: usize) -> Self {
        ByteBuffer {
            bytes: vec![0; capacity],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), CodecError> {
        self.write_at(self.cursor, &[value])?;
        self.cursor += 1;
        Ok(())
    }

    pub fn write_u16_be(&mut self, value: u16) -> Result<(), CodecError> {
        self.write_at(self.cursor, &value.to_be_bytes())?;
        self.cursor += 2;
        Ok(())
    }

    /// Writes `source` at `offset`, leaving the append cursor where it is.
    pub fn copy_bytes(&mut self, source: &[u8], offset: usize) -> Result<(), CodecError> {
        self.write_at(offset, source)
    }

    fn write_at(&mut self, offset: usize, source: &[u8]) -> Result<(), CodecError> {
        let end = offset
            .checked_add(source.len())
            .filter(|end| *end <= self.bytes.len())
            .ok_or(CodecError::Bounds {
                offset,
                len: source.len(),
                capacity: self.bytes.len(),
            })?;
        #[allow(clippy::indexing_slicing, reason = "end checked against capacity")]
        self.bytes[offset..end].copy_from_slice(source);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Lowercase, unprefixed hex of the whole buffer, untouched bytes included.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

//! Ordered multi-call buffer.
//!
//! Commands are executed by the contract in append order. A [`CallKind::FromResult`] command
//! takes its target address from the output of an earlier command, addressed by its index in
//! this chain, so references are checked here, when the command is appended.

use tracing::trace;

use crate::{
    error::CodecError,
    message_builder::encode_chained_call,
    model::{CallKind, ChainedCallCommand},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandChain {
    commands: Vec<ChainedCallCommand>,
    bytes: Vec<u8>,
}

impl CommandChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes and appends `command`, returning its result id.
    ///
    /// Nothing is appended when the command is rejected.
    pub fn append(
        &mut self,
        command: ChainedCallCommand,
        call_data: &[u8],
    ) -> Result<u16, CodecError> {
        if command.kind == CallKind::FromResult && command.result_id as usize >= self.len() {
            return Err(CodecError::ForwardReference {
                result_id: command.result_id,
                chain_len: self.len(),
            });
        }
        let id = u16::try_from(self.len()).map_err(|_| CodecError::HeaderOverflow {
            what: "result id",
            value: self.len(),
        })?;

        let encoded = encode_chained_call(&command, call_data)?;
        trace!(id, kind = ?command.kind, len = encoded.capacity(), "Appending chained call");
        self.bytes.extend_from_slice(encoded.as_bytes());
        self.commands.push(command);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get(&self, result_id: u16) -> Option<&ChainedCallCommand> {
        self.commands.get(result_id as usize)
    }

    pub fn commands(&self) -> &[ChainedCallCommand] {
        &self.commands
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// All commands, in append order, as one unprefixed hex string.
    pub fn serialize(&self) -> String {
        hex::encode(&self.bytes)
    }
}

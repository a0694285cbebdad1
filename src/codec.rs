//! Low-level byte and integer encoding shared by every message format.
pub mod byte_buffer;
pub mod field;

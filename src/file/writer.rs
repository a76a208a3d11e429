//! Growable little-endian byte writer for resource generation.
//!
//! This module provides the [`crate::file::writer::Writer`] type, the output counterpart of
//! [`crate::file::parser::Parser`]. The `.rsrc` serializer and the BAML record codec both
//! produce their byte layouts through it. Offset-dependent structures (directory entries
//! pointing at later tables, deferred-content sizes) are handled with [`Writer::write_le_at`]
//! back-patching after the dependent data has been laid out.

use crate::{
    file::io::{write_le_at, ByteIO},
    Result,
};

/// A growable byte buffer with little-endian primitive writes.
///
/// All writes append at the current end of the buffer unless an explicit offset is given.
/// The buffer is handed out with [`Writer::into_inner`] once serialization completes.
///
/// # Examples
///
/// ```rust
/// use dotmerge::file::Writer;
///
/// let mut writer = Writer::new();
/// writer.write_le(0x0201u16);
/// writer.align(4);
/// assert_eq!(writer.into_inner(), vec![0x01, 0x02, 0x00, 0x00]);
/// ```
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create a new empty writer.
    #[must_use]
    pub fn new() -> Self {
        Writer::default()
    }

    /// Create a writer with pre-allocated capacity.
    ///
    /// # Arguments
    /// * `capacity` - Amount of bytes to reserve up front
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Writer {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current length of the buffer, which is also the position of the next append.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a primitive value in little-endian format.
    pub fn write_le<T: ByteIO>(&mut self, value: T) {
        self.buf.extend_from_slice(value.to_le_bytes().as_ref());
    }

    /// Overwrite a primitive value in little-endian format at a previously written offset.
    ///
    /// # Arguments
    /// * `offset` - Position of the value to overwrite
    /// * `value` - The value to encode
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the target range was never written.
    pub fn write_le_at<T: ByteIO>(&mut self, offset: usize, value: T) -> Result<()> {
        let mut offset = offset;
        write_le_at(&mut self.buf, &mut offset, value)
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Zero-pad the buffer up to the next multiple of `alignment`.
    ///
    /// # Arguments
    /// * `alignment` - The boundary to align to (must be a power of 2)
    pub fn align(&mut self, alignment: usize) {
        let padding = (alignment - (self.buf.len() % alignment)) % alignment;
        self.buf.resize(self.buf.len() + padding, 0);
    }

    /// Append a 7-bit encoded integer (the `BinaryWriter.Write7BitEncodedInt` format).
    pub fn write_7bit_encoded_int(&mut self, value: u32) {
        let mut value = value;
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                break;
            }
            self.buf.push(byte | 0x80);
        }
    }

    /// Append a length-prefixed UTF-8 string (the `BinaryWriter.Write(string)` format).
    ///
    /// # Arguments
    /// * `value` - The string whose UTF-8 bytes are written after a 7-bit encoded byte count
    pub fn write_prefixed_string_utf8(&mut self, value: &str) {
        let bytes = value.as_bytes();
        self.write_7bit_encoded_int(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    /// Consume the writer and return the accumulated bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Number of bytes a 7-bit encoded integer occupies.
#[must_use]
pub fn encoded_int_len(value: u32) -> usize {
    let mut value = value;
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    #[test]
    fn append_and_backpatch() {
        let mut writer = Writer::new();
        writer.write_le(0u32);
        writer.write_le(0xAABBu16);
        writer.write_le_at(0, 0x1122_3344u32).unwrap();
        assert_eq!(
            writer.into_inner(),
            vec![0x44, 0x33, 0x22, 0x11, 0xBB, 0xAA]
        );
    }

    #[test]
    fn backpatch_out_of_bounds() {
        let mut writer = Writer::new();
        writer.write_le(0u16);
        assert!(writer.write_le_at(1, 0u32).is_err());
    }

    #[test]
    fn seven_bit_round_trip() {
        for value in [0u32, 1, 127, 128, 0x3FFF, 0x4000, u32::MAX] {
            let mut writer = Writer::new();
            writer.write_7bit_encoded_int(value);
            let bytes = writer.into_inner();
            assert_eq!(bytes.len(), encoded_int_len(value));

            let mut parser = Parser::new(&bytes);
            assert_eq!(parser.read_7bit_encoded_int().unwrap(), value);
        }
    }

    #[test]
    fn prefixed_string_round_trip() {
        let mut writer = Writer::new();
        writer.write_prefixed_string_utf8("PresentationFramework");
        let bytes = writer.into_inner();

        let mut parser = Parser::new(&bytes);
        assert_eq!(
            parser.read_prefixed_string_utf8().unwrap(),
            "PresentationFramework"
        );
    }
}

//! Low-level byte order utilities for resource parsing and generation.
//!
//! This module provides endian-aware binary reading and writing for the `.rsrc` and BAML
//! codecs. All operations are bounds-checked to prevent buffer overruns when handling
//! malformed or truncated input.
//!
//! # Key Components
//!
//! - [`crate::file::io::ByteIO`] - Trait defining little-endian conversion for primitive types
//! - [`crate::file::io::read_le_at`] - Read a value at a specific offset with auto-advance
//! - [`crate::file::io::write_le_at`] - Write a value at a specific offset into an existing buffer

use crate::Result;

/// Trait for primitive types that can be read from and written to byte buffers.
///
/// Implemented for the unsigned and signed integer widths the resource formats use.
/// All resource structures in scope (PE `.rsrc` tables, BAML records) are little-endian.
pub trait ByteIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]> + AsRef<[u8]>;

    /// Read `Self` from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write `Self` to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_byte_io {
    ($ty:ty, $len:expr) => {
        impl ByteIO for $ty {
            type Bytes = [u8; $len];

            fn from_le_bytes(bytes: Self::Bytes) -> Self {
                <$ty>::from_le_bytes(bytes)
            }

            fn to_le_bytes(self) -> Self::Bytes {
                <$ty>::to_le_bytes(self)
            }
        }
    };
}

impl_byte_io!(u8, 1);
impl_byte_io!(i8, 1);
impl_byte_io!(u16, 2);
impl_byte_io!(i16, 2);
impl_byte_io!(u32, 4);
impl_byte_io!(i32, 4);
impl_byte_io!(u64, 8);
impl_byte_io!(i64, 8);

/// Read a value of type `T` at the provided offset, advancing the offset.
///
/// # Arguments
/// * `data` - The buffer to read from
/// * `offset` - Position to read at; advanced by `size_of::<T>()` on success
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the read would exceed the buffer.
pub fn read_le_at<T: ByteIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..*offset + type_len].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset += type_len;

    Ok(T::from_le_bytes(read))
}

/// Write a value of type `T` at the provided offset, advancing the offset.
///
/// # Arguments
/// * `data` - The buffer to write into
/// * `offset` - Position to write at; advanced by `size_of::<T>()` on success
/// * `value` - The value to encode in little-endian
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the write would exceed the buffer.
pub fn write_le_at<T: ByteIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(out_of_bounds_error!());
    }

    data[*offset..*offset + type_len].copy_from_slice(value.to_le_bytes().as_ref());
    *offset += type_len;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_values() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
        let mut offset = 0;

        let first: u16 = read_le_at(&data, &mut offset).unwrap();
        let second: u16 = read_le_at(&data, &mut offset).unwrap();
        let third: u32 = read_le_at(&data, &mut offset).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(third, 3);
        assert_eq!(offset, 8);
    }

    #[test]
    fn read_out_of_bounds() {
        let data = [0x01, 0x02];
        let mut offset = 1;
        assert!(read_le_at::<u32>(&data, &mut offset).is_err());
        // Offset untouched on failure
        assert_eq!(offset, 1);
    }

    #[test]
    fn write_values() {
        let mut data = [0u8; 6];
        let mut offset = 0;
        write_le_at(&mut data, &mut offset, 0x0201u16).unwrap();
        write_le_at(&mut data, &mut offset, 0x0605_0403u32).unwrap();
        assert_eq!(data, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }
}

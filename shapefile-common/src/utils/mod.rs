// private sub-module defined in other files
mod byte_order_reader;
mod byte_order_writer;

// exports identifiers from private sub-modules in the current module namespace
pub use self::byte_order_reader::ByteOrderReader;
pub use self::byte_order_reader::Endianness;
pub use self::byte_order_writer::ByteOrderWriter;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::{Error, ErrorKind, Result};

fn check_width(bytes: &[u8], width: usize) -> Result<()> {
    if bytes.len() < width {
        return Err(Error::new(
            ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", width, bytes.len()),
        ));
    }
    if bytes.len() > width {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("expected {} bytes, found {}", width, bytes.len()),
        ));
    }
    Ok(())
}

/// Interprets exactly four bytes as a signed integer in the given byte order.
pub fn read_int(bytes: &[u8], byte_order: Endianness) -> Result<i32> {
    check_width(bytes, 4)?;
    Ok(match byte_order {
        Endianness::BigEndian => BigEndian::read_i32(bytes),
        Endianness::LittleEndian => LittleEndian::read_i32(bytes),
    })
}

/// Interprets exactly four bytes as an unsigned integer in the given byte order.
pub fn read_u32(bytes: &[u8], byte_order: Endianness) -> Result<u32> {
    check_width(bytes, 4)?;
    Ok(match byte_order {
        Endianness::BigEndian => BigEndian::read_u32(bytes),
        Endianness::LittleEndian => LittleEndian::read_u32(bytes),
    })
}

/// Interprets exactly eight little-endian bytes as an IEEE-754 double.
pub fn read_double(bytes: &[u8]) -> Result<f64> {
    check_width(bytes, 8)?;
    Ok(LittleEndian::read_f64(bytes))
}

/// Encodes a double as eight little-endian bytes. `host` is the byte order of
/// the running machine; the native representation is reversed only when the
/// host is big-endian.
pub fn pack_double(value: f64, host: Endianness) -> [u8; 8] {
    let mut bin = value.to_ne_bytes();
    if host == Endianness::BigEndian {
        bin.reverse();
    }
    bin
}

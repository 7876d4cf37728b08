use byteorder::{LittleEndian, WriteBytesExt};
use std::io;
use std::io::Write;

/// Writes a `uint32`-length-prefixed byte array, the mirror of
/// [`crate::decode::bytes_lp`].
pub fn bytes_lp<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(bytes.len() as u32)?;
    writer.write_all(bytes)
}

/// Writes a `uint32`-length-prefixed UTF-8 string.
pub fn string_lp<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    bytes_lp(writer, s.as_bytes())
}

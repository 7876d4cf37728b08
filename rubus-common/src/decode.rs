use byteorder::{LittleEndian, ReadBytesExt};
use std::io;
use std::io::Read;
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    IOError(#[from] io::Error),
    #[error(transparent)]
    FromUtf8Error(#[from] FromUtf8Error),
    #[error("invalid token, expected {expected:?}, got {got:?}")]
    InvalidTokenError { expected: Vec<u8>, got: Vec<u8> },
}

type DecodeResult<T> = std::result::Result<T, DecodeError>;

pub fn take<R: Read>(reader: &mut R, len: usize) -> DecodeResult<Vec<u8>> {
    let mut r = Vec::with_capacity(len);
    std::io::copy(&mut reader.take(len as u64), &mut r)?;
    Ok(r)
}

#[inline]
pub fn take_string<R: Read>(reader: &mut R, len: usize) -> DecodeResult<String> {
    Ok(String::from_utf8(take(reader, len)?)?)
}

pub fn token<R: Read>(reader: &mut R, token: &[u8]) -> DecodeResult<()> {
    let got = take(reader, token.len())?;
    if got[..] == token[..] {
        Ok(())
    } else {
        log::debug!("token mismatch: expected {token:?}, got {got:?}");
        Err(DecodeError::InvalidTokenError {
            expected: token.to_owned(),
            got,
        })
    }
}

#[inline]
pub fn u8<R: Read>(reader: &mut R) -> DecodeResult<u8> {
    Ok(reader.read_u8()?)
}

#[inline]
pub fn u16_le<R: Read>(reader: &mut R) -> DecodeResult<u16> {
    Ok(reader.read_u16::<LittleEndian>()?)
}

#[inline]
pub fn u32_le<R: Read>(reader: &mut R) -> DecodeResult<u32> {
    Ok(reader.read_u32::<LittleEndian>()?)
}

/// Reads a `uint32`-length-prefixed byte array, the shape every variable-length
/// field in the Rubus binary encoding uses.
pub fn bytes_lp<R: Read>(reader: &mut R) -> DecodeResult<Vec<u8>> {
    let len = u32_le(reader)? as usize;
    take(reader, len)
}

/// Reads a `uint32`-length-prefixed UTF-8 string.
pub fn string_lp<R: Read>(reader: &mut R) -> DecodeResult<String> {
    Ok(String::from_utf8(bytes_lp(reader)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn take_token() {
        let arr = b"RBUS|body";
        let mut cursor = Cursor::new(arr);
        token(&mut cursor, b"RBUS").unwrap();
        assert_eq!(take(&mut cursor, 5).unwrap(), b"|body");
    }

    #[test]
    fn token_mismatch_reports_both_sides() {
        let arr = b"XBUS";
        let mut cursor = Cursor::new(arr);
        let err = token(&mut cursor, b"RBUS").unwrap_err();
        match err {
            DecodeError::InvalidTokenError { expected, got } => {
                assert_eq!(expected, b"RBUS");
                assert_eq!(got, b"XBUS");
            }
            _ => panic!("wrong error variant"),
        }
    }

    #[test]
    fn length_prefixed_round_trip() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&5u32.to_le_bytes());
        buf.extend_from_slice(b"hello");
        let mut cursor = Cursor::new(buf);
        assert_eq!(string_lp(&mut cursor).unwrap(), "hello");
    }
}

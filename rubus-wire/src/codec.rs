//! Binary converters: a bijective map between a typed protocol value and a
//! byte sequence (§4.1). Each converter prefixes its output with a one-byte
//! `format-version`; decoding rejects any version it doesn't recognize so
//! future revisions of the encoding can coexist with old readers erroring out
//! cleanly instead of misinterpreting bytes.

use crate::error::{Result, WireError};
use crate::types::{FetchedPieces, MediaInfo, PlaybackList};
use rubus_common::{decode, encode, MediaId};
use std::io::Cursor;

/// A bijective byte encoding for one logical wire type.
pub trait BinaryConverter: Sized {
    /// Stable logical name used in the `serialized-object` header line.
    const LOGICAL_NAME: &'static str;

    /// The format-version byte this converter writes and expects to read.
    const FORMAT_VERSION: u8;

    fn encode(&self) -> Vec<u8>;
    fn decode(bytes: &[u8]) -> Result<Self>;
}

fn read_format_version(cursor: &mut Cursor<&[u8]>, expected: u8) -> Result<()> {
    let version = decode::u8(cursor)?;
    if version != expected {
        log::debug!("unsupported format-version {version}, expected {expected}");
        return Err(WireError::UnsupportedVersion(version));
    }
    Ok(())
}

fn read_media_id(cursor: &mut Cursor<&[u8]>) -> Result<MediaId> {
    let bytes = decode::bytes_lp(cursor)?;
    Ok(MediaId::new(bytes)?)
}

fn write_media_id(buf: &mut Vec<u8>, id: &MediaId) {
    encode::bytes_lp(buf, id.as_bytes()).expect("writing to a Vec never fails");
}

impl BinaryConverter for PlaybackList {
    const LOGICAL_NAME: &'static str = "PlaybackList";
    const FORMAT_VERSION: u8 = 1;

    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![Self::FORMAT_VERSION];
        buf.extend_from_slice(&(self.len() as u32).to_le_bytes());
        for (id, title) in self {
            write_media_id(&mut buf, id);
            encode::string_lp(&mut buf, title).expect("writing to a Vec never fails");
        }
        buf
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        read_format_version(&mut cursor, Self::FORMAT_VERSION)?;
        let count = decode::u32_le(&mut cursor)?;
        let mut map = PlaybackList::with_capacity(count as usize);
        for _ in 0..count {
            let id = read_media_id(&mut cursor)?;
            let title = decode::string_lp(&mut cursor)?;
            map.insert(id, title);
        }
        Ok(map)
    }
}

impl BinaryConverter for MediaInfo {
    const LOGICAL_NAME: &'static str = "MediaInfo";
    const FORMAT_VERSION: u8 = 1;

    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![Self::FORMAT_VERSION];
        write_media_id(&mut buf, &self.id);
        encode::string_lp(&mut buf, &self.title).unwrap();
        buf.extend_from_slice(&self.video_width.to_le_bytes());
        buf.extend_from_slice(&self.video_height.to_le_bytes());
        buf.extend_from_slice(&self.duration.to_le_bytes());
        encode::string_lp(&mut buf, &self.video_encoding).unwrap();
        encode::string_lp(&mut buf, &self.audio_encoding).unwrap();
        encode::string_lp(&mut buf, &self.video_container).unwrap();
        encode::string_lp(&mut buf, &self.audio_container).unwrap();
        buf
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        read_format_version(&mut cursor, Self::FORMAT_VERSION)?;
        let id = read_media_id(&mut cursor)?;
        let title = decode::string_lp(&mut cursor)?;
        let video_width = decode::u16_le(&mut cursor)?;
        let video_height = decode::u16_le(&mut cursor)?;
        let duration = decode::u32_le(&mut cursor)?;
        let video_encoding = decode::string_lp(&mut cursor)?;
        let audio_encoding = decode::string_lp(&mut cursor)?;
        let video_container = decode::string_lp(&mut cursor)?;
        let audio_container = decode::string_lp(&mut cursor)?;
        Ok(MediaInfo {
            id,
            title,
            video_width,
            video_height,
            duration,
            video_encoding,
            audio_encoding,
            video_container,
            audio_container,
        })
    }
}

impl BinaryConverter for FetchedPieces {
    const LOGICAL_NAME: &'static str = "FetchedPieces";
    const FORMAT_VERSION: u8 = 1;

    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![Self::FORMAT_VERSION];
        write_media_id(&mut buf, &self.id);
        buf.extend_from_slice(&self.offset.to_le_bytes());
        buf.extend_from_slice(&(self.video.len() as u32).to_le_bytes());
        for piece in &self.video {
            encode::bytes_lp(&mut buf, piece).unwrap();
        }
        for piece in &self.audio {
            encode::bytes_lp(&mut buf, piece).unwrap();
        }
        buf
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        read_format_version(&mut cursor, Self::FORMAT_VERSION)?;
        let id = read_media_id(&mut cursor)?;
        let offset = decode::u32_le(&mut cursor)?;
        let count = decode::u32_le(&mut cursor)? as usize;
        let mut video = Vec::with_capacity(count);
        for _ in 0..count {
            video.push(decode::bytes_lp(&mut cursor)?);
        }
        let mut audio = Vec::with_capacity(count);
        for _ in 0..count {
            audio.push(decode::bytes_lp(&mut cursor)?);
        }
        Ok(FetchedPieces {
            id,
            offset,
            video,
            audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_id(byte: u8) -> MediaId {
        MediaId::new(vec![byte; 4]).unwrap()
    }

    #[test]
    fn playback_list_round_trip() {
        let mut list = PlaybackList::new();
        list.insert(sample_id(1), "title1".to_string());
        list.insert(sample_id(2), "title2".to_string());

        let bytes = list.encode();
        let decoded = PlaybackList::decode(&bytes).unwrap();
        assert_eq!(decoded, list);
    }

    #[test]
    fn media_info_round_trip() {
        let info = MediaInfo {
            id: sample_id(0xab),
            title: "Title1".to_string(),
            video_width: 854,
            video_height: 480,
            duration: 1,
            video_encoding: "h264".to_string(),
            audio_encoding: "aac".to_string(),
            video_container: "mp4".to_string(),
            audio_container: "mp4".to_string(),
        };
        let bytes = info.encode();
        assert_eq!(MediaInfo::decode(&bytes).unwrap(), info);
    }

    #[test]
    fn fetched_pieces_round_trip() {
        let pieces = FetchedPieces {
            id: sample_id(0xcd),
            offset: 0,
            video: vec![vec![1, 2, 3], vec![4, 5]],
            audio: vec![vec![9], vec![8, 7]],
        };
        let bytes = pieces.encode();
        assert_eq!(FetchedPieces::decode(&bytes).unwrap(), pieces);
    }

    #[test]
    fn unknown_format_version_is_rejected() {
        let mut bytes = PlaybackList::new().encode();
        bytes[0] = 0xff;
        match PlaybackList::decode(&bytes) {
            Err(WireError::UnsupportedVersion(0xff)) => {}
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let mut list = PlaybackList::new();
        list.insert(sample_id(1), "title1".to_string());
        assert_eq!(list.encode(), list.encode());
    }
}

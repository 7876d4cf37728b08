use std::fmt;
use std::str::FromStr;

/// Maximum length, in bytes, of a [`MediaId`].
pub const MEDIA_ID_MAX_LEN: usize = 16;

/// An opaque byte-string identifying one entry in the catalog.
///
/// Historically represented as a hex string or a UUID by producers; Rubus
/// treats it as an opaque byte array capped at [`MEDIA_ID_MAX_LEN`] bytes and
/// only cares about equality, hashing, and a stable hex encoding for the
/// wire header (`media-id <hex-encoded-id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId(Vec<u8>);

#[derive(Debug, thiserror::Error)]
pub enum MediaIdError {
    #[error("media id exceeds {MEDIA_ID_MAX_LEN} bytes: got {0}")]
    TooLong(usize),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
}

impl MediaId {
    pub fn new(bytes: Vec<u8>) -> Result<Self, MediaIdError> {
        if bytes.len() > MEDIA_ID_MAX_LEN {
            log::debug!("rejecting media id of {} bytes, max is {MEDIA_ID_MAX_LEN}", bytes.len());
            return Err(MediaIdError::TooLong(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for MediaId {
    type Err = MediaIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaId::new(hex::decode(s)?)
    }
}

impl From<uuid::Uuid> for MediaId {
    fn from(id: uuid::Uuid) -> Self {
        MediaId(id.as_bytes().to_vec())
    }
}

use std::path::PathBuf;

use async_trait::async_trait;
use rubus_wire::{MediaId, MediaInfo, PlaybackList};

use crate::error::Result;

/// [`MediaInfo`] plus the on-disk directory holding its per-second piece
/// files (§3 "Media"). Owned by the media pool; handed out by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub info: MediaInfo,
    pub path: PathBuf,
}

impl Media {
    pub fn id(&self) -> &MediaId {
        &self.info.id
    }
}

/// The query interface onto the relational catalog backing the media pool.
///
/// The catalog itself (an embedded or external SQL store, §1 "Out of
/// scope") is an external collaborator; this trait is its interface with
/// the core, mirrored on `anni_provider::AnniProvider`'s split between a
/// cheap listing query and a full-record query.
#[async_trait]
pub trait CatalogQuery: Send + Sync {
    /// Full Media records for every catalog entry. May issue one lookup
    /// per entry; used for administrative queries (§4.2).
    async fn available_media(&self) -> Result<Vec<Media>>;

    /// `MediaId -> title` for every catalog entry, in one query. The LIST
    /// hot path (§4.2).
    async fn available_media_fast(&self) -> Result<PlaybackList>;

    /// The Media for one id. Fails with [`crate::PoolError::NotFound`] when
    /// absent.
    async fn get_media(&self, id: &MediaId) -> Result<Media>;
}

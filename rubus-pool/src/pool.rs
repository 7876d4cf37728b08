use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::try_join_all;
use rubus_wire::{MediaId, PlaybackList};

use crate::catalog::{CatalogQuery, Media};
use crate::error::{PoolError, Result};

/// Wraps a [`CatalogQuery`] and extracts byte-ranges of video/audio pieces
/// for FETCH requests (§4.2). The catalog itself stays an external
/// collaborator; the pool owns the piece-file reads, grounded in
/// `anni_provider::providers::fs::local::LocalFileSystemProvider`'s use of
/// `tokio::fs` so a read never blocks the executor thread.
pub struct MediaPool {
    catalog: Arc<dyn CatalogQuery>,
    cache: DashMap<MediaId, Media>,
}

impl MediaPool {
    pub fn new(catalog: Arc<dyn CatalogQuery>) -> Self {
        Self {
            catalog,
            cache: DashMap::new(),
        }
    }

    /// Full Media records for every catalog entry (§4.2 `availableMedia`).
    pub async fn available_media(&self) -> Result<Vec<Media>> {
        let entries = self.catalog.available_media().await?;
        log::debug!("available_media: {} catalog entries", entries.len());
        for entry in &entries {
            self.cache.insert(entry.id().clone(), entry.clone());
        }
        Ok(entries)
    }

    /// `MediaId -> title` for every catalog entry, in one query (§4.2
    /// `availableMediaFast`, the LIST hot path).
    pub async fn available_media_fast(&self) -> Result<PlaybackList> {
        self.catalog.available_media_fast().await
    }

    /// The Media for one id, cached across calls. Fails with
    /// [`PoolError::NotFound`] when absent (§4.2 `getMedia`).
    pub async fn get_media(&self, id: &MediaId) -> Result<Media> {
        if let Some(media) = self.cache.get(id) {
            return Ok(media.clone());
        }
        log::debug!("cache miss for media {id}, querying catalog");
        let media = self.catalog.get_media(id).await.map_err(|err| {
            log::warn!("media {id} not found in catalog: {err}");
            err
        })?;
        self.cache.insert(id.clone(), media.clone());
        Ok(media)
    }

    /// Reads `count` video-piece files and `count` audio-piece files,
    /// indices `offset .. offset + count`. Fails with
    /// [`PoolError::PieceNotFound`] on the first absent index; reads
    /// parallelize with [`try_join_all`], which preserves input order
    /// regardless of completion order, so pieces come back in request
    /// order even though the underlying reads race (§4.2).
    pub async fn fetch(
        &self,
        id: &MediaId,
        offset: u32,
        count: u32,
    ) -> Result<(Vec<Vec<u8>>, Vec<Vec<u8>>)> {
        let media = self.get_media(id).await?;
        let indices: Vec<u32> = (offset..offset.saturating_add(count)).collect();

        let video = try_join_all(
            indices
                .iter()
                .map(|&index| read_piece(&media.path, "video", index)),
        );
        let audio = try_join_all(
            indices
                .iter()
                .map(|&index| read_piece(&media.path, "audio", index)),
        );
        let (video, audio) = futures::try_join!(video, audio)?;
        Ok((video, audio))
    }
}

async fn read_piece(media_dir: &Path, stream: &str, index: u32) -> Result<Vec<u8>> {
    let path = media_dir.join(stream).join(index.to_string());
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("piece {index} not found for {stream} stream at {path:?}");
            Err(PoolError::PieceNotFound(index))
        }
        Err(err) => Err(PoolError::Io(err)),
    }
}

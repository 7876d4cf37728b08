//! A filesystem-backed [`CatalogQuery`] for the reference binary: catalog
//! metadata lives in a `catalog.toml` file under `media_root`, each entry's
//! pieces under `media_root/<hex-id>/{video,audio}/<index>` (§6 "Media
//! directory layout"). The catalog store itself is an external
//! collaborator (§1); this is one concrete, swappable implementation of
//! the query interface, not the interface itself.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rubus_pool::{CatalogQuery, Media, PoolError};
use rubus_wire::{MediaId, MediaInfo, PlaybackList};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "media")]
    entries: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CatalogEntry {
    id: String,
    title: String,
    video_width: u16,
    video_height: u16,
    duration: u32,
    video_encoding: String,
    audio_encoding: String,
    video_container: String,
    audio_container: String,
}

pub struct FsCatalog {
    entries: HashMap<MediaId, Media>,
}

impl FsCatalog {
    /// Loads `media_root/catalog.toml` and validates every id is parseable
    /// hex. Does not validate piece files exist; missing pieces surface as
    /// `PieceNotFound` at fetch time, per §4.2.
    pub fn load(media_root: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(media_root.join("catalog.toml"))?;
        let parsed: CatalogFile = toml::from_str(&text)?;

        let mut entries = HashMap::with_capacity(parsed.entries.len());
        for entry in parsed.entries {
            let id: MediaId = entry.id.parse()?;
            let path: PathBuf = media_root.join(&entry.id);
            let media = Media {
                info: MediaInfo {
                    id: id.clone(),
                    title: entry.title,
                    video_width: entry.video_width,
                    video_height: entry.video_height,
                    duration: entry.duration,
                    video_encoding: entry.video_encoding,
                    audio_encoding: entry.audio_encoding,
                    video_container: entry.video_container,
                    audio_container: entry.audio_container,
                },
                path,
            };
            entries.insert(id, media);
        }
        Ok(Self { entries })
    }
}

#[async_trait]
impl CatalogQuery for FsCatalog {
    async fn available_media(&self) -> rubus_pool::Result<Vec<Media>> {
        Ok(self.entries.values().cloned().collect())
    }

    async fn available_media_fast(&self) -> rubus_pool::Result<PlaybackList> {
        Ok(self
            .entries
            .values()
            .map(|m| (m.info.id.clone(), m.info.title.clone()))
            .collect())
    }

    async fn get_media(&self, id: &MediaId) -> rubus_pool::Result<Media> {
        self.entries.get(id).cloned().ok_or(PoolError::NotFound)
    }
}

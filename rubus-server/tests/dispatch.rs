use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rubus_auth::{Authenticator, TokenPresenceAuthenticator};
use rubus_pool::{CatalogQuery, Media, MediaPool, PoolError};
use rubus_server::{handle_connection, AppState};
use rubus_wire::frame::{read_response, write_request};
use rubus_wire::{
    BinaryConverter, FetchedPieces, MediaId, MediaInfo, PlaybackList, RequestHeader, ResponseType,
};
use tokio::io::{BufReader, DuplexStream};

struct TestCatalog {
    entries: HashMap<MediaId, Media>,
}

#[async_trait]
impl CatalogQuery for TestCatalog {
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

fn id(byte: u8) -> MediaId {
    MediaId::new(vec![byte]).unwrap()
}

async fn write_piece(dir: &std::path::Path, stream: &str, index: u32, bytes: &[u8]) {
    let stream_dir = dir.join(stream);
    tokio::fs::create_dir_all(&stream_dir).await.unwrap();
    tokio::fs::write(stream_dir.join(index.to_string()), bytes)
        .await
        .unwrap();
}

fn spawn_server(entries: HashMap<MediaId, Media>) -> BufReader<DuplexStream> {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let pool = Arc::new(MediaPool::new(Arc::new(TestCatalog { entries })));
    let authenticator: Arc<dyn Authenticator> = Arc::new(TokenPresenceAuthenticator);
    let state = Arc::new(AppState::new(pool, authenticator, 60));
    tokio::spawn(async move {
        handle_connection(server, state, "test-peer".to_string()).await;
    });
    BufReader::new(client)
}

fn two_title_catalog() -> HashMap<MediaId, Media> {
    let mut entries = HashMap::new();
    for (byte, title) in [(1u8, "title1"), (2u8, "title2")] {
        let media_id = id(byte);
        entries.insert(
            media_id.clone(),
            Media {
                info: MediaInfo {
                    id: media_id,
                    title: title.to_string(),
                    video_width: 0,
                    video_height: 0,
                    duration: 0,
                    video_encoding: String::new(),
                    audio_encoding: String::new(),
                    video_container: String::new(),
                    audio_container: String::new(),
                },
                path: PathBuf::new(),
            },
        );
    }
    entries
}

#[tokio::test]
async fn list_round_trip() {
    let mut client = spawn_server(two_title_catalog());

    write_request(
        &mut client,
        &RequestHeader::list(Some("abcd".to_string())),
    )
    .await
    .unwrap();
    let (header, body) = read_response(&mut client).await.unwrap();

    assert_eq!(header.response_type, ResponseType::Ok);
    let list = PlaybackList::decode(&body).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.get(&id(1)).map(String::as_str), Some("title1"));
    assert_eq!(list.get(&id(2)).map(String::as_str), Some("title2"));
}

#[tokio::test]
async fn info_happy_path() {
    let mut entries = HashMap::new();
    let media_id = id(0xab);
    entries.insert(
        media_id.clone(),
        Media {
            info: MediaInfo {
                id: media_id.clone(),
                title: "Title1".to_string(),
                video_width: 854,
                video_height: 480,
                duration: 1,
                video_encoding: "h264".to_string(),
                audio_encoding: "aac".to_string(),
                video_container: "mp4".to_string(),
                audio_container: "mp4".to_string(),
            },
            path: PathBuf::new(),
        },
    );
    let mut client = spawn_server(entries);

    write_request(
        &mut client,
        &RequestHeader::info(media_id.clone(), Some("abcd".to_string())),
    )
    .await
    .unwrap();
    let (header, body) = read_response(&mut client).await.unwrap();

    assert_eq!(header.response_type, ResponseType::Ok);
    let info = MediaInfo::decode(&body).unwrap();
    assert_eq!(info.title, "Title1");
    assert_eq!(info.video_width, 854);
    assert_eq!(info.video_height, 480);
    assert_eq!(info.duration, 1);
}

#[tokio::test]
async fn fetch_range() {
    let dir = tempfile::tempdir().unwrap();
    let media_id = id(0xcd);
    for i in 0..2u32 {
        write_piece(dir.path(), "video", i, &[i as u8]).await;
        write_piece(dir.path(), "audio", i, &[i as u8]).await;
    }
    let mut entries = HashMap::new();
    entries.insert(
        media_id.clone(),
        Media {
            info: MediaInfo {
                id: media_id.clone(),
                title: "title".to_string(),
                video_width: 0,
                video_height: 0,
                duration: 2,
                video_encoding: String::new(),
                audio_encoding: String::new(),
                video_container: String::new(),
                audio_container: String::new(),
            },
            path: dir.path().to_path_buf(),
        },
    );
    let mut client = spawn_server(entries);

    write_request(
        &mut client,
        &RequestHeader::fetch(media_id, 0, 2, Some("abcd".to_string())),
    )
    .await
    .unwrap();
    let (header, body) = read_response(&mut client).await.unwrap();

    assert_eq!(header.response_type, ResponseType::Ok);
    let pieces = FetchedPieces::decode(&body).unwrap();
    assert_eq!(pieces.offset, 0);
    assert_eq!(pieces.video.len(), 2);
    assert_eq!(pieces.audio.len(), 2);
}

#[tokio::test]
async fn fetch_not_found_then_list_still_works() {
    let mut client = spawn_server(two_title_catalog());

    write_request(
        &mut client,
        &RequestHeader::fetch(id(0xff), 0, 1, Some("abcd".to_string())),
    )
    .await
    .unwrap();
    let (header, _) = read_response(&mut client).await.unwrap();
    assert_eq!(header.response_type, ResponseType::BadRequest);

    write_request(&mut client, &RequestHeader::list(Some("abcd".to_string())))
        .await
        .unwrap();
    let (header, body) = read_response(&mut client).await.unwrap();
    assert_eq!(header.response_type, ResponseType::Ok);
    assert_eq!(PlaybackList::decode(&body).unwrap().len(), 2);
}

#[tokio::test]
async fn auth_rejects_empty_token() {
    let mut client = spawn_server(two_title_catalog());

    write_request(&mut client, &RequestHeader::list(Some(String::new())))
        .await
        .unwrap();
    let (header, _) = read_response(&mut client).await.unwrap();
    assert_eq!(header.response_type, ResponseType::Unauthorized);

    write_request(&mut client, &RequestHeader::list(Some("abcd".to_string())))
        .await
        .unwrap();
    let (header, _) = read_response(&mut client).await.unwrap();
    assert_eq!(header.response_type, ResponseType::Ok);
}

#[tokio::test]
async fn fetch_exceeding_max_pieces_is_rejected() {
    let mut client = spawn_server(two_title_catalog());

    write_request(
        &mut client,
        &RequestHeader::fetch(id(1), 0, 10_000, Some("abcd".to_string())),
    )
    .await
    .unwrap();
    let (header, _) = read_response(&mut client).await.unwrap();
    assert_eq!(header.response_type, ResponseType::BadRequest);
}

#[tokio::test]
async fn fetch_of_zero_pieces_is_rejected() {
    let mut client = spawn_server(two_title_catalog());

    write_request(
        &mut client,
        &RequestHeader::fetch(id(1), 0, 0, Some("abcd".to_string())),
    )
    .await
    .unwrap();
    let (header, _) = read_response(&mut client).await.unwrap();
    assert_eq!(header.response_type, ResponseType::BadRequest);
}

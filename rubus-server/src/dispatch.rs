//! The per-connection request loop (§4.4). One `tokio::spawn`ed task per
//! accepted stream, mirroring the async analogue of `annil`'s
//! one-worker-per-request model, except the wire protocol owns the
//! connection directly instead of delegating framing to an HTTP server.

use std::sync::Arc;

use rubus_pool::PoolError;
use rubus_wire::frame::{read_request, write_response};
use rubus_wire::{
    BinaryConverter, FetchedPieces, MediaInfo, PlaybackList, RequestType, ResponseHeader,
    ResponseType, WireError,
};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::state::AppState;

/// Runs the request loop for one accepted connection until the peer closes
/// the stream or a framing error makes the connection unrecoverable.
pub async fn handle_connection<S>(stream: S, state: Arc<AppState>, peer: String)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    log::info!("connection accepted: {peer}");
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    loop {
        let header = match read_request(&mut reader).await {
            Ok(header) => header,
            Err(WireError::Io(err)) if is_clean_eof(&err) => {
                log::debug!("connection {peer} closed by peer");
                break;
            }
            Err(WireError::MalformedFrame(reason)) => {
                log::warn!("connection {peer} closed: malformed frame ({reason})");
                break;
            }
            Err(err) => {
                log::debug!("connection {peer} sent a bad request: {err}");
                if respond(
                    &mut write_half,
                    ResponseHeader::error(ResponseType::BadRequest, err.to_string()),
                    &[],
                )
                .await
                .is_err()
                {
                    break;
                }
                continue;
            }
        };

        let viewer = state
            .authenticator
            .authenticate(header.authentication_token.as_deref())
            .await;
        if viewer.is_err() {
            log::debug!("connection {peer} failed authentication");
            if respond(
                &mut write_half,
                ResponseHeader::error(ResponseType::Unauthorized, None),
                &[],
            )
            .await
            .is_err()
            {
                break;
            }
            continue;
        }

        let (response, body) = match header.request_type {
            RequestType::List => handle_list(&state).await,
            RequestType::Info => handle_info(&state, &header).await,
            RequestType::Fetch => handle_fetch(&state, &header).await,
        };
        log::debug!("connection {peer}: {:?} -> {:?}", header.request_type, response.response_type);

        if respond(&mut write_half, response, &body).await.is_err() {
            break;
        }
    }
    log::info!("connection closed: {peer}");
}

async fn respond<W: AsyncWrite + Unpin>(
    writer: &mut W,
    header: ResponseHeader,
    body: &[u8],
) -> std::io::Result<()> {
    if let Err(err) = write_response(writer, &header, body).await {
        log::warn!("failed to write response: {err}");
        let _ = writer.shutdown().await;
        return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, err.to_string()));
    }
    Ok(())
}

fn is_clean_eof(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::UnexpectedEof
}

async fn handle_list(state: &AppState) -> (ResponseHeader, Vec<u8>) {
    match state.pool.available_media_fast().await {
        Ok(list) => ok_response::<PlaybackList>(&list),
        Err(err) => pool_error_response(err),
    }
}

async fn handle_info(
    state: &AppState,
    header: &rubus_wire::RequestHeader,
) -> (ResponseHeader, Vec<u8>) {
    let Some(id) = header.media_id.clone() else {
        return bad_request("missing media-id");
    };
    match state.pool.get_media(&id).await {
        Ok(media) => ok_response::<MediaInfo>(&media.info),
        Err(err) => pool_error_response(err),
    }
}

async fn handle_fetch(
    state: &AppState,
    header: &rubus_wire::RequestHeader,
) -> (ResponseHeader, Vec<u8>) {
    let (Some(id), Some(offset), Some(count)) = (
        header.media_id.clone(),
        header.starting_playback_piece,
        header.total_playback_pieces,
    ) else {
        return bad_request("missing fetch fields");
    };
    if count == 0 {
        return bad_request("total-playback-pieces must be at least 1");
    }
    if count > state.max_fetch_pieces {
        return bad_request("total-playback-pieces exceeds server limit");
    }
    match state.pool.fetch(&id, offset, count).await {
        Ok((video, audio)) => ok_response::<FetchedPieces>(&FetchedPieces {
            id,
            offset,
            video,
            audio,
        }),
        Err(err) => pool_error_response(err),
    }
}

fn ok_response<T: BinaryConverter>(value: &T) -> (ResponseHeader, Vec<u8>) {
    let body = value.encode();
    (ResponseHeader::ok(T::LOGICAL_NAME, body.len()), body)
}

fn bad_request(message: &str) -> (ResponseHeader, Vec<u8>) {
    (
        ResponseHeader::error(ResponseType::BadRequest, message.to_string()),
        Vec::new(),
    )
}

fn pool_error_response(err: PoolError) -> (ResponseHeader, Vec<u8>) {
    match err {
        PoolError::NotFound => bad_request("media-not-found"),
        PoolError::PieceNotFound(index) => bad_request(&format!("piece {index} not found")),
        PoolError::Catalog(message) => (
            ResponseHeader::error(ResponseType::ServerError, message),
            Vec::new(),
        ),
        PoolError::Io(err) => (
            ResponseHeader::error(ResponseType::ServerError, err.to_string()),
            Vec::new(),
        ),
    }
}

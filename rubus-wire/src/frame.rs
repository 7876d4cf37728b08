//! Message framing (§4.1): a header block terminated by a blank line,
//! followed by an opaque body. `\n\n` is the reserved header terminator, so
//! header lines must never contain an embedded newline.

use crate::error::{Result, WireError};
use rubus_common::MediaId;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    List,
    Info,
    Fetch,
}

impl RequestType {
    fn as_str(self) -> &'static str {
        match self {
            RequestType::List => "LIST",
            RequestType::Info => "INFO",
            RequestType::Fetch => "FETCH",
        }
    }
}

impl FromStr for RequestType {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LIST" => Ok(RequestType::List),
            "INFO" => Ok(RequestType::Info),
            "FETCH" => Ok(RequestType::Fetch),
            other => Err(WireError::UnknownRequestType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Ok,
    BadRequest,
    ServerError,
    Unauthorized,
}

impl ResponseType {
    fn as_str(self) -> &'static str {
        match self {
            ResponseType::Ok => "OK",
            ResponseType::BadRequest => "BAD_REQUEST",
            ResponseType::ServerError => "SERVER_ERROR",
            ResponseType::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl FromStr for ResponseType {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "OK" => Ok(ResponseType::Ok),
            "BAD_REQUEST" => Ok(ResponseType::BadRequest),
            "SERVER_ERROR" => Ok(ResponseType::ServerError),
            "UNAUTHORIZED" => Ok(ResponseType::Unauthorized),
            other => Err(WireError::UnknownResponseType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestHeader {
    pub request_type: RequestType,
    pub media_id: Option<MediaId>,
    pub starting_playback_piece: Option<u32>,
    pub total_playback_pieces: Option<u32>,
    pub authentication_token: Option<String>,
}

impl RequestHeader {
    pub fn list(authentication_token: Option<String>) -> Self {
        Self {
            request_type: RequestType::List,
            media_id: None,
            starting_playback_piece: None,
            total_playback_pieces: None,
            authentication_token,
        }
    }

    pub fn info(media_id: MediaId, authentication_token: Option<String>) -> Self {
        Self {
            request_type: RequestType::Info,
            media_id: Some(media_id),
            starting_playback_piece: None,
            total_playback_pieces: None,
            authentication_token,
        }
    }

    pub fn fetch(
        media_id: MediaId,
        starting_playback_piece: u32,
        total_playback_pieces: u32,
        authentication_token: Option<String>,
    ) -> Self {
        Self {
            request_type: RequestType::Fetch,
            media_id: Some(media_id),
            starting_playback_piece: Some(starting_playback_piece),
            total_playback_pieces: Some(total_playback_pieces),
            authentication_token,
        }
    }

    fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("request-type {}", self.request_type.as_str())];
        if let Some(id) = &self.media_id {
            lines.push(format!("media-id {id}"));
        }
        if let Some(piece) = self.starting_playback_piece {
            lines.push(format!("starting-playback-piece {piece}"));
        }
        if let Some(count) = self.total_playback_pieces {
            lines.push(format!("total-playback-pieces {count}"));
        }
        if let Some(token) = &self.authentication_token {
            lines.push(format!("authentication-token {token}"));
        }
        lines
    }

    fn from_lines(lines: &[String]) -> Result<Self> {
        let mut request_type = None;
        let mut media_id = None;
        let mut starting_playback_piece = None;
        let mut total_playback_pieces = None;
        let mut authentication_token = None;

        for line in lines {
            let (key, value) = split_header_line(line)?;
            match key {
                "request-type" => request_type = Some(value.parse::<RequestType>()?),
                "media-id" => {
                    media_id = Some(value.parse::<MediaId>().map_err(WireError::MediaId)?)
                }
                "starting-playback-piece" => {
                    starting_playback_piece = Some(parse_u32("starting-playback-piece", value)?)
                }
                "total-playback-pieces" => {
                    total_playback_pieces = Some(parse_u32("total-playback-pieces", value)?)
                }
                "authentication-token" => authentication_token = Some(value.to_string()),
                // forward-compatible: unknown header lines are ignored
                other => log::trace!("ignoring unknown request header line {other:?}"),
            }
        }

        Ok(Self {
            request_type: request_type.ok_or(WireError::MissingField("request-type"))?,
            media_id,
            starting_playback_piece,
            total_playback_pieces,
            authentication_token,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResponseHeader {
    pub response_type: ResponseType,
    pub serialized_object: Option<String>,
    pub message: Option<String>,
    content_length: Option<u32>,
}

impl ResponseHeader {
    pub fn ok(serialized_object: &'static str, body_len: usize) -> Self {
        Self {
            response_type: ResponseType::Ok,
            serialized_object: Some(serialized_object.to_string()),
            message: None,
            content_length: Some(body_len as u32),
        }
    }

    pub fn error(response_type: ResponseType, message: impl Into<Option<String>>) -> Self {
        Self {
            response_type,
            serialized_object: None,
            message: message.into(),
            content_length: None,
        }
    }

    fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("response-type {}", self.response_type.as_str())];
        if let Some(obj) = &self.serialized_object {
            lines.push(format!("serialized-object {obj}"));
        }
        if let Some(len) = self.content_length {
            lines.push(format!("content-length {len}"));
        }
        if let Some(message) = &self.message {
            lines.push(format!("message {message}"));
        }
        lines
    }

    fn from_lines(lines: &[String]) -> Result<Self> {
        let mut response_type = None;
        let mut serialized_object = None;
        let mut message = None;
        let mut content_length = None;

        for line in lines {
            let (key, value) = split_header_line(line)?;
            match key {
                "response-type" => response_type = Some(value.parse::<ResponseType>()?),
                "serialized-object" => serialized_object = Some(value.to_string()),
                "content-length" => content_length = Some(parse_u32("content-length", value)?),
                "message" => message = Some(value.to_string()),
                other => log::trace!("ignoring unknown response header line {other:?}"),
            }
        }

        Ok(Self {
            response_type: response_type.ok_or(WireError::MissingField("response-type"))?,
            serialized_object,
            message,
            content_length,
        })
    }

    pub fn content_length(&self) -> u32 {
        self.content_length.unwrap_or(0)
    }
}

fn split_header_line(line: &str) -> Result<(&str, &str)> {
    line.split_once(' ')
        .map(|(k, v)| (k, v.trim()))
        .ok_or_else(|| WireError::MalformedFrame(format!("unparsable header line {line:?}")))
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| WireError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// Reads header lines up to (and consuming) the blank line that terminates
/// the header block.
async fn read_header_lines<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            if lines.is_empty() {
                return Err(WireError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed before a frame header was received",
                )));
            }
            return Err(WireError::MalformedFrame(
                "connection closed mid-header".to_string(),
            ));
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            return Ok(lines);
        }
        lines.push(trimmed.to_string());
    }
}

async fn read_body<R: AsyncBufRead + Unpin>(reader: &mut R, len: u32) -> Result<Vec<u8>> {
    let mut body = vec![0u8; len as usize];
    tokio::io::AsyncReadExt::read_exact(reader, &mut body)
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                WireError::TruncatedBody
            } else {
                WireError::Io(e)
            }
        })?;
    Ok(body)
}

async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    lines: &[String],
    body: &[u8],
) -> Result<()> {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    writer.write_all(out.as_bytes()).await?;
    if !body.is_empty() {
        writer.write_all(body).await?;
    }
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<RequestHeader> {
    let lines = read_header_lines(reader).await?;
    RequestHeader::from_lines(&lines)
}

pub async fn write_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    header: &RequestHeader,
) -> Result<()> {
    write_frame(writer, &header.to_lines(), &[]).await
}

pub async fn read_response<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<(ResponseHeader, Vec<u8>)> {
    let lines = read_header_lines(reader).await?;
    let header = ResponseHeader::from_lines(&lines)?;
    let body = if header.content_length() > 0 {
        read_body(reader, header.content_length()).await?
    } else {
        Vec::new()
    };
    Ok((header, body))
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    header: &ResponseHeader,
    body: &[u8],
) -> Result<()> {
    write_frame(writer, &header.to_lines(), body).await
}

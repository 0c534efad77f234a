//! File serving module
//!
//! Consults the cache validator first: a matching conditional header ends
//! the request with 304 and no body. Otherwise the file is served with its
//! extension-derived content type, optionally piped through a negotiated
//! compressor.
//!
//! The `etag` strategy already has the full bytes in hand (the digest
//! requires them), so it serves from that buffer. The `last-modified`
//! strategy never buffers the file: identity responses stream straight off
//! the file handle, compressed responses stream through an encoder task.
//! Either way the transport's write buffering paces the reads, and a client
//! disconnect drops the body, which stops the task and releases the handle.

use crate::config::AppState;
use crate::http::cache::{self, CacheStrategy, Validator};
use crate::http::encoding::{self, ChunkEncoder, ContentCoding};
use crate::http::response::{empty_body, full_body};
use crate::http::{self, mime, Body};
use crate::logger;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::Response;
use std::fs::Metadata;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt as _;
use tokio_util::io::ReaderStream;

const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Serve a regular file, honoring conditional headers and accept-encoding
pub async fn serve_file(
    ctx: &crate::handler::router::RequestContext,
    path: &Path,
    metadata: &Metadata,
    state: &AppState,
) -> Response<Body> {
    let coding = if state.config.http.compression {
        encoding::negotiate(ctx.accept_encoding.as_deref())
    } else {
        None
    };

    match state.config.cache.strategy {
        CacheStrategy::Etag => serve_buffered(ctx, path, coding, state).await,
        CacheStrategy::LastModified => serve_streaming(ctx, path, metadata, coding, state).await,
    }
}

/// Content-digest validation: the digest needs the full bytes, so the
/// response is served from the same buffer.
async fn serve_buffered(
    ctx: &crate::handler::router::RequestContext,
    path: &Path,
    coding: Option<ContentCoding>,
    state: &AppState,
) -> Response<Body> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) => return read_failure_response(path, &e),
    };

    let validator = Validator::Etag(cache::content_etag(&content));
    if cache::matches(ctx.if_none_match.as_deref(), validator.value()) {
        if state.config.logging.access_log {
            logger::log_response(304, 0);
        }
        return http::build_304_response(&validator);
    }

    let size = content.len();
    let body = match coding {
        Some(coding) => match encoding::compress(coding, &content) {
            Ok(compressed) => full_body(compressed),
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to compress '{}': {e}",
                    path.display()
                ));
                return http::build_500_response();
            }
        },
        None => full_body(content),
    };

    if state.config.logging.access_log {
        logger::log_response(200, size);
    }
    build_file_response(&content_type_for(path), &validator, coding, body)
}

/// Timestamp validation: no digest, so the file is never buffered
async fn serve_streaming(
    ctx: &crate::handler::router::RequestContext,
    path: &Path,
    metadata: &Metadata,
    coding: Option<ContentCoding>,
    state: &AppState,
) -> Response<Body> {
    let modified = match metadata.modified() {
        Ok(modified) => modified,
        Err(e) => return read_failure_response(path, &e),
    };

    let validator = Validator::LastModified(cache::http_date(modified));
    if cache::matches(ctx.if_modified_since.as_deref(), validator.value()) {
        if state.config.logging.access_log {
            logger::log_response(304, 0);
        }
        return http::build_304_response(&validator);
    }

    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) => return read_failure_response(path, &e),
    };

    let body = match coding {
        None => {
            let stream = ReaderStream::new(file).map(|chunk| chunk.map(Frame::data));
            StreamBody::new(stream).boxed()
        }
        Some(coding) => {
            // Small channel: the encoder task blocks until the transport drains
            let (tx, rx) = mpsc::channel::<Result<Frame<Bytes>, io::Error>>(2);
            tokio::spawn(stream_compressed(file, coding, tx));
            StreamBody::new(ReceiverStream::new(rx)).boxed()
        }
    };

    if state.config.logging.access_log {
        #[allow(clippy::cast_possible_truncation)]
        logger::log_response(200, metadata.len() as usize);
    }
    build_file_response(&content_type_for(path), &validator, coding, body)
}

/// Read the file chunk by chunk, compress, and forward to the body channel
///
/// A failed send means the client went away; returning drops the file handle.
async fn stream_compressed(
    mut file: File,
    coding: ContentCoding,
    tx: mpsc::Sender<Result<Frame<Bytes>, io::Error>>,
) {
    let mut encoder = ChunkEncoder::new(coding);
    let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
    loop {
        match file.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => match encoder.write(&buf[..n]) {
                Ok(compressed) => {
                    if !compressed.is_empty()
                        && tx
                            .send(Ok(Frame::data(Bytes::from(compressed))))
                            .await
                            .is_err()
                    {
                        return;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            },
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }
    match encoder.finish() {
        Ok(trailing) => {
            if !trailing.is_empty() {
                let _ = tx.send(Ok(Frame::data(Bytes::from(trailing)))).await;
            }
        }
        Err(e) => {
            let _ = tx.send(Err(e)).await;
        }
    }
}

fn content_type_for(path: &Path) -> String {
    let base = mime::content_type(path.extension().and_then(|e| e.to_str()));
    format!("{base}; charset=utf-8")
}

fn build_file_response(
    content_type: &str,
    validator: &Validator,
    coding: Option<ContentCoding>,
    body: Body,
) -> Response<Body> {
    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Cache-Control", "no-cache")
        .header(validator.header_name(), validator.value());
    if let Some(coding) = coding {
        builder = builder.header("Content-Encoding", coding.header_value());
    }
    builder.body(body).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build file response: {e}"));
        Response::new(empty_body())
    })
}

/// The initial stat succeeded, so a failure here is a race with deletion or
/// a permission problem: 404 for a vanished file, 500 otherwise.
fn read_failure_response(path: &Path, err: &io::Error) -> Response<Body> {
    if err.kind() == io::ErrorKind::NotFound {
        return http::build_404_response();
    }
    logger::log_error(&format!("Failed to read file '{}': {err}", path.display()));
    http::build_500_response()
}

//! File transfer for static files.

use std::cmp;
use std::convert::Infallible;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::{ready, stream, Stream};
use headers::{ContentLength, ContentType, HeaderMapExt, LastModified};
use http::header::CACHE_CONTROL;
use http::{Method, Request, StatusCode};
use tokio::fs::File as TkFile;
use tokio_util::io::poll_read_buf;
use tower_service::Service;

use crate::config::Config;
use crate::path;
use crate::reply::{self, Response, ResponseFuture};
use crate::resolve::ResolvedPath;
use crate::Body;

/// Serves files from a root directory.
///
/// This is the file-transfer half of [`Static`](crate::Static): once a
/// request has been resolved, the file named by its [`ResolvedPath`]
/// extension is streamed back with `content-length`, `content-type`,
/// `last-modified` and `cache-control` headers. `HEAD` requests get the
/// headers and an empty body.
///
/// Used on its own, the request path is decoded and cleaned the same way the
/// resolver does it, but no extension or index lookups are made.
#[derive(Clone, Debug)]
pub struct FileServer {
    root: Arc<PathBuf>,
    config: Arc<Config>,
}

impl FileServer {
    /// Create a `FileServer` for `root`.
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        FileServer {
            root: Arc::new(root.into()),
            config: Arc::new(config),
        }
    }

    fn locate<B>(&self, req: &Request<B>) -> Option<PathBuf> {
        if let Some(resolved) = req.extensions().get::<ResolvedPath>() {
            return Some(resolved.file().to_owned());
        }

        let tail = req.uri().path();
        let decoded = match path::decode(tail) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::debug!("file: failed to decode route={:?}: {}", tail, err);
                return None;
            }
        };
        let relative = path::clean(&decoded).to_relative()?;
        Some(self.root.join(relative))
    }
}

impl<B> Service<Request<B>> for FileServer {
    type Response = Response;
    type Error = Infallible;
    type Future = ResponseFuture<Infallible>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let head = req.method() == Method::HEAD;
        let config = self.config.clone();
        let path = self.locate(&req);
        ResponseFuture::new(async move {
            let res = match path {
                Some(path) => file_reply(path, head, config).await,
                None => reply::with_status(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}

async fn file_reply(path: PathBuf, head: bool, config: Arc<Config>) -> Response {
    tracing::trace!("file: {:?}", path);
    let file = match TkFile::open(&path).await {
        Ok(f) => f,
        Err(err) => return open_error(&path, err),
    };

    let meta = match file.metadata().await {
        Ok(meta) => meta,
        Err(err) => {
            tracing::debug!("file metadata error: {}", err);
            return reply::with_status(StatusCode::NOT_FOUND);
        }
    };
    if !meta.is_file() {
        tracing::debug!("file: not a regular file: {:?}", path.display());
        return reply::with_status(StatusCode::NOT_FOUND);
    }

    let len = meta.len();
    let body = if head {
        Body::empty()
    } else {
        let buf_size = config
            .read_buffer_size
            .unwrap_or_else(|| optimal_buf_size(&meta));
        Body::wrap_stream(file_stream(file, buf_size, len))
    };

    let mut resp = Response::new(body);
    let content_type = ContentType::from(mime_guess::from_path(&path).first_or_octet_stream());
    resp.headers_mut().typed_insert(ContentLength(len));
    resp.headers_mut().typed_insert(content_type);

    if config.last_modified {
        if let Ok(modified) = meta.modified() {
            resp.headers_mut().typed_insert(LastModified::from(modified));
        }
    }

    if let Some(ref cache_control) = config.cache_control {
        resp.headers_mut()
            .insert(CACHE_CONTROL, cache_control.clone());
    }

    for (k, v) in config.headers.iter() {
        resp.headers_mut().insert(k, v.clone());
    }

    resp
}

fn open_error(path: &Path, err: io::Error) -> Response {
    let status = match err.kind() {
        io::ErrorKind::NotFound => {
            tracing::debug!("file not found: {:?}", path.display());
            StatusCode::NOT_FOUND
        }
        io::ErrorKind::PermissionDenied => {
            tracing::warn!("file permission denied: {:?}", path.display());
            StatusCode::FORBIDDEN
        }
        _ => {
            tracing::error!("file open error (path={:?}): {} ", path.display(), err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    reply::with_status(status)
}

fn file_stream(
    mut file: TkFile,
    buf_size: usize,
    mut len: u64,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + Sync {
    let mut buf = BytesMut::new();
    stream::poll_fn(move |cx| {
        if len == 0 {
            return Poll::Ready(None);
        }
        reserve_at_least(&mut buf, buf_size);

        let n = match ready!(poll_read_buf(Pin::new(&mut file), cx, &mut buf)) {
            Ok(n) => n as u64,
            Err(err) => {
                tracing::debug!("file read error: {}", err);
                return Poll::Ready(Some(Err(err)));
            }
        };

        if n == 0 {
            tracing::debug!("file read found EOF before expected length");
            return Poll::Ready(None);
        }

        let mut chunk = buf.split().freeze();
        if n > len {
            chunk = chunk.split_to(len as usize);
            len = 0;
        } else {
            len -= n;
        }

        Poll::Ready(Some(Ok(chunk)))
    })
}

fn reserve_at_least(buf: &mut BytesMut, cap: usize) {
    if buf.capacity() - buf.len() < cap {
        buf.reserve(cap);
    }
}

const DEFAULT_READ_BUF_SIZE: usize = 8_192;

fn optimal_buf_size(metadata: &Metadata) -> usize {
    let block_size = get_block_size(metadata);

    // If file length is smaller than block size, don't waste space
    // reserving a bigger-than-needed buffer.
    cmp::min(block_size as u64, metadata.len()) as usize
}

#[cfg(unix)]
fn get_block_size(metadata: &Metadata) -> usize {
    use std::os::unix::fs::MetadataExt;

    // Use device blocksize unless it's really small.
    cmp::max(metadata.blksize() as usize, DEFAULT_READ_BUF_SIZE)
}

#[cfg(not(unix))]
fn get_block_size(_metadata: &Metadata) -> usize {
    DEFAULT_READ_BUF_SIZE
}

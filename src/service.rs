use std::error::Error as StdError;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::poll_fn;
use http::{Method, Request, Uri};
use tower_service::Service;

use crate::blocking;
use crate::fs::FileServer;
use crate::reply::{Response, ResponseFuture};
use crate::resolve::{ResolvedPath, Resolver};
use crate::Error;

/// Serves static files in front of another service.
///
/// `GET` and `HEAD` requests whose path resolves to a file under the root
/// are rewritten to the resolved path and handed to the file-transfer
/// service (a [`FileServer`] unless replaced). Any other request, and any
/// request that doesn't resolve, goes to `next` unmodified.
///
/// One trailing slash is ignored, so `/docs/` and `/docs` are the same.
///
/// Build it with [`Static::new`] or [`Config::wrap`](crate::Config::wrap).
#[derive(Clone, Debug)]
pub struct Static<N, F = FileServer> {
    resolver: Arc<Resolver>,
    files: F,
    next: N,
}

impl<N> Static<N> {
    /// Serve `root` in front of `next` with the default configuration.
    pub fn new(root: impl Into<PathBuf>, next: N) -> Self {
        crate::config().wrap(root, next)
    }

    pub(crate) fn from_parts(resolver: Resolver, files: FileServer, next: N) -> Self {
        Static {
            resolver: Arc::new(resolver),
            files,
            next,
        }
    }
}

impl<N, F> Static<N, F> {
    /// Replace the service that transfers resolved files.
    ///
    /// It receives requests whose URI path has been rewritten to the
    /// resolved file, with the [`ResolvedPath`] in the request extensions.
    pub fn with_file_server<G>(self, files: G) -> Static<N, G> {
        Static {
            resolver: self.resolver,
            files,
            next: self.next,
        }
    }

    /// The resolver used to look up files.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Consume the layer, returning the wrapped service.
    pub fn into_inner(self) -> N {
        self.next
    }
}

impl<N, F, B> Service<Request<B>> for Static<N, F>
where
    N: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    N::Error: Into<Box<dyn StdError + Send + Sync>>,
    N::Future: Send + 'static,
    F: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    F::Error: Into<Box<dyn StdError + Send + Sync>>,
    F::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = Error;
    type Future = ResponseFuture<Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx).map_err(Error::new)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            let fut = self.next.call(req);
            return ResponseFuture::new(async move { fut.await.map_err(Error::new) });
        }

        // the instance that was polled ready is the one that gets called
        let clone = self.next.clone();
        let mut next = mem::replace(&mut self.next, clone);
        let mut files = self.files.clone();
        let resolver = self.resolver.clone();
        let path = trim_trailing_slash(req.uri().path()).to_owned();

        ResponseFuture::new(async move {
            let resolved = blocking::run(move || resolver.resolve(&path))
                .await
                .flatten();

            if let Some(resolved) = resolved {
                match rewrite_uri(req.uri(), &resolved) {
                    Ok(uri) => {
                        tracing::debug!("static: {} -> {}", req.uri().path(), uri.path());
                        *req.uri_mut() = uri;
                        req.extensions_mut().insert(resolved);
                        poll_fn(|cx| files.poll_ready(cx))
                            .await
                            .map_err(Error::new)?;
                        return files.call(req).await.map_err(Error::new);
                    }
                    Err(err) => {
                        tracing::error!("static: could not rewrite {:?}: {}", req.uri(), err);
                    }
                }
            }

            tracing::trace!("static: no file for {:?}", req.uri().path());
            next.call(req).await.map_err(Error::new)
        })
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

fn rewrite_uri(uri: &Uri, resolved: &ResolvedPath) -> Result<Uri, http::Error> {
    let path_and_query = match uri.query() {
        Some(query) => format!("/{}?{}", resolved, query),
        None => format!("/{}", resolved),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse()?);
    Ok(Uri::from_parts(parts)?)
}

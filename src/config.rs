use std::path::PathBuf;

use http::header::IntoHeaderName;
use http::{HeaderMap, HeaderValue};

use crate::fs::FileServer;
use crate::resolve::Resolver;
use crate::service::Static;

/// Configuration for serving a directory of static files.
#[derive(Debug, Clone)]
pub struct Config {
    /// Extension tried when a path doesn't name a file exactly, and appended
    /// to `index` for directories (default `.html`)
    pub page_cache_extension: String,
    /// `cache-control` value sent with every served file
    pub cache_control: Option<HeaderValue>,
    /// Set a specific read buffer size (default auto detect)
    pub read_buffer_size: Option<usize>,
    /// include the LastModified header in the response
    pub last_modified: bool,
    /// extra headers to add
    pub headers: HeaderMap<HeaderValue>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_cache_extension: ".html".to_owned(),
            cache_control: None,
            read_buffer_size: None,
            last_modified: true,
            headers: Default::default(),
        }
    }
}

impl Config {
    /// Override the page-cache extension
    pub fn page_cache_extension(mut self, extension: impl Into<String>) -> Self {
        self.page_cache_extension = extension.into();
        self
    }

    /// Send `cache-control` with served files
    pub fn cache_control(mut self, cache_control: HeaderValue) -> Self {
        self.cache_control = Some(cache_control);
        self
    }

    /// Override the read buffer size
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = Some(size);
        self
    }

    /// Override the last_modified exposure
    pub fn last_modified(mut self, last_modified: bool) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// Add additional headers
    pub fn add_header(mut self, key: impl IntoHeaderName, value: HeaderValue) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Build a [`Resolver`] for `root` using this configuration.
    pub fn resolver(&self, root: impl Into<PathBuf>) -> Resolver {
        Resolver::new(root, self.page_cache_extension.clone())
    }

    /// Build the [`FileServer`] that transfers files found under `root`.
    pub fn file_server(self, root: impl Into<PathBuf>) -> FileServer {
        FileServer::new(root, self)
    }

    /// Put a directory of static files in front of `next`.
    ///
    /// `GET` and `HEAD` requests that resolve to a file under `root` are
    /// served from disk. Everything else goes to `next` untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use static_root::http::{HeaderValue, Request};
    /// use static_root::{handler::service_fn, Body, Response};
    ///
    /// async fn app(_req: Request<Body>) -> Result<Response, std::convert::Infallible> {
    ///     Ok(Response::new("hello from the app".into()))
    /// }
    ///
    /// let service = static_root::config()
    ///     .page_cache_extension(".html")
    ///     .cache_control(HeaderValue::from_static("public, max-age=3600"))
    ///     .wrap("/srv/public", service_fn(app));
    /// # drop(service);
    /// ```
    pub fn wrap<N>(self, root: impl Into<PathBuf>, next: N) -> Static<N> {
        let root = root.into();
        let resolver = self.resolver(root.clone());
        let files = self.file_server(root);
        Static::from_parts(resolver, files, next)
    }
}

/// Creates a new configuration for serving a directory of static files.
///
/// See [`Config::wrap`].
pub fn config() -> Config {
    Config::default()
}

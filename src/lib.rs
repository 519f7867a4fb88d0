#![doc(html_root_url = "https://docs.rs/static-root/0.1.0")]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(rust_2018_idioms)]
#![cfg_attr(test, deny(warnings))]

//! # static-root
//!
//! Serve a directory of static files in front of any
//! [`Service`](tower_service::Service).
//!
//! [`Static`] looks every `GET` and `HEAD` request up under a root
//! directory. When a file matches, the request is answered from disk; when
//! nothing matches, or the method is anything else, the request is passed
//! on to the wrapped application unchanged.
//!
//! Request paths are untrusted. Before anything touches the filesystem they
//! are percent-decoded, and `.`/`..` segments are eliminated so the result
//! can never leave the root: a `..` with nothing left to remove is dropped.
//! Candidates are probed directly, never through a pattern engine, so names
//! containing `*`, `?`, `[` or `{` only ever match themselves.
//!
//! For a request path `p`, these are tried in order, and the first regular,
//! readable file wins:
//!
//! - `<root>/p`
//! - `<root>/p.html`
//! - `<root>/p/index.html`
//!
//! The `.html` page-cache extension is configurable, see [`Config`].
//!
//! ## Example
//!
//! ```no_run
//! use static_root::http::Request;
//! use static_root::{handler::service_fn, Body, Response, Static};
//!
//! async fn app(req: Request<Body>) -> Result<Response, std::convert::Infallible> {
//!     Ok(Response::new(format!("no file for {}", req.uri().path()).into()))
//! }
//!
//! // `GET /about` serves `/srv/public/about.html` if it exists,
//! // otherwise `app` answers.
//! let service = Static::new("/srv/public", service_fn(app));
//! # drop(service);
//! ```
//!
//! ## Blocking
//!
//! Probing the filesystem is blocking I/O. [`Static`] runs it with
//! `tokio::task::spawn_blocking`, so it must be called from within a tokio
//! runtime. [`Resolver`] can be used directly from synchronous code.

mod blocking;
mod bodyt;
mod config;
mod error;
pub mod fs;
pub mod handler;
mod path;
mod reply;
mod resolve;
mod service;

pub use http;

pub use self::bodyt::Body;
pub use self::config::{config, Config};
pub use self::error::Error;
pub use self::fs::FileServer;
pub use self::reply::{Response, ResponseFuture};
pub use self::resolve::{ResolvedPath, Resolver};
pub use self::service::Static;

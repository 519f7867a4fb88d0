//! Adapting plain functions into services.

use std::fmt;
use std::future::Future;
use std::task::{Context, Poll};

use http::Request;
use tower_service::Service;

/// Create a `Service` from an async function.
///
/// Handy for the application that sits behind [`Static`](crate::Static):
///
/// ```
/// use static_root::http::Request;
/// use static_root::{handler::service_fn, Body, Response, Static};
///
/// async fn not_found(_req: Request<Body>) -> Result<Response, std::convert::Infallible> {
///     let mut res = Response::new("not found".into());
///     *res.status_mut() = static_root::http::StatusCode::NOT_FOUND;
///     Ok(res)
/// }
///
/// let service = Static::new("public", service_fn(not_found));
/// # drop(service);
/// ```
pub fn service_fn<F>(f: F) -> ServiceFn<F> {
    ServiceFn { f }
}

/// A `Service` built from a function, see [`service_fn`].
#[derive(Clone, Copy)]
pub struct ServiceFn<F> {
    f: F,
}

impl<F, Fut, B, R, E> Service<Request<B>> for ServiceFn<F>
where
    F: FnMut(Request<B>) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    type Response = R;
    type Error = E;
    type Future = Fut;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    #[inline]
    fn call(&mut self, req: Request<B>) -> Self::Future {
        (self.f)(req)
    }
}

impl<F> fmt::Debug for ServiceFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceFn").finish()
    }
}

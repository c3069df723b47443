// File: ./src/client/redirect.rs
// Tower layer that follows HTTP redirects for feed downloads.
use http::{Request, Response, Uri, header};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

pub const DEFAULT_MAX_REDIRECTS: usize = 5;

#[derive(Clone, Debug)]
pub struct FollowRedirectLayer {
    max_redirects: usize,
}

impl FollowRedirectLayer {
    pub fn new(max_redirects: usize) -> Self {
        Self { max_redirects }
    }
}

impl Default for FollowRedirectLayer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REDIRECTS)
    }
}

impl<S> Layer<S> for FollowRedirectLayer {
    type Service = FollowRedirect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FollowRedirect {
            inner,
            max_redirects: self.max_redirects,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FollowRedirect<S> {
    inner: S,
    max_redirects: usize,
}

/// Resolve a `Location` header against the request URI. Relative targets inherit
/// scheme and authority from `base`.
pub fn resolve_location(base: &Uri, location: &str) -> Option<Uri> {
    let parts = location.parse::<Uri>().ok()?.into_parts();
    let mut builder = Uri::builder();

    match parts.scheme {
        Some(scheme) => builder = builder.scheme(scheme),
        None => {
            if let Some(s) = base.scheme() {
                builder = builder.scheme(s.clone());
            }
        }
    }
    match parts.authority {
        Some(authority) => builder = builder.authority(authority),
        None => {
            if let Some(a) = base.authority() {
                builder = builder.authority(a.clone());
            }
        }
    }
    builder = builder.path_and_query(
        parts
            .path_and_query
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string()),
    );

    builder.build().ok()
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for FollowRedirect<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
    ReqBody: Clone + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();
        let max_redirects = self.max_redirects;

        Box::pin(async move {
            let mut current = req;
            let mut hops = 0;

            loop {
                // Keep a copy: the request is consumed by the call.
                let next = current.clone();
                let response = inner.call(current).await?;

                if hops >= max_redirects || !response.status().is_redirection() {
                    return Ok(response);
                }

                let target = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|loc| resolve_location(next.uri(), loc));

                let Some(target) = target else {
                    return Ok(response);
                };

                log::debug!("Following redirect {} -> {}", next.uri(), target);
                current = next;
                *current.uri_mut() = target;
                hops += 1;
            }
        })
    }
}

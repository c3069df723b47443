// File: src/client/core.rs
use crate::client::redirect::{FollowRedirect, FollowRedirectLayer};
use crate::error::{FeedError, FeedResult};

use futures::future::join_all;
use http::{Request, Uri, header};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tower::ServiceExt;
use tower_layer::Layer;

type HttpsClient = FollowRedirect<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>;

const USER_AGENT: &str = concat!("ffcal/", env!("CARGO_PKG_VERSION"));

/// Downloads raw calendar windows over HTTP(S).
#[derive(Clone, Debug)]
pub struct FeedClient {
    http: HttpsClient,
    timeout: Duration,
}

impl FeedClient {
    pub fn new(timeout: Duration) -> Self {
        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() {
            log::warn!("No valid system certificates found; HTTPS windows will fail");
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        Self {
            http: FollowRedirectLayer::default().layer(http_client),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET one window. Non-2xx responses and timeouts are fetch errors.
    pub async fn fetch(&self, url: &str) -> FeedResult<String> {
        log::info!("Fetching calendar data from: {}", url);
        let uri: Uri = url.parse().map_err(|e| FeedError::fetch(url, e))?;
        let request = Request::get(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "text/calendar, */*")
            .body(String::new())
            .map_err(|e| FeedError::fetch(url, e))?;

        let http = self.http.clone();
        let download = async move {
            let response = http
                .oneshot(request)
                .await
                .map_err(|e| FeedError::fetch(url, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FeedError::fetch(url, format!("HTTP {}", status)));
            }

            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| FeedError::fetch(url, e))?
                .to_bytes();
            Ok(String::from_utf8_lossy(&body).into_owned())
        };

        let text = tokio::time::timeout(self.timeout, download)
            .await
            .map_err(|_| {
                FeedError::fetch(url, format!("timed out after {:?}", self.timeout))
            })??;

        log::info!("Successfully fetched {} characters", text.len());
        Ok(text)
    }

    /// Fetch all URLs concurrently. Results keep the order of `urls`.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<FeedResult<String>> {
        join_all(urls.iter().map(|url| self.fetch(url))).await
    }
}

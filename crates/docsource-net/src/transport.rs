//! The transport collaborator used for manifest and icon downloads.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use crate::error::Result;
use crate::http::HttpClient;

/// Fetches the body of a URL.
///
/// Implementations report any non-2xx status as
/// [`NetworkError::HttpStatus`](crate::NetworkError::HttpStatus). Timeouts
/// belong to the transport; nothing above it retries.
pub trait Transport: Send + Sync + 'static {
    /// Issue one GET and return the full response body.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Bytes>> + Send;
}

impl Transport for HttpClient {
    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        let response = self.get(url).await?.error_for_status_with_body().await?;
        response.bytes().await
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Bytes>> + Send {
        (**self).fetch(url)
    }
}

//! HTTP client for docsource.
//!
//! A thin layer over `reqwest` with docsource defaults (timeouts, redirect
//! limit, user agent) and errors mapped onto [`crate::NetworkError`].
//!
//! # Example
//!
//! ```ignore
//! use docsource_net::http::HttpClient;
//!
//! let client = HttpClient::new()?;
//! let url = "https://workingcopyapp.com/appInfo.json".parse()?;
//! let body = client.get(&url).await?.error_for_status_with_body().await?.bytes().await?;
//! println!("{} bytes", body.len());
//! ```

mod client;
mod response;

pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig};
pub use response::HttpResponse;

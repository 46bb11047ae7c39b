//! Logging facilities for docsource.
//!
//! docsource uses the `tracing` crate for instrumentation. No subscriber is
//! installed by the library; to see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("docsource=debug")
//!     .init();
//! ```
//!
//! The constants below name the targets and spans used throughout the
//! workspace so logs can be filtered per subsystem.

/// Span names used throughout docsource for tracing.
pub mod span_names {
    /// One icon resolution (manifest, selection, image fetch, decode).
    pub const RESOLVE: &str = "docsource::resolve";
    /// One manifest fetch.
    pub const MANIFEST_FETCH: &str = "docsource::manifest_fetch";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Extended attribute codec and store.
    pub const ATTRIBUTE: &str = "docsource::attribute";
    /// Manifest fetching and entry selection.
    pub const MANIFEST: &str = "docsource::manifest";
    /// On-disk icon cache.
    pub const CACHE: &str = "docsource::cache";
    /// Single-flight icon resolver.
    pub const RESOLVER: &str = "docsource::resolver";
}

//! Error definitions for the cookie store.
//!
//! Only contract violations and construction-time database failures surface as
//! errors. Durable-layer inconsistencies during normal save/load traffic are
//! logged and absorbed so a persistence glitch never breaks an in-flight HTTP
//! exchange.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CookieStoreError {
    /// The URL handed to the jar has no host component. This is a caller bug,
    /// not a runtime condition to recover from.
    #[error("URL has no host")]
    MissingHost,

    /// `load_all` was invoked a second time on the same database handle.
    #[error("cookie table already loaded")]
    AlreadyLoaded,

    /// SQLite failure while opening or bulk-loading the store.
    #[error("cookie database error: {0}")]
    Database(#[from] rusqlite::Error),
}

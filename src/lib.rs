//! # cookievault
//!
//! A persistent, RFC 6265 compliant HTTP cookie jar backed by SQLite.
//!
//! `cookievault` sits between an HTTP client and its cookie storage: the client
//! hands every received `Set-Cookie` to [`CookieJar::save_from_response`] and asks
//! [`CookieJar::load_for_request`] for the cookies to attach before sending.
//! The jar takes care of the subtle parts of RFC 6265:
//!
//! - **Public Suffix List validation** to prevent supercookie attacks
//!   (no cookies on `.com` or `.co.uk`)
//! - **Host-only vs. domain cookies** with proper domain suffix matching
//! - **Cookie identity** (`name` + `domain` + `path`) with replace-on-conflict
//! - **Lazy expiry eviction** interleaved with durable storage
//! - **SQLite persistence** so persistent cookies survive a process restart
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cookievault::repository::{CookieJar, CookieRepository};
//! use url::Url;
//!
//! let jar = CookieRepository::open("cookies.db")?;
//! let url = Url::parse("https://example.com/").unwrap();
//!
//! jar.save_set_cookie(&url, "session=abc123; Path=/; Secure; Max-Age=86400")?;
//! let cookies = jar.load_for_request(&url)?;
//! println!("sending {} cookies", cookies.len());
//! jar.close();
//! # Ok::<(), cookievault::error::CookieStoreError>(())
//! ```
//!
//! ## Modules
//!
//! - [`cookie`] - Cookie data model, identity, and `Set-Cookie` parsing
//! - [`set`] - Per-domain cookie collection with replace and lazy eviction
//! - [`db`] - SQLite persistence layer
//! - [`repository`] - The public cookie jar, wiring matching and storage together
//! - [`psl`] - Public Suffix List lookups
//! - [`error`] - Error definitions
//!
//! ## Concurrency
//!
//! [`CookieRepository`](repository::CookieRepository) is safe to share across the
//! worker threads of an HTTP client: a single coarse mutex makes every save/load
//! an atomic read-modify-write of the in-memory map and the database together.
//!
//! [`CookieJar::save_from_response`]: repository::CookieJar::save_from_response
//! [`CookieJar::load_for_request`]: repository::CookieJar::load_for_request

pub mod cookie;
pub mod db;
pub mod error;
pub mod psl;
pub mod repository;
pub mod set;

pub use cookie::{Cookie, CookieKey, SESSION_EXPIRY};
pub use error::CookieStoreError;
pub use repository::{CookieJar, CookieRepository};

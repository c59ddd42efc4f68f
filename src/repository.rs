//! The persistent cookie jar.
//!
//! [`CookieRepository`] implements the two-call contract of an HTTP client's
//! cookie jar: [`CookieJar::save_from_response`] after `Set-Cookie` headers
//! arrive and [`CookieJar::load_for_request`] before a request goes out. It
//! owns the domain-keyed in-memory map and the SQLite store, guarded together
//! by one coarse mutex so every operation is an atomic read-modify-write of
//! the pair. No operation blocks on anything slower than local storage, and
//! there are no background sweeps; expiry is discovered lazily on read.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use url::{Host, Url};

use crate::cookie::{domain_match, now_millis, Cookie};
use crate::db::CookieDatabase;
use crate::error::CookieStoreError;
use crate::psl;
use crate::set::CookieSet;

/// The save/load boundary of an HTTP client's cookie handling.
pub trait CookieJar {
    /// Store the cookies received on a response from `url`.
    fn save_from_response(&self, url: &Url, cookies: Vec<Cookie>) -> Result<(), CookieStoreError>;

    /// The cookies to attach to a request for `url`, ready for the caller to
    /// serialize into a `Cookie` header.
    fn load_for_request(&self, url: &Url) -> Result<Vec<Cookie>, CookieStoreError>;
}

/// A persistent [`CookieJar`] which stores cookies to a SQLite database.
pub struct CookieRepository {
    inner: Mutex<Inner>,
}

struct Inner {
    db: CookieDatabase,
    map: HashMap<String, CookieSet>,
}

impl CookieRepository {
    /// Open the jar over the database at `path`, bulk-loading every surviving
    /// persistent cookie into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CookieStoreError> {
        Self::from_db(CookieDatabase::open(path)?)
    }

    /// An in-memory jar; nothing survives [`close`](Self::close).
    pub fn open_in_memory() -> Result<Self, CookieStoreError> {
        Self::from_db(CookieDatabase::open_in_memory()?)
    }

    fn from_db(mut db: CookieDatabase) -> Result<Self, CookieStoreError> {
        let map = db.load_all(now_millis())?;
        Ok(Self {
            inner: Mutex::new(Inner { db, map }),
        })
    }

    /// Parse one raw `Set-Cookie` header value and store the result.
    /// Unparseable headers are logged and ignored, like browsers do.
    pub fn save_set_cookie(&self, url: &Url, header: &str) -> Result<(), CookieStoreError> {
        match Cookie::parse_set_cookie(url, header) {
            Some(cookie) => self.save_from_response(url, vec![cookie]),
            None => {
                tracing::debug!(header = %header, "ignored an unparseable Set-Cookie header");
                Ok(())
            }
        }
    }

    /// Remove every cookie, in memory and on disk.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.map.clear();
        inner.db.clear();
    }

    /// Number of cookies currently held in memory, across all domains.
    pub fn cookie_count(&self) -> usize {
        self.lock().map.values().map(CookieSet::len).sum()
    }

    /// Release the database handle. Consuming `self` makes any further call a
    /// compile error.
    pub fn close(self) {
        let inner = self
            .inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.db.close();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicked holder can't leave the map and db out of step with each
        // other in a way later operations would compound, so keep serving.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CookieJar for CookieRepository {
    fn save_from_response(&self, url: &Url, cookies: Vec<Cookie>) -> Result<(), CookieStoreError> {
        let (host, _) = request_host(url)?;
        let now = now_millis();
        let mut inner = self.lock();

        for cookie in cookies {
            // RFC 6265 Section 5.3 steps 5 and 6: a cookie whose domain is a
            // public suffix is only acceptable when the request host IS that
            // suffix, and then only as a host-only cookie. Anything else is
            // dropped silently; this is a security rule, not an error.
            let cookie = if psl::is_public_suffix(&cookie.domain) {
                if cookie.domain != host {
                    tracing::debug!(
                        domain = %cookie.domain,
                        host = %host,
                        "dropped a cookie set on a public suffix"
                    );
                    continue;
                }
                if cookie.host_only {
                    cookie
                } else {
                    cookie.into_host_only(&host)
                }
            } else {
                cookie
            };
            inner.add_cookie(cookie, now);
        }
        Ok(())
    }

    fn load_for_request(&self, url: &Url) -> Result<Vec<Cookie>, CookieStoreError> {
        let (host, host_is_ip) = request_host(url)?;
        let now = now_millis();
        let mut inner = self.lock();

        let mut accepted = Vec::new();
        let mut expired = Vec::new();
        for (domain, set) in inner.map.iter_mut() {
            if domain_match(&host, host_is_ip, domain) {
                let (mut a, mut e) = set.get(url, now);
                accepted.append(&mut a);
                expired.append(&mut e);
            }
        }

        for cookie in &expired {
            // Session cookies were never in the database.
            if cookie.persistent {
                inner.db.remove(cookie);
            }
        }

        // RFC 6265 Section 5.4 step 2: longer paths first. Creation times are
        // not stored, so ties keep arbitrary order.
        accepted.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Ok(accepted)
    }
}

impl Inner {
    /// The replace/expire/persist decision tree for one accepted cookie.
    fn add_cookie(&mut self, cookie: Cookie, now: i64) {
        let set = self.map.entry(cookie.domain.clone()).or_default();

        if cookie.is_expired(now) {
            // Servers delete a cookie by sending one that has already expired.
            if let Some(removed) = set.remove(&cookie) {
                if removed.persistent {
                    self.db.remove(&removed);
                }
            }
            return;
        }

        let previous = set.add(cookie.clone());
        match previous {
            Some(prev) if prev.persistent => {
                if cookie.persistent {
                    self.db.update(&prev, &cookie);
                } else {
                    // A persistent row overwritten by a session cookie is
                    // orphaned and must go.
                    self.db.remove(&prev);
                }
            }
            _ if cookie.persistent => self.db.add(&cookie),
            _ => {}
        }
    }
}

/// The request host, lowercased, plus whether it is an IP literal.
/// A URL without a host is a caller bug.
fn request_host(url: &Url) -> Result<(String, bool), CookieStoreError> {
    match url.host() {
        Some(Host::Domain(host)) => Ok((host.to_ascii_lowercase(), false)),
        Some(_) => match url.host_str() {
            Some(host) => Ok((host.to_string(), true)),
            None => Err(CookieStoreError::MissingHost),
        },
        None => Err(CookieStoreError::MissingHost),
    }
}

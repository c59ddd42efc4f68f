//! Per-domain cookie collection.
//!
//! A [`CookieSet`] holds every cookie registered under one domain string,
//! keyed by cookie identity. It is not synchronized; the owning repository
//! serializes all access under its own lock.

use std::collections::HashMap;

use url::Url;

use crate::cookie::{Cookie, CookieKey};

/// The cookies of exactly one registered domain, keyed by `(name, domain, path)`.
#[derive(Debug, Default)]
pub struct CookieSet {
    map: HashMap<CookieKey, Cookie>,
}

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `cookie`, replacing any occupant of the same identity slot.
    /// Returns the replaced cookie so the caller can decide between a durable
    /// insert and a durable update.
    pub fn add(&mut self, cookie: Cookie) -> Option<Cookie> {
        self.map.insert(cookie.key(), cookie)
    }

    /// Remove the cookie occupying `cookie`'s identity slot, if any.
    pub fn remove(&mut self, cookie: &Cookie) -> Option<Cookie> {
        self.map.remove(&cookie.key())
    }

    /// One pass over the set: entries expired at `now` are evicted and
    /// returned as the second list, live entries matching `url` (host-only,
    /// path, and secure-flag rules) are collected into the first.
    ///
    /// Expiry is only ever discovered here; there is no background sweep.
    pub fn get(&mut self, url: &Url, now: i64) -> (Vec<Cookie>, Vec<Cookie>) {
        let mut accepted = Vec::new();
        let mut expired = Vec::new();
        self.map.retain(|_, cookie| {
            if cookie.is_expired(now) {
                expired.push(cookie.clone());
                return false;
            }
            if cookie.matches(url) {
                accepted.push(cookie.clone());
            }
            true
        });
        (accepted, expired)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.map.values()
    }
}

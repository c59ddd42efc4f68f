//! Cookie data model and `Set-Cookie` parsing.
//!
//! [`Cookie`] carries the attribute set of one stored cookie; [`CookieKey`] is
//! the RFC 6265 identity triple (`name`, `domain`, `path`) that decides whether
//! two cookies occupy the same slot. Times are epoch milliseconds; a session
//! cookie carries the [`SESSION_EXPIRY`] sentinel and is never written to disk.

use time::OffsetDateTime;
use url::{Host, Url};

/// Expiry sentinel for session (non-persistent) cookies. A cookie with this
/// expiry lives until the process exits and never reaches the database.
pub const SESSION_EXPIRY: i64 = i64::MAX;

/// One HTTP cookie attribute set.
///
/// Invariant: `persistent == true` implies `expires_at` is a concrete
/// timestamp, never [`SESSION_EXPIRY`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Expiry as epoch milliseconds, or [`SESSION_EXPIRY`].
    pub expires_at: i64,
    pub secure: bool,
    pub http_only: bool,
    /// A host-only cookie matches only the exact host that set it.
    pub host_only: bool,
    /// True iff the cookie carries an explicit expiry and must survive restart.
    pub persistent: bool,
}

/// The `(name, domain, path)` identity of a cookie.
///
/// Storing a cookie with an equal key replaces the prior occupant of the slot.
/// Value, expiry, and the security flags are deliberately not part of identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookieKey {
    name: String,
    domain: String,
    path: String,
}

impl Cookie {
    /// The identity slot this cookie occupies.
    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    /// Rebuild this cookie as a host-only cookie for `host`, keeping every
    /// other attribute.
    pub fn into_host_only(self, host: &str) -> Cookie {
        Cookie {
            domain: host.to_string(),
            host_only: true,
            ..self
        }
    }

    /// Full matching against a request URL: domain (exact for host-only
    /// cookies, suffix rule otherwise), path prefix, and secure-vs-scheme.
    pub(crate) fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host_is_ip = matches!(url.host(), Some(Host::Ipv4(_) | Host::Ipv6(_)));
        let domain_ok = if self.host_only {
            host.eq_ignore_ascii_case(&self.domain)
        } else {
            domain_match(host, host_is_ip, &self.domain)
        };
        if !domain_ok {
            return false;
        }
        if self.secure && url.scheme() != "https" {
            return false;
        }
        path_matches(&self.path, url.path())
    }

    /// Parse one `Set-Cookie` header value received from `url`.
    ///
    /// Attribute handling follows RFC 6265 Section 5.2/5.3: a `Domain`
    /// attribute (leading dot stripped) makes a domain cookie and must
    /// domain-match the request host, no attribute makes a host-only cookie,
    /// `Max-Age` wins over `Expires`, and a missing or relative `Path` falls
    /// back to the default path of the URL. Returns None for anything
    /// unparseable or a domain the host is not allowed to set.
    pub fn parse_set_cookie(url: &Url, header: &str) -> Option<Cookie> {
        let parsed = cookie::Cookie::parse(header.trim()).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();
        let host_is_ip = matches!(url.host(), Some(Host::Ipv4(_) | Host::Ipv6(_)));
        let now = now_millis();

        let (domain, host_only) = match parsed.domain() {
            Some(d) => {
                let d = d.trim_start_matches('.').to_ascii_lowercase();
                if d.is_empty() || !domain_match(&host, host_is_ip, &d) {
                    return None;
                }
                (d, false)
            }
            None => (host, true),
        };

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => default_path(url),
        };

        // RFC 6265 Section 5.3 step 3: Max-Age takes precedence over Expires.
        let expires_at = if let Some(max_age) = parsed.max_age() {
            now.saturating_add(max_age.whole_seconds().saturating_mul(1000))
        } else if let Some(expires) = parsed.expires_datetime() {
            unix_millis(expires)
        } else {
            SESSION_EXPIRY
        };

        Some(Cookie {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            expires_at,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            host_only,
            persistent: expires_at != SESSION_EXPIRY,
        })
    }
}

/// RFC 6265 Section 5.1.4 default-path: the request path up to but not
/// including its last slash, or "/" for degenerate paths.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(i) if i > 0 => path[..i].to_string(),
        _ => "/".to_string(),
    }
}

/// RFC 6265 Section 5.1.4 path matching.
pub(crate) fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    if request_path.starts_with(cookie_path) {
        if cookie_path.ends_with('/') {
            return true;
        }
        return request_path.as_bytes().get(cookie_path.len()) == Some(&b'/');
    }
    false
}

/// RFC 6265 Section 5.1.3 domain matching: exact equality, or a dot-preceded
/// suffix of a host that is not an IP literal.
pub(crate) fn domain_match(host: &str, host_is_ip: bool, domain: &str) -> bool {
    if host == domain {
        return true; // As in 'example.com' matching 'example.com'.
    }
    if host_is_ip {
        return false; // An IP literal never matches a domain suffix.
    }
    host.len() > domain.len()
        && host.ends_with(domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

/// Current wall-clock time as epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    unix_millis(OffsetDateTime::now_utc())
}

pub(crate) fn unix_millis(time: OffsetDateTime) -> i64 {
    (time.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn key_ignores_value_and_flags() {
        let a = Cookie {
            name: "user".into(),
            value: "1".into(),
            domain: "example.com".into(),
            path: "/".into(),
            expires_at: 1000,
            secure: true,
            http_only: true,
            host_only: false,
            persistent: true,
        };
        let b = Cookie {
            value: "2".into(),
            expires_at: SESSION_EXPIRY,
            secure: false,
            http_only: false,
            persistent: false,
            ..a.clone()
        };
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn into_host_only_keeps_other_attributes() {
        let cookie = Cookie {
            name: "user".into(),
            value: "1".into(),
            domain: "com".into(),
            path: "/x".into(),
            expires_at: 1000,
            secure: true,
            http_only: true,
            host_only: false,
            persistent: true,
        };
        let rebuilt = cookie.clone().into_host_only("com");
        assert!(rebuilt.host_only);
        assert_eq!(rebuilt.domain, "com");
        assert_eq!(rebuilt.value, cookie.value);
        assert_eq!(rebuilt.expires_at, cookie.expires_at);
        assert!(rebuilt.secure);
    }

    #[test]
    fn path_matching() {
        assert!(path_matches("/", "/"));
        assert!(path_matches("/", "/foo"));
        assert!(path_matches("/foo", "/foo"));
        assert!(path_matches("/foo", "/foo/bar"));
        assert!(path_matches("/foo/", "/foo/bar"));
        assert!(!path_matches("/foo", "/foobar"));
        assert!(!path_matches("/foo/bar", "/foo"));
    }

    #[test]
    fn domain_matching() {
        assert!(domain_match("example.com", false, "example.com"));
        assert!(domain_match("www.example.com", false, "example.com"));
        assert!(!domain_match("notexample.com", false, "example.com"));
        assert!(!domain_match("example.com", false, "www.example.com"));
        // IP literals only ever match exactly.
        assert!(domain_match("192.168.1.1", true, "192.168.1.1"));
        assert!(!domain_match("192.168.1.1", true, "168.1.1"));
        assert!(!domain_match("192.168.1.1", true, "1"));
    }

    #[test]
    fn parse_host_only_cookie() {
        let c = Cookie::parse_set_cookie(&url("https://www.example.com/a/b"), "sid=42; Secure")
            .unwrap();
        assert_eq!(c.name, "sid");
        assert_eq!(c.value, "42");
        assert_eq!(c.domain, "www.example.com");
        assert!(c.host_only);
        assert!(c.secure);
        assert!(!c.persistent);
        assert_eq!(c.expires_at, SESSION_EXPIRY);
        // Default path: request path up to the last slash.
        assert_eq!(c.path, "/a");
    }

    #[test]
    fn parse_domain_cookie_strips_leading_dot() {
        let c = Cookie::parse_set_cookie(
            &url("https://www.example.com/"),
            "user=1; Domain=.example.com; Path=/",
        )
        .unwrap();
        assert_eq!(c.domain, "example.com");
        assert!(!c.host_only);
        assert_eq!(c.path, "/");
    }

    #[test]
    fn parse_rejects_foreign_domain() {
        assert!(Cookie::parse_set_cookie(
            &url("https://www.example.com/"),
            "user=1; Domain=other.com"
        )
        .is_none());
        // A parent may not be set from an unrelated sibling.
        assert!(Cookie::parse_set_cookie(
            &url("https://notexample.com/"),
            "user=1; Domain=example.com"
        )
        .is_none());
    }

    #[test]
    fn parse_max_age_wins_over_expires() {
        let before = now_millis();
        let c = Cookie::parse_set_cookie(
            &url("https://example.com/"),
            "a=b; Max-Age=60; Expires=Wed, 21 Oct 2015 07:28:00 GMT",
        )
        .unwrap();
        assert!(c.persistent);
        assert!(c.expires_at >= before + 60_000);
        assert!(c.expires_at <= now_millis() + 60_000);
    }

    #[test]
    fn parse_expires_attribute() {
        let c = Cookie::parse_set_cookie(
            &url("https://example.com/"),
            "a=b; Expires=Wed, 21 Oct 2015 07:28:00 GMT",
        )
        .unwrap();
        assert!(c.persistent);
        assert_eq!(c.expires_at, 1_445_412_480_000);
    }

    #[test]
    fn parse_negative_max_age_is_already_expired() {
        let c = Cookie::parse_set_cookie(&url("https://example.com/"), "a=b; Max-Age=-1").unwrap();
        assert!(c.is_expired(now_millis()));
    }

    #[test]
    fn parse_garbage_returns_none() {
        assert!(Cookie::parse_set_cookie(&url("https://example.com/"), "").is_none());
        assert!(Cookie::parse_set_cookie(&url("https://example.com/"), "no-equals-sign").is_none());
    }
}

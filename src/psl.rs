//! Public Suffix List (PSL) validation for cookie domain security.
//!
//! Prevents supercookie attacks by rejecting cookies set on public
//! suffixes like `.com`, `.co.uk`, etc.
//!
//! The lookup runs over three immutable tables built once from a bundled
//! snapshot of Mozilla's Public Suffix List (`public_suffix_list.dat`):
//! exact rules, wildcard rules (`*.ck`), and exception rules (`!www.ck`).
//! Refreshing the snapshot is a data update, not a code change.

use std::collections::HashSet;
use std::sync::LazyLock;

static SNAPSHOT: &str = include_str!("public_suffix_list.dat");

static LIST: LazyLock<PublicSuffixList> = LazyLock::new(|| PublicSuffixList::parse(SNAPSHOT));

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    LIST.is_public_suffix(domain)
}

/// Get the registrable domain (eTLD+1) for a domain.
/// For "sub.example.com", returns "example.com".
/// For "com" (a public suffix) or an unknown TLD, returns None.
pub fn registrable_domain(domain: &str) -> Option<String> {
    LIST.registrable_domain(domain)
}

/// The three rule tables of the Public Suffix List.
///
/// Immutable after construction, so unsynchronized concurrent reads are safe.
#[derive(Debug, Default)]
pub struct PublicSuffixList {
    exact: HashSet<String>,
    exceptions: HashSet<String>,
    wildcards: HashSet<String>,
}

impl PublicSuffixList {
    /// Parse rules in the standard PSL file format: one rule per line,
    /// `//` comments, `!` exception rules, `*.` wildcard rules.
    pub fn parse(data: &str) -> Self {
        let mut list = Self::default();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            // The upstream file ends rules at the first whitespace.
            let rule = line.split_whitespace().next().unwrap_or("");
            if let Some(exception) = rule.strip_prefix('!') {
                list.exceptions.insert(exception.to_ascii_lowercase());
            } else if let Some(parent) = rule.strip_prefix("*.") {
                list.wildcards.insert(parent.to_ascii_lowercase());
            } else {
                list.exact.insert(rule.to_ascii_lowercase());
            }
        }
        list
    }

    /// Check if `domain` is itself a public suffix.
    ///
    /// Exception rules override wildcard rules: `*.ck` makes `anything.ck` a
    /// public suffix, but `!www.ck` carves `www.ck` back out.
    pub fn is_public_suffix(&self, domain: &str) -> bool {
        if domain.is_empty() {
            return false;
        }
        let domain = domain.to_ascii_lowercase();
        if self.exact.contains(&domain) {
            return true;
        }
        if self.exceptions.contains(&domain) {
            return false;
        }
        match domain.split_once('.') {
            Some((_, remainder)) => self.wildcards.contains(remainder),
            None => false,
        }
    }

    /// Longest public suffix of `domain` plus one label, or None when the
    /// domain is itself a public suffix or no rule matches its suffixes.
    pub fn registrable_domain(&self, domain: &str) -> Option<String> {
        let domain = domain.to_ascii_lowercase();
        if domain.is_empty() || self.is_public_suffix(&domain) {
            return None;
        }
        // An exception rule names a registrable domain directly.
        if self.exceptions.contains(&domain) {
            return Some(domain);
        }

        let labels: Vec<&str> = domain.split('.').collect();
        for i in 1..labels.len() {
            let suffix = labels[i..].join(".");
            if self.exceptions.contains(&suffix) {
                return Some(suffix);
            }
            if self.is_public_suffix(&suffix) {
                return Some(labels[i - 1..].join("."));
            }
        }
        None
    }
}

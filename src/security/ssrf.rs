//! SSRF heuristic detection on inbound requests.
//!
//! # Responsibilities
//! - Decide whether a query string carries a URL-like parameter
//! - Block triggered queries containing denylisted substrings
//! - Block triggered queries carrying a private-range IPv4 literal
//! - Flag known high-risk paths for heightened logging
//!
//! # Design Decisions
//! - Pure and deterministic: same (path, query) always yields the same verdict
//! - Tables are lower-cased once at construction and never mutated
//! - Private-range check skips the gateway carve-out used by `origin::classify`
//! - A path match alone never blocks

use regex::Regex;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::SsrfConfig;
use crate::security::origin::{is_private_range, parse_dotted_quad};

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}").expect("dotted-quad pattern compiles")
});

/// Why a request was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockReason {
    #[error("SSRF attempt detected: suspicious URL pattern '{0}'")]
    SuspiciousPattern(String),

    #[error("SSRF attempt detected: private IP address {0}")]
    PrivateAddress(Ipv4Addr),
}

impl BlockReason {
    /// Machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            BlockReason::SuspiciousPattern(_) => "suspicious_url_pattern",
            BlockReason::PrivateAddress(_) => "private_ip_address",
        }
    }
}

/// Outcome of scanning one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    /// Let the request through; `high_risk` names the matching path fragment, if any.
    Allow { high_risk: Option<String> },
    Block(BlockReason),
}

impl ScanVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, ScanVerdict::Block(_))
    }
}

impl fmt::Display for ScanVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanVerdict::Allow { high_risk: None } => write!(f, "allow"),
            ScanVerdict::Allow { high_risk: Some(fragment) } => {
                write!(f, "allow (high-risk endpoint '{}')", fragment)
            }
            ScanVerdict::Block(reason) => write!(f, "block: {}", reason),
        }
    }
}

/// Screens path and query for SSRF-prone input.
#[derive(Debug, Clone)]
pub struct SsrfDetector {
    markers: Vec<String>,
    denylist: Vec<String>,
    high_risk_paths: Vec<String>,
}

impl SsrfDetector {
    pub fn new(config: &SsrfConfig) -> Self {
        let lower = |items: &[String]| items.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();
        Self {
            markers: lower(&config.parameter_markers),
            denylist: lower(&config.denylist),
            high_risk_paths: config.high_risk_paths.clone(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn denylist(&self) -> &[String] {
        &self.denylist
    }

    pub fn high_risk_paths(&self) -> &[String] {
        &self.high_risk_paths
    }

    /// Scan a request. `query` is the raw (still encoded) query string.
    pub fn scan(&self, path: &str, query: Option<&str>) -> ScanVerdict {
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            let decoded = decode_query(query).to_lowercase();

            if self.markers.iter().any(|m| decoded.contains(m.as_str())) {
                if let Some(pattern) = self.denylist.iter().find(|p| decoded.contains(p.as_str())) {
                    return ScanVerdict::Block(BlockReason::SuspiciousPattern(pattern.clone()));
                }

                if let Some(addr) = first_dotted_quad(&decoded) {
                    if is_private_range(addr) {
                        return ScanVerdict::Block(BlockReason::PrivateAddress(addr));
                    }
                }
            }
        }

        let high_risk = self
            .high_risk_paths
            .iter()
            .find(|fragment| path.contains(fragment.as_str()))
            .cloned();
        ScanVerdict::Allow { high_risk }
    }
}

/// Percent-decode a raw query. Invalid UTF-8 after decoding falls back to the raw text.
fn decode_query(query: &str) -> String {
    urlencoding::decode(query)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| query.to_string())
}

fn first_dotted_quad(text: &str) -> Option<Ipv4Addr> {
    DOTTED_QUAD
        .find(text)
        .and_then(|m| parse_dotted_quad(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> SsrfDetector {
        SsrfDetector::new(&SsrfConfig::default())
    }

    #[test]
    fn test_denylisted_host_is_blocked() {
        let verdict = detector().scan("/api/users/me/avatar", Some("image_url=http://localhost/x"));
        assert_eq!(
            verdict,
            ScanVerdict::Block(BlockReason::SuspiciousPattern("localhost".into()))
        );
    }

    #[test]
    fn test_public_url_is_allowed() {
        let verdict = detector().scan("/api/users/me/avatar", Some("image_url=http://example.com/x"));
        assert_eq!(verdict, ScanVerdict::Allow { high_risk: None });
    }

    #[test]
    fn test_private_literal_is_blocked_without_denylist_word() {
        let mut config = SsrfConfig::default();
        config.denylist.clear();
        let detector = SsrfDetector::new(&config);

        let verdict = detector.scan("/fetch", Some("url=http://192.168.1.5/x"));
        assert_eq!(
            verdict,
            ScanVerdict::Block(BlockReason::PrivateAddress(Ipv4Addr::new(192, 168, 1, 5)))
        );
    }

    #[test]
    fn test_link_local_literal_outside_denylist() {
        // 169.254.42.7 matches no denylist substring
        let verdict = detector().scan("/fetch", Some("url=http://169.254.42.7/latest"));
        assert_eq!(
            verdict,
            ScanVerdict::Block(BlockReason::PrivateAddress(Ipv4Addr::new(169, 254, 42, 7)))
        );
    }

    #[test]
    fn test_non_ascii_digits_do_not_hide_private_literal() {
        let mut config = SsrfConfig::default();
        config.denylist.clear();
        let detector = SsrfDetector::new(&config);

        // Arabic-Indic one, percent-encoded, shaped like a dotted quad
        let query = "v=%D9%A1.%D9%A1.%D9%A1.%D9%A1&url=http://169.254.1.2/";
        assert_eq!(
            detector.scan("/fetch", Some(query)),
            ScanVerdict::Block(BlockReason::PrivateAddress(Ipv4Addr::new(169, 254, 1, 2)))
        );
        assert_eq!(first_dotted_quad("\u{661}.\u{661}.\u{661}.\u{661}"), None);
    }

    #[test]
    fn test_gateway_suffix_still_blocks() {
        let mut config = SsrfConfig::default();
        config.denylist.clear();
        let verdict = SsrfDetector::new(&config).scan("/fetch", Some("url=http://192.168.1.1/"));
        assert!(verdict.is_blocked());
    }

    #[test]
    fn test_public_literal_is_allowed() {
        let verdict = detector().scan("/fetch", Some("url=http://93.184.216.34/"));
        assert!(!verdict.is_blocked());
    }

    #[test]
    fn test_no_marker_means_no_scan() {
        let verdict = detector().scan("/api/products", Some("q=localhost&host=10.0.0.1"));
        assert!(!verdict.is_blocked());
    }

    #[test]
    fn test_encoded_and_mixed_case_input() {
        let verdict = detector().scan("/fetch", Some("URL=http%3A%2F%2FLocalHost%3A8080%2Fadmin"));
        assert!(verdict.is_blocked());

        let verdict = detector().scan("/fetch", Some("callback=http%3a%2f%2f127.0.0.1"));
        assert_eq!(
            verdict,
            ScanVerdict::Block(BlockReason::SuspiciousPattern("127.0.0.1".into()))
        );
    }

    #[test]
    fn test_marker_with_empty_value() {
        // Triggered by `redirect=`; `internal` appears in another parameter
        let verdict = detector().scan("/login", Some("redirect=&next=internal"));
        assert!(verdict.is_blocked());
    }

    #[test]
    fn test_high_risk_path_is_flagged_not_blocked() {
        let verdict = detector().scan("/api/users/me/avatar/validate", None);
        assert_eq!(
            verdict,
            ScanVerdict::Allow { high_risk: Some("/avatar/validate".into()) }
        );
        assert!(!detector().scan("/api/products/1/share", Some("x=1")).is_blocked());
    }

    #[test]
    fn test_out_of_range_octets_do_not_block() {
        let mut config = SsrfConfig::default();
        config.denylist.clear();
        let verdict = SsrfDetector::new(&config).scan("/fetch", Some("url=http://999.168.1.5/"));
        assert!(!verdict.is_blocked());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let detector = detector();
        for query in ["url=http://10.1.2.3/", "image_url=https://cdn.example.org/a.png", ""] {
            assert_eq!(detector.scan("/p", Some(query)), detector.scan("/p", Some(query)));
        }
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(BlockReason::SuspiciousPattern("x".into()).code(), "suspicious_url_pattern");
        assert_eq!(
            BlockReason::PrivateAddress(Ipv4Addr::LOCALHOST).code(),
            "private_ip_address"
        );
    }
}

//! Feed source client with security measures.
//!
//! Fetches RSS/Atom documents over HTTP and normalizes them into
//! [`ParsedEntry`] values. URLs are checked against private and reserved
//! hosts, and response size and content length are bounded.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;
use thiserror::Error;

use super::types::ParsedEntry;
use crate::config::FetchConfig;

/// Errors raised while fetching or parsing a feed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL is malformed or points at a forbidden host.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success HTTP status.
    #[error("HTTP error: {0}")]
    Status(u16),

    /// The response exceeded the size cap.
    #[error("feed too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    /// The document could not be parsed as a feed.
    #[error("failed to parse feed: {0}")]
    Parse(String),

    /// The fetch did not complete in time.
    #[error("fetch timed out after {0}s")]
    Timeout(u64),
}

/// Something that can turn a feed URL into a sequence of entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<ParsedEntry>, FetchError>;
}

/// HTTP feed source backed by reqwest and feed-rs.
pub struct HttpFeedSource {
    client: Client,
    max_feed_size: u64,
    max_content_length: usize,
    allow_private_hosts: bool,
}

impl HttpFeedSource {
    /// Create a new source from fetch settings.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
            max_content_length: config.max_content_length,
            allow_private_hosts: config.allow_private_hosts,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<ParsedEntry>, FetchError> {
        validate_url(url, self.allow_private_hosts)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(FetchError::TooLarge {
                    size: content_length,
                    max: self.max_feed_size,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(format!("failed to read response: {}", e)))?;

        // Chunked responses carry no Content-Length.
        if bytes.len() as u64 > self.max_feed_size {
            return Err(FetchError::TooLarge {
                size: bytes.len() as u64,
                max: self.max_feed_size,
            });
        }

        parse_feed(&bytes, self.max_content_length)
    }
}

/// Validate a feed URL.
///
/// Only http and https are accepted. Unless `allow_private` is set, loopback,
/// private and reserved hosts are rejected.
pub fn validate_url(url: &str, allow_private: bool) -> Result<(), FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| FetchError::InvalidUrl("URL has no host".to_string()))?;

    if allow_private {
        return Ok(());
    }

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(FetchError::InvalidUrl(format!("forbidden host: {}", domain)));
            }
        }
        url::Host::Ipv4(ipv4) => check_ip(IpAddr::V4(ipv4))?,
        url::Host::Ipv6(ipv6) => check_ip(IpAddr::V6(ipv6))?,
    }

    Ok(())
}

fn check_ip(ip: IpAddr) -> Result<(), FetchError> {
    if is_private_ip(&ip) {
        return Err(FetchError::InvalidUrl(format!(
            "private IP address not allowed: {}",
            ip
        )));
    }
    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    const FORBIDDEN_SUFFIXES: [&str; 7] = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    let host = host.to_lowercase();
    host == "localhost" || FORBIDDEN_SUFFIXES.iter().any(|s| host.ends_with(s))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                || ipv4.is_documentation()
                // Carrier-grade NAT: 100.64.0.0/10
                || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            let segments = ipv6.segments();
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local: fc00::/7
                || (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Parse feed bytes into entries.
///
/// The entry link is the first `<link>`, falling back to an http(s) entry id.
/// Entries with neither keep an empty link so callers can count them.
/// Content prefers the full body over the summary and is truncated to
/// `max_content_length` characters.
pub fn parse_feed(bytes: &[u8], max_content_length: usize) -> Result<Vec<ParsedEntry>, FetchError> {
    let feed = parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .or_else(|| {
                    let id = entry.id.trim();
                    (id.starts_with("http://") || id.starts_with("https://"))
                        .then(|| id.to_string())
                })
                .unwrap_or_default();
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();
            let content = entry
                .content
                .and_then(|c| c.body)
                .or(entry.summary.map(|s| s.content))
                .unwrap_or_default();

            ParsedEntry {
                title,
                link,
                content: truncate_chars(&content, max_content_length),
                published_at: entry.published.or(entry.updated),
            }
        })
        .collect();

    Ok(entries)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_validate_url_valid() {
        assert!(validate_url("https://example.com/feed.xml", false).is_ok());
        assert!(validate_url("http://example.com/feed.xml", false).is_ok());
    }

    #[test]
    fn test_validate_url_invalid_scheme() {
        let result = validate_url("ftp://example.com/feed.xml", false);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unsupported URL scheme"));
    }

    #[test]
    fn test_validate_url_garbage() {
        assert!(matches!(
            validate_url("not a url", false),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_validate_url_forbidden_hosts() {
        for url in [
            "http://localhost/feed.xml",
            "http://server.local/feed.xml",
            "http://api.internal/feed.xml",
        ] {
            let err = validate_url(url, false).unwrap_err();
            assert!(err.to_string().contains("forbidden host"), "{}", url);
        }
    }

    #[test]
    fn test_validate_url_private_ips() {
        for url in [
            "http://127.0.0.1/feed.xml",
            "http://10.0.0.1/feed.xml",
            "http://172.16.0.1/feed.xml",
            "http://192.168.1.1/feed.xml",
            "http://169.254.1.1/feed.xml",
            "http://[::1]/feed.xml",
        ] {
            let err = validate_url(url, false).unwrap_err();
            assert!(err.to_string().contains("private IP"), "{}", url);
        }

        assert!(validate_url("http://172.32.0.1/feed.xml", false).is_ok());
    }

    #[test]
    fn test_validate_url_allow_private() {
        assert!(validate_url("http://127.0.0.1:8080/feed.xml", true).is_ok());
        assert!(validate_url("http://localhost/feed.xml", true).is_ok());
        // Scheme is still enforced.
        assert!(validate_url("file:///etc/passwd", true).is_err());
    }

    #[test]
    fn test_is_forbidden_hostname() {
        assert!(is_forbidden_hostname("localhost"));
        assert!(is_forbidden_hostname("LOCALHOST"));
        assert!(is_forbidden_hostname("api.localhost"));
        assert!(is_forbidden_hostname("corp.intranet"));

        assert!(!is_forbidden_hostname("example.com"));
        assert!(!is_forbidden_hostname("localhost.example.com"));
    }

    #[test]
    fn test_is_private_ip() {
        assert!(is_private_ip(&"127.255.255.255".parse().unwrap()));
        assert!(is_private_ip(&"172.31.255.255".parse().unwrap()));
        assert!(is_private_ip(&"100.64.0.1".parse().unwrap()));
        assert!(is_private_ip(&"192.0.2.1".parse().unwrap()));
        assert!(!is_private_ip(&"100.128.0.1".parse().unwrap()));
        assert!(!is_private_ip(&"8.8.8.8".parse().unwrap()));

        assert!(is_private_ip(&"::".parse().unwrap()));
        assert!(is_private_ip(&"fe80::1".parse().unwrap()));
        assert!(is_private_ip(&"fd00::1".parse().unwrap()));
        assert!(is_private_ip(&"::ffff:10.0.0.1".parse().unwrap()));
        assert!(!is_private_ip(&"2001:4860:4860::8888".parse().unwrap()));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("あいうえお", 2), "あい");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_parse_feed_rss() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    <description>A test feed</description>
    <item>
      <title>First Article</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
      <description>First body</description>
      <pubDate>Fri, 01 Mar 2024 12:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second Article</title>
      <link>https://example.com/2</link>
    </item>
  </channel>
</rss>"#;

        let entries = parse_feed(rss.as_bytes(), 10_000).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].title, "First Article");
        assert_eq!(entries[0].link, "https://example.com/1");
        assert_eq!(entries[0].content, "First body");
        assert_eq!(
            entries[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );

        assert_eq!(entries[1].link, "https://example.com/2");
        assert_eq!(entries[1].content, "");
        assert!(entries[1].published_at.is_none());
    }

    #[test]
    fn test_parse_feed_atom() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2024-03-02T00:00:00Z</updated>
  <entry>
    <title>Atom Entry</title>
    <link href="https://example.com/atom/1"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2024-03-02T08:30:00Z</updated>
    <summary>Short summary</summary>
    <content type="text">Full content</content>
  </entry>
</feed>"#;

        let entries = parse_feed(atom.as_bytes(), 10_000).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Atom Entry");
        assert_eq!(entries[0].link, "https://example.com/atom/1");
        assert_eq!(entries[0].content, "Full content");
        // Falls back to <updated> when <published> is absent.
        assert_eq!(
            entries[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_feed_link_from_guid() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
  <item><title>Permalink</title><guid>https://example.com/p/1</guid></item>
  <item><title>No link</title><guid isPermaLink="false">tag-123</guid></item>
</channel></rss>"#;

        let entries = parse_feed(rss.as_bytes(), 10_000).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].link, "https://example.com/p/1");
        assert_eq!(entries[1].link, "");
    }

    #[test]
    fn test_parse_feed_truncates_content() {
        let body = "x".repeat(50);
        let rss = format!(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
  <item><title>Long</title><link>https://example.com/l</link><description>{}</description></item>
</channel></rss>"#,
            body
        );

        let entries = parse_feed(rss.as_bytes(), 20).unwrap();
        assert_eq!(entries[0].content.chars().count(), 20);
    }

    #[test]
    fn test_parse_feed_invalid() {
        let result = parse_feed(b"this is not xml", 100);
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_http_feed_source_new() {
        assert!(HttpFeedSource::new(&FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_http_feed_source_rejects_private_before_request() {
        let source = HttpFeedSource::new(&FetchConfig::default()).unwrap();
        let result = source.fetch("http://127.0.0.1:1/feed.xml").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}

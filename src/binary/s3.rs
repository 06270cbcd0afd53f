//! S3 Repository
//!
//! Anonymous, read-only access to a public S3-compatible bucket over HTTPS.
//!
//! - List: `GET {endpoint}/?list-type=2&prefix={prefix}` (ListObjectsV2),
//!   following `NextContinuationToken` until the listing is complete
//! - Fetch: `GET {endpoint}/{key}`, body streamed to the caller

use std::io::Read;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use url::form_urlencoded;

use crate::binary::RemoteBinaryRepository;
use crate::error::{IkvError, Result};

static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<Key>([^<]*)</Key>").expect("key pattern is a valid regex"));

static TRUNCATED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<IsTruncated>\s*true\s*</IsTruncated>").expect("truncated pattern is a valid regex")
});

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<NextContinuationToken>([^<]*)</NextContinuationToken>")
        .expect("token pattern is a valid regex")
});

/// Repository over a public S3 bucket
#[derive(Debug, Clone)]
pub struct S3Repository {
    client: Client,
    endpoint: String,
    list_timeout: Duration,
}

impl S3Repository {
    pub const DEFAULT_BUCKET: &'static str = "ikv-binaries";
    pub const DEFAULT_REGION: &'static str = "us-west-2";

    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    const LIST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Virtual-hosted endpoint for `bucket` in `region`
    pub fn new(bucket: &str, region: &str) -> Result<Self> {
        Self::with_endpoint(format!("https://{}.s3.{}.amazonaws.com", bucket, region))
    }

    /// Bucket reachable at an explicit endpoint (mirrors, local S3 emulators)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        // No overall timeout: binaries are tens of MB and streamed.
        let client = Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .timeout(None)
            .build()
            .map_err(|e| IkvError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            list_timeout: Self::LIST_TIMEOUT,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn list_page(&self, prefix: &str, token: Option<&str>) -> Result<String> {
        let mut query = vec![("list-type", "2"), ("prefix", prefix)];
        if let Some(token) = token {
            query.push(("continuation-token", token));
        }

        let response = self
            .client
            .get(format!("{}/", self.endpoint))
            .query(&query)
            .timeout(self.list_timeout)
            .send()
            .map_err(|e| IkvError::Fetch(format!("cannot list {}: {}", prefix, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IkvError::Fetch(format!(
                "listing {} returned HTTP {}",
                prefix, status
            )));
        }

        response
            .text()
            .map_err(|e| IkvError::Fetch(format!("cannot read listing of {}: {}", prefix, e)))
    }
}

impl RemoteBinaryRepository for S3Repository {
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let body = self.list_page(prefix, token.as_deref())?;
            keys.extend(parse_listing_keys(&body));

            if !TRUNCATED_PATTERN.is_match(&body) {
                break;
            }
            match TOKEN_PATTERN.captures(&body) {
                Some(captures) => token = Some(unescape_xml(&captures[1])),
                None => break,
            }
        }

        tracing::debug!("Listed {} object(s) under {}", keys.len(), prefix);
        Ok(keys)
    }

    fn fetch(&self, key: &str) -> Result<Box<dyn Read + Send>> {
        let response = self
            .client
            .get(format!("{}/{}", self.endpoint, encode_key(key)))
            .send()
            .map_err(|e| IkvError::Fetch(format!("cannot fetch {}: {}", key, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IkvError::Fetch(format!("fetching {} returned HTTP {}", key, status)));
        }

        Ok(Box::new(response))
    }
}

/// Object keys in a ListObjectsV2 response body
pub(crate) fn parse_listing_keys(body: &str) -> Vec<String> {
    KEY_PATTERN
        .captures_iter(body)
        .map(|captures| unescape_xml(&captures[1]))
        .filter(|key| !key.is_empty())
        .collect()
}

/// Percent-encode each `/`-separated segment of an object key
///
/// `+` becomes `%2B`; S3 would otherwise read it as a space in the path.
pub(crate) fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| {
            form_urlencoded::byte_serialize(segment.as_bytes())
                .collect::<String>()
                .replace('+', "%20")
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

//! PyPI JSON API client with retry, cancellation, and fan-out search.
//!
//! Every HTTP call goes through the same retry policy: transient statuses
//! and transport failures are retried with multiplicative backoff, anything
//! else returns immediately. A [`CancelToken`] is observed at every wait and
//! dispatch point so a shutdown aborts in-flight work promptly.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::DEFAULT_MIRROR;
use crate::state::{PackageDetail, SearchHit};
use crate::util::compare_versions;

/// Maximum retry attempts after the initial request.
pub const MAX_RETRIES: u32 = 3;
/// Delay before the first retry.
pub const RETRY_DELAY_MS: u64 = 100;
/// Multiplier applied to the delay on each further retry.
pub const BACKOFF_MULTIPLIER: f64 = 2.0;
/// Result cap for a search, across exact match and variations.
pub const MAX_SEARCH_RESULTS: usize = 10;
/// Cap on the assembled version list.
pub const MAX_DISPLAY_VERSIONS: usize = 20;
/// Character budget for the license field before truncation.
pub const MAX_LICENSE_LEN: usize = 40;

/// Per-request timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Statuses eligible for the retry policy.
const RETRYABLE_STATUSES: [u16; 5] = [500, 502, 503, 504, 429];

/// Outcome of an index request that did not produce a usable response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The external cancellation signal fired.
    #[error("request cancelled")]
    Cancelled,
    /// The index answered with a non-success status.
    #[error("index returned status {0}")]
    Status(u16),
    /// Connection, TLS, timeout, or body-read failure.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Cancellation signal shared by a request tree. Cloneable; all clones
/// observe the same source.
#[derive(Debug, Clone)]
pub struct CancelToken {
    /// Watched flag; `true` once cancelled.
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a cancellation source and its token. Sending `true` on the
    /// returned sender cancels every clone of the token.
    #[must_use]
    pub fn pair() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// A token that can never be cancelled (the source is dropped
    /// immediately).
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is signalled. Pends forever when the source
    /// is gone without having fired.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// `info` object of the index's package JSON. Fields the index reports as
/// `null` deserialize as `None`.
#[derive(Debug, Deserialize)]
struct IndexInfo {
    /// Canonical package name.
    name: String,
    /// Latest released version.
    version: String,
    /// One-line summary.
    #[serde(default)]
    summary: Option<String>,
    /// Author string.
    #[serde(default)]
    author: Option<String>,
    /// License text.
    #[serde(default)]
    license: Option<String>,
    /// Homepage URL.
    #[serde(default)]
    home_page: Option<String>,
    /// Python requirement string.
    #[serde(default)]
    requires_python: Option<String>,
}

/// Top-level package JSON: metadata plus the map of release identifiers.
#[derive(Debug, Deserialize)]
struct IndexResponse {
    /// Package metadata.
    info: IndexInfo,
    /// Release identifier to opaque file list.
    #[serde(default)]
    releases: HashMap<String, serde_json::Value>,
}

/// A PyPI API client bound to one base URL.
#[derive(Debug, Clone)]
pub struct Client {
    /// Index base URL without trailing slash.
    base_url: String,
    /// Shared connection pool.
    http: reqwest::Client,
}

impl Client {
    /// Create a client for `base_url` (empty selects the default index). A
    /// trailing slash is trimmed.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let base = if base_url.is_empty() { DEFAULT_MIRROR } else { base_url };
        Self {
            base_url: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("HTTP client construction"),
        }
    }

    /// The resolved base URL (for diagnostics).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// JSON endpoint for a package name.
    fn package_url(&self, name: &str) -> String {
        format!("{}/pypi/{name}/json", self.base_url)
    }

    /// Issue a GET with the retry policy applied.
    ///
    /// Sleeps `RETRY_DELAY_MS * BACKOFF_MULTIPLIER^(attempt-1)` before each
    /// retry (never before the first attempt). Only transport errors and
    /// [`RETRYABLE_STATUSES`] retry; any other status is returned to the
    /// caller as a response, successful or not. Exhaustion surfaces the last
    /// error.
    async fn get_with_retry(
        &self,
        url: &str,
        cancel: &CancelToken,
    ) -> Result<reqwest::Response, FetchError> {
        let mut last_err: Option<FetchError> = None;
        for attempt in 0..=MAX_RETRIES {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            if attempt > 0 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let backoff = {
                    let exp = i32::try_from(attempt).unwrap_or(i32::MAX) - 1;
                    let ms = (RETRY_DELAY_MS as f64) * BACKOFF_MULTIPLIER.powi(exp);
                    Duration::from_millis(ms as u64)
                };
                debug!(attempt = attempt + 1, backoff_ms = backoff.as_millis() as u64, url, "retrying index request");
                tokio::select! {
                    () = cancel.cancelled() => return Err(FetchError::Cancelled),
                    () = tokio::time::sleep(backoff) => {}
                }
            }

            let sent = tokio::select! {
                () = cancel.cancelled() => return Err(FetchError::Cancelled),
                r = self.http.get(url).send() => r,
            };
            match sent {
                Err(e) => {
                    warn!(error = %e, url, "index request failed");
                    last_err = Some(e.into());
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    debug!(status, url, "index response received");
                    if resp.status().is_success() {
                        return Ok(resp);
                    }
                    if !RETRYABLE_STATUSES.contains(&status) {
                        warn!(status, url, "index returned non-retryable status");
                        return Ok(resp);
                    }
                    warn!(status, url, "index returned retryable status");
                    last_err = Some(FetchError::Status(status));
                }
            }
        }
        warn!(url, "index request exhausted retries");
        Err(last_err.unwrap_or(FetchError::Status(0)))
    }

    /// Fetch and decode a package's JSON document. `Ok(None)` on 404.
    async fn get_index_response(
        &self,
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Option<IndexResponse>, FetchError> {
        let url = self.package_url(name);
        let resp = self.get_with_retry(&url, cancel).await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let parsed = resp.json::<IndexResponse>().await?;
        Ok(Some(parsed))
    }

    /// Fetch summary info for a single package. `Ok(None)` means the index
    /// does not know the name.
    ///
    /// # Errors
    /// Transport failure after retries, unexpected status, malformed JSON,
    /// or cancellation.
    pub async fn get_package(
        &self,
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Option<SearchHit>, FetchError> {
        let Some(raw) = self.get_index_response(name, cancel).await? else {
            return Ok(None);
        };
        Ok(Some(SearchHit {
            name: raw.info.name,
            version: raw.info.version,
            summary: raw.info.summary.unwrap_or_default(),
        }))
    }

    /// Fetch full detail for a package, including its selectable version
    /// list. `Ok(None)` means the index does not know the name.
    ///
    /// # Errors
    /// Transport failure after retries, unexpected status, malformed JSON,
    /// or cancellation.
    pub async fn get_package_detail(
        &self,
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Option<PackageDetail>, FetchError> {
        let Some(raw) = self.get_index_response(name, cancel).await? else {
            return Ok(None);
        };
        Ok(Some(assemble_detail(raw)))
    }

    /// Search the index for `query`.
    ///
    /// The query is trimmed and lowercased; an empty query returns no
    /// results without any network call. The exact name is looked up first,
    /// then a fixed set of name variations is fetched concurrently. Results
    /// are deduplicated by case-insensitive name; collection stops at
    /// [`MAX_SEARCH_RESULTS`], dropping any variation requests still in
    /// flight.
    ///
    /// # Errors
    /// Only cancellation aborts a search; individual lookup failures are
    /// logged and skipped.
    pub async fn search(
        &self,
        query: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<SearchHit>, FetchError> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<SearchHit> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        match self.get_package(&query, cancel).await {
            Ok(Some(hit)) => {
                seen.insert(hit.name.to_lowercase());
                results.push(hit);
            }
            Ok(None) => {}
            Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
            Err(e) => debug!(query = %query, error = %e, "exact lookup failed"),
        }
        if results.len() >= MAX_SEARCH_RESULTS {
            return Ok(results);
        }

        let variations = [
            format!("python-{query}"),
            format!("py{query}"),
            format!("{query}-python"),
            format!("{query}lib"),
            format!("{query}-py"),
        ];
        let mut pending: FuturesUnordered<_> = variations
            .into_iter()
            .filter(|v| !seen.contains(v))
            .map(|v| async move { self.get_package(&v, cancel).await })
            .collect();

        while let Some(outcome) = pending.next().await {
            match outcome {
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(e) => debug!(error = %e, "variation lookup failed"),
                Ok(None) => {}
                Ok(Some(hit)) => {
                    if seen.insert(hit.name.to_lowercase()) {
                        results.push(hit);
                    }
                    if results.len() >= MAX_SEARCH_RESULTS {
                        // Earliest sufficient result set wins; outstanding
                        // requests are dropped with `pending`.
                        break;
                    }
                }
            }
        }
        Ok(results)
    }
}

/// Pre-release marker adjacent to a boundary (start, digit, separator). A
/// plain substring match is not enough: names like `black` or segments like
/// `post` inside a word must not be mistaken for markers.
static PRE_RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[.\-_\d])(a|alpha|b|beta|rc|dev|post)(\d|$|[.\-_])")
        .expect("static pre-release pattern")
});

/// Whether a release identifier looks like a stable version.
#[must_use]
pub fn is_stable_version(version: &str) -> bool {
    !PRE_RELEASE.is_match(&version.to_lowercase())
}

/// Assemble the display detail from a raw index document: filter the release
/// keys to stable versions, sort newest first, cap the list, and truncate an
/// overlong license.
fn assemble_detail(raw: IndexResponse) -> PackageDetail {
    let mut versions: Vec<String> = raw
        .releases
        .into_keys()
        .filter(|v| is_stable_version(v))
        .collect();
    versions.sort_by(|a, b| compare_versions(b, a));
    versions.truncate(MAX_DISPLAY_VERSIONS);

    let mut license = raw.info.license.unwrap_or_default();
    if license.chars().count() > MAX_LICENSE_LEN {
        license = license.chars().take(MAX_LICENSE_LEN).collect();
        license.push('…');
    }

    PackageDetail {
        name: raw.info.name,
        version: raw.info.version,
        summary: raw.info.summary.unwrap_or_default(),
        author: raw.info.author.unwrap_or_default(),
        license,
        home_page: raw.info.home_page.unwrap_or_default(),
        requires_python: raw.info.requires_python.unwrap_or_default(),
        versions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What: Base URL normalization defaults and trims.
    #[test]
    fn client_base_url_normalization() {
        assert_eq!(Client::new("").base_url(), "https://pypi.org");
        assert_eq!(Client::new("https://pypi.org/").base_url(), "https://pypi.org");
        assert_eq!(
            Client::new("https://mirror.example.com").base_url(),
            "https://mirror.example.com"
        );
    }

    /// What: Stability check matches markers only at boundaries.
    #[test]
    fn stable_version_detection() {
        for v in ["1.0.0", "2.5.1", "3.0.0", "1.0", "10.2.5"] {
            assert!(is_stable_version(v), "{v} should be stable");
        }
        for v in [
            "1.0.0a1", "1.0.0alpha", "1.0.0b2", "1.0.0beta1", "1.0.0rc1", "1.0.0dev",
            "1.0.0post1", "2.0.0.dev0",
        ] {
            assert!(!is_stable_version(v), "{v} should be pre-release");
        }
    }

    /// What: Detail assembly filters pre-releases, sorts descending, and
    /// truncates the license.
    #[test]
    fn detail_assembly() {
        let raw: IndexResponse = serde_json::from_str(
            r#"{
                "info": {
                    "name": "flask",
                    "version": "3.0.0",
                    "summary": "A simple web framework",
                    "author": "Armin Ronacher",
                    "license": "BSD-3-Clause",
                    "home_page": "https://flask.palletsprojects.com/",
                    "requires_python": ">=3.8"
                },
                "releases": {
                    "1.0.0": [], "2.0.0": [], "2.0.1": [], "3.0.0": [], "3.0.0rc1": []
                }
            }"#,
        )
        .expect("valid fixture");
        let detail = assemble_detail(raw);
        assert_eq!(detail.versions, ["3.0.0", "2.0.1", "2.0.0", "1.0.0"]);
        assert_eq!(detail.requires_python, ">=3.8");
        assert_eq!(detail.license, "BSD-3-Clause");
    }

    /// What: Version lists cap at the display limit and null metadata fields
    /// become empty strings.
    #[test]
    fn detail_assembly_caps_and_nulls() {
        let releases: Vec<String> = (0..30).map(|i| format!("\"1.{i}.0\": []")).collect();
        let json = format!(
            r#"{{"info": {{"name": "big", "version": "1.29.0", "summary": null, "license": null}},
                "releases": {{{}}}}}"#,
            releases.join(",")
        );
        let raw: IndexResponse = serde_json::from_str(&json).expect("valid fixture");
        let detail = assemble_detail(raw);
        assert_eq!(detail.versions.len(), MAX_DISPLAY_VERSIONS);
        assert_eq!(detail.versions[0], "1.29.0");
        assert!(detail.summary.is_empty());
        assert!(detail.license.is_empty());
    }

    /// What: An overlong license is cut at the character budget with an
    /// ellipsis marker.
    #[test]
    fn detail_assembly_truncates_license() {
        let long = "X".repeat(120);
        let json = format!(
            r#"{{"info": {{"name": "l", "version": "1.0.0", "summary": "s", "license": "{long}"}},
                "releases": {{}}}}"#
        );
        let raw: IndexResponse = serde_json::from_str(&json).expect("valid fixture");
        let detail = assemble_detail(raw);
        assert_eq!(detail.license.chars().count(), MAX_LICENSE_LEN + 1);
        assert!(detail.license.ends_with('…'));
    }

    /// What: A never-token is not cancelled; a fired pair is.
    #[tokio::test]
    async fn cancel_token_state() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());

        let (tx, token) = CancelToken::pair();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        tx.send(true).expect("receiver alive");
        assert!(clone.is_cancelled());
        clone.cancelled().await;
    }
}

// src/ingest/providers/mod.rs
pub mod alpha_vantage;
pub mod news_api;
pub mod reddit;

use metrics::counter;

use crate::error::FetchError;
use crate::ingest::types::{FetchQuery, RawItem};

/// A news source without listings: one query per window.
#[async_trait::async_trait]
pub trait NewsBackend: Send + Sync {
    async fn articles(&self, query: &FetchQuery) -> Result<Vec<RawItem>, FetchError>;
    fn name(&self) -> &'static str;
}

/// Turn a send result into a body, mapping transport errors and non-2xx
/// statuses to `SourceUnavailable`.
pub(crate) async fn read_body(
    provider: &'static str,
    sent: reqwest::Result<reqwest::Response>,
) -> Result<String, FetchError> {
    let resp = sent.map_err(|e| FetchError::unavailable(provider, format!("http: {e}")))?;
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| FetchError::unavailable(provider, format!("reading body: {e}")))?;
    if !status.is_success() {
        let snippet: String = body.chars().take(200).collect();
        return Err(FetchError::unavailable(
            provider,
            format!("status {status}: {snippet}"),
        ));
    }
    Ok(body)
}

/// Skip one unparseable item without failing its batch.
pub(crate) fn skip_malformed(provider: &'static str, reason: &str) {
    tracing::debug!(target: "ingest", provider, reason, "skipping malformed item");
    counter!("ingest_malformed_total", "source" => provider).increment(1);
}

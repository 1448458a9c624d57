//! The delivery client: a cancellable poll loop over one URL.
//!
//! ```text
//! Requesting ──2xx──────────────▶ Succeeded
//!     │  ▲
//!     │  └──backoff── Intermediate ──budget spent──▶ TimedOut
//!     ├──2xx + marker─────▲
//!     └──non-2xx─────────────────▶ Failed (negatively cached)
//! ```
//!
//! Every attempt re-issues the identical URL so the CDN's own cache absorbs
//! the polling instead of re-triggering the computation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, info, warn};

use super::outcome::{DeliveredAsset, DeliveryOutcome};
use super::policy::PollPolicy;
use super::transport::{FetchRequest, FetchResponse, HttpTransport, ReqwestTransport};
use super::url::{UrlBuilder, append_query_param};
use crate::compiler::{CompileOptions, encode};
use crate::config::DeliveryConfig;
use crate::error::{DeliveryError, TransformError};
use crate::params::TransformationChain;
use crate::utils::cancel::CancelHandle;

const TARGET: &str = "imagekit_transform::delivery";

/// Stand-in deadline for budgets too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// One logical fetch: an asset, the compiled wire string and the poll budget.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRequest {
    pub asset_path: String,
    pub wire: String,
    pub policy: PollPolicy,
    /// Cache-busting token; changes the URL and therefore the cache key.
    pub force_refresh: Option<String>,
}

impl DeliveryRequest {
    pub fn new(asset_path: impl Into<String>, wire: impl Into<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            wire: wire.into(),
            policy: PollPolicy::default(),
            force_refresh: None,
        }
    }

    /// Compile `chain` and wrap it in a request.
    pub fn compile(
        asset_path: impl Into<String>,
        chain: &TransformationChain,
        options: CompileOptions,
    ) -> Result<Self, TransformError> {
        Ok(Self::new(asset_path, encode(chain, options)?))
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ask the CDN to regenerate by requesting a URL it has not cached.
    pub fn with_force_refresh(mut self, token: impl Into<String>) -> Self {
        self.force_refresh = Some(token.into());
        self
    }

    /// [`with_force_refresh`](Self::with_force_refresh) with a random token.
    pub fn with_fresh_token(self) -> Self {
        self.with_force_refresh(uuid::Uuid::new_v4().to_string())
    }
}

enum PollState {
    Requesting,
    Intermediate,
    Succeeded(DeliveredAsset),
    Failed(DeliveryError),
    TimedOut,
}

/// Delivery client. Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct DeliveryClient {
    transport: Arc<dyn HttpTransport>,
    config: Arc<DeliveryConfig>,
    urls: UrlBuilder,
}

impl DeliveryClient {
    /// Client backed by [`ReqwestTransport`].
    pub fn new(config: DeliveryConfig) -> Result<Self, DeliveryError> {
        let transport = ReqwestTransport::from_config(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: DeliveryConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, DeliveryError> {
        config.validate()?;
        Ok(Self {
            transport,
            urls: UrlBuilder::from_config(&config),
            config: Arc::new(config),
        })
    }

    /// Build from `IMAGEKIT_URL_ENDPOINT` / `IMAGEKIT_INTERMEDIATE_HEADER`.
    pub fn from_env() -> Result<Self, DeliveryError> {
        Self::new(DeliveryConfig::from_env()?)
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    /// The URL every attempt of `request` will hit.
    pub fn url_for(&self, request: &DeliveryRequest) -> Result<String, DeliveryError> {
        let url = self.urls.build(&request.asset_path, &request.wire)?;
        Ok(match &request.force_refresh {
            Some(token) => append_query_param(&url, &self.config.cache_bust_param, token),
            None => url,
        })
    }

    pub async fn deliver(&self, request: DeliveryRequest) -> DeliveryOutcome {
        self.run(request, None).await
    }

    /// Like [`deliver`](Self::deliver), aborting at the next suspension point
    /// once `cancel` fires.
    pub async fn deliver_with_cancel(
        &self,
        request: DeliveryRequest,
        cancel: &CancelHandle,
    ) -> DeliveryOutcome {
        self.run(request, Some(cancel)).await
    }

    /// Run independent fetches concurrently; outcomes keep the input order.
    pub async fn deliver_many<I>(&self, requests: I) -> Vec<DeliveryOutcome>
    where
        I: IntoIterator<Item = DeliveryRequest>,
    {
        futures::future::join_all(requests.into_iter().map(|r| self.deliver(r))).await
    }

    async fn run(&self, request: DeliveryRequest, cancel: Option<&CancelHandle>) -> DeliveryOutcome {
        let result = match self.url_for(&request) {
            Ok(url) => match request.policy.validate() {
                Ok(()) => self.poll(url, &request.policy, cancel).await,
                Err(reason) => Err(DeliveryError::InvalidRequest(reason)),
            },
            Err(e) => Err(e),
        };

        match &result {
            Ok(asset) => info!(
                target: TARGET,
                url = %asset.url,
                attempts = asset.attempts,
                bytes = asset.len(),
                "asset delivered"
            ),
            Err(e) => warn!(
                target: TARGET,
                asset = %request.asset_path,
                wire = %request.wire,
                err = %e,
                "delivery failed"
            ),
        }
        result.into()
    }

    async fn poll(
        &self,
        url: String,
        policy: &PollPolicy,
        cancel: Option<&CancelHandle>,
    ) -> Result<DeliveredAsset, DeliveryError> {
        let started = Instant::now();
        let deadline = started
            .checked_add(policy.time_budget)
            .or_else(|| started.checked_add(FAR_FUTURE))
            .unwrap_or(started);
        let mut attempts: u32 = 0;
        let mut state = PollState::Requesting;

        loop {
            state = match state {
                PollState::Requesting => {
                    if cancel.is_some_and(CancelHandle::is_cancelled) {
                        return Err(DeliveryError::Cancelled);
                    }
                    attempts += 1;
                    debug!(target: TARGET, %url, attempt = attempts, "requesting");

                    let fetch = self.transport.fetch(FetchRequest {
                        url: url.clone(),
                        attempt: attempts,
                    });
                    tokio::select! {
                        biased;
                        _ = wait_cancelled(cancel) => return Err(DeliveryError::Cancelled),
                        response = timeout_at(deadline, fetch) => match response {
                            Ok(response) => self.classify(&url, response?, attempts),
                            Err(_) => PollState::TimedOut,
                        },
                    }
                }
                PollState::Intermediate => {
                    if attempts >= policy.max_attempts {
                        debug!(target: TARGET, %url, attempts, "attempt budget spent");
                        PollState::TimedOut
                    } else {
                        let delay = policy.delay_for(attempts - 1);
                        let wake = Instant::now().checked_add(delay).filter(|w| *w < deadline);
                        if let Some(wake) = wake {
                            debug!(target: TARGET, %url, attempts, ?delay, "still processing, backing off");
                            tokio::select! {
                                biased;
                                _ = wait_cancelled(cancel) => return Err(DeliveryError::Cancelled),
                                _ = sleep_until(wake) => PollState::Requesting,
                            }
                        } else {
                            debug!(target: TARGET, %url, attempts, ?delay, "time budget spent");
                            PollState::TimedOut
                        }
                    }
                }
                PollState::Succeeded(asset) => return Ok(asset),
                PollState::Failed(error) => return Err(error),
                PollState::TimedOut => {
                    return Err(DeliveryError::StillProcessingTimeout {
                        attempts,
                        elapsed: started.elapsed(),
                    });
                }
            };
        }
    }

    fn classify(&self, url: &str, response: FetchResponse, attempts: u32) -> PollState {
        if !response.is_success() {
            let retry_after = response
                .header(RETRY_AFTER.as_str())
                .and_then(|v| parse_retry_after(v, Utc::now()))
                .unwrap_or(self.config.negative_cache_ttl);
            let message = reqwest::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("upstream error")
                .to_string();
            return PollState::Failed(DeliveryError::UpstreamFailure {
                status: response.status,
                retry_after,
                message,
            });
        }

        let intermediate = response
            .header(&self.config.intermediate_header)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(&self.config.intermediate_value));
        if intermediate {
            return PollState::Intermediate;
        }

        let content_type = response
            .header(CONTENT_TYPE.as_str())
            .map(str::to_string)
            .or_else(|| infer::get(&response.body).map(|t| t.mime_type().to_string()));
        PollState::Succeeded(DeliveredAsset {
            url: url.to_string(),
            status: response.status,
            content_type,
            body: response.body,
            attempts,
        })
    }
}

async fn wait_cancelled(cancel: Option<&CancelHandle>) {
    match cancel {
        Some(handle) => handle.cancelled().await,
        None => std::future::pending().await,
    }
}

/// `Retry-After` as delta-seconds or an HTTP date relative to `now`.
pub(crate) fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

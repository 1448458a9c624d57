//! Async delivery of compiled transformations.
//!
//! AI operations are computed lazily by the CDN. The first request for a new
//! wire string usually gets a placeholder response flagged as intermediate;
//! [`DeliveryClient`] keeps re-requesting the identical URL under a
//! [`PollPolicy`] until the final asset, a negatively cached failure, the
//! budget or a cancellation ends the fetch.

pub mod client;
pub mod interceptor;
pub mod outcome;
pub mod policy;
pub mod transport;
pub mod url;

pub use client::{DeliveryClient, DeliveryRequest};
pub use interceptor::{HeaderInterceptor, HttpInterceptor, LoggingInterceptor, RequestContext};
pub use outcome::{DeliveredAsset, DeliveryOutcome};
pub use policy::{Backoff, PollPolicy};
pub use transport::{FetchRequest, FetchResponse, HttpTransport, ReqwestTransport};
pub use url::{UrlBuilder, append_query_param};

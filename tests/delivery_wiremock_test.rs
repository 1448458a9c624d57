//! End-to-end delivery against a mock CDN.
//!
//! Exercises the reqwest transport, interceptors and the poll loop together.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use imagekit_transform::delivery::{
    HeaderInterceptor, HttpInterceptor, LoggingInterceptor, ReqwestTransport,
};
use imagekit_transform::prelude::*;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

/// Answers with a processing placeholder `pending` times, then the final image.
struct ProcessingThenDone {
    calls: AtomicUsize,
    pending: usize,
}

impl ProcessingThenDone {
    fn new(pending: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            pending,
        }
    }
}

impl Respond for ProcessingThenDone {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.pending {
            ResponseTemplate::new(200)
                .insert_header("is-intermediate-response", "true")
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"placeholder".to_vec())
        } else {
            ResponseTemplate::new(200).set_body_bytes(PNG.to_vec())
        }
    }
}

fn fast_policy() -> PollPolicy {
    PollPolicy::fixed(Duration::from_millis(10)).with_time_budget(Duration::from_secs(5))
}

fn client_for(server: &MockServer, interceptors: Vec<Arc<dyn HttpInterceptor>>) -> DeliveryClient {
    let config = DeliveryConfig::new(format!("{}/demo", server.uri()));
    let transport = ReqwestTransport::from_config(&config)
        .expect("client builds")
        .with_interceptors(interceptors);
    DeliveryClient::with_transport(config, Arc::new(transport)).expect("valid config")
}

#[tokio::test]
async fn intermediate_responses_are_polled_on_the_same_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/demo/products/shoe.jpg"))
        .and(query_param("tr", "e-bgremove:e-dropshadow-az-45"))
        .respond_with(ProcessingThenDone::new(2))
        .expect(3)
        .mount(&server)
        .await;

    let chain = TransformationChain::new()
        .then(TransformationStep::new().with("remove_background", true))
        .then(TransformationStep::new().with("azimuth", 45));
    let request = DeliveryRequest::compile("products/shoe.jpg", &chain, CompileOptions::default())
        .expect("compiles")
        .with_policy(fast_policy());

    let asset = client_for(&server, vec![])
        .deliver(request)
        .await
        .into_result()
        .expect("delivered");

    assert_eq!(asset.attempts, 3);
    assert_eq!(asset.status, 200);
    assert_eq!(asset.content_type.as_deref(), Some("image/png"));
    assert_eq!(asset.body.as_ref(), PNG);

    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 3);
    assert!(received.iter().all(|r| r.url == received[0].url));
}

#[tokio::test]
async fn negative_cache_failure_is_returned_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/demo/broken.jpg"))
        .respond_with(ResponseTemplate::new(400).insert_header("retry-after", "45"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server, vec![])
        .deliver(DeliveryRequest::new("broken.jpg", "e-upscale").with_policy(fast_policy()))
        .await;

    let err = outcome.error().expect("failed");
    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.retry_after(), Some(Duration::from_secs(45)));
    assert_eq!(err.category(), ErrorCategory::Retryable);
}

#[tokio::test]
async fn budget_exhaustion_is_distinct_from_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ProcessingThenDone::new(usize::MAX))
        .mount(&server)
        .await;

    let policy = fast_policy().with_max_attempts(3);
    let err = client_for(&server, vec![])
        .deliver(DeliveryRequest::new("slow.jpg", "e-retouch").with_policy(policy))
        .await
        .into_result()
        .unwrap_err();

    assert!(matches!(err, DeliveryError::StillProcessingTimeout { attempts: 3, .. }));
    assert_eq!(err.retry_after(), None);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn interceptors_add_headers_to_every_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-client", "imagekit-transform"))
        .respond_with(ProcessingThenDone::new(1))
        .expect(2)
        .mount(&server)
        .await;

    let headers = HeaderInterceptor::new()
        .with_header("x-client", "imagekit-transform")
        .unwrap();
    let client = client_for(&server, vec![Arc::new(LoggingInterceptor), Arc::new(headers)]);
    let outcome = client
        .deliver(DeliveryRequest::new("a.png", "w-100").with_policy(fast_policy()))
        .await;

    assert!(outcome.is_success());
}

#[tokio::test]
async fn force_refresh_requests_a_new_cache_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("ik-fresh", "rev-7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let asset = client_for(&server, vec![])
        .deliver(
            DeliveryRequest::new("a.png", "e-genvar")
                .with_force_refresh("rev-7")
                .with_policy(fast_policy()),
        )
        .await
        .into_result()
        .expect("delivered");
    assert!(asset.url.ends_with("?tr=e-genvar&ik-fresh=rev-7"));
}

#[tokio::test]
async fn concurrent_fetches_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/demo/ok.png"))
        .respond_with(ProcessingThenDone::new(1))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/demo/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server, vec![]);
    let outcomes = client
        .deliver_many(vec![
            DeliveryRequest::new("ok.png", "e-bgremove").with_policy(fast_policy()),
            DeliveryRequest::new("gone.png", "e-bgremove").with_policy(fast_policy()),
        ])
        .await;

    assert!(outcomes[0].is_success());
    assert_eq!(outcomes[1].error().and_then(|e| e.status_code()), Some(404));
}

#[tokio::test]
async fn cancelling_one_fetch_leaves_the_other_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/demo/slow.png"))
        .respond_with(ProcessingThenDone::new(usize::MAX))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/demo/quick.png"))
        .respond_with(ProcessingThenDone::new(2))
        .mount(&server)
        .await;

    let client = client_for(&server, vec![]);
    let parent = new_cancel_handle();
    let slow_cancel = parent.child();
    let quick_cancel = parent.child();

    let slow = {
        let client = client.clone();
        let cancel = slow_cancel.clone();
        tokio::spawn(async move {
            client
                .deliver_with_cancel(DeliveryRequest::new("slow.png", "e-edit-prompt-hat").with_policy(fast_policy()), &cancel)
                .await
        })
    };
    slow_cancel.cancel();

    let quick = client
        .deliver_with_cancel(
            DeliveryRequest::new("quick.png", "e-bgremove").with_policy(fast_policy()),
            &quick_cancel,
        )
        .await;

    assert!(quick.is_success());
    assert_eq!(slow.await.unwrap(), DeliveryOutcome::Failed(DeliveryError::Cancelled));
}

mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;

    use barrage::prelude::*;
    use barrage::{BatchInfo, Dispatcher};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn catalog(descriptors: Vec<RequestDescriptor>) -> RequestCatalog {
        RequestCatalog::with_rng(descriptors, SmallRng::seed_from_u64(42)).unwrap()
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn all_succeed_in_four_batches() {
        init().await;

        let sizes = Arc::new(Mutex::new(vec![]));
        let recorded = sizes.clone();
        let results = Dispatcher::new(
            3,
            10,
            catalog(vec![RequestDescriptor::new(mock_url("/delay/ms/1"))]),
            HttpTransport::new(),
        )
        .unwrap()
        .on_batch(move |info: &BatchInfo| recorded.lock().unwrap().push(info.size))
        .run()
        .await;

        assert_eq!(results.successes.len(), 10);
        assert!(results.failures.is_empty());
        assert_eq!(*sizes.lock().unwrap(), vec![3, 3, 3, 1]);
        assert!(results.successes.iter().all(|o| o.observed_status() == Some(200)));
        assert!(results.stats_successes.mean >= Duration::from_millis(1));
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn unexpected_status() {
        init().await;

        let results = Barrage::new(
            catalog(vec![RequestDescriptor::new(mock_url("/status/500/delay/ms/1"))]),
            HttpTransport::new(),
        )
        .concurrency(5)
        .requests(5)
        .await
        .unwrap();

        assert!(results.successes.is_empty());
        assert_eq!(results.failures.len(), 5);
        for failure in &results.failures {
            assert_eq!(
                failure.failure_reason(),
                Some(FailureReason::UnexpectedStatus)
            );
            assert_eq!(failure.observed_status(), Some(500));
        }
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn expected_non_200_status() {
        init().await;

        let results = Barrage::new(
            catalog(vec![
                RequestDescriptor::new(mock_url("/status/404/delay/ms/0")).expected_status(404)
            ]),
            HttpTransport::new(),
        )
        .concurrency(2)
        .requests(4)
        .await
        .unwrap();

        assert_eq!(results.successes.len(), 4);
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn flaky_target() {
        init().await;

        let results = Barrage::new(
            catalog(vec![RequestDescriptor::new(mock_url(
                "/flaky/2/delay/ms/1/scenario/flaky_target",
            ))]),
            HttpTransport::new(),
        )
        .concurrency(4)
        .requests(20)
        .await
        .unwrap();

        assert_eq!(results.successes.len(), 10);
        assert_eq!(results.failures.len(), 10);
        assert_eq!(results.stats_all.count, 20);
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn connection_failure_is_isolated() {
        init().await;

        // Port 9 (discard) is closed on any sane test host.
        let results = Barrage::new(
            catalog(vec![
                RequestDescriptor::new(mock_url("/delay/ms/1")),
                RequestDescriptor::new("http://127.0.0.1:9/"),
            ]),
            HttpTransport::new(),
        )
        .concurrency(4)
        .requests(40)
        .await
        .unwrap();

        assert_eq!(results.total(), 40);
        assert!(!results.successes.is_empty());
        assert!(!results.failures.is_empty());
        for failure in &results.failures {
            assert_eq!(failure.failure_reason(), Some(FailureReason::TransportError));
            assert_eq!(failure.descriptor().target, "http://127.0.0.1:9/");
        }
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn timeout_is_a_failure() {
        init().await;

        let transport = HttpTransport::with_timeout(Duration::from_millis(50)).unwrap();
        let results = Barrage::new(
            catalog(vec![RequestDescriptor::new(mock_url("/delay/ms/500"))]),
            transport,
        )
        .concurrency(2)
        .requests(2)
        .await
        .unwrap();

        assert_eq!(results.failures.len(), 2);
        assert!(results
            .failures
            .iter()
            .all(|o| o.failure_reason() == Some(FailureReason::TransportError)));
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn payload_is_posted() {
        init().await;

        let results = Barrage::new(
            catalog(vec![RequestDescriptor::new(mock_url("/echo"))
                .payload(serde_json::json!({ "id": 1 }))
                .expected_status(201)]),
            HttpTransport::new(),
        )
        .concurrency(3)
        .requests(6)
        .reporter(TextReporter::new(std::io::sink()))
        .await
        .unwrap();

        assert_eq!(results.successes.len(), 6);
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use hotel_scan::{
    AlertChannel, AlertDispatcher, BookingSite, ChannelError, ExtractError, IterationOutcome,
    MaxDistance, Offer, RunMode, ScanExecutor, ScanExecutorConfig, SearchCriteria, SearchRequest,
    SessionError, SessionHandle,
};

/// Serves canned result pages in order
struct CannedSite {
    pages: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl BookingSite for CannedSite {
    async fn open_session(&self, _criteria: &SearchCriteria) -> Result<SessionHandle, SessionError> {
        Ok(SessionHandle {
            xsrf_token: "xsrf".to_string(),
            opened_at: chrono::Utc::now(),
        })
    }

    async fn fetch_results_page(&self, _session: &SessionHandle) -> Result<String, ExtractError> {
        let mut pages = self.pages.lock().unwrap();
        if pages.is_empty() {
            return Err(ExtractError::Fetch("no more pages".to_string()));
        }
        Ok(pages.remove(0))
    }
}

struct Capture {
    alerts: Mutex<Vec<Vec<String>>>,
}

#[async_trait::async_trait]
impl AlertChannel for Capture {
    fn name(&self) -> &str {
        "capture"
    }

    async fn deliver(&self, _preamble: &str, offers: &[Offer]) -> Result<(), ChannelError> {
        self.alerts
            .lock()
            .unwrap()
            .push(offers.iter().map(|o| o.hotel_name.clone()).collect());
        Ok(())
    }
}

struct Broken {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl AlertChannel for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    async fn deliver(&self, _preamble: &str, _offers: &[Offer]) -> Result<(), ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ChannelError::Delivery("connection refused".to_string()))
    }
}

fn page(hotels: &[(&str, f64, i64, bool, f64)]) -> String {
    let entries: Vec<String> = hotels
        .iter()
        .map(|(name, distance, unit, connected, rate)| {
            let messages = if *connected {
                r#"{"amenities": "Skywalk to ICC"}"#
            } else {
                "null"
            };
            format!(
                r#"{{"name": "{name}", "distanceFromEvent": {distance}, "distanceUnit": {unit},
                "messageMap": {messages},
                "blocks": [{{"name": "King", "inventory": [{{"rate": {rate}, "available": 1}}, {{"rate": {rate}, "available": 2}}]}}]}}"#
            )
        })
        .collect();
    format!(
        "<!DOCTYPE html><html><body><script id=\"last-search-results\" type=\"text/json\">[{}]</script></body></html>",
        entries.join(",")
    )
}

async fn poll(executor: &mut ScanExecutor, out: &mut Vec<u8>) -> bool {
    match executor.run_iteration(out).await {
        IterationOutcome::Triggered(handle) => {
            handle.wait().await;
            true
        }
        _ => false,
    }
}

#[tokio::test]
async fn test_connected_only_search_over_several_polls() {
    let downtown = ("Downtown Suites", 0.5, 1, false, 150.0);
    let skywalk = ("Skywalk Tower", 2.0, 1, true, 180.0);
    let airport = ("Airport Lodge", 8.0, 3, false, 60.0);
    let skywalk_two = ("Skywalk Annex", 1.0, 1, true, 120.0);

    let site = Arc::new(CannedSite {
        pages: Mutex::new(vec![
            page(&[downtown, skywalk, airport]),
            page(&[downtown, skywalk]),
            page(&[downtown, skywalk, skywalk_two]),
        ]),
    });
    let capture = Arc::new(Capture {
        alerts: Mutex::new(Vec::new()),
    });
    let broken = Arc::new(Broken {
        calls: AtomicUsize::new(0),
    });

    let criteria = SearchCriteria::from_request(SearchRequest {
        max_distance: MaxDistance::Connected,
        budget: 400.0,
        ..SearchRequest::default()
    })
    .unwrap();

    let mut executor = ScanExecutor::new(
        site,
        AlertDispatcher::new(vec![broken.clone(), capture.clone()]),
        criteria,
        Some(ScanExecutorConfig {
            mode: RunMode::Once,
            ..ScanExecutorConfig::default()
        }),
    );
    let mut out = Vec::new();

    assert!(poll(&mut executor, &mut out).await);
    assert!(!poll(&mut executor, &mut out).await);
    assert!(poll(&mut executor, &mut out).await);

    let alerts = capture.alerts.lock().unwrap().clone();
    assert_eq!(
        alerts,
        vec![
            vec!["Skywalk Tower".to_string()],
            vec!["Skywalk Tower".to_string(), "Skywalk Annex".to_string()],
        ]
    );
    assert_eq!(broken.calls.load(Ordering::SeqCst), 2);

    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("Airport Lodge"));
    assert!(text.contains("    0.5 blocks     $300"));
    assert!(text.contains(" ! Skywalk         $360"));
}

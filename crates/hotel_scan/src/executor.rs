use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::alert_dedup::AlertDeduplicator;
use crate::dispatcher::{AlertDispatcher, DispatchHandle, DispatchReport};
use crate::offer_filter::evaluate;
use crate::report;
use crate::result_extractor::extract;
use crate::scan_types::{DistanceUnit, Offer, ScanError, SearchCriteria};
use crate::session_manager::BookingSite;

/// How the scheduler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Poll forever, sleeping between searches
    #[default]
    Continuous,
    /// Poll a single time and exit
    Once,
    /// Fire every channel with sample offers and exit
    Test,
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct ScanExecutorConfig {
    /// Time between searches (default: 1 minute)
    pub poll_interval: Duration,

    /// Run mode
    pub mode: RunMode,
}

impl Default for ScanExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            mode: RunMode::Continuous,
        }
    }
}

/// What a single poll iteration ended with
pub enum IterationOutcome {
    /// Session or extraction failed; nothing was filtered
    Failed(ScanError),
    /// Nothing new qualified
    Skipped,
    /// Alerts went out to the channels
    Triggered(DispatchHandle),
}

/// Drives the search, filter, dedupe and alert cycle
pub struct ScanExecutor {
    site: Arc<dyn BookingSite>,
    dispatcher: AlertDispatcher,
    criteria: SearchCriteria,
    dedup: AlertDeduplicator,
    config: ScanExecutorConfig,
}

impl ScanExecutor {
    /// Create a scheduler over a booking site and a set of channels
    pub fn new(
        site: Arc<dyn BookingSite>,
        dispatcher: AlertDispatcher,
        criteria: SearchCriteria,
        config: Option<ScanExecutorConfig>,
    ) -> Self {
        Self {
            site,
            dispatcher,
            criteria,
            dedup: AlertDeduplicator::new(),
            config: config.unwrap_or_default(),
        }
    }

    /// Run in the configured mode, writing the status report to `out`
    pub async fn start<W: Write>(&mut self, out: &mut W) {
        if self.config.mode == RunMode::Test {
            self.run_test(out).await;
            return;
        }

        info!(
            "Starting hotel scan with {} alert channel(s)",
            self.dispatcher.len()
        );

        loop {
            emit(out, &report::search_banner(&self.criteria));

            let outcome = self.run_iteration(out).await;

            if self.config.mode == RunMode::Once {
                if let IterationOutcome::Triggered(handle) = outcome {
                    let summary = handle.wait().await;
                    debug!("Alert deliveries finished: {:?}", summary);
                }
                return;
            }

            if let IterationOutcome::Triggered(handle) = outcome {
                handle.detach();
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// One search; failures are reported and never propagate
    pub async fn run_iteration<W: Write>(&mut self, out: &mut W) -> IterationOutcome {
        match self.search_and_alert(out).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Search failed: {}", e);
                emit(out, &e.to_string());
                IterationOutcome::Failed(e)
            }
        }
    }

    async fn search_and_alert<W: Write>(
        &mut self,
        out: &mut W,
    ) -> Result<IterationOutcome, ScanError> {
        let session = self.site.open_session(&self.criteria).await?;
        let offers = extract(self.site.as_ref(), &session).await?;

        let outcome = evaluate(&offers, &self.criteria);
        debug!(
            "{} offers, {} displayed, {} qualifying",
            offers.len(),
            outcome.display.len(),
            outcome.qualifying.len()
        );

        emit(out, &report::results_banner(Local::now()));
        emit(out, &report::table_header());
        for (offer, qualifying) in outcome.rows() {
            emit(out, &report::offer_row(offer, qualifying));
        }

        let new_offers = self.dedup.observe(&outcome.qualifying);

        let result = if new_offers.is_empty() {
            emit(out, report::SKIPPED_ALERTS);
            IterationOutcome::Skipped
        } else {
            let preamble = report::alert_preamble(&new_offers);
            info!("Alerting on {} offers: {}", new_offers.len(), preamble);
            let handle = self.dispatcher.dispatch(&preamble, &new_offers);
            emit(out, report::TRIGGERED_ALERTS);
            IterationOutcome::Triggered(handle)
        };
        emit(out, "");

        Ok(result)
    }

    /// Fire every channel once with sample offers and wait for them
    pub async fn run_test<W: Write>(&self, out: &mut W) -> DispatchReport {
        emit(out, "Testing alerts one at a time...");
        let summary = self
            .dispatcher
            .dispatch("This is a test", &sample_offers())
            .wait()
            .await;
        if summary.failed > 0 {
            warn!("{} alert channel(s) failed the test", summary.failed);
        }
        emit(out, "Done");
        summary
    }
}

/// Offers used by the alert self-test
pub fn sample_offers() -> Vec<Offer> {
    vec![
        Offer {
            hotel_name: "Test hotel 1".to_string(),
            distance: 2.0,
            unit: DistanceUnit::Blocks,
            connected: false,
            room_name: "Queen/Queen suite".to_string(),
            total_price: 0.0,
            rooms_available: 1,
        },
        Offer {
            hotel_name: "Test hotel 2".to_string(),
            distance: 5.0,
            unit: DistanceUnit::Blocks,
            connected: false,
            room_name: "Standard King".to_string(),
            total_price: 0.0,
            rooms_available: 5,
        },
    ]
}

fn emit<W: Write>(out: &mut W, line: &str) {
    if let Err(e) = writeln!(out, "{}", line) {
        warn!("Failed to write status line: {}", e);
    }
}

// src/pipeline/poll.rs

//! Polling pipeline: fetch → parse → match → dedupe → notify → persist.
//!
//! One cycle runs to completion before the next begins. Transient failures
//! never escape a cycle: a fetch or parse error ends it early with a log
//! line, and a delivery failure leaves the identifier unmarked so the next
//! cycle retries it. An identifier enters the seen set only after the
//! webhook confirmed the post.

use std::time::Duration;

use crate::error::Result;
use crate::matcher::location_matches;
use crate::models::Config;
use crate::services::{FeedSource, Notifier, NotifyOutcome, parse_feed};
use crate::storage::SeenStore;

/// Counters for one poll cycle.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Incidents parsed from the feed
    pub parsed: usize,
    /// Incidents inside the corridor
    pub matched: usize,
    /// Matching incidents not alerted on before
    pub fresh: usize,
    /// Alerts accepted by the webhook
    pub posted: usize,
    /// Alerts skipped because no webhook is configured
    pub skipped: usize,
    /// Delivery failures, retried next cycle
    pub failed: usize,
    /// Whether state was written to disk this cycle
    pub persisted: bool,
}

impl CycleStats {
    /// One-line summary for the cycle log.
    pub fn summary(&self) -> String {
        format!(
            "{} in feed, {} in corridor, {} new, {} posted, {} failed",
            self.parsed, self.matched, self.fresh, self.posted, self.failed
        )
    }
}

/// Run a single poll cycle against the given feed, notifier, and store.
pub async fn run_cycle(
    feed: &dyn FeedSource,
    notifier: &dyn Notifier,
    store: &mut SeenStore,
    keywords: &[String],
) -> CycleStats {
    let mut stats = CycleStats::default();

    let xml = match feed.fetch().await {
        Ok(xml) => xml,
        Err(e) => {
            log::error!("{e}");
            return stats;
        }
    };

    let incidents = match parse_feed(&xml) {
        Ok(incidents) => incidents,
        Err(e) => {
            log::error!("{e}");
            return stats;
        }
    };

    if incidents.is_empty() {
        // Usually a feed content change rather than outright breakage.
        log::warn!("Feed decoded but yielded no incidents");
    } else {
        log::info!("Found {} incidents in feed", incidents.len());
    }
    stats.parsed = incidents.len();

    for incident in &incidents {
        if !location_matches(incident.location.as_deref(), keywords) {
            log::debug!(
                "Incident {} location {:?} is outside the corridor",
                incident.id,
                incident.location
            );
            continue;
        }
        stats.matched += 1;

        if store.has(&incident.id) {
            log::debug!("Already alerted on incident {}", incident.id);
            continue;
        }
        stats.fresh += 1;
        log::info!(
            "New matching incident {} at {}",
            incident.id,
            incident.location.as_deref().unwrap_or("unknown location")
        );

        match notifier.notify(incident).await {
            Ok(NotifyOutcome::Posted) => {
                store.insert(incident.id.clone());
                stats.posted += 1;
            }
            Ok(NotifyOutcome::Disabled) => {
                // Deliberately not marked seen: enabling the webhook later
                // surfaces the backlog instead of silently dropping it.
                log::info!("No webhook configured; alert for {} not posted", incident.id);
                stats.skipped += 1;
            }
            Err(e) => {
                log::error!("Alert for {} failed, retrying next cycle: {e}", incident.id);
                stats.failed += 1;
            }
        }
    }

    if store.is_dirty() {
        match store.persist().await {
            Ok(()) => stats.persisted = true,
            Err(e) => {
                // Inserts stay in memory and ride along with the next
                // successful persist.
                log::error!("Failed to persist seen incidents: {e}");
            }
        }
    }

    stats
}

/// Run poll cycles forever, sleeping the configured interval in between.
///
/// Returns after ctrl-c. The in-flight cycle always completes first, so the
/// state file is never abandoned mid-write.
pub async fn run_loop(
    feed: &dyn FeedSource,
    notifier: &dyn Notifier,
    store: &mut SeenStore,
    config: &Config,
) -> Result<()> {
    let interval = Duration::from_secs(config.feed.poll_interval_secs);

    loop {
        let stats = run_cycle(feed, notifier, store, &config.keywords).await;
        log::info!("Cycle complete: {}", stats.summary());

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                log::info!("Interrupt received, shutting down");
                return Ok(());
            }
        }
    }
}

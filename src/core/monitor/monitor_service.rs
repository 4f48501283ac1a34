// Availability monitor: probe one external URL on a fixed interval and walk
// an ordered notification chain whenever the site looks down.
//
// Every failing poll triggers a fresh alert - there is deliberately no
// debounce and no recovery notice. `last_status` is tracked so transitions
// show up in the logs, but it never suppresses an alert.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Process-wide monitor configuration, read once at startup. Optional notify
/// targets disable their branch of the chain when absent.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub target_url: String,
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub notify_guild_id: Option<u64>,
    pub notify_channel_id: Option<u64>,
    pub notify_channel_name: String,
    pub fallback_display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteStatus {
    #[default]
    Unknown,
    Up,
    Down,
}

/// Connection-level probe failure (timeout, DNS, refusal). Carries the
/// transport error text so alerts can include it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ProbeError(pub String);

/// Issues one HTTP GET against the target and reports the status code.
/// The implementation owns the request timeout.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> Result<u16, ProbeError>;
}

/// Down iff the status is outside [200, 400) or the probe failed outright.
/// Returns the human-readable reason used in the alert, or `None` when up.
pub fn classify(result: &Result<u16, ProbeError>) -> Option<String> {
    match result {
        Ok(status) if (200..400).contains(status) => None,
        Ok(status) => Some(format!("HTTP {status}")),
        Err(e) => Some(e.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    Unavailable,
}

/// One strategy in the outage-notification chain.
#[async_trait]
pub trait OutageNotifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn notify(&self, reason: &str) -> NotifyOutcome;
}

/// Walk the chain in order, stopping at the first successful delivery.
/// An exhausted chain is an operator-visible log line, never an error.
pub async fn run_notification_chain(
    notifiers: &[Box<dyn OutageNotifier>],
    reason: &str,
) -> bool {
    for notifier in notifiers {
        match notifier.notify(reason).await {
            NotifyOutcome::Delivered => {
                tracing::info!(notifier = notifier.name(), "Delivered outage notification");
                return true;
            }
            NotifyOutcome::Unavailable => {
                tracing::debug!(notifier = notifier.name(), "Outage notifier unavailable");
            }
        }
    }

    tracing::warn!("No outage notification target could be reached; reason: {reason}");
    false
}

pub struct MonitorService<P: Prober> {
    settings: MonitorSettings,
    prober: P,
    last_status: Mutex<SiteStatus>,
}

impl<P: Prober> MonitorService<P> {
    pub fn new(settings: MonitorSettings, prober: P) -> Self {
        Self {
            settings,
            prober,
            last_status: Mutex::new(SiteStatus::Unknown),
        }
    }

    pub fn last_status(&self) -> SiteStatus {
        *self.last_status.lock().unwrap()
    }

    /// One probe cycle: classify the result, record the status, and alert on
    /// any Down observation (fresh alert per failing poll).
    pub async fn poll_once(&self, notifiers: &[Box<dyn OutageNotifier>]) {
        let result = self.prober.probe(&self.settings.target_url).await;

        match classify(&result) {
            None => self.record_status(SiteStatus::Up),
            Some(reason) => {
                self.record_status(SiteStatus::Down);
                tracing::warn!(
                    url = %self.settings.target_url,
                    "Monitored site appears down: {reason}"
                );
                run_notification_chain(notifiers, &reason).await;
            }
        }
    }

    /// Recurring loop; spawned exactly once for the process lifetime.
    pub async fn run(&self, notifiers: Vec<Box<dyn OutageNotifier>>) {
        loop {
            self.poll_once(&notifiers).await;
            tokio::time::sleep(self.settings.interval).await;
        }
    }

    fn record_status(&self, next: SiteStatus) {
        let mut last = self.last_status.lock().unwrap();
        if *last != next {
            tracing::info!(from = ?*last, to = ?next, "Monitored site status changed");
        }
        *last = next;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedProber(Result<u16, ProbeError>);

    #[async_trait]
    impl Prober for FixedProber {
        async fn probe(&self, _url: &str) -> Result<u16, ProbeError> {
            self.0.clone()
        }
    }

    struct CountingNotifier {
        attempts: Arc<AtomicUsize>,
        outcome: NotifyOutcome,
    }

    #[async_trait]
    impl OutageNotifier for CountingNotifier {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn notify(&self, _reason: &str) -> NotifyOutcome {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.outcome
        }
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            target_url: "https://example.invalid".into(),
            interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(15),
            notify_guild_id: None,
            notify_channel_id: None,
            notify_channel_name: "general".into(),
            fallback_display_name: None,
        }
    }

    #[test]
    fn classify_treats_2xx_and_3xx_as_up() {
        assert_eq!(classify(&Ok(200)), None);
        assert_eq!(classify(&Ok(204)), None);
        assert_eq!(classify(&Ok(302)), None);
    }

    #[test]
    fn classify_treats_other_statuses_and_errors_as_down() {
        assert_eq!(classify(&Ok(500)).as_deref(), Some("HTTP 500"));
        assert_eq!(classify(&Ok(400)).as_deref(), Some("HTTP 400"));
        assert_eq!(classify(&Ok(199)).as_deref(), Some("HTTP 199"));
        assert_eq!(
            classify(&Err(ProbeError("connection refused".into()))).as_deref(),
            Some("connection refused")
        );
    }

    #[tokio::test]
    async fn failing_poll_triggers_exactly_one_notification_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let notifiers: Vec<Box<dyn OutageNotifier>> = vec![Box::new(CountingNotifier {
            attempts: Arc::clone(&attempts),
            outcome: NotifyOutcome::Delivered,
        })];
        let service = MonitorService::new(settings(), FixedProber(Ok(500)));

        service.poll_once(&notifiers).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(service.last_status(), SiteStatus::Down);

        // No debounce: the next failing poll alerts again.
        service.poll_once(&notifiers).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn healthy_poll_triggers_no_notification() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let notifiers: Vec<Box<dyn OutageNotifier>> = vec![Box::new(CountingNotifier {
            attempts: Arc::clone(&attempts),
            outcome: NotifyOutcome::Delivered,
        })];
        let service = MonitorService::new(settings(), FixedProber(Ok(204)));

        service.poll_once(&notifiers).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
        assert_eq!(service.last_status(), SiteStatus::Up);
    }

    #[tokio::test]
    async fn chain_stops_at_first_successful_delivery() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));
        let notifiers: Vec<Box<dyn OutageNotifier>> = vec![
            Box::new(CountingNotifier {
                attempts: Arc::clone(&first),
                outcome: NotifyOutcome::Unavailable,
            }),
            Box::new(CountingNotifier {
                attempts: Arc::clone(&second),
                outcome: NotifyOutcome::Delivered,
            }),
            Box::new(CountingNotifier {
                attempts: Arc::clone(&third),
                outcome: NotifyOutcome::Delivered,
            }),
        ];

        assert!(run_notification_chain(&notifiers, "HTTP 500").await);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhausted_chain_is_a_logged_no_op() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let notifiers: Vec<Box<dyn OutageNotifier>> = vec![Box::new(CountingNotifier {
            attempts: Arc::clone(&attempts),
            outcome: NotifyOutcome::Unavailable,
        })];
        let service = MonitorService::new(
            settings(),
            FixedProber(Err(ProbeError("timed out".into()))),
        );

        // Must not panic or propagate; the outcome is just a log line.
        service.poll_once(&notifiers).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(service.last_status(), SiteStatus::Down);
    }
}

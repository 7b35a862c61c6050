//! Periodic connection quality sampling.

use crate::error::MediaError;
use crate::media::MediaSession;
use caller_core::{ConnectionQuality, QualityMetrics, StatsSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Samples the media session's stats while the connection is up and publishes
/// the derived metrics and rating. Reads `Disconnected` whenever it is stopped.
pub struct QualityMonitor {
    interval: Duration,
    quality_tx: Arc<watch::Sender<ConnectionQuality>>,
    metrics_tx: Arc<watch::Sender<QualityMetrics>>,
    task: Option<JoinHandle<()>>,
}

impl QualityMonitor {
    pub fn new(interval: Duration) -> Self {
        let (quality_tx, _) = watch::channel(ConnectionQuality::Disconnected);
        let (metrics_tx, _) = watch::channel(QualityMetrics::default());

        Self {
            interval,
            quality_tx: Arc::new(quality_tx),
            metrics_tx: Arc::new(metrics_tx),
            task: None,
        }
    }

    /// Starts sampling `media`, replacing any previous sampler.
    pub fn start(&mut self, media: Arc<dyn MediaSession>) {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        debug!("Quality monitor started");
        self.task = Some(tokio::spawn(sample_loop(
            media,
            self.interval,
            self.quality_tx.clone(),
            self.metrics_tx.clone(),
        )));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Quality monitor stopped");
        }
        self.quality_tx.send_replace(ConnectionQuality::Disconnected);
        self.metrics_tx.send_replace(QualityMetrics::default());
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn current(&self) -> ConnectionQuality {
        *self.quality_tx.borrow()
    }

    pub fn metrics(&self) -> QualityMetrics {
        *self.metrics_tx.borrow()
    }

    pub fn subscribe_quality(&self) -> watch::Receiver<ConnectionQuality> {
        self.quality_tx.subscribe()
    }

    pub fn subscribe_metrics(&self) -> watch::Receiver<QualityMetrics> {
        self.metrics_tx.subscribe()
    }
}

impl Drop for QualityMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn sample_loop(
    media: Arc<dyn MediaSession>,
    period: Duration,
    quality_tx: Arc<watch::Sender<ConnectionQuality>>,
    metrics_tx: Arc<watch::Sender<QualityMetrics>>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut previous: Option<(StatsSnapshot, Instant)> = None;

    loop {
        ticker.tick().await;

        let snapshot = match media.stats_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(MediaError::Closed) => break,
            Err(e) => {
                warn!("Failed to read call stats: {}", e);
                continue;
            }
        };

        let now = Instant::now();
        let metrics = match &previous {
            Some((prev, at)) => QualityMetrics::from_stats(&snapshot, Some(prev), now - *at),
            None => QualityMetrics::from_stats(&snapshot, None, Duration::ZERO),
        };
        let quality = metrics.quality();

        debug!(
            packet_loss = metrics.packet_loss,
            rtt_ms = metrics.round_trip_time,
            jitter_ms = metrics.jitter,
            %quality,
            "Call quality sample"
        );

        metrics_tx.send_replace(metrics);
        quality_tx.send_if_modified(|current| {
            let changed = *current != quality;
            *current = quality;
            changed
        });

        previous = Some((snapshot, now));
    }
}

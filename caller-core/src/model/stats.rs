//! Typed transport statistics, filled in by the media session and reduced to
//! [`QualityMetrics`] by the quality monitor.

use crate::model::quality::QualityMetrics;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InboundRtpStats {
    pub packets_received: Option<u64>,
    pub packets_lost: Option<i64>,
    /// Seconds.
    pub jitter: Option<f64>,
    pub frames_decoded: Option<u64>,
    pub frames_per_second: Option<f64>,
    pub bytes_received: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidatePairStats {
    /// Seconds.
    pub current_round_trip_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteInboundRtpStats {
    /// Seconds.
    pub round_trip_time: Option<f64>,
    /// Loss of our outbound stream as reported back by the peer.
    pub packets_lost: Option<i64>,
    pub packets_received: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatsReport {
    InboundRtp(InboundRtpStats),
    CandidatePair(CandidatePairStats),
    RemoteInboundRtp(RemoteInboundRtpStats),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub reports: Vec<StatsReport>,
}

impl StatsSnapshot {
    pub fn new(reports: Vec<StatsReport>) -> Self {
        Self { reports }
    }

    fn inbound(&self) -> impl Iterator<Item = &InboundRtpStats> {
        self.reports.iter().filter_map(|report| match report {
            StatsReport::InboundRtp(stats) => Some(stats),
            _ => None,
        })
    }

    fn remote_inbound(&self) -> impl Iterator<Item = &RemoteInboundRtpStats> {
        self.reports.iter().filter_map(|report| match report {
            StatsReport::RemoteInboundRtp(stats) => Some(stats),
            _ => None,
        })
    }

    fn bytes_received(&self) -> u64 {
        self.inbound().filter_map(|s| s.bytes_received).sum()
    }

    fn frames_decoded(&self) -> u64 {
        self.inbound().filter_map(|s| s.frames_decoded).sum()
    }
}

impl QualityMetrics {
    /// Reduces a snapshot to metrics. Rates (fps, bandwidth) need the previous
    /// snapshot and the time between the two; without it they are zero unless
    /// the report carries them directly. Loss comes from inbound reports and
    /// falls back to the peer's remote-inbound counts when no inbound report
    /// carries a loss count.
    pub fn from_stats(
        current: &StatsSnapshot,
        previous: Option<&StatsSnapshot>,
        elapsed: Duration,
    ) -> Self {
        let mut lost: u64 = 0;
        let mut received: u64 = 0;
        let mut jitter_ms: f64 = 0.0;
        let mut reported_fps: Option<f64> = None;
        let mut inbound_loss_known = false;

        for stats in current.inbound() {
            if let Some(l) = stats.packets_lost {
                inbound_loss_known = true;
                lost += u64::try_from(l).unwrap_or(0);
            }
            received += stats.packets_received.unwrap_or(0);
            if let Some(jitter) = stats.jitter {
                jitter_ms = jitter_ms.max(jitter * 1000.0);
            }
            if let Some(fps) = stats.frames_per_second {
                reported_fps = Some(reported_fps.map_or(fps, |best: f64| best.max(fps)));
            }
        }

        if !inbound_loss_known {
            let remote: Vec<&RemoteInboundRtpStats> = current
                .remote_inbound()
                .filter(|r| r.packets_lost.is_some())
                .collect();
            if !remote.is_empty() {
                lost = remote
                    .iter()
                    .filter_map(|r| r.packets_lost)
                    .map(|l| u64::try_from(l).unwrap_or(0))
                    .sum();
                received = remote.iter().filter_map(|r| r.packets_received).sum();
            }
        }

        let total = lost + received;
        let packet_loss = if total > 0 {
            lost as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let rtt_samples: Vec<f64> = current
            .reports
            .iter()
            .filter_map(|report| match report {
                StatsReport::CandidatePair(pair) => pair.current_round_trip_time,
                StatsReport::RemoteInboundRtp(remote) => remote.round_trip_time,
                StatsReport::InboundRtp(_) => None,
            })
            .map(|seconds| seconds * 1000.0)
            .collect();
        let round_trip_time = if rtt_samples.is_empty() {
            0.0
        } else {
            rtt_samples.iter().sum::<f64>() / rtt_samples.len() as f64
        };

        let secs = elapsed.as_secs_f64();
        let (frames_per_second, bandwidth) = match previous {
            Some(prev) if secs > 0.0 => {
                let frames = current.frames_decoded().saturating_sub(prev.frames_decoded());
                let bytes = current.bytes_received().saturating_sub(prev.bytes_received());
                (
                    reported_fps.unwrap_or(frames as f64 / secs),
                    bytes as f64 * 8.0 / 1000.0 / secs,
                )
            }
            _ => (reported_fps.unwrap_or(0.0), 0.0),
        };

        Self {
            packet_loss,
            round_trip_time,
            jitter: jitter_ms,
            frames_per_second,
            bandwidth,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

const PACKET_LOSS_POOR: f64 = 5.0;
const PACKET_LOSS_FAIR: f64 = 2.0;
const PACKET_LOSS_GOOD: f64 = 1.0;

const RTT_POOR_MS: f64 = 400.0;
const RTT_FAIR_MS: f64 = 250.0;
const RTT_GOOD_MS: f64 = 150.0;

/// One sampling interval worth of transport statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Percent of inbound packets lost.
    pub packet_loss: f64,
    /// Milliseconds.
    pub round_trip_time: f64,
    /// Milliseconds.
    pub jitter: f64,
    pub frames_per_second: f64,
    /// Kilobits per second received.
    pub bandwidth: f64,
}

impl QualityMetrics {
    pub fn quality(&self) -> ConnectionQuality {
        ConnectionQuality::classify(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    Disconnected,
}

impl ConnectionQuality {
    /// Worst matching bucket wins: either loss or latency alone can downgrade.
    pub fn classify(metrics: &QualityMetrics) -> Self {
        let loss = metrics.packet_loss;
        let rtt = metrics.round_trip_time;

        if loss > PACKET_LOSS_POOR || rtt > RTT_POOR_MS {
            Self::Poor
        } else if loss > PACKET_LOSS_FAIR || rtt > RTT_FAIR_MS {
            Self::Fair
        } else if loss > PACKET_LOSS_GOOD || rtt > RTT_GOOD_MS {
            Self::Good
        } else {
            Self::Excellent
        }
    }
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
            Self::Disconnected => "DISCONNECTED",
        };
        f.write_str(label)
    }
}

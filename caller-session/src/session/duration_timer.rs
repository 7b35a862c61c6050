use crate::session::SessionEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Feeds `Tick` events into the session mailbox while a call is live.
/// Dropping the timer cancels it.
pub(crate) struct DurationTimer {
    task: JoinHandle<()>,
}

impl DurationTimer {
    pub fn start(epoch: u64, period: Duration, tx: mpsc::Sender<SessionEvent>) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if tx.send(SessionEvent::Tick { epoch }).await.is_err() {
                    break;
                }
            }
        });

        Self { task }
    }
}

impl Drop for DurationTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

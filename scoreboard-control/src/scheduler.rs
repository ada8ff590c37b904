use crate::{registry::Registry, relay::Outbox};
use log::*;
use scoreboard_common::relay::Relayed;
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};

/// Fixed period driver for every live scoreboard. A late firing is followed by a
/// full period, never by a burst.
#[derive(Debug)]
pub struct TickScheduler {
    interval: Interval,
}

impl TickScheduler {
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Waits for the next firing and returns the time it was actually observed
    pub async fn next_tick(&mut self) -> Instant {
        self.interval.tick().await;
        Instant::now()
    }
}

/// One pass: every live scoreboard advances its running counters to `now`, then each
/// running counter is reported, changed or not. The whole pass goes out as one batch.
/// Returns the number of updates the outbox accepted.
pub fn tick_all<O: Outbox>(registry: &mut Registry, outbox: &mut O, now: Instant) -> usize {
    let batch: Vec<Relayed> = registry
        .iter_mut()
        .flat_map(|(id, scoreboard)| {
            scoreboard
                .tick(now)
                .into_iter()
                .map(move |message| Relayed::new(id, message))
        })
        .collect();
    let total = batch.len();
    let sent = outbox.send_all(batch);
    trace!("Tick pass sent {sent} of {total} updates");
    sent
}

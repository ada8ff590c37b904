use crate::{
    counter::{Counter, Direction, clamp},
    drawing_support::MAX_CLOCK_MINUTES,
    side::Side,
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenaltySlot {
    First,
    Second,
}

impl core::fmt::Display for PenaltySlot {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::First => write!(f, "1"),
            Self::Second => write!(f, "2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterId {
    Clock,
    Penalty(Side, PenaltySlot),
}

impl CounterId {
    pub const ALL: [CounterId; 5] = [
        CounterId::Clock,
        CounterId::Penalty(Side::Home, PenaltySlot::First),
        CounterId::Penalty(Side::Guest, PenaltySlot::First),
        CounterId::Penalty(Side::Home, PenaltySlot::Second),
        CounterId::Penalty(Side::Guest, PenaltySlot::Second),
    ];
}

impl core::fmt::Display for CounterId {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::Clock => write!(f, "Clock"),
            Self::Penalty(side, slot) => write!(f, "{side} Penalty {slot}"),
        }
    }
}

/// Negative input from the operator counts as zero
pub fn clamp_non_negative(value: i64) -> i64 {
    value.max(0)
}

/// The five counters belonging to one scoreboard. The penalty counters follow the
/// run state of the clock, but keep their own values and directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSet {
    pub clock: Counter,
    pub penalty_home_1: Counter,
    pub penalty_guest_1: Counter,
    pub penalty_home_2: Counter,
    pub penalty_guest_2: Counter,
}

impl TimerSet {
    pub fn new(clock_direction: Direction, penalty_direction: Direction, now: Instant) -> Self {
        Self {
            clock: Counter::new(clock_direction, now),
            penalty_home_1: Counter::new(penalty_direction, now),
            penalty_guest_1: Counter::new(penalty_direction, now),
            penalty_home_2: Counter::new(penalty_direction, now),
            penalty_guest_2: Counter::new(penalty_direction, now),
        }
    }

    pub fn counter(&self, id: CounterId) -> &Counter {
        match id {
            CounterId::Clock => &self.clock,
            CounterId::Penalty(Side::Home, PenaltySlot::First) => &self.penalty_home_1,
            CounterId::Penalty(Side::Guest, PenaltySlot::First) => &self.penalty_guest_1,
            CounterId::Penalty(Side::Home, PenaltySlot::Second) => &self.penalty_home_2,
            CounterId::Penalty(Side::Guest, PenaltySlot::Second) => &self.penalty_guest_2,
        }
    }

    pub fn counter_mut(&mut self, id: CounterId) -> &mut Counter {
        match id {
            CounterId::Clock => &mut self.clock,
            CounterId::Penalty(Side::Home, PenaltySlot::First) => &mut self.penalty_home_1,
            CounterId::Penalty(Side::Guest, PenaltySlot::First) => &mut self.penalty_guest_1,
            CounterId::Penalty(Side::Home, PenaltySlot::Second) => &mut self.penalty_home_2,
            CounterId::Penalty(Side::Guest, PenaltySlot::Second) => &mut self.penalty_guest_2,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CounterId, &Counter)> {
        CounterId::ALL.into_iter().map(move |id| (id, self.counter(id)))
    }

    pub fn clock_is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Starts or stops the clock and all four penalties together. Every counter ends
    /// up in the new run state of the clock and is observed at `now`.
    pub fn toggle_master_running(&mut self, now: Instant) {
        let running = !self.clock.is_running();
        for id in CounterId::ALL {
            self.counter_mut(id).set_running(running, now);
        }
    }

    /// Applies the same signed nudge to the clock and to every penalty. Each counter
    /// saturates on its own.
    pub fn nudge_all(&mut self, delta_ms: i64) {
        for id in CounterId::ALL {
            self.counter_mut(id).adjust_by(delta_ms);
        }
    }

    /// Sets the clock from operator fields, minutes in `[0, 99]` and seconds in `[0, 59]`
    pub fn set_clock(&mut self, minutes: i64, seconds: i64, now: Instant) {
        let minutes = minutes.clamp(0, MAX_CLOCK_MINUTES.into());
        let seconds = seconds.clamp(0, 59);
        self.clock
            .set_absolute((minutes * 60 + seconds) * 1_000, now);
    }

    pub fn set_penalty(
        &mut self,
        side: Side,
        slot: PenaltySlot,
        minutes: i64,
        seconds: i64,
        now: Instant,
    ) {
        let ms = clamp_non_negative(minutes)
            .saturating_mul(60_000)
            .saturating_add(clamp_non_negative(seconds).saturating_mul(1_000));
        self.counter_mut(CounterId::Penalty(side, slot))
            .set_absolute(clamp(ms).into(), now);
    }

    pub fn tick(&mut self, now: Instant) {
        for id in CounterId::ALL {
            self.counter_mut(id).tick(now);
        }
    }

    pub fn running(&self) -> impl Iterator<Item = (CounterId, &Counter)> {
        self.iter().filter(|(_, counter)| counter.is_running())
    }

    pub(crate) fn reobserve(&mut self, now: Instant) {
        for id in CounterId::ALL {
            let counter = self.counter_mut(id);
            let running = counter.is_running();
            counter.set_running(running, now);
        }
    }
}

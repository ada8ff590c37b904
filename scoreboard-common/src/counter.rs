//! A clamped, directional elapsed-time value that can be started and stopped.
//!
//! Counters never read the wall clock themselves. Every operation that depends on
//! time takes a `now` value, so the owner decides when a counter is observed and
//! tests can drive them with synthetic instants.

use crate::drawing_support::MAX_STRINGABLE_SECS;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

/// Largest value a counter can hold, 99:59
pub const MAX_COUNTER_MS: u32 = MAX_STRINGABLE_SECS as u32 * 1000;

/// Projects `value` into `[0, MAX_COUNTER_MS]`, saturating at either end.
pub fn clamp(value: i64) -> u32 {
    value
        .clamp(0, MAX_COUNTER_MS as i64)
        .try_into()
        .unwrap_or(MAX_COUNTER_MS)
}

#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[derivative(Default)]
    CountDown,
    CountUp,
}

impl Direction {
    fn signed(self, elapsed_ms: i64) -> i64 {
        match self {
            Self::CountDown => -elapsed_ms,
            Self::CountUp => elapsed_ms,
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::CountDown => write!(f, "Counting Down"),
            Self::CountUp => write!(f, "Counting Up"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    current_ms: u32,
    direction: Direction,
    running: bool,
    last_observed: Instant,
}

impl Counter {
    pub fn new(direction: Direction, now: Instant) -> Self {
        Self {
            current_ms: 0,
            direction,
            running: false,
            last_observed: now,
        }
    }

    pub fn current_ms(&self) -> u32 {
        self.current_ms
    }

    /// Whole seconds, rounded down
    pub fn whole_secs(&self) -> u32 {
        self.current_ms / 1000
    }

    /// The value as sent to display surfaces, in (fractional) seconds
    pub fn as_secs_f64(&self) -> f64 {
        f64::from(self.current_ms) / 1000.0
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_observed(&self) -> Instant {
        self.last_observed
    }

    pub fn set_absolute(&mut self, ms: i64, now: Instant) {
        self.current_ms = clamp(ms);
        self.last_observed = now;
    }

    /// Nudges the value by `delta_ms`. The observation time is left alone so a
    /// running counter keeps the time that elapsed before the nudge.
    pub fn adjust_by(&mut self, delta_ms: i64) {
        self.current_ms = clamp(i64::from(self.current_ms) + delta_ms);
    }

    pub fn toggle_running(&mut self, now: Instant) {
        self.set_running(!self.running, now);
    }

    pub fn set_running(&mut self, running: bool, now: Instant) {
        self.running = running;
        self.last_observed = now;
    }

    /// Advances a running counter by the wall-clock time since it was last observed.
    ///
    /// Only whole milliseconds are consumed; the remainder is carried into the next
    /// tick by advancing the observation point by exactly the amount applied. An
    /// irregular tick period therefore never loses or gains time.
    pub fn tick(&mut self, now: Instant) {
        if !self.running {
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_observed);
        let elapsed_ms: i64 = elapsed.as_millis().try_into().unwrap_or(i64::MAX);
        let delta = self.direction.signed(elapsed_ms);

        self.current_ms = clamp(i64::from(self.current_ms).saturating_add(delta));
        self.last_observed += Duration::from_millis(elapsed_ms.unsigned_abs());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use more_asserts::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-5), 0);
        assert_eq!(clamp(0), 0);
        assert_eq!(clamp(90_000), 90_000);
        assert_eq!(clamp(5_999_000), 5_999_000);
        assert_eq!(clamp(6_000_000), MAX_COUNTER_MS);
        assert_eq!(clamp(i64::MIN), 0);
        assert_eq!(clamp(i64::MAX), MAX_COUNTER_MS);
    }

    #[test]
    fn test_set_absolute_resets_observation() {
        let start = Instant::now();
        let later = start + Duration::from_secs(7);
        let mut counter = Counter::new(Direction::CountDown, start);

        counter.set_absolute(-1_000, later);
        assert_eq!(counter.current_ms(), 0);
        assert_eq!(counter.last_observed(), later);

        counter.set_absolute(7_000_000, later);
        assert_eq!(counter.current_ms(), MAX_COUNTER_MS);
    }

    #[test]
    fn test_adjust_saturates() {
        let start = Instant::now();
        let mut counter = Counter::new(Direction::CountDown, start);

        counter.adjust_by(-1_000);
        assert_eq!(counter.current_ms(), 0);
        counter.adjust_by(1_000);
        assert_eq!(counter.current_ms(), 1_000);

        counter.set_absolute(MAX_COUNTER_MS.into(), start);
        counter.adjust_by(1_000);
        assert_eq!(counter.current_ms(), MAX_COUNTER_MS);
        counter.adjust_by(-1_000);
        assert_eq!(counter.current_ms(), MAX_COUNTER_MS - 1_000);
    }

    #[test]
    fn test_tick_while_stopped_does_nothing() {
        let start = Instant::now();
        let mut counter = Counter::new(Direction::CountDown, start);
        counter.set_absolute(30_000, start);

        counter.tick(start + Duration::from_secs(10));
        assert_eq!(counter.current_ms(), 30_000);
        assert_eq!(counter.last_observed(), start);
    }

    #[test]
    fn test_toggle_then_tick_has_no_catch_up() {
        let start = Instant::now();
        let mut counter = Counter::new(Direction::CountDown, start);
        counter.set_absolute(30_000, start);

        let toggled = start + Duration::from_secs(20);
        counter.toggle_running(toggled);
        assert!(counter.is_running());
        counter.tick(counter.last_observed());
        assert_eq!(counter.current_ms(), 30_000);
    }

    #[test]
    fn test_tick_counts_down_and_up() {
        let start = Instant::now();
        let mut down = Counter::new(Direction::CountDown, start);
        let mut up = Counter::new(Direction::CountUp, start);
        down.set_absolute(10_000, start);
        up.set_absolute(10_000, start);
        down.toggle_running(start);
        up.toggle_running(start);

        let now = start + Duration::from_millis(2_500);
        down.tick(now);
        up.tick(now);
        assert_eq!(down.current_ms(), 7_500);
        assert_eq!(up.current_ms(), 12_500);
        assert_eq!(down.last_observed(), now);
    }

    #[test]
    fn test_irregular_ticks_sum_to_elapsed() {
        let start = Instant::now();
        let mut counter = Counter::new(Direction::CountDown, start);
        counter.set_absolute(60_000, start);
        counter.toggle_running(start);

        let mut now = start;
        for step_us in [500_700u64, 499_100, 1_730_300, 20, 269_880] {
            now += Duration::from_micros(step_us);
            counter.tick(now);
        }

        // 3.0 seconds in total
        assert_eq!(counter.current_ms(), 57_000);
        assert_le!(counter.last_observed(), now);
    }

    #[test]
    fn test_tick_clamps_at_bounds() {
        let start = Instant::now();
        let mut down = Counter::new(Direction::CountDown, start);
        down.set_absolute(1_000, start);
        down.toggle_running(start);
        down.tick(start + Duration::from_secs(5));
        assert_eq!(down.current_ms(), 0);

        let mut up = Counter::new(Direction::CountUp, start);
        up.set_absolute((MAX_COUNTER_MS - 500).into(), start);
        up.toggle_running(start);
        up.tick(start + Duration::from_secs(5));
        assert_eq!(up.current_ms(), MAX_COUNTER_MS);
    }

    #[test]
    fn test_mixed_sequence_stays_in_range() {
        let start = Instant::now();
        let mut counter = Counter::new(Direction::CountUp, start);
        counter.toggle_running(start);
        let mut now = start;

        for i in 0..200i64 {
            now += Duration::from_millis(((i * 7_919) % 90_000) as u64);
            if i % 3 == 0 {
                counter.adjust_by((i - 100) * 41_000);
            }
            if i % 17 == 0 {
                counter.set_direction(match counter.direction() {
                    Direction::CountDown => Direction::CountUp,
                    Direction::CountUp => Direction::CountDown,
                });
            }
            counter.tick(now);
            assert_le!(counter.current_ms(), MAX_COUNTER_MS);
        }
    }
}

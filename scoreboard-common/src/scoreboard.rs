//! The complete state of one scoreboard instance as owned by the control surface.
//!
//! Every mutation returns the relay messages that describe it. The caller decides
//! where those go; nothing in here holds a handle to a display.

use crate::{
    bundles::SideBundle,
    counter::Direction,
    drawing_support::MAX_SCORE,
    relay::{PenaltyTime, RelayMessage},
    side::Side,
    timer_set::{CounterId, PenaltySlot, TimerSet},
};
use tokio::time::Instant;

pub const UNTITLED: &str = "Untitled Scoreboard";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(u8);

impl Score {
    pub fn new(value: i32) -> Self {
        Self(value.clamp(0, MAX_SCORE.into()) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn changed_by(self, delta: i32) -> Self {
        Self::new(i32::from(self.0).saturating_add(delta))
    }
}

impl core::fmt::Display for Score {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scoreboard {
    pub timers: TimerSet,
    scores: SideBundle<Score>,
    names: SideBundle<String>,
    logos: SideBundle<Option<String>>,
    title: String,
    scale: f64,
}

impl Scoreboard {
    pub fn new(clock_direction: Direction, penalty_direction: Direction, now: Instant) -> Self {
        Self {
            timers: TimerSet::new(clock_direction, penalty_direction, now),
            scores: SideBundle::default(),
            names: SideBundle::default(),
            logos: SideBundle::default(),
            title: String::new(),
            scale: 1.0,
        }
    }

    /// A fresh copy of a template, observed from `now`
    pub fn instantiate(&self, title: String, now: Instant) -> Self {
        let mut new = self.clone();
        new.timers.reobserve(now);
        new.title = title;
        new
    }

    pub fn score(&self, side: Side) -> Score {
        self.scores[side]
    }

    pub fn name(&self, side: Side) -> &str {
        &self.names[side]
    }

    pub fn logo(&self, side: Side) -> Option<&str> {
        self.logos[side].as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn change_score(&mut self, side: Side, delta: i32) -> RelayMessage {
        self.scores[side] = self.scores[side].changed_by(delta);
        self.score_message(side)
    }

    pub fn set_name(&mut self, side: Side, name: String) -> RelayMessage {
        self.names[side] = name;
        self.name_message(side)
    }

    pub fn set_logo(&mut self, side: Side, image_path: String) -> RelayMessage {
        self.logos[side] = Some(image_path.clone());
        RelayMessage::SetLogo {
            home: side.is_home(),
            image_path,
        }
    }

    pub fn set_title(&mut self, title: String) -> RelayMessage {
        self.title = title;
        RelayMessage::TitleSet(self.title.clone())
    }

    /// Non-finite or non-positive zoom factors are ignored
    pub fn set_scale(&mut self, scale: f64) -> Option<RelayMessage> {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
            Some(RelayMessage::Scale(scale))
        } else {
            None
        }
    }

    pub fn toggle_clock(&mut self, now: Instant) {
        self.timers.toggle_master_running(now);
    }

    pub fn set_clock_direction(&mut self, direction: Direction) {
        self.timers.clock.set_direction(direction);
    }

    pub fn set_clock(&mut self, minutes: i64, seconds: i64, now: Instant) -> RelayMessage {
        self.timers.set_clock(minutes, seconds, now);
        self.counter_message(CounterId::Clock)
    }

    /// The operator's one second nudge, applied to every counter
    pub fn nudge_clock(&mut self, delta_ms: i64) -> Vec<RelayMessage> {
        self.timers.nudge_all(delta_ms);
        CounterId::ALL
            .into_iter()
            .map(|id| self.counter_message(id))
            .collect()
    }

    pub fn set_penalty(
        &mut self,
        side: Side,
        slot: PenaltySlot,
        minutes: i64,
        seconds: i64,
        now: Instant,
    ) -> RelayMessage {
        self.timers.set_penalty(side, slot, minutes, seconds, now);
        self.counter_message(CounterId::Penalty(side, slot))
    }

    /// Advances the running counters and reports each of them, changed or not
    pub fn tick(&mut self, now: Instant) -> Vec<RelayMessage> {
        self.timers.tick(now);
        self.timers
            .running()
            .map(|(id, _)| self.counter_message(id))
            .collect()
    }

    pub fn counter_message(&self, id: CounterId) -> RelayMessage {
        let counter = self.timers.counter(id);
        match id {
            CounterId::Clock => RelayMessage::UpdateClock(counter.as_secs_f64()),
            CounterId::Penalty(team, PenaltySlot::First) => {
                RelayMessage::SetPenaltyTime(PenaltyTime {
                    team,
                    time: counter.as_secs_f64(),
                })
            }
            CounterId::Penalty(team, PenaltySlot::Second) => {
                RelayMessage::SetPenaltyTime2(PenaltyTime {
                    team,
                    time: counter.as_secs_f64(),
                })
            }
        }
    }

    fn score_message(&self, side: Side) -> RelayMessage {
        RelayMessage::SetScore {
            score: self.scores[side].value(),
            home: side.is_home(),
        }
    }

    fn name_message(&self, side: Side) -> RelayMessage {
        RelayMessage::SetName {
            home: side.is_home(),
            change_to: self.names[side].clone(),
        }
    }

    fn logo_message(&self, side: Side) -> Option<RelayMessage> {
        self.logos[side].as_ref().map(|path| RelayMessage::SetLogo {
            home: side.is_home(),
            image_path: path.clone(),
        })
    }

    /// Everything a display needs to rebuild its view of this scoreboard
    pub fn full_state(&self) -> Vec<RelayMessage> {
        let mut messages = vec![
            RelayMessage::TitleSet(self.title.clone()),
            RelayMessage::Scale(self.scale),
        ];
        messages.extend(CounterId::ALL.into_iter().map(|id| self.counter_message(id)));
        for side in [Side::Home, Side::Guest] {
            messages.push(self.score_message(side));
            messages.push(self.name_message(side));
            messages.extend(self.logo_message(side));
        }
        messages
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::time::Duration;

    fn board(now: Instant) -> Scoreboard {
        Scoreboard::new(Direction::CountDown, Direction::CountDown, now)
    }

    #[test]
    fn test_score_clamps() {
        let now = Instant::now();
        let mut sb = board(now);

        let mut last = None;
        for _ in 0..9 {
            last = Some(sb.change_score(Side::Home, 1));
        }
        assert_eq!(sb.score(Side::Home).value(), 9);
        assert_eq!(sb.score(Side::Home).to_string(), "09");
        assert_eq!(
            last,
            Some(RelayMessage::SetScore {
                score: 9,
                home: true
            })
        );

        sb.change_score(Side::Home, 500);
        assert_eq!(
            sb.change_score(Side::Home, 1),
            RelayMessage::SetScore {
                score: 99,
                home: true
            }
        );
        assert_eq!(
            sb.change_score(Side::Guest, -1),
            RelayMessage::SetScore {
                score: 0,
                home: false
            }
        );
    }

    #[test]
    fn test_clock_scenario() {
        let start = Instant::now();
        let mut sb = board(start);

        assert_eq!(sb.set_clock(1, 30, start), RelayMessage::UpdateClock(90.0));
        sb.toggle_clock(start);

        let updates = sb.tick(start + Duration::from_millis(5_000));
        assert_eq!(sb.timers.clock.current_ms(), 85_000);
        assert_eq!(updates.len(), 5);
        assert_eq!(updates[0], RelayMessage::UpdateClock(85.0));
    }

    #[test]
    fn test_tick_reports_only_running() {
        let start = Instant::now();
        let mut sb = board(start);
        assert!(sb.tick(start + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_nudge_reports_every_counter() {
        let start = Instant::now();
        let mut sb = board(start);
        sb.set_penalty(Side::Guest, PenaltySlot::Second, 0, 30, start);

        let updates = sb.nudge_clock(1_000);
        assert_eq!(
            updates,
            vec![
                RelayMessage::UpdateClock(1.0),
                RelayMessage::SetPenaltyTime(PenaltyTime {
                    team: Side::Home,
                    time: 1.0
                }),
                RelayMessage::SetPenaltyTime(PenaltyTime {
                    team: Side::Guest,
                    time: 1.0
                }),
                RelayMessage::SetPenaltyTime2(PenaltyTime {
                    team: Side::Home,
                    time: 1.0
                }),
                RelayMessage::SetPenaltyTime2(PenaltyTime {
                    team: Side::Guest,
                    time: 31.0
                }),
            ]
        );
    }

    #[test]
    fn test_scale_rejects_nonsense() {
        let now = Instant::now();
        let mut sb = board(now);
        assert_eq!(sb.set_scale(1.5), Some(RelayMessage::Scale(1.5)));
        assert_eq!(sb.set_scale(0.0), None);
        assert_eq!(sb.set_scale(f64::NAN), None);
        assert_eq!(sb.scale(), 1.5);
    }

    #[test]
    fn test_full_state() {
        let now = Instant::now();
        let mut sb = board(now).instantiate("Scoreboard #4".to_string(), now);
        sb.set_logo(Side::Guest, "/logos/guest.png".to_string());
        sb.change_score(Side::Home, 2);

        let state = sb.full_state();
        // title, scale, five counters, two scores, two names and one logo
        assert_eq!(state.len(), 12);
        assert_eq!(state[0], RelayMessage::TitleSet("Scoreboard #4".to_string()));
        assert!(state.contains(&RelayMessage::SetScore {
            score: 2,
            home: true
        }));
        assert!(state.contains(&RelayMessage::SetLogo {
            home: false,
            image_path: "/logos/guest.png".to_string()
        }));
        assert!(!state.iter().any(|m| matches!(m, RelayMessage::SetLogo { home: true, .. })));
    }
}

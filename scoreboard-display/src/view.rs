//! The display side model of one scoreboard. It only ever changes by applying relayed
//! messages, in the order they arrive.

use log::*;
use scoreboard_common::{
    InstanceId,
    bundles::SideBundle,
    digits::{digit_location, format_score, format_time, split_score, split_time, whole_secs},
    relay::{PenaltyTime, RelayMessage, Relayed},
    scoreboard::UNTITLED,
    side::Side,
    timer_set::PenaltySlot,
};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreboardView {
    instance: InstanceId,
    digits_dir: String,
    clock: u32,
    penalties: SideBundle<[u32; 2]>,
    scores: SideBundle<u8>,
    names: SideBundle<String>,
    logos: SideBundle<Option<String>>,
    title: String,
    zoom: f64,
}

fn slot_index(slot: PenaltySlot) -> usize {
    match slot {
        PenaltySlot::First => 0,
        PenaltySlot::Second => 1,
    }
}

impl ScoreboardView {
    pub fn new(instance: InstanceId, digits_dir: String) -> Self {
        Self {
            instance,
            digits_dir,
            clock: 0,
            penalties: SideBundle::default(),
            scores: SideBundle::default(),
            names: SideBundle::default(),
            logos: SideBundle::default(),
            title: String::new(),
            zoom: 1.0,
        }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Applies a message if it is addressed to this scoreboard. Returns whether the
    /// view changed.
    pub fn apply(&mut self, relayed: &Relayed) -> bool {
        if relayed.id != self.instance {
            trace!("Ignoring {} for {}", relayed.message.kind(), relayed.id);
            return false;
        }
        self.apply_message(&relayed.message)
    }

    pub fn apply_message(&mut self, message: &RelayMessage) -> bool {
        let before = self.clone();
        match message {
            RelayMessage::UpdateClock(secs) => self.clock = whole_secs(*secs),
            RelayMessage::SetScore { score, home } => {
                self.scores[Side::from_home(*home)] = *score;
            }
            RelayMessage::SetName { home, change_to } => {
                self.names[Side::from_home(*home)] = change_to.clone();
            }
            RelayMessage::SetLogo { home, image_path } => {
                self.logos[Side::from_home(*home)] = Some(image_path.clone());
            }
            RelayMessage::TitleSet(title) => self.title = title.clone(),
            RelayMessage::Scale(zoom) => {
                if zoom.is_finite() && *zoom > 0.0 {
                    self.zoom = *zoom;
                } else {
                    warn!("Ignoring zoom factor {zoom}");
                }
            }
            RelayMessage::SetPenaltyTime(PenaltyTime { team, time }) => {
                self.penalties[*team][slot_index(PenaltySlot::First)] = whole_secs(*time);
            }
            RelayMessage::SetPenaltyTime2(PenaltyTime { team, time }) => {
                self.penalties[*team][slot_index(PenaltySlot::Second)] = whole_secs(*time);
            }
        }
        *self != before
    }

    /// The window title, falling back to a placeholder when none is set
    pub fn title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn name(&self, side: Side) -> &str {
        &self.names[side]
    }

    pub fn logo(&self, side: Side) -> Option<&str> {
        self.logos[side].as_deref()
    }

    pub fn clock_secs(&self) -> u32 {
        self.clock
    }

    pub fn penalty_secs(&self, side: Side, slot: PenaltySlot) -> u32 {
        self.penalties[side][slot_index(slot)]
    }

    pub fn score(&self, side: Side) -> u8 {
        self.scores[side]
    }

    fn time_digits(&self, secs: u32) -> [String; 4] {
        split_time(secs).map(|digit| digit_location(&self.digits_dir, digit))
    }

    /// Image paths for the four clock digit slots
    pub fn clock_digits(&self) -> [String; 4] {
        self.time_digits(self.clock)
    }

    pub fn penalty_digits(&self, side: Side, slot: PenaltySlot) -> [String; 4] {
        self.time_digits(self.penalty_secs(side, slot))
    }

    pub fn score_digits(&self, side: Side) -> [String; 2] {
        split_score(self.scores[side]).map(|digit| digit_location(&self.digits_dir, digit))
    }
}

impl Display for ScoreboardView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let penalties = |side: Side| {
            let [first, second] = self.penalties[side];
            format!("{} {}", format_time(first), format_time(second))
        };
        write!(
            f,
            "[{}] {} {} - {} {} | {} | penalties {} / {}",
            self.title(),
            self.names.home,
            format_score(self.scores.home),
            format_score(self.scores.guest),
            self.names.guest,
            format_time(self.clock),
            penalties(Side::Home),
            penalties(Side::Guest),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn view() -> ScoreboardView {
        ScoreboardView::new(InstanceId(1), "digits".to_string())
    }

    #[test]
    fn test_clock_rendering() {
        let mut v = view();
        assert!(v.apply(&Relayed::new(InstanceId(1), RelayMessage::UpdateClock(90.0))));
        assert_eq!(
            v.clock_digits(),
            ["digits/0.svg", "digits/1.svg", "digits/3.svg", "digits/0.svg"]
        );

        assert!(v.apply(&Relayed::new(InstanceId(1), RelayMessage::UpdateClock(85.4))));
        assert_eq!(format_time(v.clock_secs()), "01:25");

        // Same whole second, nothing to redraw
        assert!(!v.apply(&Relayed::new(InstanceId(1), RelayMessage::UpdateClock(85.9))));
    }

    #[test]
    fn test_other_instances_are_ignored() {
        let mut v = view();
        assert!(!v.apply(&Relayed::new(
            InstanceId(2),
            RelayMessage::TitleSet("Other".to_string())
        )));
        assert_eq!(v.title(), UNTITLED);
    }

    #[test]
    fn test_scores_names_logos() {
        let mut v = view();
        v.apply_message(&RelayMessage::SetScore {
            score: 9,
            home: true,
        });
        v.apply_message(&RelayMessage::SetName {
            home: false,
            change_to: "Narwhals".to_string(),
        });
        v.apply_message(&RelayMessage::SetLogo {
            home: true,
            image_path: "/logos/home.png".to_string(),
        });

        assert_eq!(v.score_digits(Side::Home), ["digits/0.svg", "digits/9.svg"]);
        assert_eq!(v.score(Side::Guest), 0);
        assert_eq!(v.name(Side::Guest), "Narwhals");
        assert_eq!(v.logo(Side::Home), Some("/logos/home.png"));
        assert_eq!(v.logo(Side::Guest), None);
    }

    #[test]
    fn test_penalty_slots() {
        let mut v = view();
        v.apply_message(&RelayMessage::SetPenaltyTime(PenaltyTime {
            team: Side::Guest,
            time: 120.0,
        }));
        v.apply_message(&RelayMessage::SetPenaltyTime2(PenaltyTime {
            team: Side::Guest,
            time: 59.5,
        }));

        assert_eq!(v.penalty_secs(Side::Guest, PenaltySlot::First), 120);
        assert_eq!(v.penalty_secs(Side::Guest, PenaltySlot::Second), 59);
        assert_eq!(v.penalty_secs(Side::Home, PenaltySlot::First), 0);
        assert_eq!(
            v.penalty_digits(Side::Guest, PenaltySlot::First),
            ["digits/0.svg", "digits/2.svg", "digits/0.svg", "digits/0.svg"]
        );
    }

    #[test]
    fn test_title_and_zoom() {
        let mut v = view();
        v.apply_message(&RelayMessage::TitleSet("Finals".to_string()));
        assert_eq!(v.title(), "Finals");
        v.apply_message(&RelayMessage::TitleSet(String::new()));
        assert_eq!(v.title(), UNTITLED);

        assert!(v.apply_message(&RelayMessage::Scale(1.5)));
        assert!(!v.apply_message(&RelayMessage::Scale(-2.0)));
        assert_eq!(v.zoom(), 1.5);
    }

    #[test]
    fn test_text_rendering() {
        let mut v = view();
        v.apply_message(&RelayMessage::TitleSet("Pool A".to_string()));
        v.apply_message(&RelayMessage::UpdateClock(85.0));
        v.apply_message(&RelayMessage::SetScore {
            score: 3,
            home: true,
        });
        v.apply_message(&RelayMessage::SetName {
            home: true,
            change_to: "Orcas".to_string(),
        });
        v.apply_message(&RelayMessage::SetName {
            home: false,
            change_to: "Rays".to_string(),
        });
        v.apply_message(&RelayMessage::SetPenaltyTime(PenaltyTime {
            team: Side::Home,
            time: 30.0,
        }));
        assert_eq!(
            v.to_string(),
            "[Pool A] Orcas 03 - 00 Rays | 01:25 | penalties 00:30 00:00 / 00:00 00:00"
        );
    }
}

use scoreboard_common::counter::Direction;
use serde_derive::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relay {
    /// Port that display surfaces connect to
    pub port: u16,
}

impl Default for Relay {
    fn default() -> Self {
        Self { port: 8200 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub tick_period_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick_period_ms: 500,
        }
    }
}

/// Starting state of every newly created scoreboard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub clock_direction: Direction,
    pub penalty_direction: Direction,
    /// `{id}` is replaced with the instance number
    pub title: String,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            clock_direction: Direction::CountDown,
            penalty_direction: Direction::CountDown,
            title: "Scoreboard #{id}".to_string(),
        }
    }
}

impl Template {
    pub fn title_for(&self, id: u32) -> String {
        self.title.replace("{id}", &id.to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub relay: Relay,
    pub timing: Timing,
    pub template: Template,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ser_relay() {
        let r: Relay = Default::default();
        let serialized = toml::to_string(&r).unwrap();
        let deser = toml::from_str(&serialized);
        assert_eq!(deser, Ok(r));
    }

    #[test]
    fn test_ser_template() {
        let t = Template {
            clock_direction: Direction::CountUp,
            ..Default::default()
        };
        let serialized = toml::to_string(&t).unwrap();
        assert!(serialized.contains("clock_direction = \"count-up\""));
        let deser = toml::from_str(&serialized);
        assert_eq!(deser, Ok(t));
    }

    #[test]
    fn test_ser_config() {
        let config: Config = Default::default();
        let serialized = toml::to_string(&config).unwrap();
        let deser = toml::from_str(&serialized);
        assert_eq!(deser, Ok(config));
    }

    #[test]
    fn test_title_for() {
        assert_eq!(Template::default().title_for(3), "Scoreboard #3");
    }
}

//! Messages carried from the control surface to display surfaces.
//!
//! On the wire each message is one line of JSON. A display opens the stream with a
//! [`Subscribe`] line, after which every line it receives is a [`Relayed`] message.

use crate::side::Side;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u32);

impl core::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTime {
    pub team: Side,
    /// Seconds remaining (or elapsed, for a counter counting up)
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum RelayMessage {
    /// Game clock, in seconds
    UpdateClock(f64),
    SetScore {
        score: u8,
        home: bool,
    },
    SetName {
        home: bool,
        #[serde(rename = "changeTo")]
        change_to: String,
    },
    SetLogo {
        home: bool,
        image_path: String,
    },
    TitleSet(String),
    Scale(f64),
    SetPenaltyTime(PenaltyTime),
    #[serde(rename = "set-penalty-time2")]
    SetPenaltyTime2(PenaltyTime),
}

impl RelayMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpdateClock(_) => "update-clock",
            Self::SetScore { .. } => "set-score",
            Self::SetName { .. } => "set-name",
            Self::SetLogo { .. } => "set-logo",
            Self::TitleSet(_) => "title-set",
            Self::Scale(_) => "scale",
            Self::SetPenaltyTime(_) => "set-penalty-time",
            Self::SetPenaltyTime2(_) => "set-penalty-time2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relayed {
    pub id: InstanceId,
    pub message: RelayMessage,
}

impl Relayed {
    pub fn new(id: InstanceId, message: RelayMessage) -> Self {
        Self { id, message }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscribe {
    pub subscribe: InstanceId,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Frame is empty")]
    Empty,
}

pub fn encode_line<T: Serialize>(value: &T) -> Result<Vec<u8>, FrameError> {
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn decode_line<T: for<'de> Deserialize<'de>>(line: &str) -> Result<T, FrameError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(FrameError::Empty);
    }
    Ok(serde_json::from_str(line)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let relayed = Relayed::new(
            InstanceId(3),
            RelayMessage::SetName {
                home: true,
                change_to: "Manila".to_string(),
            },
        );
        assert_eq!(
            serde_json::to_value(&relayed).unwrap(),
            json!({"id": 3, "message": {"kind": "set-name", "payload": {"home": true, "changeTo": "Manila"}}})
        );

        let relayed = Relayed::new(
            InstanceId(1),
            RelayMessage::SetPenaltyTime2(PenaltyTime {
                team: Side::Guest,
                time: 120.0,
            }),
        );
        assert_eq!(
            serde_json::to_value(&relayed).unwrap(),
            json!({"id": 1, "message": {"kind": "set-penalty-time2", "payload": {"team": "guest", "time": 120.0}}})
        );

        assert_eq!(
            serde_json::to_value(RelayMessage::TitleSet(String::new())).unwrap(),
            json!({"kind": "title-set", "payload": ""})
        );
        assert_eq!(
            serde_json::to_value(RelayMessage::UpdateClock(85.5)).unwrap(),
            json!({"kind": "update-clock", "payload": 85.5})
        );
    }

    #[test]
    fn test_kind_matches_tag() {
        let messages = [
            RelayMessage::UpdateClock(1.0),
            RelayMessage::SetScore {
                score: 4,
                home: false,
            },
            RelayMessage::SetLogo {
                home: true,
                image_path: "/tmp/logo.png".to_string(),
            },
            RelayMessage::Scale(1.25),
            RelayMessage::SetPenaltyTime(PenaltyTime {
                team: Side::Home,
                time: 3.0,
            }),
        ];
        for message in messages {
            let value = serde_json::to_value(&message).unwrap();
            assert_eq!(value["kind"], message.kind());
        }
    }

    #[test]
    fn test_line_framing() {
        let bytes = encode_line(&Subscribe {
            subscribe: InstanceId(2),
        })
        .unwrap();
        assert_eq!(bytes, b"{\"subscribe\":2}\n");

        let line = std::str::from_utf8(&bytes).unwrap();
        let decoded: Subscribe = decode_line(line).unwrap();
        assert_eq!(decoded.subscribe, InstanceId(2));

        assert!(matches!(decode_line::<Subscribe>("  \n"), Err(FrameError::Empty)));
        assert!(matches!(
            decode_line::<Relayed>("{\"id\": 1}"),
            Err(FrameError::Json(_))
        ));
    }
}

//! Line based operator input. Each line is one [`Command`], or a JSON [`HostEvent`]
//! when it starts with `{`, which lets another process stand in for the window host.
//!
//! Edits go to the focused scoreboard unless the line starts with `@<id>`:
//!
//! ```text
//! new | close [id] | focus <id> | list | typing on|off
//! window <id> show|hide|focus|close
//! key home|guest|clock|tabs increase|decrease|toggle|next|previous|new|close
//! [@id] score <side> <delta>       [@id] toggle
//! [@id] nudge <seconds>            [@id] clock <minutes> <seconds>
//! [@id] direction up|down          [@id] penalty <side> 1|2 <minutes> <seconds>
//! [@id] name <side> <text>         [@id] logo <side> [path]
//! [@id] title [text]               [@id] scale <factor>
//! ```
//!
//! Numbers that don't parse count as zero.

use crate::{
    control::{Command, Edit},
    host::{HostEvent, KeyAction, KeyArg, KeyboardInput, WindowAction},
};
use log::*;
use scoreboard_common::{
    InstanceId,
    counter::Direction,
    relay::decode_line,
    side::{ParseSideError, Side},
    timer_set::PenaltySlot,
};
use std::str::FromStr;
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
};

#[derive(Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command `{0}`")]
    Unknown(String),
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("`{0}` is not a scoreboard id")]
    InvalidId(String),
    #[error("Expected {expected}, got `{found}`")]
    Invalid {
        expected: &'static str,
        found: String,
    },
    #[error(transparent)]
    Side(#[from] ParseSideError),
    #[error("Invalid host event: {0}")]
    HostEvent(String),
}

pub type Result<T> = std::result::Result<T, CommandError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleLine {
    Command(Command),
    Host(HostEvent),
    Empty,
}

fn int_or_zero<T: FromStr + Default>(field: &str) -> T {
    field.parse().unwrap_or_default()
}

fn parse_id(field: &str) -> Result<InstanceId> {
    field
        .trim_start_matches('#')
        .parse()
        .map(InstanceId)
        .map_err(|_| CommandError::InvalidId(field.to_string()))
}

struct Fields<'a> {
    words: std::str::SplitWhitespace<'a>,
    rest: &'a str,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            words: line.split_whitespace(),
            rest: line,
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        let word = self.words.next()?;
        // `word` is a subslice of `rest`, so what follows it is the unsplit remainder
        if let Some(start) = self.rest.find(word) {
            self.rest = &self.rest[start + word.len()..];
        }
        Some(word)
    }

    fn require(&mut self, what: &'static str) -> Result<&'a str> {
        self.next().ok_or(CommandError::Missing(what))
    }

    /// Everything not yet consumed, with surrounding whitespace removed
    fn remainder(&self) -> &'a str {
        self.rest.trim()
    }
}

fn parse_key_action(field: &str) -> Result<KeyAction> {
    match field {
        "home" => Ok(KeyAction::Home),
        "guest" => Ok(KeyAction::Guest),
        "clock" => Ok(KeyAction::Clock),
        "tabs" => Ok(KeyAction::Tabs),
        _ => Err(CommandError::Invalid {
            expected: "home, guest, clock or tabs",
            found: field.to_string(),
        }),
    }
}

fn parse_key_arg(field: &str) -> Result<KeyArg> {
    match field {
        "increase" => Ok(KeyArg::Increase),
        "decrease" => Ok(KeyArg::Decrease),
        "toggle" => Ok(KeyArg::Toggle),
        "next" => Ok(KeyArg::Next),
        "previous" => Ok(KeyArg::Previous),
        "new" => Ok(KeyArg::New),
        "close" => Ok(KeyArg::Close),
        _ => Err(CommandError::Invalid {
            expected: "a key argument",
            found: field.to_string(),
        }),
    }
}

fn parse_window_action(field: &str) -> Result<WindowAction> {
    match field {
        "show" => Ok(WindowAction::Show),
        "hide" => Ok(WindowAction::Hide),
        "focus" => Ok(WindowAction::Focus),
        "close" => Ok(WindowAction::Close),
        _ => Err(CommandError::Invalid {
            expected: "show, hide, focus or close",
            found: field.to_string(),
        }),
    }
}

fn parse_edit(verb: &str, fields: &mut Fields) -> Result<Edit> {
    let edit = match verb {
        "score" => Edit::Score {
            side: fields.require("side")?.parse()?,
            delta: int_or_zero(fields.require("score change")?.trim_start_matches('+')),
        },
        "toggle" | "start" | "stop" => Edit::ToggleClock,
        "nudge" => {
            let secs: f64 = fields
                .require("seconds")?
                .trim_start_matches('+')
                .parse()
                .unwrap_or(0.0);
            let ms = if secs.is_finite() {
                (secs * 1_000.0).round() as i64
            } else {
                0
            };
            Edit::NudgeClock(ms)
        }
        "clock" => Edit::SetClock {
            minutes: int_or_zero(fields.require("minutes")?),
            seconds: int_or_zero(fields.next().unwrap_or("0")),
        },
        "direction" => Edit::ClockDirection(match fields.require("direction")? {
            "up" | "count-up" => Direction::CountUp,
            "down" | "count-down" => Direction::CountDown,
            other => {
                return Err(CommandError::Invalid {
                    expected: "up or down",
                    found: other.to_string(),
                });
            }
        }),
        "penalty" => Edit::Penalty {
            side: fields.require("side")?.parse()?,
            slot: match fields.require("penalty slot")? {
                "1" => PenaltySlot::First,
                "2" => PenaltySlot::Second,
                other => {
                    return Err(CommandError::Invalid {
                        expected: "penalty slot 1 or 2",
                        found: other.to_string(),
                    });
                }
            },
            minutes: int_or_zero(fields.require("minutes")?),
            seconds: int_or_zero(fields.next().unwrap_or("0")),
        },
        "name" => Edit::Name {
            side: fields.require("side")?.parse()?,
            name: fields.remainder().to_string(),
        },
        "logo" => {
            let side: Side = fields.require("side")?.parse()?;
            match fields.remainder() {
                "" => Edit::ChooseLogo(side),
                path => Edit::Logo {
                    side,
                    image_path: path.to_string(),
                },
            }
        }
        "title" => Edit::Title(fields.remainder().to_string()),
        "scale" => Edit::Scale(fields.require("zoom factor")?.parse().unwrap_or(0.0)),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(edit)
}

impl FromStr for ConsoleLine {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        if line.starts_with('{') {
            return decode_line(line)
                .map(Self::Host)
                .map_err(|e| CommandError::HostEvent(e.to_string()));
        }

        let mut fields = Fields::new(line);
        let mut verb = fields.require("command")?;
        let target = match verb.strip_prefix('@') {
            Some(id) => {
                let id = parse_id(id)?;
                verb = fields.require("command")?;
                Some(id)
            }
            None => None,
        };

        let command = match verb {
            "new" if target.is_none() => Command::NewInstance,
            "close" => match fields.next() {
                Some(id) => Command::Close(Some(parse_id(id)?)),
                None => Command::Close(target),
            },
            "focus" if target.is_none() => Command::Focus(parse_id(fields.require("id")?)?),
            "list" => Command::List,
            "typing" => Command::Typing(match fields.require("on or off")? {
                "on" | "true" => true,
                "off" | "false" => false,
                other => {
                    return Err(CommandError::Invalid {
                        expected: "on or off",
                        found: other.to_string(),
                    });
                }
            }),
            "window" => {
                let target = Some(parse_id(fields.require("id")?)?);
                let action = parse_window_action(fields.require("window action")?)?;
                Command::Window { target, action }
            }
            "key" => {
                let action = parse_key_action(fields.require("key action")?)?;
                let arg = parse_key_arg(fields.require("key argument")?)?;
                return Ok(Self::Host(HostEvent::KeyboardInput(KeyboardInput {
                    action,
                    arg,
                })));
            }
            verb => Command::Edit {
                target,
                edit: parse_edit(verb, &mut fields)?,
            },
        };
        Ok(Self::Command(command))
    }
}

/// Feeds operator lines to the control loop until input ends or the loop goes away
pub async fn console_loop<R: AsyncBufRead + Unpin>(
    reader: R,
    commands: mpsc::Sender<Command>,
    host_events: mpsc::UnboundedSender<HostEvent>,
) {
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("End of operator input");
                return;
            }
            Err(e) => {
                error!("Reading operator input failed: {e}");
                return;
            }
        };

        let sent = match line.parse::<ConsoleLine>() {
            Ok(ConsoleLine::Command(command)) => commands.send(command).await.is_ok(),
            Ok(ConsoleLine::Host(event)) => host_events.send(event).is_ok(),
            Ok(ConsoleLine::Empty) => true,
            Err(e) => {
                warn!("{e}");
                true
            }
        };
        if !sent {
            debug!("Control loop stopped, no longer reading operator input");
            return;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::io::BufReader;

    fn command(line: &str) -> Command {
        match line.parse() {
            Ok(ConsoleLine::Command(command)) => command,
            other => panic!("Expected a command from {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_instance_commands() {
        assert_eq!(command("new"), Command::NewInstance);
        assert_eq!(command("close"), Command::Close(None));
        assert_eq!(command("close 3"), Command::Close(Some(InstanceId(3))));
        assert_eq!(command("@2 close"), Command::Close(Some(InstanceId(2))));
        assert_eq!(command("focus #4"), Command::Focus(InstanceId(4)));
        assert_eq!(command("list"), Command::List);
        assert_eq!(command("typing on"), Command::Typing(true));
        assert_eq!(
            command("window 1 hide"),
            Command::Window {
                target: Some(InstanceId(1)),
                action: WindowAction::Hide
            }
        );
    }

    #[test]
    fn test_edits() {
        assert_eq!(
            command("score home +1"),
            Command::focused(Edit::Score {
                side: Side::Home,
                delta: 1
            })
        );
        assert_eq!(
            command("@3 score g -2"),
            Command::Edit {
                target: Some(InstanceId(3)),
                edit: Edit::Score {
                    side: Side::Guest,
                    delta: -2
                }
            }
        );
        assert_eq!(command("toggle"), Command::focused(Edit::ToggleClock));
        assert_eq!(command("nudge -1"), Command::focused(Edit::NudgeClock(-1_000)));
        assert_eq!(
            command("clock 1 30"),
            Command::focused(Edit::SetClock {
                minutes: 1,
                seconds: 30
            })
        );
        assert_eq!(
            command("direction up"),
            Command::focused(Edit::ClockDirection(Direction::CountUp))
        );
        assert_eq!(
            command("penalty guest 2 2 0"),
            Command::focused(Edit::Penalty {
                side: Side::Guest,
                slot: PenaltySlot::Second,
                minutes: 2,
                seconds: 0
            })
        );
        assert_eq!(
            command("name home   Tide  Turners "),
            Command::focused(Edit::Name {
                side: Side::Home,
                name: "Tide  Turners".to_string()
            })
        );
        assert_eq!(command("logo home"), Command::focused(Edit::ChooseLogo(Side::Home)));
        assert_eq!(
            command("logo guest /srv/logos/guest team.png"),
            Command::focused(Edit::Logo {
                side: Side::Guest,
                image_path: "/srv/logos/guest team.png".to_string()
            })
        );
        assert_eq!(command("title"), Command::focused(Edit::Title(String::new())));
        assert_eq!(command("scale 1.5"), Command::focused(Edit::Scale(1.5)));
    }

    #[test]
    fn test_bad_numbers_become_zero() {
        assert_eq!(
            command("penalty home 1 abc 45"),
            Command::focused(Edit::Penalty {
                side: Side::Home,
                slot: PenaltySlot::First,
                minutes: 0,
                seconds: 45
            })
        );
        assert_eq!(
            command("clock x"),
            Command::focused(Edit::SetClock {
                minutes: 0,
                seconds: 0
            })
        );
        assert_eq!(
            command("score home lots"),
            Command::focused(Edit::Score {
                side: Side::Home,
                delta: 0
            })
        );
        assert_eq!(command("nudge soon"), Command::focused(Edit::NudgeClock(0)));
        assert_eq!(command("scale big"), Command::focused(Edit::Scale(0.0)));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            "dance".parse::<ConsoleLine>(),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "score".parse::<ConsoleLine>(),
            Err(CommandError::Missing("side"))
        );
        assert_eq!(
            "score away 1".parse::<ConsoleLine>(),
            Err(CommandError::Side(ParseSideError("away".to_string())))
        );
        assert_eq!(
            "@x score home 1".parse::<ConsoleLine>(),
            Err(CommandError::InvalidId("x".to_string()))
        );
        assert!(matches!(
            "penalty home 3 1 0".parse::<ConsoleLine>(),
            Err(CommandError::Invalid { .. })
        ));
        assert!(matches!(
            "{\"event\": \"explode\"}".parse::<ConsoleLine>(),
            Err(CommandError::HostEvent(_))
        ));
        assert_eq!("   ".parse::<ConsoleLine>(), Ok(ConsoleLine::Empty));
    }

    #[test]
    fn test_host_lines() {
        assert_eq!(
            "key clock toggle".parse::<ConsoleLine>(),
            Ok(ConsoleLine::Host(HostEvent::KeyboardInput(KeyboardInput {
                action: KeyAction::Clock,
                arg: KeyArg::Toggle
            })))
        );
        assert_eq!(
            r#"{"event": "create-instance"}"#.parse::<ConsoleLine>(),
            Ok(ConsoleLine::Host(HostEvent::CreateInstance))
        );
    }

    #[tokio::test]
    async fn test_console_loop() {
        let input = b"new\nbogus\n\nkey tabs next\nscore home 1\n".as_slice();
        let (command_tx, mut command_rx) = mpsc::channel(8);
        let (host_tx, mut host_rx) = mpsc::unbounded_channel();

        console_loop(BufReader::new(input), command_tx, host_tx).await;

        assert_eq!(command_rx.recv().await, Some(Command::NewInstance));
        assert_eq!(
            command_rx.recv().await,
            Some(Command::focused(Edit::Score {
                side: Side::Home,
                delta: 1
            }))
        );
        assert_eq!(command_rx.recv().await, None);
        assert_eq!(
            host_rx.recv().await,
            Some(HostEvent::KeyboardInput(KeyboardInput {
                action: KeyAction::Tabs,
                arg: KeyArg::Next
            }))
        );
    }
}

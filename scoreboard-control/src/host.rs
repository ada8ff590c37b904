//! The boundary between the control surface and whatever owns its windows.
//!
//! The control surface asks the host for things with [`HostRequest`]s and hears back
//! through [`HostEvent`]s. The headless host here has no windows at all and answers
//! from the operator console.

use log::*;
use scoreboard_common::{InstanceId, side::Side};
use serde_derive::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowAction {
    Show,
    Hide,
    Focus,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    /// A scoreboard was created and wants a window of its own
    OpenWindow(InstanceId),
    Window { id: InstanceId, action: WindowAction },
    ChooseLogo { id: InstanceId, side: Side },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Home,
    Guest,
    Clock,
    Tabs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyArg {
    Increase,
    Decrease,
    Toggle,
    Next,
    Previous,
    New,
    Close,
}

/// A global shortcut, already mapped by the host to an action on the scoreboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardInput {
    pub action: KeyAction,
    pub arg: KeyArg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum HostEvent {
    CreateInstance,
    InstanceDestroyed {
        id: InstanceId,
    },
    LogoChosen {
        id: InstanceId,
        side: Side,
        image_path: String,
    },
    KeyboardInput(KeyboardInput),
}

pub trait Host {
    fn request(&mut self, request: HostRequest);
}

/// A host without windows. Closing a scoreboard destroys it straight away and there is
/// no file chooser, so logos have to be given by path.
#[derive(Debug)]
pub struct HeadlessHost {
    events: mpsc::UnboundedSender<HostEvent>,
}

impl HeadlessHost {
    pub fn new(events: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self { events }
    }

    fn emit(&self, event: HostEvent) {
        if self.events.send(event).is_err() {
            warn!("Host event dropped, the control loop has stopped");
        }
    }
}

impl Host for HeadlessHost {
    fn request(&mut self, request: HostRequest) {
        match request {
            HostRequest::OpenWindow(id) => {
                info!("Scoreboard {id} is ready, displays can subscribe to {}", id.0)
            }
            HostRequest::Window {
                id,
                action: WindowAction::Close,
            } => {
                info!("Closing scoreboard {id}");
                self.emit(HostEvent::InstanceDestroyed { id });
            }
            HostRequest::Window { id, action } => {
                debug!("Ignoring {action:?} for {id}, there are no windows")
            }
            HostRequest::ChooseLogo { id, side } => warn!(
                "No file chooser available, use `logo {} {side} <path>` for {id}",
                id.0
            ),
        }
    }
}

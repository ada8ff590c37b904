use crate::{
    host::{Host, HostEvent, HostRequest, KeyAction, KeyArg, KeyboardInput, WindowAction},
    registry::{self, Registry, RegistryError},
    relay::Outbox,
    scheduler::{TickScheduler, tick_all},
};
use log::*;
use scoreboard_common::{
    InstanceId,
    counter::Direction,
    relay::{RelayMessage, Relayed},
    side::Side,
    timer_set::{CounterId, PenaltySlot},
};
use std::future::Future;
use tokio::{
    select,
    sync::mpsc,
    time::Instant,
};

const NUDGE_MS: i64 = 1_000;

/// A change to one scoreboard
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Score { side: Side, delta: i32 },
    ToggleClock,
    NudgeClock(i64),
    SetClock { minutes: i64, seconds: i64 },
    ClockDirection(Direction),
    Penalty {
        side: Side,
        slot: PenaltySlot,
        minutes: i64,
        seconds: i64,
    },
    Name { side: Side, name: String },
    Logo { side: Side, image_path: String },
    ChooseLogo(Side),
    Title(String),
    Scale(f64),
}

/// What the operator can ask of the control surface. A target of `None` means the
/// focused scoreboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NewInstance,
    Close(Option<InstanceId>),
    Focus(InstanceId),
    Window {
        target: Option<InstanceId>,
        action: WindowAction,
    },
    Edit {
        target: Option<InstanceId>,
        edit: Edit,
    },
    /// Set while a text field has focus, keyboard shortcuts are dropped meanwhile
    Typing(bool),
    List,
}

impl Command {
    pub fn focused(edit: Edit) -> Self {
        Self::Edit { target: None, edit }
    }
}

#[derive(Debug)]
pub struct Controller<O: Outbox, H: Host> {
    registry: Registry,
    outbox: O,
    host: H,
    typing: bool,
}

impl<O: Outbox, H: Host> Controller<O, H> {
    pub fn new(registry: Registry, outbox: O, host: H) -> Self {
        Self {
            registry,
            outbox,
            host,
            typing: false,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn relay(&mut self, id: InstanceId, messages: impl IntoIterator<Item = RelayMessage>) {
        let batch = messages
            .into_iter()
            .map(|message| Relayed::new(id, message))
            .collect();
        self.outbox.send_all(batch);
    }

    fn resolve(&self, target: Option<InstanceId>) -> registry::Result<InstanceId> {
        match target {
            Some(id) if self.registry.is_live(id) => Ok(id),
            Some(id) => Err(RegistryError::NotLive(id)),
            None => self.registry.focus().ok_or(RegistryError::NoFocus),
        }
    }

    pub fn create(&mut self, now: Instant) -> InstanceId {
        let id = self.registry.create(now);
        self.host.request(HostRequest::OpenWindow(id));

        // Displays may already be waiting on this id
        if let Ok(sb) = self.registry.get(id) {
            let state = sb.full_state();
            self.relay(id, state);
        }
        id
    }

    pub fn destroy(&mut self, id: InstanceId) {
        match self.registry.destroy(id) {
            Ok(_) => self.outbox.detach(id),
            Err(e) => warn!("Ignoring destroy: {e}"),
        }
    }

    /// Brings a newly attached display up to date
    pub fn display_attached(&mut self, id: InstanceId) {
        match self.registry.get(id) {
            Ok(sb) => {
                let state = sb.full_state();
                debug!("Sending full state of {id} ({} messages)", state.len());
                self.relay(id, state);
            }
            Err(e) => info!("Display attached, but {e}. It will wait"),
        }
    }

    pub fn tick(&mut self, now: Instant) -> usize {
        tick_all(&mut self.registry, &mut self.outbox, now)
    }

    pub fn apply(&mut self, command: Command, now: Instant) {
        match command {
            Command::NewInstance => {
                self.create(now);
            }
            Command::Close(target) => self.window(target, WindowAction::Close),
            Command::Focus(id) => match self.registry.set_focus(id) {
                Ok(()) => self.host.request(HostRequest::Window {
                    id,
                    action: WindowAction::Focus,
                }),
                Err(e) => warn!("Ignoring focus change: {e}"),
            },
            Command::Window { target, action } => self.window(target, action),
            Command::Edit { target, edit } => {
                let result = self
                    .resolve(target)
                    .and_then(|id| self.edit(id, edit.clone(), now));
                if let Err(e) = result {
                    warn!("Ignoring {edit:?}: {e}");
                }
            }
            Command::Typing(typing) => {
                debug!("Text input focused: {typing}");
                self.typing = typing;
            }
            Command::List => self.log_status(),
        }
    }

    fn window(&mut self, target: Option<InstanceId>, action: WindowAction) {
        match self.resolve(target) {
            Ok(id) => self.host.request(HostRequest::Window { id, action }),
            Err(e) => warn!("Ignoring window {action:?}: {e}"),
        }
    }

    fn edit(&mut self, id: InstanceId, edit: Edit, now: Instant) -> registry::Result<()> {
        if let Edit::ChooseLogo(side) = edit {
            self.host.request(HostRequest::ChooseLogo { id, side });
            return Ok(());
        }

        let sb = self.registry.get_mut(id)?;
        let messages = match edit {
            Edit::Score { side, delta } => vec![sb.change_score(side, delta)],
            Edit::ToggleClock => {
                sb.toggle_clock(now);
                info!(
                    "Clock of {id} {}",
                    if sb.timers.clock_is_running() {
                        "started"
                    } else {
                        "stopped"
                    }
                );
                CounterId::ALL
                    .into_iter()
                    .map(|counter| sb.counter_message(counter))
                    .collect()
            }
            Edit::NudgeClock(delta_ms) => sb.nudge_clock(delta_ms),
            Edit::SetClock { minutes, seconds } => vec![sb.set_clock(minutes, seconds, now)],
            Edit::ClockDirection(direction) => {
                info!("Clock of {id} is now {direction}");
                sb.set_clock_direction(direction);
                vec![]
            }
            Edit::Penalty {
                side,
                slot,
                minutes,
                seconds,
            } => vec![sb.set_penalty(side, slot, minutes, seconds, now)],
            Edit::Name { side, name } => vec![sb.set_name(side, name)],
            Edit::Logo { side, image_path } => vec![sb.set_logo(side, image_path)],
            Edit::Title(title) => vec![sb.set_title(title)],
            Edit::Scale(scale) => {
                let message = sb.set_scale(scale);
                if message.is_none() {
                    warn!("Ignoring zoom factor {scale} for {id}");
                }
                message.into_iter().collect()
            }
            Edit::ChooseLogo(_) => vec![],
        };

        self.relay(id, messages);
        Ok(())
    }

    pub fn handle_host_event(&mut self, event: HostEvent, now: Instant) {
        match event {
            HostEvent::CreateInstance => {
                self.create(now);
            }
            HostEvent::InstanceDestroyed { id } => self.destroy(id),
            HostEvent::LogoChosen {
                id,
                side,
                image_path,
            } => self.apply(
                Command::Edit {
                    target: Some(id),
                    edit: Edit::Logo { side, image_path },
                },
                now,
            ),
            HostEvent::KeyboardInput(input) => self.route_keyboard(input, now),
        }
    }

    fn route_keyboard(&mut self, input: KeyboardInput, now: Instant) {
        if self.typing {
            trace!("Dropping {input:?} while typing");
            return;
        }
        if self.registry.focus().is_none()
            && !matches!(
                input,
                KeyboardInput {
                    action: KeyAction::Tabs,
                    arg: KeyArg::New
                }
            )
        {
            debug!("Dropping {input:?}, no scoreboard has focus");
            return;
        }

        let command = match (input.action, input.arg) {
            (KeyAction::Tabs, KeyArg::New) => Command::NewInstance,
            (KeyAction::Tabs, KeyArg::Close) => Command::Close(None),
            (KeyAction::Tabs, KeyArg::Next | KeyArg::Previous) => {
                let moved = if input.arg == KeyArg::Next {
                    self.registry.focus_next()
                } else {
                    self.registry.focus_previous()
                };
                match moved {
                    Ok(id) => Command::Window {
                        target: Some(id),
                        action: WindowAction::Focus,
                    },
                    Err(e) => {
                        warn!("Can't switch tabs: {e}");
                        return;
                    }
                }
            }
            (side @ (KeyAction::Home | KeyAction::Guest), KeyArg::Increase | KeyArg::Decrease) => {
                Command::focused(Edit::Score {
                    side: Side::from_home(side == KeyAction::Home),
                    delta: if input.arg == KeyArg::Increase { 1 } else { -1 },
                })
            }
            (KeyAction::Clock, KeyArg::Toggle) => Command::focused(Edit::ToggleClock),
            (KeyAction::Clock, KeyArg::Increase) => Command::focused(Edit::NudgeClock(NUDGE_MS)),
            (KeyAction::Clock, KeyArg::Decrease) => Command::focused(Edit::NudgeClock(-NUDGE_MS)),
            _ => {
                debug!("No binding for {input:?}");
                return;
            }
        };
        self.apply(command, now);
    }

    fn log_status(&self) {
        if self.typing {
            info!("Keyboard shortcuts are paused while typing");
        }
        if self.registry.is_empty() {
            info!("No scoreboards");
            return;
        }
        for id in self.registry.list() {
            if let Ok(sb) = self.registry.get(id) {
                let marker = if self.registry.focus() == Some(id) {
                    "*"
                } else {
                    " "
                };
                info!(
                    "{marker}{id} {:?} {} {} - {} {} clock {}",
                    sb.title(),
                    sb.name(Side::Home),
                    sb.score(Side::Home),
                    sb.score(Side::Guest),
                    sb.name(Side::Guest),
                    scoreboard_common::digits::format_time(sb.timers.clock.whole_secs()),
                );
            }
        }
    }

    /// Owns the scoreboards until `shutdown` resolves. Ticks, operator commands, host
    /// events and display attachments are handled one at a time, in arrival order.
    pub async fn run_loop(
        mut self,
        mut inputs: Inputs,
        mut scheduler: TickScheduler,
        shutdown: impl Future<Output = ()>,
    ) -> Self {
        tokio::pin!(shutdown);
        let mut commands_open = true;
        let mut host_open = true;

        info!(
            "Control loop running, ticking every {:?}",
            scheduler.period()
        );
        loop {
            select! {
                now = scheduler.next_tick() => {
                    self.tick(now);
                }
                command = inputs.commands.recv(), if commands_open => match command {
                    Some(command) => {
                        debug!("Command: {command:?}");
                        self.apply(command, Instant::now());
                    }
                    None => {
                        info!("Operator input closed");
                        commands_open = false;
                    }
                },
                event = inputs.host_events.recv(), if host_open => match event {
                    Some(event) => {
                        debug!("Host event: {event:?}");
                        self.handle_host_event(event, Instant::now());
                    }
                    None => {
                        info!("Host closed");
                        host_open = false;
                    }
                },
                Some(id) = inputs.attached.recv() => self.display_attached(id),
                _ = &mut shutdown => {
                    info!("Shutting down control loop");
                    break;
                }
            }
        }
        self
    }
}

#[derive(Debug)]
pub struct Inputs {
    pub commands: mpsc::Receiver<Command>,
    pub host_events: mpsc::UnboundedReceiver<HostEvent>,
    pub attached: mpsc::UnboundedReceiver<InstanceId>,
}

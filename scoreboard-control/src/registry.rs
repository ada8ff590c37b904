use crate::config::Template;
use log::*;
use scoreboard_common::{InstanceId, scoreboard::Scoreboard};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::time::Instant;

/// The live scoreboards, keyed by id, and which one the operator is working on.
///
/// Ids start at 1 and only ever grow, so a destroyed id is never handed out again.
#[derive(Debug)]
pub struct Registry {
    template: Scoreboard,
    template_config: Template,
    instances: BTreeMap<InstanceId, Scoreboard>,
    next_id: u32,
    focus: Option<InstanceId>,
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Scoreboard {0} is not live")]
    NotLive(InstanceId),
    #[error("No scoreboard has focus")]
    NoFocus,
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl Registry {
    pub fn new(template_config: Template, now: Instant) -> Self {
        Self {
            template: Scoreboard::new(
                template_config.clock_direction,
                template_config.penalty_direction,
                now,
            ),
            template_config,
            instances: BTreeMap::new(),
            next_id: 1,
            focus: None,
        }
    }

    /// Clones the template into a new live scoreboard and focuses it
    pub fn create(&mut self, now: Instant) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;

        let title = self.template_config.title_for(id.0);
        self.instances
            .insert(id, self.template.instantiate(title, now));
        self.focus = Some(id);
        info!("Created scoreboard {id}");
        id
    }

    /// Removes a scoreboard. If it had focus, focus moves to the next live id above
    /// it, wrapping around to the lowest, or is cleared when nothing is left.
    pub fn destroy(&mut self, id: InstanceId) -> Result<Scoreboard> {
        let removed = self
            .instances
            .remove(&id)
            .ok_or(RegistryError::NotLive(id))?;

        if self.focus == Some(id) {
            self.focus = self.next_after(id);
            match self.focus {
                Some(new) => info!("Destroyed scoreboard {id}, focus moved to {new}"),
                None => info!("Destroyed scoreboard {id}, no scoreboards remain"),
            }
        } else {
            info!("Destroyed scoreboard {id}");
        }

        Ok(removed)
    }

    pub fn list(&self) -> Vec<InstanceId> {
        self.instances.keys().copied().collect()
    }

    pub fn is_live(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn focus(&self) -> Option<InstanceId> {
        self.focus
    }

    pub fn set_focus(&mut self, id: InstanceId) -> Result<()> {
        if !self.is_live(id) {
            return Err(RegistryError::NotLive(id));
        }
        debug!("Focus set to {id}");
        self.focus = Some(id);
        Ok(())
    }

    /// The live id after `id`, wrapping around. `id` itself need not be live.
    pub fn next_after(&self, id: InstanceId) -> Option<InstanceId> {
        self.instances
            .range(id..)
            .map(|(k, _)| *k)
            .find(|k| *k != id)
            .or_else(|| self.instances.keys().next().copied())
            .filter(|k| *k != id || self.instances.len() == 1)
    }

    /// The live id before `id`, wrapping around. `id` itself need not be live.
    pub fn previous_before(&self, id: InstanceId) -> Option<InstanceId> {
        self.instances
            .range(..id)
            .next_back()
            .map(|(k, _)| *k)
            .or_else(|| self.instances.keys().next_back().copied())
    }

    pub fn focus_next(&mut self) -> Result<InstanceId> {
        let current = self.focus.ok_or(RegistryError::NoFocus)?;
        let next = self.next_after(current).ok_or(RegistryError::NoFocus)?;
        self.set_focus(next)?;
        Ok(next)
    }

    pub fn focus_previous(&mut self) -> Result<InstanceId> {
        let current = self.focus.ok_or(RegistryError::NoFocus)?;
        let previous = self
            .previous_before(current)
            .ok_or(RegistryError::NoFocus)?;
        self.set_focus(previous)?;
        Ok(previous)
    }

    pub fn get(&self, id: InstanceId) -> Result<&Scoreboard> {
        self.instances.get(&id).ok_or(RegistryError::NotLive(id))
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Result<&mut Scoreboard> {
        self.instances
            .get_mut(&id)
            .ok_or(RegistryError::NotLive(id))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (InstanceId, &mut Scoreboard)> {
        self.instances.iter_mut().map(|(id, sb)| (*id, sb))
    }
}

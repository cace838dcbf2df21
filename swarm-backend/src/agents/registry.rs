//! Agent catalog plus the operator-controlled selection state
//!
//! `available` is fixed at startup. `selected` and `active` are process-wide
//! and read by every request, so they sit behind a single RwLock and are
//! always updated together to keep `active ⊆ selected ⊆ available`.

use super::agent::Agent;
use super::types::AgentDescriptor;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// Leading slash command, e.g. "/swap 1 ETH to USDC"
lazy_static::lazy_static! {
    static ref COMMAND_RE: Regex = Regex::new(r"^\s*/([A-Za-z0-9_-]+)(?:\s+|$)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("agent '{0}' is not selected")]
    NotSelected(String),
}

#[derive(Debug, Default)]
struct SelectionState {
    selected: HashSet<String>,
    active: Option<String>,
}

pub struct AgentRegistry {
    available: Vec<AgentDescriptor>,
    agents: HashMap<String, Arc<dyn Agent>>,
    state: RwLock<SelectionState>,
}

impl AgentRegistry {
    /// Build a registry whose initial selection is the first
    /// `default_selected` catalog entries.
    pub fn new(available: Vec<AgentDescriptor>, default_selected: usize) -> Self {
        let selected = available
            .iter()
            .take(default_selected)
            .map(|d| d.name.clone())
            .collect();

        Self {
            available,
            agents: HashMap::new(),
            state: RwLock::new(SelectionState {
                selected,
                active: None,
            }),
        }
    }

    /// Attach the implementation for a catalog entry
    pub fn register_agent(&mut self, agent: Arc<dyn Agent>) -> Result<(), RegistryError> {
        let name = agent.name().to_string();
        if self.get_descriptor(&name).is_none() {
            return Err(RegistryError::UnknownAgent(name));
        }
        log::debug!("[REGISTRY] Registered agent: {}", name);
        self.agents.insert(name, agent);
        Ok(())
    }

    pub fn get_available_agents(&self) -> &[AgentDescriptor] {
        &self.available
    }

    pub fn get_descriptor(&self, name: &str) -> Option<&AgentDescriptor> {
        self.available.iter().find(|d| d.name == name)
    }

    pub fn get_agent(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    /// Selected names in catalog order
    pub fn get_selected_agents(&self) -> Vec<String> {
        let state = self.state.read();
        self.available
            .iter()
            .filter(|d| state.selected.contains(&d.name))
            .map(|d| d.name.clone())
            .collect()
    }

    /// Replace the selection. Rejects the whole list if any name is unknown,
    /// leaving the previous selection untouched.
    pub fn set_selected_agents(&self, names: &[String]) -> Result<(), RegistryError> {
        if let Some(unknown) = names.iter().find(|n| self.get_descriptor(n).is_none()) {
            return Err(RegistryError::UnknownAgent(unknown.clone()));
        }

        let mut state = self.state.write();
        state.selected = names.iter().cloned().collect();
        if let Some(active) = state.active.take() {
            if state.selected.contains(&active) {
                state.active = Some(active);
            } else {
                log::info!("[REGISTRY] Cleared active agent '{}' (deselected)", active);
            }
        }
        log::info!("[REGISTRY] Selected agents: {:?}", names);
        Ok(())
    }

    pub fn get_active_agent(&self) -> Option<String> {
        self.state.read().active.clone()
    }

    pub fn set_active_agent(&self, name: &str) -> Result<(), RegistryError> {
        if self.get_descriptor(name).is_none() {
            return Err(RegistryError::UnknownAgent(name.to_string()));
        }
        let mut state = self.state.write();
        if !state.selected.contains(name) {
            return Err(RegistryError::NotSelected(name.to_string()));
        }
        state.active = Some(name.to_string());
        log::info!("[REGISTRY] Active agent: {}", name);
        Ok(())
    }

    pub fn clear_active_agent(&self) {
        self.state.write().active = None;
    }

    /// Split a leading `/command` off the prompt. Returns `(None, prompt)`
    /// unchanged when the token does not match any catalog command.
    pub fn parse_command(&self, prompt: &str) -> (Option<String>, String) {
        let Some(caps) = COMMAND_RE.captures(prompt) else {
            return (None, prompt.to_string());
        };
        let token = &caps[1];
        match self
            .available
            .iter()
            .find(|d| d.command.eq_ignore_ascii_case(token))
        {
            Some(descriptor) => {
                let remaining = prompt[caps.get(0).map_or(0, |m| m.end())..].trim().to_string();
                (Some(descriptor.name.clone()), remaining)
            }
            None => (None, prompt.to_string()),
        }
    }

    /// Selected agents not yet attempted in this resolution, in catalog
    /// order. Upload-gated agents are hidden until the conversation has a file.
    pub fn get_available_unattempted_agents(
        &self,
        attempted: &HashSet<String>,
        has_uploaded_file: bool,
    ) -> Vec<AgentDescriptor> {
        let state = self.state.read();
        self.available
            .iter()
            .filter(|d| state.selected.contains(&d.name))
            .filter(|d| !attempted.contains(&d.name))
            .filter(|d| has_uploaded_file || !d.upload_required)
            .cloned()
            .collect()
    }
}

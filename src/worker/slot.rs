use burn::tensor::backend::AutodiffBackend;

use crate::error::EngineError;
use crate::rl::DqnAgent;

/// Lifecycle of the worker's single agent
pub enum AgentSlot<B: AutodiffBackend> {
    Empty,
    Ready(Box<DqnAgent<B>>),
}

impl<B: AutodiffBackend> AgentSlot<B> {
    /// Return the current agent, creating one with `create` when needed
    ///
    /// `fresh` discards an existing agent first. The boolean is `true` when an
    /// existing agent was reused.
    pub fn acquire<F>(&mut self, fresh: bool, create: F) -> Result<(&mut DqnAgent<B>, bool), EngineError>
    where
        F: FnOnce() -> Result<DqnAgent<B>, EngineError>,
    {
        if fresh {
            self.discard();
        }

        let reused = self.is_ready();
        if !reused {
            *self = AgentSlot::Ready(Box::new(create()?));
        }

        match self {
            AgentSlot::Ready(agent) => Ok((agent.as_mut(), reused)),
            AgentSlot::Empty => Err(EngineError::NoAgent),
        }
    }

    pub fn get(&self) -> Option<&DqnAgent<B>> {
        match self {
            AgentSlot::Ready(agent) => Some(agent),
            AgentSlot::Empty => None,
        }
    }

    /// Install `agent`, dropping any previous one
    pub fn replace(&mut self, agent: DqnAgent<B>) {
        *self = AgentSlot::Ready(Box::new(agent));
    }

    pub fn discard(&mut self) {
        *self = AgentSlot::Empty;
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AgentSlot::Ready(_))
    }
}

impl<B: AutodiffBackend> Default for AgentSlot<B> {
    fn default() -> Self {
        AgentSlot::Empty
    }
}

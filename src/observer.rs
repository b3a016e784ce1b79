use crate::car::CarAgent;
use crate::policy::PolicyId;

/// Read-only view of a generation right after a tick completes.
#[derive(Clone, Copy, Debug)]
pub struct TickFrame<'a> {
    pub generation: u64,
    pub tick: u32,
    pub alive: usize,
    pub ids: &'a [PolicyId],
    pub agents: &'a [CarAgent],
}

impl<'a> TickFrame<'a> {
    pub fn iter_alive(&self) -> impl Iterator<Item = (PolicyId, &'a CarAgent)> + 'a {
        let ids = self.ids;
        let agents = self.agents;
        ids.iter()
            .copied()
            .zip(agents.iter())
            .filter(|(_, agent)| agent.is_alive())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    /// Stop the generation now; fitness accrued so far is still reported.
    Abort,
}

/// Presentation and cancellation hook. Observers see the simulation but never
/// mutate it, so results are the same with or without one attached.
pub trait TickObserver {
    fn on_tick(&mut self, frame: &TickFrame<'_>) -> TickControl;
}

pub struct NullObserver;

impl TickObserver for NullObserver {
    fn on_tick(&mut self, _frame: &TickFrame<'_>) -> TickControl {
        TickControl::Continue
    }
}

impl<F> TickObserver for F
where
    F: FnMut(&TickFrame<'_>) -> TickControl,
{
    fn on_tick(&mut self, frame: &TickFrame<'_>) -> TickControl {
        self(frame)
    }
}

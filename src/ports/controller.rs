//! Controller port - what the simulation loop drives once per tick

use crate::{
    Result,
    reward::Transition,
    sensors::{Action, SensorVector},
    state_space::DiscreteState,
};

/// Input delivered by the simulation loop on every tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub sensors: SensorVector,
    pub episode: u64,
    /// Ticks taken so far in this episode.
    pub step: u64,
    pub end_of_episode: bool,
}

/// What the controller did with a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub action: Action,
    pub state: DiscreteState,
    /// Reward credited to the previous action, when an update took place.
    pub reward: Option<f64>,
}

/// Controller trait - the capability set every racing controller provides
///
/// # Event Sequence
///
/// For every tick of an episode the loop calls [`Controller::observe`],
/// which discretizes the sensors, credits the previous action (when
/// learning), and picks the next action. When the episode ends the loop
/// calls [`Controller::end_episode`].
///
/// The individual steps are exposed as well so that a loop with its own
/// bookkeeping can drive them directly.
pub trait Controller {
    /// Discrete state for `sensors`, with `previous` feeding delta features.
    fn discretize(&self, sensors: &SensorVector, previous: Option<&SensorVector>)
    -> DiscreteState;

    /// Pick the action for `state` under the exploration policy.
    fn take_action(&mut self, state: &DiscreteState, episode: u64) -> Result<Action>;

    /// Temporal-difference update of `Q(old_state, action)`.
    fn update(
        &mut self,
        old_state: &DiscreteState,
        new_state: &DiscreteState,
        action: Action,
        reward: f64,
        end_of_episode: bool,
    ) -> Result<()>;

    fn compute_reward(&self, transition: &Transition<'_>) -> f64;

    /// Handle one tick. With `learn` unset the value table is left untouched.
    fn observe(&mut self, tick: &Tick, learn: bool) -> Result<TickOutcome>;

    /// Forget per-episode memory so the next tick starts a fresh trajectory.
    fn end_episode(&mut self) {}

    fn name(&self) -> &str;
}

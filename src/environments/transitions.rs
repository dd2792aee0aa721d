use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use tracing::info;
use crate::environments::abstract_env::{AbstractBlocksEnv, SymbolicObservation};
use crate::environments::symbolic::Literal;
use crate::environments::LowLevelEnv;
use crate::utils::utils_errors::BlocksimError;

/// One symbolic `(state, action, next_state)` sample for a rule learner.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub state: SymbolicObservation,
    pub action: Literal,
    pub next_state: SymbolicObservation
}
impl Transition {
    pub fn effects(&self) -> Effects {
        Effects {
            added: self.next_state.difference(&self.state).cloned().collect(),
            removed: self.state.difference(&self.next_state).cloned().collect()
        }
    }
}

/// Literals that became true and literals that stopped being true over one transition.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Effects {
    pub added: BTreeSet<Literal>,
    pub removed: BTreeSet<Literal>
}
impl Effects {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransitionCollectionConfig {
    pub num_episodes: usize,
    pub episode_length: usize
}
impl Default for TransitionCollectionConfig {
    fn default() -> Self {
        Self { num_episodes: 5, episode_length: 10 }
    }
}

/// Runs uniformly random actions (drawn from the env's seeded action space) and records every
/// transition.  An episode ends early on a terminal step or when no action can be grounded.
pub fn collect_transitions<E: LowLevelEnv>(env: &mut AbstractBlocksEnv<E>, config: &TransitionCollectionConfig) -> Result<Vec<Transition>, BlocksimError> {
    let mut out_vec = vec![];

    for episode in 0..config.num_episodes {
        let (mut state, _) = env.reset()?;
        for _ in 0..config.episode_length {
            let action = match env.action_space_mut().sample() {
                None => { break; }
                Some(a) => { a }
            };
            let (next_state, _, done, _) = env.step(&action)?;
            out_vec.push(Transition { state, action, next_state: next_state.clone() });
            state = next_state;
            if done { break; }
        }
        info!(episode, num_transitions = out_vec.len(), "collected episode");
    }

    Ok(out_vec)
}

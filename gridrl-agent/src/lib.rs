//! Learning rules on tabular preference/value tables.
//!
//! Every agent implements [`Agent`](gridrl_core::Agent) and
//! [`Policy`](gridrl_core::Policy): step-wise rules (SARSA, Q-learning,
//! Actor-Critic) update in `observe`, episodic rules (Monte-Carlo, REINFORCE)
//! in `end_episode`, and PPO whenever its horizon is reached.
pub mod actor_critic;
pub mod mc;
pub mod ppo;
pub mod qlearning;
pub mod reinforce;
pub mod sarsa;
pub mod semi_gradient;
pub mod util;

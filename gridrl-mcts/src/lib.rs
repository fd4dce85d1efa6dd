//! Monte-Carlo tree search.
//!
//! [`Mcts`] plays any [`Game`] by growing a fresh search tree for every
//! decision: UCT selection, one-shot expansion, uniformly random rollouts
//! and win-count backpropagation. [`TicTacToe`] is the bundled game; it is
//! also an [`Env`](gridrl_core::Env) so that tabular agents can learn it by
//! self-play.
mod config;
mod game;
mod search;
mod tictactoe;
mod tree;
pub use config::MctsConfig;
pub use game::Game;
pub use search::Mcts;
pub use tictactoe::{Mark, TicTacToe, TicTacToeConfig};
pub use tree::{Node, Tree};

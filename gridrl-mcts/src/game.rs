//! Games searchable by [`Mcts`](crate::Mcts).
use anyhow::Result;
use std::fmt::Debug;

/// A deterministic, alternating-move game with perfect information.
///
/// A position is cloned for every search iteration, so implementors should be
/// cheap to clone.
pub trait Game: Clone {
    /// Identity of a player.
    type Player: Copy + Eq + Debug;

    /// The player to move.
    fn current_player(&self) -> Self::Player;

    /// Actions available to the player to move. Empty in a terminal position.
    fn legal_actions(&self) -> Vec<usize>;

    /// Plays `act` for the player to move.
    ///
    /// Fails on an illegal action, leaving the position unchanged.
    fn apply(&mut self, act: usize) -> Result<()>;

    /// Returns `true` if the game is over.
    fn is_terminal(&self) -> bool;

    /// The winner of a finished game, `None` for a draw or an unfinished game.
    fn winner(&self) -> Option<Self::Player>;
}

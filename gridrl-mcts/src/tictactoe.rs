//! Tic-tac-toe.
use crate::Game;
use anyhow::{bail, Result};
use gridrl_core::{record::Record, Env, GridRlError, StateKey, Step};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A player of [`TicTacToe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Cross.
    X,

    /// Nought.
    O,
}

impl Mark {
    /// The other player.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    fn code(self) -> i64 {
        match self {
            Mark::X => 1,
            Mark::O => 2,
        }
    }

    fn from_code(c: i64) -> Option<Self> {
        match c {
            1 => Some(Mark::X),
            2 => Some(Mark::O),
            _ => None,
        }
    }
}

/// Configuration of [`TicTacToe`] as an environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicTacToeConfig {
    /// Player making the first move.
    pub first_player: Mark,
}

impl Default for TicTacToeConfig {
    fn default() -> Self {
        Self {
            first_player: Mark::X,
        }
    }
}

/// A 3x3 board. Cells are numbered row by row from 0 to 8, and an action is
/// the cell to mark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicTacToe {
    cells: [Option<Mark>; 9],
    to_move: Mark,
    first_player: Mark,
}

impl TicTacToe {
    /// Empty board with `first` to move.
    pub fn new(first: Mark) -> Self {
        Self {
            cells: [None; 9],
            to_move: first,
            first_player: first,
        }
    }

    /// Contents of cell `i`.
    pub fn cell(&self, i: usize) -> Option<Mark> {
        self.cells.get(i).copied().flatten()
    }

    /// Key of the position: the nine cells (0 empty, 1 X, 2 O) and the mover.
    pub fn state_key(&self) -> StateKey {
        Self::encode(&self.cells, self.to_move)
    }

    fn encode(cells: &[Option<Mark>; 9], to_move: Mark) -> StateKey {
        let mut v: Vec<i64> = cells.iter().map(|c| c.map_or(0, Mark::code)).collect();
        v.push(to_move.code());
        StateKey::new(v)
    }

    fn decode(key: &StateKey) -> Option<[Option<Mark>; 9]> {
        let c = key.components();
        if c.len() != 10 {
            return None;
        }
        let mut cells = [None; 9];
        for (cell, code) in cells.iter_mut().zip(c.iter()) {
            *cell = Mark::from_code(*code);
        }
        Some(cells)
    }

    fn line_winner(cells: &[Option<Mark>; 9]) -> Option<Mark> {
        LINES.iter().find_map(|l| match cells[l[0]] {
            Some(m) if cells[l[1]] == Some(m) && cells[l[2]] == Some(m) => Some(m),
            _ => None,
        })
    }

    fn finished(cells: &[Option<Mark>; 9]) -> bool {
        Self::line_winner(cells).is_some() || cells.iter().all(|c| c.is_some())
    }

    fn empty_cells(cells: &[Option<Mark>; 9]) -> Vec<usize> {
        (0..9).filter(|i| cells[*i].is_none()).collect()
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new(Mark::X)
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(3) {
            for c in row {
                let s = match c {
                    Some(Mark::X) => 'X',
                    Some(Mark::O) => 'O',
                    None => '.',
                };
                write!(f, "{}", s)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Game for TicTacToe {
    type Player = Mark;

    fn current_player(&self) -> Mark {
        self.to_move
    }

    fn legal_actions(&self) -> Vec<usize> {
        if Self::finished(&self.cells) {
            vec![]
        } else {
            Self::empty_cells(&self.cells)
        }
    }

    fn apply(&mut self, act: usize) -> Result<()> {
        if act >= 9 {
            return Err(GridRlError::ActionOutOfRange { act, n_actions: 9 }.into());
        }
        if Self::finished(&self.cells) {
            bail!("Game is over, cannot play cell {}", act);
        }
        if self.cells[act].is_some() {
            bail!("Cell {} is occupied", act);
        }
        self.cells[act] = Some(self.to_move);
        self.to_move = self.to_move.opponent();
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        Self::finished(&self.cells)
    }

    fn winner(&self) -> Option<Mark> {
        Self::line_winner(&self.cells)
    }
}

/// Self-play environment: both sides are played by the same agent.
///
/// The reward is given from the perspective of the player who just moved:
/// 1 for a winning move, 0 otherwise.
impl Env for TicTacToe {
    type Config = TicTacToeConfig;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self::new(config.first_player))
    }

    fn reset(&mut self) -> Result<StateKey> {
        *self = Self::new(self.first_player);
        Ok(self.state_key())
    }

    fn state(&self) -> StateKey {
        self.state_key()
    }

    fn legal_actions(&self, state: &StateKey) -> Vec<usize> {
        match Self::decode(state) {
            Some(cells) if !Self::finished(&cells) => Self::empty_cells(&cells),
            _ => vec![],
        }
    }

    fn n_actions(&self) -> usize {
        9
    }

    fn step(&mut self, act: usize) -> (Step, Record) {
        let mover = self.to_move;
        if let Err(e) = Game::apply(self, act) {
            warn!("Ignore move: {}", e);
            let done = Game::is_terminal(self);
            return (Step::new(act, self.state_key(), 0.0, done), Record::empty());
        }
        let reward = if self.winner() == Some(mover) { 1.0 } else { 0.0 };
        let step = Step::new(act, self.state_key(), reward, Game::is_terminal(self));
        (step, Record::empty())
    }

    fn is_terminal(&self, state: &StateKey) -> bool {
        Self::decode(state).map_or(false, |cells| Self::finished(&cells))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn play(moves: &[usize]) -> Result<TicTacToe> {
        let mut game = TicTacToe::default();
        for m in moves {
            game.apply(*m)?;
        }
        Ok(game)
    }

    #[test]
    fn test_win_and_draw() -> Result<()> {
        // X: 0 1 2, O: 3 4
        let game = play(&[0, 3, 1, 4, 2])?;
        assert!(Game::is_terminal(&game));
        assert_eq!(game.winner(), Some(Mark::X));
        assert!(Game::legal_actions(&game).is_empty());

        let draw = play(&[0, 1, 2, 4, 3, 5, 7, 6, 8])?;
        assert!(Game::is_terminal(&draw));
        assert_eq!(draw.winner(), None);
        Ok(())
    }

    #[test]
    fn test_illegal_moves() -> Result<()> {
        let mut game = play(&[4])?;
        assert!(game.apply(4).is_err());
        assert!(game.apply(9).is_err());
        assert_eq!(game.current_player(), Mark::O);
        assert_eq!(Game::legal_actions(&game).len(), 8);
        Ok(())
    }

    #[test]
    fn test_state_key_roundtrip_through_env() -> Result<()> {
        let game = play(&[0, 4])?;
        let key = game.state_key();
        assert_eq!(key.components(), &[1, 0, 0, 0, 2, 0, 0, 0, 0, 1]);
        assert_eq!(Env::legal_actions(&game, &key), vec![1, 2, 3, 5, 6, 7, 8]);
        assert!(!Env::is_terminal(&game, &key));
        Ok(())
    }

    #[test]
    fn test_env_rewards_mover() -> Result<()> {
        let mut env = TicTacToe::build(&TicTacToeConfig::default(), 0)?;
        env.reset()?;
        for m in [0, 3, 1, 4] {
            let (step, _) = env.step(m);
            assert_eq!(step.reward, 0.0);
        }
        let (step, _) = env.step(2);
        assert_eq!(step.reward, 1.0);
        assert!(step.is_terminated);
        Ok(())
    }
}

//! The search loop.
use crate::{Game, MctsConfig, Tree};
use anyhow::Result;
use log::{debug, warn};
use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use std::time::{Duration, Instant};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Monte-Carlo tree search player.
///
/// Every call of [`Mcts::policy`] builds a new tree rooted at the given
/// position and runs iterations of
///
/// ```mermaid
/// graph LR
///     A[Selection] --> B[Expansion]
///     B --> C[Rollout]
///     C --> D[Backpropagation]
///     D --> A
/// ```
///
/// until `max_rollouts` iterations have run or `time_budget_ms` has elapsed.
/// Both limits are checked between iterations, so an iteration always runs
/// to completion and at least one iteration is run.
///
/// Selection descends along the child maximizing
/// `w / n + C * sqrt(ln(N) / n)`, where an unvisited child is taken first.
/// A selected leaf in a non-terminal position is expanded with one child per
/// legal action and one of the new children is picked at random; the rollout
/// from there plays uniformly random moves to the end of the game. Every node
/// on the path gets a visit, and a win if its player won the rollout.
pub struct Mcts<G: Game> {
    config: MctsConfig,
    rng: SmallRng,
    last_tree: Option<Tree<G::Player>>,
}

impl<G: Game> Mcts<G> {
    /// Constructs the searcher.
    pub fn build(config: MctsConfig) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            last_tree: None,
        }
    }

    /// Tree of the last decision.
    pub fn last_tree(&self) -> Option<&Tree<G::Player>> {
        self.last_tree.as_ref()
    }

    /// Chooses an action for the player to move in `state`.
    ///
    /// Returns `None` if the position is terminal.
    pub fn policy(&mut self, state: &G) -> Option<usize> {
        if state.is_terminal() {
            return None;
        }

        let start = Instant::now();
        let deadline = self.config.time_budget_ms.map(Duration::from_millis);
        let mut tree = Tree::new();
        let mut n_iter = 0;

        loop {
            if let Err(e) = self.iterate(&mut tree, state) {
                warn!("Stop search after {} iterations: {}", n_iter, e);
                break;
            }
            n_iter += 1;
            let out_of_time = deadline.map_or(false, |d| start.elapsed() >= d);
            if n_iter >= self.config.max_rollouts || out_of_time {
                break;
            }
        }

        let act = tree.best_root_child().and_then(|node| node.action);
        debug!(
            "MCTS ran {} iterations over {} nodes in {:?}, chose {:?}",
            n_iter,
            tree.len(),
            start.elapsed(),
            act
        );
        self.last_tree = Some(tree);
        act
    }

    fn uct(&self, tree: &Tree<G::Player>, parent: usize, child: usize) -> f64 {
        let node = tree.node(child);
        if node.visits == 0 {
            return f64::INFINITY;
        }
        let n = node.visits as f64;
        let big_n = tree.node(parent).visits as f64;
        node.score / n + self.config.exploration * (big_n.ln() / n).sqrt()
    }

    /// Child of `id` with the largest UCT value, the first one on ties.
    fn select_child(&self, tree: &Tree<G::Player>, id: usize) -> Option<usize> {
        let mut best = None;
        let mut best_v = f64::NEG_INFINITY;
        for &c in tree.node(id).children.iter() {
            let v = self.uct(tree, id, c);
            if best.is_none() || v > best_v {
                best = Some(c);
                best_v = v;
            }
        }
        best
    }

    fn iterate(&mut self, tree: &mut Tree<G::Player>, root_state: &G) -> Result<()> {
        let mut state = root_state.clone();
        let mut id = tree.root();

        while let Some(c) = self.select_child(tree, id) {
            if let Some(act) = tree.node(c).action {
                state.apply(act)?;
            }
            id = c;
        }

        if !state.is_terminal() {
            let player = state.current_player();
            for act in state.legal_actions() {
                tree.add_child(id, act, player);
            }
            let children = &tree.node(id).children;
            if !children.is_empty() {
                let c = children[self.rng.gen_range(0..children.len())];
                if let Some(act) = tree.node(c).action {
                    state.apply(act)?;
                }
                id = c;
            }
        }

        let winner = self.rollout(state)?;
        tree.backpropagate(id, winner);
        Ok(())
    }

    fn rollout(&mut self, mut state: G) -> Result<Option<G::Player>> {
        while !state.is_terminal() {
            let legal = state.legal_actions();
            match legal.choose(&mut self.rng) {
                Some(act) => state.apply(*act)?,
                None => break,
            }
        }
        Ok(state.winner())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Mark, TicTacToe};
    use test_log::test;

    fn play(moves: &[usize]) -> Result<TicTacToe> {
        let mut game = TicTacToe::default();
        for m in moves {
            game.apply(*m)?;
        }
        Ok(game)
    }

    fn mcts(max_rollouts: usize) -> Mcts<TicTacToe> {
        Mcts::build(MctsConfig::default().max_rollouts(max_rollouts).seed(1))
    }

    #[test]
    fn test_visit_counts_are_consistent() -> Result<()> {
        let mut mcts = mcts(300);
        let act = mcts.policy(&TicTacToe::default());
        let tree = mcts.last_tree().unwrap();

        assert_eq!(tree.node(tree.root()).visits, 300);
        for node in tree.iter() {
            if node.is_expanded() {
                let below: u64 = node.children.iter().map(|c| tree.node(*c).visits).sum();
                // Iterations that ended here before expansion count only on the node.
                assert!(node.visits >= below);
                assert!(node.visits >= 1);
            }
            assert!(node.score <= node.visits as f64);
        }
        let root_children: Vec<Option<usize>> = tree
            .node(tree.root())
            .children
            .iter()
            .map(|c| tree.node(*c).action)
            .collect();
        assert_eq!(root_children.len(), 9);
        assert!(root_children.contains(&act));
        Ok(())
    }

    #[test]
    fn test_terminal_root() -> Result<()> {
        let game = play(&[0, 3, 1, 4, 2])?;
        assert_eq!(mcts(10).policy(&game), None);
        Ok(())
    }

    #[test]
    fn test_single_iteration_budget() {
        let mut mcts: Mcts<TicTacToe> =
            Mcts::build(MctsConfig::default().time_budget_ms(Some(0)));
        assert!(mcts.policy(&TicTacToe::default()).is_some());
        let tree = mcts.last_tree().unwrap();
        assert!(tree.node(tree.root()).visits >= 1);
    }

    #[test]
    fn test_takes_winning_move() -> Result<()> {
        // X to move with 0 and 1 taken, 2 wins on the spot.
        let game = play(&[0, 3, 1, 4])?;
        assert_eq!(game.current_player(), Mark::X);
        assert_eq!(mcts(2000).policy(&game), Some(2));
        Ok(())
    }

    #[test]
    fn test_blocks_opponent() -> Result<()> {
        // O to move, X threatens 0-1-2.
        let game = play(&[0, 4, 1])?;
        assert_eq!(mcts(3000).policy(&game), Some(2));
        Ok(())
    }
}

//! Evolutionary search over whole policy tables.
//!
//! A [`GenePool`] holds a fixed-size population of [`Genome`]s, each a
//! complete table of action preferences. Once every genome's fitness has
//! been reported, [`GenePool::breed_next_generation`] replaces the population
//! with the top group, crossover children, mutated clones and fresh random
//! genomes. [`EvolutionAgent`] runs this loop inside the usual
//! [`Trainer`](gridrl_core::Trainer).
mod agent;
mod config;
mod genome;
mod id;
mod pool;
pub use agent::EvolutionAgent;
pub use config::{EvolutionConfig, GenePoolConfig};
pub use genome::Genome;
pub use id::IdAllocator;
pub use pool::{GenePool, PoolState};

//! Sources of randomness for tile placement and die rolls

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{DIE_FACES, TILE_COUNT};

/// Uniform draws used by the game
pub trait Dice {
    /// A tile in `1..=TILE_COUNT`
    fn tile(&mut self) -> u8;

    /// A die face in `1..=DIE_FACES`
    fn roll(&mut self) -> u8;
}

/// [`Dice`] over any `rand` generator
#[derive(Debug, Clone)]
pub struct RngDice<R> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Same seed produces the same game
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl Default for RngDice<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng> Dice for RngDice<R> {
    fn tile(&mut self) -> u8 {
        self.rng.gen_range(1..=TILE_COUNT)
    }

    fn roll(&mut self) -> u8 {
        self.rng.gen_range(1..=DIE_FACES)
    }
}

/// Replays fixed draws, for reproducing a game exactly.
///
/// Once a script runs out, its last value repeats (1 if it was empty).
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    tiles: VecDeque<u8>,
    rolls: VecDeque<u8>,
    last_tile: Option<u8>,
    last_roll: Option<u8>,
}

impl ScriptedDice {
    pub fn new(tiles: impl IntoIterator<Item = u8>, rolls: impl IntoIterator<Item = u8>) -> Self {
        Self {
            tiles: tiles.into_iter().collect(),
            rolls: rolls.into_iter().collect(),
            last_tile: None,
            last_roll: None,
        }
    }
}

fn next_scripted(queue: &mut VecDeque<u8>, last: &mut Option<u8>) -> u8 {
    if let Some(value) = queue.pop_front() {
        *last = Some(value);
    }
    last.unwrap_or(1)
}

impl Dice for ScriptedDice {
    fn tile(&mut self) -> u8 {
        next_scripted(&mut self.tiles, &mut self.last_tile)
    }

    fn roll(&mut self) -> u8 {
        next_scripted(&mut self.rolls, &mut self.last_roll)
    }
}

//! Per-scope random engines
//!
//! Every generation call runs with an engine that belongs to its
//! processing scope: the event stream for events, the luminosity block
//! for block-level work. Engines live in a [`RandomNumberGenerator`]
//! service and are lent out to a backend through a
//! [`RandomEngineSentry`], which puts them back when it goes out of
//! scope. An engine is never attached to two backends at once.
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::pset::{ParameterError, ParameterSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Master seed used when the configuration does not provide one
pub const DEFAULT_MASTER_SEED: u64 = 123456789;

/// Processing scope an engine belongs to
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeId {
    Stream(u32),
    LuminosityBlock(u32),
}

impl ScopeId {
    fn code(&self) -> u64 {
        match *self {
            ScopeId::Stream(id) => 1 << 32 | u64::from(id),
            ScopeId::LuminosityBlock(idx) => 2 << 32 | u64::from(idx),
        }
    }
}

/// Backend drawing from an engine
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineConsumer {
    Hadronizer,
    Decayer,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineKey {
    pub scope: ScopeId,
    pub consumer: EngineConsumer,
}

impl EngineKey {
    pub fn new(scope: ScopeId, consumer: EngineConsumer) -> Self {
        EngineKey { scope, consumer }
    }
}

impl fmt::Display for EngineKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let consumer = match self.consumer {
            EngineConsumer::Hadronizer => "hadronizer",
            EngineConsumer::Decayer => "decayer",
        };
        match self.scope {
            ScopeId::Stream(id) => write!(f, "{} engine of stream {}", consumer, id),
            ScopeId::LuminosityBlock(idx) => {
                write!(f, "{} engine of luminosity block index {}", consumer, idx)
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0} is already attached")]
    InUse(EngineKey),
}

/// Complete state of a [`RandomEngine`]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EngineState {
    pub seed: u64,
    pub stream: u64,
    pub word_pos: u128,
}

/// Seedable pseudo-random engine with a restorable state
#[derive(Clone, Debug)]
pub struct RandomEngine {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomEngine {
    pub fn new(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        RandomEngine { seed, rng }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            seed: self.seed,
            stream: self.rng.get_stream(),
            word_pos: self.rng.get_word_pos(),
        }
    }

    pub fn from_state(state: &EngineState) -> Self {
        let mut engine = RandomEngine::new(state.seed, state.stream);
        engine.rng.set_word_pos(state.word_pos);
        engine
    }

    pub fn restore(&mut self, state: &EngineState) {
        *self = RandomEngine::from_state(state);
    }

    /// Uniform number in [0, 1)
    pub fn flat(&mut self) -> f64 {
        self.rng.gen()
    }
}

impl RngCore for RandomEngine {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

#[derive(Debug)]
enum Slot {
    Idle(RandomEngine),
    InUse,
}

#[derive(Debug, Default)]
struct Engines {
    slots: HashMap<EngineKey, Slot>,
    acquisitions: HashMap<EngineKey, u64>,
}

/// Service owning one engine per (scope, consumer)
///
/// Engines are created on first use, seeded from the master seed and
/// the scope. The hadronizer and decayer of a scope draw from different
/// streams of the same seed.
#[derive(Debug)]
pub struct RandomNumberGenerator {
    master_seed: u64,
    engines: Mutex<Engines>,
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_SEED)
    }
}

impl RandomNumberGenerator {
    pub fn new(master_seed: u64) -> Self {
        RandomNumberGenerator {
            master_seed,
            engines: Mutex::new(Engines::default()),
        }
    }

    /// Configure from a `RandomNumberGeneratorService` block
    pub fn from_pset(pset: &ParameterSet) -> Result<Self, ParameterError> {
        Ok(Self::new(pset.get_parameter_or("masterSeed", DEFAULT_MASTER_SEED)?))
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    fn fresh_engine(&self, key: EngineKey) -> RandomEngine {
        let seed = self.master_seed ^ key.scope.code().wrapping_mul(0x9e37_79b9_7f4a_7c15);
        RandomEngine::new(seed, key.consumer as u64)
    }

    /// Take the engine for `key` out of the service
    pub fn checkout(&self, key: EngineKey) -> Result<RandomEngine, EngineError> {
        let mut engines = self.engines.lock();
        let engine = match engines.slots.insert(key, Slot::InUse) {
            Some(Slot::Idle(engine)) => engine,
            Some(Slot::InUse) => return Err(EngineError::InUse(key)),
            None => self.fresh_engine(key),
        };
        *engines.acquisitions.entry(key).or_insert(0) += 1;
        Ok(engine)
    }

    /// Hand an engine back after use
    pub fn check_in(&self, key: EngineKey, engine: RandomEngine) {
        self.engines.lock().slots.insert(key, Slot::Idle(engine));
    }

    /// Drop the record of an engine that was lent out and never returned
    ///
    /// The next checkout starts again from the derived seed.
    pub fn forget(&self, key: EngineKey) {
        self.engines.lock().slots.remove(&key);
    }

    pub fn is_attached(&self, key: EngineKey) -> bool {
        matches!(self.engines.lock().slots.get(&key), Some(Slot::InUse))
    }

    /// Keys of all engines currently lent out
    pub fn attached(&self) -> Vec<EngineKey> {
        let engines = self.engines.lock();
        let mut keys: Vec<_> = engines
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::InUse))
            .map(|(key, _)| *key)
            .collect();
        keys.sort();
        keys
    }

    /// How often the engine for `key` has been checked out
    pub fn acquisitions(&self, key: EngineKey) -> u64 {
        self.engines
            .lock()
            .acquisitions
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    /// State of an idle engine, `None` if it is attached or was never used
    pub fn engine_state(&self, key: EngineKey) -> Option<EngineState> {
        match self.engines.lock().slots.get(&key) {
            Some(Slot::Idle(engine)) => Some(engine.state()),
            _ => None,
        }
    }

    pub fn reseed(&self, key: EngineKey, seed: u64) -> Result<(), EngineError> {
        let engine = RandomEngine::new(seed, key.consumer as u64);
        self.replace_idle(key, engine)
    }

    pub fn restore(&self, key: EngineKey, state: &EngineState) -> Result<(), EngineError> {
        self.replace_idle(key, RandomEngine::from_state(state))
    }

    fn replace_idle(&self, key: EngineKey, engine: RandomEngine) -> Result<(), EngineError> {
        let mut engines = self.engines.lock();
        if let Some(Slot::InUse) = engines.slots.get(&key) {
            return Err(EngineError::InUse(key));
        }
        debug!(%key, seed = engine.seed(), "replacing random engine");
        engines.slots.insert(key, Slot::Idle(engine));
        Ok(())
    }
}

/// A backend that draws its random numbers from an attached engine
pub trait RandomEngineUser {
    /// Attach `engine`, or detach with `None`
    ///
    /// Returns the engine that was attached before.
    fn set_random_engine(&mut self, engine: Option<RandomEngine>) -> Option<RandomEngine>;
}

/// Keeps an engine attached to a backend for the lifetime of the guard
///
/// The guard dereferences to the backend, so all calls that need the
/// engine go through it.
pub struct RandomEngineSentry<'a, T: RandomEngineUser + ?Sized> {
    user: &'a mut T,
    service: &'a RandomNumberGenerator,
    key: EngineKey,
}

impl<'a, T: RandomEngineUser + ?Sized> RandomEngineSentry<'a, T> {
    pub fn new(
        user: &'a mut T,
        service: &'a RandomNumberGenerator,
        key: EngineKey,
    ) -> Result<Self, EngineError> {
        let engine = service.checkout(key)?;
        if user.set_random_engine(Some(engine)).is_some() {
            warn!(%key, "backend still held an engine from another scope");
        }
        Ok(RandomEngineSentry { user, service, key })
    }

    pub fn key(&self) -> EngineKey {
        self.key
    }
}

impl<T: RandomEngineUser + ?Sized> Deref for RandomEngineSentry<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.user
    }
}

impl<T: RandomEngineUser + ?Sized> DerefMut for RandomEngineSentry<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.user
    }
}

impl<T: RandomEngineUser + ?Sized> Drop for RandomEngineSentry<'_, T> {
    fn drop(&mut self) {
        match self.user.set_random_engine(None) {
            Some(engine) => self.service.check_in(self.key, engine),
            None => {
                warn!(key = %self.key, "backend lost its random engine");
                self.service.forget(self.key);
            }
        }
    }
}

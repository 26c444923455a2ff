//! Deterministic contexts for unit tests.

use crate::lobby::Participant;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use roundnet_env::ExperimentContext;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// `user-{i}`, created `i` minutes after the epoch.
pub fn user(i: u64) -> Participant {
    Participant::new(format!("user-{}", i), UNIX_EPOCH + Duration::from_secs(60 * i))
}

/// Always draws the same end of the free list.
pub struct ScriptedContext {
    last: bool,
}

impl ScriptedContext {
    pub fn always_first() -> Self {
        Self { last: false }
    }

    pub fn always_last() -> Self {
        Self { last: true }
    }
}

impl ExperimentContext for ScriptedContext {
    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH
    }

    fn pick_index(&self, len: usize) -> usize {
        if self.last {
            len - 1
        } else {
            0
        }
    }

    fn seed(&self) -> u64 {
        0
    }
}

/// ChaCha8-backed context.
pub struct SeededContext {
    seed: u64,
    rng: Mutex<ChaCha8Rng>,
}

impl SeededContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl ExperimentContext for SeededContext {
    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH
    }

    fn pick_index(&self, len: usize) -> usize {
        self.rng.lock().unwrap().gen_range(0..len)
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

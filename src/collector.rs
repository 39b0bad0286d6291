//! Drains finished slots, lowest index first: `Wait -> Collect -> Wait`.

use fnv::FnvHashSet;
use log::trace;

use crate::{pixel::PixelResult, pool::EnginePool};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Wait,
    Collect { slot: usize },
}

#[derive(Clone, Debug)]
pub struct ResultCollector {
    state: State,
    collected: u64,
    seen: FnvHashSet<(u16, u16)>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self {
            state: State::Wait,
            collected: 0,
            seen: FnvHashSet::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_waiting(&self) -> bool {
        self.state == State::Wait
    }

    /// Results collected since the last [`ResultCollector::begin_sweep`].
    pub fn collected(&self) -> u64 {
        self.collected
    }

    pub fn begin_sweep(&mut self) {
        self.collected = 0;
        self.seen.clear();
    }

    /// Advances one step. In `Collect`, the slot is only freed once `accept` holds, so a
    /// stalled consumer leaves the result where it is.
    pub fn tick(&mut self, pool: &mut EnginePool, accept: bool) -> Option<PixelResult> {
        match self.state {
            State::Wait => {
                if let Some(slot) = pool.ready_mask().lowest() {
                    self.state = State::Collect { slot };
                }
                None
            }

            State::Collect { slot } => {
                if !accept {
                    return None;
                }
                let result = pool.collect(slot);
                trace!(
                    "collected pixel ({}, {}) from slot {} after {} iterations",
                    result.pixel_x,
                    result.pixel_y,
                    slot,
                    result.iterations
                );
                debug_assert!(
                    self.seen.insert((result.pixel_x, result.pixel_y)),
                    "pixel ({}, {}) collected twice",
                    result.pixel_x,
                    result.pixel_y
                );
                self.collected += 1;
                self.state = State::Wait;
                Some(result)
            }
        }
    }
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new()
    }
}

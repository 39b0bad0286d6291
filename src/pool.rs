//! A fixed set of engines, addressed slot by slot.
//!
//! Every lane of every engine is a slot. Slot `s` lives on engine `s / interleave`, lane
//! `s % interleave`, so with `interleave == 1` slot and engine ids coincide.

use log::debug;
use rayon::prelude::{IntoParallelRefMutIterator, ParallelIterator};
use thiserror::Error;

use crate::{
    engine::Engine,
    fixed::FixedPoint,
    pixel::PixelResult,
    priority::{SlotMask, MAX_SLOTS},
};

pub const DEFAULT_ENGINES: usize = 4;
pub const DEFAULT_INTERLEAVE: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a pool needs at least one engine")]
    NoEngines,

    #[error("an engine needs at least one lane")]
    NoLanes,

    #[error("{requested} slots requested, at most {max} are supported")]
    TooManySlots { requested: usize, max: usize },
}

/// Everything the scheduler writes into a slot at dispatch time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Dispatch {
    cx: FixedPoint,
    cy: FixedPoint,
    pixel_x: u16,
    pixel_y: u16,
}

/// Snapshot of one slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineSlot {
    pub busy: bool,
    pub cx: FixedPoint,
    pub cy: FixedPoint,
    pub pixel_x: u16,
    pub pixel_y: u16,
    pub result_ready: bool,
    pub iterations: u32,
    pub escaped: bool,
    pub maxed: bool,
}

#[derive(Clone, Debug)]
pub struct EnginePool {
    engines: Vec<Engine>,
    interleave: usize,
    dispatches: Vec<Dispatch>,
    parallel: bool,
}

impl EnginePool {
    pub fn slots(&self) -> usize {
        self.dispatches.len()
    }

    pub fn engines(&self) -> usize {
        self.engines.len()
    }

    pub fn interleave(&self) -> usize {
        self.interleave
    }

    fn locate(&self, slot: usize) -> (usize, usize) {
        (slot / self.interleave, slot % self.interleave)
    }

    pub fn is_busy(&self, slot: usize) -> bool {
        let (engine, lane) = self.locate(slot);
        self.engines[engine].is_busy(lane)
    }

    pub fn is_result_ready(&self, slot: usize) -> bool {
        let (engine, lane) = self.locate(slot);
        self.engines[engine].is_result_ready(lane)
    }

    /// Slots free for dispatch.
    pub fn idle_mask(&self) -> SlotMask {
        (0..self.slots()).map(|slot| !self.is_busy(slot)).collect()
    }

    /// Slots holding a result.
    pub fn ready_mask(&self) -> SlotMask {
        (0..self.slots()).map(|slot| self.is_result_ready(slot)).collect()
    }

    /// `true` when no slot is computing or holding a result.
    pub fn is_quiescent(&self) -> bool {
        (0..self.slots()).all(|slot| !self.is_busy(slot))
    }

    /// Writes a pixel's coordinates into an idle slot.
    pub fn assign(
        &mut self,
        slot: usize,
        cx: FixedPoint,
        cy: FixedPoint,
        pixel_x: u16,
        pixel_y: u16,
    ) {
        debug_assert!(!self.is_busy(slot), "slot {} assigned while busy", slot);
        self.dispatches[slot] = Dispatch {
            cx,
            cy,
            pixel_x,
            pixel_y,
        };
    }

    /// Starts the slot on the coordinates last assigned to it.
    pub fn start(&mut self, slot: usize, max_iterations: u32) {
        let Dispatch { cx, cy, .. } = self.dispatches[slot];
        let (engine, lane) = self.locate(slot);
        self.engines[engine].start(lane, cx, cy, max_iterations);
    }

    /// Takes the slot's result and frees it for the next dispatch.
    pub fn collect(&mut self, slot: usize) -> PixelResult {
        let (engine, lane) = self.locate(slot);
        let completion = self.engines[engine].collect(lane);
        let dispatch = self.dispatches[slot];
        PixelResult::new(dispatch.pixel_x, dispatch.pixel_y, completion)
    }

    pub fn slot(&self, slot: usize) -> EngineSlot {
        let (engine, lane) = self.locate(slot);
        let engine = &self.engines[engine];
        let dispatch = self.dispatches[slot];
        let completion = engine.completion(lane).unwrap_or_default();
        EngineSlot {
            busy: engine.is_busy(lane),
            cx: dispatch.cx,
            cy: dispatch.cy,
            pixel_x: dispatch.pixel_x,
            pixel_y: dispatch.pixel_y,
            result_ready: engine.is_result_ready(lane),
            iterations: completion.iterations,
            escaped: completion.escaped,
            maxed: completion.maxed,
        }
    }

    /// Discards every result and in-flight computation.
    pub fn flush(&mut self) {
        let discarded = (0..self.slots()).filter(|slot| self.is_busy(*slot)).count();
        if discarded > 0 {
            debug!("flushing {} busy slots", discarded);
        }
        self.engines.iter_mut().for_each(Engine::reset);
        self.dispatches
            .iter_mut()
            .for_each(|dispatch| *dispatch = Dispatch::default());
    }

    /// Advances every engine by one tick.
    pub fn tick(&mut self) {
        if self.parallel {
            self.engines.par_iter_mut().for_each(Engine::tick);
        } else {
            self.engines.iter_mut().for_each(Engine::tick);
        }
    }
}

pub struct Builder {
    engines: usize,
    interleave: usize,
    parallel: bool,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            engines: DEFAULT_ENGINES,
            interleave: DEFAULT_INTERLEAVE,
            parallel: false,
        }
    }

    pub fn with_engines(mut self, engines: usize) -> Self {
        self.engines = engines;
        self
    }

    /// Lanes per engine.
    pub fn with_interleave(mut self, interleave: usize) -> Self {
        self.interleave = interleave;
        self
    }

    /// Tick engines on the rayon thread pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn create(self) -> Result<EnginePool, ConfigError> {
        if self.engines == 0 {
            return Err(ConfigError::NoEngines);
        }
        if self.interleave == 0 {
            return Err(ConfigError::NoLanes);
        }
        let slots = self.engines.saturating_mul(self.interleave);
        if slots > MAX_SLOTS {
            return Err(ConfigError::TooManySlots {
                requested: slots,
                max: MAX_SLOTS,
            });
        }

        debug!(
            "creating pool of {} engines with {} lanes each",
            self.engines, self.interleave
        );
        Ok(EnginePool {
            engines: vec![Engine::new(self.interleave); self.engines],
            interleave: self.interleave,
            dispatches: vec![Dispatch::default(); slots],
            parallel: self.parallel,
        })
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

//! Raster-order dispatch of a view's pixels onto idle slots.
//!
//! `Idle -> Pick -> Schedule -> Trigger -> Pick -> ... -> Idle`, one transition per tick.
//! `Pick` takes the lowest-index idle slot and holds while none is free; dispatch order only
//! decides which slot computes which pixel, never the result.

use log::{debug, trace};

use crate::{fixed::FixedPoint, pool::EnginePool, view::ViewCommand};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Pick,
    Schedule { slot: usize },
    Trigger { slot: usize },
}

/// Next pixel to dispatch and the point it samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub x: FixedPoint,
    pub y: FixedPoint,
    pub pixel_x: u16,
    pub pixel_y: u16,
}

impl Cursor {
    fn at_corner(view: &ViewCommand) -> Self {
        Self {
            x: view.corner_x,
            y: view.corner_y,
            pixel_x: 0,
            pixel_y: 0,
        }
    }

    /// `true` once every pixel of `view` has been handed out.
    fn is_exhausted(&self, view: &ViewCommand) -> bool {
        view.pixels_x == 0 || self.pixel_y >= view.pixels_y
    }

    /// Steps along the row, wrapping to the start of the next one.
    fn advance(&mut self, view: &ViewCommand) {
        if u32::from(self.pixel_x) + 1 < u32::from(view.pixels_x) {
            self.x = self.x + view.step;
            self.pixel_x += 1;
        } else {
            self.x = view.corner_x;
            self.pixel_x = 0;
            self.y = self.y + view.step;
            self.pixel_y += 1;
        }
    }
}

#[derive(Clone, Debug)]
pub struct PixelScheduler {
    state: State,
    pending: Option<ViewCommand>,
    view: ViewCommand,
    cursor: Cursor,
    dispatched: u64,
}

impl PixelScheduler {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            pending: None,
            view: ViewCommand::default(),
            cursor: Cursor::default(),
            dispatched: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// `true` when no sweep is running or waiting to start.
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle && self.pending.is_none()
    }

    /// Pixels dispatched in the current or most recent sweep.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Queues a sweep; it starts on the next tick in `Idle`.
    pub fn begin(&mut self, view: ViewCommand) {
        debug_assert!(self.is_idle(), "sweep queued while another is running");
        self.pending = Some(view);
    }

    pub fn tick(&mut self, pool: &mut EnginePool) {
        self.state = match self.state {
            State::Idle => match self.pending.take() {
                Some(view) => {
                    debug!(
                        "starting sweep of {}x{} pixels, max {} iterations",
                        view.pixels_x, view.pixels_y, view.max_iterations
                    );
                    self.view = view;
                    self.cursor = Cursor::at_corner(&view);
                    self.dispatched = 0;
                    pool.flush();
                    State::Pick
                }
                None => State::Idle,
            },

            State::Pick => {
                if self.cursor.is_exhausted(&self.view) {
                    debug!("dispatched all {} pixels", self.dispatched);
                    self.cursor = Cursor::default();
                    State::Idle
                } else if let Some(slot) = pool.idle_mask().lowest() {
                    State::Schedule { slot }
                } else {
                    State::Pick
                }
            }

            State::Schedule { slot } => {
                let cursor = self.cursor;
                trace!(
                    "pixel ({}, {}) -> slot {}",
                    cursor.pixel_x,
                    cursor.pixel_y,
                    slot
                );
                pool.assign(slot, cursor.x, cursor.y, cursor.pixel_x, cursor.pixel_y);
                self.cursor.advance(&self.view);
                State::Trigger { slot }
            }

            State::Trigger { slot } => {
                pool.start(slot, self.view.max_iterations);
                self.dispatched += 1;
                State::Pick
            }
        };
    }
}

impl Default for PixelScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Builder;

    fn view(pixels_x: u16, pixels_y: u16) -> ViewCommand {
        ViewCommand {
            pixels_x,
            pixels_y,
            max_iterations: 1000,
            corner_x: FixedPoint::from_int(-2),
            corner_y: FixedPoint::from_int(-1),
            step: FixedPoint::from_ratio(1, 2),
        }
    }

    #[test]
    fn cursor_walks_in_raster_order() {
        let view = view(3, 2);
        let mut cursor = Cursor::at_corner(&view);
        let mut visited = Vec::new();
        while !cursor.is_exhausted(&view) {
            visited.push((cursor.pixel_x, cursor.pixel_y));
            assert_eq!((cursor.x, cursor.y), view.point(cursor.pixel_x, cursor.pixel_y));
            cursor.advance(&view);
        }
        assert_eq!(visited, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn empty_grid_returns_to_idle_without_dispatching() {
        let mut pool = Builder::new().with_engines(2).with_interleave(1).create().unwrap();
        let mut scheduler = PixelScheduler::new();
        scheduler.begin(view(0, 5));
        scheduler.tick(&mut pool);
        assert_eq!(scheduler.state(), State::Pick);
        scheduler.tick(&mut pool);
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.dispatched(), 0);
        assert!(pool.is_quiescent());
    }

    #[test]
    fn lowest_idle_slot_is_dispatched_first() {
        let mut pool = Builder::new().with_engines(3).with_interleave(1).create().unwrap();
        let mut scheduler = PixelScheduler::new();
        scheduler.begin(view(2, 1));
        scheduler.tick(&mut pool);

        // Occupy slot 1 so that slots 0 and 2 are the idle ones.
        pool.assign(1, FixedPoint::ZERO, FixedPoint::ZERO, 99, 99);
        pool.start(1, u32::MAX);

        scheduler.tick(&mut pool);
        assert_eq!(scheduler.state(), State::Schedule { slot: 0 });
        scheduler.tick(&mut pool);
        scheduler.tick(&mut pool);
        assert_eq!((pool.slot(0).pixel_x, pool.slot(0).pixel_y), (0, 0));
        assert!(pool.slot(0).busy);

        scheduler.tick(&mut pool);
        assert_eq!(scheduler.state(), State::Schedule { slot: 2 });
        scheduler.tick(&mut pool);
        scheduler.tick(&mut pool);
        assert_eq!(pool.slot(2).pixel_x, 1);

        scheduler.tick(&mut pool);
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.dispatched(), 2);
    }

    #[test]
    fn pick_holds_while_every_slot_is_busy() {
        let mut pool = Builder::new().with_engines(1).with_interleave(1).create().unwrap();
        let mut scheduler = PixelScheduler::new();
        let mut view = view(2, 1);
        view.corner_x = FixedPoint::ZERO;
        view.corner_y = FixedPoint::ZERO;
        view.step = FixedPoint::LSB;
        view.max_iterations = 10;
        scheduler.begin(view);
        for _ in 0..4 {
            scheduler.tick(&mut pool);
        }
        assert_eq!(scheduler.dispatched(), 1);

        for _ in 0..3 {
            scheduler.tick(&mut pool);
            assert_eq!(scheduler.state(), State::Pick);
        }
        assert_eq!(scheduler.cursor().pixel_x, 1);

        while !pool.is_result_ready(0) {
            pool.tick();
        }
        pool.collect(0);
        scheduler.tick(&mut pool);
        assert_eq!(scheduler.state(), State::Schedule { slot: 0 });
    }
}

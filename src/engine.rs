/*!
Pipelined escape-time iteration engine.

One iteration of `z <- z^2 + c` passes through three register stages:

1. operand latch and multiplier: `xx`, `yy` and `2xy` of the lane's current point
2. adder: `|z|^2 = xx + yy`
3. compare and write back: the escape and cap tests run on the magnitude of the point the
   pass started from, then either the lane finishes or its point is replaced by `z^2 + c`

A single orbit can only occupy one stage at a time, because each pass needs the previous
pass's result. With one lane the multiplier therefore idles two ticks out of three. An
engine built with `interleave` lanes issues the lanes round-robin, one per tick, so with
three lanes every stage holds a different orbit on every tick.

Each lane has its own `start`/`busy`/`result_ready`/`collect` handshake and its own state;
a lane only advances on its own pass, so interleaving changes when a result appears but
never what it is.
*/

use log::trace;

use crate::{
    escape_time::{Completion, Terms},
    fixed::FixedPoint,
};

/// Number of register stages between issuing a lane and writing it back.
pub const PIPELINE_STAGES: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    Running,
    Finished,
}

#[derive(Clone, Copy, Debug, Default)]
struct Lane {
    cx: FixedPoint,
    cy: FixedPoint,
    x: FixedPoint,
    y: FixedPoint,
    max_iterations: u32,
    phase: Phase,
    in_flight: bool,
    completion: Completion,
}

#[derive(Clone, Copy, Debug)]
struct Operands {
    lane: usize,
    x: FixedPoint,
    y: FixedPoint,
}

#[derive(Clone, Copy, Debug)]
struct Products {
    lane: usize,
    terms: Terms,
}

#[derive(Clone, Copy, Debug)]
struct Sums {
    lane: usize,
    magnitude: FixedPoint,
    terms: Terms,
}

#[derive(Clone, Debug)]
pub struct Engine {
    lanes: Vec<Lane>,
    turn: usize,
    operands: Option<Operands>,
    products: Option<Products>,
    sums: Option<Sums>,
}

impl Engine {
    /// Panics if `interleave` is zero.
    pub fn new(interleave: usize) -> Self {
        assert!(interleave > 0, "an engine needs at least one lane");
        Self {
            lanes: vec![Lane::default(); interleave],
            turn: 0,
            operands: None,
            products: None,
            sums: None,
        }
    }

    pub fn interleave(&self) -> usize {
        self.lanes.len()
    }

    /// Begins a computation on an idle lane.
    pub fn start(&mut self, lane: usize, cx: FixedPoint, cy: FixedPoint, max_iterations: u32) {
        debug_assert!(!self.is_busy(lane), "lane {} started while busy", lane);
        self.lanes[lane] = Lane {
            cx,
            cy,
            max_iterations,
            phase: Phase::Running,
            ..Lane::default()
        };
    }

    /// `true` from `start` until the result is collected.
    pub fn is_busy(&self, lane: usize) -> bool {
        self.lanes[lane].phase != Phase::Idle
    }

    pub fn is_result_ready(&self, lane: usize) -> bool {
        self.lanes[lane].phase == Phase::Finished
    }

    /// The held result, if the lane has finished.
    pub fn completion(&self, lane: usize) -> Option<Completion> {
        let lane = &self.lanes[lane];
        (lane.phase == Phase::Finished).then_some(lane.completion)
    }

    /// Takes the held result and frees the lane.
    pub fn collect(&mut self, lane: usize) -> Completion {
        debug_assert!(self.is_result_ready(lane), "lane {} collected before it finished", lane);
        let completion = self.lanes[lane].completion;
        self.lanes[lane] = Lane::default();
        completion
    }

    /// The lane's current point of the orbit.
    pub fn position(&self, lane: usize) -> (FixedPoint, FixedPoint) {
        (self.lanes[lane].x, self.lanes[lane].y)
    }

    /// Updates applied to the lane's orbit so far.
    pub fn iterations(&self, lane: usize) -> u32 {
        self.lanes[lane].completion.iterations
    }

    /// Drops every lane and every in-flight pass.
    pub fn reset(&mut self) {
        *self = Self::new(self.lanes.len());
    }

    pub fn tick(&mut self) {
        if let Some(sums) = self.sums.take() {
            self.write_back(sums);
        }

        self.sums = self.products.take().map(|products| Sums {
            lane: products.lane,
            magnitude: products.terms.magnitude(),
            terms: products.terms,
        });

        self.products = self.operands.take().map(|operands| Products {
            lane: operands.lane,
            terms: Terms::of(operands.x, operands.y),
        });

        let turn = self.turn;
        self.turn = (turn + 1) % self.lanes.len();
        let lane = &mut self.lanes[turn];
        if lane.phase == Phase::Running && !lane.in_flight {
            lane.in_flight = true;
            self.operands = Some(Operands {
                lane: turn,
                x: lane.x,
                y: lane.y,
            });
        }
    }

    fn write_back(&mut self, sums: Sums) {
        let lane = &mut self.lanes[sums.lane];
        lane.in_flight = false;

        let escaped = sums.magnitude > FixedPoint::FOUR;
        let maxed = lane.completion.iterations >= lane.max_iterations;
        if escaped || maxed {
            lane.phase = Phase::Finished;
            lane.completion.escaped = escaped;
            lane.completion.maxed = maxed;
            trace!(
                "lane {} finished after {} iterations (escaped: {}, maxed: {})",
                sums.lane,
                lane.completion.iterations,
                escaped,
                maxed
            );
        } else {
            (lane.x, lane.y) = sums.terms.next(lane.cx, lane.cy);
            lane.completion.iterations += 1;
        }
    }
}

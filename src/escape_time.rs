//! The escape-time recurrence `z <- z^2 + c` in fixed point.
//!
//! [`Terms`] is one iteration split the way the engine pipeline splits it: the multiplier
//! produces the squares and the doubled cross product, the adder folds them into the
//! magnitude and the next point. [`escape_time`] and [`Orbit`] run the recurrence
//! sequentially and serve as the reference the pipelined engine must agree with.

use crate::fixed::FixedPoint;

/// Multiplier outputs for a point `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Terms {
    pub xx: FixedPoint,
    pub yy: FixedPoint,
    pub two_xy: FixedPoint,
}

impl Terms {
    pub fn of(x: FixedPoint, y: FixedPoint) -> Self {
        Self {
            xx: x.square(),
            yy: y.square(),
            two_xy: x.double_product(y),
        }
    }

    /// `|z|^2` of the point the terms were computed from.
    pub fn magnitude(&self) -> FixedPoint {
        self.xx + self.yy
    }

    pub fn escapes(&self) -> bool {
        self.magnitude() > FixedPoint::FOUR
    }

    /// The next point of the orbit of `(cx, cy)`.
    pub fn next(&self, cx: FixedPoint, cy: FixedPoint) -> (FixedPoint, FixedPoint) {
        (self.xx - self.yy + cx, self.two_xy + cy)
    }
}

/// How a computation ended.
///
/// `iterations` is the number of updates applied before the test held. Both flags are set
/// when the orbit escapes on the very iteration the cap is reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Completion {
    pub iterations: u32,
    pub escaped: bool,
    pub maxed: bool,
}

/// Runs the recurrence for `c = (cx, cy)` from `z = 0`.
pub fn escape_time(cx: FixedPoint, cy: FixedPoint, max_iterations: u32) -> Completion {
    let mut orbit = Orbit::new(cx, cy, max_iterations);
    for _ in orbit.by_ref() {}
    orbit.completion().unwrap_or_default()
}

/// The sequence of points visited by the recurrence, one per applied update.
///
/// The escape test runs on each point before it is updated; the iterator ends on the first
/// point that escapes or hits the cap, which is never yielded itself.
#[derive(Clone, Debug)]
pub struct Orbit {
    cx: FixedPoint,
    cy: FixedPoint,
    x: FixedPoint,
    y: FixedPoint,
    iterations: u32,
    max_iterations: u32,
    completion: Option<Completion>,
}

impl Orbit {
    pub fn new(cx: FixedPoint, cy: FixedPoint, max_iterations: u32) -> Self {
        Self {
            cx,
            cy,
            x: FixedPoint::ZERO,
            y: FixedPoint::ZERO,
            iterations: 0,
            max_iterations,
            completion: None,
        }
    }

    /// `Some` once the iterator has been exhausted.
    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }
}

impl Iterator for Orbit {
    type Item = (FixedPoint, FixedPoint);

    fn next(&mut self) -> Option<Self::Item> {
        if self.completion.is_some() {
            return None;
        }

        let terms = Terms::of(self.x, self.y);
        let escaped = terms.escapes();
        let maxed = self.iterations >= self.max_iterations;
        if escaped || maxed {
            self.completion = Some(Completion {
                iterations: self.iterations,
                escaped,
                maxed,
            });
            return None;
        }

        (self.x, self.y) = terms.next(self.cx, self.cy);
        self.iterations += 1;
        Some((self.x, self.y))
    }
}

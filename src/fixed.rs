//! Signed fixed-point numbers in Q8.56.
//!
//! Every complex-plane quantity in the crate (viewport corner, step, the orbit itself) uses
//! [`FixedPoint`]. Additions wrap as 64-bit two's complement. Products are formed at double
//! width and truncated back after shifting, so the escape-time math never widens silently.

use std::ops::{Add, Neg, Sub};

use bytemuck::{Pod, Zeroable};

/// Total width of a fixed-point value in bits.
pub const BITWIDTH: u32 = 64;

/// Position of the implicit binary point.
pub const FRACTION_BITS: u32 = 56;

/// Width of a fixed-point value on the wire.
pub const BYTES: usize = (BITWIDTH / 8) as usize;

#[repr(transparent)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(i64);

impl FixedPoint {
    pub const ZERO: Self = FixedPoint(0);
    pub const ONE: Self = FixedPoint(1 << FRACTION_BITS);
    /// Smallest positive value.
    pub const LSB: Self = FixedPoint(1);
    /// `4.0`, the squared escape radius.
    pub const FOUR: Self = FixedPoint(4 << FRACTION_BITS);

    pub const fn from_bits(bits: i64) -> Self {
        FixedPoint(bits)
    }

    pub const fn to_bits(self) -> i64 {
        self.0
    }

    pub const fn from_int(value: i64) -> Self {
        FixedPoint(value.wrapping_shl(FRACTION_BITS))
    }

    /// `numerator / denominator`, rounded toward negative infinity for positive denominators.
    ///
    /// Panics if `denominator` is zero.
    pub const fn from_ratio(numerator: i64, denominator: i64) -> Self {
        let scaled = (numerator as i128) << FRACTION_BITS;
        FixedPoint(scaled.div_euclid(denominator as i128) as i64)
    }

    /// Multiplies at double width, shifts right arithmetically by `shift` and truncates to
    /// [`BITWIDTH`] bits.
    pub const fn mul_shift(self, rhs: Self, shift: u32) -> Self {
        let product = (self.0 as i128) * (rhs.0 as i128);
        FixedPoint((product >> shift) as i64)
    }

    /// `self * self`.
    pub const fn square(self) -> Self {
        self.mul_shift(self, FRACTION_BITS)
    }

    /// `2 * self * rhs`, folding the factor two into the shift.
    pub const fn double_product(self, rhs: Self) -> Self {
        self.mul_shift(rhs, FRACTION_BITS - 1)
    }

    pub const fn wrapping_add(self, rhs: Self) -> Self {
        FixedPoint(self.0.wrapping_add(rhs.0))
    }

    pub const fn wrapping_sub(self, rhs: Self) -> Self {
        FixedPoint(self.0.wrapping_sub(rhs.0))
    }

    /// Scales by an integer, wrapping.
    pub const fn wrapping_mul_int(self, factor: i64) -> Self {
        FixedPoint(self.0.wrapping_mul(factor))
    }

    pub const fn to_le_bytes(self) -> [u8; BYTES] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; BYTES]) -> Self {
        FixedPoint(i64::from_le_bytes(bytes))
    }
}

impl Add for FixedPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.wrapping_add(rhs)
    }
}

impl Sub for FixedPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.wrapping_sub(rhs)
    }
}

impl Neg for FixedPoint {
    type Output = Self;

    fn neg(self) -> Self::Output {
        FixedPoint(self.0.wrapping_neg())
    }
}

// WVM - wvm-math
// Module: Numeric Operations
//
// Copyright (c) 2025 The WVM Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Value-level implementations of the WebAssembly numeric instructions.
//!
//! Integer arithmetic wraps; division, remainder, and float-to-integer
//! truncation trap exactly where the WebAssembly specification says
//! they do. Every
//! float operation that has no preferred NaN result produces the
//! canonical quiet NaN, which keeps execution bit-deterministic.

use wvm_error::{kinds, Result};

use crate::float_bits::{FloatBits32, FloatBits64};

// Rounding and sqrt come from std when available, libm otherwise.
#[cfg(feature = "std")]
mod math_helpers {
    pub fn trunc_f32(x: f32) -> f32 {
        x.trunc()
    }
    pub fn trunc_f64(x: f64) -> f64 {
        x.trunc()
    }
    pub fn ceil_f32(x: f32) -> f32 {
        x.ceil()
    }
    pub fn ceil_f64(x: f64) -> f64 {
        x.ceil()
    }
    pub fn floor_f32(x: f32) -> f32 {
        x.floor()
    }
    pub fn floor_f64(x: f64) -> f64 {
        x.floor()
    }
    /// Round to nearest, ties to even.
    pub fn nearest_f32(x: f32) -> f32 {
        x.round_ties_even()
    }
    /// Round to nearest, ties to even.
    pub fn nearest_f64(x: f64) -> f64 {
        x.round_ties_even()
    }
    pub fn sqrt_f32(x: f32) -> f32 {
        x.sqrt()
    }
    pub fn sqrt_f64(x: f64) -> f64 {
        x.sqrt()
    }
}

#[cfg(not(feature = "std"))]
mod math_helpers {
    pub fn trunc_f32(x: f32) -> f32 {
        libm::truncf(x)
    }
    pub fn trunc_f64(x: f64) -> f64 {
        libm::trunc(x)
    }
    pub fn ceil_f32(x: f32) -> f32 {
        libm::ceilf(x)
    }
    pub fn ceil_f64(x: f64) -> f64 {
        libm::ceil(x)
    }
    pub fn floor_f32(x: f32) -> f32 {
        libm::floorf(x)
    }
    pub fn floor_f64(x: f64) -> f64 {
        libm::floor(x)
    }
    /// `rint` under the default rounding mode is round-to-nearest-even.
    pub fn nearest_f32(x: f32) -> f32 {
        libm::rintf(x)
    }
    /// `rint` under the default rounding mode is round-to-nearest-even.
    pub fn nearest_f64(x: f64) -> f64 {
        libm::rint(x)
    }
    pub fn sqrt_f32(x: f32) -> f32 {
        libm::sqrtf(x)
    }
    pub fn sqrt_f64(x: f64) -> f64 {
        libm::sqrt(x)
    }
}

use math_helpers::*;

// ------------------------------------------------------------------
// Integer division and remainder
// ------------------------------------------------------------------

/// `i32.div_s`. Traps on division by zero and on `i32::MIN / -1`.
pub fn i32_div_s(a: i32, b: i32) -> Result<i32> {
    if b == 0 {
        return Err(kinds::integer_divide_by_zero());
    }
    a.checked_div(b).ok_or_else(kinds::integer_overflow)
}

/// `i32.div_u`. Traps on division by zero.
pub fn i32_div_u(a: u32, b: u32) -> Result<u32> {
    if b == 0 {
        return Err(kinds::integer_divide_by_zero());
    }
    Ok(a / b)
}

/// `i32.rem_s`. Traps on division by zero; `i32::MIN % -1` is 0.
pub fn i32_rem_s(a: i32, b: i32) -> Result<i32> {
    if b == 0 {
        return Err(kinds::integer_divide_by_zero());
    }
    Ok(a.wrapping_rem(b))
}

/// `i32.rem_u`. Traps on division by zero.
pub fn i32_rem_u(a: u32, b: u32) -> Result<u32> {
    if b == 0 {
        return Err(kinds::integer_divide_by_zero());
    }
    Ok(a % b)
}

/// `i64.div_s`. Traps on division by zero and on `i64::MIN / -1`.
pub fn i64_div_s(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(kinds::integer_divide_by_zero());
    }
    a.checked_div(b).ok_or_else(kinds::integer_overflow)
}

/// `i64.div_u`. Traps on division by zero.
pub fn i64_div_u(a: u64, b: u64) -> Result<u64> {
    if b == 0 {
        return Err(kinds::integer_divide_by_zero());
    }
    Ok(a / b)
}

/// `i64.rem_s`. Traps on division by zero; `i64::MIN % -1` is 0.
pub fn i64_rem_s(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(kinds::integer_divide_by_zero());
    }
    Ok(a.wrapping_rem(b))
}

/// `i64.rem_u`. Traps on division by zero.
pub fn i64_rem_u(a: u64, b: u64) -> Result<u64> {
    if b == 0 {
        return Err(kinds::integer_divide_by_zero());
    }
    Ok(a % b)
}

// ------------------------------------------------------------------
// Integer width changes
// ------------------------------------------------------------------

/// `i32.wrap_i64`.
#[must_use]
pub fn i32_wrap_i64(a: i64) -> i32 {
    a as i32
}

/// `i64.extend_i32_s`.
#[must_use]
pub fn i64_extend_i32_s(a: i32) -> i64 {
    i64::from(a)
}

/// `i64.extend_i32_u`.
#[must_use]
pub fn i64_extend_i32_u(a: i32) -> i64 {
    i64::from(a as u32)
}

/// `i32.extend8_s`.
#[must_use]
pub fn i32_extend8_s(a: i32) -> i32 {
    i32::from(a as i8)
}

/// `i32.extend16_s`.
#[must_use]
pub fn i32_extend16_s(a: i32) -> i32 {
    i32::from(a as i16)
}

/// `i64.extend8_s`.
#[must_use]
pub fn i64_extend8_s(a: i64) -> i64 {
    i64::from(a as i8)
}

/// `i64.extend16_s`.
#[must_use]
pub fn i64_extend16_s(a: i64) -> i64 {
    i64::from(a as i16)
}

/// `i64.extend32_s`.
#[must_use]
pub fn i64_extend32_s(a: i64) -> i64 {
    i64::from(a as i32)
}

// ------------------------------------------------------------------
// f32 operations
// ------------------------------------------------------------------

fn canon_f32(x: f32) -> FloatBits32 {
    if x.is_nan() {
        FloatBits32::NAN
    } else {
        FloatBits32::from_float(x)
    }
}

fn canon_f64(x: f64) -> FloatBits64 {
    if x.is_nan() {
        FloatBits64::NAN
    } else {
        FloatBits64::from_float(x)
    }
}

/// `f32.add`.
#[must_use]
pub fn f32_add(a: FloatBits32, b: FloatBits32) -> FloatBits32 {
    canon_f32(a.value() + b.value())
}

/// `f32.sub`.
#[must_use]
pub fn f32_sub(a: FloatBits32, b: FloatBits32) -> FloatBits32 {
    canon_f32(a.value() - b.value())
}

/// `f32.mul`.
#[must_use]
pub fn f32_mul(a: FloatBits32, b: FloatBits32) -> FloatBits32 {
    canon_f32(a.value() * b.value())
}

/// `f32.div`. Division by zero yields an infinity, never a trap.
#[must_use]
pub fn f32_div(a: FloatBits32, b: FloatBits32) -> FloatBits32 {
    canon_f32(a.value() / b.value())
}

/// `f32.min`. NaN wins; `-0.0` beats `+0.0`.
#[must_use]
pub fn f32_min(a: FloatBits32, b: FloatBits32) -> FloatBits32 {
    let (x, y) = (a.value(), b.value());
    if x.is_nan() || y.is_nan() {
        FloatBits32::NAN
    } else if x < y {
        a
    } else if y < x {
        b
    } else {
        // Equal, possibly ±0: the sign-bit OR picks the negative zero.
        FloatBits32::from_bits(a.to_bits() | b.to_bits())
    }
}

/// `f32.max`. NaN wins; `+0.0` beats `-0.0`.
#[must_use]
pub fn f32_max(a: FloatBits32, b: FloatBits32) -> FloatBits32 {
    let (x, y) = (a.value(), b.value());
    if x.is_nan() || y.is_nan() {
        FloatBits32::NAN
    } else if x > y {
        a
    } else if y > x {
        b
    } else {
        FloatBits32::from_bits(a.to_bits() & b.to_bits())
    }
}

/// `f32.copysign`. A pure bit operation; NaN payloads pass through.
#[must_use]
pub fn f32_copysign(a: FloatBits32, b: FloatBits32) -> FloatBits32 {
    FloatBits32::from_bits((a.to_bits() & 0x7fff_ffff) | (b.to_bits() & 0x8000_0000))
}

/// `f32.abs`. A pure bit operation.
#[must_use]
pub fn f32_abs(a: FloatBits32) -> FloatBits32 {
    FloatBits32::from_bits(a.to_bits() & 0x7fff_ffff)
}

/// `f32.neg`. A pure bit operation.
#[must_use]
pub fn f32_neg(a: FloatBits32) -> FloatBits32 {
    FloatBits32::from_bits(a.to_bits() ^ 0x8000_0000)
}

/// `f32.ceil`.
#[must_use]
pub fn f32_ceil(a: FloatBits32) -> FloatBits32 {
    canon_f32(ceil_f32(a.value()))
}

/// `f32.floor`.
#[must_use]
pub fn f32_floor(a: FloatBits32) -> FloatBits32 {
    canon_f32(floor_f32(a.value()))
}

/// `f32.trunc`.
#[must_use]
pub fn f32_trunc(a: FloatBits32) -> FloatBits32 {
    canon_f32(trunc_f32(a.value()))
}

/// `f32.nearest`. Round to nearest, ties to even.
#[must_use]
pub fn f32_nearest(a: FloatBits32) -> FloatBits32 {
    canon_f32(nearest_f32(a.value()))
}

/// `f32.sqrt`. The square root of a negative number is NaN.
#[must_use]
pub fn f32_sqrt(a: FloatBits32) -> FloatBits32 {
    canon_f32(sqrt_f32(a.value()))
}

// ------------------------------------------------------------------
// f64 operations
// ------------------------------------------------------------------

/// `f64.add`.
#[must_use]
pub fn f64_add(a: FloatBits64, b: FloatBits64) -> FloatBits64 {
    canon_f64(a.value() + b.value())
}

/// `f64.sub`.
#[must_use]
pub fn f64_sub(a: FloatBits64, b: FloatBits64) -> FloatBits64 {
    canon_f64(a.value() - b.value())
}

/// `f64.mul`.
#[must_use]
pub fn f64_mul(a: FloatBits64, b: FloatBits64) -> FloatBits64 {
    canon_f64(a.value() * b.value())
}

/// `f64.div`. Division by zero yields an infinity, never a trap.
#[must_use]
pub fn f64_div(a: FloatBits64, b: FloatBits64) -> FloatBits64 {
    canon_f64(a.value() / b.value())
}

/// `f64.min`. NaN wins; `-0.0` beats `+0.0`.
#[must_use]
pub fn f64_min(a: FloatBits64, b: FloatBits64) -> FloatBits64 {
    let (x, y) = (a.value(), b.value());
    if x.is_nan() || y.is_nan() {
        FloatBits64::NAN
    } else if x < y {
        a
    } else if y < x {
        b
    } else {
        FloatBits64::from_bits(a.to_bits() | b.to_bits())
    }
}

/// `f64.max`. NaN wins; `+0.0` beats `-0.0`.
#[must_use]
pub fn f64_max(a: FloatBits64, b: FloatBits64) -> FloatBits64 {
    let (x, y) = (a.value(), b.value());
    if x.is_nan() || y.is_nan() {
        FloatBits64::NAN
    } else if x > y {
        a
    } else if y > x {
        b
    } else {
        FloatBits64::from_bits(a.to_bits() & b.to_bits())
    }
}

/// `f64.copysign`. A pure bit operation; NaN payloads pass through.
#[must_use]
pub fn f64_copysign(a: FloatBits64, b: FloatBits64) -> FloatBits64 {
    FloatBits64::from_bits(
        (a.to_bits() & 0x7fff_ffff_ffff_ffff) | (b.to_bits() & 0x8000_0000_0000_0000),
    )
}

/// `f64.abs`. A pure bit operation.
#[must_use]
pub fn f64_abs(a: FloatBits64) -> FloatBits64 {
    FloatBits64::from_bits(a.to_bits() & 0x7fff_ffff_ffff_ffff)
}

/// `f64.neg`. A pure bit operation.
#[must_use]
pub fn f64_neg(a: FloatBits64) -> FloatBits64 {
    FloatBits64::from_bits(a.to_bits() ^ 0x8000_0000_0000_0000)
}

/// `f64.ceil`.
#[must_use]
pub fn f64_ceil(a: FloatBits64) -> FloatBits64 {
    canon_f64(ceil_f64(a.value()))
}

/// `f64.floor`.
#[must_use]
pub fn f64_floor(a: FloatBits64) -> FloatBits64 {
    canon_f64(floor_f64(a.value()))
}

/// `f64.trunc`.
#[must_use]
pub fn f64_trunc(a: FloatBits64) -> FloatBits64 {
    canon_f64(trunc_f64(a.value()))
}

/// `f64.nearest`. Round to nearest, ties to even.
#[must_use]
pub fn f64_nearest(a: FloatBits64) -> FloatBits64 {
    canon_f64(nearest_f64(a.value()))
}

/// `f64.sqrt`. The square root of a negative number is NaN.
#[must_use]
pub fn f64_sqrt(a: FloatBits64) -> FloatBits64 {
    canon_f64(sqrt_f64(a.value()))
}

// ------------------------------------------------------------------
// Trapping float-to-integer truncation
// ------------------------------------------------------------------

/// `i32.trunc_f32_s`. Traps on NaN and on out-of-range values.
pub fn i32_trunc_f32_s(a: FloatBits32) -> Result<i32> {
    let x = a.value();
    if x.is_nan() {
        return Err(kinds::invalid_conversion_to_integer());
    }
    let t = trunc_f32(x);
    if t >= 2_147_483_648.0 || t < -2_147_483_648.0 {
        return Err(kinds::integer_overflow());
    }
    Ok(t as i32)
}

/// `i32.trunc_f32_u`. Traps on NaN and on out-of-range values.
pub fn i32_trunc_f32_u(a: FloatBits32) -> Result<u32> {
    let x = a.value();
    if x.is_nan() {
        return Err(kinds::invalid_conversion_to_integer());
    }
    let t = trunc_f32(x);
    if t >= 4_294_967_296.0 || t <= -1.0 {
        return Err(kinds::integer_overflow());
    }
    Ok(t as u32)
}

/// `i32.trunc_f64_s`. Traps on NaN and on out-of-range values.
pub fn i32_trunc_f64_s(a: FloatBits64) -> Result<i32> {
    let x = a.value();
    if x.is_nan() {
        return Err(kinds::invalid_conversion_to_integer());
    }
    let t = trunc_f64(x);
    if t >= 2_147_483_648.0 || t <= -2_147_483_649.0 {
        return Err(kinds::integer_overflow());
    }
    Ok(t as i32)
}

/// `i32.trunc_f64_u`. Traps on NaN and on out-of-range values.
pub fn i32_trunc_f64_u(a: FloatBits64) -> Result<u32> {
    let x = a.value();
    if x.is_nan() {
        return Err(kinds::invalid_conversion_to_integer());
    }
    let t = trunc_f64(x);
    if t >= 4_294_967_296.0 || t <= -1.0 {
        return Err(kinds::integer_overflow());
    }
    Ok(t as u32)
}

/// `i64.trunc_f32_s`. Traps on NaN and on out-of-range values.
pub fn i64_trunc_f32_s(a: FloatBits32) -> Result<i64> {
    let x = a.value();
    if x.is_nan() {
        return Err(kinds::invalid_conversion_to_integer());
    }
    let t = trunc_f32(x);
    if t >= 9_223_372_036_854_775_808.0 || t < -9_223_372_036_854_775_808.0 {
        return Err(kinds::integer_overflow());
    }
    Ok(t as i64)
}

/// `i64.trunc_f32_u`. Traps on NaN and on out-of-range values.
pub fn i64_trunc_f32_u(a: FloatBits32) -> Result<u64> {
    let x = a.value();
    if x.is_nan() {
        return Err(kinds::invalid_conversion_to_integer());
    }
    let t = trunc_f32(x);
    if t >= 18_446_744_073_709_551_616.0 || t <= -1.0 {
        return Err(kinds::integer_overflow());
    }
    Ok(t as u64)
}

/// `i64.trunc_f64_s`. Traps on NaN and on out-of-range values.
pub fn i64_trunc_f64_s(a: FloatBits64) -> Result<i64> {
    let x = a.value();
    if x.is_nan() {
        return Err(kinds::invalid_conversion_to_integer());
    }
    let t = trunc_f64(x);
    if t >= 9_223_372_036_854_775_808.0 || t < -9_223_372_036_854_775_808.0 {
        return Err(kinds::integer_overflow());
    }
    Ok(t as i64)
}

/// `i64.trunc_f64_u`. Traps on NaN and on out-of-range values.
pub fn i64_trunc_f64_u(a: FloatBits64) -> Result<u64> {
    let x = a.value();
    if x.is_nan() {
        return Err(kinds::invalid_conversion_to_integer());
    }
    let t = trunc_f64(x);
    if t >= 18_446_744_073_709_551_616.0 || t <= -1.0 {
        return Err(kinds::integer_overflow());
    }
    Ok(t as u64)
}

// ------------------------------------------------------------------
// Saturating truncation (0xFC prefix)
// ------------------------------------------------------------------
//
// Rust's float-to-int `as` casts already implement the saturating
// semantics: NaN becomes 0 and out-of-range values clamp.

/// `i32.trunc_sat_f32_s`.
#[must_use]
pub fn i32_trunc_sat_f32_s(a: FloatBits32) -> i32 {
    a.value() as i32
}

/// `i32.trunc_sat_f32_u`.
#[must_use]
pub fn i32_trunc_sat_f32_u(a: FloatBits32) -> u32 {
    a.value() as u32
}

/// `i32.trunc_sat_f64_s`.
#[must_use]
pub fn i32_trunc_sat_f64_s(a: FloatBits64) -> i32 {
    a.value() as i32
}

/// `i32.trunc_sat_f64_u`.
#[must_use]
pub fn i32_trunc_sat_f64_u(a: FloatBits64) -> u32 {
    a.value() as u32
}

/// `i64.trunc_sat_f32_s`.
#[must_use]
pub fn i64_trunc_sat_f32_s(a: FloatBits32) -> i64 {
    a.value() as i64
}

/// `i64.trunc_sat_f32_u`.
#[must_use]
pub fn i64_trunc_sat_f32_u(a: FloatBits32) -> u64 {
    a.value() as u64
}

/// `i64.trunc_sat_f64_s`.
#[must_use]
pub fn i64_trunc_sat_f64_s(a: FloatBits64) -> i64 {
    a.value() as i64
}

/// `i64.trunc_sat_f64_u`.
#[must_use]
pub fn i64_trunc_sat_f64_u(a: FloatBits64) -> u64 {
    a.value() as u64
}

// ------------------------------------------------------------------
// Integer-to-float conversion and reinterpretation
// ------------------------------------------------------------------

/// `f32.convert_i32_s`.
#[must_use]
pub fn f32_convert_i32_s(a: i32) -> FloatBits32 {
    FloatBits32::from_float(a as f32)
}

/// `f32.convert_i32_u`.
#[must_use]
pub fn f32_convert_i32_u(a: u32) -> FloatBits32 {
    FloatBits32::from_float(a as f32)
}

/// `f32.convert_i64_s`.
#[must_use]
pub fn f32_convert_i64_s(a: i64) -> FloatBits32 {
    FloatBits32::from_float(a as f32)
}

/// `f32.convert_i64_u`.
#[must_use]
pub fn f32_convert_i64_u(a: u64) -> FloatBits32 {
    FloatBits32::from_float(a as f32)
}

/// `f64.convert_i32_s`.
#[must_use]
pub fn f64_convert_i32_s(a: i32) -> FloatBits64 {
    FloatBits64::from_float(f64::from(a))
}

/// `f64.convert_i32_u`.
#[must_use]
pub fn f64_convert_i32_u(a: u32) -> FloatBits64 {
    FloatBits64::from_float(f64::from(a))
}

/// `f64.convert_i64_s`.
#[must_use]
pub fn f64_convert_i64_s(a: i64) -> FloatBits64 {
    FloatBits64::from_float(a as f64)
}

/// `f64.convert_i64_u`.
#[must_use]
pub fn f64_convert_i64_u(a: u64) -> FloatBits64 {
    FloatBits64::from_float(a as f64)
}

/// `f32.demote_f64`.
#[must_use]
pub fn f32_demote_f64(a: FloatBits64) -> FloatBits32 {
    canon_f32(a.value() as f32)
}

/// `f64.promote_f32`.
#[must_use]
pub fn f64_promote_f32(a: FloatBits32) -> FloatBits64 {
    canon_f64(f64::from(a.value()))
}

/// `i32.reinterpret_f32`.
#[must_use]
pub fn i32_reinterpret_f32(a: FloatBits32) -> i32 {
    a.to_bits() as i32
}

/// `i64.reinterpret_f64`.
#[must_use]
pub fn i64_reinterpret_f64(a: FloatBits64) -> i64 {
    a.to_bits() as i64
}

/// `f32.reinterpret_i32`.
#[must_use]
pub fn f32_reinterpret_i32(a: i32) -> FloatBits32 {
    FloatBits32::from_bits(a as u32)
}

/// `f64.reinterpret_i64`.
#[must_use]
pub fn f64_reinterpret_i64(a: i64) -> FloatBits64 {
    FloatBits64::from_bits(a as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wvm_error::codes;

    #[test]
    fn div_s_traps() {
        assert_eq!(
            i32_div_s(1, 0).unwrap_err().code,
            codes::INTEGER_DIVIDE_BY_ZERO
        );
        assert_eq!(
            i32_div_s(i32::MIN, -1).unwrap_err().code,
            codes::INTEGER_OVERFLOW
        );
        assert_eq!(i32_div_s(-7, 2).unwrap(), -3);
        assert_eq!(
            i64_div_s(i64::MIN, -1).unwrap_err().code,
            codes::INTEGER_OVERFLOW
        );
    }

    #[test]
    fn rem_s_min_by_minus_one_is_zero() {
        assert_eq!(i32_rem_s(i32::MIN, -1).unwrap(), 0);
        assert_eq!(i64_rem_s(i64::MIN, -1).unwrap(), 0);
    }

    #[test]
    fn trunc_traps_on_nan_and_range() {
        assert_eq!(
            i32_trunc_f32_s(FloatBits32::NAN).unwrap_err().code,
            codes::INVALID_CONVERSION_TO_INTEGER
        );
        assert_eq!(
            i32_trunc_f32_s(FloatBits32::from_float(2_147_483_648.0))
                .unwrap_err()
                .code,
            codes::INTEGER_OVERFLOW
        );
        assert_eq!(
            i32_trunc_f32_s(FloatBits32::from_float(-2_147_483_648.0)).unwrap(),
            i32::MIN
        );
        assert_eq!(i32_trunc_f32_u(FloatBits32::from_float(-0.5)).unwrap(), 0);
        assert_eq!(
            i32_trunc_f32_u(FloatBits32::from_float(-1.0))
                .unwrap_err()
                .code,
            codes::INTEGER_OVERFLOW
        );
    }

    #[test]
    fn trunc_sat_clamps() {
        assert_eq!(i32_trunc_sat_f32_s(FloatBits32::NAN), 0);
        assert_eq!(
            i32_trunc_sat_f32_s(FloatBits32::from_float(1e10)),
            i32::MAX
        );
        assert_eq!(
            i32_trunc_sat_f32_s(FloatBits32::from_float(-1e10)),
            i32::MIN
        );
        assert_eq!(i64_trunc_sat_f64_u(FloatBits64::from_float(-3.5)), 0);
    }

    #[test]
    fn convert_u32_is_unsigned() {
        // 0xFFFFFFFF as an unsigned conversion rounds up to 2^32.
        let converted = f32_convert_i32_u(0xFFFF_FFFF);
        assert_eq!(converted.value(), 4_294_967_296.0);
    }

    #[test]
    fn nan_results_are_canonical() {
        let nan_payload = FloatBits32::from_bits(0x7fc0_1234);
        assert_eq!(f32_add(nan_payload, FloatBits32::from_float(1.0)), FloatBits32::NAN);
        assert_eq!(f32_min(nan_payload, FloatBits32::from_float(1.0)), FloatBits32::NAN);
        assert_eq!(f32_sqrt(FloatBits32::from_float(-4.0)), FloatBits32::NAN);
        assert_eq!(
            f64_promote_f32(FloatBits32::from_bits(0x7fc0_0001)),
            FloatBits64::NAN
        );
    }

    #[test]
    fn copysign_preserves_payload() {
        let payload = FloatBits32::from_bits(0x7fc0_1234);
        let negative = FloatBits32::from_float(-1.0);
        assert_eq!(
            f32_copysign(payload, negative).to_bits(),
            0xffc0_1234
        );
    }

    #[test]
    fn min_max_signed_zero() {
        let pos = FloatBits32::from_float(0.0);
        let neg = FloatBits32::from_float(-0.0);
        assert_eq!(f32_min(pos, neg), neg);
        assert_eq!(f32_max(neg, pos), pos);
    }

    #[test]
    fn nearest_ties_to_even() {
        assert_eq!(f32_nearest(FloatBits32::from_float(2.5)).value(), 2.0);
        assert_eq!(f32_nearest(FloatBits32::from_float(3.5)).value(), 4.0);
        assert_eq!(f64_nearest(FloatBits64::from_float(-2.5)).value(), -2.0);
    }
}

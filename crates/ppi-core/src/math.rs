// crates/ppi-core/src/math.rs
//
// Truncating fixed-point helpers.
//
// Reward-per-share values are scaled by 1e18 and multiplied against token
// amounts that are themselves 1e18-scaled, so intermediate products routinely
// exceed u128. `mul_div` keeps a 256-bit intermediate and fails only when the
// final quotient does not fit.

use crate::error::PpiError;

/// Scale of `acc_reward_per_share`.
pub const ACC_PRECISION: u128 = 1_000_000_000_000_000_000;

const LOW_MASK: u128 = u64::MAX as u128;

/// Full 256-bit product of two u128 values as `(high, low)`.
fn full_mul(a: u128, b: u128) -> (u128, u128) {
    let (a1, a0) = (a >> 64, a & LOW_MASK);
    let (b1, b0) = (b >> 64, b & LOW_MASK);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    // Sum of three values below 2^64 each, cannot overflow.
    let mid = (p00 >> 64) + (p01 & LOW_MASK) + (p10 & LOW_MASK);
    let low = (p00 & LOW_MASK) | (mid << 64);
    let high = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (high, low)
}

/// Compute `a * b / denominator`, truncating toward zero.
///
/// # Errors
/// `MathOverflow` if `denominator == 0` or the quotient exceeds u128.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, PpiError> {
    if denominator == 0 {
        return Err(PpiError::MathOverflow);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / denominator);
    }

    let (high, low) = full_mul(a, b);
    if high >= denominator {
        return Err(PpiError::MathOverflow);
    }

    // Restoring long division of (high, low) by denominator, one bit at a time.
    let mut remainder = high;
    let mut quotient: u128 = 0;
    for i in (0..128).rev() {
        let carry = remainder >> 127;
        remainder = (remainder << 1) | ((low >> i) & 1);
        quotient <<= 1;
        if carry == 1 || remainder >= denominator {
            remainder = remainder.wrapping_sub(denominator);
            quotient |= 1;
        }
    }
    Ok(quotient)
}

/// `a * pct / 100`, truncating.
pub fn percent_of(a: u128, pct: u128) -> Result<u128, PpiError> {
    mul_div(a, pct, 100)
}

/// Checked addition mapped to `MathOverflow`.
pub fn add(a: u128, b: u128) -> Result<u128, PpiError> {
    a.checked_add(b).ok_or(PpiError::MathOverflow)
}

/// Checked subtraction mapped to `MathOverflow`.
pub fn sub(a: u128, b: u128) -> Result<u128, PpiError> {
    a.checked_sub(b).ok_or(PpiError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_match_plain_arithmetic() {
        assert_eq!(mul_div(10, 20, 3).unwrap(), 66);
        assert_eq!(mul_div(0, u128::MAX, 7).unwrap(), 0);
        assert_eq!(mul_div(7, 1, 7).unwrap(), 1);
    }

    #[test]
    fn test_wide_intermediate() {
        // (2^127) * 4 / 8 = 2^126, product overflows u128.
        let a = 1u128 << 127;
        assert_eq!(mul_div(a, 4, 8).unwrap(), 1u128 << 126);

        // u128::MAX * u128::MAX / u128::MAX = u128::MAX
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX).unwrap(), u128::MAX);
    }

    #[test]
    fn test_wide_intermediate_truncates() {
        // 1e27 * 1e27 / 3e18 = 333333333333333333333333333333333.33...
        let a = 1_000_000_000_000_000_000_000_000_000u128;
        let result = mul_div(a, a, 3 * ACC_PRECISION).unwrap();
        assert_eq!(result, 333_333_333_333_333_333_333_333_333_333_333_333u128);
    }

    #[test]
    fn test_quotient_overflow() {
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(PpiError::MathOverflow));
    }

    #[test]
    fn test_zero_denominator() {
        assert_eq!(mul_div(1, 1, 0), Err(PpiError::MathOverflow));
    }

    #[test]
    fn test_percent_of_truncates() {
        assert_eq!(percent_of(10_000_000, 33).unwrap(), 3_300_000);
        assert_eq!(percent_of(7, 33).unwrap(), 2);
    }
}

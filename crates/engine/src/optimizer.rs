//! Trade size optimizer for 3- and 4-hop constant-product loops.
//!
//! The optimum input comes from a closed form per loop size (floating point).
//! The output chain that goes on chain is then recomputed with exact integer
//! swap arithmetic.
//!
//! Reserves are passed per hop as `(input-side, output-side)`, already
//! oriented by the hop's reverse flag.

use crate::EngineConfig;
use loopswap_core::{LoopShape, TradeQuote};
use primitive_types::U256;

/// Compounded 0.3% fee reciprocals, by the number of fee legs they cover.
const FEE_ONE_LEG: f64 = 1.003;
const FEE_TWO_LEGS: f64 = 1.006;
const FEE_THREE_LEGS: f64 = 1.009;
const FEE_FOUR_LEGS: f64 = 1.0121;

/// Output of one constant-product swap, truncated toward zero.
///
/// `floor(fee_num * x * r_out / (fee_den * r_in + fee_num * x))`, computed
/// exactly in 256-bit integers. Zero if either reserve is empty.
pub fn swap_output(
    amount_in: u64,
    reserve_in: u64,
    reserve_out: u64,
    fee_numerator: u64,
    fee_denominator: u64,
) -> u64 {
    if reserve_in == 0 || reserve_out == 0 {
        return 0;
    }
    let x = U256::from(amount_in) * U256::from(fee_numerator);
    let numerator = x * U256::from(reserve_out);
    let denominator = U256::from(reserve_in) * U256::from(fee_denominator) + x;
    if denominator.is_zero() {
        return 0;
    }
    let out = numerator / denominator;
    // Below reserve_out unless the fee fraction exceeds one
    if out > U256::from(u64::MAX) {
        u64::MAX
    } else {
        out.low_u64()
    }
}

fn any_empty(reserves: &[(u64, u64)]) -> bool {
    reserves.iter().any(|&(r_in, r_out)| r_in == 0 || r_out == 0)
}

/// Closed-form optimum for a 3-hop loop.
///
/// With `(x_i, y_i)` the oriented reserves of hop `i`:
/// `Da = x1 x2 x3`, `Db = x1 x2 + 1.003 x1 y3 + 1.006 y2 y3`,
/// `Dc = 1.009 y1 y2 y3`. The two roots are `(±√Da √Dc − Dc) / Db` and the
/// larger magnitude is returned.
pub fn optimum_three(reserves: &[(u64, u64); 3]) -> f64 {
    if any_empty(reserves) {
        return 0.0;
    }
    let [(x1, y1), (x2, y2), (x3, y3)] = reserves.map(|(a, b)| (a as f64, b as f64));

    let da = x1 * x2 * x3;
    let db = x1 * x2 + FEE_ONE_LEG * x1 * y3 + FEE_TWO_LEGS * y2 * y3;
    let dc = FEE_THREE_LEGS * y1 * y2 * y3;
    if db == 0.0 {
        return 0.0;
    }

    let root = da.sqrt() * dc.sqrt();
    let c1 = (root - dc) / db;
    let c2 = (-root - dc) / db;
    c1.abs().max(c2.abs())
}

/// Closed-form optimum for a 4-hop loop with reserves `(a,b),(c,d),(e,f),(g,h)`:
/// `|√(K abcdefgh) − K aceg| / (bdf + 1.003 bdg + 1.006 beg + 1.009 ceg)`.
pub fn optimum_four(reserves: &[(u64, u64); 4]) -> f64 {
    if any_empty(reserves) {
        return 0.0;
    }
    let [(a, b), (c, d), (e, f), (g, h)] = reserves.map(|(x, y)| (x as f64, y as f64));

    let denominator = b * d * f
        + FEE_ONE_LEG * b * d * g
        + FEE_TWO_LEGS * b * e * g
        + FEE_THREE_LEGS * c * e * g;
    if denominator == 0.0 {
        return 0.0;
    }
    // Split the product to stay clear of f64 overflow on large reserves
    let root = (FEE_FOUR_LEGS * a * b * c * d).sqrt() * (e * f * g * h).sqrt();
    (root - FEE_FOUR_LEGS * a * c * e * g).abs() / denominator
}

/// Optimum for any supported loop shape. Zero on a shape/length mismatch.
pub fn optimal_input(shape: LoopShape, reserves: &[(u64, u64)]) -> f64 {
    match shape {
        LoopShape::Triangle => <&[(u64, u64); 3]>::try_from(reserves)
            .map(optimum_three)
            .unwrap_or(0.0),
        LoopShape::Quad => <&[(u64, u64); 4]>::try_from(reserves)
            .map(optimum_four)
            .unwrap_or(0.0),
    }
}

/// Quote builder holding the fee and haircut parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Optimizer {
    fee_numerator: u64,
    fee_denominator: u64,
    haircut_divisor: u64,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for Optimizer {
    fn from(config: &EngineConfig) -> Self {
        Self {
            fee_numerator: config.fee_numerator,
            fee_denominator: config.fee_denominator,
            haircut_divisor: config.haircut_divisor,
        }
    }
}

impl Optimizer {
    /// `amount - amount / haircut_divisor`.
    #[inline]
    pub fn haircut(&self, amount: u64) -> u64 {
        if self.haircut_divisor == 0 {
            return amount;
        }
        amount - amount / self.haircut_divisor
    }

    /// Exact per-hop outputs for `input`.
    ///
    /// Every output but the last is haircut, and the haircut value is what the
    /// next hop consumes.
    pub fn output_chain(&self, input: u64, reserves: &[(u64, u64)]) -> Vec<u64> {
        let last = reserves.len().saturating_sub(1);
        let mut amount = input;
        reserves
            .iter()
            .enumerate()
            .map(|(i, &(r_in, r_out))| {
                let out = swap_output(amount, r_in, r_out, self.fee_numerator, self.fee_denominator);
                amount = if i < last { self.haircut(out) } else { out };
                amount
            })
            .collect()
    }

    /// Quote a loop: size the input from the closed form, cap it at `balance`,
    /// and compute the exact output chain.
    pub fn quote(&self, shape: LoopShape, reserves: &[(u64, u64)], balance: u64) -> TradeQuote {
        // `as` saturates and maps NaN to zero
        let optimum = optimal_input(shape, reserves).floor() as u64;
        let input = optimum.min(balance);
        TradeQuote::new(input, self.output_chain(input, reserves))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const E9: u64 = 1_000_000_000;
    const E18: u64 = E9 * E9;

    fn approx(actual: f64, expected: f64) {
        let tolerance = expected.abs() * 1e-9 + 1e-6;
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_swap_output() {
        assert_eq!(swap_output(1_000_000, E9, E9, 997, 1000), 996_006);
        assert_eq!(swap_output(1_000_000, E9, 2 * E9, 997, 1000), 1_992_013);
        assert_eq!(swap_output(0, E9, E9, 997, 1000), 0);
        assert_eq!(swap_output(1_000, 0, E9, 997, 1000), 0);
        assert_eq!(swap_output(1_000, E9, 0, 997, 1000), 0);
    }

    #[test]
    fn test_swap_output_monotonic_and_bounded() {
        let reserves = [
            (1u64, 1u64),
            (1_000, 5),
            (E9, 3 * E9),
            (E18, E18),
            (u64::MAX, u64::MAX),
        ];
        for (r_in, r_out) in reserves {
            let mut previous = 0;
            for x in [
                0u64,
                1,
                2,
                10,
                1_000,
                1_000_000,
                E9,
                E18 / 10,
                E18,
                10 * E18,
                u64::MAX,
            ] {
                let out = swap_output(x, r_in, r_out, 997, 1000);
                assert!(out >= previous, "not monotonic at x={x} reserves=({r_in}, {r_out})");
                assert!(out < r_out, "output {out} reached reserve {r_out}");
                previous = out;
            }
        }
    }

    #[test]
    fn test_swap_output_exact_at_18_decimals() {
        assert_eq!(swap_output(E18 / 10, E18, E18, 997, 1000), 90_661_089_388_014_913);
        // From here on x * fee * r_out no longer fits in u128
        assert_eq!(swap_output(E18, E18, E18, 997, 1000), 499_248_873_309_964_947);
        assert_eq!(
            swap_output(u64::MAX, u64::MAX, u64::MAX, 997, 1000),
            9_209_516_195_036_766_630
        );
        assert_eq!(
            swap_output(u64::MAX, E18, E18, 997, 1000),
            948_430_757_867_025_930
        );
    }

    #[test]
    fn test_optimum_three_balanced() {
        approx(optimum_three(&[(E9, E9); 3]), 669_155_839.251517);
    }

    #[test]
    fn test_optimum_three_skewed() {
        let reserves = [(E9, 2 * E9), (3 * E9, 1_600_000_000), (5 * E9, 3_200_000_000)];
        approx(optimum_three(&reserves), 2_005_344_281.2273967);
    }

    #[test]
    fn test_optimum_four_balanced() {
        approx(optimum_four(&[(E9, E9); 4]), 1_510_251.7067567);
    }

    #[test]
    fn test_optimum_four_skewed() {
        let reserves = [
            (E9, 1_050_000_000),
            (2 * E9, 2_100_000_000),
            (4 * E9, 4_200_000_000),
            (8 * E9, 8_400_000_000),
        ];
        approx(optimum_four(&reserves), 49_558_199.069135);
    }

    #[test]
    fn test_zero_reserve_means_no_trade() {
        assert_eq!(optimum_three(&[(E9, E9), (0, E9), (E9, E9)]), 0.0);
        assert_eq!(optimum_four(&[(E9, E9), (E9, E9), (E9, 0), (E9, E9)]), 0.0);

        let quote = Optimizer::default().quote(LoopShape::Triangle, &[(E9, E9), (E9, 0), (E9, E9)], E9);
        assert_eq!(quote.input, 0);
        assert_eq!(quote.margin(), 0);
    }

    #[test]
    fn test_optimal_input_length_mismatch() {
        assert_eq!(optimal_input(LoopShape::Quad, &[(E9, E9); 3]), 0.0);
    }

    #[test]
    fn test_output_chain_haircut() {
        let optimizer = Optimizer::default();
        assert_eq!(
            optimizer.output_chain(1_000_000, &[(E9, E9); 3]),
            vec![995_997, 992_014, 988_060]
        );
        assert_eq!(
            optimizer.output_chain(1_000_000, &[(E9, 1_100_000_000); 4]),
            vec![1_095_597, 1_200_218, 1_314_692, 1_439_935]
        );
    }

    #[test]
    fn test_haircut() {
        let optimizer = Optimizer::default();
        assert_eq!(optimizer.haircut(996_006), 995_997);
        assert_eq!(optimizer.haircut(99_999), 99_999);
        assert_eq!(optimizer.haircut(100_000), 99_999);
    }

    #[test]
    fn test_quote_capped_by_balance() {
        let optimizer = Optimizer::default();
        let reserves = [(E9, 1_100_000_000); 3];

        let quote = optimizer.quote(LoopShape::Triangle, &reserves, 10_000_000);
        assert_eq!(quote.input, 10_000_000);
        assert_eq!(quote.outputs, vec![10_858_630, 11_780_999, 12_770_226]);
        assert_eq!(quote.margin(), 2_770_226);
    }

    #[test]
    fn test_balanced_loop_is_unprofitable() {
        let quote = Optimizer::default().quote(LoopShape::Triangle, &[(E9, E9); 3], 50_000_000);
        assert_eq!(quote.input, 50_000_000);
        assert!(quote.margin() < 0);
    }
}

//! Injection pricing.
//!
//! Sending debris to the opponent costs a power-law function of its health,
//! divided by its cooldown. The exponent steps down as the unit gets more
//! "powerful" (health per tick of cooldown), but every cheaper-exponent term
//! seen at lower power stays in the maximum, so faster and tougher units are
//! never cheaper than weaker ones:
//!
//! | power = health / cooldown | cost |
//! |---|---|
//! | ≤ 30  | v₂ |
//! | ≤ 80  | max(v₂, v₁.₉) |
//! | ≤ 120 | max(v₂, v₁.₉, v₁.₈) |
//! | > 120 | max(v₂, v₁.₉, v₁.₈, v₁.₆) |
//!
//! where vₑ = ⌈healthᵉ / divisor / cooldown⌉ with divisors 12, 8, 4.6 and 2.
//! The result is never below [`MIN_INJECTION_COST`].
//!
//! Since v₂ stays in every bracket, heavy units are priced by v₂ in
//! practice: `debris_cost(1, 500)` is 20834, not the 15682 that the
//! lower-exponent terms alone would give.

/// Floor on the price of any injection.
pub const MIN_INJECTION_COST: u64 = 200;

/// (exponent, divisor, upper power bound of the bracket that introduces it).
const PRICE_TERMS: [(f64, f64, f64); 4] = [
    (2.0, 12.0, 30.0),
    (1.9, 8.0, 80.0),
    (1.8, 4.6, 120.0),
    (1.6, 2.0, f64::INFINITY),
];

/// Price of sending one debris with the given cooldown and health.
///
/// Both inputs must be positive; a zero cooldown is priced as cooldown 1.
#[must_use]
pub fn debris_cost(cooldown: u32, health: u32) -> u64 {
    let cooldown = f64::from(cooldown.max(1));
    let health = f64::from(health);
    let power = health / cooldown;

    let mut cost = 0.0_f64;
    let mut lower = f64::NEG_INFINITY;
    for (exponent, divisor, upper) in PRICE_TERMS {
        if power <= lower {
            break;
        }
        let term = ((1.0 / divisor) * health.powf(exponent) / cooldown).ceil();
        cost = cost.max(term);
        lower = upper;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cost = cost as u64;
    cost.max(MIN_INJECTION_COST)
}

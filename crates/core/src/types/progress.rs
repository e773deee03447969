//! Sales goal progress and Brazilian real formatting.
//!
//! The dashboard shows two different percentages:
//!
//! - the goal percentage, `sales / goal`, clamped to `0..=100`
//! - the milestone bar, where each of the five milestones (R$ 10k .. R$ 50k)
//!   takes an equal 20% slice and progress is linear inside the slice

use rust_decimal::{Decimal, RoundingStrategy};

/// Goal assigned to a new ambassador (R$ 50.000,00).
pub const DEFAULT_GOAL: Decimal = Decimal::from_parts(50_000, 0, 0, false, 0);

/// Sales milestones shown on the progress bar.
pub const MILESTONES: [Decimal; 5] = [
    Decimal::from_parts(10_000, 0, 0, false, 0),
    Decimal::from_parts(20_000, 0, 0, false, 0),
    Decimal::from_parts(30_000, 0, 0, false, 0),
    Decimal::from_parts(40_000, 0, 0, false, 0),
    Decimal::from_parts(50_000, 0, 0, false, 0),
];

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Progress of one ambassador towards their goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProgress {
    /// `sales / goal` as a percentage in `0..=100`.
    pub percent: Decimal,
    /// Position on the milestone bar, in `0..=100`.
    pub bar_percent: Decimal,
    /// `goal - sales`. Negative once the goal is exceeded.
    pub remaining: Decimal,
    /// Whether each entry of [`MILESTONES`] has been reached.
    pub milestones_reached: [bool; 5],
}

impl GoalProgress {
    /// Compute progress for `total_sales` against `goal`.
    #[must_use]
    pub fn new(total_sales: Decimal, goal: Decimal) -> Self {
        Self {
            percent: goal_percent(total_sales, goal),
            bar_percent: milestone_bar_percent(total_sales, goal),
            remaining: goal.saturating_sub(total_sales),
            milestones_reached: MILESTONES.map(|m| total_sales >= m),
        }
    }
}

/// `sales / goal * 100`, clamped to `0..=100`. Zero when the goal is not positive.
#[must_use]
pub fn goal_percent(total_sales: Decimal, goal: Decimal) -> Decimal {
    if goal <= Decimal::ZERO || total_sales <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if total_sales >= goal {
        return HUNDRED;
    }
    // sales < goal here, so the ratio is below one and cannot overflow
    total_sales
        .checked_div(goal)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .unwrap_or(Decimal::ZERO)
        .clamp(Decimal::ZERO, HUNDRED)
}

/// Position on the milestone bar.
///
/// The bar starts at zero and each milestone adds an equal slice. Inside a
/// slice progress is linear between the two milestones; past the last
/// milestone the next stop is the goal itself.
#[must_use]
pub fn milestone_bar_percent(total_sales: Decimal, goal: Decimal) -> Decimal {
    if total_sales >= goal {
        return HUNDRED;
    }

    let stops: Vec<Decimal> = std::iter::once(Decimal::ZERO).chain(MILESTONES).collect();
    let slice = HUNDRED / Decimal::from(MILESTONES.len());

    let reached = stops.iter().rposition(|&m| total_sales >= m).unwrap_or(0);
    let current = stops.get(reached).copied().unwrap_or(Decimal::ZERO);
    let next = stops.get(reached + 1).copied().unwrap_or(goal);

    let span = next.saturating_sub(current);
    // Fraction of the current slice covered, in `0..1`
    let within = if span > Decimal::ZERO {
        total_sales
            .saturating_sub(current)
            .checked_div(span)
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    let bar = Decimal::from(reached)
        .saturating_mul(slice)
        .saturating_add(within.saturating_mul(slice));
    bar.clamp(Decimal::ZERO, HUNDRED)
}

/// Format an amount the Brazilian way: `1.234.567,89`.
///
/// Always two decimal places, half away from zero.
#[must_use]
pub fn format_brl(value: Decimal) -> String {
    format_grouped(value, 2)
}

/// Format a percentage with one decimal place and a decimal comma: `42,5%`.
#[must_use]
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", format_grouped(value, 1))
}

fn format_grouped(value: Decimal, places: u32) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let plain = format!("{:.*}", places as usize, rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), ""));

    let mut out = String::with_capacity(plain.len() + plain.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    let len = int_part.len();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

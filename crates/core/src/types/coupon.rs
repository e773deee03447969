//! Ambassador coupon codes.
//!
//! A coupon is `ODONTO` + the first eight characters of the ambassador's
//! name (uppercased, whitespace removed) + a two-digit suffix in `10..=99`.
//! `Maria Silva` becomes something like `ODONTOMARIASIL42`.
//!
//! Generation is stateless: the caller passes the coupons already issued for
//! the same prefix. Storage enforces uniqueness again with a UNIQUE
//! constraint, so a race between two generators surfaces as a conflict at
//! write time rather than a duplicate.

use core::fmt;
use std::collections::HashSet;
use std::ops::RangeInclusive;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Fixed tag every coupon starts with.
pub const COUPON_TAG: &str = "ODONTO";

/// Maximum number of name characters kept in the prefix.
pub const NAME_CHARS: usize = 8;

/// Random suffix range.
pub const SUFFIX_RANGE: RangeInclusive<u8> = 10..=99;

/// Random draws attempted before falling back to scanning the free suffixes.
pub const MAX_RANDOM_ATTEMPTS: usize = 16;

/// Errors that can occur when generating a [`Coupon`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponError {
    /// Every suffix for this prefix is already issued.
    #[error("all coupon codes for prefix {prefix} are taken")]
    Exhausted {
        /// The exhausted prefix.
        prefix: String,
    },
}

/// A coupon code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Coupon(String);

impl Coupon {
    /// Wrap a code read back from storage.
    ///
    /// Stored codes are trusted; only [`generate_coupon`] mints new ones.
    #[must_use]
    pub const fn from_stored(code: String) -> Self {
        Self(code)
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Coupon` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Coupon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Coupon {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the suffix-less part of the coupon for `name`.
///
/// Repositories use this to look up the coupons that could collide.
#[must_use]
pub fn coupon_prefix(name: &str) -> String {
    let name_part: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .take(NAME_CHARS)
        .collect();
    format!("{COUPON_TAG}{name_part}")
}

/// Generate a coupon for `name` that is not in `existing` using the thread RNG.
///
/// # Errors
///
/// Returns [`CouponError::Exhausted`] if all 90 suffixes are taken.
pub fn generate_coupon(name: &str, existing: &HashSet<String>) -> Result<Coupon, CouponError> {
    generate_coupon_with(name, existing, &mut rand::rng())
}

/// Generate a coupon for `name` that is not in `existing`.
///
/// Draws random suffixes up to [`MAX_RANDOM_ATTEMPTS`] times, then picks
/// uniformly among whatever suffixes are still free.
///
/// # Errors
///
/// Returns [`CouponError::Exhausted`] if all 90 suffixes are taken.
pub fn generate_coupon_with<R: Rng + ?Sized>(
    name: &str,
    existing: &HashSet<String>,
    rng: &mut R,
) -> Result<Coupon, CouponError> {
    let prefix = coupon_prefix(name);

    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let candidate = format!("{prefix}{}", rng.random_range(SUFFIX_RANGE));
        if !existing.contains(&candidate) {
            return Ok(Coupon(candidate));
        }
    }

    let free: Vec<String> = SUFFIX_RANGE
        .map(|suffix| format!("{prefix}{suffix}"))
        .filter(|candidate| !existing.contains(candidate))
        .collect();

    free.choose(rng)
        .cloned()
        .map(Coupon)
        .ok_or(CouponError::Exhausted { prefix })
}

//! Shared primitive types used across the dashboard core.

/// A currency amount in US dollars. Fractional cents are kept.
pub type Currency = f64;

/// A projection month index. Month 0 is "now".
pub type Month = u32;

/// A percentage expressed on the 0..=100 scale (not 0..=1).
pub type Percent = f64;

/// Round half-up (`floor(x + 0.5)`), matching how the dashboard
/// tables have always displayed rounded figures.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

//! Tier engine
//!
//! A pure projection from a point balance to a membership tier. Tiers are
//! a static, ordered list of bands, each with a name, an inclusive lower
//! point threshold, and a list of benefits. A user's tier is the highest
//! band whose threshold does not exceed the balance; it is recomputed on
//! every read and never stored.
//!
//! The thresholds live in a single [`TierSchedule`] configuration table so
//! call sites cannot drift apart on duplicated constants.

use serde::Serialize;

/// A single tier band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierBand {
    /// Display name of the band
    pub name: String,

    /// Inclusive lower point bound
    pub threshold: u64,

    /// Discount granted at this band, in percent
    pub discount_percent: u8,

    /// Benefit descriptions, including the discount
    pub benefits: Vec<String>,
}

impl TierBand {
    /// Create a band with the given name, threshold, and discount
    pub fn new(name: &str, threshold: u64, discount_percent: u8, benefits: &[&str]) -> Self {
        TierBand {
            name: name.to_string(),
            threshold,
            discount_percent,
            benefits: benefits.iter().map(|b| b.to_string()).collect(),
        }
    }
}

/// Ordered tier configuration table
///
/// Bands are kept sorted ascending by threshold; the first band must start
/// at zero so every balance maps to some tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierSchedule {
    bands: Vec<TierBand>,
}

impl Default for TierSchedule {
    /// The canonical schedule: Silver (0+), Gold (1000+), Platinum (5000+)
    fn default() -> Self {
        TierSchedule::new(vec![
            TierBand::new("Silver", 0, 5, &["5% discount on bookings"]),
            TierBand::new("Gold", 1000, 10, &["10% discount on bookings", "late checkout"]),
            TierBand::new(
                "Platinum",
                5000,
                15,
                &["15% discount on bookings", "room upgrade when available"],
            ),
        ])
    }
}

impl TierSchedule {
    /// Create a schedule from a list of bands
    ///
    /// Bands are sorted ascending by threshold. The lowest band must have
    /// a threshold of zero.
    pub fn new(mut bands: Vec<TierBand>) -> Self {
        bands.sort_by_key(|band| band.threshold);
        debug_assert!(
            bands.first().map(|band| band.threshold) == Some(0),
            "lowest tier band must start at zero"
        );
        TierSchedule { bands }
    }

    /// All bands, ascending by threshold
    pub fn bands(&self) -> &[TierBand] {
        &self.bands
    }

    /// The highest band whose threshold does not exceed `points`
    pub fn tier_for(&self, points: u64) -> &TierBand {
        self.bands
            .iter()
            .rev()
            .find(|band| band.threshold <= points)
            .unwrap_or(&self.bands[0])
    }

    /// The band immediately above the current one, if any
    pub fn next_tier(&self, points: u64) -> Option<&TierBand> {
        self.bands.iter().find(|band| band.threshold > points)
    }

    /// Progress toward the next band as a percentage in `[0, 100]`
    ///
    /// Returns 100 when there is no next band.
    pub fn progress_to_next(&self, points: u64) -> f64 {
        let current = self.tier_for(points);
        match self.next_tier(points) {
            Some(next) => {
                let span = (next.threshold - current.threshold) as f64;
                let into = (points - current.threshold) as f64;
                (into / span * 100.0).clamp(0.0, 100.0)
            }
            None => 100.0,
        }
    }

    /// Bundle tier, next tier, and progress for reporting
    pub fn status_for(&self, points: u64) -> TierStatus {
        let current = self.tier_for(points);
        let next = self.next_tier(points);
        TierStatus {
            tier: current.name.clone(),
            discount_percent: current.discount_percent,
            next_tier: next.map(|band| band.name.clone()),
            points_to_next: next.map(|band| band.threshold - points).unwrap_or(0),
            progress: self.progress_to_next(points),
        }
    }
}

/// Snapshot of a user's tier standing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStatus {
    /// Current tier name
    pub tier: String,

    /// Discount at the current tier, in percent
    pub discount_percent: u8,

    /// Name of the next tier, or None at the top band
    pub next_tier: Option<String>,

    /// Points still needed to reach the next tier (0 at the top band)
    pub points_to_next: u64,

    /// Progress toward the next tier in `[0, 100]`
    pub progress: f64,
}

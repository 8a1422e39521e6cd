//! Donut-chart projection for ranked records
//!
//! The dashboard receives venues already ordered by popularity but without a
//! numeric weight, so each rank gets a decaying weight instead.

use crate::record::Record;
use std::f64::consts::PI;

/// Segment colors, cycled by index
pub const PALETTE: [&str; 5] = ["#22D3EE", "#06B6D4", "#475569", "#CBD5E1", "#4ADE80"];

/// Ring radius
pub const RADIUS: f64 = 45.0;

/// Ring circumference, `2πr`
pub const CIRCUMFERENCE: f64 = 2.0 * PI * RADIUS;

/// One ring segment
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSegment {
    /// Index of the record this segment stands for
    pub index: usize,
    /// Rank weight before normalization
    pub weight: u32,
    /// Rounded share of the ring
    pub percentage: u32,
    /// Stroke color
    pub color: &'static str,
    /// Start angle in degrees; 12 o'clock is -90
    pub rotation: f64,
    /// Arc length drawn
    pub dash: f64,
    /// Arc length left blank, `C - dash`
    pub gap: f64,
}

impl ChartSegment {
    /// `stroke-dasharray` value: the dash followed by the full circumference
    #[must_use]
    pub fn dash_array(&self) -> String {
        format!("{} {}", self.dash, CIRCUMFERENCE)
    }
}

/// Rank weight: 40 for the first record, 7 less per rank, never below 5
#[must_use]
pub fn rank_weight(index: usize) -> u32 {
    let decay = u32::try_from(index).unwrap_or(u32::MAX).saturating_mul(7);
    40u32.saturating_sub(decay).max(5)
}

/// Segments for `count` ranked records
///
/// Percentages are rounded independently, so their sum may drift from 100.
#[must_use]
pub fn project_segments(count: usize) -> Vec<ChartSegment> {
    if count == 0 {
        return Vec::new();
    }

    let weights: Vec<u32> = (0..count).map(rank_weight).collect();
    let total: f64 = weights.iter().map(|w| f64::from(*w)).sum();

    let mut cumulative = 0u32;
    weights
        .into_iter()
        .enumerate()
        .map(|(index, weight)| {
            let percentage = percentage_of(weight, total);
            let rotation = f64::from(cumulative) / 100.0 * 360.0 - 90.0;
            cumulative += percentage;

            let dash = f64::from(percentage) / 100.0 * CIRCUMFERENCE;
            ChartSegment {
                index,
                weight,
                percentage,
                color: PALETTE[index % PALETTE.len()],
                rotation,
                dash,
                gap: CIRCUMFERENCE - dash,
            }
        })
        .collect()
}

/// Segments for `records`, zipped by [`ChartSegment::index`]
#[must_use]
pub fn project_segments_for<T>(records: &[T]) -> Vec<ChartSegment> {
    project_segments(records.len())
}

/// Legend label for a venue segment
///
/// Prefers the translated name, then the plain one, then `"Unknown Venue"`.
#[must_use]
pub fn venue_label(venue: &Record) -> &str {
    venue
        .text("translations.name")
        .or_else(|| venue.text("name"))
        .unwrap_or("Unknown Venue")
}

// Shares lie in 0..=100, so the cast is lossless
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage_of(weight: u32, total: f64) -> u32 {
    (100.0 * f64::from(weight) / total).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_decay_to_a_floor() {
        let weights: Vec<u32> = (0..8).map(rank_weight).collect();
        assert_eq!(weights, vec![40, 33, 26, 19, 12, 5, 5, 5]);
    }

    #[test]
    fn empty_input_gives_no_segments() {
        assert!(project_segments(0).is_empty());
        assert!(project_segments_for::<u8>(&[]).is_empty());
    }

    #[test]
    fn single_record_fills_the_ring() {
        let segments = project_segments(1);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].percentage, 100);
        assert!((segments[0].rotation + 90.0).abs() < f64::EPSILON);
        assert!((segments[0].dash - CIRCUMFERENCE).abs() < 1e-9);
        assert!(segments[0].gap.abs() < 1e-9);
    }

    #[test]
    fn five_venues_match_the_dashboard() {
        // 40 + 33 + 26 + 19 + 12 = 130
        let segments = project_segments(5);
        let percentages: Vec<u32> = segments.iter().map(|s| s.percentage).collect();
        assert_eq!(percentages, vec![31, 25, 20, 15, 9]);

        let rotations: Vec<f64> = segments.iter().map(|s| s.rotation).collect();
        let expected = [-90.0, 21.6, 111.6, 183.6, 237.6];
        for (got, want) in rotations.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }

        assert_eq!(segments[0].color, "#22D3EE");
        assert_eq!(segments[4].color, "#4ADE80");
    }

    #[test]
    fn three_venues_stay_within_one_point_of_full() {
        // 40 + 33 + 26 = 99
        let segments = project_segments(3);

        let weights: Vec<u32> = segments.iter().map(|s| s.weight).collect();
        assert_eq!(weights, vec![40, 33, 26]);

        let percentages: Vec<u32> = segments.iter().map(|s| s.percentage).collect();
        assert_eq!(percentages, vec![40, 33, 26]);
        assert!(percentages.iter().sum::<u32>().abs_diff(100) <= 1);

        let rotations: Vec<f64> = segments.iter().map(|s| s.rotation).collect();
        let expected = [-90.0, 54.0, 172.8];
        for (got, want) in rotations.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
    }

    #[test]
    fn palette_cycles() {
        let segments = project_segments(7);
        assert_eq!(segments[5].color, PALETTE[0]);
        assert_eq!(segments[6].color, PALETTE[1]);
    }

    #[test]
    fn dash_array_ends_with_circumference() {
        let segment = &project_segments(2)[0];
        assert_eq!(
            segment.dash_array(),
            format!("{} {}", segment.dash, CIRCUMFERENCE)
        );
    }

    #[test]
    fn venue_label_falls_back_to_unknown_venue() {
        use serde_json::json;

        let translated = Record::new(1)
            .with("translations", json!({"name": "Al Wasl"}))
            .with("name", "al-wasl");
        assert_eq!(venue_label(&translated), "Al Wasl");
        assert_eq!(venue_label(&Record::new(2).with("name", "Zabeel")), "Zabeel");
        assert_eq!(venue_label(&Record::new(3)), "Unknown Venue");
    }
}

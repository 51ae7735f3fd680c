//! Synthetic waveform synthesis.
//!
//! No audio is available, so the decorative waveform is derived entirely from
//! track metadata: each sub-item claims a bar span proportional to its share
//! of the total duration, shaped by an intro/build/peak/outro envelope and a
//! deterministic per-bar jitter. Two calls with the same input produce
//! byte-identical output.

use crate::catalog::model::SubItem;
use crate::foundation::math::seeded_signed;

/// Lower clamp for every bar value.
pub const BAR_MIN: f64 = 0.2;
/// Upper clamp for every bar value.
pub const BAR_MAX: f64 = 1.0;
/// Duration assumed for sub-items that carry none, in milliseconds.
pub const DEFAULT_ITEM_DURATION_MS: u64 = 210_000;

/// Default bar count used by the poster composer.
pub const DEFAULT_BAR_COUNT: usize = 120;

fn item_duration_ms(item: &SubItem) -> u64 {
    item.duration_ms.unwrap_or(DEFAULT_ITEM_DURATION_MS)
}

/// Bars allocated to each sub-item: `round(share × target)` with a floor of
/// one bar per item. The sum may differ slightly from `target`; `generate`
/// pads or truncates the final sequence.
pub fn allocate_bars(items: &[SubItem], target_bars: usize) -> Vec<usize> {
    if items.is_empty() || target_bars == 0 {
        return Vec::new();
    }
    let total: u64 = items.iter().map(item_duration_ms).sum();
    items
        .iter()
        .map(|item| {
            let share = if total == 0 {
                1.0 / items.len() as f64
            } else {
                item_duration_ms(item) as f64 / total as f64
            };
            ((share * target_bars as f64).round() as usize).max(1)
        })
        .collect()
}

/// Generate exactly `target_bars` normalized bar heights, each clamped to
/// `[BAR_MIN, BAR_MAX]`, for the given sub-item list.
///
/// Empty input (or a zero target) yields an empty sequence.
pub fn generate(items: &[SubItem], target_bars: usize) -> Vec<f64> {
    if items.is_empty() || target_bars == 0 {
        return Vec::new();
    }

    let allocation = allocate_bars(items, target_bars);
    let mut bars = Vec::with_capacity(target_bars);

    'items: for (item_idx, (item, &item_bars)) in items.iter().zip(&allocation).enumerate() {
        let duration = item_duration_ms(item);
        for bar_idx in 0..item_bars {
            if bars.len() >= target_bars {
                break 'items;
            }
            let progress = bar_idx as f64 / item_bars as f64;
            let base = 0.4 + (item_idx as f64 * 0.8).sin() * 0.2;
            let envelope = envelope_at(progress);
            let seed = duration
                .wrapping_add(item_idx as u64 * 1234)
                .wrapping_add(bar_idx as u64 * 567);
            let jitter = seeded_signed(seed) * 0.15 + seeded_signed(seed.rotate_left(17)) * 0.1;
            let shimmer = (bars.len() as f64 * 0.5).sin() * 0.05;
            bars.push((base + envelope + jitter + shimmer).clamp(BAR_MIN, BAR_MAX));
        }
    }

    // Fade-out padding when rounding under-allocated.
    while bars.len() < target_bars {
        let fade = 0.3 * (1.0 - (bars.len().saturating_sub(items.len())) as f64 / 10.0);
        bars.push(fade.clamp(BAR_MIN, BAR_MAX));
    }
    bars.truncate(target_bars);
    bars
}

/// Intro / build / peak / outro amplitude contribution for an intra-item
/// position in `[0, 1)`.
fn envelope_at(progress: f64) -> f64 {
    if progress < 0.15 {
        progress / 0.15 * 0.3
    } else if progress < 0.4 {
        0.3 + (progress - 0.15) / 0.25 * 0.4
    } else if progress < 0.7 {
        0.7 + ((progress - 0.4) * 10.0).sin() * 0.3
    } else {
        0.7 * (1.0 - (progress - 0.7) / 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(number: u32, duration_ms: u64) -> SubItem {
        SubItem {
            number,
            title: format!("Track {number}"),
            duration_ms: Some(duration_ms),
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(generate(&[], 120).is_empty());
        assert!(generate(&[item(1, 1000)], 0).is_empty());
    }

    #[test]
    fn output_is_deterministic_and_exact_length() {
        let items: Vec<_> = (1..=9).map(|n| item(n, 120_000 + n as u64 * 13_000)).collect();
        let a = generate(&items, 120);
        let b = generate(&items, 120);
        assert_eq!(a, b);
        assert_eq!(a.len(), 120);
    }

    #[test]
    fn every_value_is_clamped() {
        let items: Vec<_> = (1..=30).map(|n| item(n, 90_000 + n as u64 * 7_777)).collect();
        for target in [1, 7, 120, 400] {
            for v in generate(&items, target) {
                assert!((BAR_MIN..=BAR_MAX).contains(&v), "{v} out of range");
            }
        }
    }

    #[test]
    fn allocation_is_proportional_with_floor() {
        // 3:1 duration split over 40 bars -> 30 and 10.
        let items = vec![item(1, 300_000), item(2, 100_000)];
        assert_eq!(allocate_bars(&items, 40), vec![30, 10]);

        // A vanishingly short item still gets one bar.
        let items = vec![item(1, 600_000), item(2, 1_000)];
        let alloc = allocate_bars(&items, 50);
        assert_eq!(alloc[1], 1);

        // Share p rounds to round(p * target).
        let items = vec![item(1, 125_000), item(2, 375_000), item(3, 500_000)];
        assert_eq!(allocate_bars(&items, 80), vec![10, 30, 40]);
    }

    #[test]
    fn zero_durations_split_evenly() {
        let items = vec![
            SubItem {
                number: 1,
                title: "A".into(),
                duration_ms: Some(0),
            },
            SubItem {
                number: 2,
                title: "B".into(),
                duration_ms: Some(0),
            },
        ];
        assert_eq!(allocate_bars(&items, 10), vec![5, 5]);
        assert_eq!(generate(&items, 10).len(), 10);
    }

    #[test]
    fn regenerates_when_the_list_changes() {
        let a = generate(&[item(1, 200_000), item(2, 180_000)], 60);
        let b = generate(&[item(1, 200_000), item(2, 181_000)], 60);
        assert_ne!(a, b);
    }
}

//! Catalog records and their display formatting.

use serde::{Deserialize, Serialize};

/// Whether an item is a music release or a film.
///
/// The poster treats both identically; the kind only changes which external
/// lookup produced the record and how contributors are labeled upstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A music release; sub-items are tracks.
    #[default]
    Album,
    /// A film; sub-items are billed cast members.
    Movie,
}

/// One ordered entry of the poster's list region: a track or a cast member.
///
/// List order is stable and `number` drives the on-poster numbering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubItem {
    /// Display index (1-based track number or billing position).
    pub number: u32,
    /// Display title (track name or cast member name).
    pub title: String,
    /// Duration in milliseconds, when the catalog provides one.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// A catalog record, as consumed by the poster pipeline.
///
/// External lookups are mapped into this shape once; everything downstream is
/// read-only over it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogItem {
    /// Provider identity.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Record kind.
    pub kind: ItemKind,
    /// Contributor names (artists, or director plus leads).
    pub contributors: Vec<String>,
    /// Release date, ISO `YYYY-MM-DD` (or a bare year for old records).
    pub release_date: Option<String>,
    /// Ordered sub-items (tracks or cast).
    pub sub_items: Vec<SubItem>,
    /// Artwork image location (http(s) URL or a local path).
    pub artwork_url: Option<String>,
    /// Label / copyright / tagline line shown in small print.
    pub descriptor: Option<String>,
}

impl CatalogItem {
    /// Contributors joined for display (`"A, B"`).
    pub fn contributors_line(&self) -> String {
        self.contributors.join(", ")
    }

    /// Total duration of all sub-items carrying one, in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.sub_items
            .iter()
            .filter_map(|s| s.duration_ms)
            .sum()
    }
}

/// Format a duration as `M:SS` (track listing style).
pub fn format_duration_ms(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Format a total running time as `"54 MIN 12 SEC"`, or `"1 HR 14 MIN"` once
/// it passes the hour.
pub fn format_total_duration(ms: u64) -> String {
    let total_minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    if total_minutes >= 60 {
        format!("{} HR {} MIN", total_minutes / 60, total_minutes % 60)
    } else {
        format!("{total_minutes} MIN {seconds} SEC")
    }
}

const MONTHS: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// Format an ISO release date as `"15 JANUARY 2024"`.
///
/// Partial dates degrade gracefully: `"2024-01"` becomes `"JANUARY 2024"`,
/// a bare `"1994"` stays as-is. Unparseable input is returned unchanged.
pub fn format_release_date(date: &str) -> String {
    use chrono::Datelike;

    if let Ok(d) = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        let month = MONTHS[(d.month0()) as usize];
        return format!("{} {} {}", d.day(), month, d.year());
    }

    let mut parts = date.splitn(2, '-');
    let year = parts.next().unwrap_or(date);
    if let Some(month_str) = parts.next()
        && let Ok(m) = month_str.parse::<usize>()
        && (1..=12).contains(&m)
    {
        return format!("{} {}", MONTHS[m - 1], year);
    }
    date.to_owned()
}

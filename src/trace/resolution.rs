//! Units used to render elapsed times.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unit of every elapsed time in a report.
///
/// The `Display` form is the unit string printed in reports (`ns`, `us`, `ms`,
/// `sec`); parsing also accepts the long names.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Resolution {
    #[strum(to_string = "ns", serialize = "nanoseconds")]
    #[serde(rename = "ns", alias = "nanoseconds")]
    #[value(name = "ns", alias = "nanoseconds")]
    Nanoseconds,
    #[strum(to_string = "us", serialize = "microseconds")]
    #[serde(rename = "us", alias = "microseconds")]
    #[value(name = "us", alias = "microseconds")]
    Microseconds,
    #[default]
    #[strum(to_string = "ms", serialize = "milliseconds")]
    #[serde(rename = "ms", alias = "milliseconds")]
    #[value(name = "ms", alias = "milliseconds")]
    Milliseconds,
    #[strum(to_string = "sec", serialize = "seconds", serialize = "s")]
    #[serde(rename = "sec", alias = "seconds", alias = "s")]
    #[value(name = "sec", alias = "seconds")]
    Seconds,
}

impl Resolution {
    /// Unit string as printed in reports.
    pub fn unit(self) -> &'static str {
        self.into()
    }

    /// Convert a normalized duration into whole units, truncating the remainder.
    ///
    /// Whole seconds are scaled and the sub-second part is divided down, so a
    /// resolution of whole seconds drops everything below one second.
    pub fn convert(self, elapsed: Duration) -> u64 {
        let secs = elapsed.as_secs();
        let nanos = u64::from(elapsed.subsec_nanos());

        match self {
            Resolution::Nanoseconds => secs.saturating_mul(1_000_000_000).saturating_add(nanos),
            Resolution::Microseconds => secs.saturating_mul(1_000_000).saturating_add(nanos / 1_000),
            Resolution::Milliseconds => secs.saturating_mul(1_000).saturating_add(nanos / 1_000_000),
            Resolution::Seconds => secs + nanos / 1_000_000_000,
        }
    }
}

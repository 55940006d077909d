//! Small descriptive-statistics helpers for observing evolution runs.

pub use self::descriptive::DescriptiveStats;

pub mod descriptive;

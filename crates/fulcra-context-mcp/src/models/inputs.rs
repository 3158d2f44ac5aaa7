//! Input models for MCP tool parameters.
//!
//! Each input knows how to render itself as data API query parameters.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Deserialize;

use super::lenient;

/// Default look-around window for location lookups, in seconds (4 hours).
pub const DEFAULT_LOCATION_WINDOW: u64 = 14_400;

fn default_location_window() -> u64 {
    DEFAULT_LOCATION_WINDOW
}

fn rfc3339(time: &DateTime<FixedOffset>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Accumulates query parameters, skipping unset optionals.
#[derive(Debug, Default)]
struct Query(Vec<(String, String)>);

impl Query {
    fn push(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    fn push_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    fn push_all<T: ToString>(mut self, key: &str, values: Option<&[T]>) -> Self {
        for v in values.unwrap_or_default() {
            self.0.push((key.to_string(), v.to_string()));
        }
        self
    }

    fn time(self, key: &str, time: &DateTime<FixedOffset>) -> Self {
        self.push(key, rfc3339(time))
    }
}

/// Input for `get_metric_time_series`.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricTimeSeriesInput {
    /// Metric name from the metrics catalog (e.g. "StepCount").
    pub metric_name: String,

    /// Start of the period.
    #[serde(deserialize_with = "lenient::timestamp")]
    pub start_time: DateTime<FixedOffset>,

    /// End of the period.
    #[serde(deserialize_with = "lenient::timestamp")]
    pub end_time: DateTime<FixedOffset>,

    /// Seconds per sample.
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub sample_rate: Option<f64>,

    /// Replace missing samples with zero.
    #[serde(default, deserialize_with = "lenient::option_bool")]
    pub replace_nulls: Option<bool>,

    /// Aggregations per sample (e.g. ["max", "min", "delta"]).
    #[serde(default, deserialize_with = "lenient::option_vec")]
    pub calculations: Option<Vec<String>>,
}

impl MetricTimeSeriesInput {
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        Query::default()
            .push("metric", &self.metric_name)
            .time("start_time", &self.start_time)
            .time("end_time", &self.end_time)
            .push_opt("sample_rate", self.sample_rate)
            .push_opt("replace_nulls", self.replace_nulls)
            .push_all("calculations", self.calculations.as_deref())
            .0
    }
}

/// Input for `get_workouts`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutsInput {
    #[serde(deserialize_with = "lenient::timestamp")]
    pub start_time: DateTime<FixedOffset>,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub end_time: DateTime<FixedOffset>,
}

impl WorkoutsInput {
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        Query::default().time("start_time", &self.start_time).time("end_time", &self.end_time).0
    }
}

/// Input for `get_sleep_cycles`.
#[derive(Debug, Clone, Deserialize)]
pub struct SleepCyclesInput {
    #[serde(deserialize_with = "lenient::timestamp")]
    pub start_time: DateTime<FixedOffset>,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub end_time: DateTime<FixedOffset>,

    /// Minimum gap that separates two cycles, as an ISO 8601 duration or seconds.
    #[serde(default)]
    pub cycle_gap: Option<String>,

    /// Sleep stage codes to include.
    #[serde(default, deserialize_with = "lenient::option_vec")]
    pub stages: Option<Vec<i64>>,

    /// Sleep stage codes that count as gaps between cycles.
    #[serde(default, deserialize_with = "lenient::option_vec")]
    pub gap_stages: Option<Vec<i64>>,

    /// Clip cycles that straddle the range boundaries.
    #[serde(default, deserialize_with = "lenient::option_bool")]
    pub clip_to_range: Option<bool>,
}

impl SleepCyclesInput {
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        Query::default()
            .time("start_time", &self.start_time)
            .time("end_time", &self.end_time)
            .push_opt("cycle_gap", self.cycle_gap.as_deref())
            .push_all("stages", self.stages.as_deref())
            .push_all("gap_stages", self.gap_stages.as_deref())
            .push_opt("clip_to_range", self.clip_to_range)
            .0
    }
}

/// Input for `get_location_at_time`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationAtTimeInput {
    /// Point in time to look up.
    #[serde(deserialize_with = "lenient::timestamp")]
    pub time: DateTime<FixedOffset>,

    /// Seconds around `time` to search for a sample.
    #[serde(default = "default_location_window", deserialize_with = "lenient::integer")]
    pub window_size: u64,

    /// Also consider samples after `time`.
    #[serde(default, deserialize_with = "lenient::option_bool")]
    pub include_after: Option<bool>,

    /// Resolve coordinates to an address.
    #[serde(default, deserialize_with = "lenient::option_bool")]
    pub reverse_geocode: Option<bool>,
}

impl LocationAtTimeInput {
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        Query::default()
            .time("time", &self.time)
            .push("window_size", self.window_size)
            .push_opt("include_after", self.include_after)
            .push_opt("reverse_geocode", self.reverse_geocode)
            .0
    }
}

/// Input for `get_location_time_series`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationTimeSeriesInput {
    #[serde(deserialize_with = "lenient::timestamp")]
    pub start_time: DateTime<FixedOffset>,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub end_time: DateTime<FixedOffset>,

    /// Minimum movement, in meters, before a new sample is reported.
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub change_meters: Option<f64>,

    /// Seconds per sample.
    #[serde(default, deserialize_with = "lenient::option_u64")]
    pub sample_rate: Option<u64>,

    /// Seconds before `start_time` to search for the initial location.
    #[serde(default = "default_location_window", deserialize_with = "lenient::integer")]
    pub look_back: u64,

    /// Resolve coordinates to addresses.
    #[serde(default, deserialize_with = "lenient::option_bool")]
    pub reverse_geocode: Option<bool>,
}

impl LocationTimeSeriesInput {
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        Query::default()
            .time("start_time", &self.start_time)
            .time("end_time", &self.end_time)
            .push_opt("change_meters", self.change_meters)
            .push_opt("sample_rate", self.sample_rate)
            .push("look_back", self.look_back)
            .push_opt("reverse_geocode", self.reverse_geocode)
            .0
    }
}

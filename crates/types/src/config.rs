use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::{BlockKey, ClockTime, DayOfWeek, Instance, RoomId, TimeWindow};

fn default_days() -> Vec<DayOfWeek> {
    DayOfWeek::WEEKDAYS.to_vec()
}
fn default_day_start() -> ClockTime {
    ClockTime::hm(8, 0)
}
fn default_day_end() -> ClockTime {
    ClockTime::hm(17, 0)
}
fn default_slot_minutes() -> u16 {
    30
}
fn default_excluded() -> Vec<TimeWindow> {
    vec![TimeWindow::new(ClockTime::hm(12, 0), ClockTime::hm(13, 0))]
}
fn default_weekend_end() -> Option<ClockTime> {
    Some(ClockTime::hm(12, 0))
}
fn default_prime() -> TimeWindow {
    TimeWindow::new(ClockTime::hm(9, 0), ClockTime::hm(15, 0))
}

/// Institutional calendar rules the time domain is generated from.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeDomainConfig {
    #[serde(default = "default_days")]
    pub days: Vec<DayOfWeek>,
    #[serde(default = "default_day_start")]
    pub day_start: ClockTime,
    #[serde(default = "default_day_end")]
    pub day_end: ClockTime,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u16,
    /// Windows no Class may occupy (the lunch break).
    #[serde(default = "default_excluded")]
    pub excluded: Vec<TimeWindow>,
    /// Saturday/Sunday close early; `None` keeps the full day.
    #[serde(default = "default_weekend_end")]
    pub weekend_end: Option<ClockTime>,
    /// Favourable hours whose distribution across programs is balanced.
    #[serde(default = "default_prime")]
    pub prime: TimeWindow,
}

impl Default for TimeDomainConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            day_start: default_day_start(),
            day_end: default_day_end(),
            slot_minutes: default_slot_minutes(),
            excluded: default_excluded(),
            weekend_end: default_weekend_end(),
            prime: default_prime(),
        }
    }
}

/// Weights of `Z = α·Utilization − β·Conflicts − γ·IdleTime + δ·Fairness`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Weights {
    pub utilization: f64,
    pub conflicts: f64,
    pub idle_time: f64,
    pub fairness: f64,
}

impl Weights {
    pub const NORMALIZATION: f64 = 1.0;

    pub fn sum(&self) -> f64 {
        self.utilization + self.conflicts + self.idle_time + self.fairness
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            utilization: 0.4,
            conflicts: 0.3,
            idle_time: 0.2,
            fairness: 0.1,
        }
    }
}

fn default_contiguity_penalty() -> f64 {
    0.05
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveConfig {
    #[serde(default)]
    pub weights: Weights,
    #[serde(default = "default_contiguity_penalty")]
    pub contiguity_penalty: f64,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            contiguity_penalty: default_contiguity_penalty(),
        }
    }
}

fn default_time_limit() -> u64 {
    300
}
fn default_gap() -> f64 {
    0.01
}

/// Wall-clock and optimality-gap budget handed to the backend per sub-problem.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolveBudget {
    #[serde(default = "default_time_limit")]
    pub time_limit_sec: u64,
    #[serde(default = "default_gap")]
    pub gap: f64,
}

impl SolveBudget {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_sec)
    }
}

impl Default for SolveBudget {
    fn default() -> Self {
        Self {
            time_limit_sec: default_time_limit(),
            gap: default_gap(),
        }
    }
}

/// Partition key for sequential decomposition; sub-problems run in ascending key order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ScopeKey {
    #[default]
    YearLevel,
    Program,
    ProgramYear,
    /// Programs with the most blocks first; ties by program id.
    ProgramBySize,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Strategy {
    Global,
    Sequential {
        #[serde(default)]
        key: ScopeKey,
        /// Share of the lab demand of later scopes that earlier scopes may
        /// not touch, in `[0, 1]`. Zero disables the reserve.
        #[serde(default, rename = "reserveRatio")]
        reserve_ratio: f64,
    },
}

impl Strategy {
    pub fn sequential(key: ScopeKey) -> Self {
        Strategy::Sequential { key, reserve_ratio: 0.0 }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::sequential(ScopeKey::YearLevel)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ModelMode {
    /// Every Class must be fully scheduled; blocks never clash.
    #[default]
    Strict,
    /// Classes may stay unscheduled and block clashes become penalized slack.
    Relaxed,
}

fn default_practicum_hours() -> f64 {
    2.0
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassRules {
    /// Weekly check-in scheduled for practicum courses, regardless of lab hours.
    #[serde(default = "default_practicum_hours")]
    pub practicum_hours: f64,
    /// Upper bound on hours a regular Class may spend on one day.
    #[serde(default)]
    pub max_daily_hours: Option<f64>,
    /// Offer courses with both lecture and lab hours as two Classes: the
    /// lecture in a non-lab room and the lab in the course's room category.
    #[serde(default)]
    pub split_lecture_lab: bool,
}

impl Default for ClassRules {
    fn default() -> Self {
        Self {
            practicum_hours: default_practicum_hours(),
            max_daily_hours: None,
            split_lecture_lab: false,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    #[serde(default)]
    pub time_domain: TimeDomainConfig,
    #[serde(default)]
    pub objective: ObjectiveConfig,
    #[serde(default)]
    pub budget: SolveBudget,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub mode: ModelMode,
    #[serde(default)]
    pub rules: ClassRules,
    /// Room time already taken outside this run, e.g. a published schedule.
    #[serde(default)]
    pub fixed_occupancy: Vec<FixedBooking>,
}

/// A room held on one day between `start` and `end`. Every slot overlapping
/// the range is unavailable; when `block` is set the block is busy too.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct FixedBooking {
    pub room: RoomId,
    pub day: DayOfWeek,
    pub start: ClockTime,
    pub end: ClockTime,
    #[serde(default)]
    pub block: Option<BlockKey>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct RunRequest {
    pub instance: Instance,
    #[serde(default)]
    pub config: RunConfig,
}

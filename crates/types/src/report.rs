use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::{BlockKey, ClassComponent, ClockTime, CourseCode, DayOfWeek, RoomCategory, RoomId, SlotId, Strategy};

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBalance {
    pub category: RoomCategory,
    pub required_hours: f64,
    pub available_hours: f64,
    /// Negative when demand exceeds supply.
    pub surplus_hours: f64,
    /// Demand over supply; absent when the category has no free room-hours.
    #[serde(default)]
    pub utilization: Option<f64>,
}

impl CategoryBalance {
    pub fn is_deficit(&self) -> bool {
        self.surplus_hours < 0.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockLoad {
    pub block: BlockKey,
    pub required_hours: f64,
    pub available_hours: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum FeasibilityVerdict {
    LikelyFeasible,
    LikelyInfeasible,
}

/// Advisory demand/supply comparison for one scope. A necessary condition only.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityReport {
    pub scope: String,
    pub verdict: FeasibilityVerdict,
    pub categories: Vec<CategoryBalance>,
    #[serde(default)]
    pub overloaded_blocks: Vec<BlockLoad>,
    /// Categories whose demand exceeds the high-utilization threshold of supply.
    #[serde(default)]
    pub high_utilization: Vec<RoomCategory>,
}

impl FeasibilityReport {
    pub fn deficits(&self) -> impl Iterator<Item = &CategoryBalance> {
        self.categories.iter().filter(|c| c.is_deficit())
    }

    pub fn is_likely_feasible(&self) -> bool {
        self.verdict == FeasibilityVerdict::LikelyFeasible
    }
}

/// Outcome class of one backend call, without the assignment payload.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum VerdictKind {
    Optimal,
    FeasibleWithinGap,
    Infeasible,
    TimedOutNoIncumbent,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ControllerState {
    Idle,
    CheckingFeasibility,
    BuildingSubproblem,
    Solving,
    MergingResult,
    Done,
    Aborted,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum SubproblemStatus {
    Solved,
    Failed,
    /// Never attempted because cancellation was honored first.
    Skipped,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubproblemReport {
    pub index: usize,
    pub scope: String,
    pub classes: usize,
    pub status: SubproblemStatus,
    #[serde(default)]
    pub feasibility: Option<FeasibilityReport>,
    #[serde(default)]
    pub verdict: Option<VerdictKind>,
    #[serde(default)]
    pub objective: Option<f64>,
    #[serde(default)]
    pub gap: Option<f64>,
    pub variables: usize,
    pub constraints: usize,
    pub elapsed_ms: u64,
    /// Lab (room, slot) pairs withheld from this scope for later ones.
    #[serde(default)]
    pub reserved_pairs: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
pub struct DayRange {
    pub day: DayOfWeek,
    pub start: ClockTime,
    pub end: ClockTime,
}

/// One Class as it appears in a published timetable.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub block: BlockKey,
    pub course_code: CourseCode,
    #[serde(default)]
    pub component: ClassComponent,
    pub title: String,
    pub room: RoomId,
    pub slots: Vec<SlotId>,
    /// Day codes in week order, e.g. `"TTH"`.
    pub day_pattern: String,
    /// `"08:00-09:30"` when every day shares one contiguous range.
    #[serde(default)]
    pub time_range: Option<String>,
    pub ranges: Vec<DayRange>,
    pub lecture_hours: f64,
    pub lab_hours: f64,
    pub scheduled_hours: f64,
    pub units: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct BlockSchedule {
    pub block: BlockKey,
    pub entries: Vec<ScheduleEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnscheduledClass {
    pub block: BlockKey,
    pub course_code: CourseCode,
    #[serde(default)]
    pub component: ClassComponent,
    pub scope: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub utilization_pct: f64,
    pub idle_pct: f64,
    /// Share of all assigned slot-hours per program.
    pub program_share_pct: BTreeMap<String, f64>,
    /// Share of each program's assigned hours that fall in prime time.
    pub program_prime_pct: BTreeMap<String, f64>,
    pub unscheduled_classes: usize,
    /// Free schedulable gaps between a block's classes, summed per block-day.
    pub block_windows: i64,
    pub block_clashes: usize,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    Completed,
    PartiallyCompleted,
    Failed,
    Aborted,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub strategy: Strategy,
    pub preflight: FeasibilityReport,
    pub subproblems: Vec<SubproblemReport>,
    pub schedule: Vec<BlockSchedule>,
    pub unscheduled: Vec<UnscheduledClass>,
    pub metrics: Metrics,
    /// Sum of accepted sub-problem objective values.
    pub objective: f64,
}

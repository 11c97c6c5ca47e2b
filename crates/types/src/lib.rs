pub mod config;
pub mod report;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

pub use config::*;
pub use report::*;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            Deserialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(CourseCode);
id_newtype!(RoomId);
id_newtype!(ProgramId);

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub const WEEKDAYS: [DayOfWeek; 5] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
    ];

    /// Position within the calendar week, Monday first.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Short code used in rendered day patterns ("TTH", "MWF").
    pub fn code(self) -> &'static str {
        match self {
            DayOfWeek::Mon => "M",
            DayOfWeek::Tue => "T",
            DayOfWeek::Wed => "W",
            DayOfWeek::Thu => "TH",
            DayOfWeek::Fri => "F",
            DayOfWeek::Sat => "S",
            DayOfWeek::Sun => "SU",
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, DayOfWeek::Sat | DayOfWeek::Sun)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid clock time {0:?}, expected HH:MM")]
pub struct ParseClockTimeError(pub String);

/// Time of day with minute resolution, serialized as `"HH:MM"`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(#[schema(value_type = String)] u16);

impl ClockTime {
    pub const fn from_minutes(minutes: u16) -> Self {
        Self(minutes)
    }

    pub fn hm(hour: u16, minute: u16) -> Self {
        Self(hour * 60 + minute)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = ParseClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseClockTimeError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let h: u16 = h.parse().map_err(|_| err())?;
        let m: u16 = m.parse().map_err(|_| err())?;
        if h > 24 || m > 59 || (h == 24 && m != 0) {
            return Err(err());
        }
        Ok(Self(h * 60 + m))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ParseClockTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

impl JsonSchema for ClockTime {
    fn schema_name() -> String {
        "ClockTime".into()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// Half-open `[start, end)` window within a day.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, start: ClockTime, end: ClockTime) -> bool {
        start < self.end && self.start < end
    }

    pub fn covers(&self, start: ClockTime, end: ClockTime) -> bool {
        self.start <= start && end <= self.end
    }
}

/// Closed set of room categories a Class may require.
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[serde(rename_all = "kebab-case")]
pub enum RoomCategory {
    #[default]
    NonLab,
    Lab,
    Networking,
    Database,
    Security,
    Multimedia,
}

impl fmt::Display for RoomCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoomCategory::NonLab => "non-lab",
            RoomCategory::Lab => "lab",
            RoomCategory::Networking => "networking",
            RoomCategory::Database => "database",
            RoomCategory::Security => "security",
            RoomCategory::Multimedia => "multimedia",
        };
        f.write_str(s)
    }
}

// Checked in order; the first matching row wins.
const CATEGORY_KEYWORDS: &[(&[&str], RoomCategory)] = &[
    (&["network"], RoomCategory::Networking),
    (&["database"], RoomCategory::Database),
    (&["security", "cyber"], RoomCategory::Security),
    (
        &["mobile", "android", "ios", "web", "internet", "programming"],
        RoomCategory::Lab,
    ),
    (
        &["graphic", "graphics", "animation", "multimedia", "art", "arts"],
        RoomCategory::Multimedia,
    ),
];

fn keyword_hit(token: &str, keyword: &str) -> bool {
    token == keyword || (keyword.len() >= 4 && token.starts_with(keyword))
}

impl RoomCategory {
    /// Infers the room category from free-text course data.
    ///
    /// The course code and description are tokenized and matched against a
    /// fixed keyword table. Courses that match nothing but carry lab hours
    /// need a general lab; everything else falls back to [`RoomCategory::NonLab`].
    pub fn infer(code: &str, description: &str, lab_hours: f64) -> RoomCategory {
        let text = format!("{code} {description}").to_lowercase();
        let tokens: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut matched: Option<RoomCategory> = None;
        for (keywords, category) in CATEGORY_KEYWORDS {
            if *category == RoomCategory::Multimedia && lab_hours > 0.0 {
                break;
            }
            if tokens
                .iter()
                .any(|t| keywords.iter().any(|k| keyword_hit(t, k)))
            {
                matched = Some(*category);
                break;
            }
        }
        match matched {
            Some(c) => c,
            None if lab_hours > 0.0 => RoomCategory::Lab,
            None => RoomCategory::NonLab,
        }
    }

    pub fn is_lab(self) -> bool {
        self != RoomCategory::NonLab
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum CourseKind {
    #[default]
    Regular,
    /// Short intensive sessions; every weekly hour lands on one calendar day.
    SingleDayBlock,
    /// Off-site practicum; only a fixed weekly check-in is scheduled.
    Practicum,
}

/// Which part of a course's weekly hours a Class carries.
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[serde(rename_all = "camelCase")]
pub enum ClassComponent {
    /// Lecture and lab hours together, in one room.
    #[default]
    Whole,
    Lecture,
    Lab,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: CourseCode,
    pub title: String,
    pub program: ProgramId,
    pub year: u8,
    #[serde(default)]
    pub lecture_hours: f64,
    #[serde(default)]
    pub lab_hours: f64,
    #[serde(default)]
    pub units: f64,
    #[serde(default)]
    pub room_category: RoomCategory,
    #[serde(default)]
    pub kind: CourseKind,
}

impl Course {
    pub fn nominal_hours(&self) -> f64 {
        self.lecture_hours + self.lab_hours
    }
}

/// Program-year-section identity, rendered as `IT-3A`.
#[derive(
    Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
pub struct BlockKey {
    pub program: ProgramId,
    pub year: u8,
    pub section: String,
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{}", self.program, self.year, self.section)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Block {
    pub program: ProgramId,
    pub year: u8,
    pub section: String,
    pub students: u32,
}

impl Block {
    pub fn key(&self) -> BlockKey {
        BlockKey {
            program: self.program.clone(),
            year: self.year,
            section: self.section.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Room {
    pub id: RoomId,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub floor: Option<i16>,
    pub capacity: u32,
    #[serde(default)]
    pub category: RoomCategory,
    #[serde(default)]
    pub equipment: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Instance {
    pub courses: Vec<Course>,
    pub blocks: Vec<Block>,
    pub rooms: Vec<Room>,
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[serde(transparent)]
pub struct SlotId(pub usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: SlotId,
    pub day: DayOfWeek,
    /// Zero-based period within the day.
    pub period: u16,
    pub start: ClockTime,
    pub end: ClockTime,
    pub lunch_excluded: bool,
    pub weekend_reduced: bool,
    pub prime: bool,
}

impl TimeSlot {
    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes() - self.start.minutes()
    }

    /// Whether a Class may occupy this slot at all.
    pub fn schedulable(&self) -> bool {
        !self.lunch_excluded
    }

    /// Shares any minute with `[start, end)` on `day`.
    pub fn overlaps(&self, day: DayOfWeek, start: ClockTime, end: ClockTime) -> bool {
        self.day == day && self.start < end && start < self.end
    }

    /// `next` starts exactly where `self` ends on the same day.
    pub fn precedes(&self, next: &TimeSlot) -> bool {
        self.day == next.day && self.end == next.start
    }
}

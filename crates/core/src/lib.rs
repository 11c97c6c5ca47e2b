pub mod backend;
pub mod builder;
pub mod classes;
pub mod decompose;
pub mod error;
pub mod extract;
pub mod feasibility;
pub mod lp;
pub mod objective;
pub mod occupancy;
pub mod scoring;
pub mod time_domain;

use std::collections::HashSet;

pub use backend::{Backend, Verdict};
pub use builder::{BuiltModel, ModelBuilder};
pub use classes::{course_parts, expand_classes, Class, ClassId, CoursePart};
pub use decompose::{
    preflight, program_blocks, CancelToken, Controller, NoProgress, Progress, ProgressSink, ScopeLabel,
};
pub use error::{ConfigError, CoreError, DataError, ValidationError};
pub use occupancy::{Occupancy, Placement};
pub use time_domain::TimeDomain;

pub use tt_types::{FeasibilityReport, Instance, RunConfig, RunReport};

/// Checks an instance against a run configuration, reporting every problem at once.
pub fn validate(inst: &Instance, cfg: &RunConfig) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    fn chk_unique<I: ToString>(name: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {name} id: {s}"));
            }
        }
    }
    chk_unique("room", inst.rooms.iter().map(|r| &r.id), &mut errors);
    chk_unique("block", inst.blocks.iter().map(|b| b.key()), &mut errors);
    chk_unique(
        "course",
        inst.courses
            .iter()
            .map(|c| format!("{} ({}-{})", c.code, c.program, c.year)),
        &mut errors,
    );

    for r in &inst.rooms {
        if r.id.0.trim().is_empty() {
            errors.push("room with empty id".into());
        }
        if r.capacity == 0 {
            errors.push(format!("room {} has zero capacity", r.id));
        }
    }
    for b in &inst.blocks {
        if b.students == 0 {
            errors.push(format!("block {} has no enrolled students", b.key()));
        }
    }
    for c in &inst.courses {
        if c.lecture_hours < 0.0 || c.lab_hours < 0.0 {
            errors.push(format!("course {} has negative hours", c.code));
        }
    }

    if let Err(e) = objective::validate(&cfg.objective) {
        errors.push(e.to_string());
    }
    if let tt_types::Strategy::Sequential { reserve_ratio, .. } = cfg.strategy {
        if !(0.0..=1.0).contains(&reserve_ratio) {
            errors.push(ConfigError::InvalidReserveRatio(reserve_ratio).to_string());
        }
    }
    match TimeDomain::generate(&cfg.time_domain) {
        Err(e) => errors.push(e.to_string()),
        Ok(domain) => {
            if let Err(e) = domain.check_requirements(&inst.courses, &cfg.rules) {
                errors.push(e.to_string());
            }
            if let Err(e) = occupancy::from_bookings(inst, &domain, &cfg.fixed_occupancy) {
                errors.push(e.to_string());
            }
            if errors.is_empty() {
                match expand_classes(inst, &domain, &cfg.rules) {
                    Err(e) => errors.push(e.to_string()),
                    Ok(classes) => {
                        if let Ok(builder) = ModelBuilder::new(inst, &domain, &classes, cfg.mode) {
                            for c in &classes {
                                if builder.eligible_rooms(c).is_empty() {
                                    errors.push(format!(
                                        "class {c} has no eligible room ({}, {} seats)",
                                        c.category, c.enrollment
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_types::{Block, Course, CourseKind, Room, RoomCategory};

    fn inst() -> Instance {
        Instance {
            courses: vec![Course {
                code: "NET201".into(),
                title: "Networking 1".into(),
                program: "IT".into(),
                year: 2,
                lecture_hours: 2.0,
                lab_hours: 1.0,
                units: 3.0,
                room_category: RoomCategory::Networking,
                kind: CourseKind::Regular,
            }],
            blocks: vec![Block {
                program: "IT".into(),
                year: 2,
                section: "A".into(),
                students: 35,
            }],
            rooms: vec![Room {
                id: "NL1".into(),
                building: Some("ICT".into()),
                floor: Some(2),
                capacity: 40,
                category: RoomCategory::Networking,
                equipment: vec!["switches".into()],
            }],
        }
    }

    #[test]
    fn valid_instance_passes() {
        assert!(validate(&inst(), &RunConfig::default()).is_ok());
    }

    #[test]
    fn errors_are_aggregated() {
        let mut i = inst();
        i.rooms.push(i.rooms[0].clone());
        i.blocks[0].students = 0;
        let err = validate(&i, &RunConfig::default()).unwrap_err();
        assert_eq!(err.0.len(), 2);
        assert!(err.to_string().starts_with("invalid instance: duplicate room id: NL1"));
    }

    #[test]
    fn missing_room_category_is_reported() {
        let mut i = inst();
        i.rooms[0].category = RoomCategory::Lab;
        let err = validate(&i, &RunConfig::default()).unwrap_err();
        assert_eq!(
            err.0,
            vec!["class NET201@IT-2A has no eligible room (networking, 35 seats)".to_string()]
        );
    }

    #[test]
    fn bad_bookings_and_reserve_are_reported() {
        let cfg = RunConfig {
            strategy: tt_types::Strategy::Sequential {
                key: tt_types::ScopeKey::ProgramBySize,
                reserve_ratio: 1.5,
            },
            fixed_occupancy: vec![tt_types::FixedBooking {
                room: "NL9".into(),
                day: tt_types::DayOfWeek::Mon,
                start: tt_types::ClockTime::hm(8, 0),
                end: tt_types::ClockTime::hm(9, 0),
                block: None,
            }],
            ..RunConfig::default()
        };
        let err = validate(&inst(), &cfg).unwrap_err();
        assert_eq!(
            err.0,
            vec![
                "reserve ratio must lie in [0, 1], got 1.5".to_string(),
                "fixed booking names unknown room NL9".to_string(),
            ]
        );
    }

    #[test]
    fn indivisible_hours_are_reported() {
        let mut i = inst();
        i.courses[0].lab_hours = 1.25;
        let err = validate(&i, &RunConfig::default()).unwrap_err();
        assert_eq!(err.0.len(), 1);
        assert!(err.0[0].contains("NET201"));
    }
}

use std::fmt;

use tt_types::{
    BlockKey, ClassComponent, ClassRules, Course, CourseCode, CourseKind, Instance, ProgramId, RoomCategory,
};

use crate::error::{ConfigError, CoreError, DataError};
use crate::time_domain::{scheduled_hours, TimeDomain};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassId(pub usize);

/// One weekly obligation: a Course offered to a Block.
#[derive(Clone, Debug, PartialEq)]
pub struct Class {
    pub id: ClassId,
    pub course: usize,
    pub block: usize,
    pub code: CourseCode,
    pub component: ClassComponent,
    pub block_key: BlockKey,
    pub program: ProgramId,
    pub year: u8,
    pub category: RoomCategory,
    pub enrollment: u32,
    pub kind: CourseKind,
    pub required_minutes: u32,
    pub required_slots: u32,
    /// Per-day slot cap for regular classes, when configured.
    pub max_daily_slots: Option<u32>,
}

impl Class {
    pub fn required_hours(&self) -> f64 {
        f64::from(self.required_minutes) / 60.0
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            ClassComponent::Whole => write!(f, "{}@{}", self.code, self.block_key),
            ClassComponent::Lecture => write!(f, "{}:lecture@{}", self.code, self.block_key),
            ClassComponent::Lab => write!(f, "{}:lab@{}", self.code, self.block_key),
        }
    }
}

/// A schedulable share of a course's weekly hours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoursePart {
    pub component: ClassComponent,
    pub hours: f64,
    pub category: RoomCategory,
}

/// Splits a course into the parts that become separate Classes.
///
/// Without `split_lecture_lab`, or for courses lacking either lecture or lab
/// hours, the whole course is one part. Practicum courses are never split.
pub fn course_parts(course: &Course, rules: &ClassRules) -> Vec<CoursePart> {
    let split = rules.split_lecture_lab
        && course.kind != CourseKind::Practicum
        && course.lecture_hours > 0.0
        && course.lab_hours > 0.0;
    if !split {
        return vec![CoursePart {
            component: ClassComponent::Whole,
            hours: scheduled_hours(course, rules),
            category: course.room_category,
        }];
    }
    let lab_category = if course.room_category.is_lab() {
        course.room_category
    } else {
        RoomCategory::Lab
    };
    vec![
        CoursePart {
            component: ClassComponent::Lecture,
            hours: course.lecture_hours,
            category: RoomCategory::NonLab,
        },
        CoursePart {
            component: ClassComponent::Lab,
            hours: course.lab_hours,
            category: lab_category,
        },
    ]
}

/// Expands the Course × Block cross product into Classes.
///
/// A Block takes every Course of its own program and year. Ids follow block
/// order, then course order, so expansion is stable for a given instance.
pub fn expand_classes(
    instance: &Instance,
    domain: &TimeDomain,
    rules: &ClassRules,
) -> Result<Vec<Class>, CoreError> {
    let mut classes = Vec::new();
    for (bi, block) in instance.blocks.iter().enumerate() {
        for (ci, course) in instance.courses.iter().enumerate() {
            if course.program != block.program || course.year != block.year {
                continue;
            }
            let max_daily_slots = match (course.kind, rules.max_daily_hours) {
                (CourseKind::Regular, Some(cap)) => Some(domain.hours_to_slots(&course.code, cap)?),
                _ => None,
            };
            if let Some(0) = max_daily_slots {
                return Err(ConfigError::IndivisibleHours {
                    course: course.code.clone(),
                    hours: rules.max_daily_hours.unwrap_or_default(),
                    slot_minutes: domain.slot_minutes(),
                }
                .into());
            }
            for part in course_parts(course, rules) {
                if part.hours <= 0.0 {
                    return Err(DataError::NoContactHours(course.code.clone()).into());
                }
                let required_slots = domain.hours_to_slots(&course.code, part.hours)?;
                classes.push(Class {
                    id: ClassId(classes.len()),
                    course: ci,
                    block: bi,
                    code: course.code.clone(),
                    component: part.component,
                    block_key: block.key(),
                    program: block.program.clone(),
                    year: block.year,
                    category: part.category,
                    enrollment: block.students,
                    kind: course.kind,
                    required_minutes: required_slots * u32::from(domain.slot_minutes()),
                    required_slots,
                    max_daily_slots,
                });
            }
        }
    }
    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_types::{Block, Course, TimeDomainConfig};

    fn course(code: &str, year: u8, hours: f64, kind: CourseKind) -> Course {
        Course {
            code: code.into(),
            title: code.into(),
            program: "IT".into(),
            year,
            lecture_hours: hours,
            lab_hours: 0.0,
            units: hours,
            room_category: RoomCategory::NonLab,
            kind,
        }
    }

    fn block(year: u8, section: &str) -> Block {
        Block {
            program: "IT".into(),
            year,
            section: section.into(),
            students: 30,
        }
    }

    #[test]
    fn classes_follow_program_and_year() {
        let inst = Instance {
            courses: vec![
                course("IT101", 1, 3.0, CourseKind::Regular),
                course("IT301", 3, 2.0, CourseKind::Regular),
                course("IT399", 3, 0.0, CourseKind::Practicum),
            ],
            blocks: vec![block(1, "A"), block(3, "A"), block(3, "B")],
            rooms: vec![],
        };
        let d = TimeDomain::generate(&TimeDomainConfig::default()).unwrap();
        let classes = expand_classes(&inst, &d, &ClassRules::default()).unwrap();
        assert_eq!(classes.len(), 5);
        assert_eq!(classes[0].to_string(), "IT101@IT-1A");
        assert_eq!(classes[0].required_slots, 6);
        let practicum: Vec<_> = classes.iter().filter(|c| c.kind == CourseKind::Practicum).collect();
        assert_eq!(practicum.len(), 2);
        assert!(practicum.iter().all(|c| c.required_slots == 4));
        assert!(classes.iter().enumerate().all(|(i, c)| c.id == ClassId(i)));
    }

    #[test]
    fn zero_hour_course_is_a_data_error() {
        let inst = Instance {
            courses: vec![course("IT100", 1, 0.0, CourseKind::Regular)],
            blocks: vec![block(1, "A")],
            rooms: vec![],
        };
        let d = TimeDomain::generate(&TimeDomainConfig::default()).unwrap();
        let err = expand_classes(&inst, &d, &ClassRules::default()).unwrap_err();
        assert!(matches!(err, CoreError::Data(DataError::NoContactHours(_))));
    }

    #[test]
    fn daily_cap_applies_to_regular_only() {
        let inst = Instance {
            courses: vec![
                course("IT101", 1, 3.0, CourseKind::Regular),
                course("IT102", 1, 4.0, CourseKind::SingleDayBlock),
            ],
            blocks: vec![block(1, "A")],
            rooms: vec![],
        };
        let d = TimeDomain::generate(&TimeDomainConfig::default()).unwrap();
        let rules = ClassRules {
            max_daily_hours: Some(1.5),
            ..ClassRules::default()
        };
        let classes = expand_classes(&inst, &d, &rules).unwrap();
        assert_eq!(classes[0].max_daily_slots, Some(3));
        assert_eq!(classes[1].max_daily_slots, None);
    }

    #[test]
    fn lecture_and_lab_split_into_two_classes() {
        let mut net = course("NET201", 1, 2.0, CourseKind::Regular);
        net.lab_hours = 3.0;
        net.room_category = RoomCategory::Networking;
        let mut web = course("WEB101", 1, 0.0, CourseKind::Regular);
        web.lab_hours = 3.0;
        web.room_category = RoomCategory::Lab;
        let mut ojt = course("OJT1", 1, 1.0, CourseKind::Practicum);
        ojt.lab_hours = 10.0;
        let inst = Instance {
            courses: vec![net, web, ojt],
            blocks: vec![block(1, "A")],
            rooms: vec![],
        };
        let d = TimeDomain::generate(&TimeDomainConfig::default()).unwrap();

        let whole = expand_classes(&inst, &d, &ClassRules::default()).unwrap();
        assert_eq!(whole.len(), 3);
        assert_eq!(whole[0].category, RoomCategory::Networking);
        assert_eq!(whole[0].required_slots, 10);

        let rules = ClassRules {
            split_lecture_lab: true,
            ..ClassRules::default()
        };
        let split = expand_classes(&inst, &d, &rules).unwrap();
        let shape: Vec<_> = split
            .iter()
            .map(|c| (c.to_string(), c.category, c.required_slots))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("NET201:lecture@IT-1A".to_string(), RoomCategory::NonLab, 4),
                ("NET201:lab@IT-1A".to_string(), RoomCategory::Networking, 6),
                ("WEB101@IT-1A".to_string(), RoomCategory::Lab, 6),
                ("OJT1@IT-1A".to_string(), RoomCategory::NonLab, 4),
            ]
        );
        assert!(split.iter().enumerate().all(|(i, c)| c.id == ClassId(i)));
    }
}

use std::collections::BTreeMap;

use tt_types::{
    ClassRules, ClockTime, Course, CourseCode, CourseKind, DayOfWeek, SlotId, TimeDomainConfig,
    TimeSlot,
};

use crate::classes::course_parts;
use crate::error::ConfigError;

/// The finite, ordered set of weekly slots.
///
/// Slot ids are positions in week order (day, then start time), so the same
/// configuration always yields the same ids. Occupancy carried between
/// sub-problems is keyed on these ids.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeDomain {
    slots: Vec<TimeSlot>,
    slot_minutes: u16,
}

impl TimeDomain {
    pub fn generate(cfg: &TimeDomainConfig) -> Result<Self, ConfigError> {
        if cfg.slot_minutes == 0 {
            return Err(ConfigError::ZeroSlotDuration);
        }
        let mut days = cfg.days.clone();
        days.sort_unstable();
        days.dedup();

        let step = cfg.slot_minutes;
        let mut slots = Vec::new();
        for day in days {
            let day_end = match cfg.weekend_end {
                Some(reduced) if day.is_weekend() => reduced.min(cfg.day_end),
                _ => cfg.day_end,
            };
            let weekend_reduced = day.is_weekend() && day_end < cfg.day_end;

            let mut start = cfg.day_start.minutes();
            let mut period = 0u16;
            while start + step <= day_end.minutes() {
                let (s, e) = (
                    ClockTime::from_minutes(start),
                    ClockTime::from_minutes(start + step),
                );
                slots.push(TimeSlot {
                    id: SlotId(slots.len()),
                    day,
                    period,
                    start: s,
                    end: e,
                    lunch_excluded: cfg.excluded.iter().any(|w| w.overlaps(s, e)),
                    weekend_reduced,
                    prime: cfg.prime.covers(s, e),
                });
                period += 1;
                start += step;
            }
        }

        let domain = Self {
            slots,
            slot_minutes: step,
        };
        if domain.schedulable().next().is_none() {
            return Err(ConfigError::EmptyDomain {
                start: cfg.day_start,
                end: cfg.day_end,
            });
        }
        Ok(domain)
    }

    /// Generates the domain and checks every course requirement against it.
    pub fn for_courses(
        cfg: &TimeDomainConfig,
        courses: &[Course],
        rules: &ClassRules,
    ) -> Result<Self, ConfigError> {
        let domain = Self::generate(cfg)?;
        domain.check_requirements(courses, rules)?;
        Ok(domain)
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn slot(&self, id: SlotId) -> &TimeSlot {
        &self.slots[id.0]
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot_minutes(&self) -> u16 {
        self.slot_minutes
    }

    pub fn slot_hours(&self) -> f64 {
        f64::from(self.slot_minutes) / 60.0
    }

    /// Slots a Class may occupy (lunch-excluded slots filtered out).
    pub fn schedulable(&self) -> impl Iterator<Item = &TimeSlot> + '_ {
        self.slots.iter().filter(|s| s.schedulable())
    }

    pub fn schedulable_count(&self) -> usize {
        self.schedulable().count()
    }

    pub fn days(&self) -> Vec<DayOfWeek> {
        let mut days: Vec<DayOfWeek> = self.slots.iter().map(|s| s.day).collect();
        days.dedup();
        days
    }

    pub fn schedulable_by_day(&self) -> BTreeMap<DayOfWeek, Vec<SlotId>> {
        let mut by_day: BTreeMap<DayOfWeek, Vec<SlotId>> = BTreeMap::new();
        for s in self.schedulable() {
            by_day.entry(s.day).or_default().push(s.id);
        }
        by_day
    }

    /// Pairs of schedulable slots where the second starts exactly as the first ends.
    pub fn adjacent_pairs(&self) -> Vec<(SlotId, SlotId)> {
        self.slots
            .windows(2)
            .filter(|w| w[0].schedulable() && w[1].schedulable() && w[0].precedes(&w[1]))
            .map(|w| (w[0].id, w[1].id))
            .collect()
    }

    /// Converts a weekly hour requirement into a whole number of slots.
    pub fn hours_to_slots(&self, course: &CourseCode, hours: f64) -> Result<u32, ConfigError> {
        let indivisible = || ConfigError::IndivisibleHours {
            course: course.clone(),
            hours,
            slot_minutes: self.slot_minutes,
        };
        let minutes = hours * 60.0;
        let whole = minutes.round();
        if whole < 0.0 || (minutes - whole).abs() > 1e-6 {
            return Err(indivisible());
        }
        let whole = whole as u32;
        if whole % u32::from(self.slot_minutes) != 0 {
            return Err(indivisible());
        }
        Ok(whole / u32::from(self.slot_minutes))
    }

    pub fn check_requirements(
        &self,
        courses: &[Course],
        rules: &ClassRules,
    ) -> Result<(), ConfigError> {
        for c in courses {
            for part in course_parts(c, rules) {
                self.hours_to_slots(&c.code, part.hours)?;
            }
            if let (CourseKind::Regular, Some(cap)) = (c.kind, rules.max_daily_hours) {
                self.hours_to_slots(&c.code, cap)?;
            }
        }
        Ok(())
    }
}

/// Weekly hours actually placed on the timetable for a course.
pub fn scheduled_hours(course: &Course, rules: &ClassRules) -> f64 {
    match course.kind {
        CourseKind::Practicum => rules.practicum_hours,
        _ => course.nominal_hours(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tt_types::{RoomCategory, TimeWindow};

    fn course(code: &str, lec: f64, lab: f64, kind: CourseKind) -> Course {
        Course {
            code: code.into(),
            title: code.to_string(),
            program: "IT".into(),
            year: 1,
            lecture_hours: lec,
            lab_hours: lab,
            units: lec + lab,
            room_category: RoomCategory::NonLab,
            kind,
        }
    }

    #[test]
    fn default_calendar_has_lunch_flagged() {
        let d = TimeDomain::generate(&TimeDomainConfig::default()).unwrap();
        // 08:00-17:00 in 30 minute steps, five days
        assert_eq!(d.len(), 5 * 18);
        assert_eq!(d.schedulable_count(), 5 * 16);
        let lunch: Vec<_> = d.slots().iter().filter(|s| s.lunch_excluded).collect();
        assert_eq!(lunch.len(), 10);
        assert!(lunch
            .iter()
            .all(|s| s.start >= ClockTime::hm(12, 0) && s.end <= ClockTime::hm(13, 0)));
        assert_eq!(d.slot(SlotId(0)).start, ClockTime::hm(8, 0));
        assert_eq!(d.slot(SlotId(18)).day, DayOfWeek::Tue);
    }

    #[test]
    fn prime_window_flags() {
        let d = TimeDomain::generate(&TimeDomainConfig::default()).unwrap();
        let first = d.slot(SlotId(0));
        assert!(!first.prime);
        let nine = d.slots().iter().find(|s| s.start == ClockTime::hm(9, 0)).unwrap();
        assert!(nine.prime);
        let late = d.slots().iter().find(|s| s.start == ClockTime::hm(15, 0)).unwrap();
        assert!(!late.prime);
    }

    #[test]
    fn weekend_is_reduced() {
        let cfg = TimeDomainConfig {
            days: vec![DayOfWeek::Sat, DayOfWeek::Mon],
            ..TimeDomainConfig::default()
        };
        let d = TimeDomain::generate(&cfg).unwrap();
        let sat: Vec<_> = d.slots().iter().filter(|s| s.day == DayOfWeek::Sat).collect();
        assert_eq!(sat.len(), 8);
        assert!(sat.iter().all(|s| s.weekend_reduced));
        // Monday comes first regardless of configured order
        assert_eq!(d.slot(SlotId(0)).day, DayOfWeek::Mon);
        assert_eq!(d.days(), vec![DayOfWeek::Mon, DayOfWeek::Sat]);
    }

    #[test]
    fn duplicate_days_are_collapsed() {
        let cfg = TimeDomainConfig {
            days: vec![DayOfWeek::Tue, DayOfWeek::Tue],
            ..TimeDomainConfig::default()
        };
        let d = TimeDomain::generate(&cfg).unwrap();
        assert_eq!(d.len(), 18);
    }

    #[test]
    fn empty_domain_is_a_config_error() {
        let cfg = TimeDomainConfig {
            day_start: ClockTime::hm(12, 0),
            day_end: ClockTime::hm(13, 0),
            ..TimeDomainConfig::default()
        };
        assert!(matches!(
            TimeDomain::generate(&cfg),
            Err(ConfigError::EmptyDomain { .. })
        ));
        let cfg = TimeDomainConfig {
            days: vec![],
            ..TimeDomainConfig::default()
        };
        assert!(TimeDomain::generate(&cfg).is_err());
        let cfg = TimeDomainConfig {
            slot_minutes: 0,
            ..TimeDomainConfig::default()
        };
        assert_eq!(TimeDomain::generate(&cfg), Err(ConfigError::ZeroSlotDuration));
    }

    #[test]
    fn adjacency_skips_lunch() {
        let d = TimeDomain::generate(&TimeDomainConfig::default()).unwrap();
        let pairs = d.adjacent_pairs();
        // per day: 7 morning pairs + 7 afternoon pairs
        assert_eq!(pairs.len(), 5 * 14);
        for (a, b) in pairs {
            assert_eq!(d.slot(a).end, d.slot(b).start);
            assert_eq!(d.slot(a).day, d.slot(b).day);
        }
    }

    #[test]
    fn requirement_divisibility() {
        let cfg = TimeDomainConfig {
            slot_minutes: 60,
            excluded: vec![],
            ..TimeDomainConfig::default()
        };
        let d = TimeDomain::generate(&cfg).unwrap();
        let rules = ClassRules::default();
        assert!(d
            .check_requirements(&[course("A", 2.0, 1.0, CourseKind::Regular)], &rules)
            .is_ok());
        let err = d
            .check_requirements(&[course("B", 1.5, 0.0, CourseKind::Regular)], &rules)
            .unwrap_err();
        assert!(matches!(err, ConfigError::IndivisibleHours { slot_minutes: 60, .. }));
        // practicum ignores its nominal 486 lab hours
        let p = course("P", 0.0, 486.5, CourseKind::Practicum);
        assert!(d.check_requirements(&[p], &rules).is_ok());
    }

    #[test]
    fn excluded_window_can_be_removed() {
        let cfg = TimeDomainConfig {
            excluded: vec![],
            ..TimeDomainConfig::default()
        };
        let d = TimeDomain::generate(&cfg).unwrap();
        assert_eq!(d.schedulable_count(), d.len());
        let cfg = TimeDomainConfig {
            excluded: vec![TimeWindow::new(ClockTime::hm(8, 0), ClockTime::hm(9, 0))],
            ..TimeDomainConfig::default()
        };
        let d = TimeDomain::generate(&cfg).unwrap();
        assert!(d.slot(SlotId(0)).lunch_excluded);
    }

    proptest! {
        #[test]
        fn generation_is_deterministic(
            start_h in 6u16..10,
            span_h in 2u16..10,
            step in prop::sample::select(vec![15u16, 30, 60]),
            mask in 1u8..128,
        ) {
            let days: Vec<DayOfWeek> = [
                DayOfWeek::Mon, DayOfWeek::Tue, DayOfWeek::Wed, DayOfWeek::Thu,
                DayOfWeek::Fri, DayOfWeek::Sat, DayOfWeek::Sun,
            ]
            .into_iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, d)| d)
            .collect();
            let cfg = TimeDomainConfig {
                days,
                day_start: ClockTime::hm(start_h, 0),
                day_end: ClockTime::hm(start_h + span_h, 0),
                slot_minutes: step,
                excluded: vec![],
                weekend_end: None,
                ..TimeDomainConfig::default()
            };
            let a = TimeDomain::generate(&cfg).unwrap();
            let b = TimeDomain::generate(&cfg).unwrap();
            prop_assert_eq!(&a, &b);
            for (i, s) in a.slots().iter().enumerate() {
                prop_assert_eq!(s.id, SlotId(i));
            }
            for w in a.slots().windows(2) {
                prop_assert!((w[0].day, w[0].start) < (w[1].day, w[1].start));
            }
        }
    }
}

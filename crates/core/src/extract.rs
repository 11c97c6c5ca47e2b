use std::collections::BTreeMap;

use tt_types::{BlockKey, BlockSchedule, ClassComponent, DayRange, Instance, ScheduleEntry, SlotId};

use crate::classes::{Class, ClassId};
use crate::occupancy::Placement;
use crate::time_domain::TimeDomain;

/// Maximal runs of consecutive slots, ordered by day then period.
pub fn contiguous_runs(domain: &TimeDomain, slots: &[SlotId]) -> Vec<Vec<SlotId>> {
    let mut sorted = slots.to_vec();
    sorted.sort_by_key(|&s| {
        let t = domain.slot(s);
        (t.day, t.period)
    });
    sorted.dedup();

    let mut runs: Vec<Vec<SlotId>> = Vec::new();
    for s in sorted {
        match runs.last_mut() {
            Some(run) if run.last().is_some_and(|&p| domain.slot(p).precedes(domain.slot(s))) => {
                run.push(s)
            }
            _ => runs.push(vec![s]),
        }
    }
    runs
}

fn render_entry(
    instance: &Instance,
    domain: &TimeDomain,
    class: &Class,
    room: usize,
    slots: Vec<SlotId>,
) -> ScheduleEntry {
    let runs = contiguous_runs(domain, &slots);
    let ranges: Vec<DayRange> = runs
        .iter()
        .filter_map(|run| {
            let first = domain.slot(*run.first()?);
            let last = domain.slot(*run.last()?);
            Some(DayRange {
                day: first.day,
                start: first.start,
                end: last.end,
            })
        })
        .collect();

    let mut days: Vec<_> = ranges.iter().map(|r| r.day).collect();
    days.dedup();
    let day_pattern: String = days.iter().map(|d| d.code()).collect();

    // One shared range only when every day holds exactly one identical run.
    let time_range = match ranges.first() {
        Some(first)
            if days.len() == ranges.len()
                && ranges.iter().all(|r| r.start == first.start && r.end == first.end) =>
        {
            Some(format!("{}-{}", first.start, first.end))
        }
        _ => None,
    };

    let course = &instance.courses[class.course];
    let (lecture_hours, lab_hours) = match class.component {
        ClassComponent::Whole => (course.lecture_hours, course.lab_hours),
        ClassComponent::Lecture => (course.lecture_hours, 0.0),
        ClassComponent::Lab => (0.0, course.lab_hours),
    };
    let slots = runs.into_iter().flatten().collect();
    ScheduleEntry {
        block: class.block_key.clone(),
        course_code: class.code.clone(),
        component: class.component,
        title: course.title.clone(),
        room: instance.rooms[room].id.clone(),
        slots,
        day_pattern,
        time_range,
        ranges,
        lecture_hours,
        lab_hours,
        scheduled_hours: class.required_hours(),
        units: course.units,
    }
}

/// Turns accepted placements into per-block, time-ordered schedule entries.
///
/// Exactly one entry per placed Class. Entries within a block are ordered by
/// their first slot (day, then period), then course code.
pub fn extract(
    instance: &Instance,
    domain: &TimeDomain,
    classes: &[Class],
    placements: &[Placement],
) -> Vec<BlockSchedule> {
    let mut per_class: BTreeMap<ClassId, (usize, Vec<SlotId>)> = BTreeMap::new();
    for p in placements {
        let entry = per_class.entry(p.class).or_insert_with(|| (p.room, Vec::new()));
        entry.1.extend(p.slots.iter().copied());
    }

    let mut by_block: BTreeMap<BlockKey, Vec<ScheduleEntry>> = BTreeMap::new();
    for (cid, (room, slots)) in per_class {
        let class = &classes[cid.0];
        let entry = render_entry(instance, domain, class, room, slots);
        by_block.entry(entry.block.clone()).or_default().push(entry);
    }

    by_block
        .into_iter()
        .map(|(block, mut entries)| {
            entries.sort_by(|a, b| {
                let key = |e: &ScheduleEntry| {
                    e.slots.first().map(|&s| {
                        let t = domain.slot(s);
                        (t.day, t.period)
                    })
                };
                key(a)
                    .cmp(&key(b))
                    .then_with(|| a.course_code.cmp(&b.course_code))
                    .then_with(|| a.component.cmp(&b.component))
            });
            BlockSchedule { block, entries }
        })
        .collect()
}

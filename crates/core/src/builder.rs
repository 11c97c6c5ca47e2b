use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use tt_types::{CourseKind, DayOfWeek, Instance, ModelMode, ProgramId, SlotId};

use crate::classes::{Class, ClassId};
use crate::error::DataError;
use crate::lp::{Assignment, LinExpr, LinearModel, Relation, VarId};
use crate::objective::ObjectiveTerms;
use crate::occupancy::{Occupancy, Placement};
use crate::time_domain::TimeDomain;

/// One `x[c,r,t]` decision variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignVar {
    pub class: ClassId,
    pub room: usize,
    pub slot: SlotId,
    pub var: VarId,
}

/// A sub-problem model plus what is needed to read its solution back.
#[derive(Clone, Debug)]
pub struct BuiltModel {
    pub model: LinearModel,
    pub assign: Vec<AssignVar>,
    /// Relaxed mode only: the all-or-nothing indicator per Class.
    pub scheduled: BTreeMap<ClassId, VarId>,
    pub terms: ObjectiveTerms,
    pub classes: Vec<ClassId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    pub placements: Vec<Placement>,
    pub unscheduled: Vec<ClassId>,
}

impl BuiltModel {
    pub fn decode(&self, assignment: &Assignment) -> Decoded {
        let mut by_class_room: BTreeMap<(ClassId, usize), Vec<SlotId>> = BTreeMap::new();
        for a in &self.assign {
            if assignment.is_set(a.var) {
                by_class_room.entry((a.class, a.room)).or_default().push(a.slot);
            }
        }
        let placed: BTreeSet<ClassId> = by_class_room.keys().map(|(c, _)| *c).collect();
        let placements = by_class_room
            .into_iter()
            .map(|((class, room), mut slots)| {
                slots.sort_unstable();
                Placement { class, room, slots }
            })
            .collect();
        let unscheduled = self
            .classes
            .iter()
            .copied()
            .filter(|c| !placed.contains(c))
            .collect();
        Decoded {
            placements,
            unscheduled,
        }
    }
}

/// Encodes scheduling policy as a 0/1 program for one scope of Classes.
pub struct ModelBuilder<'a> {
    instance: &'a Instance,
    domain: &'a TimeDomain,
    classes: &'a [Class],
    mode: ModelMode,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(
        instance: &'a Instance,
        domain: &'a TimeDomain,
        classes: &'a [Class],
        mode: ModelMode,
    ) -> Result<Self, DataError> {
        let mut seen = BTreeSet::new();
        for room in &instance.rooms {
            let malformed = |reason: &str| DataError::MalformedRoom {
                room: room.id.to_string(),
                reason: reason.to_string(),
            };
            if room.id.0.trim().is_empty() {
                return Err(malformed("empty identifier"));
            }
            if room.capacity == 0 {
                return Err(malformed("capacity must be positive"));
            }
            if !seen.insert(&room.id) {
                return Err(malformed("duplicate identifier"));
            }
        }
        Ok(Self {
            instance,
            domain,
            classes,
            mode,
        })
    }

    /// Rooms of the required category with enough seats.
    pub fn eligible_rooms(&self, class: &Class) -> Vec<usize> {
        self.instance
            .rooms
            .iter()
            .enumerate()
            .filter(|(_, r)| r.category == class.category && r.capacity >= class.enrollment)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn build(&self, scope: &[ClassId], occupied: &Occupancy) -> Result<BuiltModel, DataError> {
        let relaxed = self.mode == ModelMode::Relaxed;
        let mut m = LinearModel::new();
        let mut assign = Vec::new();
        let mut scheduled = BTreeMap::new();

        let mut per_room_slot: BTreeMap<(usize, SlotId), Vec<VarId>> = BTreeMap::new();
        let mut per_block_slot: BTreeMap<(usize, SlotId), Vec<VarId>> = BTreeMap::new();
        let mut per_program_prime: BTreeMap<&ProgramId, (LinExpr, u32)> = BTreeMap::new();
        let mut contiguity = LinExpr::new();
        let mut contiguity_norm = 0u32;
        let mut total_required = 0u32;
        let adjacent = self.domain.adjacent_pairs();

        for &cid in scope {
            let class = &self.classes[cid.0];
            let rooms = self.eligible_rooms(class);
            if rooms.is_empty() {
                return Err(DataError::NoEligibleRoom {
                    class: class.to_string(),
                    category: class.category,
                    enrollment: class.enrollment,
                });
            }
            let req = f64::from(class.required_slots);
            total_required += class.required_slots;

            let s = relaxed.then(|| m.binary(format!("s[{}]", cid.0)));
            if let Some(s) = s {
                scheduled.insert(cid, s);
            }

            let mut by_room: BTreeMap<usize, Vec<VarId>> = BTreeMap::new();
            let mut by_slot: BTreeMap<SlotId, Vec<VarId>> = BTreeMap::new();
            let mut by_day: BTreeMap<DayOfWeek, Vec<VarId>> = BTreeMap::new();
            let mut prime = LinExpr::new();
            for slot in self.domain.schedulable() {
                if occupied.block_taken(class.block, slot.id) {
                    continue;
                }
                for &r in &rooms {
                    if occupied.room_taken(r, slot.id) {
                        continue;
                    }
                    let var = m.binary(format!("x[{},{},{}]", cid.0, r, slot.id));
                    assign.push(AssignVar {
                        class: cid,
                        room: r,
                        slot: slot.id,
                        var,
                    });
                    by_room.entry(r).or_default().push(var);
                    by_slot.entry(slot.id).or_default().push(var);
                    by_day.entry(slot.day).or_default().push(var);
                    per_room_slot.entry((r, slot.id)).or_default().push(var);
                    per_block_slot.entry((class.block, slot.id)).or_default().push(var);
                    if slot.prime {
                        prime.add(var, 1.0);
                    }
                }
            }
            let all_x: Vec<VarId> = by_room.values().flatten().copied().collect();

            // Completeness: the full requirement, or nothing in relaxed mode.
            let mut complete = LinExpr::sum(all_x.iter().copied());
            if let Some(s) = s {
                complete.add(s, -req);
                m.add_constraint(format!("complete[{}]", cid.0), complete, Relation::Eq, 0.0);
            } else {
                m.add_constraint(format!("complete[{}]", cid.0), complete, Relation::Eq, req);
            }

            // One room for the whole week.
            if by_room.len() > 1 {
                let mut pick = LinExpr::new();
                for (&r, xs) in &by_room {
                    let y = m.binary(format!("y[{},{}]", cid.0, r));
                    pick.add(y, 1.0);
                    let mut link = LinExpr::sum(xs.iter().copied());
                    link.add(y, -req);
                    m.add_constraint(format!("room_link[{},{}]", cid.0, r), link, Relation::Le, 0.0);
                }
                self.select_one(&mut m, format!("room_pick[{}]", cid.0), pick, s);
            }

            match class.kind {
                CourseKind::SingleDayBlock => {
                    let mut pick = LinExpr::new();
                    for (day, xs) in &by_day {
                        let z = m.binary(format!("z[{},{}]", cid.0, day.code()));
                        pick.add(z, 1.0);
                        let mut link = LinExpr::sum(xs.iter().copied());
                        link.add(z, -req);
                        m.add_constraint(
                            format!("one_day[{},{}]", cid.0, day.code()),
                            link,
                            Relation::Le,
                            0.0,
                        );
                    }
                    if !by_day.is_empty() {
                        self.select_one(&mut m, format!("day_pick[{}]", cid.0), pick, s);
                    }
                }
                _ => {
                    if let Some(cap) = class.max_daily_slots {
                        for (day, xs) in &by_day {
                            if xs.len() > cap as usize {
                                m.add_constraint(
                                    format!("daily_cap[{},{}]", cid.0, day.code()),
                                    LinExpr::sum(xs.iter().copied()),
                                    Relation::Le,
                                    f64::from(cap),
                                );
                            }
                        }
                    }
                }
            }

            // Contiguity: a[t,u] can only be 1 when both neighbours are occupied,
            // so Σx − Σa counts the Class's runs.
            let mut runs = LinExpr::sum(all_x.iter().copied());
            for &(t, u) in &adjacent {
                let (Some(xt), Some(xu)) = (by_slot.get(&t), by_slot.get(&u)) else {
                    continue;
                };
                let a = m.continuous(format!("a[{},{}]", cid.0, t), 0.0, Some(1.0));
                for (side, xs) in [(t, xt), (u, xu)] {
                    let mut e = LinExpr::new();
                    e.add(a, 1.0);
                    for &x in xs {
                        e.add(x, -1.0);
                    }
                    m.add_constraint(
                        format!("adj[{},{},{}]", cid.0, t, side),
                        e,
                        Relation::Le,
                        0.0,
                    );
                }
                runs.add(a, -1.0);
            }
            match s {
                Some(s) => {
                    runs.add(s, -1.0);
                }
                None => runs.constant -= 1.0,
            }
            contiguity.add_expr(&runs, 1.0);
            contiguity_norm += class.required_slots.saturating_sub(1);

            let entry = per_program_prime
                .entry(&class.program)
                .or_insert_with(|| (LinExpr::new(), 0));
            entry.0.add_expr(&prime, 1.0);
            entry.1 += class.required_slots;
        }

        for ((r, t), xs) in &per_room_slot {
            if xs.len() > 1 {
                m.add_constraint(
                    format!("room_once[{r},{t}]"),
                    LinExpr::sum(xs.iter().copied()),
                    Relation::Le,
                    1.0,
                );
            }
        }

        let mut conflicts = LinExpr::new();
        for ((b, t), xs) in &per_block_slot {
            if xs.len() <= 1 {
                continue;
            }
            let mut e = LinExpr::sum(xs.iter().copied());
            if relaxed {
                let k = m.continuous(format!("k[{b},{t}]"), 0.0, None);
                e.add(k, -1.0);
                conflicts.add(k, 1.0);
            }
            m.add_constraint(format!("block_once[{b},{t}]"), e, Relation::Le, 1.0);
        }

        let terms = ObjectiveTerms {
            utilization: self.utilization(&per_room_slot),
            conflicts: scaled(conflicts, total_required),
            idle_time: self.idle_time(&per_room_slot),
            fairness: fairness(&mut m, &per_program_prime),
            contiguity: scaled(contiguity, contiguity_norm),
        };

        debug!(
            classes = scope.len(),
            vars = m.num_vars(),
            constraints = m.num_constraints(),
            assign_vars = assign.len(),
            "sub-problem model built"
        );
        Ok(BuiltModel {
            model: m,
            assign,
            scheduled,
            terms,
            classes: scope.to_vec(),
        })
    }

    fn select_one(&self, m: &mut LinearModel, name: String, mut pick: LinExpr, s: Option<VarId>) {
        match s {
            Some(s) => {
                pick.add(s, -1.0);
                m.add_constraint(name, pick, Relation::Eq, 0.0);
            }
            None => m.add_constraint(name, pick, Relation::Eq, 1.0),
        }
    }

    /// Occupied share of the (room, slot) pairs this scope could use.
    fn utilization(&self, per_room_slot: &BTreeMap<(usize, SlotId), Vec<VarId>>) -> LinExpr {
        let mut u = LinExpr::new();
        if per_room_slot.is_empty() {
            return u;
        }
        let scale = 1.0 / per_room_slot.len() as f64;
        for xs in per_room_slot.values() {
            for &x in xs {
                u.add(x, scale);
            }
        }
        u
    }

    /// `Σ_r w_r (1 − U_r)`, with rooms weighted by their share of seats.
    fn idle_time(&self, per_room_slot: &BTreeMap<(usize, SlotId), Vec<VarId>>) -> LinExpr {
        let mut pairs_per_room: BTreeMap<usize, usize> = BTreeMap::new();
        for (r, _) in per_room_slot.keys() {
            *pairs_per_room.entry(*r).or_default() += 1;
        }
        let seats: f64 = pairs_per_room
            .keys()
            .map(|&r| f64::from(self.instance.rooms[r].capacity))
            .sum();
        if seats <= 0.0 {
            return LinExpr::new();
        }
        let mut idle = LinExpr::constant(1.0);
        for ((r, _), xs) in per_room_slot {
            let w = f64::from(self.instance.rooms[*r].capacity) / seats;
            let scale = w / pairs_per_room[r] as f64;
            for &x in xs {
                idle.add(x, -scale);
            }
        }
        idle
    }
}

fn scaled(expr: LinExpr, norm: u32) -> LinExpr {
    if norm == 0 {
        return LinExpr::new();
    }
    let mut out = LinExpr::new();
    out.add_expr(&expr, 1.0 / f64::from(norm));
    out
}

/// `1 − mean |share_p − mean share|` over programs' prime-time shares.
fn fairness(m: &mut LinearModel, per_program: &BTreeMap<&ProgramId, (LinExpr, u32)>) -> LinExpr {
    let shares: Vec<(&ProgramId, LinExpr)> = per_program
        .iter()
        .filter(|(_, (_, req))| *req > 0)
        .map(|(p, (prime, req))| {
            let mut share = LinExpr::new();
            share.add_expr(prime, 1.0 / f64::from(*req));
            (*p, share)
        })
        .collect();
    if shares.len() < 2 {
        return LinExpr::constant(1.0);
    }
    let n = shares.len() as f64;
    let mut mean = LinExpr::new();
    for (_, share) in &shares {
        mean.add_expr(share, 1.0 / n);
    }
    let mut f = LinExpr::constant(1.0);
    for (p, share) in &shares {
        let d = m.continuous(format!("dev[{p}]"), 0.0, Some(1.0));
        // d ≥ share − mean and d ≥ mean − share
        for (sign, tag) in [(1.0, "hi"), (-1.0, "lo")] {
            let mut e = LinExpr::new();
            e.add(d, 1.0);
            e.add_expr(share, -sign);
            e.add_expr(&mean, sign);
            m.add_constraint(format!("dev_{tag}[{p}]"), e, Relation::Ge, 0.0);
        }
        f.add(d, -1.0 / n);
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::expand_classes;
    use crate::lp::VarKind;
    use tt_types::{
        Block, ClassRules, ClockTime, Course, Room, RoomCategory, TimeDomainConfig,
    };

    fn course(code: &str, program: &str, hours: f64, category: RoomCategory, kind: CourseKind) -> Course {
        Course {
            code: code.into(),
            title: code.into(),
            program: program.into(),
            year: 1,
            lecture_hours: hours,
            lab_hours: 0.0,
            units: hours,
            room_category: category,
            kind,
        }
    }

    fn room(id: &str, capacity: u32, category: RoomCategory) -> Room {
        Room {
            id: id.into(),
            building: None,
            floor: None,
            capacity,
            category,
            equipment: vec![],
        }
    }

    fn block(program: &str, students: u32) -> Block {
        Block {
            program: program.into(),
            year: 1,
            section: "A".into(),
            students,
        }
    }

    fn domain() -> TimeDomain {
        TimeDomain::generate(&TimeDomainConfig {
            days: vec![DayOfWeek::Mon, DayOfWeek::Tue],
            day_start: ClockTime::hm(8, 0),
            day_end: ClockTime::hm(13, 0),
            slot_minutes: 60,
            excluded: vec![],
            ..TimeDomainConfig::default()
        })
        .unwrap()
    }

    fn setup(inst: &Instance, d: &TimeDomain) -> Vec<Class> {
        expand_classes(inst, d, &ClassRules::default()).unwrap()
    }

    fn all(classes: &[Class]) -> Vec<ClassId> {
        classes.iter().map(|c| c.id).collect()
    }

    #[test]
    fn pruning_skips_wrong_category_and_small_rooms() {
        let inst = Instance {
            courses: vec![course("IT1", "IT", 2.0, RoomCategory::Lab, CourseKind::Regular)],
            blocks: vec![block("IT", 30)],
            rooms: vec![
                room("L1", 40, RoomCategory::Lab),
                room("L2", 20, RoomCategory::Lab),
                room("C1", 40, RoomCategory::NonLab),
            ],
        };
        let d = domain();
        let classes = setup(&inst, &d);
        let b = ModelBuilder::new(&inst, &d, &classes, ModelMode::Strict).unwrap();
        assert_eq!(b.eligible_rooms(&classes[0]), vec![0]);
        let built = b.build(&all(&classes), &Occupancy::new()).unwrap();
        assert_eq!(built.assign.len(), 10);
        assert!(built.assign.iter().all(|a| a.room == 0));
        // single eligible room: no room-choice variables
        assert!(built.model.vars().iter().all(|v| !v.name.starts_with("y[")));
    }

    #[test]
    fn no_eligible_room_is_a_data_error() {
        let inst = Instance {
            courses: vec![course("IT1", "IT", 2.0, RoomCategory::Networking, CourseKind::Regular)],
            blocks: vec![block("IT", 30)],
            rooms: vec![room("C1", 40, RoomCategory::NonLab)],
        };
        let d = domain();
        let classes = setup(&inst, &d);
        let b = ModelBuilder::new(&inst, &d, &classes, ModelMode::Strict).unwrap();
        let err = b.build(&all(&classes), &Occupancy::new()).unwrap_err();
        assert!(matches!(err, DataError::NoEligibleRoom { class, .. } if class == "IT1@IT-1A"));
    }

    #[test]
    fn malformed_rooms_fail_fast() {
        let d = domain();
        let inst = Instance {
            rooms: vec![room("C1", 0, RoomCategory::NonLab)],
            ..Instance::default()
        };
        assert!(matches!(
            ModelBuilder::new(&inst, &d, &[], ModelMode::Strict),
            Err(DataError::MalformedRoom { .. })
        ));
        let inst = Instance {
            rooms: vec![room("C1", 10, RoomCategory::NonLab), room("C1", 10, RoomCategory::NonLab)],
            ..Instance::default()
        };
        assert!(ModelBuilder::new(&inst, &d, &[], ModelMode::Strict).is_err());
    }

    #[test]
    fn occupied_pairs_are_pruned() {
        let inst = Instance {
            courses: vec![course("IT1", "IT", 2.0, RoomCategory::NonLab, CourseKind::Regular)],
            blocks: vec![block("IT", 30)],
            rooms: vec![room("C1", 40, RoomCategory::NonLab)],
        };
        let d = domain();
        let classes = setup(&inst, &d);
        let mut occ = Occupancy::new();
        let p = Placement {
            class: ClassId(42),
            room: 0,
            slots: vec![SlotId(0), SlotId(1)],
        };
        occ.absorb([(&p, 7)]).unwrap();
        let b = ModelBuilder::new(&inst, &d, &classes, ModelMode::Strict).unwrap();
        let built = b.build(&all(&classes), &occ).unwrap();
        assert_eq!(built.assign.len(), 8);
        assert!(built.assign.iter().all(|a| a.slot != SlotId(0) && a.slot != SlotId(1)));
    }

    #[test]
    fn hand_assignment_satisfies_strict_model() {
        let inst = Instance {
            courses: vec![
                course("IT1", "IT", 3.0, RoomCategory::NonLab, CourseKind::Regular),
                course("IT2", "IT", 3.0, RoomCategory::NonLab, CourseKind::Regular),
            ],
            blocks: vec![block("IT", 30)],
            rooms: vec![room("C1", 40, RoomCategory::NonLab)],
        };
        let d = domain();
        let classes = setup(&inst, &d);
        let b = ModelBuilder::new(&inst, &d, &classes, ModelMode::Strict).unwrap();
        let built = b.build(&all(&classes), &Occupancy::new()).unwrap();
        let m = &built.model;

        // IT1 on Monday 08-11, IT2 on Tuesday 08-11, adjacency vars maximal
        let mut values = vec![0.0; m.num_vars()];
        for a in &built.assign {
            let on = (a.class == ClassId(0) && a.slot.0 < 3)
                || (a.class == ClassId(1) && (5..8).contains(&a.slot.0));
            if on {
                values[a.var.0] = 1.0;
            }
        }
        for (i, def) in m.vars().iter().enumerate() {
            if let (true, VarKind::Continuous { .. }) = (def.name.starts_with("a["), def.kind) {
                let inner = &def.name[2..def.name.len() - 1];
                let (c, t) = inner.split_once(',').unwrap();
                let (c, t): (usize, usize) = (c.parse().unwrap(), t.parse().unwrap());
                if values_on(&built, &values, c, t) && values_on(&built, &values, c, t + 1) {
                    values[i] = 1.0;
                }
            }
        }
        let asg = Assignment(values);
        assert!(m.check(&asg, 1e-9).is_empty());
        let decoded = built.decode(&asg);
        assert_eq!(decoded.placements.len(), 2);
        assert!(decoded.unscheduled.is_empty());
        // two contiguous runs of three
        assert!(built.terms.contiguity.evaluate(&asg).abs() < 1e-9);
        assert!((built.terms.utilization.evaluate(&asg) - 0.6).abs() < 1e-9);
        assert!((built.terms.idle_time.evaluate(&asg) - 0.4).abs() < 1e-9);

        // double-booking the room breaks the model
        let mut bad = asg.0.clone();
        let clash = built
            .assign
            .iter()
            .find(|a| a.class == ClassId(1) && a.slot == SlotId(0))
            .unwrap();
        bad[clash.var.0] = 1.0;
        assert!(!m.check(&Assignment(bad), 1e-9).is_empty());
    }

    fn values_on(built: &BuiltModel, values: &[f64], class: usize, slot: usize) -> bool {
        built
            .assign
            .iter()
            .any(|a| a.class == ClassId(class) && a.slot == SlotId(slot) && values[a.var.0] > 0.5)
    }

    #[test]
    fn relaxed_mode_allows_empty_assignment() {
        let inst = Instance {
            courses: vec![
                course("IT1", "IT", 3.0, RoomCategory::NonLab, CourseKind::Regular),
                course("IT2", "IT", 3.0, RoomCategory::NonLab, CourseKind::Regular),
            ],
            blocks: vec![block("IT", 30)],
            rooms: vec![room("C1", 40, RoomCategory::NonLab), room("C2", 40, RoomCategory::NonLab)],
        };
        let d = domain();
        let classes = setup(&inst, &d);
        let b = ModelBuilder::new(&inst, &d, &classes, ModelMode::Relaxed).unwrap();
        let built = b.build(&all(&classes), &Occupancy::new()).unwrap();
        assert_eq!(built.scheduled.len(), 2);
        assert!(built.model.vars().iter().any(|v| v.name.starts_with("k[")));
        let zero = Assignment(vec![0.0; built.model.num_vars()]);
        assert!(built.model.check(&zero, 1e-9).is_empty());
        let decoded = built.decode(&zero);
        assert_eq!(decoded.unscheduled, vec![ClassId(0), ClassId(1)]);
        assert!(built.terms.contiguity.evaluate(&zero).abs() < 1e-9);
        assert!(built.terms.conflicts.evaluate(&zero).abs() < 1e-9);
    }

    #[test]
    fn strict_model_rejects_partial_class() {
        let inst = Instance {
            courses: vec![course("IT1", "IT", 2.0, RoomCategory::NonLab, CourseKind::SingleDayBlock)],
            blocks: vec![block("IT", 30)],
            rooms: vec![room("C1", 40, RoomCategory::NonLab)],
        };
        let d = domain();
        let classes = setup(&inst, &d);
        let b = ModelBuilder::new(&inst, &d, &classes, ModelMode::Strict).unwrap();
        let built = b.build(&all(&classes), &Occupancy::new()).unwrap();
        assert!(built.model.vars().iter().any(|v| v.name.starts_with("z[")));
        let zero = Assignment(vec![0.0; built.model.num_vars()]);
        let violations = built.model.check(&zero, 1e-9);
        assert!(violations.contains(&"complete[0]".to_string()));
    }

    #[test]
    fn fairness_is_constant_for_one_program() {
        let inst = Instance {
            courses: vec![course("IT1", "IT", 2.0, RoomCategory::NonLab, CourseKind::Regular)],
            blocks: vec![block("IT", 30)],
            rooms: vec![room("C1", 40, RoomCategory::NonLab)],
        };
        let d = domain();
        let classes = setup(&inst, &d);
        let b = ModelBuilder::new(&inst, &d, &classes, ModelMode::Strict).unwrap();
        let built = b.build(&all(&classes), &Occupancy::new()).unwrap();
        assert!(built.terms.fairness.is_constant());
        assert_eq!(built.terms.fairness.constant, 1.0);
    }

    #[test]
    fn fairness_adds_deviation_per_program() {
        let inst = Instance {
            courses: vec![
                course("IT1", "IT", 2.0, RoomCategory::NonLab, CourseKind::Regular),
                course("CS1", "CS", 2.0, RoomCategory::NonLab, CourseKind::Regular),
            ],
            blocks: vec![block("IT", 30), block("CS", 30)],
            rooms: vec![room("C1", 40, RoomCategory::NonLab)],
        };
        let d = domain();
        let classes = setup(&inst, &d);
        let b = ModelBuilder::new(&inst, &d, &classes, ModelMode::Strict).unwrap();
        let built = b.build(&all(&classes), &Occupancy::new()).unwrap();
        let devs: Vec<_> = built
            .model
            .vars()
            .iter()
            .filter(|v| v.name.starts_with("dev["))
            .collect();
        assert_eq!(devs.len(), 2);
        assert!(!built.terms.fairness.is_constant());
    }
}

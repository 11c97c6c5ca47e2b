use std::collections::{BTreeMap, HashMap, HashSet};

use tt_types::{DayOfWeek, Instance, Metrics, SlotId};

use crate::classes::Class;
use crate::occupancy::Placement;
use crate::time_domain::TimeDomain;

fn pct(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        100.0 * num / den
    } else {
        0.0
    }
}

/// Run-level metrics over the merged placements of all accepted sub-problems.
pub fn compute_metrics(
    instance: &Instance,
    domain: &TimeDomain,
    classes: &[Class],
    placements: &[Placement],
    unscheduled: usize,
) -> Metrics {
    let supply = (instance.rooms.len() * domain.schedulable_count()) as f64;

    let mut room_pairs: HashSet<(usize, SlotId)> = HashSet::new();
    let mut per_block_slot: HashMap<(usize, SlotId), usize> = HashMap::new();
    let mut program_slots: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for p in placements {
        let class = &classes[p.class.0];
        let counts = program_slots.entry(class.program.0.clone()).or_default();
        for &s in &p.slots {
            room_pairs.insert((p.room, s));
            *per_block_slot.entry((class.block, s)).or_default() += 1;
            counts.0 += 1;
            if domain.slot(s).prime {
                counts.1 += 1;
            }
        }
    }

    let assigned: usize = program_slots.values().map(|(n, _)| n).sum();
    let utilization_pct = pct(room_pairs.len() as f64, supply);

    let program_share_pct = program_slots
        .iter()
        .map(|(p, (n, _))| (p.clone(), pct(*n as f64, assigned as f64)))
        .collect();
    let program_prime_pct = program_slots
        .iter()
        .map(|(p, (n, prime))| (p.clone(), pct(*prime as f64, *n as f64)))
        .collect();

    let block_clashes = per_block_slot.values().map(|n| n.saturating_sub(1)).sum();

    // windows: per block-day, occupied runs beyond the first
    let mut block_days: HashMap<(usize, DayOfWeek), Vec<SlotId>> = HashMap::new();
    for &(b, s) in per_block_slot.keys() {
        block_days.entry((b, domain.slot(s).day)).or_default().push(s);
    }
    let mut block_windows = 0i64;
    for slots in block_days.values_mut() {
        slots.sort_unstable();
        let gaps = slots
            .windows(2)
            .filter(|w| free_between(domain, w[0], w[1]))
            .count();
        block_windows += gaps as i64;
    }

    Metrics {
        utilization_pct,
        idle_pct: if supply > 0.0 { 100.0 - utilization_pct } else { 0.0 },
        program_share_pct,
        program_prime_pct,
        unscheduled_classes: unscheduled,
        block_windows,
        block_clashes,
    }
}

// Excluded slots (lunch) between two classes do not make a window.
fn free_between(domain: &TimeDomain, a: SlotId, b: SlotId) -> bool {
    (a.0 + 1..b.0).any(|i| domain.slot(SlotId(i)).schedulable())
}

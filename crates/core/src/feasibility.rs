use std::collections::BTreeMap;

use tt_types::{
    BlockLoad, CategoryBalance, FeasibilityReport, FeasibilityVerdict, Instance, RoomCategory, SlotId,
};

use crate::classes::Class;
use crate::occupancy::Occupancy;
use crate::time_domain::TimeDomain;

/// Demand above this share of supply is flagged even when it still fits.
pub const HIGH_UTILIZATION: f64 = 0.85;

/// Compares required room-hours per category with the free room-hours of that
/// category, and each Block's weekly load with its free slots.
///
/// A deficit means the scope cannot be solved; the converse does not hold.
pub fn estimate<'a>(
    scope: &str,
    instance: &Instance,
    domain: &TimeDomain,
    classes: impl IntoIterator<Item = &'a Class>,
    occupied: &Occupancy,
) -> FeasibilityReport {
    let slot_hours = domain.slot_hours();
    let mut demand: BTreeMap<RoomCategory, f64> = BTreeMap::new();
    let mut block_demand: BTreeMap<usize, f64> = BTreeMap::new();
    for c in classes {
        *demand.entry(c.category).or_default() += c.required_hours();
        *block_demand.entry(c.block).or_default() += c.required_hours();
    }

    let mut categories = Vec::with_capacity(demand.len());
    let mut high_utilization = Vec::new();
    for (&category, &required) in &demand {
        let free_pairs: usize = instance
            .rooms
            .iter()
            .enumerate()
            .filter(|(_, r)| r.category == category)
            .map(|(ri, _)| {
                domain
                    .schedulable()
                    .filter(|s| !occupied.room_taken(ri, s.id))
                    .count()
            })
            .sum();
        let available = free_pairs as f64 * slot_hours;
        let utilization = (available > 0.0).then(|| required / available);
        if utilization.is_some_and(|u| u > HIGH_UTILIZATION && u <= 1.0) {
            high_utilization.push(category);
        }
        categories.push(CategoryBalance {
            category,
            required_hours: required,
            available_hours: available,
            surplus_hours: available - required,
            utilization,
        });
    }

    let mut overloaded_blocks = Vec::new();
    for (&bi, &required) in &block_demand {
        let free = domain
            .schedulable()
            .filter(|s| !occupied.block_taken(bi, s.id))
            .count() as f64
            * slot_hours;
        if required > free {
            overloaded_blocks.push(BlockLoad {
                block: instance.blocks[bi].key(),
                required_hours: required,
                available_hours: free,
            });
        }
    }

    let verdict = if categories.iter().any(|c| c.is_deficit()) || !overloaded_blocks.is_empty() {
        FeasibilityVerdict::LikelyInfeasible
    } else {
        FeasibilityVerdict::LikelyFeasible
    };
    FeasibilityReport {
        scope: scope.to_string(),
        verdict,
        categories,
        overloaded_blocks,
        high_utilization,
    }
}

/// Lab (room, slot) pairs a scope must leave free for the scopes after it.
///
/// Per lab category, `ratio` of the later scopes' slot demand is held back,
/// prime slots first, but never so much that the current scope's own demand
/// in that category no longer fits.
pub fn lab_reserve<'a>(
    instance: &Instance,
    domain: &TimeDomain,
    current: impl IntoIterator<Item = &'a Class>,
    later: impl IntoIterator<Item = &'a Class>,
    occupied: &Occupancy,
    ratio: f64,
) -> Vec<(usize, SlotId)> {
    let mut later_demand: BTreeMap<RoomCategory, u32> = BTreeMap::new();
    for c in later.into_iter().filter(|c| c.category.is_lab()) {
        *later_demand.entry(c.category).or_default() += c.required_slots;
    }
    let mut current_demand: BTreeMap<RoomCategory, u32> = BTreeMap::new();
    for c in current {
        *current_demand.entry(c.category).or_default() += c.required_slots;
    }

    let mut held = Vec::new();
    for (&category, &demand) in &later_demand {
        let want = (ratio * f64::from(demand)).ceil() as usize;
        let mut free: Vec<_> = instance
            .rooms
            .iter()
            .enumerate()
            .filter(|(_, r)| r.category == category)
            .flat_map(|(ri, _)| {
                domain
                    .schedulable()
                    .filter(move |s| !occupied.room_taken(ri, s.id))
                    .map(move |s| (ri, s))
            })
            .collect();
        free.sort_by_key(|&(ri, s)| (!s.prime, s.day, s.period, ri));
        let needed_now = current_demand.get(&category).copied().unwrap_or(0) as usize;
        let spare = free.len().saturating_sub(needed_now);
        held.extend(free.into_iter().take(want.min(spare)).map(|(ri, s)| (ri, s.id)));
    }
    held
}

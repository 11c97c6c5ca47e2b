use std::collections::BTreeSet;

use tt_types::{FixedBooking, Instance, SlotId};

use crate::classes::ClassId;
use crate::error::DataError;
use crate::time_domain::TimeDomain;

/// A Class placed in one room over a set of slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub class: ClassId,
    pub room: usize,
    pub slots: Vec<SlotId>,
}

/// (room, slot) and (block, slot) pairs consumed by accepted sub-problems.
///
/// Threaded through a sequential run; later sub-problems treat every pair as
/// unavailable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Occupancy {
    rooms: BTreeSet<(usize, SlotId)>,
    blocks: BTreeSet<(usize, SlotId)>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Overlap {
    pub room: usize,
    pub slot: SlotId,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_taken(&self, room: usize, slot: SlotId) -> bool {
        self.rooms.contains(&(room, slot))
    }

    pub fn block_taken(&self, block: usize, slot: SlotId) -> bool {
        self.blocks.contains(&(block, slot))
    }

    pub fn room_pairs(&self) -> usize {
        self.rooms.len()
    }

    pub fn block_pairs(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty() && self.blocks.is_empty()
    }

    /// Marks a (room, slot) pair as taken. Returns `false` if it already was.
    pub fn hold_room(&mut self, room: usize, slot: SlotId) -> bool {
        self.rooms.insert((room, slot))
    }

    pub fn hold_block(&mut self, block: usize, slot: SlotId) -> bool {
        self.blocks.insert((block, slot))
    }

    pub fn rooms(&self) -> impl Iterator<Item = &(usize, SlotId)> {
        self.rooms.iter()
    }

    pub fn is_superset_of(&self, other: &Occupancy) -> bool {
        self.rooms.is_superset(&other.rooms) && self.blocks.is_superset(&other.blocks)
    }

    /// Adds a sub-problem's placements. Nothing is added if any room pair is
    /// already taken.
    pub fn absorb<'a>(
        &mut self,
        placements: impl IntoIterator<Item = (&'a Placement, usize)> + Clone,
    ) -> Result<(), Overlap> {
        let mut fresh = BTreeSet::new();
        for (p, _) in placements.clone() {
            for &slot in &p.slots {
                if self.room_taken(p.room, slot) || !fresh.insert((p.room, slot)) {
                    return Err(Overlap { room: p.room, slot });
                }
            }
        }
        self.rooms.extend(fresh);
        for (p, block) in placements {
            self.blocks.extend(p.slots.iter().map(|&s| (block, s)));
        }
        Ok(())
    }
}

/// Resolves bookings made outside the run into the starting occupancy.
pub fn from_bookings(
    instance: &Instance,
    domain: &TimeDomain,
    bookings: &[FixedBooking],
) -> Result<Occupancy, DataError> {
    let mut occ = Occupancy::new();
    for b in bookings {
        let room = instance
            .rooms
            .iter()
            .position(|r| r.id == b.room)
            .ok_or_else(|| DataError::UnknownRoom(b.room.to_string()))?;
        let block = match &b.block {
            Some(key) => Some(
                instance
                    .blocks
                    .iter()
                    .position(|bl| bl.key() == *key)
                    .ok_or_else(|| DataError::UnknownBlock(key.to_string()))?,
            ),
            None => None,
        };
        let mut covered = 0;
        for slot in domain.slots().iter().filter(|s| s.overlaps(b.day, b.start, b.end)) {
            occ.hold_room(room, slot.id);
            if let Some(bi) = block {
                occ.hold_block(bi, slot.id);
            }
            covered += 1;
        }
        if covered == 0 {
            return Err(DataError::BookingOutsideDomain {
                room: b.room.to_string(),
                day: b.day,
                start: b.start,
                end: b.end,
            });
        }
    }
    Ok(occ)
}

//! Half-cell bucket grid used to gather collision candidates.

use glam::Vec2;
use maze_dungeon_core::{EntityId, Room, HALF_CELL};

/// Anything that can sit in a spatial bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Occupant {
    Player,
    Entity(EntityId),
}

/// Buckets covering one room at slot resolution.
#[derive(Clone, Debug)]
pub(crate) struct SpatialGrid {
    origin: Vec2,
    columns: u32,
    rows: u32,
    buckets: Vec<Vec<Occupant>>,
}

impl SpatialGrid {
    pub(crate) fn new(room: &Room) -> Self {
        let columns = room.slot_columns();
        let rows = room.slot_rows();
        let len = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            origin: room.origin(),
            columns,
            rows,
            buckets: vec![Vec::new(); len],
        }
    }

    fn bucket_of(&self, position: Vec2) -> Option<(i64, i64)> {
        let local = (position - self.origin) / HALF_CELL;
        if !local.is_finite() {
            return None;
        }
        Some((local.x.floor() as i64, local.y.floor() as i64))
    }

    fn index(&self, column: i64, row: i64) -> Option<usize> {
        let column = u32::try_from(column).ok()?;
        let row = u32::try_from(row).ok()?;
        if column < self.columns && row < self.rows {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    /// Drops the occupant into the bucket under `position`. Out-of-range positions are ignored.
    pub(crate) fn insert(&mut self, occupant: Occupant, position: Vec2) {
        let Some((column, row)) = self.bucket_of(position) else {
            return;
        };
        if let Some(bucket) = self
            .index(column, row)
            .and_then(|index| self.buckets.get_mut(index))
        {
            bucket.push(occupant);
        }
    }

    pub(crate) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Occupants of the 3×3 block of buckets around `position`.
    pub(crate) fn neighbours(&self, position: Vec2) -> Vec<Occupant> {
        let Some((column, row)) = self.bucket_of(position) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(bucket) = self
                    .index(column + dx, row + dy)
                    .and_then(|index| self.buckets.get(index))
                {
                    found.extend(bucket.iter().copied());
                }
            }
        }
        found
    }

    /// Every occupant in bucket order.
    pub(crate) fn occupants(&self) -> impl Iterator<Item = Occupant> + '_ {
        self.buckets.iter().flat_map(|bucket| bucket.iter().copied())
    }
}

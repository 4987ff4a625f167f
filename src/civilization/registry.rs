//! Registry of point-like civilizations keyed by grid cell
//!
//! At most one living civilization occupies a cell. Emergence into an
//! occupied cell is discarded. A supernova whose lethal sphere covers a
//! civilization's cell centre extinguishes it; extinction is terminal and the
//! record is moved to the extinct history.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::types::{CellIndex, Interval, Vec3};
use crate::galaxy::grid::GalaxyGrid;
use crate::galaxy::impact::ImpactEngine;
use crate::galaxy::sampling::Event;

/// Unique identifier for civilizations, assigned in emergence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CivilizationId(pub u64);

/// Lifecycle state; `Extinct` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CivState {
    Alive,
    Extinct { at: Interval },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Civilization {
    pub id: CivilizationId,
    pub cell: CellIndex,
    /// Sampled emergence position (inside `cell`)
    pub position: Vec3,
    pub emerged_at: Interval,
    pub state: CivState,
}

impl Civilization {
    pub fn is_alive(&self) -> bool {
        self.state == CivState::Alive
    }

    pub fn extinct_at(&self) -> Option<Interval> {
        match self.state {
            CivState::Alive => None,
            CivState::Extinct { at } => Some(at),
        }
    }
}

/// Result of an emergence attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emergence {
    Emerged(CivilizationId),
    /// The cell already holds this living civilization; the event is dropped
    Occupied(CivilizationId),
}

#[derive(Debug, Default)]
pub struct CivilizationRegistry {
    living: AHashMap<CellIndex, Civilization>,
    extinct: Vec<Civilization>,
    next_id: u64,
    doomed: Vec<CellIndex>,
}

impl CivilizationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn living_count(&self) -> usize {
        self.living.len()
    }

    pub fn extinct_count(&self) -> usize {
        self.extinct.len()
    }

    /// Total civilizations that ever emerged
    pub fn emerged_count(&self) -> u64 {
        self.next_id
    }

    pub fn get(&self, cell: CellIndex) -> Option<&Civilization> {
        self.living.get(&cell)
    }

    /// Living civilizations sorted by id
    pub fn living(&self) -> Vec<&Civilization> {
        let mut civs: Vec<_> = self.living.values().collect();
        civs.sort_by_key(|c| c.id);
        civs
    }

    /// Extinct civilizations in extinction order
    pub fn extinct(&self) -> &[Civilization] {
        &self.extinct
    }

    /// Create a civilization at the event's cell unless one already lives there
    pub fn emerge(&mut self, event: &Event) -> Emergence {
        if let Some(existing) = self.living.get(&event.cell) {
            trace!(
                "Emergence at {:?} discarded: cell held by {:?}",
                event.cell,
                existing.id
            );
            return Emergence::Occupied(existing.id);
        }

        let id = CivilizationId(self.next_id);
        self.next_id += 1;
        self.living.insert(
            event.cell,
            Civilization {
                id,
                cell: event.cell,
                position: event.position,
                emerged_at: event.interval,
                state: CivState::Alive,
            },
        );
        trace!("Civilization {:?} emerged at {:?}", id, event.cell);
        Emergence::Emerged(id)
    }

    /// Extinguish every living civilization inside the lethal sphere at `center`
    ///
    /// Returns the number of civilizations extinguished by this event.
    pub fn extinguish_within(
        &mut self,
        grid: &GalaxyGrid,
        engine: &ImpactEngine,
        center: Vec3,
        interval: Interval,
    ) -> usize {
        if self.living.is_empty() {
            return 0;
        }

        self.doomed.clear();
        let window = engine.window(grid, center);

        // Scan whichever side is smaller: the window cells or the living set
        if window.volume() < self.living.len() {
            for i in window.i.clone() {
                for j in window.j.clone() {
                    for k in window.k.clone() {
                        let cell = CellIndex::new(i, j, k);
                        if self.living.contains_key(&cell) && engine.covers(grid, center, cell) {
                            self.doomed.push(cell);
                        }
                    }
                }
            }
        } else {
            self.doomed.extend(
                self.living
                    .keys()
                    .copied()
                    .filter(|&cell| engine.covers(grid, center, cell)),
            );
            self.doomed.sort_unstable();
        }

        for cell in &self.doomed {
            if let Some(mut civ) = self.living.remove(cell) {
                civ.state = CivState::Extinct { at: interval };
                trace!("Civilization {:?} extinguished at {:?}", civ.id, cell);
                self.extinct.push(civ);
            }
        }

        self.doomed.len()
    }
}

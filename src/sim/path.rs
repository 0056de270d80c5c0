//! Ball path through the placements
//!
//! `prev`/`next` links record the pieces the ball has rolled through. The
//! links always form a simple chain ending at the ball's current piece.

use std::collections::HashSet;

use super::board::GameBoard;
use super::placement::{Catalog, PlacementId};
use crate::error::LevelError;

/// How a cell change altered the path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathChange {
    /// The ball rolled back into the piece it came from
    Backtracked,
    /// The ball re-entered its own path; the pieces after the entry point were freed
    LoopReleased { released: usize },
    /// The ball entered a fresh piece
    Extended,
}

impl Catalog {
    /// Update the links for the ball rolling from `old` into `new`
    pub fn link_transition(&mut self, old: PlacementId, new: PlacementId) -> PathChange {
        let change = match self[new].next {
            Some(next) if next == old => {
                self[old].prev = None;
                self[new].next = None;
                PathChange::Backtracked
            }
            Some(next) => {
                let released = self.release_from(next, old);
                self[new].next = None;
                PathChange::LoopReleased { released }
            }
            None => {
                self[new].prev = Some(old);
                self[old].next = Some(new);
                PathChange::Extended
            }
        };
        self[old].refresh_render_ref();
        self[new].refresh_render_ref();
        log::debug!("path {:?}: {:?} -> {:?}", change, old, new);
        change
    }

    /// Unlink every piece from `first` forward through `last`
    fn release_from(&mut self, first: PlacementId, last: PlacementId) -> usize {
        let mut visited = HashSet::new();
        let mut cursor = Some(first);
        while let Some(id) = cursor {
            if !visited.insert(id) {
                log::warn!("path walk revisited {:?}; links were cyclic", id);
                break;
            }
            cursor = if id == last { None } else { self[id].next };
            let placement = &mut self[id];
            placement.prev = None;
            placement.next = None;
            placement.refresh_render_ref();
        }
        visited.len()
    }

    /// Walk `next` links from `start`, stopping if a piece repeats
    ///
    /// Returns the visited pieces and whether the walk ran into a cycle.
    pub fn walk_forward(&self, start: PlacementId) -> (Vec<PlacementId>, bool) {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if !seen.insert(id) {
                return (order, true);
            }
            order.push(id);
            cursor = self.get(id).and_then(|p| p.next);
        }
        (order, false)
    }

    /// True when every chain of links is simple and prev/next agree
    pub fn path_is_consistent(&self) -> bool {
        self.iter().all(|(id, p)| {
            let next_ok = p.next.is_none_or(|n| self.get(n).is_some_and(|q| q.prev == Some(id)));
            let prev_ok = p.prev.is_none_or(|n| self.get(n).is_some_and(|q| q.next == Some(id)));
            next_ok && prev_ok && !self.walk_forward(id).1
        })
    }

    /// Clear every link, used when a level is torn down
    pub fn clear_path(&mut self) {
        for id in self.ids() {
            let placement = &mut self[id];
            placement.prev = None;
            placement.next = None;
            placement.refresh_render_ref();
        }
    }
}

impl GameBoard {
    /// Relink an ordered list of cells, root first, into the ball path
    pub fn restore_path(&mut self, cells: &[(u32, u32)]) -> Result<(), LevelError> {
        if cells.len() < 2 {
            return Ok(());
        }
        let mut ids = Vec::with_capacity(cells.len());
        for (i, &(row, col)) in cells.iter().enumerate() {
            if i > 0 {
                let (prow, pcol) = cells[i - 1];
                if prow.abs_diff(row) + pcol.abs_diff(col) != 1 {
                    return Err(LevelError::InvalidPath(format!(
                        "({prow}, {pcol}) and ({row}, {col}) are not adjacent"
                    )));
                }
            }
            let id = self
                .primary_at(row, col)
                .ok_or_else(|| LevelError::InvalidPath(format!("({row}, {col}) is empty")))?;
            if ids.contains(&id) {
                return Err(LevelError::InvalidPath(format!(
                    "({row}, {col}) appears twice"
                )));
            }
            ids.push(id);
        }
        for pair in ids.windows(2) {
            self.catalog[pair[0]].next = Some(pair[1]);
            self.catalog[pair[1]].prev = Some(pair[0]);
        }
        for &id in &ids {
            self.catalog[id].refresh_render_ref();
        }
        log::debug!("restored a path of {} pieces", ids.len());
        Ok(())
    }

    /// Cells of the path ending at the piece in `(row, col)`, root first
    pub fn locked_path(&self, row: u32, col: u32) -> Vec<(u32, u32)> {
        let Some(tail) = self.primary_at(row, col) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut cells = Vec::new();
        let mut cursor = Some(tail);
        while let Some(id) = cursor {
            if !seen.insert(id) {
                log::warn!("path export revisited {:?}", id);
                break;
            }
            let placement = &self.catalog[id];
            cells.push((placement.row, placement.col));
            cursor = placement.prev;
        }
        if cells.len() < 2 {
            return Vec::new();
        }
        cells.reverse();
        cells
    }
}

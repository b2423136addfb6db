//! Append-only evidence grid shared across frames.

use rover_vision_core::RgbImage;
use serde::{Deserialize, Serialize};

use crate::world::WorldCells;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapChannel {
    Obstacle,
    Target,
    Navigable,
}

impl MapChannel {
    pub const ALL: [MapChannel; 3] = [
        MapChannel::Obstacle,
        MapChannel::Target,
        MapChannel::Navigable,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            MapChannel::Obstacle => 0,
            MapChannel::Target => 1,
            MapChannel::Navigable => 2,
        }
    }
}

/// `size x size` grid with one counter per channel per cell.
///
/// Counters only ever grow; there is no decay and no conflict resolution
/// between channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldMap {
    size: usize,
    cells: Vec<[u64; 3]>,
}

impl WorldMap {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![[0; 3]; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Evidence at cell `(x, y)`; `None` outside the grid.
    pub fn get(&self, channel: MapChannel, x: usize, y: usize) -> Option<u64> {
        if x >= self.size || y >= self.size {
            return None;
        }
        Some(self.cells[y * self.size + x][channel.index()])
    }

    /// Add `weight` once per entry in `cells`; repeated cells accumulate.
    /// Returns the number of increments applied.
    pub fn accumulate(&mut self, channel: MapChannel, cells: &WorldCells, weight: u64) -> usize {
        let c = channel.index();
        let mut applied = 0;
        for (x, y) in cells.iter() {
            if x >= self.size || y >= self.size {
                continue;
            }
            let v = &mut self.cells[y * self.size + x][c];
            *v = v.saturating_add(weight);
            applied += 1;
        }
        applied
    }

    /// Number of cells with non-zero evidence in `channel`.
    pub fn touched_cells(&self, channel: MapChannel) -> usize {
        let c = channel.index();
        self.cells.iter().filter(|cell| cell[c] > 0).count()
    }

    /// Display copy: R = obstacle, G = target, B = navigable, each clamped to 255.
    /// Image row `y` is map row `y`.
    pub fn to_display_rgb(&self) -> RgbImage {
        let mut img = RgbImage::new(self.size, self.size);
        for (dst, cell) in img.data.chunks_exact_mut(3).zip(&self.cells) {
            for c in 0..3 {
                dst[c] = cell[c].min(255) as u8;
            }
        }
        img
    }
}

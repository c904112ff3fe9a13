use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Integer grid coordinate of a square chunk of space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing `pos`. Uses floor division so negative positions
    /// land in negative chunks.
    pub fn of(pos: Vec2, chunk_size: f32) -> Self {
        Self {
            x: (pos.x / chunk_size).floor() as i32,
            y: (pos.y / chunk_size).floor() as i32,
        }
    }

    /// Chebyshev distance in chunks.
    pub fn distance(self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn origin(self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * chunk_size
    }

    pub fn center(self, chunk_size: f32) -> Vec2 {
        self.origin(chunk_size) + Vec2::splat(chunk_size / 2.0)
    }

    /// Every chunk within `radius` of `self`, starting with `self`.
    pub fn square(self, radius: i32) -> impl Iterator<Item = ChunkCoord> {
        let center = self;
        std::iter::once(center).chain((-radius..=radius).flat_map(move |dy| {
            (-radius..=radius).filter_map(move |dx| {
                (dx != 0 || dy != 0).then(|| ChunkCoord::new(center.x + dx, center.y + dy))
            })
        }))
    }
}

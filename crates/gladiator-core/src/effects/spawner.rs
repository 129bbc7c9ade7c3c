//! Spawn timing and spawn placement.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{MillisRange, WorldConfig};

/// Schedule of one spawner: a fixed first delay, then randomized intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTimer {
    first_delay_ms: u64,
    interval: MillisRange,
}

impl SpawnTimer {
    /// Creates a timer.
    #[must_use]
    pub const fn new(first_delay_ms: u64, interval: MillisRange) -> Self {
        Self {
            first_delay_ms,
            interval,
        }
    }

    /// Delay from match start to the first spawn.
    #[must_use]
    pub const fn first_delay(&self) -> u64 {
        self.first_delay_ms
    }

    /// Rolls the delay until the next spawn.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.gen_range(self.interval.min_ms..=self.interval.max_ms)
    }
}

/// Corner zone `index mod 4` as `(min, max)` corners.
///
/// Zones are top-left, top-right, bottom-left and bottom-right, each
/// `spawn_zone_size` wide and inset by `spawn_margin`.
#[must_use]
pub fn spawn_zone(index: usize, world: &WorldConfig) -> (Vec2, Vec2) {
    let size = Vec2::splat(world.spawn_zone_size);
    let m = world.spawn_margin;
    let far_x = world.width - m - world.spawn_zone_size;
    let far_y = world.height - m - world.spawn_zone_size;
    let min = match index % 4 {
        0 => Vec2::new(m, m),
        1 => Vec2::new(far_x, m),
        2 => Vec2::new(m, far_y),
        _ => Vec2::new(far_x, far_y),
    };
    (min, min + size)
}

/// Uniform random point in the zone of gladiator `index`.
pub fn spawn_point<R: Rng + ?Sized>(index: usize, world: &WorldConfig, rng: &mut R) -> Vec2 {
    let (min, max) = spawn_zone(index, world);
    Vec2::new(
        min.x + rng.gen::<f32>() * (max.x - min.x),
        min.y + rng.gen::<f32>() * (max.y - min.y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn intervals_stay_in_window() {
        let timer = SpawnTimer::new(5000, MillisRange::new(8000, 15_000));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(timer.first_delay(), 5000);
        for _ in 0..100 {
            let delay = timer.next_delay(&mut rng);
            assert!((8000..=15_000).contains(&delay));
        }
    }

    #[test]
    fn zones_are_the_four_corners() {
        let world = WorldConfig::default();
        assert_eq!(spawn_zone(0, &world), (Vec2::new(80.0, 80.0), Vec2::new(180.0, 180.0)));
        assert_eq!(spawn_zone(1, &world).0, Vec2::new(620.0, 80.0));
        assert_eq!(spawn_zone(2, &world).0, Vec2::new(80.0, 420.0));
        assert_eq!(spawn_zone(3, &world).1, Vec2::new(720.0, 520.0));
    }

    #[test]
    fn extra_gladiators_wrap_around_zones() {
        let world = WorldConfig::default();
        assert_eq!(spawn_zone(5, &world), spawn_zone(1, &world));

        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let (min, max) = spawn_zone(6, &world);
        let p = spawn_point(6, &world, &mut rng);
        assert!(p.cmpge(min).all() && p.cmple(max).all());
    }
}

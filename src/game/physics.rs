//! Projectile flight model and playfield bounds

use super::geometry::Vec2;

/// Downward acceleration in units per second squared (screen Y grows down)
pub const GRAVITY: f64 = 60.0;

/// Parameters fixed at launch; everything else is derived from elapsed time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub origin: Vec2,
    /// Launch angle in degrees
    pub angle: f64,
    pub speed: f64,
    /// Unix millis at launch
    pub launched_at: u64,
}

impl Launch {
    /// Initial velocity vector
    pub fn velocity(&self) -> Vec2 {
        let angle_rad = self.angle * std::f64::consts::PI / 180.0;
        Vec2::new(angle_rad.cos() * self.speed, angle_rad.sin() * self.speed)
    }

    /// Seconds since launch, never negative
    pub fn elapsed_secs(&self, now_ms: u64) -> f64 {
        now_ms.saturating_sub(self.launched_at) as f64 / 1000.0
    }

    /// Closed-form position at `now_ms`.
    ///
    /// This is the only place projectile positions come from. The simulation
    /// step and the outgoing snapshot both call it, so they cannot disagree.
    pub fn position_at(&self, now_ms: u64) -> Vec2 {
        let t = self.elapsed_secs(now_ms);
        let v = self.velocity();
        Vec2::new(
            self.origin.x + v.x * t,
            self.origin.y + v.y * t + 0.5 * GRAVITY * t * t,
        )
    }
}

/// Axis-aligned region a projectile may occupy before it is despawned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Vec2::new(-100.0, -100.0),
            max: Vec2::new(1000.0, 1000.0),
        }
    }
}

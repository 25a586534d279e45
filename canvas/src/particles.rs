//! Ambient particles, wind, and the season clock.
//!
//! Purely cosmetic. Nothing here feeds back into gameplay, hit-testing, or
//! persistence. A particle that goes non-finite is dropped on the next tick
//! instead of being drawn.
//!
//! All randomness comes from an injected `Rng` so a seeded run is
//! reproducible.

#[cfg(test)]
#[path = "particles_test.rs"]
mod particles_test;

use rand::Rng;
use serde::Serialize;

use crate::consts::{PARTICLE_CULL_CHANCE, PARTICLE_SPIN_DEG, WIND_FLIP_CHANCE, WIND_LIMIT, WIND_STEP};

// =============================================================
// Kinds and seasons
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    Leaf,
    Petal,
    Sparkle,
    Snowflake,
    Firefly,
    Dust,
}

impl ParticleKind {
    /// Glow blur radius as a multiple of size, for the kinds that glow.
    #[must_use]
    pub fn glow(self) -> Option<f64> {
        match self {
            Self::Sparkle => Some(2.0),
            Self::Firefly => Some(3.0),
            _ => None,
        }
    }

    /// Leaves and petals are drawn as rotated ellipses, the rest as circles.
    #[must_use]
    pub fn is_ellipse(self) -> bool {
        matches!(self, Self::Leaf | Self::Petal)
    }

    fn palette(self) -> &'static [&'static str] {
        match self {
            Self::Leaf => &["#65a30d", "#ca8a04", "#ea580c", "#b45309"],
            Self::Petal => &["#fbcfe8", "#f9a8d4", "#fce7f3"],
            Self::Sparkle => &["#fef08a", "#ffffff"],
            Self::Snowflake => &["#ffffff", "#e0f2fe"],
            Self::Firefly => &["#facc15", "#bef264"],
            Self::Dust => &["#d6d3d1", "#e7e5e4"],
        }
    }

    /// (min, max) size.
    fn size_range(self) -> (f64, f64) {
        match self {
            Self::Leaf => (3.0, 5.0),
            Self::Petal => (2.0, 3.5),
            Self::Sparkle => (1.0, 2.5),
            Self::Snowflake => (1.5, 3.0),
            Self::Firefly => (1.5, 2.5),
            Self::Dust => (0.5, 1.5),
        }
    }

    /// (vx half-range, vy min, vy max) per tick.
    fn drift(self) -> (f64, f64, f64) {
        match self {
            Self::Leaf => (0.5, 0.3, 0.8),
            Self::Petal => (0.4, 0.2, 0.6),
            Self::Snowflake => (0.3, 0.2, 0.6),
            Self::Sparkle => (0.2, -0.2, 0.2),
            Self::Firefly => (0.4, -0.4, 0.4),
            Self::Dust => (0.1, -0.1, 0.1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    const CYCLE: [Season; 4] = [Self::Spring, Self::Summer, Self::Autumn, Self::Winter];

    /// Particle kinds this season may spawn.
    #[must_use]
    pub fn kinds(self) -> &'static [ParticleKind] {
        match self {
            Self::Spring => &[ParticleKind::Petal, ParticleKind::Sparkle],
            Self::Summer => &[ParticleKind::Firefly, ParticleKind::Sparkle, ParticleKind::Dust],
            Self::Autumn => &[ParticleKind::Leaf, ParticleKind::Dust],
            Self::Winter => &[ParticleKind::Snowflake, ParticleKind::Sparkle],
        }
    }

    #[must_use]
    pub fn next(self) -> Season {
        match self {
            Self::Spring => Self::Summer,
            Self::Summer => Self::Autumn,
            Self::Autumn => Self::Winter,
            Self::Winter => Self::Spring,
        }
    }
}

/// Cycles through the seasons on a fixed period.
#[derive(Debug, Clone, Copy)]
pub struct SeasonClock {
    period_ms: f64,
    first: Season,
}

impl SeasonClock {
    #[must_use]
    pub fn new(period_ms: f64, first: Season) -> Self {
        Self { period_ms, first }
    }

    /// Season in effect `elapsed_ms` after the clock started.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn season_at(&self, elapsed_ms: f64) -> Season {
        if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 || self.period_ms <= 0.0 {
            return self.first;
        }
        let steps = ((elapsed_ms / self.period_ms).floor() % 4.0) as usize;
        let start = Season::CYCLE.iter().position(|s| *s == self.first).unwrap_or(0);
        Season::CYCLE[(start + steps) % 4]
    }
}

// =============================================================
// Wind
// =============================================================

/// Global horizontal drift: a bounded random walk that occasionally flips.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Wind {
    value: f64,
}

impl Wind {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self { value: value.clamp(-WIND_LIMIT, WIND_LIMIT) }
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.value
    }

    pub fn step(&mut self, rng: &mut impl Rng) {
        if rng.random_bool(WIND_FLIP_CHANCE) {
            self.value = -self.value;
        }
        self.value = (self.value + rng.random_range(-WIND_STEP..=WIND_STEP)).clamp(-WIND_LIMIT, WIND_LIMIT);
    }
}

// =============================================================
// Particles
// =============================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub id: u64,
    pub kind: ParticleKind,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Degrees.
    pub rotation: f64,
    pub size: f64,
    pub opacity: f64,
    pub color: &'static str,
    /// Ticks lived so far.
    pub life: f64,
    pub max_life: f64,
    #[serde(skip)]
    peak_opacity: f64,
}

impl Particle {
    /// A particle with explicit values, fully opaque and long-lived.
    #[must_use]
    pub fn fixed(id: u64, kind: ParticleKind, x: f64, y: f64, size: f64) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            rotation: 0.0,
            size,
            opacity: 1.0,
            color: kind.palette()[0],
            life: 0.0,
            max_life: f64::INFINITY,
            peak_opacity: 1.0,
        }
    }

    /// Whether every numeric field can be drawn.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        [self.x, self.y, self.vx, self.vy, self.rotation, self.size, self.opacity]
            .iter()
            .all(|v| v.is_finite())
    }

    fn advance(&mut self, wind: f64, width: f64, height: f64) {
        self.x += self.vx + wind;
        self.y += self.vy;
        self.rotation = (self.rotation + PARTICLE_SPIN_DEG) % 360.0;
        self.life += 1.0;

        let margin = self.size;
        if self.x < -margin {
            self.x = width + margin;
        } else if self.x > width + margin {
            self.x = -margin;
        }
        if self.y < -margin {
            self.y = height + margin;
        } else if self.y > height + margin {
            self.y = -margin;
        }

        self.opacity = if self.max_life.is_finite() {
            self.peak_opacity * envelope(self.life / self.max_life)
        } else {
            self.peak_opacity
        };
    }

    fn expired(&self) -> bool {
        self.life >= self.max_life
    }
}

/// Fade in over the first tenth of life, out over the last quarter.
fn envelope(t: f64) -> f64 {
    if t < 0.1 {
        (t / 0.1).max(0.0)
    } else if t > 0.75 {
        ((1.0 - t) / 0.25).max(0.0)
    } else {
        1.0
    }
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    width: f64,
    height: f64,
    target: usize,
    max: usize,
    next_id: u64,
}

impl ParticleSystem {
    #[must_use]
    pub fn new(width: f64, height: f64, target: usize, max: usize) -> Self {
        Self { particles: Vec::with_capacity(max), width, height, target, max: max.max(target), next_id: 1 }
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Advance every particle one tick, drop the expired and the malformed,
    /// then steer the population towards the target.
    pub fn tick(&mut self, season: Season, wind: Wind, rng: &mut impl Rng) {
        let (w, h) = (self.width, self.height);
        for p in &mut self.particles {
            p.advance(wind.value(), w, h);
        }
        let before = self.particles.len();
        self.particles.retain(|p| !p.expired() && p.is_drawable());
        let dropped = before - self.particles.len();
        if dropped > 0 {
            tracing::trace!(dropped, "particles expired");
        }

        if self.particles.len() < self.target {
            self.spawn(season, rng);
        }
        while self.particles.len() > self.max {
            self.cull(rng);
        }
        if self.particles.len() > self.target && rng.random_bool(PARTICLE_CULL_CHANCE) {
            self.cull(rng);
        }
    }

    /// Add one particle of a kind the season allows.
    pub fn spawn(&mut self, season: Season, rng: &mut impl Rng) {
        let kinds = season.kinds();
        let kind = kinds[rng.random_range(0..kinds.len())];
        let particle = self.make(kind, rng);
        self.particles.push(particle);
    }

    /// Insert an externally built particle (tests, replays).
    pub fn push(&mut self, particle: Particle) {
        self.next_id = self.next_id.max(particle.id.saturating_add(1));
        self.particles.push(particle);
    }

    fn cull(&mut self, rng: &mut impl Rng) {
        if self.particles.is_empty() {
            return;
        }
        let idx = rng.random_range(0..self.particles.len());
        self.particles.swap_remove(idx);
    }

    fn make(&mut self, kind: ParticleKind, rng: &mut impl Rng) -> Particle {
        let id = self.next_id;
        self.next_id += 1;
        let (min_size, max_size) = kind.size_range();
        let (vx_half, vy_min, vy_max) = kind.drift();
        let palette = kind.palette();
        Particle {
            id,
            kind,
            x: rng.random_range(0.0..self.width.max(1.0)),
            y: rng.random_range(0.0..self.height.max(1.0)),
            vx: rng.random_range(-vx_half..=vx_half),
            vy: rng.random_range(vy_min..=vy_max),
            rotation: rng.random_range(0.0..360.0),
            size: rng.random_range(min_size..=max_size),
            opacity: 0.0,
            color: palette[rng.random_range(0..palette.len())],
            life: 0.0,
            max_life: rng.random_range(300.0..600.0),
            peak_opacity: rng.random_range(0.5..=0.9),
        }
    }
}

//! Particle engine: emission, movement, fade-out and recycling.
//!
//! The engine knows nothing about weather. It is configured with a bound
//! rectangle, a spawn source, a base velocity with random deviation and an
//! optional fade-out curve, and asks a [`ParticleGenerator`] what each new
//! particle should look like.

use std::fmt;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::assets::Sprite;
use crate::geometry::Bounds;

/// Upper limit on live particles.
pub const MAX_PARTICLES: usize = 4096;

/// Particles that never reach the edge of the bound are dropped after this.
pub const DEFAULT_MAX_LIFETIME_MS: u64 = 60_000;

/// Maps the elapsed fraction of a particle's life to an opacity.
pub type FadeOut = Box<dyn Fn(f32) -> f32>;

/// Appearance of a freshly spawned particle.
#[derive(Debug, Clone, Copy)]
pub struct ParticleLook {
    pub sprite: &'static Sprite,
    pub variant: usize,
}

/// Source of particle appearances, consulted once per spawn.
pub trait ParticleGenerator {
    /// Return the look of the next particle, or `None` to spawn nothing.
    fn generate(&mut self, rng: &mut SmallRng) -> Option<ParticleLook>;
}

/// One live particle.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Horizontal position in cells.
    pub x: f32,
    /// Vertical position in cells.
    pub y: f32,
    /// Cells per second.
    pub velocity_x: f32,
    /// Cells per second.
    pub velocity_y: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    pub sprite: &'static Sprite,
    pub variant: usize,
    pub age_ms: u64,
    /// Time until the particle crosses the bound edge it travels toward.
    pub reach_bound_ms: Option<f32>,
    /// Current opacity (0.0-1.0).
    pub alpha: f32,
}

impl Particle {
    /// Glyph this particle is drawn with.
    pub fn glyph(&self) -> char {
        self.sprite.glyph(self.rotation, self.variant)
    }

    /// Fraction of the particle's expected life that has passed.
    pub fn elapsed_fraction(&self, max_lifetime_ms: u64) -> f32 {
        let fraction = match self.reach_bound_ms {
            Some(total) if total > 0.0 => self.age_ms as f32 / total,
            Some(_) => 1.0,
            None => self.age_ms as f32 / max_lifetime_ms.max(1) as f32,
        };
        fraction.clamp(0.0, 1.0)
    }

    /// Whether the particle has passed the bound edge it was moving toward.
    fn has_left(&self, bound: &Bounds) -> bool {
        (self.velocity_y > 0.0 && self.y >= bound.bottom as f32)
            || (self.velocity_y < 0.0 && self.y < bound.top as f32 - 1.0)
            || (self.velocity_x > 0.0 && self.x >= bound.right as f32)
            || (self.velocity_x < 0.0 && self.x < bound.left as f32 - 1.0)
    }

    fn advance(&mut self, delta_ms: u64) {
        let dt = delta_ms as f32 / 1000.0;
        self.x += self.velocity_x * dt;
        self.y += self.velocity_y * dt;
        self.age_ms = self.age_ms.saturating_add(delta_ms);
    }
}

/// Milliseconds a particle needs to cross the edge of `bound` it travels toward.
fn time_to_bound(x: f32, y: f32, vx: f32, vy: f32, bound: &Bounds) -> Option<f32> {
    let seconds = if vy > 0.0 {
        (bound.bottom as f32 - y) / vy
    } else if vy < 0.0 {
        (y - bound.top as f32) / -vy
    } else if vx > 0.0 {
        (bound.right as f32 - x) / vx
    } else if vx < 0.0 {
        (x - bound.left as f32) / -vx
    } else {
        return None;
    };
    Some((seconds * 1000.0).max(0.0))
}

/// Pick a value uniformly within `deviation` of `base`.
fn jitter(rng: &mut SmallRng, base: f32, deviation: f32) -> f32 {
    let deviation = deviation.abs();
    if deviation > 0.0 && deviation.is_finite() {
        base + rng.gen_range(-deviation..=deviation)
    } else {
        base
    }
}

/// Pick a coordinate in `[a, b)` regardless of argument order.
fn spread(rng: &mut SmallRng, a: i32, b: i32) -> f32 {
    let (lo, hi) = (a.min(b) as f32, a.max(b) as f32);
    if hi > lo { rng.gen_range(lo..hi) } else { lo }
}

/// Mutable engine configuration, read on every update.
pub struct EngineConfig {
    /// Particles are terminated once they leave this rectangle.
    pub bound: Bounds,
    /// New particles originate inside this rectangle.
    pub source: Bounds,
    pub velocity_x: f32,
    pub velocity_x_deviation: f32,
    pub velocity_y: f32,
    pub velocity_y_deviation: f32,
    /// Rotation in degrees given to new particles.
    pub initial_rotation: f32,
    /// Particles per second.
    pub emission_rate: f32,
    /// How long emission lasts after [`ParticleEngine::animate`]; `None` is forever.
    pub emission_duration_ms: Option<u64>,
    pub max_lifetime_ms: u64,
    fade_out: Option<FadeOut>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bound: Bounds::default(),
            source: Bounds::default(),
            velocity_x: 0.0,
            velocity_x_deviation: 0.0,
            velocity_y: 0.0,
            velocity_y_deviation: 0.0,
            initial_rotation: 0.0,
            emission_rate: 0.0,
            emission_duration_ms: None,
            max_lifetime_ms: DEFAULT_MAX_LIFETIME_MS,
            fade_out: None,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("bound", &self.bound)
            .field("source", &self.source)
            .field("velocity_x", &self.velocity_x)
            .field("velocity_x_deviation", &self.velocity_x_deviation)
            .field("velocity_y", &self.velocity_y)
            .field("velocity_y_deviation", &self.velocity_y_deviation)
            .field("initial_rotation", &self.initial_rotation)
            .field("emission_rate", &self.emission_rate)
            .field("emission_duration_ms", &self.emission_duration_ms)
            .field("max_lifetime_ms", &self.max_lifetime_ms)
            .field("fade_out", &self.fade_out.is_some())
            .finish()
    }
}

impl EngineConfig {
    /// Opacity for a particle at `fraction` of its life.
    pub fn alpha(&self, fraction: f32) -> f32 {
        match &self.fade_out {
            Some(curve) => curve(fraction).clamp(0.0, 1.0),
            None => 1.0,
        }
    }

    pub fn fade_out_enabled(&self) -> bool {
        self.fade_out.is_some()
    }
}

/// Particle simulation driven by explicit time steps.
#[derive(Debug)]
pub struct ParticleEngine<G> {
    config: EngineConfig,
    generator: G,
    particles: Vec<Particle>,
    rng: SmallRng,
    /// Time since the last [`animate`](Self::animate).
    emission_elapsed_ms: u64,
    /// Fractional particles carried over between updates.
    pending: f32,
    running: bool,
}

impl<G: ParticleGenerator> ParticleEngine<G> {
    /// Create an idle engine seeded from the system clock.
    pub fn new(generator: G) -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(generator, seed)
    }

    /// Create an idle engine with a fixed random seed.
    pub fn with_seed(generator: G, seed: u64) -> Self {
        Self {
            config: EngineConfig::default(),
            generator,
            particles: Vec::new(),
            rng: SmallRng::seed_from_u64(seed),
            emission_elapsed_ms: 0,
            pending: 0.0,
            running: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_bound(&mut self, bound: Bounds) -> &mut Self {
        self.config.bound = bound;
        self
    }

    pub fn set_source(&mut self, source: Bounds) -> &mut Self {
        self.config.source = source;
        self
    }

    pub fn set_velocity_x(&mut self, velocity: f32, deviation: f32) -> &mut Self {
        self.config.velocity_x = velocity;
        self.config.velocity_x_deviation = deviation;
        self
    }

    pub fn set_velocity_y(&mut self, velocity: f32, deviation: f32) -> &mut Self {
        self.config.velocity_y = velocity;
        self.config.velocity_y_deviation = deviation;
        self
    }

    pub fn set_initial_rotation(&mut self, degrees: f32) -> &mut Self {
        self.config.initial_rotation = degrees;
        self
    }

    pub fn set_emission_rate(&mut self, per_second: f32) -> &mut Self {
        self.config.emission_rate = per_second;
        self
    }

    pub fn set_emission_duration(&mut self, duration_ms: Option<u64>) -> &mut Self {
        self.config.emission_duration_ms = duration_ms;
        self
    }

    pub fn set_max_lifetime(&mut self, lifetime_ms: u64) -> &mut Self {
        self.config.max_lifetime_ms = lifetime_ms;
        self
    }

    /// Fade particles with `curve`, called with the elapsed life fraction.
    pub fn enable_fade_out(&mut self, curve: impl Fn(f32) -> f32 + 'static) -> &mut Self {
        self.config.fade_out = Some(Box::new(curve));
        self
    }

    pub fn disable_fade_out(&mut self) -> &mut Self {
        self.config.fade_out = None;
        self
    }

    /// Start emission from scratch, dropping every in-flight particle.
    pub fn animate(&mut self) -> &mut Self {
        self.particles.clear();
        self.emission_elapsed_ms = 0;
        self.pending = 0.0;
        self.running = true;
        self
    }

    /// Advance the simulation by `delta_ms`.
    pub fn update(&mut self, delta_ms: u64) {
        if !self.running {
            return;
        }

        let config = &self.config;
        self.particles.retain_mut(|p| {
            p.advance(delta_ms);
            p.alpha = config.alpha(p.elapsed_fraction(config.max_lifetime_ms));
            let faded = config.fade_out_enabled() && p.alpha <= 0.0;
            !(faded || p.age_ms >= config.max_lifetime_ms || p.has_left(&config.bound))
        });

        self.emit(delta_ms);
    }

    fn emit(&mut self, delta_ms: u64) {
        if let Some(duration) = self.config.emission_duration_ms
            && self.emission_elapsed_ms >= duration
        {
            return;
        }
        self.emission_elapsed_ms = self.emission_elapsed_ms.saturating_add(delta_ms);

        let rate = self.config.emission_rate;
        if !(rate.is_finite() && rate > 0.0) {
            return;
        }
        self.pending += rate * delta_ms as f32 / 1000.0;
        let due = self.pending.floor();
        self.pending -= due;

        let room = MAX_PARTICLES.saturating_sub(self.particles.len());
        let count = (due as usize).min(room);
        for _ in 0..count {
            self.spawn();
        }
    }

    fn spawn(&mut self) {
        let Some(look) = self.generator.generate(&mut self.rng) else {
            return;
        };
        let config = &self.config;
        let rng = &mut self.rng;

        let x = spread(rng, config.source.left, config.source.right);
        let y = spread(rng, config.source.top, config.source.bottom);
        let velocity_x = jitter(rng, config.velocity_x, config.velocity_x_deviation);
        let velocity_y = jitter(rng, config.velocity_y, config.velocity_y_deviation);

        self.particles.push(Particle {
            x,
            y,
            velocity_x,
            velocity_y,
            rotation: config.initial_rotation,
            sprite: look.sprite,
            variant: look.variant,
            age_ms: 0,
            reach_bound_ms: time_to_bound(x, y, velocity_x, velocity_y, &config.bound),
            alpha: config.alpha(0.0),
        });
    }
}

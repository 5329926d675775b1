//! Rain and snow overlay for ratatui applications.
//!
//! [`WeatherView`] turns a fall angle, speed, emission rate and
//! precipitation type into particle velocities and an off-screen spawn line,
//! and feeds them to a small particle engine that spawns, moves, fades and
//! retires the particles. Render it after the host's own widgets: it only
//! paints cells that are still empty.

mod assets;
mod color;
mod engine;
mod generator;
mod geometry;
mod view;

pub use assets::{GlyphMode, RAIN_GLYPHS, SNOW_GLYPHS, Sprite, SpriteAssets, assets, sprite_for};
pub use color::fade;
pub use engine::{
    DEFAULT_MAX_LIFETIME_MS, EngineConfig, FadeOut, MAX_PARTICLES, Particle, ParticleEngine,
    ParticleGenerator, ParticleLook,
};
pub use generator::{SharedSprite, WeatherParticleGenerator};
pub use geometry::{
    Bounds, MAX_SPAWN_TANGENT, VELOCITY_VARIANCE, Velocity, compute_spawn_bounds,
    compute_velocity,
};
pub use squall_core::{PrecipType, WeatherData, WeatherParameters};
pub use view::WeatherView;

//! The weather overlay widget.

use std::cell::Cell;
use std::rc::Rc;

use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};
use squall_core::{PrecipType, WeatherData, WeatherParameters};

use crate::assets::sprite_for;
use crate::color::fade;
use crate::engine::{Particle, ParticleEngine};
use crate::generator::{SharedSprite, WeatherParticleGenerator};
use crate::geometry::{Bounds, Velocity, compute_spawn_bounds, compute_velocity};

/// Rain or snow falling over whatever was drawn underneath.
///
/// Every setter pushes its derived values into the particle engine right
/// away, so a change is visible from the next spawned particle on. Call
/// [`on_layout`](Self::on_layout) whenever the host area changes size and
/// [`tick`](Self::tick) once per frame.
#[derive(Debug)]
pub struct WeatherView {
    /// Current user-facing parameters.
    params: WeatherParameters,
    /// `params.angle` in radians.
    angle_radians: f64,
    /// Read by the engine's fade-out curve on every update.
    fade_out_percent: Rc<Cell<f32>>,
    /// Sprite for new particles, read by the generator on every spawn.
    current_sprite: SharedSprite,
    engine: ParticleEngine<WeatherParticleGenerator>,
    /// Area given to the last layout pass.
    area: Rect,
}

impl Default for WeatherView {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherView {
    /// Create a clear-sky overlay with emission already running.
    pub fn new() -> Self {
        Self::with_engine(ParticleEngine::new)
    }

    /// Create an overlay whose particle randomness is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_engine(|generator| ParticleEngine::with_seed(generator, seed))
    }

    /// Create an overlay and apply `params` to it.
    pub fn from_parameters(params: WeatherParameters) -> Self {
        let mut view = Self::new();
        view.apply_parameters(params);
        view
    }

    fn with_engine(
        build: impl FnOnce(WeatherParticleGenerator) -> ParticleEngine<WeatherParticleGenerator>,
    ) -> Self {
        let params = WeatherParameters::default();
        let current_sprite: SharedSprite = Rc::new(Cell::new(sprite_for(params.precip_type)));
        let fade_out_percent = Rc::new(Cell::new(params.fade_out_percent));

        let mut engine = build(WeatherParticleGenerator::new(current_sprite.clone()));
        let percent = fade_out_percent.clone();
        engine
            .set_emission_duration(None)
            .enable_fade_out(move |elapsed| (percent.get() - elapsed).max(0.0))
            .animate();

        let mut view = Self {
            params,
            angle_radians: 0.0,
            fade_out_percent,
            current_sprite,
            engine,
            area: Rect::default(),
        };
        view.update_velocities();
        view.update_emission_rate();
        view
    }

    /// Apply every field of `params`.
    pub fn apply_parameters(&mut self, params: WeatherParameters) {
        self.set_precip_type(params.precip_type);
        self.set_fade_out_percent(params.fade_out_percent);
        self.set_emission_rate(params.emission_rate);
        self.set_speed(params.speed);
        self.set_angle(params.angle);
    }

    pub fn parameters(&self) -> WeatherParameters {
        self.params
    }

    pub fn angle(&self) -> i32 {
        self.params.angle
    }

    pub fn angle_radians(&self) -> f64 {
        self.angle_radians
    }

    /// Set the fall angle in degrees (0 = straight down, positive leans right).
    pub fn set_angle(&mut self, degrees: i32) {
        self.params.angle = degrees;
        self.angle_radians = f64::from(degrees).to_radians();
        self.update_velocities();
    }

    pub fn speed(&self) -> i32 {
        self.params.speed
    }

    /// Set the fall speed in cells per second.
    pub fn set_speed(&mut self, speed: i32) {
        self.params.speed = speed;
        self.update_velocities();
    }

    pub fn fade_out_percent(&self) -> f32 {
        self.params.fade_out_percent
    }

    pub fn set_fade_out_percent(&mut self, percent: f32) {
        self.params.fade_out_percent = percent;
        self.fade_out_percent.set(percent);
    }

    pub fn emission_rate(&self) -> f32 {
        self.params.emission_rate
    }

    /// Set the number of particles spawned per second.
    pub fn set_emission_rate(&mut self, per_second: f32) {
        self.params.emission_rate = per_second;
        self.update_emission_rate();
    }

    pub fn precip_type(&self) -> PrecipType {
        self.params.precip_type
    }

    /// Switch what new particles look like. Particles already falling keep
    /// their sprite.
    pub fn set_precip_type(&mut self, precip_type: PrecipType) {
        self.params.precip_type = precip_type;
        self.current_sprite.set(sprite_for(precip_type));
    }

    /// Apply precipitation type, emission rate and speed together, then
    /// restart the animation.
    pub fn set_weather_data(&mut self, data: WeatherData) {
        self.set_precip_type(data.precip_type);
        self.set_emission_rate(data.emission_rate);
        self.set_speed(data.speed);
        self.reset_weather();
    }

    /// Restart emission with the current configuration.
    pub fn reset_weather(&mut self) {
        log::debug!(
            "restarting {} at {}/s, speed {}, angle {}",
            self.params.precip_type.label(),
            self.params.emission_rate,
            self.params.speed,
            self.params.angle
        );
        self.engine.animate();
    }

    /// Layout callback: record the host area and recompute spawn geometry.
    pub fn on_layout(&mut self, area: Rect) {
        self.area = area;
        self.update_bounds();
    }

    /// Advance the animation by `delta_ms`.
    pub fn tick(&mut self, delta_ms: u64) {
        self.engine.update(delta_ms);
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Velocity currently given to new particles.
    pub fn velocity(&self) -> Velocity {
        compute_velocity(self.angle_radians, self.params.speed)
    }

    /// Line new particles spawn on, in view-local cells.
    pub fn spawn_bounds(&self) -> Bounds {
        self.engine.config().source
    }

    pub fn particles(&self) -> &[Particle] {
        self.engine.particles()
    }

    pub fn engine(&self) -> &ParticleEngine<WeatherParticleGenerator> {
        &self.engine
    }

    fn update_emission_rate(&mut self) {
        self.engine.set_emission_rate(self.params.emission_rate);
    }

    fn update_velocities(&mut self) {
        let velocity = self.velocity();
        self.engine
            .set_velocity_y(velocity.y, velocity.y_variance)
            .set_velocity_x(velocity.x, velocity.x_variance)
            .set_initial_rotation(-(self.params.angle as f32));
        self.update_bounds();
    }

    fn update_bounds(&mut self) {
        let width = i32::from(self.area.width);
        let height = i32::from(self.area.height);
        self.engine
            .set_bound(Bounds::new(0, 0, width, height))
            .set_source(compute_spawn_bounds(self.angle_radians, width, height));
    }
}

impl Widget for &WeatherView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for particle in self.engine.particles() {
            if particle.alpha <= 0.0 {
                continue;
            }
            let col = particle.x.floor();
            let row = particle.y.floor();
            if col < 0.0 || row < 0.0 || col >= area.width as f32 || row >= area.height as f32 {
                continue;
            }

            // Only paint empty cells so the host's own content stays readable
            let position = (area.x + col as u16, area.y + row as u16);
            if let Some(cell) = buf.cell_mut(position)
                && cell.symbol() == " "
            {
                cell.set_char(particle.glyph())
                    .set_fg(fade(particle.sprite.color, particle.alpha));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{RAIN_GLYPHS, assets};
    use ratatui::buffer::Cell as BufferCell;
    use ratatui::style::Color;

    fn rainy_view(width: u16, height: u16) -> WeatherView {
        let mut view = WeatherView::with_seed(11);
        view.on_layout(Rect::new(0, 0, width, height));
        view.set_weather_data(WeatherData::new(PrecipType::Rain, 10.0, 10));
        view
    }

    #[test]
    fn test_new_view_is_clear_and_running() {
        let view = WeatherView::new();
        assert_eq!(view.parameters(), WeatherParameters::default());
        assert!(view.engine().is_running());
        assert!(view.particles().is_empty());
    }

    #[test]
    fn test_angle_pushes_velocity_and_bounds() {
        let mut view = WeatherView::with_seed(1);
        view.on_layout(Rect::new(0, 0, 100, 200));
        view.set_speed(10);
        view.set_angle(45);

        let config = view.engine().config();
        assert!((config.velocity_x - 7.071).abs() < 1e-3);
        assert!((config.velocity_y - 7.071).abs() < 1e-3);
        assert!((config.velocity_x_deviation - 0.3536).abs() < 1e-3);
        assert_eq!(config.initial_rotation, -45.0);
        assert_eq!(config.bound, Bounds::new(0, 0, 100, 200));

        let spawn = view.spawn_bounds();
        assert!((-200..=-199).contains(&spawn.left));
        assert_eq!(spawn.right, 100);
    }

    #[test]
    fn test_speed_and_rate_are_live() {
        let mut view = WeatherView::with_seed(1);
        view.on_layout(Rect::new(0, 0, 100, 200));
        view.set_angle(30);
        view.set_speed(20);

        let config = view.engine().config();
        assert!((config.velocity_x - 10.0).abs() < 1e-3);
        assert!((config.velocity_y - 17.3205).abs() < 1e-3);
        assert!((config.velocity_y_deviation - 0.866).abs() < 1e-3);
        assert_eq!(config.initial_rotation, -30.0);

        view.set_emission_rate(7.0);
        assert_eq!(view.engine().config().emission_rate, 7.0);
    }

    #[test]
    fn test_layout_recomputes_bounds() {
        let mut view = WeatherView::with_seed(1);
        view.set_angle(-30);
        view.on_layout(Rect::new(5, 5, 40, 10));
        let narrow = view.spawn_bounds();

        view.on_layout(Rect::new(0, 0, 100, 200));
        let wide = view.spawn_bounds();

        assert_eq!(narrow.left, 0);
        assert!(narrow.right > 40);
        assert!(wide.right > narrow.right);
        assert_eq!(view.engine().config().bound, Bounds::new(0, 0, 100, 200));

        view.set_angle(0);
        assert_eq!(view.spawn_bounds(), Bounds::new(0, 0, 100, 0));
    }

    #[test]
    fn test_set_weather_data_then_reset() {
        let mut view = rainy_view(20, 10);
        view.tick(1000);
        assert!(!view.particles().is_empty());

        for _ in 0..2 {
            view.set_weather_data(WeatherData::new(PrecipType::Snow, 0.5, 10));
            view.reset_weather();
            assert_eq!(view.precip_type(), PrecipType::Snow);
            assert_eq!(view.emission_rate(), 0.5);
            assert_eq!(view.speed(), 10);
            assert!(view.engine().is_running());
            assert!(view.particles().is_empty());
        }
    }

    #[test]
    fn test_precip_type_applies_to_new_particles_only() {
        let mut view = rainy_view(20, 30);
        view.tick(1000);
        let rain_count = view.particles().len();
        assert_eq!(rain_count, 10);

        view.set_precip_type(PrecipType::Snow);
        view.tick(100);
        let particles = view.particles();
        assert_eq!(particles.len(), rain_count + 1);
        assert!(
            particles[..rain_count]
                .iter()
                .all(|p| std::ptr::eq(p.sprite, &assets().rain))
        );
        assert!(std::ptr::eq(particles[rain_count].sprite, &assets().snow));
    }

    #[test]
    fn test_clear_spawns_nothing() {
        let mut view = rainy_view(20, 10);
        view.set_precip_type(PrecipType::Clear);
        view.tick(1000);
        assert!(view.particles().is_empty());
    }

    #[test]
    fn test_fade_out_percent_is_live() {
        let mut view = rainy_view(20, 30);
        view.tick(1000);
        view.set_fade_out_percent(0.5);
        view.tick(10);
        assert!(view.particles().iter().all(|p| p.alpha <= 0.5));
    }

    #[test]
    fn test_from_parameters() {
        let params = WeatherParameters {
            angle: 20,
            speed: 30,
            emission_rate: 5.0,
            fade_out_percent: 0.8,
            precip_type: PrecipType::Snow,
        };
        let view = WeatherView::from_parameters(params);
        assert_eq!(view.parameters(), params);
        assert_eq!(view.engine().config().emission_rate, 5.0);
        assert_eq!(view.engine().config().initial_rotation, -20.0);
    }

    #[test]
    fn test_render_draws_rain_on_empty_cells() {
        let area = Rect::new(0, 0, 10, 5);
        let mut view = rainy_view(area.width, area.height);
        view.tick(1000);

        let mut buf = Buffer::empty(area);
        (&view).render(area, &mut buf);

        let drawn: Vec<&BufferCell> = buf.content().iter().filter(|c| c.symbol() != " ").collect();
        assert!(!drawn.is_empty());
        for cell in drawn {
            assert_eq!(cell.symbol(), RAIN_GLYPHS[0].to_string());
            assert_eq!(cell.fg, Color::Rgb(90, 120, 170));
        }
        // Freshly spawned rain sits on the top row
        assert!((0..area.width).any(|x| buf[(x, 0u16)].symbol() != " "));
    }

    #[test]
    fn test_render_keeps_host_content() {
        let area = Rect::new(0, 0, 10, 5);
        let mut view = rainy_view(area.width, area.height);
        view.tick(1000);

        let mut buf = Buffer::filled(area, BufferCell::new("#"));
        (&view).render(area, &mut buf);
        assert!(buf.content().iter().all(|c| c.symbol() == "#"));
    }

    #[test]
    fn test_render_offsets_into_area() {
        let area = Rect::new(3, 2, 10, 5);
        let mut view = rainy_view(area.width, area.height);
        view.tick(1000);

        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 10));
        (&view).render(area, &mut buf);
        for y in 0..10u16 {
            for x in 0..20u16 {
                if !area.contains((x, y).into()) {
                    assert_eq!(buf[(x, y)].symbol(), " ");
                }
            }
        }
        assert!((area.x..area.right()).any(|x| buf[(x, area.y)].symbol() != " "));
    }
}

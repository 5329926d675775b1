mod weather;

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::Paragraph,
};
use squall_config::{Config, ConfigError};
use squall_core::WeatherData;
use squall_particles::WeatherView;

use crate::weather::WeatherMonitor;

/// Angle change per key press, in degrees.
const ANGLE_STEP: i32 = 5;
/// Speed change per key press, in cells per second.
const SPEED_STEP: i32 = 5;
/// Emission change per key press, in particles per second.
const EMISSION_STEP: f32 = 5.0;
/// Fade-out change per key press.
const FADE_STEP: f32 = 0.1;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    // The TUI owns the terminal, so only log when explicitly asked to.
    if std::env::var_os("RUST_LOG").is_some() {
        pretty_env_logger::init();
    }

    let config = config_or_default(Config::load());
    let terminal = ratatui::init();
    let result = App::new(config).run(terminal);
    ratatui::restore();
    result
}

/// Use the loaded config, or defaults if it could not be read.
fn config_or_default(loaded: Result<Config, ConfigError>) -> Config {
    loaded.unwrap_or_else(|e| {
        log::warn!("could not load config, using defaults: {e}");
        Config::default()
    })
}

/// The demo application: a status screen with weather falling over it.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    running: bool,
    config: Config,
    view: WeatherView,
    /// Present when live weather is enabled.
    monitor: Option<WeatherMonitor>,
    /// Fetch time of the live conditions last applied.
    applied_fetch: Option<Instant>,
    last_tick: Instant,
}

impl App {
    /// Construct a new instance of [`App`].
    pub fn new(config: Config) -> Self {
        let monitor = config.live_weather.then(|| {
            let monitor = WeatherMonitor::new(config.location.clone());
            monitor.start();
            monitor
        });

        Self {
            running: false,
            view: WeatherView::from_parameters(config.weather),
            config,
            monitor,
            applied_fetch: None,
            last_tick: Instant::now(),
        }
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.running = true;
        while self.running {
            self.apply_live_weather();
            self.tick();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events()?;
        }

        self.config.weather = self.view.parameters();
        if let Err(e) = self.config.save() {
            log::warn!("could not save config: {e}");
        }
        Ok(())
    }

    fn tick(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.view.tick(delta.as_millis() as u64);
    }

    /// Push newly fetched conditions into the overlay.
    fn apply_live_weather(&mut self) {
        let Some(live) = self.monitor.as_ref().and_then(WeatherMonitor::latest) else {
            return;
        };
        if self.applied_fetch == Some(live.fetched_at) {
            return;
        }
        self.applied_fetch = Some(live.fetched_at);
        self.view.set_angle(live.angle);
        self.view.set_weather_data(live.data);
    }

    /// Renders the user interface.
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area != self.view.area() {
            self.view.on_layout(area);
        }

        let color = Color::Cyan;
        let chunks = Layout::vertical([
            Constraint::Fill(1),   // Top padding
            Constraint::Length(1), // Title
            Constraint::Length(1), // Spacing
            Constraint::Length(1), // Parameters
            Constraint::Fill(1),   // Bottom padding
            Constraint::Length(1), // Help text
        ])
        .split(area);

        let title = Paragraph::new("squall")
            .style(Style::new().fg(color).bold())
            .alignment(Alignment::Center);
        frame.render_widget(title, chunks[1]);

        let params = self.view.parameters();
        let status = format!(
            "{}  angle {}°  speed {}  rate {:.0}/s  fade {:.1}  particles {}{}",
            params.precip_type.label(),
            params.angle,
            params.speed,
            params.emission_rate,
            params.fade_out_percent,
            self.view.particles().len(),
            if self.monitor.is_some() { "  (live)" } else { "" },
        );
        let status = Paragraph::new(status)
            .style(Style::new().fg(Color::Gray))
            .alignment(Alignment::Center);
        frame.render_widget(status, chunks[3]);

        render_help(frame, chunks[5], color);

        // Drawn last so it falls around, not over, the text above
        frame.render_widget(&self.view, area);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    fn handle_crossterm_events(&mut self) -> color_eyre::Result<()> {
        if event::poll(Duration::from_millis(self.config.frame_ms))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Resize(width, height) => {
                    self.view.on_layout(Rect::new(0, 0, width, height));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        if matches!(
            (key.modifiers, key.code),
            (_, KeyCode::Esc | KeyCode::Char('q'))
                | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C'))
        ) {
            self.quit();
            return;
        }

        let view = &mut self.view;
        match key.code {
            KeyCode::Char('p') => view.set_precip_type(view.precip_type().next()),
            KeyCode::Left => view.set_angle(view.angle() - ANGLE_STEP),
            KeyCode::Right => view.set_angle(view.angle() + ANGLE_STEP),
            KeyCode::Up => view.set_speed(view.speed() + SPEED_STEP),
            KeyCode::Down => view.set_speed(view.speed() - SPEED_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                view.set_emission_rate(view.emission_rate() + EMISSION_STEP)
            }
            KeyCode::Char('-') => {
                view.set_emission_rate((view.emission_rate() - EMISSION_STEP).max(0.0))
            }
            KeyCode::Char('f') => {
                view.set_fade_out_percent((view.fade_out_percent() - FADE_STEP).max(0.0))
            }
            KeyCode::Char('F') => {
                view.set_fade_out_percent((view.fade_out_percent() + FADE_STEP).min(1.0))
            }
            KeyCode::Char('1') => view.set_weather_data(WeatherData::CLEAR),
            KeyCode::Char('2') => view.set_weather_data(WeatherData::RAIN),
            KeyCode::Char('3') => view.set_weather_data(WeatherData::SNOW),
            KeyCode::Char('r') => view.reset_weather(),
            _ => {}
        }
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}

fn render_help(frame: &mut Frame, area: Rect, color: Color) {
    let help = Line::from(vec![
        "q".bold().fg(color),
        " quit  ".dark_gray(),
        "p".bold().fg(color),
        " precip  ".dark_gray(),
        "←→".bold().fg(color),
        " angle  ".dark_gray(),
        "↑↓".bold().fg(color),
        " speed  ".dark_gray(),
        "+-".bold().fg(color),
        " rate  ".dark_gray(),
        "f/F".bold().fg(color),
        " fade  ".dark_gray(),
        "1-3".bold().fg(color),
        " presets  ".dark_gray(),
        "r".bold().fg(color),
        " reset".dark_gray(),
    ])
    .centered();
    frame.render_widget(help, area);
}

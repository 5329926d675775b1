//! Core types shared by the squall crates.

use serde::{Deserialize, Serialize};

/// Kind of precipitation drawn by the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipType {
    #[default]
    Clear,
    Rain,
    Snow,
}

impl PrecipType {
    /// Cycle to the next precipitation type.
    pub fn next(self) -> Self {
        match self {
            PrecipType::Clear => PrecipType::Rain,
            PrecipType::Rain => PrecipType::Snow,
            PrecipType::Snow => PrecipType::Clear,
        }
    }

    /// Human readable name.
    pub fn label(self) -> &'static str {
        match self {
            PrecipType::Clear => "clear",
            PrecipType::Rain => "rain",
            PrecipType::Snow => "snow",
        }
    }
}

/// A batch of weather settings applied together by
/// `WeatherView::set_weather_data`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub precip_type: PrecipType,
    /// Particles spawned per second.
    pub emission_rate: f32,
    /// Fall speed in cells per second.
    pub speed: i32,
}

impl WeatherData {
    pub const fn new(precip_type: PrecipType, emission_rate: f32, speed: i32) -> Self {
        Self {
            precip_type,
            emission_rate,
            speed,
        }
    }

    /// Preset for a clear sky.
    pub const CLEAR: Self = Self::new(PrecipType::Clear, 0.0, 0);
    /// Preset for steady rain.
    pub const RAIN: Self = Self::new(PrecipType::Rain, 40.0, 45);
    /// Preset for gentle snowfall.
    pub const SNOW: Self = Self::new(PrecipType::Snow, 12.0, 6);
}

/// The complete, continuously settable configuration of a weather overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherParameters {
    /// Fall angle in degrees, 0 is straight down, positive leans right.
    pub angle: i32,
    /// Fall speed in cells per second.
    pub speed: i32,
    /// Particles spawned per second.
    pub emission_rate: f32,
    /// Opacity ceiling fed to the fade-out curve, nominally 0..1.
    pub fade_out_percent: f32,
    pub precip_type: PrecipType,
}

impl Default for WeatherParameters {
    fn default() -> Self {
        Self {
            angle: 0,
            speed: 0,
            emission_rate: 0.0,
            fade_out_percent: 1.0,
            precip_type: PrecipType::Clear,
        }
    }
}

impl WeatherParameters {
    /// Overwrite the fields carried by a [`WeatherData`] batch.
    pub fn apply(&mut self, data: WeatherData) {
        self.precip_type = data.precip_type;
        self.emission_rate = data.emission_rate;
        self.speed = data.speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precip_type_cycle() {
        let start = PrecipType::Clear;
        assert_eq!(start.next(), PrecipType::Rain);
        assert_eq!(start.next().next(), PrecipType::Snow);
        assert_eq!(start.next().next().next(), start);
    }

    #[test]
    fn test_parameters_default() {
        let params = WeatherParameters::default();
        assert_eq!(params.angle, 0);
        assert_eq!(params.fade_out_percent, 1.0);
        assert_eq!(params.precip_type, PrecipType::Clear);
    }

    #[test]
    fn test_apply_weather_data() {
        let mut params = WeatherParameters {
            angle: 15,
            ..Default::default()
        };
        params.apply(WeatherData::new(PrecipType::Snow, 0.5, 10));
        assert_eq!(params.precip_type, PrecipType::Snow);
        assert_eq!(params.emission_rate, 0.5);
        assert_eq!(params.speed, 10);
        assert_eq!(params.angle, 15);
    }
}

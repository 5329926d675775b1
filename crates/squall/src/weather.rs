//! Live weather: current conditions from wttr.in mapped to overlay settings.

use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use squall_core::{PrecipType, WeatherData};

/// How often to fetch new weather data (30 minutes).
const FETCH_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Steepest fall angle wind can produce, in degrees.
const MAX_WIND_ANGLE: f32 = 60.0;

/// How hard it is coming down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    Light,
    Moderate,
    Heavy,
}

/// Overlay settings derived from the current conditions.
#[derive(Debug, Clone)]
pub struct LiveWeather {
    pub data: WeatherData,
    /// Fall angle in degrees derived from the wind.
    pub angle: i32,
    /// When the conditions were fetched.
    pub fetched_at: Instant,
}

/// wttr.in JSON response (only the fields we need).
#[derive(Debug, Deserialize)]
struct WttrResponse {
    current_condition: Vec<CurrentCondition>,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "weatherCode")]
    weather_code: String,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: String,
    #[serde(rename = "winddirDegree")]
    winddir_degree: String,
}

/// Fetches current conditions on a background thread.
#[derive(Debug)]
pub struct WeatherMonitor {
    /// Latest successfully fetched conditions.
    latest: Arc<RwLock<Option<LiveWeather>>>,
    /// Location string (empty for auto-detect).
    location: String,
    /// Flag to signal thread termination.
    running: Arc<RwLock<bool>>,
}

impl WeatherMonitor {
    pub fn new(location: String) -> Self {
        Self {
            latest: Arc::new(RwLock::new(None)),
            location,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the background fetching thread.
    pub fn start(&self) {
        if let Ok(mut running) = self.running.write() {
            if *running {
                return;
            }
            *running = true;
        }

        let latest = self.latest.clone();
        let location = self.location.clone();
        let running = self.running.clone();

        thread::spawn(move || {
            let mut last_fetch: Option<Instant> = None;
            loop {
                if let Ok(is_running) = running.read()
                    && !*is_running
                {
                    break;
                }

                if last_fetch.is_none_or(|t| t.elapsed() >= FETCH_INTERVAL) {
                    fetch_and_update(&location, &latest);
                    last_fetch = Some(Instant::now());
                }

                thread::sleep(Duration::from_secs(1));
            }
        });
    }

    /// Stop the background thread.
    pub fn stop(&self) {
        if let Ok(mut running) = self.running.write() {
            *running = false;
        }
    }

    /// Latest conditions, if any fetch has succeeded.
    pub fn latest(&self) -> Option<LiveWeather> {
        self.latest.read().ok().and_then(|w| w.clone())
    }
}

impl Drop for WeatherMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fetch conditions and publish them; failures keep the previous value.
fn fetch_and_update(location: &str, latest: &Arc<RwLock<Option<LiveWeather>>>) {
    match fetch_weather(location) {
        Ok(live) => {
            log::debug!(
                "live weather: {} at {}/s, angle {}",
                live.data.precip_type.label(),
                live.data.emission_rate,
                live.angle
            );
            if let Ok(mut slot) = latest.write() {
                *slot = Some(live);
            }
        }
        Err(e) => log::warn!("weather fetch failed: {e}"),
    }
}

/// Fetch current conditions from wttr.in.
fn fetch_weather(location: &str) -> Result<LiveWeather, String> {
    let url = if location.is_empty() {
        "https://wttr.in/?format=j1".to_string()
    } else {
        format!("https://wttr.in/{}?format=j1", url_encode(location))
    };

    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(REQUEST_TIMEOUT))
        .build()
        .new_agent();

    let response: WttrResponse = agent
        .get(&url)
        .call()
        .map_err(|e| format!("HTTP error: {e}"))?
        .body_mut()
        .read_json()
        .map_err(|e| format!("JSON parse error: {e}"))?;

    live_weather_from(&response)
}

/// Map a wttr.in response to overlay settings.
fn live_weather_from(response: &WttrResponse) -> Result<LiveWeather, String> {
    let current = response
        .current_condition
        .first()
        .ok_or("No current condition")?;

    let wind_kmph: f32 = current.windspeed_kmph.parse().unwrap_or(0.0);
    let wind_dir: f32 = current.winddir_degree.parse().unwrap_or(0.0);

    let data = match classify_weather_code(&current.weather_code) {
        Some((precip_type, intensity)) => preset(precip_type, intensity),
        None => WeatherData::CLEAR,
    };

    Ok(LiveWeather {
        data,
        angle: wind_angle(wind_kmph, wind_dir),
        fetched_at: Instant::now(),
    })
}

/// Simple URL encoding for location strings.
fn url_encode(s: &str) -> String {
    s.replace(' ', "+").replace(',', "%2C")
}

/// Classify a wttr.in weather code as falling precipitation.
/// See: https://www.worldweatheronline.com/developer/api/docs/weather-icons.aspx
fn classify_weather_code(code: &str) -> Option<(PrecipType, Intensity)> {
    use Intensity::{Heavy, Light, Moderate};
    use PrecipType::{Rain, Snow};

    let class = match code {
        // Drizzle, patchy and light rain, thundery outbreaks
        "176" | "185" | "200" | "263" | "266" | "281" | "284" | "293" | "296" | "311"
        | "353" => (Rain, Light),
        "299" | "302" | "314" | "356" | "386" => (Rain, Moderate),
        "305" | "308" | "359" | "389" => (Rain, Heavy),

        // Sleet and ice pellets are drawn as snow
        "179" | "182" | "227" | "317" | "320" | "323" | "326" | "362" | "368" | "374"
        | "392" => (Snow, Light),
        "329" | "332" | "350" | "365" | "377" => (Snow, Moderate),
        "230" | "335" | "338" | "371" | "395" => (Snow, Heavy),

        _ => return None,
    };
    Some(class)
}

/// Emission rate and speed for a kind and intensity of precipitation.
fn preset(precip_type: PrecipType, intensity: Intensity) -> WeatherData {
    match (precip_type, intensity) {
        (PrecipType::Clear, _) => WeatherData::CLEAR,
        (PrecipType::Rain, Intensity::Light) => WeatherData::new(PrecipType::Rain, 15.0, 35),
        (PrecipType::Rain, Intensity::Moderate) => WeatherData::RAIN,
        (PrecipType::Rain, Intensity::Heavy) => WeatherData::new(PrecipType::Rain, 90.0, 60),
        (PrecipType::Snow, Intensity::Light) => WeatherData::new(PrecipType::Snow, 5.0, 4),
        (PrecipType::Snow, Intensity::Moderate) => WeatherData::SNOW,
        (PrecipType::Snow, Intensity::Heavy) => WeatherData::new(PrecipType::Snow, 30.0, 8),
    }
}

/// Fall angle for a wind of `speed_kmph` blowing from `direction_deg`.
///
/// Wind from the west (270°) pushes particles east, which is a positive angle.
fn wind_angle(speed_kmph: f32, direction_deg: f32) -> i32 {
    let magnitude = (speed_kmph / 2.0).clamp(0.0, MAX_WIND_ANGLE);
    (-direction_deg.to_radians().sin() * magnitude).round() as i32
}

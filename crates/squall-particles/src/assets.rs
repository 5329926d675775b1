//! Particle sprites: the glyphs and colors each precipitation type draws with.

use std::sync::OnceLock;

use ratatui::style::Color;
use squall_core::PrecipType;

/// Rain glyphs: falling straight, leaning right, leaning left.
pub const RAIN_GLYPHS: &[char] = &['|', '\\', '/'];

/// Snow glyphs, one picked per flake.
pub const SNOW_GLYPHS: &[char] = &['*', '·', '•', '❄', '❅', '❆', '°'];

/// Rotation (degrees) beyond which rain is drawn slanted.
const SLANT_THRESHOLD: f32 = 15.0;

/// How a sprite picks its glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphMode {
    /// Glyph follows the particle's rotation (vertical / right / left).
    Oriented,
    /// Glyph is chosen once per particle from the set.
    Variant,
}

/// Glyph set and color for one kind of particle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub glyphs: &'static [char],
    pub color: Color,
    pub mode: GlyphMode,
}

impl Sprite {
    /// Number of distinct looks a particle can be assigned at spawn.
    pub fn variants(&self) -> usize {
        match self.mode {
            GlyphMode::Oriented => 1,
            GlyphMode::Variant => self.glyphs.len().max(1),
        }
    }

    /// Glyph for a particle with the given rotation and variant.
    pub fn glyph(&self, rotation: f32, variant: usize) -> char {
        if self.glyphs.is_empty() {
            return ' ';
        }
        match self.mode {
            // Rotation is the negated fall angle, so a right-leaning fall
            // has a negative rotation.
            GlyphMode::Oriented if self.glyphs.len() >= 3 => {
                let rotation = wrap_degrees(rotation);
                if rotation < -SLANT_THRESHOLD {
                    self.glyphs[1]
                } else if rotation > SLANT_THRESHOLD {
                    self.glyphs[2]
                } else {
                    self.glyphs[0]
                }
            }
            GlyphMode::Oriented => self.glyphs[0],
            GlyphMode::Variant => self.glyphs[variant % self.glyphs.len()],
        }
    }
}

/// Wrap an angle in degrees into [-180, 180).
fn wrap_degrees(degrees: f32) -> f32 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

/// The sprites shared by every overlay in the process.
#[derive(Debug)]
pub struct SpriteAssets {
    pub rain: Sprite,
    pub snow: Sprite,
}

static ASSETS: OnceLock<SpriteAssets> = OnceLock::new();

/// Sprite assets, built on first use and kept for the process lifetime.
pub fn assets() -> &'static SpriteAssets {
    ASSETS.get_or_init(|| {
        log::debug!("initializing sprite assets");
        SpriteAssets {
            rain: Sprite {
                glyphs: RAIN_GLYPHS,
                color: Color::Rgb(90, 120, 170),
                mode: GlyphMode::Oriented,
            },
            snow: Sprite {
                glyphs: SNOW_GLYPHS,
                color: Color::Rgb(170, 190, 230),
                mode: GlyphMode::Variant,
            },
        }
    })
}

/// Sprite drawn for a precipitation type, `None` for a clear sky.
pub fn sprite_for(precip_type: PrecipType) -> Option<&'static Sprite> {
    match precip_type {
        PrecipType::Clear => None,
        PrecipType::Rain => Some(&assets().rain),
        PrecipType::Snow => Some(&assets().snow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_lookup() {
        assert!(sprite_for(PrecipType::Clear).is_none());
        assert_eq!(sprite_for(PrecipType::Rain).unwrap().glyphs, RAIN_GLYPHS);
        assert_eq!(sprite_for(PrecipType::Snow).unwrap().glyphs, SNOW_GLYPHS);
    }

    #[test]
    fn test_assets_initialized_once() {
        let a = sprite_for(PrecipType::Rain).unwrap();
        let b = sprite_for(PrecipType::Rain).unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_rain_glyph_follows_rotation() {
        let rain = &assets().rain;
        assert_eq!(rain.glyph(0.0, 0), '|');
        assert_eq!(rain.glyph(-40.0, 0), '\\');
        assert_eq!(rain.glyph(40.0, 0), '/');
        assert_eq!(rain.variants(), 1);
    }

    #[test]
    fn test_rain_glyph_wraps_full_turns() {
        let rain = &assets().rain;
        // 350° falls like -10°, -350° like 10°
        assert_eq!(rain.glyph(-350.0, 0), '|');
        assert_eq!(rain.glyph(350.0, 0), '|');
        assert_eq!(rain.glyph(-350.0, 0), rain.glyph(10.0, 0));
        assert_eq!(rain.glyph(-320.0, 0), '/');
        assert_eq!(rain.glyph(320.0, 0), '\\');
        assert_eq!(rain.glyph(-400.0, 0), '\\');
        assert_eq!(wrap_degrees(180.0), -180.0);
    }

    #[test]
    fn test_snow_glyph_variants() {
        let snow = &assets().snow;
        assert_eq!(snow.variants(), SNOW_GLYPHS.len());
        assert_eq!(snow.glyph(0.0, 3), '❄');
        assert_eq!(snow.glyph(90.0, SNOW_GLYPHS.len()), SNOW_GLYPHS[0]);
    }
}

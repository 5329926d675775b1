//! Color helpers for fading particles.

use ratatui::style::Color;

/// Dim `color` by `alpha` (0.0 = invisible, 1.0 = full color).
///
/// Terminals have no per-cell opacity, so RGB colors are scaled toward black
/// and named colors fall back to dark gray once mostly faded.
pub fn fade(color: Color, alpha: f32) -> Color {
    let alpha = alpha.clamp(0.0, 1.0);
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(
            (r as f32 * alpha) as u8,
            (g as f32 * alpha) as u8,
            (b as f32 * alpha) as u8,
        ),
        other if alpha >= 0.5 => other,
        _ => Color::DarkGray,
    }
}

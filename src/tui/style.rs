//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

/// Power line color.
pub const POWER_COLOR: Color = Color::Cyan;
/// Per-sample energy line color.
pub const ENERGY_COLOR: Color = Color::Yellow;
/// Per-sample emission line color.
pub const CO2_COLOR: Color = Color::LightRed;
/// Tiles for avoided emissions and credits.
pub const GREEN: Color = Color::Green;
/// Share gauge color when high (>= 50%).
pub const SHARE_HIGH: Color = Color::Green;
/// Share gauge color when medium (>= 20%).
pub const SHARE_MID: Color = Color::Yellow;
/// Share gauge color when low (< 20%).
pub const SHARE_LOW: Color = Color::Red;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Waiting and degraded notices.
pub const WARN_COLOR: Color = Color::Magenta;

/// Returns a color based on the renewable share.
pub fn share_color(percent: u8) -> Color {
    if percent >= 50 {
        SHARE_HIGH
    } else if percent >= 20 {
        SHARE_MID
    } else {
        SHARE_LOW
    }
}

/// Computes Y-axis bounds over several series with 10% padding.
pub fn auto_bounds_y(series: &[&[(f64, f64)]]) -> [f64; 2] {
    let all = series.iter().flat_map(|s| s.iter()).map(|&(_, y)| y);
    let min = all.clone().filter(|y| y.is_finite()).fold(f64::INFINITY, f64::min);
    let max = all.filter(|y| y.is_finite()).fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let range = (max - min).max(0.1);
    let pad = range * 0.1;
    [min - pad, max + pad]
}

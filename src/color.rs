use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Metric;

// ---------------------------------------------------------------------------
// Metric colors
// ---------------------------------------------------------------------------

/// Convert an HSL triple (hue in degrees) to an egui color.
fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Stable chart color per metric. Each cumulative/daily pair shares a hue
/// (cases amber, deaths red, vaccinations green); the daily variant is
/// lighter so bars read softer than the matching line.
pub fn metric_color(metric: Metric) -> Color32 {
    let hue = match metric {
        Metric::TotalCases | Metric::NewCases => 35.0,
        Metric::TotalDeaths | Metric::NewDeaths => 0.0,
        Metric::TotalVaccinations | Metric::NewVaccinations => 135.0,
    };
    let lightness = if metric.is_cumulative() { 0.50 } else { 0.68 };
    hsl_color(hue, 0.75, lightness)
}

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints};

use crate::color::metric_color;
use crate::data::model::{FilteredView, Metric};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel – metric cards and charts
// ---------------------------------------------------------------------------

/// Render the dashboard in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to begin  (File → Open…)");
        });
        return;
    }

    ui.heading("COVID-19 Data Tracker");

    // An inverted range halts this render pass; nothing below is computed
    // until the user corrects it.
    if let Some(msg) = &state.range_error {
        ui.separator();
        ui.label(RichText::new(msg).color(Color32::RED));
        return;
    }

    let Some(view) = &state.view else {
        return;
    };

    // The subtitle names the selection the view was built from, not the
    // picker state.
    ui.label(subtitle(view));
    ui.separator();

    metric_cards(ui, view);
    ui.add_space(8.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // Cumulative lines first, daily bars after, matching ALL's order.
            for metric in Metric::ALL {
                if !view.has_values(metric) {
                    continue;
                }
                if metric.is_cumulative() {
                    line_chart(ui, view, metric);
                } else {
                    bar_chart(ui, view, metric);
                }
            }
            ui.add_space(4.0);
            ui.weak("Data: Our World in Data (owid-covid-data.csv)");
        });
}

fn subtitle(view: &FilteredView) -> String {
    format!(
        "Showing data for {} from {} to {}",
        view.country, view.start, view.end
    )
}

// ---------------------------------------------------------------------------
// Metric cards
// ---------------------------------------------------------------------------

const CARD_METRICS: [Metric; 3] = [
    Metric::TotalCases,
    Metric::TotalDeaths,
    Metric::TotalVaccinations,
];

fn metric_cards(ui: &mut Ui, view: &FilteredView) {
    ui.columns(CARD_METRICS.len(), |columns: &mut [Ui]| {
        for (col, metric) in columns.iter_mut().zip(CARD_METRICS) {
            col.group(|ui: &mut Ui| {
                ui.set_min_width(ui.available_width());
                ui.vertical_centered(|ui: &mut Ui| {
                    ui.label(metric.label());
                    ui.label(
                        RichText::new(metric_text(view.latest_value(metric)))
                            .size(26.0)
                            .strong(),
                    );
                });
            });
        }
    });
}

/// Card value: latest non-null as an integer with thousand separators, or
/// "N/A" when the view has none.
fn metric_text(value: Option<f64>) -> String {
    match value {
        Some(v) => thousands(v as i64),
        None => "N/A".to_string(),
    }
}

/// 1234567 → "1,234,567".
fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn chart_title(metric: Metric) -> String {
    if metric.is_cumulative() {
        format!("{} Over Time", metric.label())
    } else {
        format!("Daily {}", metric.label())
    }
}

/// Dates are plotted as days-since-CE so tick labels can be mapped back.
fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn format_x(x: f64) -> String {
    x_to_date(x).map(|d| d.to_string()).unwrap_or_default()
}

fn line_chart(ui: &mut Ui, view: &FilteredView, metric: Metric) {
    // Null cells yield no point at all; the line skips those days.
    let points: PlotPoints = view
        .series(metric)
        .filter_map(|(date, value)| value.map(|v| [date_to_x(date), v]))
        .collect();

    ui.strong(chart_title(metric));
    Plot::new(metric.column())
        .height(240.0)
        .x_axis_formatter(|mark, _range| format_x(mark.value))
        .label_formatter(|name, point| format!("{name}\n{}: {:.0}", format_x(point.x), point.y))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points)
                    .name(metric.label())
                    .color(metric_color(metric))
                    .width(1.5),
            );
        });
    ui.add_space(12.0);
}

fn bar_chart(ui: &mut Ui, view: &FilteredView, metric: Metric) {
    // One bar per non-null day, a little under one day wide.
    let bars: Vec<Bar> = view
        .series(metric)
        .filter_map(|(date, value)| value.map(|v| Bar::new(date_to_x(date), v).width(0.9)))
        .collect();

    ui.strong(chart_title(metric));
    Plot::new(metric.column())
        .height(240.0)
        .x_axis_formatter(|mark, _range| format_x(mark.value))
        .label_formatter(|name, point| format!("{name}\n{}: {:.0}", format_x(point.x), point.y))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name(metric.label())
                    .color(metric_color(metric)),
            );
        });
    ui.add_space(12.0);
}

use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – country and date range selection
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    // ---- Country selector ----
    ui.strong("Country");
    let current = state.country.clone().unwrap_or_default();
    let mut picked: Option<String> = None;
    egui::ComboBox::from_id_salt("country")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for country in filter::list_countries(&dataset) {
                if ui.selectable_label(current == *country, country).clicked() {
                    picked = Some(country.clone());
                }
            }
        });
    if let Some(country) = picked {
        state.set_country(country);
    }
    ui.add_space(8.0);

    // ---- Date range pickers (clamped to the country's bounds) ----
    if let Some((min, max)) = state.bounds {
        ui.strong("Start date");
        let mut start = state.start_date;
        if ui
            .add(DatePickerButton::new(&mut start).id_salt("start_date"))
            .changed()
        {
            state.set_start_date(start);
        }
        ui.add_space(4.0);

        ui.strong("End date");
        let mut end = state.end_date;
        if ui
            .add(DatePickerButton::new(&mut end).id_salt("end_date"))
            .changed()
        {
            state.set_end_date(end);
        }

        ui.add_space(8.0);
        ui.weak(format!("Data available {min} to {max}"));
    }

    if let Some(view) = &state.view {
        ui.separator();
        ui.label(format!("{} rows in view", view.len()));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_reload = state.source.is_some();
            if ui
                .add_enabled(can_reload, egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(dataset) = &state.dataset {
            ui.label(format!(
                "{} records, {} countries",
                dataset.len(),
                dataset.countries.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open COVID-19 dataset")
        .add_filter("Supported files", &["csv", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load_path(path) {
            log::error!("failed to load file: {e}");
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}

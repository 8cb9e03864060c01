use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::CellValue;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – interactive controls
// ---------------------------------------------------------------------------

/// A control edit made during this frame, applied once drawing is done.
enum ControlEdit {
    Range { column: String, min: f64, max: f64 },
    Category(Option<CellValue>),
    Reset,
}

/// Render the sidebar sliders and the category dropdown.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Interactive Controls");
    ui.separator();

    let Some(loaded) = &state.loaded else {
        ui.label("No data loaded.");
        return;
    };
    let unique = &loaded.table.unique_values;
    let filters = &state.filters;
    let mut edits: Vec<ControlEdit> = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Range sliders ----
            for range in &filters.ranges {
                let (lo, hi) = range.bounds;
                let (mut min, mut max) = (range.min, range.max);
                ui.strong(format!("Select {} Range", range.label));
                ui.add(egui::Slider::new(&mut min, lo..=hi).text("min").integer());
                ui.add(egui::Slider::new(&mut max, lo..=hi).text("max").integer());
                if (min, max) != (range.min, range.max) {
                    edits.push(ControlEdit::Range {
                        column: range.column.clone(),
                        min,
                        max,
                    });
                }
                ui.add_space(6.0);
            }

            // ---- Category dropdown ----
            if let Some(category) = &filters.category {
                ui.separator();
                ui.strong(&category.label);
                let current = category
                    .selected
                    .as_ref()
                    .map_or_else(|| "All".to_string(), CellValue::to_string);
                egui::ComboBox::from_id_salt("category_filter")
                    .selected_text(current)
                    .show_ui(ui, |ui: &mut Ui| {
                        if ui
                            .selectable_label(category.selected.is_none(), "All")
                            .clicked()
                        {
                            edits.push(ControlEdit::Category(None));
                        }
                        for value in unique.get(&category.column).into_iter().flatten() {
                            let is_selected = category.selected.as_ref() == Some(value);
                            if ui
                                .selectable_label(is_selected, value.to_string())
                                .clicked()
                            {
                                edits.push(ControlEdit::Category(Some(value.clone())));
                            }
                        }
                    });
            }

            ui.separator();
            if ui.button("Reset filters").clicked() {
                edits.push(ControlEdit::Reset);
            }
        });

    for edit in edits {
        match edit {
            ControlEdit::Range { column, min, max } => state.set_range(&column, min, max),
            ControlEdit::Category(value) => state.select_category(value),
            ControlEdit::Reset => state.reset_filters(),
        }
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
            if ui.button("Reset to default").clicked() {
                state.load(None);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(loaded) = &state.loaded {
            let name = loaded
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| loaded.source.display().to_string());
            let origin = if loaded.is_fallback { "default" } else { "uploaded" };
            ui.label(format!("{name} ({origin})"));
            ui.separator();
            ui.label(format!(
                "{} trips loaded, {} visible",
                state.total_rows(),
                state.dashboard.visible_rows
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
        .set_title("Upload a file")
        .add_filter(
            "Supported files",
            &["csv", "txt", "xlsx", "xls", "parquet", "pq", "json"],
        )
        .add_filter("Delimited text", &["csv", "txt"])
        .add_filter("Spreadsheet", &["xlsx", "xls"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load(Some(&path));
    }
}

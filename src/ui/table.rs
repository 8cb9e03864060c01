use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

const PREVIEW_ROWS: usize = 200;

/// First rows of the filtered view as a table.
pub fn preview(ui: &mut Ui, state: &AppState) {
    let Some(loaded) = &state.loaded else {
        return;
    };
    let table = &loaded.table;
    let shown = state.visible_indices.len().min(PREVIEW_ROWS);

    egui::CollapsingHeader::new(format!(
        "Filtered trips (showing {shown} of {})",
        state.visible_indices.len()
    ))
    .default_open(false)
    .show(ui, |ui: &mut Ui| {
        ui.push_id("trip_preview", |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .max_scroll_height(320.0)
                .columns(Column::auto().at_least(70.0), table.column_names.len())
                .header(20.0, |mut header| {
                    for name in &table.column_names {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, shown, |mut row| {
                        let trip = &table.trips[state.visible_indices[row.index()]];
                        for name in &table.column_names {
                            row.col(|ui: &mut Ui| {
                                if let Some(value) = trip.get(name) {
                                    ui.label(value.to_string());
                                }
                            });
                        }
                    });
                });
        });
    });
}

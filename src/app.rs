use eframe::egui;

use crate::config::Config;
use crate::state::AppState;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TaxiDashboardApp {
    pub state: AppState,
}

impl TaxiDashboardApp {
    /// Build the app and load the fallback table.
    pub fn new(config: &Config) -> Self {
        let mut state = AppState::new(config);
        state.load(None);
        Self { state }
    }
}

impl eframe::App for TaxiDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: controls ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("🚕 Taxi Fare Dashboard");
            ui.add_space(4.0);
            charts::dashboard(ui, &self.state);
        });
    }
}

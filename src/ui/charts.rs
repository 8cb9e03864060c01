use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Sense, Shape, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint,
    PlotPoints, Points,
};

use crate::color::{generate_palette, ColorMap};
use crate::dashboard::{Chart, ChartData, ScatterSeries};
use crate::data::aggregate::{Bin, BoxStats, Group, GroupLabel};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;
const BAR_COLOR: Color32 = Color32::from_rgb(99, 110, 250);

// ---------------------------------------------------------------------------
// Dashboard grid (central panel)
// ---------------------------------------------------------------------------

/// Render every chart of the current dashboard in a two-column grid.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(loaded) = &state.loaded else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view trips  (File → Open…)");
        });
        return;
    };
    if loaded.table.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(format!("{} has no rows", loaded.source.display()));
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for pair in state.dashboard.charts.chunks(2) {
                ui.columns(2, |cols: &mut [Ui]| {
                    for (col, chart) in cols.iter_mut().zip(pair) {
                        chart_card(col, chart, &state.color_map);
                    }
                });
                ui.add_space(12.0);
            }

            ui.separator();
            super::table::preview(ui, state);
        });
}

/// Title, optional note, and the chart body.
fn chart_card(ui: &mut Ui, chart: &Chart, color_map: &ColorMap) {
    let spec = &chart.spec;
    ui.strong(spec.title);
    if let Some(note) = &chart.note {
        ui.label(RichText::new(note).italics().color(Color32::GRAY));
        ui.allocate_space(egui::vec2(ui.available_width(), CHART_HEIGHT));
        return;
    }

    let plot = Plot::new(spec.title)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(spec.x_label)
        .y_axis_label(spec.y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true);

    match &chart.data {
        ChartData::Bar(groups) => {
            let labels = labels_of(groups.iter().map(|g| &g.label));
            plot.x_axis_formatter(category_formatter(labels))
                .show(ui, |plot_ui| plot_ui.bar_chart(bar_chart(groups, spec.y_label)));
        }
        ChartData::Pie(groups) => pie_chart(ui, groups),
        ChartData::Line { groups, markers } => {
            let labels = labels_of(groups.iter().map(|g| &g.label));
            let points: Vec<[f64; 2]> = groups
                .iter()
                .enumerate()
                .map(|(i, g)| [i as f64, g.value])
                .collect();
            plot.x_axis_formatter(category_formatter(labels))
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new(PlotPoints::from(points.clone()))
                            .name(spec.y_label)
                            .color(BAR_COLOR)
                            .width(2.0),
                    );
                    if *markers {
                        plot_ui.points(Points::new(PlotPoints::from(points)).radius(3.5).color(BAR_COLOR));
                    }
                });
        }
        ChartData::Scatter(series) => {
            let (x_label, y_label) = (spec.x_label, spec.y_label);
            plot.label_formatter(move |name: &str, value: &PlotPoint| {
                scatter_hover(series, name, value, x_label, y_label)
            })
            .show(ui, |plot_ui| {
                for s in series {
                    plot_ui.points(scatter_points(s, color_map));
                }
            });
        }
        ChartData::Histogram(bins) => {
            plot.show(ui, |plot_ui| plot_ui.bar_chart(histogram_chart(bins)));
        }
        ChartData::Box(stats) => {
            let labels = labels_of(stats.iter().map(|(label, _)| label));
            plot.x_axis_formatter(category_formatter(labels))
                .show(ui, |plot_ui| plot_ui.box_plot(box_plot(stats)));
        }
    }
}

// ---------------------------------------------------------------------------
// Plot item builders
// ---------------------------------------------------------------------------

fn labels_of<'a>(labels: impl Iterator<Item = &'a GroupLabel>) -> Vec<String> {
    labels.map(|l| l.to_string()).collect()
}

/// Axis formatter that prints group labels at integer positions.
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

fn bar_chart(groups: &[Group], name: &str) -> BarChart {
    let bars = groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            Bar::new(i as f64, g.value)
                .name(g.label.to_string())
                .width(0.7)
        })
        .collect();
    BarChart::new(bars).name(name).color(BAR_COLOR)
}

fn histogram_chart(bins: &[Bin]) -> BarChart {
    let bars = bins
        .iter()
        .map(|b| {
            Bar::new(b.center(), b.count as f64)
                .width(b.width())
                .name(format!("{:.2} – {:.2}", b.start, b.end))
        })
        .collect();
    BarChart::new(bars).name("Count").color(BAR_COLOR)
}

fn box_plot(stats: &[(GroupLabel, BoxStats)]) -> BoxPlot {
    let palette = generate_palette(stats.len());
    let elems = stats
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(i, ((label, s), color))| {
            BoxElem::new(
                i as f64,
                BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker),
            )
            .name(format!("{label} (n={})", s.count))
            .fill(color.gamma_multiply(0.5))
            .stroke(Stroke::new(1.5, color))
            .box_width(0.6)
        })
        .collect();
    BoxPlot::new(elems).name("Fare Amount")
}

fn scatter_points(series: &ScatterSeries, color_map: &ColorMap) -> Points<'static> {
    let points = Points::new(PlotPoints::from(series.points.clone())).radius(2.0);
    match &series.category {
        Some(category) => points
            .name(category.to_string())
            .color(color_map.color_for(category)),
        None => points.color(BAR_COLOR),
    }
}

/// Hover text: the cursor position plus the details of the nearest point in
/// the hovered series.
fn scatter_hover(
    series: &[ScatterSeries],
    name: &str,
    value: &PlotPoint,
    x_label: &str,
    y_label: &str,
) -> String {
    let mut text = format!("{x_label}: {:.2}\n{y_label}: {:.2}", value.x, value.y);
    let hovered = series.iter().find(|s| match &s.category {
        Some(category) => category.to_string() == name,
        None => true,
    });
    let nearest = hovered.and_then(|s| {
        s.points
            .iter()
            .zip(&s.details)
            .min_by(|(a, _), (b, _)| {
                let da = (a[0] - value.x).powi(2) + (a[1] - value.y).powi(2);
                let db = (b[0] - value.x).powi(2) + (b[1] - value.y).powi(2);
                da.total_cmp(&db)
            })
            .map(|(_, detail)| detail)
    });
    if let Some(detail) = nearest.filter(|d| !d.is_empty()) {
        text.push('\n');
        text.push_str(detail);
    }
    text
}

// ---------------------------------------------------------------------------
// Pie chart (egui_plot has none; drawn with the painter)
// ---------------------------------------------------------------------------

fn pie_chart(ui: &mut Ui, groups: &[Group]) {
    let total: f64 = groups.iter().map(|g| g.value).sum();
    let palette = generate_palette(groups.len());

    ui.horizontal(|ui: &mut Ui| {
        let side = CHART_HEIGHT.min(ui.available_width() * 0.6);
        let (response, painter) = ui.allocate_painter(egui::vec2(side, side), Sense::hover());
        let center = response.rect.center();
        let radius = side / 2.0 - 4.0;

        let mut start = -TAU / 4.0;
        for (group, &color) in groups.iter().zip(&palette) {
            let sweep = (group.value / total) as f32 * TAU;
            // Fan of thin triangles keeps every shape convex.
            let steps = ((sweep / 0.05).ceil() as usize).max(1);
            for k in 0..steps {
                let a0 = start + sweep * k as f32 / steps as f32;
                let a1 = start + sweep * (k + 1) as f32 / steps as f32;
                painter.add(Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * egui::vec2(a0.cos(), a0.sin()),
                        center + radius * egui::vec2(a1.cos(), a1.sin()),
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
            start += sweep;
        }

        ScrollArea::vertical()
            .id_salt(response.id)
            .max_height(side)
            .show(ui, |ui: &mut Ui| {
                for (group, &color) in groups.iter().zip(&palette) {
                    let share = 100.0 * group.value / total;
                    ui.label(
                        RichText::new(format!("■ {}  {:.1}%", group.label, share)).color(color),
                    );
                }
            });
    });
}

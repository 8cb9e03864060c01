//! The fixed chart catalogue, derived from one filtered view.
//!
//! Every chart is computed independently from the same row indices; nothing
//! here depends on egui, so the whole dashboard can be rebuilt and checked
//! without a window.

use std::collections::BTreeMap;

use crate::data::aggregate::{
    self, group_by, grouped_box_stats, histogram, Aggregation, Bin, BoxStats, Group, GroupKey,
    GroupLabel,
};
use crate::data::model::{columns, CellValue, TripTable};

/// Points of one scatter series; `category` is the colour-by value, if any.
/// `details` holds one hover line per point.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub category: Option<CellValue>,
    pub points: Vec<[f64; 2]>,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Bar(Vec<Group>),
    Pie(Vec<Group>),
    Line { groups: Vec<Group>, markers: bool },
    Scatter(Vec<ScatterSeries>),
    Histogram(Vec<Bin>),
    Box(Vec<(GroupLabel, BoxStats)>),
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Bar(g) | ChartData::Pie(g) => g.is_empty(),
            ChartData::Line { groups, .. } => groups.is_empty(),
            ChartData::Scatter(s) => s.iter().all(|s| s.points.is_empty()),
            ChartData::Histogram(b) => b.is_empty(),
            ChartData::Box(b) => b.is_empty(),
        }
    }
}

/// How a chart is derived from the filtered view.
#[derive(Debug, Clone)]
pub enum ChartKind {
    Bar { key: GroupKey, value: &'static str, agg: Aggregation },
    Pie { key: GroupKey, value: &'static str, agg: Aggregation },
    Line { key: GroupKey, value: &'static str, agg: Aggregation, markers: bool },
    Scatter {
        x: &'static str,
        y: &'static str,
        color_by: Option<&'static str>,
        hover: &'static [&'static str],
    },
    Histogram { column: &'static str },
    Box { key: &'static str, value: &'static str },
}

#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub kind: ChartKind,
}

impl ChartSpec {
    /// Columns the chart needs; `Count` aggregations need no value column.
    fn required_columns(&self) -> Vec<&str> {
        fn key_cols(key: &GroupKey) -> Vec<&str> {
            match key {
                GroupKey::Column(c) => vec![c.as_str()],
                GroupKey::YearMonth => vec![columns::YEAR, columns::MONTH],
            }
        }
        match &self.kind {
            ChartKind::Bar { key, value, agg }
            | ChartKind::Pie { key, value, agg }
            | ChartKind::Line { key, value, agg, .. } => {
                let mut cols = key_cols(key);
                if *agg != Aggregation::Count {
                    cols.push(*value);
                }
                cols
            }
            ChartKind::Scatter { x, y, .. } => vec![*x, *y],
            ChartKind::Histogram { column } => vec![*column],
            ChartKind::Box { key, value } => vec![*key, *value],
        }
    }

    fn compute(&self, table: &TripTable, rows: &[usize], bins: usize) -> ChartData {
        match &self.kind {
            ChartKind::Bar { key, value, agg } => {
                ChartData::Bar(group_by(table, rows, key, value, *agg))
            }
            ChartKind::Pie { key, value, agg } => {
                let mut groups = group_by(table, rows, key, value, *agg);
                // Negative slices cannot be drawn.
                groups.retain(|g| g.value > 0.0);
                ChartData::Pie(groups)
            }
            ChartKind::Line { key, value, agg, markers } => ChartData::Line {
                groups: group_by(table, rows, key, value, *agg),
                markers: *markers,
            },
            ChartKind::Scatter { x, y, color_by, hover } => {
                let color_by = (*color_by).filter(|c| table.has_column(c));
                ChartData::Scatter(scatter_series(table, rows, x, y, color_by, hover))
            }
            ChartKind::Histogram { column } => {
                ChartData::Histogram(histogram(&aggregate::column_values(table, rows, column), bins))
            }
            ChartKind::Box { key, value } => {
                ChartData::Box(grouped_box_stats(table, rows, key, value))
            }
        }
    }
}

/// Split scatter points into one series per value of `color_by`.
///
/// Each point's hover line lists the `hover` columns of its row.
fn scatter_series(
    table: &TripTable,
    rows: &[usize],
    x: &str,
    y: &str,
    color_by: Option<&str>,
    hover: &[&str],
) -> Vec<ScatterSeries> {
    let mut series: BTreeMap<Option<CellValue>, ScatterSeries> = BTreeMap::new();
    for (row, point) in aggregate::scatter_points(table, rows, x, y) {
        let trip = &table.trips[row];
        let category =
            color_by.map(|c| trip.get(c).cloned().unwrap_or(CellValue::Null));
        let detail = hover
            .iter()
            .filter_map(|col| Some(format!("{col}: {}", trip.get(col)?)))
            .collect::<Vec<_>>()
            .join("\n");

        let entry = series
            .entry(category.clone())
            .or_insert_with(|| ScatterSeries {
                category,
                points: Vec::new(),
                details: Vec::new(),
            });
        entry.points.push(point);
        entry.details.push(detail);
    }

    if series.is_empty() && color_by.is_none() {
        series.insert(
            None,
            ScatterSeries {
                category: None,
                points: Vec::new(),
                details: Vec::new(),
            },
        );
    }
    series.into_values().collect()
}

/// The charts shown on the dashboard, in display order.
pub fn catalogue() -> Vec<ChartSpec> {
    use columns::*;
    vec![
        ChartSpec {
            title: "Total Fare Amount by Category",
            x_label: "Model",
            y_label: "Fare Amount",
            kind: ChartKind::Bar {
                key: GroupKey::column(MODEL),
                value: FARE_AMOUNT,
                agg: Aggregation::Sum,
            },
        },
        ChartSpec {
            title: "Fare Amount by Region",
            x_label: "Pickup Location",
            y_label: "Fare Amount",
            kind: ChartKind::Pie {
                key: GroupKey::column(PICKUP_LOCATION_ID),
                value: FARE_AMOUNT,
                agg: Aggregation::Sum,
            },
        },
        ChartSpec {
            title: "Fare Amount by Passenger Count",
            x_label: "Passengers",
            y_label: "Fare Amount",
            kind: ChartKind::Pie {
                key: GroupKey::column(PASSENGER_COUNT),
                value: FARE_AMOUNT,
                agg: Aggregation::Sum,
            },
        },
        ChartSpec {
            title: "Fare Amount by Month",
            x_label: "Month",
            y_label: "Fare Amount",
            kind: ChartKind::Line {
                key: GroupKey::YearMonth,
                value: FARE_AMOUNT,
                agg: Aggregation::Sum,
                markers: true,
            },
        },
        ChartSpec {
            title: "Fare Amount vs. Trip Duration",
            x_label: "Trip Duration",
            y_label: "Fare Amount",
            kind: ChartKind::Scatter {
                x: TRIP_DURATION,
                y: FARE_AMOUNT,
                color_by: None,
                hover: &[MODEL, RATE_CODE],
            },
        },
        ChartSpec {
            title: "Trip Distance vs. Fare Amount",
            x_label: "Trip Distance",
            y_label: "Fare Amount",
            kind: ChartKind::Scatter {
                x: TRIP_DISTANCE,
                y: FARE_AMOUNT,
                color_by: Some(MODEL),
                hover: &[MODEL, RATE_CODE, TRIP_DURATION],
            },
        },
        ChartSpec {
            title: "Rate Code vs. Fare Amount",
            x_label: "Rate Code",
            y_label: "Fare Amount",
            kind: ChartKind::Box { key: RATE_CODE, value: FARE_AMOUNT },
        },
        ChartSpec {
            title: "Tip Amount Distribution",
            x_label: "Tip Amount",
            y_label: "Count",
            kind: ChartKind::Histogram { column: TIP_AMOUNT },
        },
        ChartSpec {
            title: "Tolls Amount Distribution",
            x_label: "Tolls Amount",
            y_label: "Count",
            kind: ChartKind::Histogram { column: TOLLS_AMOUNT },
        },
        ChartSpec {
            title: "Trip Duration Distribution",
            x_label: "Trip Duration",
            y_label: "Count",
            kind: ChartKind::Histogram { column: TRIP_DURATION },
        },
        ChartSpec {
            title: "Total Amount Over the Years",
            x_label: "Year",
            y_label: "Total Amount",
            kind: ChartKind::Line {
                key: GroupKey::column(YEAR),
                value: TOTAL_AMOUNT,
                agg: Aggregation::Sum,
                markers: false,
            },
        },
        ChartSpec {
            title: "Fare Amount by Day of Week",
            x_label: "Day of Week",
            y_label: "Fare Amount",
            kind: ChartKind::Bar {
                key: GroupKey::column(DAY_OF_WEEK),
                value: FARE_AMOUNT,
                agg: Aggregation::Sum,
            },
        },
        ChartSpec {
            title: "Mean Fare Amount by Day of Week",
            x_label: "Day of Week",
            y_label: "Fare Amount",
            kind: ChartKind::Bar {
                key: GroupKey::column(DAY_OF_WEEK),
                value: FARE_AMOUNT,
                agg: Aggregation::Mean,
            },
        },
        ChartSpec {
            title: "Trips by Day of Week",
            x_label: "Day of Week",
            y_label: "Trips",
            kind: ChartKind::Bar {
                key: GroupKey::column(DAY_OF_WEEK),
                value: FARE_AMOUNT,
                agg: Aggregation::Count,
            },
        },
    ]
}

/// One rendered-ready chart.
#[derive(Debug, Clone)]
pub struct Chart {
    pub spec: ChartSpec,
    pub data: ChartData,
    /// Shown instead of the chart body when there is nothing to draw.
    pub note: Option<String>,
}

/// All charts for the current filtered view.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub charts: Vec<Chart>,
    pub visible_rows: usize,
}

impl Dashboard {
    /// Recompute every chart from `rows`, the filtered view of `table`.
    pub fn build(table: &TripTable, rows: &[usize], bins: usize) -> Self {
        let charts = catalogue()
            .into_iter()
            .map(|spec| {
                let missing: Vec<&str> = spec
                    .required_columns()
                    .into_iter()
                    .filter(|c| !table.has_column(c))
                    .collect();
                if !missing.is_empty() {
                    let note = format!("missing column(s): {}", missing.join(", "));
                    log::debug!("Skipping chart '{}': {note}", spec.title);
                    let data = spec.compute(&TripTable::default(), &[], bins);
                    return Chart { spec, data, note: Some(note) };
                }

                let data = spec.compute(table, rows, bins);
                let note = data.is_empty().then(|| "no data for the current filters".to_string());
                Chart { spec, data, note }
            })
            .collect();

        Dashboard {
            charts,
            visible_rows: rows.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filtered_indices, init_filter_state};
    use crate::data::model::tests::{floats, ints, strs, table};

    fn full_table() -> TripTable {
        table(&[
            ("fare_amount", floats(&[10.0, 20.0, 5.0, 40.0])),
            ("trip_distance", floats(&[1.0, 3.0, 0.5, 9.0])),
            ("trip_duration", floats(&[5.0, 12.0, 3.0, 30.0])),
            ("passenger_count", ints(&[1, 2, 1, 4])),
            ("pickup_location_id", ints(&[100, 100, 7, 7])),
            ("model", strs(&["Sedan", "SUV", "Sedan", "Van"])),
            ("rate_code", ints(&[1, 1, 1, 2])),
            ("tip_amount", floats(&[1.0, 2.0, 0.0, 5.0])),
            ("tolls_amount", floats(&[0.0, 0.0, 0.0, 6.5])),
            ("total_amount", floats(&[11.0, 22.0, 5.0, 51.5])),
            ("day_of_week", strs(&["Mon", "Mon", "Tue", "Sun"])),
            ("year", ints(&[2019, 2019, 2020, 2020])),
            ("month", ints(&[1, 2, 1, 1])),
        ])
    }

    fn chart<'a>(d: &'a Dashboard, title: &str) -> &'a Chart {
        d.charts.iter().find(|c| c.spec.title == title).unwrap()
    }

    #[test]
    fn every_chart_is_built_from_the_view() {
        let t = full_table();
        let rows = filtered_indices(&t, &init_filter_state(&t));
        let d = Dashboard::build(&t, &rows, 10);
        assert_eq!(d.charts.len(), catalogue().len());
        assert_eq!(d.visible_rows, 4);
        assert!(d.charts.iter().all(|c| c.note.is_none()), "{:?}", d.charts);

        match &chart(&d, "Fare Amount by Region").data {
            ChartData::Pie(groups) => {
                assert_eq!(groups.len(), 2);
                assert_eq!(groups[0].value, 45.0);
                assert_eq!(groups[1].value, 30.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &chart(&d, "Trips by Day of Week").data {
            ChartData::Bar(groups) => {
                let mon = groups.iter().find(|g| g.label.to_string() == "Mon").unwrap();
                assert_eq!(mon.value, 2.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &chart(&d, "Trip Distance vs. Fare Amount").data {
            ChartData::Scatter(series) => assert_eq!(series.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fare_by_day_sums_each_day() {
        let t = full_table();
        let d = Dashboard::build(&t, &[0, 1, 2], 10);
        match &chart(&d, "Fare Amount by Day of Week").data {
            ChartData::Bar(groups) => {
                let by_day: Vec<(String, f64)> =
                    groups.iter().map(|g| (g.label.to_string(), g.value)).collect();
                assert_eq!(by_day, vec![("Mon".to_string(), 30.0), ("Tue".to_string(), 5.0)]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scatter_points_carry_hover_details() {
        let t = full_table();
        let d = Dashboard::build(&t, &[3], 10);
        match &chart(&d, "Trip Distance vs. Fare Amount").data {
            ChartData::Scatter(series) => {
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].points, vec![[9.0, 40.0]]);
                assert_eq!(
                    series[0].details,
                    vec!["model: Van\nrate_code: 2\ntrip_duration: 30".to_string()]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        match &chart(&d, "Fare Amount vs. Trip Duration").data {
            ChartData::Scatter(series) => {
                assert_eq!(series[0].details, vec!["model: Van\nrate_code: 2".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn charts_follow_the_filtered_view() {
        let t = full_table();
        let d = Dashboard::build(&t, &[0, 2], 10);
        match &chart(&d, "Total Fare Amount by Category").data {
            ChartData::Bar(groups) => {
                assert_eq!(groups.len(), 1);
                assert_eq!(groups[0].value, 15.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &chart(&d, "Fare Amount by Month").data {
            ChartData::Line { groups, markers } => {
                assert!(*markers);
                let labels: Vec<String> = groups.iter().map(|g| g.label.to_string()).collect();
                assert_eq!(labels, vec!["2019-1", "2020-1"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_view_yields_notes_not_panics() {
        let t = full_table();
        let d = Dashboard::build(&t, &[], 10);
        assert_eq!(d.visible_rows, 0);
        assert!(d.charts.iter().all(|c| c.note.is_some()));
    }

    #[test]
    fn missing_columns_are_reported() {
        let t = table(&[("fare_amount", floats(&[1.0, 2.0]))]);
        let d = Dashboard::build(&t, &[0, 1], 10);
        let c = chart(&d, "Rate Code vs. Fare Amount");
        assert_eq!(c.note.as_deref(), Some("missing column(s): rate_code"));
        assert!(c.data.is_empty());
    }

    #[test]
    fn rebuild_is_idempotent() {
        let t = full_table();
        let a = Dashboard::build(&t, &[0, 1, 3], 5);
        let b = Dashboard::build(&t, &[0, 1, 3], 5);
        let data_a: Vec<&ChartData> = a.charts.iter().map(|c| &c.data).collect();
        let data_b: Vec<&ChartData> = b.charts.iter().map(|c| &c.data).collect();
        assert_eq!(data_a, data_b);
    }
}

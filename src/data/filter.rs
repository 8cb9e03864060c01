use super::model::{columns, CellValue, Trip, TripTable};

// ---------------------------------------------------------------------------
// Filter predicates: numeric ranges and a category choice
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` window over a numeric column, driven by a slider.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub column: String,
    pub label: String,
    /// Slider bounds (integer floor / ceil of the column extent).
    pub bounds: (f64, f64),
    pub min: f64,
    pub max: f64,
}

impl RangeFilter {
    fn matches(&self, trip: &Trip) -> bool {
        trip.number(&self.column)
            .is_some_and(|v| v >= self.min && v <= self.max)
    }

    /// Clamp the selection to the slider bounds and keep `min <= max`.
    pub fn clamp(&mut self) {
        let (lo, hi) = self.bounds;
        self.min = self.min.clamp(lo, hi);
        self.max = self.max.clamp(lo, hi);
        if self.min > self.max {
            std::mem::swap(&mut self.min, &mut self.max);
        }
    }
}

/// Dropdown over the unique values of a categorical column. `None` is "All".
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFilter {
    pub column: String,
    pub label: String,
    pub selected: Option<CellValue>,
}

impl CategoryFilter {
    fn matches(&self, trip: &Trip) -> bool {
        match &self.selected {
            None => true,
            Some(want) => trip.get(&self.column).unwrap_or(&CellValue::Null) == want,
        }
    }
}

/// Current values of every sidebar control.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub ranges: Vec<RangeFilter>,
    pub category: Option<CategoryFilter>,
}

/// `(column, label, lower default starts at zero)` for each slider.
const RANGE_CONTROLS: [(&str, &str, bool); 4] = [
    (columns::TRIP_DISTANCE, "Trip Distance", true),
    (columns::FARE_AMOUNT, "Fare Amount", true),
    (columns::TRIP_DURATION, "Trip Duration", true),
    (columns::YEAR, "Year", false),
];

/// Build the default controls for a table.
///
/// Sliders only exist for numeric columns present in the table. Distance,
/// fare and duration default to `(0, max)`; year defaults to its full span.
pub fn init_filter_state(table: &TripTable) -> FilterState {
    let ranges = RANGE_CONTROLS
        .iter()
        .filter_map(|&(column, label, from_zero)| {
            let extent = table.extent(column)?;
            let bounds = (extent.min.floor(), extent.max.ceil());
            let mut range = RangeFilter {
                column: column.to_string(),
                label: label.to_string(),
                bounds,
                min: if from_zero { 0.0 } else { bounds.0 },
                max: bounds.1,
            };
            range.clamp();
            Some(range)
        })
        .collect();

    let category = table.has_column(columns::MODEL).then(|| CategoryFilter {
        column: columns::MODEL.to_string(),
        label: "Model".to_string(),
        selected: None,
    });

    FilterState { ranges, category }
}

/// Whether a trip passes every active predicate (logical AND).
///
/// A trip whose value for a range column is missing or non-numeric fails
/// that range.
pub fn matches(trip: &Trip, filters: &FilterState) -> bool {
    filters.ranges.iter().all(|r| r.matches(trip))
        && filters.category.as_ref().map_or(true, |c| c.matches(trip))
}

/// Return indices of trips that pass all active filters, in table order.
pub fn filtered_indices(table: &TripTable, filters: &FilterState) -> Vec<usize> {
    table
        .trips
        .iter()
        .enumerate()
        .filter(|(_, trip)| matches(trip, filters))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{floats, ints, strs, table};

    fn sample() -> TripTable {
        table(&[
            ("trip_distance", floats(&[0.5, 2.0, 3.5, 8.0, 12.2, 1.1])),
            ("fare_amount", floats(&[4.0, 9.5, 14.0, 30.0, 52.5, -2.5])),
            ("trip_duration", floats(&[3.0, 10.0, 15.0, 28.0, 40.0, 6.0])),
            ("year", ints(&[2018, 2019, 2019, 2020, 2021, 2019])),
            ("model", strs(&["Sedan", "SUV", "Sedan", "Van", "SUV", "Sedan"])),
        ])
    }

    fn range_mut<'a>(f: &'a mut FilterState, col: &str) -> &'a mut RangeFilter {
        f.ranges.iter_mut().find(|r| r.column == col).unwrap()
    }

    /// Reference predicate written out directly, row by row.
    fn expected(t: &TripTable, f: &FilterState) -> Vec<usize> {
        let mut out = Vec::new();
        'rows: for (i, trip) in t.trips.iter().enumerate() {
            for r in &f.ranges {
                match trip.number(&r.column) {
                    Some(v) if v >= r.min && v <= r.max => {}
                    _ => continue 'rows,
                }
            }
            if let Some(c) = &f.category {
                if let Some(sel) = &c.selected {
                    if trip.get(&c.column) != Some(sel) {
                        continue;
                    }
                }
            }
            out.push(i);
        }
        out
    }

    #[test]
    fn defaults_cover_span_from_zero() {
        let t = sample();
        let f = init_filter_state(&t);
        assert_eq!(f.ranges.len(), 4);

        let fare = f.ranges.iter().find(|r| r.column == "fare_amount").unwrap();
        assert_eq!(fare.bounds, (-3.0, 53.0));
        assert_eq!((fare.min, fare.max), (0.0, 53.0));

        let year = f.ranges.iter().find(|r| r.column == "year").unwrap();
        assert_eq!((year.min, year.max), (2018.0, 2021.0));

        // The negative fare is outside the default window.
        assert_eq!(filtered_indices(&t, &f), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn filtered_rows_satisfy_every_predicate() {
        let t = sample();
        let mut f = init_filter_state(&t);
        range_mut(&mut f, "trip_distance").max = 9.0;
        range_mut(&mut f, "year").min = 2019.0;
        assert_eq!(filtered_indices(&t, &f), expected(&t, &f));
        assert_eq!(filtered_indices(&t, &f), vec![1, 2, 3]);

        f.category.as_mut().unwrap().selected = Some(CellValue::String("Sedan".into()));
        assert_eq!(filtered_indices(&t, &f), expected(&t, &f));
        assert_eq!(filtered_indices(&t, &f), vec![2]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let t = sample();
        let mut f = init_filter_state(&t);
        let fare = range_mut(&mut f, "fare_amount");
        fare.min = 9.5;
        fare.max = 14.0;
        assert_eq!(filtered_indices(&t, &f), vec![1, 2]);
    }

    #[test]
    fn shrinking_a_range_never_grows_the_view() {
        let t = sample();
        let mut f = init_filter_state(&t);
        let mut previous = filtered_indices(&t, &f).len();
        for step in 0..12 {
            let d = range_mut(&mut f, "trip_distance");
            d.max -= 1.0;
            d.clamp();
            if step % 3 == 0 {
                let dur = range_mut(&mut f, "trip_duration");
                dur.min += 2.0;
                dur.clamp();
            }
            let now = filtered_indices(&t, &f);
            assert_eq!(now, expected(&t, &f));
            assert!(now.len() <= previous);
            previous = now.len();
        }
    }

    #[test]
    fn missing_values_fail_range() {
        let t = table(&[(
            "fare_amount",
            vec![CellValue::Float(5.0), CellValue::Null, CellValue::String("n/a".into())],
        )]);
        let f = init_filter_state(&t);
        assert_eq!(filtered_indices(&t, &f), vec![0]);
    }

    #[test]
    fn absent_columns_have_no_controls() {
        let t = table(&[("tip_amount", floats(&[1.0, 2.0]))]);
        let f = init_filter_state(&t);
        assert!(f.ranges.is_empty());
        assert!(f.category.is_none());
        assert_eq!(filtered_indices(&t, &f), vec![0, 1]);
    }

    #[test]
    fn clamp_orders_and_bounds_selection() {
        let mut r = RangeFilter {
            column: "x".into(),
            label: "X".into(),
            bounds: (0.0, 10.0),
            min: 12.0,
            max: -4.0,
        };
        r.clamp();
        assert_eq!((r.min, r.max), (0.0, 10.0));
    }
}

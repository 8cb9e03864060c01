use std::collections::BTreeMap;
use std::fmt;

use super::model::{columns, CellValue, Trip, TripTable};

// ---------------------------------------------------------------------------
// Group-by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
    Count,
}

/// What rows are grouped by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    /// The value of a single column.
    Column(String),
    /// `year` and `month` combined, e.g. `2019-3`.
    YearMonth,
}

impl GroupKey {
    pub fn column(name: &str) -> Self {
        GroupKey::Column(name.to_string())
    }

    /// Key for one trip; `None` when the key column is missing.
    fn key_of(&self, trip: &Trip) -> Option<GroupLabel> {
        match self {
            GroupKey::Column(col) => trip.get(col).map(|v| GroupLabel::Value(v.normalized())),
            GroupKey::YearMonth => {
                let year = trip.get(columns::YEAR)?.as_f64()? as i64;
                let month = trip.get(columns::MONTH)?.as_f64()? as i64;
                Some(GroupLabel::YearMonth(year, month))
            }
        }
    }
}

/// A group's key. Year-month keys sort chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GroupLabel {
    Value(CellValue),
    YearMonth(i64, i64),
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Value(v) => write!(f, "{v}"),
            GroupLabel::YearMonth(y, m) => write!(f, "{y}-{m}"),
        }
    }
}

/// One output row of a group-by.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: GroupLabel,
    pub value: f64,
    /// Rows that contributed to `value`.
    pub rows: usize,
}

/// Group the given rows by `key` and aggregate `value_column`.
///
/// Groups come back ordered by key. `Sum` and `Mean` only consider rows with
/// a numeric value in `value_column`; a group with none of those is dropped.
/// `Count` counts every row in the group and ignores `value_column`.
pub fn group_by(
    table: &TripTable,
    rows: &[usize],
    key: &GroupKey,
    value_column: &str,
    agg: Aggregation,
) -> Vec<Group> {
    let mut acc: BTreeMap<GroupLabel, (f64, usize)> = BTreeMap::new();

    for trip in rows.iter().filter_map(|&i| table.trips.get(i)) {
        let Some(label) = key.key_of(trip) else {
            continue;
        };
        let contribution = match agg {
            Aggregation::Count => Some(0.0),
            Aggregation::Sum | Aggregation::Mean => trip.number(value_column),
        };
        if let Some(v) = contribution {
            let entry = acc.entry(label).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }

    acc.into_iter()
        .map(|(label, (sum, n))| {
            let value = match agg {
                Aggregation::Sum => sum,
                Aggregation::Mean => sum / n as f64,
                Aggregation::Count => n as f64,
            };
            Group { label, value, rows: n }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Column extraction
// ---------------------------------------------------------------------------

/// Numeric values of a column over the given rows, skipping non-numeric cells.
pub fn column_values(table: &TripTable, rows: &[usize], column: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|&i| table.trips.get(i)?.number(column))
        .collect()
}

/// `(row, [x, y])` for rows where both columns are numeric.
pub fn scatter_points(
    table: &TripTable,
    rows: &[usize],
    x: &str,
    y: &str,
) -> Vec<(usize, [f64; 2])> {
    rows.iter()
        .filter_map(|&i| {
            let trip = table.trips.get(i)?;
            Some((i, [trip.number(x)?, trip.number(y)?]))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width bins over `[min, max]`; the last bin includes `max`.
///
/// All values equal gives a single unit-width bin centred on the value.
pub fn histogram(values: &[f64], nbins: usize) -> Vec<Bin> {
    if values.is_empty() || nbins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if (max - min).abs() < f64::EPSILON {
        return vec![Bin {
            start: min - 0.5,
            end: min + 0.5,
            count: values.len(),
        }];
    }

    let width = (max - min) / nbins as f64;
    let mut bins: Vec<Bin> = (0..nbins)
        .map(|i| Bin {
            start: min + i as f64 * width,
            end: if i + 1 == nbins { max } else { min + (i + 1) as f64 * width },
            count: 0,
        })
        .collect();

    for &v in values {
        let idx = (((v - min) / width) as usize).min(nbins - 1);
        bins[idx].count += 1;
    }
    bins
}

// ---------------------------------------------------------------------------
// Box plot statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub count: usize,
}

/// Quartiles with linear interpolation; whiskers reach the furthest value
/// within 1.5 × IQR of the box.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let fence = 1.5 * (q3 - q1);

    let lower_whisker = sorted
        .iter()
        .copied()
        .find(|&v| v >= q1 - fence)
        .unwrap_or(q1);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= q3 + fence)
        .unwrap_or(q3);

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        count: sorted.len(),
    })
}

/// `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Box statistics of `value_column` for each group of `key_column`.
pub fn grouped_box_stats(
    table: &TripTable,
    rows: &[usize],
    key_column: &str,
    value_column: &str,
) -> Vec<(GroupLabel, BoxStats)> {
    let mut groups: BTreeMap<GroupLabel, Vec<f64>> = BTreeMap::new();
    for trip in rows.iter().filter_map(|&i| table.trips.get(i)) {
        let (Some(key), Some(v)) = (trip.get(key_column), trip.number(value_column)) else {
            continue;
        };
        groups.entry(GroupLabel::Value(key.normalized())).or_default().push(v);
    }
    groups
        .into_iter()
        .filter_map(|(label, vals)| Some((label, box_stats(&vals)?)))
        .collect()
}

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Well-known column names
// ---------------------------------------------------------------------------

pub mod columns {
    pub const FARE_AMOUNT: &str = "fare_amount";
    pub const TRIP_DISTANCE: &str = "trip_distance";
    pub const TRIP_DURATION: &str = "trip_duration";
    pub const PASSENGER_COUNT: &str = "passenger_count";
    pub const PICKUP_LOCATION_ID: &str = "pickup_location_id";
    pub const MODEL: &str = "model";
    pub const RATE_CODE: &str = "rate_code";
    pub const TIP_AMOUNT: &str = "tip_amount";
    pub const TOLLS_AMOUNT: &str = "tolls_amount";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const DAY_OF_WEEK: &str = "day_of_week";
    pub const YEAR: &str = "year";
    pub const MONTH: &str = "month";
}

// ---------------------------------------------------------------------------
// CellValue – a single cell of the trip table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed numeric columns (e.g. "3" and "3.5") sort by value,
            // integers first on ties so Ord stays consistent with Eq.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (String(a), String(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            CellValue::Float(v) => write!(f, "{v:.2}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Whole finite floats become integers so `1` and `1.0` group together.
    pub fn normalized(&self) -> CellValue {
        match self {
            CellValue::Float(v)
                if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 =>
            {
                CellValue::Integer(*v as i64)
            }
            other => other.clone(),
        }
    }

    /// Interpret the value as an `f64` for ranges and aggregation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Guess the type of a raw text cell.
    pub fn infer(s: &str) -> CellValue {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Trip – one row of the table
// ---------------------------------------------------------------------------

/// A single trip record: column_name → value.
#[derive(Debug, Clone, Default)]
pub struct Trip {
    pub fields: BTreeMap<String, CellValue>,
}

impl Trip {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }

    /// Numeric value of a column, if present and numeric.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(CellValue::as_f64)
    }
}

impl FromIterator<(String, CellValue)> for Trip {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Trip {
            fields: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// TripTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Inclusive numeric extent of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

/// The full parsed trip table with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct TripTable {
    /// All trips (rows), in file order.
    pub trips: Vec<Trip>,
    /// Column names in file order.
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
    /// For each column with at least one numeric cell, its numeric extent.
    pub extents: BTreeMap<String, Extent>,
}

impl TripTable {
    /// Build column indices from the loaded trips.
    ///
    /// `column_names` keeps the source order; columns that only appear in
    /// some rows are appended in sorted order.
    pub fn from_trips(mut column_names: Vec<String>, trips: Vec<Trip>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = BTreeMap::new();
        let mut extents: BTreeMap<String, Extent> = BTreeMap::new();

        for trip in &trips {
            for (col, val) in &trip.fields {
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());

                if let Some(v) = val.as_f64() {
                    extents
                        .entry(col.clone())
                        .and_modify(|e| {
                            e.min = e.min.min(v);
                            e.max = e.max.max(v);
                        })
                        .or_insert(Extent { min: v, max: v });
                }
            }
        }

        let known: BTreeSet<String> = column_names.iter().cloned().collect();
        column_names.extend(unique_values.keys().filter(|c| !known.contains(*c)).cloned());

        TripTable {
            trips,
            column_names,
            unique_values,
            extents,
        }
    }

    /// Number of trips.
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.unique_values.contains_key(column)
    }

    pub fn extent(&self, column: &str) -> Option<Extent> {
        self.extents.get(column).copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a table from `(column, values)` pairs, one value per row.
    pub(crate) fn table(cols: &[(&str, Vec<CellValue>)]) -> TripTable {
        let n = cols.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let trips = (0..n)
            .map(|row| {
                cols.iter()
                    .filter_map(|(c, vals)| vals.get(row).map(|v| (c.to_string(), v.clone())))
                    .collect()
            })
            .collect();
        let names = cols.iter().map(|(c, _)| c.to_string()).collect();
        TripTable::from_trips(names, trips)
    }

    pub(crate) fn floats(vals: &[f64]) -> Vec<CellValue> {
        vals.iter().map(|v| CellValue::Float(*v)).collect()
    }

    pub(crate) fn ints(vals: &[i64]) -> Vec<CellValue> {
        vals.iter().map(|v| CellValue::Integer(*v)).collect()
    }

    pub(crate) fn strs(vals: &[&str]) -> Vec<CellValue> {
        vals.iter().map(|v| CellValue::String(v.to_string())).collect()
    }

    #[test]
    fn infer_cell_types() {
        assert_eq!(CellValue::infer(""), CellValue::Null);
        assert_eq!(CellValue::infer(" 42 "), CellValue::Integer(42));
        assert_eq!(CellValue::infer("4.5"), CellValue::Float(4.5));
        assert_eq!(CellValue::infer("true"), CellValue::Bool(true));
        assert_eq!(CellValue::infer("Sedan"), CellValue::String("Sedan".into()));
    }

    #[test]
    fn mixed_numeric_values_sort_by_value() {
        let mut v = vec![CellValue::Float(2.5), CellValue::Integer(3), CellValue::Integer(1)];
        v.sort();
        assert_eq!(
            v,
            vec![CellValue::Integer(1), CellValue::Float(2.5), CellValue::Integer(3)]
        );
    }

    #[test]
    fn table_tracks_extents_and_uniques() {
        let t = table(&[
            ("fare_amount", floats(&[3.0, 12.5, 7.0])),
            ("model", strs(&["Sedan", "SUV", "Sedan"])),
        ]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.extent("fare_amount"), Some(Extent { min: 3.0, max: 12.5 }));
        assert_eq!(t.extent("model"), None);
        assert_eq!(t.unique_values["model"].len(), 2);
        assert_eq!(t.column_names, vec!["fare_amount", "model"]);
    }

    #[test]
    fn whole_floats_normalize_to_integers() {
        assert_eq!(CellValue::Float(1.0).normalized(), CellValue::Integer(1));
        assert_eq!(CellValue::Float(1.5).normalized(), CellValue::Float(1.5));
        assert_eq!(CellValue::Float(f64::NAN).normalized().as_f64(), None);
        assert_eq!(
            CellValue::String("1.0".into()).normalized(),
            CellValue::String("1.0".into())
        );
    }

    #[test]
    fn display_trims_whole_floats() {
        assert_eq!(CellValue::Float(2019.0).to_string(), "2019");
        assert_eq!(CellValue::Float(2.346).to_string(), "2.35");
    }
}

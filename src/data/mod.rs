/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .txt / .xlsx / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file (or fallback) → TripTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ TripTable  │  Vec<Trip>, unique values, numeric extents
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  range + category predicates → filtered indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group-by, histogram, box stats → chart data
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;

//! Writes a synthetic `cabdata.csv` (and a Parquet twin) with the columns the
//! dashboard charts expect.
//!
//! ```sh
//! cargo run --bin generate_sample -- --rows 5000 --out cabdata.csv --parquet
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const MODELS: [&str; 4] = ["Sedan", "SUV", "Minivan", "Hatchback"];
const DAYS: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];
const PICKUP_ZONES: [i64; 8] = [48, 68, 79, 132, 138, 161, 230, 236];

#[derive(Parser, Debug)]
#[command(name = "generate_sample", about = "Generate a synthetic taxi trip table", long_about = None)]
struct Args {
    /// Number of trips to generate.
    #[arg(long, default_value_t = 2000)]
    rows: usize,

    /// CSV output path.
    #[arg(long, value_name = "FILE", default_value = "cabdata.csv")]
    out: PathBuf,

    /// Also write a `.parquet` file next to the CSV.
    #[arg(long)]
    parquet: bool,

    /// PRNG seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Clone, Serialize)]
struct TripRecord {
    fare_amount: f64,
    trip_distance: f64,
    trip_duration: f64,
    passenger_count: i64,
    pickup_location_id: i64,
    model: String,
    rate_code: i64,
    tip_amount: f64,
    tolls_amount: f64,
    total_amount: f64,
    day_of_week: String,
    year: i64,
    month: i64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn generate_trip(rng: &mut SimpleRng) -> TripRecord {
    // Log-normal-ish distance, most trips short.
    let trip_distance = round2(rng.gauss(0.8, 0.7).exp().clamp(0.1, 40.0));
    let trip_duration = round2((trip_distance * 3.2 + rng.gauss(6.0, 3.0)).max(1.0));

    let rate_code = match rng.next_f64() {
        p if p < 0.9 => 1,
        p if p < 0.96 => 2,
        p if p < 0.99 => 3,
        _ => 5,
    };
    let base = if rate_code == 2 { 52.0 } else { 2.5 };
    let fare_amount = round2(base + trip_distance * 2.5 + trip_duration * 0.35);

    let tip_amount = if rng.next_f64() < 0.3 {
        0.0
    } else {
        round2(fare_amount * rng.gauss(0.18, 0.05).clamp(0.0, 0.4))
    };
    let tolls_amount = if trip_distance > 10.0 && rng.next_f64() < 0.5 { 6.55 } else { 0.0 };
    let total_amount = round2(fare_amount + tip_amount + tolls_amount + 0.5);

    TripRecord {
        fare_amount,
        trip_distance,
        trip_duration,
        passenger_count: 1 + rng.below(6) as i64,
        pickup_location_id: *rng.pick(&PICKUP_ZONES),
        model: rng.pick(&MODELS).to_string(),
        rate_code,
        tip_amount,
        tolls_amount,
        total_amount,
        day_of_week: rng.pick(&DAYS).to_string(),
        year: 2017 + rng.below(4) as i64,
        month: 1 + rng.below(12) as i64,
    }
}

fn write_csv(path: &Path, trips: &[TripRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for trip in trips {
        writer.serialize(trip).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, trips: &[TripRecord]) -> Result<()> {
    fn floats(trips: &[TripRecord], f: impl Fn(&TripRecord) -> f64) -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(trips.iter().map(f)))
    }
    fn ints(trips: &[TripRecord], f: impl Fn(&TripRecord) -> i64) -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(trips.iter().map(f)))
    }
    fn strings(trips: &[TripRecord], f: impl Fn(&TripRecord) -> &str) -> ArrayRef {
        Arc::new(StringArray::from_iter_values(trips.iter().map(f)))
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("fare_amount", DataType::Float64, false),
        Field::new("trip_distance", DataType::Float64, false),
        Field::new("trip_duration", DataType::Float64, false),
        Field::new("passenger_count", DataType::Int64, false),
        Field::new("pickup_location_id", DataType::Int64, false),
        Field::new("model", DataType::Utf8, false),
        Field::new("rate_code", DataType::Int64, false),
        Field::new("tip_amount", DataType::Float64, false),
        Field::new("tolls_amount", DataType::Float64, false),
        Field::new("total_amount", DataType::Float64, false),
        Field::new("day_of_week", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("month", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            floats(trips, |t| t.fare_amount),
            floats(trips, |t| t.trip_distance),
            floats(trips, |t| t.trip_duration),
            ints(trips, |t| t.passenger_count),
            ints(trips, |t| t.pickup_location_id),
            strings(trips, |t| t.model.as_str()),
            ints(trips, |t| t.rate_code),
            floats(trips, |t| t.tip_amount),
            floats(trips, |t| t.tolls_amount),
            floats(trips, |t| t.total_amount),
            strings(trips, |t| t.day_of_week.as_str()),
            ints(trips, |t| t.year),
            ints(trips, |t| t.month),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = SimpleRng::new(args.seed);
    let trips: Vec<TripRecord> = (0..args.rows).map(|_| generate_trip(&mut rng)).collect();

    write_csv(&args.out, &trips)?;
    log::info!("Wrote {} trips to {}", trips.len(), args.out.display());

    if args.parquet {
        let parquet_path = args.out.with_extension("parquet");
        write_parquet(&parquet_path, &trips)?;
        log::info!("Wrote {} trips to {}", trips.len(), parquet_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_trips_are_consistent() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..500 {
            let t = generate_trip(&mut rng);
            assert!(t.trip_distance > 0.0);
            assert!((1..=6).contains(&t.passenger_count));
            assert!((1..=12).contains(&t.month));
            assert!(t.total_amount >= t.fare_amount);
            assert!(MODELS.contains(&t.model.as_str()));
        }
    }

    #[test]
    fn same_seed_same_trips() {
        let a: Vec<f64> = {
            let mut rng = SimpleRng::new(1);
            (0..20).map(|_| generate_trip(&mut rng).fare_amount).collect()
        };
        let b: Vec<f64> = {
            let mut rng = SimpleRng::new(1);
            (0..20).map(|_| generate_trip(&mut rng).fare_amount).collect()
        };
        assert_eq!(a, b);
    }
}

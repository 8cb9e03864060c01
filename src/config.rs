use std::path::PathBuf;

use clap::Parser;

/// Command line options for the dashboard.
#[derive(Parser, Debug, Clone)]
#[command(name = "taxi-dashboard", author, version, about = "Interactive taxi fare dashboard", long_about = None)]
pub struct Config {
    /// File loaded when nothing has been opened (csv, txt, xlsx, xls, parquet, json).
    #[arg(long, value_name = "FILE", env = "TAXI_DASHBOARD_DATA", default_value = "cabdata.csv")]
    pub data: PathBuf,

    /// Number of bins used by the histograms.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u16).range(1..))]
    pub bins: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["taxi-dashboard"]).unwrap();
        assert_eq!(config.bins, 50);
        if std::env::var_os("TAXI_DASHBOARD_DATA").is_none() {
            assert_eq!(config.data, PathBuf::from("cabdata.csv"));
        }
    }

    #[test]
    fn explicit_flags() {
        let config =
            Config::try_parse_from(["taxi-dashboard", "--data", "trips.xlsx", "--bins", "20"])
                .unwrap();
        assert_eq!(config.data, PathBuf::from("trips.xlsx"));
        assert_eq!(config.bins, 20);
    }

    #[test]
    fn zero_bins_rejected() {
        assert!(Config::try_parse_from(["taxi-dashboard", "--bins", "0"]).is_err());
    }
}

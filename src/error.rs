use thiserror::Error;

/// Errors raised while turning a file into a [`crate::data::model::TripTable`].
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("spreadsheet has no worksheets")]
    NoWorksheet,

    #[error("expected a top-level JSON array of records")]
    NotARecordArray,

    #[error("row {0} is not a JSON object")]
    RowNotObject(usize),

    #[error("row {row} has {found} fields but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

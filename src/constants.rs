//! Fixed values of the spot file schema and output format
//!
//! Column positions follow the wsprnet spot export.

/// Number of columns in a wsprnet spot record.
pub const SPOT_COLUMN_COUNT: usize = 16;

/// Column holding the receiver (reporter) Maidenhead locator.
pub const RX_LOCATOR_COLUMN: usize = 4;

/// Column holding the spot frequency in MHz.
pub const FREQUENCY_COLUMN: usize = 6;

/// Column holding the transmitter Maidenhead locator.
pub const TX_LOCATOR_COLUMN: usize = 8;

/// Value written to the legacy placeholder columns, and to every derived
/// numeric field when a row is emitted with sentinel values.
pub const PLACEHOLDER_FIELD: &str = "-999.9";

/// Band label for frequencies outside the band table.
pub const DEFAULT_BAND: u32 = 9999;

/// Number of derived fields appended to each spot record.
pub const DERIVED_FIELD_COUNT: usize = 11;

/// Rows sent to the database per round trip during upload.
pub const UPLOAD_PAGE_SIZE: usize = 100;

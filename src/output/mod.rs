mod csv;
mod json;

use std::io::Write;

use crate::error::Result;
use crate::pipeline::AugmentedRow;

pub use self::csv::CsvRowWriter;
pub use self::json::JsonRowWriter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RowFormat {
    /// Original columns followed by the derived columns, minimal quoting
    #[default]
    Csv,
    /// One JSON object per line
    Json,
}

pub trait RowWriter {
    fn write_row(&mut self, row: &AugmentedRow) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

pub fn create_writer<'a, W: Write + 'a>(format: RowFormat, out: W) -> Box<dyn RowWriter + 'a> {
    match format {
        RowFormat::Csv => Box::new(CsvRowWriter::new(out)),
        RowFormat::Json => Box::new(JsonRowWriter::new(out)),
    }
}

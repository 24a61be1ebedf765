use std::io::Write;

use super::RowWriter;
use crate::error::Result;
use crate::pipeline::AugmentedRow;

pub struct CsvRowWriter<W: Write> {
    writer: ::csv::Writer<W>,
}

impl<W: Write> CsvRowWriter<W> {
    pub fn new(out: W) -> Self {
        let writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote_style(::csv::QuoteStyle::Necessary)
            .from_writer(out);
        Self { writer }
    }
}

impl<W: Write> RowWriter for CsvRowWriter<W> {
    fn write_row(&mut self, row: &AugmentedRow) -> Result<()> {
        self.writer.write_record(row.to_record())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

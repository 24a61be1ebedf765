use std::io::Write;

use serde::Serialize;

use super::RowWriter;
use crate::constants::DEFAULT_BAND;
use crate::error::Result;
use crate::pipeline::{AugmentedRow, format_coordinate};

#[derive(Serialize)]
struct JsonSpot<'a> {
    line: u64,
    fields: &'a [String],
    band: u32,
    rx_azimuth: Option<i64>,
    rx_lat: Option<f64>,
    rx_lon: Option<f64>,
    tx_azimuth: Option<i64>,
    tx_lat: Option<f64>,
    tx_lon: Option<f64>,
    vertex_lat: Option<f64>,
    vertex_lon: Option<f64>,
}

impl<'a> JsonSpot<'a> {
    fn from_row(row: &'a AugmentedRow) -> Self {
        let g = row.geometry.as_ref();
        Self {
            line: row.line,
            fields: &row.original,
            band: g.map_or(DEFAULT_BAND, |g| g.band),
            rx_azimuth: g.map(|g| g.rx_azimuth.round_ties_even() as i64),
            rx_lat: g.map(|g| coordinate(g.rx.lat)),
            rx_lon: g.map(|g| coordinate(g.rx.lon)),
            tx_azimuth: g.map(|g| g.tx_azimuth.round_ties_even() as i64),
            tx_lat: g.map(|g| coordinate(g.tx.lat)),
            tx_lon: g.map(|g| coordinate(g.tx.lon)),
            vertex_lat: g.map(|g| coordinate(g.vertex.lat)),
            vertex_lon: g.map(|g| coordinate(g.vertex.lon)),
        }
    }
}

/// Coordinate as printed in the CSV output, so both formats agree on
/// half-way cases.
fn coordinate(degrees: f64) -> f64 {
    format_coordinate(degrees).parse().unwrap_or(degrees)
}

pub struct JsonRowWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonRowWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RowWriter for JsonRowWriter<W> {
    fn write_row(&mut self, row: &AugmentedRow) -> Result<()> {
        serde_json::to_writer(&mut self.out, &JsonSpot::from_row(row))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

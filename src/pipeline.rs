//! Row augmentation
//!
//! Each accepted spot record is passed through unchanged and followed by
//! the derived path fields:
//!
//! ```text
//! band, -999.9, -999.9, rx_azimuth, rx_lat, rx_lon,
//! tx_azimuth, tx_lat, tx_lon, vertex_lat, vertex_lon
//! ```
//!
//! Azimuths are rounded to whole degrees (ties to even), coordinates are
//! written with three decimals.

use std::collections::BTreeMap;
use std::io::Read;

use crossbeam_channel::bounded;
use serde::Serialize;

use crate::band::{classify, parse_frequency};
use crate::config::{AugmentConfig, InvalidRowPolicy, SpotSchema};
use crate::constants::{DEFAULT_BAND, DERIVED_FIELD_COUNT, PLACEHOLDER_FIELD};
use crate::error::{PathError, Result};
use crate::geo::{GeoPoint, bearings, decode, vertex};

/// One input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotRow {
    /// 1-based line number in the source, for diagnostics
    pub line: u64,
    pub fields: Vec<String>,
}

impl SpotRow {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self { line, fields }
    }
}

/// Derived geometry of one spot path
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathGeometry {
    pub band: u32,
    /// Azimuth at the receiver toward the transmitter, degrees
    pub rx_azimuth: f64,
    pub rx: GeoPoint,
    /// Azimuth at the transmitter toward the receiver, degrees
    pub tx_azimuth: f64,
    pub tx: GeoPoint,
    pub vertex: GeoPoint,
}

/// Compute band, azimuths, endpoints and vertex for one spot.
pub fn compute_path(frequency: &str, tx_locator: &str, rx_locator: &str) -> Result<PathGeometry> {
    let mhz = parse_frequency(frequency)?;
    let tx = decode(tx_locator)?;
    let rx = decode(rx_locator)?;

    let azimuths = bearings(tx, rx);
    let vertex = vertex(tx, rx, azimuths.forward);

    Ok(PathGeometry {
        band: classify(mhz),
        rx_azimuth: azimuths.forward,
        rx,
        tx_azimuth: azimuths.reverse,
        tx,
        vertex,
    })
}

/// A spot record with its derived fields
///
/// `geometry` is `None` for rows emitted with sentinel values.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedRow {
    pub line: u64,
    pub original: Vec<String>,
    pub geometry: Option<PathGeometry>,
}

impl AugmentedRow {
    /// Derived fields as written to the output, in column order.
    pub fn derived_fields(&self) -> [String; DERIVED_FIELD_COUNT] {
        match &self.geometry {
            Some(g) => [
                g.band.to_string(),
                PLACEHOLDER_FIELD.to_string(),
                PLACEHOLDER_FIELD.to_string(),
                format_azimuth(g.rx_azimuth),
                format_coordinate(g.rx.lat),
                format_coordinate(g.rx.lon),
                format_azimuth(g.tx_azimuth),
                format_coordinate(g.tx.lat),
                format_coordinate(g.tx.lon),
                format_coordinate(g.vertex.lat),
                format_coordinate(g.vertex.lon),
            ],
            None => {
                let mut fields: [String; DERIVED_FIELD_COUNT] =
                    std::array::from_fn(|_| PLACEHOLDER_FIELD.to_string());
                fields[0] = DEFAULT_BAND.to_string();
                fields
            }
        }
    }

    /// Original fields followed by the derived fields.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(self.original.len() + DERIVED_FIELD_COUNT);
        record.extend(self.original.iter().cloned());
        record.extend(self.derived_fields());
        record
    }
}

pub fn format_azimuth(degrees: f64) -> String {
    format!("{}", degrees.round_ties_even() as i64)
}

pub fn format_coordinate(degrees: f64) -> String {
    format!("{:.3}", degrees)
}

/// Counters for one augmentation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AugmentStats {
    pub rows_read: usize,
    pub rows_written: usize,
    pub sentinel_rows: usize,
    pub skipped_schema: usize,
    pub skipped_invalid: usize,
    pub skipped_unreadable: usize,
}

impl AugmentStats {
    pub fn skipped(&self) -> usize {
        self.skipped_schema + self.skipped_invalid + self.skipped_unreadable
    }
}

/// Result of processing a single record, before policy is applied
#[derive(Debug)]
enum RowOutcome {
    Augmented(AugmentedRow),
    Invalid { row: SpotRow, error: PathError },
    SchemaMismatch(PathError),
    Unreadable(PathError),
}

/// Iterator over the records of a comma-delimited spot file
///
/// Records are read without a header, `#` lines are treated as comments
/// and rows of any width are passed through so the schema check can
/// report them.
pub struct SpotReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> SpotReader<R> {
    pub fn new(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(reader);
        Self {
            records: reader.into_records(),
        }
    }
}

impl<R: Read> Iterator for SpotReader<R> {
    type Item = Result<SpotRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map(|rec| {
                    let line = rec.position().map_or(0, |p| p.line());
                    SpotRow::new(line, rec.iter().map(str::to_string).collect())
                })
                .map_err(PathError::from),
        )
    }
}

/// Applies the path computation to a stream of spot records
pub struct Augmenter {
    config: AugmentConfig,
    stats: AugmentStats,
}

impl Augmenter {
    pub fn new(config: AugmentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats: AugmentStats::default(),
        })
    }

    pub fn stats(&self) -> AugmentStats {
        self.stats
    }

    /// Augment one record, without applying the invalid-row policy.
    pub fn augment_row(&self, row: &SpotRow) -> Result<AugmentedRow> {
        check_schema(&self.config.schema, row)?;
        augment_fields(&self.config.schema, row)
    }

    /// Lazily augment a sequence of records on the calling thread.
    ///
    /// Rows that fail are logged and counted, then dropped or emitted with
    /// placeholders according to `on_invalid`.
    pub fn augment<'a, I>(&'a mut self, rows: I) -> impl Iterator<Item = AugmentedRow> + 'a
    where
        I: IntoIterator<Item = Result<SpotRow>>,
        I::IntoIter: 'a,
    {
        rows.into_iter().filter_map(move |row| {
            let outcome = process_row(&self.config.schema, row);
            self.settle(outcome)
        })
    }

    /// Augment every record and hand accepted rows to `sink` in input order.
    ///
    /// With `jobs > 1` rows are computed on worker threads and reordered
    /// before reaching the sink. The first sink error stops the run.
    pub fn run<I, F>(&mut self, rows: I, mut sink: F) -> Result<AugmentStats>
    where
        I: IntoIterator<Item = Result<SpotRow>>,
        I::IntoIter: Send,
        F: FnMut(&AugmentedRow) -> Result<()>,
    {
        if self.config.jobs <= 1 {
            for row in self.augment(rows) {
                sink(&row)?;
            }
        } else {
            self.run_parallel(rows.into_iter(), &mut sink)?;
        }

        log::info!(
            "{} rows read, {} written ({} with sentinel values), {} skipped",
            self.stats.rows_read,
            self.stats.rows_written,
            self.stats.sentinel_rows,
            self.stats.skipped()
        );
        Ok(self.stats)
    }

    fn run_parallel<I, F>(&mut self, rows: I, sink: &mut F) -> Result<()>
    where
        I: Iterator<Item = Result<SpotRow>> + Send,
        F: FnMut(&AugmentedRow) -> Result<()>,
    {
        let jobs = self.config.jobs;
        let schema = self.config.schema.clone();
        let (work_tx, work_rx) = bounded::<(usize, Result<SpotRow>)>(jobs * 64);
        let (done_tx, done_rx) = bounded::<(usize, RowOutcome)>(jobs * 64);

        std::thread::scope(|scope| -> Result<()> {
            scope.spawn(move || {
                for item in rows.enumerate() {
                    if work_tx.send(item).is_err() {
                        break;
                    }
                }
            });

            for _ in 0..jobs {
                let work_rx = work_rx.clone();
                let done_tx = done_tx.clone();
                let schema = &schema;
                scope.spawn(move || {
                    for (seq, row) in work_rx.iter() {
                        if done_tx.send((seq, process_row(schema, row))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(work_rx);
            drop(done_tx);
            // Owned here so an early return disconnects the workers before
            // the scope joins them.
            let done_rx = done_rx;

            // Outcomes arrive in completion order; hold them until every
            // earlier row has been emitted.
            let mut pending = BTreeMap::new();
            let mut next_seq = 0;
            for (seq, outcome) in done_rx.iter() {
                pending.insert(seq, outcome);
                while let Some(outcome) = pending.remove(&next_seq) {
                    next_seq += 1;
                    if let Some(row) = self.settle(outcome) {
                        sink(&row)?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Apply the invalid-row policy, log and count.
    fn settle(&mut self, outcome: RowOutcome) -> Option<AugmentedRow> {
        self.stats.rows_read += 1;
        let row = match outcome {
            RowOutcome::Augmented(row) => Some(row),
            RowOutcome::SchemaMismatch(error) => {
                log::warn!("Skipping spot: {}", error);
                self.stats.skipped_schema += 1;
                None
            }
            RowOutcome::Unreadable(error) => {
                log::warn!("Skipping unreadable spot: {}", error);
                self.stats.skipped_unreadable += 1;
                None
            }
            RowOutcome::Invalid { row, error } => match self.config.on_invalid {
                InvalidRowPolicy::Skip => {
                    log::warn!("Skipping spot on line {}: {}", row.line, error);
                    self.stats.skipped_invalid += 1;
                    None
                }
                InvalidRowPolicy::Sentinel => {
                    log::warn!("Spot on line {}: {}; writing placeholders", row.line, error);
                    self.stats.sentinel_rows += 1;
                    Some(AugmentedRow {
                        line: row.line,
                        original: row.fields,
                        geometry: None,
                    })
                }
            },
        };
        if row.is_some() {
            self.stats.rows_written += 1;
        }
        row
    }
}

fn check_schema(schema: &SpotSchema, row: &SpotRow) -> Result<()> {
    if row.fields.len() != schema.column_count {
        return Err(PathError::SchemaMismatch {
            line: row.line,
            expected: schema.column_count,
            found: row.fields.len(),
        });
    }
    Ok(())
}

fn augment_fields(schema: &SpotSchema, row: &SpotRow) -> Result<AugmentedRow> {
    let geometry = compute_path(
        &row.fields[schema.frequency_column],
        &row.fields[schema.tx_locator_column],
        &row.fields[schema.rx_locator_column],
    )?;
    log::debug!(
        "line {}: band {} rx {} az {:.1} tx {} az {:.1} vertex {}",
        row.line,
        geometry.band,
        geometry.rx,
        geometry.rx_azimuth,
        geometry.tx,
        geometry.tx_azimuth,
        geometry.vertex
    );
    Ok(AugmentedRow {
        line: row.line,
        original: row.fields.clone(),
        geometry: Some(geometry),
    })
}

fn process_row(schema: &SpotSchema, row: Result<SpotRow>) -> RowOutcome {
    let row = match row {
        Ok(row) => row,
        Err(error) => return RowOutcome::Unreadable(error),
    };
    if let Err(error) = check_schema(schema, &row) {
        return RowOutcome::SchemaMismatch(error);
    }
    match augment_fields(schema, &row) {
        Ok(augmented) => RowOutcome::Augmented(augmented),
        Err(error) => RowOutcome::Invalid { row, error },
    }
}

//! Batch upload of augmented spots
//!
//! An upload walks through four stages: connect, open a transaction,
//! execute the insert for every row, commit. Rows are handed to the session
//! in pages so a backend can send each page in a single round trip. The
//! stage reached is recorded in an [`UploadOutcome`] so a failure can be
//! located without a stack trace. Nothing is committed unless every row
//! was inserted, and the session is closed whether or not the upload
//! succeeded.

mod pg;

use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::error::{PathError, Result};

pub use self::pg::{ConnectionConfig, PgSession, PgStore};

/// Last stage an upload completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadStage {
    NotConnected,
    Connected,
    GotCursor,
    Executed,
    Committed,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::NotConnected => "not connected",
            UploadStage::Connected => "connected",
            UploadStage::GotCursor => "got cursor",
            UploadStage::Executed => "executed",
            UploadStage::Committed => "committed",
        };
        write!(f, "{}", name)
    }
}

/// Result of one batch upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub stage: UploadStage,
    /// Rows inserted before commit
    pub rows: usize,
    pub error: Option<String>,
}

impl UploadOutcome {
    fn new() -> Self {
        Self {
            stage: UploadStage::NotConnected,
            rows: 0,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.stage == UploadStage::Committed
    }

    /// Stage flags in the form printed by the upload tool, e.g.
    /// `Connected Got cursor Not executed Not committed`.
    pub fn stage_report(&self) -> String {
        let flag = |stage: UploadStage, done: &'static str, not_done: &'static str| {
            if self.stage >= stage { done } else { not_done }
        };
        [
            flag(UploadStage::Connected, "Connected", "Not connected"),
            flag(UploadStage::GotCursor, "Got cursor", "No cursor"),
            flag(UploadStage::Executed, "Executed", "Not executed"),
            flag(UploadStage::Committed, "Committed", "Not committed"),
        ]
        .join(" ")
    }

    pub fn into_result(self) -> Result<usize> {
        match self.error {
            None if self.stage == UploadStage::Committed => Ok(self.rows),
            error => Err(PathError::Upload {
                stage: self.stage,
                message: error.unwrap_or_else(|| "upload incomplete".to_string()),
            }),
        }
    }
}

/// A database that spot batches can be written to
pub trait BatchStore {
    type Session: BatchSession;

    fn connect(&mut self) -> Result<Self::Session>;
}

/// An open connection
///
/// `close` is called exactly once, after the last other call. Closing a
/// session with an open, uncommitted transaction discards the transaction.
pub trait BatchSession {
    /// Start the transaction the batch is written in.
    fn begin(&mut self) -> Result<()>;

    /// Execute `sql` once for each row of one page, returning the number of
    /// rows inserted.
    fn execute_batch(&mut self, sql: &str, rows: &[Vec<String>]) -> Result<usize>;

    fn commit(&mut self) -> Result<()>;

    fn close(self) -> Result<()>;
}

/// Insert `rows` with `sql` as a single all-or-nothing batch, `page_size`
/// rows per `execute_batch` call.
pub fn upload_batch<S: BatchStore>(
    store: &mut S,
    sql: &str,
    rows: &[Vec<String>],
    page_size: usize,
) -> UploadOutcome {
    let mut outcome = UploadOutcome::new();

    let mut session = match store.connect() {
        Ok(session) => session,
        Err(e) => {
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };
    outcome.stage = UploadStage::Connected;
    log::debug!("Connected");

    let result = run_stages(&mut session, sql, rows, page_size.max(1), &mut outcome);

    if let Err(e) = session.close() {
        log::warn!("Error closing database session: {}", e);
    }
    if let Err(e) = result {
        outcome.error = Some(e.to_string());
    }
    outcome
}

fn run_stages<S: BatchSession>(
    session: &mut S,
    sql: &str,
    rows: &[Vec<String>],
    page_size: usize,
    outcome: &mut UploadOutcome,
) -> Result<()> {
    session.begin()?;
    outcome.stage = UploadStage::GotCursor;

    for page in rows.chunks(page_size) {
        outcome.rows += session.execute_batch(sql, page)?;
        log::trace!("{} of {} rows sent", outcome.rows, rows.len());
    }
    outcome.stage = UploadStage::Executed;
    log::debug!("Executed insert for {} rows", outcome.rows);

    session.commit()?;
    outcome.stage = UploadStage::Committed;
    Ok(())
}

/// Read the rows of an augmented spot file for upload.
pub fn read_batch<R: Read>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn read_batch_file<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    let file = std::fs::File::open(path)?;
    read_batch(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::UPLOAD_PAGE_SIZE;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        calls: Vec<&'static str>,
        pages: Vec<usize>,
    }

    struct MockStore {
        fail_at: Option<&'static str>,
        log: Rc<RefCell<Log>>,
    }

    struct MockSession {
        fail_at: Option<&'static str>,
        log: Rc<RefCell<Log>>,
    }

    impl MockSession {
        fn step(&self, name: &'static str) -> Result<()> {
            self.log.borrow_mut().calls.push(name);
            if self.fail_at == Some(name) {
                return Err(PathError::Config(format!("{} failed", name)));
            }
            Ok(())
        }
    }

    impl BatchStore for MockStore {
        type Session = MockSession;

        fn connect(&mut self) -> Result<MockSession> {
            self.log.borrow_mut().calls.push("connect");
            if self.fail_at == Some("connect") {
                return Err(PathError::Config("connection refused".to_string()));
            }
            Ok(MockSession {
                fail_at: self.fail_at,
                log: Rc::clone(&self.log),
            })
        }
    }

    impl BatchSession for MockSession {
        fn begin(&mut self) -> Result<()> {
            self.step("begin")
        }

        fn execute_batch(&mut self, _sql: &str, rows: &[Vec<String>]) -> Result<usize> {
            self.step("execute")?;
            self.log.borrow_mut().pages.push(rows.len());
            Ok(rows.len())
        }

        fn commit(&mut self) -> Result<()> {
            self.step("commit")
        }

        fn close(self) -> Result<()> {
            self.step("close")
        }
    }

    fn upload(
        fail_at: Option<&'static str>,
        row_count: usize,
        page_size: usize,
    ) -> (UploadOutcome, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut store = MockStore {
            fail_at,
            log: Rc::clone(&log),
        };
        let rows: Vec<Vec<String>> = (0..row_count).map(|i| vec![i.to_string()]).collect();
        let outcome = upload_batch(&mut store, "INSERT", &rows, page_size);
        (outcome, log)
    }

    fn run(fail_at: Option<&'static str>) -> (UploadOutcome, Vec<&'static str>) {
        let (outcome, log) = upload(fail_at, 2, UPLOAD_PAGE_SIZE);
        let calls = log.borrow().calls.clone();
        (outcome, calls)
    }

    #[test]
    fn test_successful_upload() {
        let (outcome, calls) = run(None);
        assert!(outcome.is_success());
        assert_eq!(outcome.rows, 2);
        assert_eq!(calls, vec!["connect", "begin", "execute", "commit", "close"]);
        assert_eq!(
            outcome.stage_report(),
            "Connected Got cursor Executed Committed"
        );
        assert_eq!(outcome.into_result().unwrap(), 2);
    }

    #[test]
    fn test_rows_sent_in_pages() {
        let (outcome, log) = upload(None, 250, 100);
        assert!(outcome.is_success());
        assert_eq!(outcome.rows, 250);
        let log = log.borrow();
        assert_eq!(log.pages, vec![100, 100, 50]);
        assert_eq!(log.calls.iter().filter(|&&c| c == "execute").count(), 3);
        assert_eq!(log.calls.iter().filter(|&&c| c == "commit").count(), 1);
    }

    #[test]
    fn test_zero_page_size_sends_single_rows() {
        let (outcome, log) = upload(None, 3, 0);
        assert!(outcome.is_success());
        assert_eq!(log.borrow().pages, vec![1, 1, 1]);
    }

    #[test]
    fn test_empty_batch_commits_without_executing() {
        let (outcome, log) = upload(None, 0, UPLOAD_PAGE_SIZE);
        assert!(outcome.is_success());
        assert_eq!(outcome.rows, 0);
        assert!(log.borrow().pages.is_empty());
    }

    #[test]
    fn test_connect_failure() {
        let (outcome, calls) = run(Some("connect"));
        assert!(!outcome.is_success());
        assert_eq!(outcome.stage, UploadStage::NotConnected);
        assert_eq!(calls, vec!["connect"]);
        assert_eq!(
            outcome.stage_report(),
            "Not connected No cursor Not executed Not committed"
        );
    }

    #[test]
    fn test_execute_failure_skips_commit_and_closes() {
        let (outcome, calls) = run(Some("execute"));
        assert_eq!(outcome.stage, UploadStage::GotCursor);
        assert_eq!(calls, vec!["connect", "begin", "execute", "close"]);
        assert!(outcome.error.as_deref().unwrap().contains("execute failed"));
        assert_eq!(
            outcome.stage_report(),
            "Connected Got cursor Not executed Not committed"
        );
    }

    #[test]
    fn test_commit_failure() {
        let (outcome, calls) = run(Some("commit"));
        assert_eq!(outcome.stage, UploadStage::Executed);
        assert_eq!(calls.last(), Some(&"close"));
        match outcome.into_result() {
            Err(PathError::Upload { stage, .. }) => assert_eq!(stage, UploadStage::Executed),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_close_failure_does_not_undo_commit() {
        let (outcome, _) = run(Some("close"));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_read_batch() {
        let data = "1,\"K1 ABC\",20\n2,G0XYZ,40,extra\n";
        let rows = read_batch(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1", "K1 ABC", "20"]);
        assert_eq!(rows[1].len(), 4);
    }
}

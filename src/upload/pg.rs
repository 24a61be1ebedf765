//! PostgreSQL / TimescaleDB backend
//!
//! Statements use `$1..$n` placeholders, one per field of the row. Each
//! placeholder is replaced by the field as a quoted string literal, and the
//! statements of a page are sent together as one simple-query script, so a
//! page costs one round trip. Columns that are not text take the literal
//! through their input function; an explicit cast also works, e.g.
//!
//! ```sql
//! INSERT INTO spots (wd_time, spotnum, band) VALUES ($2::timestamp, $1::bigint, $17::smallint)
//! ```
//!
//! Placeholders inside quoted strings and identifiers are left alone.
//! Dollar-quoted strings are not recognised.

use postgres::{Client, NoTls};

use super::{BatchSession, BatchStore, UploadStage};
use crate::error::{PathError, Result};

/// Connection parameters for the spot database
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// `host`, `host:port` or `[v6addr]:port`
    pub address: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectionConfig {
    fn to_pg_config(&self) -> Result<postgres::Config> {
        let (host, port) = split_address(&self.address)?;
        let mut config = postgres::Config::new();
        config
            .host(host)
            .dbname(&self.database)
            .user(&self.username)
            .password(&self.password);
        if let Some(port) = port {
            config.port(port);
        }
        Ok(config)
    }
}

fn split_address(address: &str) -> Result<(&str, Option<u16>)> {
    let address = address.trim();
    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        match rest.split_once(']') {
            Some((host, "")) => (host, None),
            Some((host, tail)) => match tail.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => return Err(bad_address(address)),
            },
            None => return Err(bad_address(address)),
        }
    } else {
        match address.split_once(':') {
            Some((host, port)) if !port.contains(':') => (host, Some(port)),
            Some(_) => return Err(bad_address(address)),
            None => (address, None),
        }
    };

    if host.is_empty() {
        return Err(bad_address(address));
    }
    let port = port
        .map(|p| p.parse::<u16>().map_err(|_| bad_address(address)))
        .transpose()?;
    Ok((host, port))
}

fn bad_address(address: &str) -> PathError {
    PathError::Config(format!("invalid database address: {:?}", address))
}

fn stage_error(stage: UploadStage, err: postgres::Error) -> PathError {
    PathError::Upload {
        stage,
        message: err.to_string(),
    }
}

/// Replace each `$n` in `sql` with `row[n - 1]` as a string literal.
fn bind_literals(sql: &str, row: &[String]) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(sql.len() + row.iter().map(|f| f.len() + 3).sum::<usize>());
    let mut chars = sql.chars().peekable();
    let mut quote = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
            }
            '$' if chars.peek().is_some_and(char::is_ascii_digit) => {
                let mut index = 0usize;
                while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                    index = index.saturating_mul(10).saturating_add(digit as usize);
                    chars.next();
                }
                let field = index
                    .checked_sub(1)
                    .and_then(|i| row.get(i))
                    .ok_or_else(|| format!("${} has no field in a {}-field row", index, row.len()))?;
                push_literal(&mut out, field)?;
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

fn push_literal(out: &mut String, value: &str) -> std::result::Result<(), String> {
    if value.contains('\0') {
        return Err("field contains a NUL character".to_string());
    }
    // E'' keeps backslashes literal whatever standard_conforming_strings is.
    let escape_backslash = value.contains('\\');
    if escape_backslash {
        out.push('E');
    }
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' if escape_backslash => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    Ok(())
}

pub struct PgStore {
    config: ConnectionConfig,
}

impl PgStore {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

impl BatchStore for PgStore {
    type Session = PgSession;

    fn connect(&mut self) -> Result<PgSession> {
        let client = self
            .config
            .to_pg_config()?
            .connect(NoTls)
            .map_err(|e| stage_error(UploadStage::NotConnected, e))?;
        Ok(PgSession {
            client,
            in_transaction: false,
        })
    }
}

pub struct PgSession {
    client: Client,
    in_transaction: bool,
}

impl BatchSession for PgSession {
    fn begin(&mut self) -> Result<()> {
        self.client
            .batch_execute("BEGIN")
            .map_err(|e| stage_error(UploadStage::Connected, e))?;
        self.in_transaction = true;
        Ok(())
    }

    fn execute_batch(&mut self, sql: &str, rows: &[Vec<String>]) -> Result<usize> {
        let mut script = String::new();
        for (i, row) in rows.iter().enumerate() {
            let statement = bind_literals(sql, row).map_err(|message| PathError::Upload {
                stage: UploadStage::GotCursor,
                message: format!("row {}: {}", i + 1, message),
            })?;
            script.push_str(statement.trim_end().trim_end_matches(';'));
            script.push_str(";\n");
        }
        if script.is_empty() {
            return Ok(0);
        }
        self.client
            .batch_execute(&script)
            .map_err(|e| stage_error(UploadStage::GotCursor, e))?;
        Ok(rows.len())
    }

    fn commit(&mut self) -> Result<()> {
        self.client
            .batch_execute("COMMIT")
            .map_err(|e| stage_error(UploadStage::Executed, e))?;
        self.in_transaction = false;
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        if self.in_transaction {
            if let Err(e) = self.client.batch_execute("ROLLBACK") {
                log::warn!("Rollback failed: {}", e);
            }
        }
        self.client
            .close()
            .map_err(|e| stage_error(UploadStage::NotConnected, e))
    }
}

//! Output of a finished race.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::models::PostalRecord;
use crate::race::RaceResult;

/// Receives the result of a race.
pub trait Reporter {
    fn report(&self, result: &RaceResult) -> anyhow::Result<()>;
}

/// Structured form of a race result.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRecord<'a> {
    /// One of `success`, `failure`, `timed_out`, `rejected`, `cancelled`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<&'a PostalRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub reported_at: DateTime<Utc>,
}

impl<'a> ReportRecord<'a> {
    pub fn from_result(result: &'a RaceResult) -> Self {
        let mut report = Self {
            status: "",
            service: None,
            record: None,
            error_kind: None,
            error: None,
            reported_at: Utc::now(),
        };

        match result {
            RaceResult::Won {
                service,
                outcome: Ok(record),
            } => {
                report.status = "success";
                report.service = Some(service.as_str());
                report.record = Some(record);
            }
            RaceResult::Won {
                service,
                outcome: Err(err),
            } => {
                report.status = "failure";
                report.service = Some(service.as_str());
                report.error_kind = Some(err.kind());
                report.error = Some(err.to_string());
            }
            RaceResult::TimedOut => {
                report.status = "timed_out";
                report.error = Some("deadline exceeded".to_string());
            }
            RaceResult::Rejected(err) => {
                report.status = "rejected";
                report.error_kind = Some(err.kind());
                report.error = Some(err.to_string());
            }
            RaceResult::Cancelled => report.status = "cancelled",
        }

        report
    }
}

/// Human-readable terminal output.
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn render(result: &RaceResult) -> String {
        match result {
            RaceResult::Won {
                service,
                outcome: Ok(record),
            } => format!(
                "{} Result from {}\n  CEP:          {}\n  Street:       {}\n  Neighborhood: {}\n  City:         {}\n  State:        {}",
                style("✓").green(),
                style(service.display_name()).bold(),
                record.code(),
                record.street(),
                record.neighborhood(),
                record.city(),
                record.state_code(),
            ),
            RaceResult::Won {
                service,
                outcome: Err(err),
            } => format!(
                "{} {} answered first with an error: {}",
                style("✗").red(),
                style(service.display_name()).bold(),
                err
            ),
            RaceResult::TimedOut => format!(
                "{} Deadline exceeded: no service answered in time",
                style("✗").red()
            ),
            RaceResult::Rejected(err) => format!("{} {}", style("✗").red(), err),
            RaceResult::Cancelled => format!("{} Query canceled", style("!").yellow()),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, result: &RaceResult) -> anyhow::Result<()> {
        println!("{}", Self::render(result));
        Ok(())
    }
}

/// Writes one JSON object per race, newline-terminated.
pub struct JsonReporter<W: Write> {
    writer: Mutex<W>,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&self, result: &RaceResult) -> anyhow::Result<()> {
        let record = ReportRecord::from_result(result);
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("report writer lock poisoned"))?;
        serde_json::to_writer(&mut *writer, &record)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

//! Presentation layer - where refreshed tables and job progress end up

use clap::ValueEnum;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::{JobHandle, JobStatus, OperationStatus};

/// Screen region a table is rendered into; each refresh replaces one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Bots,
    Accounts,
    Pairs,
    Trades,
    News,
    Candles,
}

impl Region {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Bots => "Bots",
            Self::Accounts => "Accounts",
            Self::Pairs => "Pairs",
            Self::Trades => "Trades",
            Self::News => "News",
            Self::Candles => "Candles",
        }
    }
}

/// Fully rebuilt table for one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub region: Region,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(region: Region, headers: &[&str]) -> Self {
        Self {
            region,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell in `column` for each row
    pub fn column(&self, column: &str) -> Vec<&str> {
        match self.headers.iter().position(|h| h == column) {
            Some(idx) => self
                .rows
                .iter()
                .filter_map(|r| r.get(idx).map(String::as_str))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Rows as header -> cell maps, for structured output
    fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(h, c)| (h.clone(), serde_json::Value::String(c.clone())))
                    .collect()
            })
            .collect()
    }

    /// Plain-text rendering with padded columns
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = format!("== {} ==\n", self.region.title());
        out.push_str(&line(&self.headers));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}

/// Rendered state of the tracked training job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobProgress {
    pub status: JobStatus,
    pub percent: u8,
    pub message: Option<String>,
}

impl JobProgress {
    /// Badge colour the dashboard uses for the status
    pub fn badge(&self) -> &'static str {
        match self.status {
            JobStatus::Finished => "success",
            JobStatus::Error => "danger",
            _ => "warning",
        }
    }
}

impl From<&OperationStatus> for JobProgress {
    fn from(s: &OperationStatus) -> Self {
        Self {
            status: s.status.clone(),
            percent: s.percent(),
            message: s.message.clone(),
        }
    }
}

/// Sink for everything the dashboard shows to the user
pub trait Presenter: Send + Sync {
    /// One-off message (backend acknowledgement, confirmation)
    fn notify(&self, message: &str);

    /// Replace the job progress box
    fn render_job(&self, job: &JobHandle, progress: &JobProgress);

    /// Replace the contents of `table.region`
    fn render_table(&self, table: &Table);
}

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayFormat {
    /// Text format (tables)
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Presenter writing to stdout
pub struct TerminalPresenter {
    format: DisplayFormat,
}

impl TerminalPresenter {
    pub fn new(format: DisplayFormat) -> Self {
        Self { format }
    }

    fn print_structured<T: Serialize>(&self, value: &T) {
        let rendered = match self.format {
            DisplayFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
            _ => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        };
        match rendered {
            Ok(s) => println!("{}", s.trim_end()),
            Err(e) => tracing::error!("Failed to render output: {}", e),
        }
    }
}

impl Presenter for TerminalPresenter {
    fn notify(&self, message: &str) {
        match self.format {
            DisplayFormat::Text => println!("{}", message),
            _ => self.print_structured(&serde_json::json!({ "message": message })),
        }
    }

    fn render_job(&self, job: &JobHandle, progress: &JobProgress) {
        match self.format {
            DisplayFormat::Text => {
                let mut line = format!("job {}: [{}] {}%", job, progress.status, progress.percent);
                if let Some(msg) = progress.message.as_deref().filter(|m| !m.is_empty()) {
                    line.push_str(" - ");
                    line.push_str(msg);
                }
                println!("{}", line);
            }
            _ => self.print_structured(&serde_json::json!({
                "job_id": job,
                "status": progress.status,
                "progress_percent": progress.percent,
                "message": progress.message,
            })),
        }
    }

    fn render_table(&self, table: &Table) {
        match self.format {
            DisplayFormat::Text => print!("{}", table.to_text()),
            _ => self.print_structured(&serde_json::json!({
                "region": table.region,
                "rows": table.records(),
            })),
        }
    }
}

/// Presenter that keeps everything in memory
///
/// Holds the latest table per region, every job render in order, and all
/// notifications. Useful for embedding the client and in tests.
#[derive(Default)]
pub struct MemoryPresenter {
    tables: Mutex<HashMap<Region, Table>>,
    jobs: Mutex<Vec<(JobHandle, JobProgress)>>,
    notices: Mutex<Vec<String>>,
}

impl MemoryPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, region: Region) -> Option<Table> {
        lock(&self.tables).get(&region).cloned()
    }

    pub fn job_renders(&self) -> Vec<(JobHandle, JobProgress)> {
        lock(&self.jobs).clone()
    }

    pub fn last_job(&self) -> Option<(JobHandle, JobProgress)> {
        lock(&self.jobs).last().cloned()
    }

    pub fn notices(&self) -> Vec<String> {
        lock(&self.notices).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Presenter for MemoryPresenter {
    fn notify(&self, message: &str) {
        lock(&self.notices).push(message.to_string());
    }

    fn render_job(&self, job: &JobHandle, progress: &JobProgress) {
        lock(&self.jobs).push((job.clone(), progress.clone()));
    }

    fn render_table(&self, table: &Table) {
        lock(&self.tables).insert(table.region, table.clone());
    }
}

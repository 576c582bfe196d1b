//! Diagnostic channel for non-fatal failures.
//!
//! Per-database errors never reach the caller as `Err`; they are reported here
//! and the operation returns an empty or absent result instead. Components take
//! an `Arc<dyn DiagnosticSink>` so tests can capture what was reported.

use crate::error::DbError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Operation that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Query,
    ListDatabases,
    Reflect,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::ListDatabases => write!(f, "list_databases"),
            Self::Reflect => write!(f, "reflect"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub stage: Stage,
    /// None for the server root
    pub database: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn from_error(stage: Stage, database: Option<&str>, error: &DbError) -> Self {
        Self {
            stage,
            database: database.filter(|db| !db.is_empty()).map(String::from),
            message: error.to_string(),
            suggestion: error.suggestion().map(String::from),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.stage)?;
        if let Some(database) = &self.database {
            write!(f, " {}:", database)?;
        }
        write!(f, " {}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Receiver for non-fatal failures.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

impl std::fmt::Debug for dyn DiagnosticSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DiagnosticSink")
    }
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!(
            stage = %diagnostic.stage,
            database = diagnostic.database.as_deref().unwrap_or("<server>"),
            suggestion = ?diagnostic.suggestion,
            "{}",
            diagnostic.message
        );
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are only ever pushed whole, so a poisoned list is still valid.
    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send everything collected on to `next` and return it rendered.
    pub fn forward_to(&self, next: &dyn DiagnosticSink) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|diagnostic| {
                let rendered = diagnostic.to_string();
                next.report(diagnostic);
                rendered
            })
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}

/// Default sink used when none is injected.
pub fn default_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(TracingSink)
}

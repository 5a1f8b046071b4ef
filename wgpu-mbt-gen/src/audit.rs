//! Symbol-coverage audit — checks that every `wgpu*` function symbol
//! mentioned in the C headers has a matching `extern "C"` binding.
//!
//! Deliberately regex-based so it runs anywhere without libclang.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::info;

static HEADER_SYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(wgpu[A-Za-z0-9_]+)\s*\(").unwrap());
static BOUND_SYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"=\s*"(?P<sym>wgpu[A-Za-z0-9_]+)""#).unwrap());

/// Symbol sets on both sides of the audit.
#[derive(Debug, Default)]
pub struct AuditReport {
    pub header_symbols: BTreeSet<String>,
    pub bound_symbols: BTreeSet<String>,
}

impl AuditReport {
    /// Header symbols with no binding, sorted.
    pub fn missing(&self) -> Vec<&String> {
        self.header_symbols.difference(&self.bound_symbols).collect()
    }

    /// Bound symbols no header mentions, sorted.
    pub fn extra(&self) -> Vec<&String> {
        self.bound_symbols.difference(&self.header_symbols).collect()
    }
}

/// Every `wgpu*` identifier that is followed by an opening parenthesis.
/// This catches declarations, macro uses and inline calls alike, which is
/// what we want: anything the headers mention should be bindable.
pub fn header_symbols(text: &str) -> BTreeSet<String> {
    HEADER_SYM
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Symbols bound by `extern "C" fn ... = "wgpuFoo"` lines.
pub fn bound_symbols(text: &str) -> BTreeSet<String> {
    BOUND_SYM
        .captures_iter(text)
        .map(|c| c["sym"].to_string())
        .collect()
}

/// Paths that do not exist on disk. A non-empty result means the audit
/// cannot run at all, which callers report separately from a coverage
/// failure.
pub fn missing_inputs(headers: &[PathBuf], bindings: &[PathBuf]) -> Vec<PathBuf> {
    headers
        .iter()
        .chain(bindings.iter())
        .filter(|p| !p.exists())
        .cloned()
        .collect()
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Run the audit over header files and binding files.
pub fn audit(headers: &[PathBuf], bindings: &[PathBuf]) -> Result<AuditReport> {
    let mut report = AuditReport::default();
    for p in headers {
        report.header_symbols.extend(header_symbols(&read(p)?));
    }
    for p in bindings {
        report.bound_symbols.extend(bound_symbols(&read(p)?));
    }
    info!(
        header_symbols = report.header_symbols.len(),
        bound_symbols = report.bound_symbols.len(),
        missing = report.missing().len(),
        "audit complete"
    );
    Ok(report)
}

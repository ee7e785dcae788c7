//! Console reporter
//!
//! Renders restore progress as one line per event. Progress and summaries
//! go to stdout; warnings and errors go to stderr.

use super::theme::{Theme, format_size};
use coob_core::Reporter;
use coob_schema::{PackageId, PackageVersion};
use crossterm::style::{Color, Stylize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Reporter printing styled lines to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    theme: Theme,
    /// Bytes received so far, keyed by `<id>.<version>`.
    received: Mutex<HashMap<String, u64>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, key: String, bytes: u64) {
        if let Ok(mut received) = self.received.lock() {
            received.insert(key, bytes);
        }
    }

    fn take(&self, key: &str) -> Option<u64> {
        self.received.lock().ok()?.remove(key)
    }

    /// A status line for one package: icon, id, version, detail.
    pub fn package_line(
        &self,
        icon: &str,
        color: Color,
        id: &PackageId,
        version: &PackageVersion,
        detail: &str,
    ) -> String {
        let layout = &self.theme.layout;
        let name = format!("{:<width$}", id.as_str(), width = layout.name_width);
        let version = format!("{:<width$}", version.to_string(), width = layout.version_width);
        format!(
            "  {} {} {} {}",
            icon.with(color),
            name.with(self.theme.colors.package_name),
            version.with(self.theme.colors.version),
            detail.with(self.theme.colors.secondary)
        )
    }
}

fn key(id: &PackageId, version: &PackageVersion) -> String {
    format!("{id}.{version}")
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        println!();
        println!("{}", title.with(self.theme.colors.header).bold());
    }

    fn resolving(&self, id: &PackageId) {
        println!(
            "  {} {} {}",
            self.theme.icons.active.with(self.theme.colors.active),
            id.as_str().with(self.theme.colors.package_name),
            "looking up latest version".with(self.theme.colors.secondary)
        );
    }

    fn resolved(&self, id: &PackageId, version: &PackageVersion) {
        let line = self.package_line(
            self.theme.icons.success,
            self.theme.colors.success,
            id,
            version,
            "selected",
        );
        println!("{line}");
    }

    fn downloading(
        &self,
        id: &PackageId,
        version: &PackageVersion,
        current: u64,
        total: Option<u64>,
    ) {
        self.record(key(id, version), current);
        if current == 0 {
            let detail = match total {
                Some(t) if t > 0 => format!("downloading {}", format_size(t)),
                _ => "downloading".to_string(),
            };
            let line = self.package_line(
                self.theme.icons.active,
                self.theme.colors.active,
                id,
                version,
                &detail,
            );
            println!("{line}");
        }
    }

    fn extracting(&self, id: &PackageId, version: &PackageVersion) {
        tracing::debug!(package = %id, %version, "extracting");
    }

    fn done(&self, id: &PackageId, version: &PackageVersion, path: &Path) {
        let detail = match self.take(&key(id, version)) {
            Some(bytes) if bytes > 0 => format!("{}  {}", format_size(bytes), path.display()),
            _ => path.display().to_string(),
        };
        let line = self.package_line(
            self.theme.icons.success,
            self.theme.colors.success,
            id,
            version,
            &detail,
        );
        println!("{line}");
    }

    fn failed(&self, id: &PackageId, version: &PackageVersion, reason: &str) {
        let line = self.package_line(
            self.theme.icons.error,
            self.theme.colors.error,
            id,
            version,
            reason,
        );
        eprintln!("{line}");
    }

    fn info(&self, msg: &str) {
        println!("  {} {msg}", self.theme.icons.info.with(self.theme.colors.secondary));
    }

    fn warning(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }

    fn error(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        );
    }

    fn summary(&self, count: usize, elapsed_secs: f64) {
        let noun = if count == 1 { "package" } else { "packages" };
        println!();
        let line = format!("  Restored {count} {noun} in {elapsed_secs:.1}s");
        println!("{}", line.with(self.theme.colors.success));
    }
}

//! Output rendering and formatting

use crate::report::{CommandResult, IndexSummary, Listing, OutcomeStatus, VerifySummary};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::Term;
use refcheck_types::OutputFormat;
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    format: OutputFormat,
}

impl OutputRenderer {
    /// Pick JSON when asked for, tables on a terminal, plain lines otherwise
    pub fn new(json_output: bool) -> Self {
        let format = if json_output {
            OutputFormat::Json
        } else if Term::stdout().is_term() {
            OutputFormat::Tty
        } else {
            OutputFormat::Plain
        };
        Self { format }
    }

    #[cfg(test)]
    pub fn with_format(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandResult) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = result.to_json().map_err(io::Error::other)?;
                println!("{json}");
            }
            OutputFormat::Tty | OutputFormat::Plain => {
                for line in self.render_lines(result) {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }

    fn render_lines(&self, result: &CommandResult) -> Vec<String> {
        match result {
            CommandResult::Index(summary) => self.render_index_summary(summary),
            CommandResult::List(listing) => self.render_listing(listing),
            CommandResult::Verify(summary) => self.render_verify_summary(summary),
        }
    }

    fn render_index_summary(&self, summary: &IndexSummary) -> Vec<String> {
        let mut lines = vec![format!(
            "Indexed {} files from {} ({})",
            summary.entries,
            summary.root.display(),
            summary.algorithm
        )];

        if !summary.skipped.is_empty() {
            lines.push(format!("Skipped {} unreadable entries:", summary.skipped.len()));
            for skipped in &summary.skipped {
                lines.push(format!("  {}: {}", skipped.path.display(), skipped.reason));
            }
        }
        if !summary.shadowed.is_empty() {
            lines.push(format!("{} duplicate names:", summary.shadowed.len()));
            for shadowed in &summary.shadowed {
                lines.push(format!(
                    "  {}: using {}, ignoring {}",
                    shadowed.name,
                    shadowed.kept.display(),
                    shadowed.shadowed.display()
                ));
            }
        }
        if let Some(export) = &summary.export {
            lines.push(format!("Exported to {}", export.display()));
        }
        lines
    }

    fn render_listing(&self, listing: &Listing) -> Vec<String> {
        if listing.files.is_empty() {
            return vec![format!("No reference files in {}.", listing.root.display())];
        }

        if self.format == OutputFormat::Plain {
            return listing
                .files
                .iter()
                .map(|f| format!("{}\t{}", f.hash, f.name))
                .collect();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new(listing.algorithm.to_uppercase()).add_attribute(Attribute::Bold),
        ]);
        for file in &listing.files {
            table.add_row(vec![
                Cell::new(&file.name),
                Cell::new(file.size.map_or_else(|| "-".to_string(), format_bytes)),
                Cell::new(file.hash.to_hex()),
            ]);
        }
        vec![table.to_string()]
    }

    fn render_verify_summary(&self, summary: &VerifySummary) -> Vec<String> {
        if self.format == OutputFormat::Plain {
            return summary
                .results
                .iter()
                .map(|r| {
                    format!(
                        "{}\t{}\t{}",
                        status_label(r.status),
                        r.file.display(),
                        r.message.as_deref().or(r.digest.as_deref()).unwrap_or("")
                    )
                })
                .collect();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("File").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Details").add_attribute(Attribute::Bold),
        ]);
        for outcome in &summary.results {
            let color = match outcome.status {
                OutcomeStatus::Accepted => Color::Green,
                OutcomeStatus::Rejected => Color::Red,
                OutcomeStatus::Failed => Color::Yellow,
            };
            let details = match (&outcome.stored_at, &outcome.message) {
                (Some(stored), _) => format!("stored at {}", stored.display()),
                (None, Some(message)) => message.clone(),
                (None, None) => String::new(),
            };
            table.add_row(vec![
                Cell::new(outcome.file.display()),
                Cell::new(status_label(outcome.status)).fg(color),
                Cell::new(details),
            ]);
        }
        vec![table.to_string()]
    }
}

fn status_label(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Accepted => "accepted",
        OutcomeStatus::Rejected => "rejected",
        OutcomeStatus::Failed => "failed",
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

//! Event handling and user feedback

use crate::logging::log_event_with_tracing;
use console::{Style, Term};
use refcheck_events::{AppEvent, EventMessage, IndexEvent, UploadEvent};

/// Turns engine events into status lines on stderr
pub struct EventHandler {
    term: Term,
    warn_style: Style,
    error_style: Style,
    dim_style: Style,
    /// Print nothing; stdout carries JSON
    quiet: bool,
    /// Forward every event to tracing
    debug: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, quiet: bool, debug: bool) -> Self {
        let style = |s: Style| if colors_enabled { s } else { Style::new() };
        Self {
            term: Term::stderr(),
            warn_style: style(Style::new().yellow()),
            error_style: style(Style::new().red().bold()),
            dim_style: style(Style::new().dim()),
            quiet,
            debug,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        if self.debug {
            log_event_with_tracing(&message);
        }
        if self.quiet {
            return;
        }
        if let Some(line) = self.status_line(&message.event) {
            self.term.write_line(&line).unwrap_or(());
        }
    }

    fn status_line(&self, event: &AppEvent) -> Option<String> {
        match event {
            AppEvent::Index(IndexEvent::Started { root, algorithm }) => Some(
                self.dim_style
                    .apply_to(format!("Indexing {} ({algorithm})", root.display()))
                    .to_string(),
            ),
            AppEvent::Index(IndexEvent::EntrySkipped { path, reason }) => Some(
                self.warn_style
                    .apply_to(format!("warning: skipped {}: {reason}", path.display()))
                    .to_string(),
            ),
            AppEvent::Index(IndexEvent::EntryShadowed {
                name,
                kept,
                shadowed,
            }) => Some(
                self.warn_style
                    .apply_to(format!(
                        "warning: {name} appears more than once; using {} over {}",
                        kept.display(),
                        shadowed.display()
                    ))
                    .to_string(),
            ),
            AppEvent::Index(IndexEvent::Failed { failure, .. }) => Some(
                self.error_style
                    .apply_to(format!("error: indexing failed: {}", failure.message))
                    .to_string(),
            ),
            AppEvent::Upload(UploadEvent::Failed {
                claimed_name,
                failure,
                ..
            }) => Some(
                self.error_style
                    .apply_to(format!("error: {claimed_name}: {}", failure.message))
                    .to_string(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_skipped_entry_produces_warning() {
        let handler = EventHandler::new(false, false, false);
        let line = handler.status_line(&AppEvent::Index(IndexEvent::EntrySkipped {
            path: PathBuf::from("locked/secret.bin"),
            reason: "permission denied".to_string(),
        }));
        assert_eq!(
            line.as_deref(),
            Some("warning: skipped locked/secret.bin: permission denied")
        );
    }

    #[test]
    fn test_accepted_upload_is_not_a_status_line() {
        let handler = EventHandler::new(false, false, false);
        let line = handler.status_line(&AppEvent::Upload(UploadEvent::Accepted {
            upload_id: uuid::Uuid::nil(),
            name: "report.pdf".to_string(),
            digest: "ab".repeat(32),
            bytes: 10,
            path: PathBuf::from("uploads/report.pdf"),
        }));
        assert!(line.is_none());
    }

    #[test]
    fn test_staged_upload_is_not_a_status_line() {
        let handler = EventHandler::new(false, false, false);
        let line = handler.status_line(&AppEvent::Upload(UploadEvent::Staged {
            upload_id: uuid::Uuid::nil(),
            bytes: 10,
        }));
        assert!(line.is_none());
    }
}

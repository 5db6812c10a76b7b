//! Output formatting

use sqlsleuth_core::ValidationReport;

use crate::args::OutputFormat;

/// Formatter for per-file validation reports
pub struct OutputFormatter {
    format: OutputFormat,
    file_name: String,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, file_name: String) -> Self {
        Self { format, file_name }
    }

    /// Print a report in the configured format
    pub fn print_report(&self, report: &ValidationReport) {
        match self.format {
            OutputFormat::Human => self.print_human(report),
            OutputFormat::Json => self.print_json(report),
        }
    }

    fn print_human(&self, report: &ValidationReport) {
        for error in &report.errors {
            eprintln!("\x1b[31merror\x1b[0m: {}", error);
            eprintln!("  --> {}", self.file_name);
        }

        for warning in &report.warnings {
            eprintln!("\x1b[33mwarning\x1b[0m: {}", warning);
            eprintln!("  --> {}", self.file_name);
        }

        // Lenient-mode phantom columns are findings without a matching
        // error entry; surface them as notes.
        for column in &report.phantom_columns {
            if !report
                .errors
                .iter()
                .any(|e| e.contains(&format!("'{}'", column)))
            {
                eprintln!(
                    "\x1b[34mnote\x1b[0m: column '{}' could not be resolved against the schema",
                    column
                );
                eprintln!("  --> {}", self.file_name);
            }
        }

        if report.has_findings() {
            eprintln!();
        }
    }

    fn print_json(&self, report: &ValidationReport) {
        let output = serde_json::json!({
            "file": self.file_name,
            "report": report
        });
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    }
}

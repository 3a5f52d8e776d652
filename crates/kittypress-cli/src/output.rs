//! Console output for the CLI
//!
//! Results go to stdout, warnings, errors and progress lines to stderr. In
//! JSON mode only machine-readable documents are printed.

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Console printer for one invocation
#[derive(Debug, Clone, Copy)]
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format.is_json()
    }

    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("\u{2713} {message}"),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"success": true, "message": message}));
            }
        }
    }

    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("\u{2717} {message}"),
            OutputFormat::Json => {
                eprintln!("{}", serde_json::json!({"success": false, "error": message}));
            }
        }
    }

    pub fn warn(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("\u{26a0} {message}"),
            OutputFormat::Json => {
                eprintln!("{}", serde_json::json!({"level": "warning", "message": message}));
            }
        }
    }

    /// Indented detail line; human mode only
    pub fn info(&self, message: &str) {
        if !self.is_json() {
            println!("  {message}");
        }
    }

    /// `label: value` detail line; human mode only
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        self.info(&format!("{label}: {value}"));
    }

    /// Pipeline progress line; suppressed by `--quiet` and in JSON mode
    pub fn progress(&self, message: &str) {
        if !self.is_json() && !self.quiet {
            eprintln!("\u{2026} {message}");
        }
    }

    /// Pretty-printed JSON document; JSON mode only
    pub fn json(&self, value: &serde_json::Value) {
        if self.is_json() {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_default()
            );
        }
    }
}

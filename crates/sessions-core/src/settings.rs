use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Validate timestamps, drop exact duplicates and compute per-user sessions
#[derive(Parser, Debug, Clone)]
#[command(
    name = "event-sessions",
    about = "Validate timestamps, drop exact duplicates and compute per-user sessions",
    version
)]
pub struct Settings {
    /// Path to the events file (JSON Lines or concatenated objects)
    #[arg(long)]
    pub input: PathBuf,

    /// Output file for the session summary
    #[arg(long, default_value = "sessions.csv")]
    pub out: PathBuf,

    /// Output file for skipped records
    #[arg(long = "skips-out", alias = "skips_out", default_value = "skipped.csv")]
    pub skips_out: PathBuf,

    /// Optional output file for the deduplicated event table
    #[arg(long = "events-out", alias = "events_out")]
    pub events_out: Option<PathBuf>,

    /// Field delimiter for output tables (a single ASCII character, or "tab")
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: char,

    /// Print stats as a JSON object instead of `key: value` lines
    #[arg(long)]
    pub stats_json: bool,

    /// Logging level
    #[arg(
        long,
        env = "EVENT_SESSIONS_LOG_LEVEL",
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Log file path
    #[arg(long, env = "EVENT_SESSIONS_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Parse an explicit argument list, returning clap's error instead of
    /// exiting the process.
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Settings::try_parse_from(args)
    }
}

/// Parse the `--delimiter` value.
///
/// `"tab"` and `"\t"` map to a tab character. Anything else must be a single
/// ASCII character other than a double quote or a line break.
pub fn parse_delimiter(value: &str) -> Result<char, String> {
    if value.eq_ignore_ascii_case("tab") || value == "\\t" {
        return Ok('\t');
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && !matches!(c, '"' | '\n' | '\r') => Ok(c),
        (Some(_), None) => Err(format!("unsupported delimiter {:?}", value)),
        _ => Err(format!(
            "delimiter must be a single character, got {:?}",
            value
        )),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

//! Process-wide `tracing` setup.
//!
//! Records go to stderr so that command output on stdout stays clean.
//! `RUST_LOG` selects what is recorded and `RUST_LOG_FORMAT` how.

use std::{env, io, sync::Once};

use tracing_subscriber::EnvFilter;

static LOG_INIT: Once = Once::new();

/// Used when `RUST_LOG` is unset, empty or unparsable.
pub const DEFAULT_DIRECTIVES: &str = "gavel=info,warn";

/// How log records are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, coloured unless `NO_COLOR` is set.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Read from `RUST_LOG_FORMAT`; anything but `json` means text.
    pub fn from_env() -> Self {
        Self::parse(env::var("RUST_LOG_FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Install the global subscriber. Calls after the first are no-ops.
pub fn init_logging() {
    LOG_INIT.call_once(|| {
        let filter = filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr);
        match LogFormat::from_env() {
            LogFormat::Json => builder.json().init(),
            LogFormat::Text => builder.with_ansi(use_color()).init(),
        }
    });
}

fn filter(directives: Option<&str>) -> EnvFilter {
    let Some(d) = directives.map(str::trim).filter(|d| !d.is_empty()) else {
        return EnvFilter::new(DEFAULT_DIRECTIVES);
    };
    match EnvFilter::try_new(d) {
        Ok(f) => f,
        Err(err) => {
            // No subscriber yet to report through.
            eprintln!("ignoring invalid {}={d:?}: {err}", EnvFilter::DEFAULT_ENV);
            EnvFilter::new(DEFAULT_DIRECTIVES)
        }
    }
}

fn use_color() -> bool {
    env::var_os("NO_COLOR").is_none_or(|v| v.is_empty())
}

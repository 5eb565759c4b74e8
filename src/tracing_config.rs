//! Subscriber setup for `pyz` binaries.
//!
//! Logging is off unless `PYZ_LOG` or `RUST_LOG` holds a filter. `PYZ_LOG`
//! wins when both are present. `PYZ_LOG_FORMAT` picks the layer:
//!
//! | value            | output                                              |
//! |------------------|-----------------------------------------------------|
//! | `text` (default) | one line per event                                  |
//! | `tree`           | `tracing-tree` indentation, one level per pipeline span |
//! | `json`           | one JSON object per event                           |
//!
//! ```bash
//! # follow a query as it pulls dependency-stale units back through bind
//! PYZ_LOG=debug PYZ_LOG_FORMAT=tree pyz main.py
//!
//! # memo hits, re-entrant evaluations, handle allocation
//! PYZ_LOG="pyz_checker=trace,pyz_program=trace" pyz .
//! ```
//!
//! Everything is written to stderr; stdout carries diagnostics only.

use std::str::FromStr;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Layer selected by `PYZ_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Tree,
    Json,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    /// Unrecognised values fall back to `Text`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim().to_ascii_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        })
    }
}

/// Logging settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Filter directives; `None` leaves logging off.
    pub filter: Option<String>,
    pub format: LogFormat,
}

impl TracingConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Settings from an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let filter = var("PYZ_LOG").or_else(|| var("RUST_LOG"));
        let format = var("PYZ_LOG_FORMAT")
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        TracingConfig { filter, format }
    }

    /// Install the global subscriber. Returns `false` when logging is off.
    pub fn install(&self) -> bool {
        let Some(directives) = &self.filter else {
            return false;
        };
        let filter = EnvFilter::builder().parse_lossy(directives);

        let tree = (self.format == LogFormat::Tree).then(|| {
            tracing_tree::HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true)
        });
        let json = (self.format == LogFormat::Json)
            .then(|| fmt::layer().json().with_writer(std::io::stderr));
        let text = (self.format == LogFormat::Text)
            .then(|| fmt::layer().with_writer(std::io::stderr));

        Registry::default()
            .with(filter)
            .with(tree)
            .with(json)
            .with(text)
            .init();
        true
    }
}

/// Install the subscriber described by the environment, if any.
pub fn init_tracing() {
    TracingConfig::from_env().install();
}

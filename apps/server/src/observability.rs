//! Tracing initialization (spec.md SPEC_FULL.md §A.1).

use crate::config::LogFormat;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => registry.json().init(),
        LogFormat::Pretty => registry.init(),
    }
}

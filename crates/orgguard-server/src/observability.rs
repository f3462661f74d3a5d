//! Logging bootstrap driven by the `logging` section of [`ServerConfig`].
//!
//! Authorization denials are logged at `debug`, sink failures at `warn` and
//! authorization misconfiguration at `error`. With `logging.json` set each
//! entry is one JSON object:
//!
//! ```json
//! {"timestamp":"2026-01-15T10:30:00.000Z","level":"WARN","target":"orgguard_server::handlers::events::dispatcher","fields":{"message":"event chunk failed","chunk":1}}
//! ```
//!
//! [`ServerConfig`]: crate::config::ServerConfig

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Filter from `RUST_LOG`, or from `settings.level` when it is unset.
fn filter_for(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.max_level().to_string()))
}

/// Installs the process-wide subscriber described by `settings`.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one stays in place.
pub fn init_logging(settings: &LoggingSettings) -> bool {
    let filter = filter_for(settings);
    let installed = if settings.json {
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            ),
        )
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true)),
        )
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_json_entries_carry_level_and_fields() {
        let out = Captured::default();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("trace"))
            .with(fmt::layer().json().with_writer(out.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(chunk = 1, "event chunk failed");
        });

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        let line = text.lines().next().expect("one log line");
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["level"], "WARN");
        assert_eq!(parsed["fields"]["message"], "event chunk failed");
        assert_eq!(parsed["fields"]["chunk"], 1);
    }

    #[test]
    #[serial_test::serial]
    fn test_configured_level_applies_without_rust_log() {
        std::env::remove_var("RUST_LOG");
        let settings = LoggingSettings {
            level: "warn".to_string(),
            json: false,
        };
        assert_eq!(
            filter_for(&settings).max_level_hint(),
            Some(tracing_subscriber::filter::LevelFilter::WARN)
        );
    }
}

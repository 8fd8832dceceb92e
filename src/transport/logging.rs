use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};

const DEFAULT_LOG_PATH: &str = "/tmp/parlor-events.log";
const DEBUG_EVENTS_ENV: &str = "PARLOR_DEBUG_EVENTS";
const LOG_PATH_ENV: &str = "PARLOR_LOG_PATH";

pub fn debug_events_enabled() -> bool {
    std::env::var(DEBUG_EVENTS_ENV)
        .ok()
        .and_then(crate::util::parse_bool_flag)
        .unwrap_or(false)
}

/// Verbose per-event trace, gated by `PARLOR_DEBUG_EVENTS`.
pub fn emit_debug_event(direction: &str, detail: &str) {
    let message = format!("PARLOR_TRANSPORT DEBUG {direction} {detail}\n");
    emit_log_message(&message);
}

/// A payload that did not match its event's schema. The event is dropped by
/// the caller; this report is the only trace it leaves.
pub fn emit_malformed_event(event_type: Option<&str>, data: &str, parse_error: &serde_json::Error) {
    let message = format!(
        "PARLOR_TRANSPORT ERROR malformed_event error={parse_error}\nevent_type={}\ndata:\n{data}\n",
        event_type.unwrap_or("<none>")
    );
    emit_log_message(&message);
}

pub fn emit_transport_failure(detail: &str) {
    let message = format!("PARLOR_TRANSPORT ERROR delivery_failed {detail}\n");
    emit_log_message(&message);
}

fn emit_log_message(message: &str) {
    if let Some(path) = resolve_log_path() {
        if append_log_file(&path, message).is_ok() {
            return;
        }
    }

    eprintln!("{message}");
}

fn resolve_log_path() -> Option<String> {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(DEFAULT_LOG_PATH.to_string())
            } else {
                None
            }
        })
}

fn append_log_file(path: &str, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_events_enabled_accepts_truthy_variants() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(DEBUG_EVENTS_ENV, "1");
        assert!(debug_events_enabled());
        std::env::set_var(DEBUG_EVENTS_ENV, "on");
        assert!(debug_events_enabled());
        std::env::remove_var(DEBUG_EVENTS_ENV);
        assert!(!debug_events_enabled());
    }

    #[test]
    fn test_resolve_log_path_prefers_env_override() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(LOG_PATH_ENV, "/tmp/parlor-test.log");
        assert_eq!(resolve_log_path().as_deref(), Some("/tmp/parlor-test.log"));
        std::env::remove_var(LOG_PATH_ENV);
    }

    #[test]
    fn test_append_log_file_writes_message() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("events.log");
        let path = path.to_str().expect("utf8 path");

        append_log_file(path, "first\n").expect("first write");
        append_log_file(path, "second\n").expect("second write");

        let contents = std::fs::read_to_string(path).expect("read back");
        assert_eq!(contents, "first\nsecond\n");
    }
}

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;

/// Environment variable naming a file to append logs to
pub const LOG_PATH_VAR: &str = "HOTBAR_LOG_PATH";

/// Install the global subscriber.
///
/// Level comes from `RUST_LOG` (default `info`). With `HOTBAR_LOG_PATH` set,
/// logs are appended to that file through a background writer; the returned
/// guard flushes it on drop and must be held until exit. Otherwise logs go to
/// stderr so they don't interleave with console output on stdout.
pub fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var(LOG_PATH_VAR) {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .init();
                return Some(guard);
            }
            Err(e) => eprintln!("cannot open {LOG_PATH_VAR}={path}: {e}, logging to stderr"),
        }
    }

    // Fallback to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    None
}

use tracing_subscriber::{fmt, EnvFilter};

use crate::stderr_buffer::BufferedStderr;

/// Install the global log subscriber.
///
/// `RUST_LOG` wins when set. Otherwise only warnings are shown, or debug
/// output for this crate with `--verbose`. Output goes to stderr through the
/// buffer so the questionnaire screen stays intact.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "couplefin=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(|| BufferedStderr)
        .try_init();
}

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "path_matrix_lambda=info,path_matrix_core=info";

/// Installs a JSON `tracing` subscriber for CloudWatch, honouring `RUST_LOG`.
///
/// Uses `try_init`, so a second call (tests, warm containers) is a no-op.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .with_current_span(false)
        .try_init();
}

use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

/// Route library logs to the test output. Integration tests call this instead
/// of using `#[traced_test]`; the two cannot be combined in one process.
pub fn tracing_logger() {
    let info_env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("neptune_framing=trace,receive_msg_bytes=trace"));
    let subscriber = FmtSubscriber::builder()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(info_env_filter)
        .with_thread_ids(true)
        .with_test_writer()
        .finish();

    // Another test in this binary may have installed it already.
    let _result = tracing::subscriber::set_global_default(subscriber);
}

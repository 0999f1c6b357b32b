use std::process;

use anyhow::Result;
use clap::Parser;
use neptune_framing::config_models::cli_args;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

pub fn main() -> Result<()> {
    let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build()?;

    let run_result = tokio_runtime.block_on(async {
        let args = cli_args::Args::parse();

        #[cfg(not(feature = "tokio-console"))]
        {
            use std::io::Write;
            if args.tokio_console {
                let mut stderr = std::io::stderr().lock();
                writeln!(stderr, "--tokio-console requires the tokio-console feature.")?;
                stderr.flush()?;
                anyhow::bail!("built without the tokio-console feature");
            }

            set_up_logger();
        }

        #[cfg(feature = "tokio-console")]
        if args.tokio_console {
            console_subscriber::init();
        } else {
            set_up_logger();
        }

        neptune_framing::initialize(args).await?.run().await
    });

    tokio_runtime.shutdown_timeout(tokio::time::Duration::from_secs(10));

    process::exit(run_result?)
}

/// RFC 3339 timestamps, filtered by `RUST_LOG` (default `info`).
fn set_up_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_ids(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Unable to set global default subscriber");
    }
}

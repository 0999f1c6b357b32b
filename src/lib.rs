#![deny(clippy::shadow_unrelated)]
//
// If code coverage tool `cargo-llvm-cov` is running with the nightly toolchain,
// enable the unstable “coverage” attribute. This allows using the annotation
// `#[coverage(off)]` to explicitly exclude certain parts of the code from
// being considered as “code under test.” Most prominently, the annotation
// should be added to every `#[cfg(test)]` module. Since the “coverage”
// feature is enable only conditionally, the annotation to use is:
// `#[cfg_attr(coverage_nightly, coverage(off))]`.
//
// See also:
// - https://github.com/taiki-e/cargo-llvm-cov#exclude-code-from-coverage
// - https://github.com/rust-lang/rust/issues/84605
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config_models;
pub mod connect_to_peers;
pub mod peer_loop;
pub mod protocol;


use anyhow::Result;
use config_models::cli_args;
use connect_to_peers::PeerListener;
use tracing::info;

/// Validate the arguments and bind the listening socket. Call
/// [`PeerListener::run`] on the result to start accepting peers.
pub async fn initialize(args: cli_args::Args) -> Result<PeerListener> {
    let config = args.framer_config()?;
    let max_block_size = args.max_block_size();
    info!(
        "Framing {} traffic, payload cap {} bytes",
        config.network,
        config.size_cap.max_payload_bytes(max_block_size)
    );

    PeerListener::bind(args.own_listen_address(), config, max_block_size).await
}

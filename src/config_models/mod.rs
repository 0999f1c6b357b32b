pub mod cli_args;
pub mod framer_config;
pub mod network;

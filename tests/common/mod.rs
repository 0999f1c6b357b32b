#![allow(dead_code)]

pub mod logging;

use neptune_framing::config_models::network::Network;
use neptune_framing::protocol::Command;
use neptune_framing::protocol::MessageHeader;

/// A complete main-net message as a peer would send it.
pub fn main_net_message(command: &str, payload: &[u8]) -> Vec<u8> {
    let command = Command::new(command).unwrap();
    let header = MessageHeader::for_payload(Network::Main.magic(), command, payload);

    let mut bytes = header.encode().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

/// A main-net header that declares `payload_length` bytes, without any
/// payload behind it.
pub fn main_net_header(command: &str, payload_length: u32) -> Vec<u8> {
    let mut header = MessageHeader::for_payload(
        Network::Main.magic(),
        Command::new(command).unwrap(),
        &[],
    );
    header.payload_length = payload_length;
    header.encode().to_vec()
}

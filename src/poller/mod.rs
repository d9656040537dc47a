// Package poller implements the device side: it drains the relay and performs
// the requested power actions (Wake-on-LAN, shutdown via the command receiver).

pub mod poller;
pub mod wol;

pub use poller::{decide, Action, Poller, PollerError, PollerState};
pub use wol::{magic_packet, send_magic_packet, MacAddress, MacParseError};

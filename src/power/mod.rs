// Package power issues the privileged host power actions of the command receiver.

pub mod issuer;

pub use issuer::{CommandIssuer, PowerError, ShutdownIssuer};

//! Integration tests for powerrelay.
//!
//! End-to-end scenarios for the relay queue API, the command receiver and the
//! device poller, driven both in-process (router oneshot) and over real sockets.

mod cases_listener_test;

pub mod support;

// Application roles: relay, command receiver (listener) and device poller.

pub mod listener;
pub mod poller;
pub mod relay;

pub use listener::ListenerApp;
pub use poller::PollerApp;
pub use relay::RelayApp;

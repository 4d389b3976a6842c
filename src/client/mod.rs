//! A client for the API, used by tools that watch a user's account.

mod api;
mod poller;
mod session;

pub use api::{ApiClient, ClientError};
pub use poller::{
    IntervalTicker, LoggingSink, NotificationPoller, NotificationSink, NotificationSource,
    PollerHandle, Ticker,
};
pub use session::Session;

//! Bot Framework transport module
//!
//! Models inbound activities, replies through the connector service and
//! dispatches message activities to the orchestrator.

mod activity;
mod connector;
mod handler;

pub use activity::{Activity, ChannelAccount, ConversationAccount};
pub use connector::{ChatTransport, ConnectorClient};
pub use handler::ActivityHandler;

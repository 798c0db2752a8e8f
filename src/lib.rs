//! Rūmie Reader: fetch chatbot conversation logs through the gateway and
//! render them as threaded conversations with shareable deep links.

pub mod config;
pub mod conversation;
pub mod filter;
pub mod format;
pub mod loader;
pub mod records;
pub mod render;
pub mod share;
pub mod viewer;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use conversation::{Conversation, group_conversations};
pub use filter::TimeFilter;
pub use loader::{DataSource, FetchError, GatewaySource, RawResponse, load_data};
pub use records::{MessageRecord, parse_response_data};
pub use render::{PageOptions, render_page};
pub use share::DeepLink;
pub use viewer::{Dataset, Notice, RefreshControl, RefreshError, ViewState, Viewer};

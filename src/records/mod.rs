//! Message records: upstream field access and response normalization.

mod normalize;
mod types;

pub use normalize::{normalize_payload, parse_response_data};
pub use types::{
    BOT_MESSAGE, CATEGORY, CHAT_ID, CREATED_DATE, FIRST_NAME, MessageRecord, RECORD_ID,
    UNKNOWN_USER, USER_MESSAGE, USERNAME,
};

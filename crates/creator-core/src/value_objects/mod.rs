//! Value objects - immutable types that represent domain concepts

mod message_status;
mod snowflake;

pub use message_status::MessageStatus;
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};

//! Entity to model mappers
//!
//! Conversions between domain entities (creator-core) and database models.
//! - `From<Model> for Entity`: Convert database rows to domain objects
//! - `*Insert` structs: Prepare entity data for database operations

mod conversation;
mod message;
mod reaction;
mod user;

pub use message::MessageInsert;
pub use reaction::ReactionInsert;
pub use user::UserInsert;

//! Durable message persistence (full-text search, cursor pagination,
//! unread counts, thread enumeration) and the product/engineering
//! proposal log that rides alongside it.

mod error;
mod proposals;
mod store;

pub use error::MessageStoreError;
pub use proposals::ProposalStore;
pub use store::{MessageFilter, MessageStore, UnreadCount};

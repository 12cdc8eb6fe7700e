//! Remote status store: the contract, the hosted REST client, and an
//! in-process implementation.

pub mod http;
pub mod memory;
pub mod store;
pub mod types;

pub use http::HttpStatusStore;
pub use memory::{Household, InMemoryStatusStore, ResetKey};
pub use store::StatusStore;
pub use types::{parse_members, parse_schedule, validate_members, Member, ResetRequest, ScheduleTimes};

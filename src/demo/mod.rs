//! Demo drivers for the binary.
//!
//! - `walkthrough` - Step-by-step tour of LRU behavior on a tiny cache
//! - `users` - Cache-aside user lookups under concurrent load

pub mod users;
pub mod walkthrough;

pub use users::{LoadReport, User, UserDirectory, UserService};

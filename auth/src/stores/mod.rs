//! [`UserStore`](crate::providers::UserStore) implementations that live in this crate.

mod memory;

pub use memory::InMemoryUserStore;

pub mod catalog;
pub mod server;
pub mod store;

pub use catalog::demo_servers;
pub use server::{ServerRecord, ServerStatus};
pub use store::{Selector, StateView, Store, StoreError, StoreEvent, StoreState, SubscriptionId};

// Infrastructure: dependency container, storage backends, delivery transport,
// background sweep. No business logic here.

pub mod deps;
pub mod store;
pub mod sweep;
pub mod traits;

pub use deps::ServerDeps;
pub use store::{IssueStore, MemoryStore, OtpStore, StorageBackend, StoreError, Stores, UserStore};
pub use traits::{OtpDelivery, SmsGateAdapter};

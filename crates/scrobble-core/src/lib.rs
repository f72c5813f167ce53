pub mod action;
pub mod error;
pub mod identity;
pub mod locks;
pub mod relay;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{action_for, ScrobbleIntent};
pub use error::{RelayError, ResolveError, StoreError};
pub use identity::IdentityRecord;
pub use locks::IdentityLocks;
pub use relay::{EventRelay, RelayOutcome, SkipReason};
pub use resolver::MediaResolver;
pub use store::{open_store, CredentialStore, DiskStore, MemoryStore};
#[cfg(feature = "postgres")]
pub use store::PostgresStore;
#[cfg(feature = "redis")]
pub use store::RedisStore;

//! Session state: the token store, its durable backing, the teardown run on
//! authorization failure, and the synchronizer that follows the identity
//! provider.

mod storage;
mod store;
mod sync;
mod teardown;

pub use storage::{FileStorage, MemoryStorage};
pub use store::{SessionStore, ACCESS_TOKEN_KEY};
pub use sync::{SessionSynchronizer, SyncState, TokenResponse};
pub use teardown::SessionTeardown;

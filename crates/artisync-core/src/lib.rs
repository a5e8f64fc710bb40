pub mod commits;
pub mod disposition;
pub mod error;
pub mod io;
pub mod parallel;
pub mod paths;
pub mod pipeline;
pub mod poller;
pub mod provider;
pub mod settings;
pub mod state;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Result, SyncError};
pub use provider::CiProvider;
pub use settings::{Settings, WatchTarget};
pub use state::{RunIdentity, StateStore, SyncState};
pub use sync::{SyncOutcome, Syncer};

//! Collaborators: persistence, remote actions and user notices.

mod error;
mod file;
mod notifier;
mod offline;
mod traits;

pub use error::{PersistenceError, RemoteError};
pub use file::FilePersistence;
pub use notifier::TracingNotifier;
pub use offline::OfflineRemote;
pub use traits::{Notice, NoticeKind, Notifier, Persistence, RemoteActions};

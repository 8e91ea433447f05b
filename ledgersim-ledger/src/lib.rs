pub mod append;
pub mod events;
pub mod registry;
pub mod service;
pub mod storage;
pub mod tamper;

pub use append::AppendReceipt;
pub use events::LedgerEvent;
pub use registry::{JoinOutcome, LedgerRegistry};
pub use service::LedgerService;
pub use storage::{MemoryStore, SnapshotPersistence, SnapshotStore};

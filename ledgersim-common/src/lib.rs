pub mod block;
pub mod chain;
pub mod crypto;
pub mod error;
pub mod peer;
pub mod utils;
pub mod verify;

pub use block::{Block, Verdict};
pub use error::{LedgerError, Result};
pub use peer::Peer;
pub use utils::PeerId;

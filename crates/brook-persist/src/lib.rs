pub mod error;
pub mod gateway;
pub mod memory;
pub mod saver;

pub use error::PersistError;
pub use gateway::{PersistenceGateway, SessionSnapshot};
pub use memory::MemoryGateway;
pub use saver::{SessionSaver, DEFAULT_QUEUE_DEPTH};

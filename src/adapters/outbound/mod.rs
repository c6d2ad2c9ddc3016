pub mod console_logger;
pub mod file_logger;
pub mod groq_optimizer;
pub mod in_memory_store;
pub mod multi_logger;
pub mod noop_logger;

pub use console_logger::*;
pub use file_logger::*;
pub use groq_optimizer::*;
pub use in_memory_store::*;
pub use multi_logger::*;
pub use noop_logger::*;

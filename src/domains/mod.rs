pub mod agent;
pub mod logger;
pub mod optimizer;
pub mod registry;
pub mod simulation;

pub use agent::*;
pub use logger::*;
pub use optimizer::*;
pub use registry::*;

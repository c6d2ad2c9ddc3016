pub mod connections;
pub mod neighbours;
pub mod store;

pub use connections::*;
pub use neighbours::*;
pub use store::*;

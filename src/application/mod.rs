pub mod coordination_service;

pub use coordination_service::*;

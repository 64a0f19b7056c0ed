//! Service layer module

pub mod screening_service;
pub mod types;

pub use screening_service::ScreeningService;
pub use types::*;

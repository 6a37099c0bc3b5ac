pub mod checklist_service;
pub mod customer_service;

pub use checklist_service::*;
pub use customer_service::*;

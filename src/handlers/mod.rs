pub mod checklist;
pub mod customer;

pub use checklist::checklist_config;
pub use customer::customer_config;

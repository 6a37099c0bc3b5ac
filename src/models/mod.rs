pub mod checklist;
pub mod customer;
pub mod pagination;

pub use checklist::*;
pub use customer::*;
pub use pagination::*;

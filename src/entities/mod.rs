pub mod checklist_deadline_settings;
pub mod checklists;
pub mod customers;

pub use checklist_deadline_settings as deadline_setting_entity;
pub use checklists as checklist_entity;
pub use customers as customer_entity;

pub use checklists::ChecklistStatus;
pub use customers::CustomerSegment;

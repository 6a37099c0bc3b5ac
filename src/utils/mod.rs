pub mod checklist_timing;
pub mod customer_score;
pub mod time;

pub use checklist_timing::{
    get_current_checklist_type, get_deadline, get_deadline_info, should_auto_close,
};
pub use customer_score::{ScoreInput, compute_score, segment_for};
pub use time::{business_today, now_fixed_offset, parse_date};

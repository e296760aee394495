pub mod match_log;
pub mod move_text;
pub mod notation;

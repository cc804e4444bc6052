pub mod meshwalk;
pub mod project;
pub mod retrace;

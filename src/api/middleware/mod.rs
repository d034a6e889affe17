//! Bridge middleware.

pub mod access_log;

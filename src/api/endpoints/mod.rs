//! Bridge endpoint handlers.

pub mod health;
pub mod opc;

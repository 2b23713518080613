//! Command handlers. Each receives a bootstrapped context.

pub mod check;
pub mod speak;

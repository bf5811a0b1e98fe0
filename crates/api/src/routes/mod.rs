//! Route Handlers

pub mod pipeline;
pub mod services;

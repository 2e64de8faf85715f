//! chargestat: day/week/month revenue aggregation for EV charging analytics

pub mod cli;
pub mod services;
pub mod types;

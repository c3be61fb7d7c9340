//! Copy-trade surveillance: finds correlated trades across accounts and
//! classifies them into copy-trading categories with optional same-user
//! violation flagging.

pub mod detection;
pub mod io;
pub mod metrics;
pub mod models;

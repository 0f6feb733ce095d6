//! API request handlers

mod agents;
mod health;
mod tickets;
mod transactions;

pub use agents::*;
pub use health::*;
pub use tickets::*;
pub use transactions::*;

//! Helpers shared by exchange adapters.

pub mod drain;
pub mod pacer;
pub mod parse;
pub mod simulated;

pub use drain::drain_trades;
pub use pacer::Pacer;
pub use parse::parse_decimal;
pub use simulated::SimulatedExchange;

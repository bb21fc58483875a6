//! # till-cli
//!
//! Interactive cashier terminal for the till point of sale.

pub mod terminal;

pub use terminal::Terminal;

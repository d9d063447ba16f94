//! Code generation core: catalog, naming, rendering, and the batch driver.

pub mod alias;
pub mod batch;
pub mod catalog;
pub mod classify;
pub mod emit;
pub mod error;
pub mod naming;
pub mod parser;
pub mod repr;
pub mod types;

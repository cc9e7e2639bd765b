//! Transform resolution: the built-in table, dynamic plugin libraries and the ABI between them.

pub mod abi;
pub mod loader;
pub mod registry;

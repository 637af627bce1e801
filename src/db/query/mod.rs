mod builder;
mod dbms_output;
mod dialect;
mod executor;
mod script;
mod types;

pub use builder::StatementBuilder;
pub use dbms_output::*;
pub use dialect::*;
pub use executor::*;
pub use script::*;
pub use types::*;

#[cfg(test)]
mod query_tests;

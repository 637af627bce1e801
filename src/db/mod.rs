pub mod connection;
pub mod query;
pub mod session;

pub use connection::*;
pub use query::*;
pub use session::*;

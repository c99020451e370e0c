pub mod deriver;
pub mod schema;

pub use deriver::*;
pub use schema::*;

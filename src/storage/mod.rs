mod schema;
mod state;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, TriageSets};

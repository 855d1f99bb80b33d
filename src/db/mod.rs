mod sqlite;

pub use sqlite::ClientStore;

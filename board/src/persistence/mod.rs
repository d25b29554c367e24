pub mod file_store;
pub mod json_file;
pub mod pg_store;

pub use file_store::{FileAdRepository, FileUserRepository};
pub use json_file::JsonFile;
pub use pg_store::{PgAdRepository, PgUserRepository};

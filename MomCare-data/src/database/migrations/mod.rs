// Database migrations module

mod sqlite;
pub use sqlite::{clear_all_tables, run_migrations as run_sqlite_migrations};

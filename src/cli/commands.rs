pub mod initdb;
pub mod migrate_and_serve;
pub mod run_jobs;
pub mod serve;

pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use run_jobs::run_jobs;
pub use serve::serve;

pub mod checkpoints;
pub mod config;
pub mod dry_run;
pub mod models;
pub mod run;
pub mod summary;

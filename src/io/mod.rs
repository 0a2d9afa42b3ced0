pub mod config_io;
pub mod plan_io;

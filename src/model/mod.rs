pub mod config;
pub mod layout;
pub mod method;
pub mod plan;

pub use config::*;
pub use layout::*;
pub use method::*;
pub use plan::*;

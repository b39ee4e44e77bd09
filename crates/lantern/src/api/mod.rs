pub mod catalog;
pub mod handler;
pub mod tools;

pub use catalog::build_registry;
pub use handler::LanternHandler;

pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Build, HashPassword, Serve, Version};

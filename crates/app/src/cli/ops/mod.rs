pub mod build;
pub mod hash_password;
pub mod serve;
pub mod version;

pub use build::Build;
pub use hash_password::HashPassword;
pub use serve::Serve;
pub use version::Version;

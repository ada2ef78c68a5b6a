mod not_found;
mod site;

pub use not_found::not_found_handler;
pub use site::site_handler;

pub mod aggregate;
pub mod archive;
pub mod cli;
pub mod config;
pub mod expand;
pub mod extract;
pub mod jenkins;
pub mod place;
pub mod summary;
pub mod util;

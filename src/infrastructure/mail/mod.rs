//! Mail transport implementations

mod in_memory;
mod log;

pub use in_memory::InMemoryMailer;
pub use log::LogMailer;

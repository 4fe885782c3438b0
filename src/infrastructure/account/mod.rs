//! Account lifecycle

mod service;

pub use service::AccountService;

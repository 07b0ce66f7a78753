//! HTTP request handlers

pub mod files;
pub mod folders;
pub mod service;

pub use files::*;
pub use folders::*;
pub use service::*;

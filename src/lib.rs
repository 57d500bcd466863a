pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod fastpath;
pub mod http;
pub mod installed;
pub mod pe;
pub mod python;
pub mod resolve;
pub mod runtime;
pub mod source;
pub mod target;
pub mod version;

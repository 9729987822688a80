//! polyclinic library
//!
//! Backend client, the remote-backed selector and the terminal screens of
//! the polyclinic frontend.

pub mod core;
pub mod error;
pub mod selector;
pub mod storage;
pub mod types;
pub mod ui;
pub mod utils;

//! Backend access: HTTP client, generic CRUD resources and the workflows
//! built on them

pub mod batch;
pub mod departments;
pub mod history;
pub mod http;
pub mod resource;
pub mod session;
pub mod warehouse;

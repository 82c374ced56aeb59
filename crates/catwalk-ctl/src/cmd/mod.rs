//! CLI command modules.

pub mod http;
pub mod predict;
pub mod status;
pub mod test_server;

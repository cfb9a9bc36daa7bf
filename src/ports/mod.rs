//! Port traits at the domain's I/O seams.

pub mod config_port;
pub mod data_port;
pub mod report_port;

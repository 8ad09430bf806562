//! Command implementations that are not simple storage calls.

pub mod init;

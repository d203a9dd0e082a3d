//! CLI command modules

pub mod check;
pub mod disable;
pub mod enable;
pub mod info;
pub mod init;
pub mod install;
pub mod list;
pub mod restart;
pub mod uninstall;
pub mod update;

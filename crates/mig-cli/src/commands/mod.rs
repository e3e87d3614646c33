//! CLI command implementations

pub(crate) mod check;
pub(crate) mod common;
pub(crate) mod down;
pub(crate) mod generate;
pub(crate) mod heads;
pub(crate) mod history;
pub(crate) mod init;
pub(crate) mod merge;
pub(crate) mod new;
pub(crate) mod status;
pub(crate) mod up;

pub(crate) mod args;
pub(crate) mod commands;

pub(crate) use args::{BuildArgs, Cli, TeatimeArgs};
pub(crate) use commands::Commands;

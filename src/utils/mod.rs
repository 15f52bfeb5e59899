pub(crate) mod shell;

pub(crate) use shell::quote_command;

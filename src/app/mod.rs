mod app_helper;

mod check_command;
pub(crate) use check_command::CheckCommand;

pub(crate) mod cli_manager;

mod command;

pub(crate) mod common;

mod encode_command;
pub(crate) use encode_command::EncodeCommand;

mod solve_command;
pub(crate) use solve_command::SolveCommand;

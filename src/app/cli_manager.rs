use super::{app_helper::init_logger_with_level, command::Command};
use anyhow::{anyhow, Result};
use clap::{App, AppSettings, Arg};
use log::info;
use std::{ffi::OsString, str::FromStr};
use sysinfo::System;

/// Handles the set of commands and processes the CLI arguments against them.
pub(crate) struct CliManager<'a> {
    app_name: &'a str,
    version: &'a str,
    author: &'a str,
    about: &'a str,
    commands: Vec<Box<dyn Command<'a>>>,
}

pub(crate) const APP_HELPER_LOGGING_LEVEL_ARG: &str = "APP_HELPER_LOGGING_LEVEL_ARG";

pub(crate) fn logging_level_cli_arg<'a>() -> Arg<'a, 'a> {
    Arg::with_name(APP_HELPER_LOGGING_LEVEL_ARG)
        .long("logging-level")
        .multiple(false)
        .default_value("info")
        .possible_values(&["trace", "debug", "info", "warn", "error", "off"])
        .help("set the minimal logging level")
}

impl<'a> CliManager<'a> {
    pub(crate) fn new(app_name: &'a str, version: &'a str, author: &'a str, about: &'a str) -> Self {
        CliManager {
            app_name,
            version,
            author,
            about,
            commands: vec![],
        }
    }

    pub(crate) fn add_command(&mut self, command: Box<dyn Command<'a>>) {
        self.commands.push(command);
    }

    pub(crate) fn parse_cli<I, T>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut app = App::new(self.app_name)
            .global_setting(AppSettings::DisableVersion)
            .global_setting(AppSettings::VersionlessSubcommands)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .version(self.version)
            .author(self.author)
            .about(self.about);
        for c in self.commands.iter() {
            app = app.subcommand(c.clap_subcommand());
        }
        match app.get_matches_from_safe(args) {
            Ok(matches) => {
                let (name, sub_matches) = matches.subcommand();
                let sub_matches = sub_matches.ok_or_else(|| anyhow!("missing subcommand"))?;
                let command = self
                    .commands
                    .iter()
                    .find(|c| c.name() == name)
                    .ok_or_else(|| anyhow!("unknown subcommand {}", name))?;
                let log_level = sub_matches
                    .value_of(APP_HELPER_LOGGING_LEVEL_ARG)
                    .map(|l| {
                        log::LevelFilter::from_str(l)
                            .map_err(|e| anyhow!("invalid logging level {}: {}", l, e))
                    })
                    .transpose()?
                    .unwrap_or(log::LevelFilter::Info);
                init_logger_with_level(log_level);
                info!("{} {}", self.app_name, self.version);
                sys_info();
                command.execute(sub_matches)
            }
            Err(clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                message,
                ..
            }) => {
                println!("{}", message);
                Ok(())
            }
            Err(e) => Err(anyhow!("{}", e.message)),
        }
    }
}

fn sys_info() {
    info!("----------------------------------------");
    let sys = System::new_all();
    let unknown = || "[unknown]".to_string();
    info!("running on {}", System::host_name().unwrap_or_else(unknown));
    info!(
        "OS is {} {} with kernel {}",
        System::name().unwrap_or_else(unknown),
        System::os_version().unwrap_or_else(unknown),
        System::kernel_version().unwrap_or_else(unknown)
    );
    let mut cpu_kinds: Vec<&str> = sys.cpus().iter().map(|p| p.brand()).collect();
    cpu_kinds.sort_unstable();
    cpu_kinds.dedup();
    info!(
        "physical core count: {} {:?}",
        sys.physical_core_count()
            .map(|n| n.to_string())
            .unwrap_or_else(unknown),
        cpu_kinds
    );
    info!("total memory: {} KB", sys.total_memory() / 1024);
    info!("----------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{ArgMatches, SubCommand};
    use std::{cell::RefCell, rc::Rc};

    struct RecordingCommand {
        flag_set: Rc<RefCell<Option<bool>>>,
    }

    impl<'a> Command<'a> for RecordingCommand {
        fn name(&self) -> &str {
            "record"
        }

        fn clap_subcommand(&self) -> App<'a, 'a> {
            SubCommand::with_name("record")
                .arg(Arg::with_name("flag").short("f"))
                .arg(logging_level_cli_arg())
        }

        fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
            *self.flag_set.borrow_mut() = Some(arg_matches.is_present("flag"));
            Ok(())
        }
    }

    fn run(args: Vec<&'static str>) -> Result<Option<bool>> {
        let mut manager = CliManager::new("app", "0.0.0", "author", "about");
        let flag_set = Rc::new(RefCell::new(None));
        manager.add_command(Box::new(RecordingCommand {
            flag_set: Rc::clone(&flag_set),
        }));
        manager.parse_cli(args)?;
        let result = *flag_set.borrow();
        Ok(result)
    }

    #[test]
    fn test_command_execution() {
        assert_eq!(
            Some(false),
            run(vec!["app", "record", "--logging-level", "off"]).unwrap()
        );
        assert_eq!(
            Some(true),
            run(vec!["app", "record", "-f", "--logging-level", "off"]).unwrap()
        );
    }

    #[test]
    fn test_errors() {
        assert!(run(vec!["app", "unknown"]).is_err());
        assert!(run(vec!["app", "record", "-g"]).is_err());
        assert!(run(vec!["app", "record", "--logging-level", "loud"]).is_err());
    }

    #[test]
    fn test_help() {
        assert_eq!(None, run(vec!["app", "-h"]).unwrap());
        assert_eq!(None, run(vec!["app", "record", "-h"]).unwrap());
    }
}

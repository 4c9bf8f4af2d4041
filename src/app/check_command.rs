use super::{cli_manager, command::Command, common};
use anyhow::Result;
use boundsyn::scenarios::ScenarioTrie;
use clap::{App, AppSettings, ArgMatches, SubCommand};
use log::info;

const CMD_NAME: &str = "check";

pub(crate) struct CheckCommand;

impl CheckCommand {
    pub(crate) fn new() -> Self {
        CheckCommand
    }
}

impl<'a> Command<'a> for CheckCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Checks input automaton and scenario files for errors")
            .setting(AppSettings::DisableVersion)
            .args(&common::input_args())
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let automaton = common::read_automaton(arg_matches)?;
        info!(
            "the automaton has {} initial state(s), {} rejecting state(s) and {} strongly connected component(s)",
            automaton.initial_states().count(),
            automaton.rejecting_states().count(),
            automaton.n_sccs()
        );
        let scenarios = common::read_scenarios(arg_matches, &automaton)?;
        if !scenarios.is_empty() {
            let trie = ScenarioTrie::new(&scenarios);
            info!("the scenario trie has {} node(s)", trie.n_nodes());
        }
        Ok(())
    }
}

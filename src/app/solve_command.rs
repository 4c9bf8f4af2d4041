use super::{cli_manager, command::Command, common};
use anyhow::{Context, Result};
use boundsyn::{
    encodings::EncodingKind,
    io::SolutionWriter,
    synthesis::{BoundedSynthesis, SynthesisOptions, SynthesisOutcome, UnknownPolicy},
};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::info;

const CMD_NAME: &str = "solve";

const ARG_MIN_BOUND: &str = "MIN_BOUND";
const ARG_MAX_BOUND: &str = "MAX_BOUND";
const ARG_UNKNOWN_POLICY: &str = "UNKNOWN_POLICY";
const ARG_REALIZABILITY_ONLY: &str = "REALIZABILITY_ONLY";

pub(crate) struct SolveCommand;

impl SolveCommand {
    pub(crate) fn new() -> Self {
        SolveCommand
    }
}

impl<'a> Command<'a> for SolveCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Searches for the smallest implementation of a co-Büchi specification")
            .setting(AppSettings::DisableVersion)
            .args(&common::input_args())
            .args(&common::encoding_args())
            .arg(
                Arg::with_name(ARG_MIN_BOUND)
                    .long("min-bound")
                    .empty_values(false)
                    .multiple(false)
                    .default_value("1")
                    .help("the first number of states to try")
                    .required(false),
            )
            .arg(
                Arg::with_name(ARG_MAX_BOUND)
                    .long("max-bound")
                    .empty_values(false)
                    .multiple(false)
                    .help("the last number of states to try (no limit if absent)")
                    .required(false),
            )
            .arg(
                Arg::with_name(ARG_UNKNOWN_POLICY)
                    .long("unknown-policy")
                    .empty_values(false)
                    .multiple(false)
                    .possible_values(&["abort", "advance"])
                    .default_value("abort")
                    .help("what to do when a solver cannot decide a bound")
                    .required(false),
            )
            .arg(
                Arg::with_name(ARG_REALIZABILITY_ONLY)
                    .long("realizability-only")
                    .takes_value(false)
                    .help("only check the existence of an implementation, without extracting it")
                    .required(false),
            )
            .args(&common::solver_args())
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let specification = common::read_specification(arg_matches)?;
        let options = SynthesisOptions {
            encoding: common::parse_enum_arg::<EncodingKind>(arg_matches, common::ARG_ENCODING)?,
            min_bound: common::parse_usize_arg(arg_matches, ARG_MIN_BOUND)?.unwrap_or(1),
            max_bound: common::parse_usize_arg(arg_matches, ARG_MAX_BOUND)?,
            synthesize: !arg_matches.is_present(ARG_REALIZABILITY_ONLY),
            unknown_policy: common::parse_enum_arg::<UnknownPolicy>(
                arg_matches,
                ARG_UNKNOWN_POLICY,
            )?,
        };
        let solvers = common::create_solver_set(arg_matches)?;
        let search = BoundedSynthesis::new(&specification, options, &solvers)
            .context("while setting up the bound search")?;
        let outcome = search.search()?;
        match &outcome {
            SynthesisOutcome::Realizable { bound, .. } => {
                info!("found an implementation with {} state(s)", bound)
            }
            SynthesisOutcome::NotFound { max_bound } => {
                info!("no implementation with at most {} state(s)", max_bound)
            }
            SynthesisOutcome::Unknown { bound } => {
                info!("the search stopped at undecided bound {}", bound)
            }
        }
        let mut out = std::io::stdout();
        SolutionWriter::default().write_outcome(&mut out, &outcome)
    }
}

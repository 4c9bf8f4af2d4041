use super::{
    app_helper::AppHelper, command::Command, CheckCommand, EncodeCommand, SolveCommand,
};
use anyhow::{anyhow, Context, Result};
use boundsyn::{
    automaton::Automaton,
    io::{AutomatonReader, ScenarioReader},
    qbf::{ExternalQbfPreprocessor, ExternalQbfSolver},
    scenarios::ScenarioBranch,
    sat::{
        DefaultSatSolverFactory, ExternalSatSolverFactory, SatSolverFactory, SolvingListener,
        SolvingResult,
    },
    specification::{Semantics, Specification},
    synthesis::SolverSet,
};
use clap::{Arg, ArgMatches};
use log::{info, warn};
use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::PathBuf,
    str::FromStr,
};

pub(crate) fn create_app_helper() -> AppHelper<'static> {
    let app_name = option_env!("CARGO_PKG_NAME").unwrap_or("unknown app name");
    let app_version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown version");
    let authors = option_env!("CARGO_PKG_AUTHORS").unwrap_or("unknown authors");
    let mut app = AppHelper::new(
        app_name,
        app_version,
        authors,
        "Boundsyn, a bounded synthesis tool for co-Büchi specifications.",
    );
    let commands: Vec<Box<dyn Command>> = vec![
        Box::new(CheckCommand::new()),
        Box::new(EncodeCommand::new()),
        Box::new(SolveCommand::new()),
    ];
    for c in commands {
        app.add_command(c);
    }
    app
}

pub(crate) const ARG_INPUT: &str = "INPUT";
pub(crate) const ARG_SCENARIOS: &str = "SCENARIOS";

pub(crate) fn input_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name(ARG_INPUT)
            .short("f")
            .long("automaton")
            .empty_values(false)
            .multiple(false)
            .help("the input file that contains the co-Büchi automaton")
            .required(true),
        Arg::with_name(ARG_SCENARIOS)
            .long("scenarios")
            .empty_values(false)
            .multiple(false)
            .help("a file containing example traces the implementation must produce")
            .required(false),
    ]
}

pub(crate) const ARG_ENCODING: &str = "ENCODING";
pub(crate) const ARG_SEMANTICS: &str = "SEMANTICS";

pub(crate) fn encoding_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name(ARG_ENCODING)
            .short("e")
            .long("encoding")
            .empty_values(false)
            .multiple(false)
            .possible_values(&["explicit", "symbolic", "input-symbolic"])
            .default_value("explicit")
            .help("the encoding of the bounded synthesis problem")
            .required(false),
        Arg::with_name(ARG_SEMANTICS)
            .short("s")
            .long("semantics")
            .empty_values(false)
            .multiple(false)
            .possible_values(&["mealy", "moore"])
            .default_value("mealy")
            .help("the kind of implementation to synthesize")
            .required(false),
    ]
}

pub(crate) fn parse_enum_arg<T>(arg_matches: &ArgMatches<'_>, arg: &str) -> Result<T>
where
    T: FromStr,
{
    let value = arg_matches
        .value_of(arg)
        .ok_or_else(|| anyhow!("missing value for {}", arg))?;
    T::from_str(value).map_err(|_| anyhow!(r#"unexpected value "{}""#, value))
}

pub(crate) fn parse_usize_arg(arg_matches: &ArgMatches<'_>, arg: &str) -> Result<Option<usize>> {
    arg_matches
        .value_of(arg)
        .map(|v| {
            v.parse::<usize>()
                .with_context(|| format!(r#"while parsing "{}" as a bound"#, v))
        })
        .transpose()
}

/// Reads the automaton and the optional scenarios given on the command line.
pub(crate) fn read_specification(arg_matches: &ArgMatches<'_>) -> Result<Specification> {
    let automaton = read_automaton(arg_matches)?;
    let semantics = parse_enum_arg::<Semantics>(arg_matches, ARG_SEMANTICS)?;
    let scenarios = read_scenarios(arg_matches, &automaton)?;
    info!("synthesizing a {} implementation", semantics.as_ref());
    Ok(Specification::new_with_scenarios(
        automaton, semantics, &scenarios,
    ))
}

pub(crate) fn read_scenarios(
    arg_matches: &ArgMatches<'_>,
    automaton: &Automaton,
) -> Result<Vec<Vec<ScenarioBranch>>> {
    let file = match arg_matches.value_of(ARG_SCENARIOS) {
        Some(f) => f,
        None => return Ok(vec![]),
    };
    let mut reader = ScenarioReader::default();
    reader.add_warning_handler(Box::new(|line, msg| warn!("at line {}: {}", line, msg)));
    let scenarios = read_file_path_with(file, &|r| reader.read(r, automaton))?;
    info!(
        "read {} scenario(s) with {} step(s) in total",
        scenarios.len(),
        scenarios.iter().map(|s| s.len()).sum::<usize>()
    );
    Ok(scenarios)
}

pub(crate) fn read_automaton(arg_matches: &ArgMatches<'_>) -> Result<Automaton> {
    let file = arg_matches
        .value_of(ARG_INPUT)
        .ok_or_else(|| anyhow!("missing input file"))?;
    let mut reader = AutomatonReader::default();
    reader.add_warning_handler(Box::new(|line, msg| warn!("at line {}: {}", line, msg)));
    let automaton = read_file_path_with(file, &|r| reader.read(r))?;
    info!(
        "the automaton has {} state(s), {} transition(s), {} input(s) and {} output(s)",
        automaton.n_states(),
        automaton.n_transitions(),
        automaton.inputs().len(),
        automaton.outputs().len(),
    );
    Ok(automaton)
}

pub(crate) fn read_file_path_with<F, R>(file_path: &str, reader: &F) -> Result<R>
where
    F: Fn(&mut dyn Read) -> Result<R>,
{
    let canonicalized = canonicalize_file_path(file_path)?;
    info!("reading input file {:?}", canonicalized);
    let mut file_reader = BufReader::new(
        File::open(&canonicalized)
            .with_context(|| format!("while opening file {:?}", canonicalized))?,
    );
    (reader)(&mut file_reader).with_context(|| format!("while reading file {:?}", canonicalized))
}

/// Canonicalize a path given by the user.
pub(crate) fn canonicalize_file_path(file_path: &str) -> Result<PathBuf> {
    fs::canonicalize(PathBuf::from(file_path))
        .with_context(|| format!(r#"while opening file "{}""#, file_path))
}

const ARG_EXTERNAL_SAT_SOLVER: &str = "EXTERNAL_SAT_SOLVER";
const ARG_EXTERNAL_SAT_SOLVER_OPTIONS: &str = "EXTERNAL_SAT_SOLVER_OPTIONS";
const ARG_QBF_SOLVER: &str = "QBF_SOLVER";
const ARG_QBF_SOLVER_OPTIONS: &str = "QBF_SOLVER_OPTIONS";
const ARG_QBF_PREPROCESSOR: &str = "QBF_PREPROCESSOR";
const ARG_QBF_PREPROCESSOR_OPTIONS: &str = "QBF_PREPROCESSOR_OPTIONS";
const ARG_DQBF_SOLVER: &str = "DQBF_SOLVER";
const ARG_DQBF_SOLVER_OPTIONS: &str = "DQBF_SOLVER_OPTIONS";
const ARG_QBF_CERTIFIER: &str = "QBF_CERTIFIER";
const ARG_QBF_CERTIFIER_OPTIONS: &str = "QBF_CERTIFIER_OPTIONS";

fn program_args(
    program_arg: &'static str,
    options_arg: &'static str,
    long: &'static str,
    long_options: &'static str,
    help: &'static str,
    options_help: &'static str,
) -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name(program_arg)
            .long(long)
            .empty_values(false)
            .multiple(false)
            .help(help)
            .required(false),
        Arg::with_name(options_arg)
            .long(long_options)
            .requires(program_arg)
            .empty_values(false)
            .multiple(true)
            .number_of_values(1)
            .allow_hyphen_values(true)
            .help(options_help)
            .required(false),
    ]
}

pub(crate) fn solver_args() -> Vec<Arg<'static, 'static>> {
    [
        program_args(
            ARG_EXTERNAL_SAT_SOLVER,
            ARG_EXTERNAL_SAT_SOLVER_OPTIONS,
            "external-sat-solver",
            "external-sat-solver-opt",
            "a path to an external SAT solver to replace the embedded one",
            "an option to give to the external SAT solver",
        ),
        program_args(
            ARG_QBF_SOLVER,
            ARG_QBF_SOLVER_OPTIONS,
            "qbf-solver",
            "qbf-solver-opt",
            "a path to a QBF solver (for the input-symbolic encoding)",
            "an option to give to the QBF solver",
        ),
        program_args(
            ARG_QBF_PREPROCESSOR,
            ARG_QBF_PREPROCESSOR_OPTIONS,
            "qbf-preprocessor",
            "qbf-preprocessor-opt",
            "a path to a QBF preprocessor applied before the QBF solver",
            "an option to give to the QBF preprocessor",
        ),
        program_args(
            ARG_DQBF_SOLVER,
            ARG_DQBF_SOLVER_OPTIONS,
            "dqbf-solver",
            "dqbf-solver-opt",
            "a path to a DQBF solver (for the symbolic encoding)",
            "an option to give to the DQBF solver",
        ),
        program_args(
            ARG_QBF_CERTIFIER,
            ARG_QBF_CERTIFIER_OPTIONS,
            "qbf-certifier",
            "qbf-certifier-opt",
            "a path to a QBF solver producing certificates (to extract input-symbolic solutions)",
            "an option to give to the QBF certifier",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn program_and_options(
    arg_matches: &ArgMatches<'_>,
    program_arg: &str,
    options_arg: &str,
) -> Result<Option<(String, Vec<String>)>> {
    let program = match arg_matches.value_of(program_arg) {
        Some(p) => canonicalize_file_path(p)?,
        None => return Ok(None),
    };
    let program = program
        .to_str()
        .ok_or_else(|| anyhow!("non UTF-8 path {:?}", program))?
        .to_string();
    let options = arg_matches
        .values_of(options_arg)
        .map(|v| v.map(|o| o.to_string()).collect::<Vec<String>>())
        .unwrap_or_default();
    Ok(Some((program, options)))
}

pub(crate) fn create_solver_set(arg_matches: &ArgMatches<'_>) -> Result<SolverSet> {
    let mut solvers = SolverSet::new(create_sat_solver_factory(arg_matches)?);
    if let Some((program, options)) =
        program_and_options(arg_matches, ARG_QBF_SOLVER, ARG_QBF_SOLVER_OPTIONS)?
    {
        info!("using {} as QBF solver", program);
        solvers = solvers.with_qbf_solver(Box::new(ExternalQbfSolver::new(program, options)));
    }
    if let Some((program, options)) =
        program_and_options(arg_matches, ARG_QBF_PREPROCESSOR, ARG_QBF_PREPROCESSOR_OPTIONS)?
    {
        info!("using {} as QBF preprocessor", program);
        solvers = solvers
            .with_qbf_preprocessor(Box::new(ExternalQbfPreprocessor::new(program, options)));
    }
    if let Some((program, options)) =
        program_and_options(arg_matches, ARG_DQBF_SOLVER, ARG_DQBF_SOLVER_OPTIONS)?
    {
        info!("using {} as DQBF solver", program);
        solvers = solvers.with_dqbf_solver(Box::new(ExternalQbfSolver::new(program, options)));
    }
    if let Some((program, options)) =
        program_and_options(arg_matches, ARG_QBF_CERTIFIER, ARG_QBF_CERTIFIER_OPTIONS)?
    {
        info!("using {} as QBF certifier", program);
        solvers = solvers.with_qbf_certifier(Box::new(ExternalQbfSolver::new(program, options)));
    }
    Ok(solvers)
}

fn create_sat_solver_factory(arg_matches: &ArgMatches<'_>) -> Result<Box<dyn SatSolverFactory>> {
    match program_and_options(
        arg_matches,
        ARG_EXTERNAL_SAT_SOLVER,
        ARG_EXTERNAL_SAT_SOLVER_OPTIONS,
    )? {
        Some((program, options)) => {
            info!("using {} for problems requiring a SAT solver", program);
            let mut factory = ExternalSatSolverFactory::new(program, options);
            factory.add_solver_listener(Box::new(|| {
                Box::<SatSolvingLogger>::default() as Box<dyn SolvingListener>
            }));
            Ok(Box::new(factory))
        }
        None => {
            info!("using the default SAT solver for problems requiring a SAT solver");
            Ok(Box::new(DefaultSatSolverFactory))
        }
    }
}

#[derive(Default)]
struct SatSolvingLogger;

impl SolvingListener for SatSolvingLogger {
    fn solving_start(&self, n_vars: usize, n_clauses: usize) {
        info!(
            "launching SAT solver on an instance with {} variables and {} clauses",
            n_vars, n_clauses
        );
    }

    fn solving_end(&self, result: &SolvingResult) {
        let r = match result {
            SolvingResult::Satisfiable(_) => "SAT",
            SolvingResult::Unsatisfiable => "UNSAT",
            SolvingResult::Unknown => "UNKNOWN",
        };
        info!("SAT solver ended with result {}", r);
    }
}

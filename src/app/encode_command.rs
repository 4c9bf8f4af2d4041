use super::{cli_manager, command::Command, common};
use anyhow::{anyhow, Context, Result};
use boundsyn::{
    encodings::{new_encoder, EncodingKind},
    logic::{PrenexFormula, QuantifiedCnf},
};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::info;
use std::{fs::File, io::BufWriter, io::Write};

const CMD_NAME: &str = "encode";

const ARG_BOUND: &str = "BOUND";
const ARG_OUT: &str = "OUT";

pub(crate) struct EncodeCommand;

impl EncodeCommand {
    pub(crate) fn new() -> Self {
        EncodeCommand
    }
}

impl<'a> Command<'a> for EncodeCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Writes the (Q)DIMACS instance encoding the problem for a single bound")
            .setting(AppSettings::DisableVersion)
            .args(&common::input_args())
            .args(&common::encoding_args())
            .arg(
                Arg::with_name(ARG_BOUND)
                    .short("b")
                    .long("bound")
                    .empty_values(false)
                    .multiple(false)
                    .help("the number of states of the implementation")
                    .required(true),
            )
            .arg(
                Arg::with_name(ARG_OUT)
                    .short("o")
                    .long("output")
                    .empty_values(false)
                    .multiple(false)
                    .help("the output file for the encoding (defaults to the standard output)")
                    .required(false),
            )
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let specification = common::read_specification(arg_matches)?;
        let kind = common::parse_enum_arg::<EncodingKind>(arg_matches, common::ARG_ENCODING)?;
        let bound = common::parse_usize_arg(arg_matches, ARG_BOUND)?
            .filter(|b| *b > 0)
            .ok_or_else(|| anyhow!("the bound must be at least 1"))?;
        info!("encoding bound {} with the {} encoding", bound, kind.as_ref());
        let formula = new_encoder(kind, &specification).encode(bound)?;
        let instance = QuantifiedCnf::new(&PrenexFormula::new(&formula)?)?;
        info!(
            "the instance has {} variables and {} clauses",
            instance.n_vars(),
            instance.clauses().len()
        );
        let context = "while writing the encoding";
        match arg_matches.value_of(ARG_OUT) {
            Some(path) => {
                let mut writer = BufWriter::new(
                    File::create(path)
                        .with_context(|| format!(r#"while creating file "{}""#, path))?,
                );
                instance.write(&mut writer).context(context)?;
                writer.flush().context(context)
            }
            None => {
                let mut out = std::io::stdout();
                instance.write(&mut out).context(context)?;
                out.flush().context(context)
            }
        }
    }
}

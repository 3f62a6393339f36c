//! Command line arguments for the `fedpeg-cli` binary.

use std::path::PathBuf;

use argh::FromArgs;
use fedpeg_common::logging::{self, FileLoggingConfig, LoggerConfig};
use fedpeg_config::Config;
use fedpeg_primitives::PegParams;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "fedpeg.toml";

/// Args.
#[derive(FromArgs)]
pub(crate) struct Args {
    #[argh(
        option,
        description = "path to the TOML config (default fedpeg.toml)",
        short = 'c'
    )]
    pub(crate) config: Option<PathBuf>,

    #[argh(subcommand)]
    pub(crate) subc: Subcommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub(crate) enum Subcommand {
    PeginAddress(SubcPeginAddress),
    CheckPegin(SubcCheckPegin),
    EncodePegout(SubcEncodePegout),
    DecodePegout(SubcDecodePegout),
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "peginaddress",
    description = "derives the parent-chain deposit address for a claim script"
)]
pub(crate) struct SubcPeginAddress {
    #[argh(positional, description = "claim script, hex")]
    pub(crate) claim_script: String,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "checkpegin",
    description = "reports whether a deposit is claimable yet"
)]
pub(crate) struct SubcCheckPegin {
    #[argh(positional, description = "raw parent-chain deposit transaction, hex")]
    pub(crate) raw_tx: String,

    #[argh(positional, description = "serialized merkle proof, hex")]
    pub(crate) proof: String,

    #[argh(option, description = "claim script the deposit was made for, hex")]
    pub(crate) claim_script: String,

    #[argh(
        option,
        description = "file with one hex block header per line, oldest first"
    )]
    pub(crate) headers: PathBuf,

    #[argh(
        option,
        description = "height of the first header in the file (default 0)",
        default = "0"
    )]
    pub(crate) anchor_height: u64,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "encodepegout",
    description = "builds the peg-out output script for a parent-chain address"
)]
pub(crate) struct SubcEncodePegout {
    #[argh(positional, description = "parent-chain destination address")]
    pub(crate) address: String,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "decodepegout",
    description = "decodes a peg-out output script"
)]
pub(crate) struct SubcDecodePegout {
    #[argh(positional, description = "peg-out script, hex")]
    pub(crate) script: String,
}

pub(crate) struct CmdContext {
    pub(crate) config: Config,

    /// Checked peg parameters derived from `config`.
    pub(crate) params: PegParams,
}

/// Loads the config, starts logging and hands back the subcommand to run.
pub(crate) fn resolve_context_and_subcommand(
    args: Args,
) -> anyhow::Result<(CmdContext, Subcommand)> {
    let path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load(&path)?;

    let mut log_config =
        LoggerConfig::new("fedpeg-cli".to_owned()).with_json_logging(config.logging.json_format);
    if let Some(dir) = &config.logging.log_dir {
        log_config = log_config
            .with_file_logging(FileLoggingConfig::new(dir.clone(), "fedpeg-cli".to_owned()));
    }
    logging::init(log_config);

    let params = config.peg_params()?;
    Ok((CmdContext { config, params }, args.subc))
}

use std::path::PathBuf;

use pbo_format::PboOptions;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use error::Error;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pbo",
    about = "Pack, unpack and verify PBO archives.",
    usage = "pbo [FLAGS] [OPTIONS] <input> [output]",
    after_help = "If input is a directory, it is packed into output (default: <input>.pbo).\n\
                  If input is a file, it is unpacked into the output directory.\n\
                  If input is a file and no output is given, its checksum is verified."
)]
struct CliOpts {
    #[structopt(short, long, help = "Show each entry as it is processed")]
    verbose: bool,

    #[structopt(short, long, help = "Try to (un)pack even if errors occur")]
    ignore_errors: bool,

    #[structopt(
        short,
        long,
        default_value = ".pboproperties",
        help = "File that holds the archive properties"
    )]
    pbo_properties: String,

    #[structopt(short = "n", long = "dryrun", help = "Report what would be done without writing")]
    dryrun: bool,

    #[structopt(name = "input", parse(from_os_str), help = "Directory to pack, or archive")]
    input: PathBuf,

    #[structopt(
        name = "output",
        parse(from_os_str),
        help = "Archive to create, or directory to unpack into"
    )]
    output: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let opts = CliOpts::from_iter(wild::args_os());
    init_tracing(opts.verbose || opts.dryrun);
    tracing::debug!(?opts, "parsed arguments");

    let options = PboOptions::default()
        .properties_file(opts.pbo_properties)
        .ignore_errors(opts.ignore_errors)
        .dry_run(opts.dryrun);

    let meta = std::fs::metadata(&opts.input).map_err(|source| Error::ReadInput {
        path: opts.input.clone(),
        source,
    })?;

    if meta.is_dir() {
        commands::pack(&opts.input, opts.output, &options, opts.verbose)?;
    } else if meta.is_file() {
        match opts.output {
            Some(output) => commands::unpack(&opts.input, &output, &options, opts.verbose)?,
            None => {
                if !commands::verify(&opts.input, &options)? {
                    std::process::exit(1);
                }
            }
        }
    } else {
        return Err(Error::UnsupportedInput { path: opts.input }.into());
    }

    Ok(())
}

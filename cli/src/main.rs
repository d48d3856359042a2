use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use fcheck_core::ImageFile;
use fcheck_filesystems::check_image;
use log::{debug, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fcheck")]
#[command(version, about = "Read-only consistency checker for xv6 filesystem images", long_about = None)]
struct Cli {
    /// Filesystem image to check
    image: PathBuf,

    /// Further arguments are accepted and ignored
    #[arg(hide = true)]
    extra: Vec<PathBuf>,

    /// Log progress to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "off",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG takes precedence over -v
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if !cli.extra.is_empty() {
        warn!("Ignoring {} extra argument(s): {:?}", cli.extra.len(), cli.extra);
    }

    let image = ImageFile::open(&cli.image)?;
    debug!("Read {} bytes from {}", image.len(), image.path().display());
    check_image(image.bytes())?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            e.print().ok();
            return ExitCode::FAILURE;
        }
    };
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

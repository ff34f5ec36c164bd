#![forbid(unused_must_use)]

use anyhow::{bail, Result};
use clap::Parser;
use ms_pdb2::{Diags, Pdb2};
use std::path::{Path, PathBuf};

/// Reads version 2.00 PDB files and displays what their streams contain.
///
/// Can read more than one PDB at a time. Findings are printed to stdout and
/// validation errors to stderr, each prefixed with the file they refer to.
#[derive(clap::Parser)]
struct Options {
    /// The files to view.
    files: Vec<PathBuf>,

    /// Reduce logging to just warnings and errors.
    #[arg(long)]
    quiet: bool,

    /// Turn on debug output, including per-stream page accounting. Noisy!
    #[arg(long)]
    verbose: bool,

    /// Show timestamps in log messages
    #[arg(long)]
    timestamps: bool,
}

fn main() -> Result<()> {
    let options = Options::parse();
    configure_tracing(&options);

    if options.files.is_empty() {
        bail!("You must specify at least one file name to view.");
    }

    for file_name in options.files.iter() {
        view_file(file_name);
    }

    Ok(())
}

fn configure_tracing(options: &Options) {
    use tracing_subscriber::filter::LevelFilter;

    let max_level = if options.quiet {
        LevelFilter::WARN
    } else if options.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let builder = tracing_subscriber::fmt().with_max_level(max_level);

    if options.timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}

/// Views one file. A file that cannot be decoded at all is reported on the
/// error channel; it does not stop the file loop.
fn view_file(file_name: &Path) {
    match view_file_err(file_name) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("{}: {:#}", file_name.display(), e);
        }
    }
}

fn view_file_err(file_name: &Path) -> Result<()> {
    let pdb = Pdb2::open(file_name)?;

    let mut diags = Diags::new();
    let _streams = pdb.classify_streams(&mut diags);

    for diag in diags.diags.iter() {
        if diag.is_error {
            eprint!("{}: {}", file_name.display(), diag);
        } else {
            print!("{}: {}", file_name.display(), diag);
        }
    }

    Ok(())
}

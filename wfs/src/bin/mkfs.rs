//! `mkfs.wfs`: format a fresh image file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Format a WFS image file.
#[derive(Parser, Debug)]
#[command(name = "mkfs.wfs", version, about)]
struct Args {
    /// Path of the image file to create.
    image: PathBuf,

    /// Size of the image, in bytes.
    #[arg(long, default_value_t = wfs_types::DISK_SIZE)]
    size: u64,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match wfs::mkfs::format(&args.image, args.size) {
        Ok(()) => {
            println!(
                "formatted {} ({} bytes)",
                args.image.display(),
                args.size
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("mkfs.wfs: {e}");
            ExitCode::FAILURE
        }
    }
}

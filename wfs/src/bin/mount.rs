//! `mount.wfs`: attach an image to a mountpoint via the FUSE dispatcher.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use wfs_types::Image;

/// Mount a WFS image at a directory.
#[derive(Parser, Debug)]
#[command(name = "mount.wfs", version, about)]
struct Args {
    /// Path of a previously formatted image file.
    image: PathBuf,

    /// Directory to mount the filesystem at.
    mountpoint: PathBuf,

    /// Extra options forwarded to the FUSE session (e.g. `-o allow_other`).
    #[arg(last = true)]
    fuse_args: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let image = match Image::open_existing(&args.image) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("mount.wfs: {e}");
            return ExitCode::FAILURE;
        }
    };
    let fs = match wfs::Filesystem::open(image) {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("mount.wfs: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mount_options: Vec<fuser::MountOption> = args
        .fuse_args
        .iter()
        .map(|s| fuser::MountOption::CUSTOM(s.clone()))
        .collect();

    log::info!(
        "mounting {} at {}",
        args.image.display(),
        args.mountpoint.display()
    );
    match fuser::mount2(
        wfs::fuse_adapter::WfsDispatcher::new(fs),
        &args.mountpoint,
        &mount_options,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mount.wfs: {e}");
            ExitCode::FAILURE
        }
    }
}

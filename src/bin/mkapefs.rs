//! Creates an empty ApeFS image of a requested size and prints its region
//! layout. Stands in for the out-of-scope host-directory-replay driver's
//! entry point shape only.

use std::env;
use std::path::PathBuf;
use std::process::exit;

use apefs::ApeFileSystem;

/// Command line arguments: `mkapefs <path> <size-bytes>`.
#[derive(Default)]
struct Args {
    prog: String,
    image_path: Option<PathBuf>,
    size_bytes: Option<u32>,
    help: bool,
}

fn parse_args() -> Args {
    let mut args: Args = Default::default();
    let mut iter = env::args();
    args.prog = iter.next().unwrap_or("mkapefs".to_owned());

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => args.help = true,
            _ if args.image_path.is_none() => args.image_path = Some(PathBuf::from(arg)),
            _ if args.size_bytes.is_none() => {
                args.size_bytes = arg.parse().ok();
            }
            _ => {}
        }
    }

    args
}

fn main() {
    let args = parse_args();

    if args.help {
        println!("usage: {} <image-path> <size-bytes>", args.prog);
        return;
    }

    let image_path = args.image_path.unwrap_or_else(|| {
        eprintln!("{}: specify a path for the image", args.prog);
        exit(1);
    });
    let size_bytes = args.size_bytes.unwrap_or_else(|| {
        eprintln!("{}: specify the image size in bytes", args.prog);
        exit(1);
    });

    let fs = ApeFileSystem::create(&image_path, size_bytes).unwrap_or_else(|| {
        eprintln!("{}: {}: failed to create image", args.prog, image_path.display());
        exit(1);
    });

    println!("{}: {} bytes", image_path.display(), fs.size());
}

use anyhow::Context;
use std::fs::File;
use std::io;
use std::path::PathBuf;

mod error;

struct Args {
    image_filename: String,
    destination: PathBuf,
    filters: Vec<String>,
}

impl Args {
    fn parse() -> Self {
        (meap::let_map! {
            let {
                image_filename = opt_req("PATH", 'i').name("image").desc("path to disk image");
                destination = opt_opt::<String, _>("PATH", 'C').name("directory")
                    .desc("directory to extract into (default: current directory)");
                filters = opt_multi("PATH", 'f').name("file")
                    .desc("file or directory within image to extract (default: everything)");
            } in {
                Self {
                    image_filename,
                    destination: PathBuf::from(destination.unwrap_or_else(|| ".".to_string())),
                    filters,
                }
            }
        })
        .with_help_default()
        .parse_env_or_exit()
    }
}

fn run(
    Args {
        image_filename,
        destination,
        filters,
    }: Args,
) -> anyhow::Result<()> {
    let image_file = File::open(&image_filename)
        .with_context(|| format!("unable to open '{}'", image_filename))?;
    let mut disk = mini_xdf::DiskImage::open(image_file)?;
    let stdout = io::stdout();
    mini_xdf::host::extract(&mut disk, &destination, &filters, &mut stdout.lock())?;
    log::info!("extracted '{}' into {}", image_filename, destination.display());
    Ok(())
}

fn main() {
    let args = Args::parse();
    env_logger::init();
    error::or_die(run(args));
}

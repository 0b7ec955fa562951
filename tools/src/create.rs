use anyhow::Context;
use mini_xdf::Format;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

mod error;

struct Args {
    image_filename: String,
    format: Format,
    source: PathBuf,
    paths: Vec<String>,
}

impl Args {
    fn parse() -> Self {
        (meap::let_map! {
            let {
                image_filename = opt_req("PATH", 'o').name("output").desc("path of disk image to create");
                format = opt_opt::<String, _>("FORMAT", 't').name("format")
                    .desc("2hd (1232KB, default), 2hc (1200KB), 2dd640 (640KB), 2dd720 (720KB), 2hq (1440KB)");
                source = opt_opt::<String, _>("PATH", 'C').name("directory")
                    .desc("directory that file paths are relative to (default: current directory)");
                paths = opt_multi("PATH", 'f').name("file")
                    .desc("file or directory to add (default: everything in the directory)");
            } in {{
                let format_key = format.unwrap_or_default();
                let format = match Format::from_key(&format_key) {
                    Some(format) => format,
                    None => {
                        eprintln!("Error: unknown format '{}'. Expected one of 2hd, 2hc, 2dd640, 2dd720, 2hq.", format_key);
                        process::exit(1);
                    }
                };
                Self {
                    image_filename,
                    format,
                    source: PathBuf::from(source.unwrap_or_else(|| ".".to_string())),
                    paths,
                }
            }}
        })
        .with_help_default()
        .parse_env_or_exit()
    }
}

fn run(
    Args {
        image_filename,
        format,
        source,
        paths,
    }: Args,
) -> anyhow::Result<()> {
    let image_file = File::create(&image_filename)
        .with_context(|| format!("unable to create '{}'", image_filename))?;
    let mut disk = mini_xdf::DiskImage::create(image_file, format)?;
    let stdout = io::stdout();
    mini_xdf::host::create(
        &mut disk,
        &source,
        &paths,
        Some(Path::new(&image_filename)),
        &mut stdout.lock(),
    )?;
    disk.flush()?;
    log::info!(
        "wrote {} image '{}' with {} free clusters",
        format.description(),
        image_filename,
        disk.fat().free_count()
    );
    Ok(())
}

fn main() {
    let args = Args::parse();
    env_logger::init();
    error::or_die(run(args));
}

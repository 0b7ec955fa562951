use anyhow::Context;
use std::fs::File;
use std::io;

mod error;

struct Args {
    image_filename: String,
}

impl Args {
    fn parse() -> Self {
        (meap::let_map! {
            let {
                image_filename = opt_req("PATH", 'i').name("image").desc("path to disk image");
            } in {
                Self { image_filename }
            }
        })
        .with_help_default()
        .parse_env_or_exit()
    }
}

fn run(Args { image_filename }: Args) -> anyhow::Result<()> {
    let image_file = File::open(&image_filename)
        .with_context(|| format!("unable to open '{}'", image_filename))?;
    let mut disk = mini_xdf::DiskImage::open(image_file)?;
    let stdout = io::stdout();
    mini_xdf::host::list(&mut disk, &mut stdout.lock())?;
    Ok(())
}

fn main() {
    let args = Args::parse();
    env_logger::init();
    error::or_die(run(args));
}

use anyhow::Context;
use mini_xdf::{DiskImage, FatTable, Geometry};
use std::fmt;
use std::fs::File;

mod error;

struct Args {
    image_filename: String,
    debug: bool,
}

impl Args {
    fn parse() -> Self {
        (meap::let_map! {
            let {
                image_filename = opt_req("PATH", 'i').name("image").desc("path to disk image");
                debug = flag('d').name("debug").desc("also dump the parameter block and FAT");
            } in {
                Self {
                    image_filename,
                    debug,
                }
            }
        })
        .with_help_default()
        .parse_env_or_exit()
    }
}

struct DisplayInfo<'a> {
    geometry: &'a Geometry,
    fat: &'a FatTable,
    debug: bool,
}

impl<'a> fmt::Display for DisplayInfo<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let format = mini_xdf::Format::ALL
            .iter()
            .find(|format| &format.bpb() == self.geometry.bpb());
        match format {
            Some(format) => writeln!(f, "Format: {}", format.description())?,
            None => writeln!(f, "Format: non-standard")?,
        }
        write!(f, "{}", self.geometry)?;
        writeln!(f, "Free Clusters: {}", self.fat.free_count())?;
        if self.debug {
            writeln!(f, "Parameter Block:")?;
            write!(f, "{}", mini_hex_dump::Bytes(&self.geometry.bpb().to_bytes()))?;
            writeln!(f, "FAT:")?;
            write!(f, "{}", self.fat)?;
        }
        Ok(())
    }
}

fn run(
    Args {
        image_filename,
        debug,
    }: Args,
) -> anyhow::Result<()> {
    let image_file = File::open(&image_filename)
        .with_context(|| format!("unable to open '{}'", image_filename))?;
    let disk = DiskImage::open(image_file)?;
    let display_info = DisplayInfo {
        geometry: disk.geometry(),
        fat: disk.fat(),
        debug,
    };
    print!("{}", display_info);
    Ok(())
}

fn main() {
    let args = Args::parse();
    env_logger::init();
    error::or_die(run(args));
}

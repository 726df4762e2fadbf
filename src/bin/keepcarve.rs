use keepcarve::dump::{energy_to_image, seams_to_image};
use keepcarve::{logger, PixelBuffer, PixelEnergy2D, SeamCarver, SeamCarverConfig};
use keepcarve::DEFAULT_MARGIN_ENERGY;

use clap::{value_parser, Arg, ArgMatches, Command};
use std::error::Error;
use std::path::PathBuf;
use tracing::{error, info};

fn cli() -> Command {
    Command::new("keepcarve")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Narrow an image by removing its lowest-energy seams")
        .arg(
            Arg::new("input")
                .help("The image to carve")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("output")
                .help("Where to write the carved image; the format follows the extension")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(2),
        )
        .arg(
            Arg::new("seams")
                .short('n')
                .long("seams")
                .help("Number of columns to remove")
                .required(true)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("keepout")
                .short('k')
                .long("keepout")
                .value_name("ROW,COL,WIDTH,HEIGHT")
                .help("A rectangle no seam may pass through")
                .value_parser(value_parser!(usize))
                .value_delimiter(','),
        )
        .arg(
            Arg::new("margin-energy")
                .long("margin-energy")
                .help("Energy assigned to border pixels")
                .default_value("390150")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("dump-energy")
                .long("dump-energy")
                .value_name("PATH")
                .help("Also write the energy map of the input as a greyscale image")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dump-seams")
                .long("dump-seams")
                .value_name("PATH")
                .help("Also write the input with the removed seams painted red")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let (input, output) = match (
        matches.get_one::<PathBuf>("input"),
        matches.get_one::<PathBuf>("output"),
    ) {
        (Some(input), Some(output)) => (input, output),
        _ => return Err("input and output paths are required".into()),
    };
    let num_seams = matches.get_one::<usize>("seams").copied().unwrap_or(0);
    let margin_energy = matches
        .get_one::<f64>("margin-energy")
        .copied()
        .unwrap_or(DEFAULT_MARGIN_ENERGY);

    let image = PixelBuffer::try_from(&image::open(input)?)?;
    info!(
        "Loaded {} ({}x{}, {} channel(s))",
        input.display(),
        image.width(),
        image.height(),
        image.channels()
    );

    let mut carver = SeamCarver::with_config(SeamCarverConfig { margin_energy });
    if let Some(k) = matches.get_many::<usize>("keepout") {
        let k: Vec<usize> = k.copied().collect();
        match k[..] {
            [row, col, width, height] => carver.set_keepout_region(row, col, width, height),
            _ => return Err("--keepout takes ROW,COL,WIDTH,HEIGHT".into()),
        }
        info!("Keepout region: {:?}", carver.keepout_region());
    }

    if let Some(path) = matches.get_one::<PathBuf>("dump-energy") {
        let energy = PixelEnergy2D::new(margin_energy).calculate(&image)?;
        energy_to_image(&energy).save(path)?;
        info!("Energy map written to {}", path.display());
    }

    if let Some(path) = matches.get_one::<PathBuf>("dump-seams") {
        let seams = carver.find_vertical_seams(num_seams, &image, None)?;
        seams_to_image(&image, &seams).save(path)?;
        info!("Seam overlay written to {}", path.display());
    }

    let carved = carver.carve_vertical_seams(num_seams, &image, None)?;
    carved.to_dynamic()?.save(output)?;
    info!(
        "Wrote {} ({}x{})",
        output.display(),
        carved.width(),
        carved.height()
    );
    Ok(())
}

fn main() {
    logger::init();
    let matches = cli().get_matches();
    if let Err(e) = run(&matches) {
        error!("Carving failed: {}", e);
        std::process::exit(1);
    }
}

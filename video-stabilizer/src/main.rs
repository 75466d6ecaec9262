//! Stabilize a video file.

use anyhow::{anyhow, Result};
use clap::*;
use cv_stab::{BorderMode, BorderSize, Input, KeypointMethod, StabilizeOptions, Stabilizer};
use std::path::Path;

fn main() -> Result<()> {
    let matches = Command::new("video-stabilizer")
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("window")
                .long("window")
                .short('w')
                .takes_value(true)
                .default_value("30")
                .help("Smoothing window width (also the output delay)"),
        )
        .arg(
            Arg::new("max-frames")
                .long("max-frames")
                .takes_value(true)
                .help("Stop after this many input frames"),
        )
        .arg(
            Arg::new("border-type")
                .long("border-type")
                .takes_value(true)
                .default_value("black")
                .help("Border fill: black, reflect or replicate"),
        )
        .arg(
            Arg::new("border-size")
                .long("border-size")
                .takes_value(true)
                .default_value("0")
                .help("Border size in pixels (negative crops inward), or 'auto'"),
        )
        .arg(
            Arg::new("kp-method")
                .long("kp-method")
                .takes_value(true)
                .default_value("GFTT")
                .help("Keypoint detector"),
        )
        .arg(
            Arg::new("processing-max-dim")
                .long("processing-max-dim")
                .takes_value(true)
                .help("Cap the longest side used for motion estimation"),
        )
        .arg(
            Arg::new("fourcc")
                .long("fourcc")
                .takes_value(true)
                .default_value("MJPG")
                .help("Output codec as a 4-character code"),
        )
        .arg(
            Arg::new("playback")
                .long("playback")
                .help("Preview output frames while processing"),
        )
        .arg(
            Arg::new("transforms-only")
                .long("transforms-only")
                .help("Only generate transforms, do not write video"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .multiple_occurrences(true),
        )
        .arg(Arg::new("input").takes_value(true).required(true))
        .arg(Arg::new("output").takes_value(true).required(true))
        .get_matches();

    stderrlog::new()
        .verbosity(matches.occurrences_of("verbose") as usize + 1)
        .init()?;

    let input: Input = matches
        .value_of("input")
        .unwrap()
        .parse()
        .map_err(|_| anyhow!("invalid input"))?;
    let output = Path::new(matches.value_of("output").unwrap());

    let detector: KeypointMethod = matches.value_of("kp-method").unwrap().parse()?;
    let mut stabilizer = Stabilizer::new(detector);
    if let Some(cap) = matches.value_of("processing-max-dim") {
        stabilizer = stabilizer.processing_max_dim(cap.parse()?);
    }

    let border_mode: BorderMode = matches.value_of("border-type").unwrap().parse()?;
    let border_size: BorderSize = matches.value_of("border-size").unwrap().parse()?;

    let mut options = StabilizeOptions::default()
        .smoothing_window(matches.value_of("window").unwrap().parse()?)
        .border(border_size, border_mode)
        .fourcc(matches.value_of("fourcc").unwrap())
        .playback(matches.is_present("playback"));
    if let Some(max_frames) = matches.value_of("max-frames") {
        options = options.max_frames(max_frames.parse()?);
    }

    if matches.is_present("transforms-only") {
        let store = stabilizer.gen_transforms(&input, &options)?;
        println!("{} transforms generated", store.len());
        return Ok(());
    }

    stabilizer.stabilize(&input, output, options)?;

    Ok(())
}

//! Generates a pillar deposition toolpath for the wire deposition head,
//! controlled by the Centroid Acorn.
//!
//! The whole pillar is one continuous climb: the nozzle dwells over a
//! single spot and rises at the rate the deposited volume allows.
use anyhow::Result;
use deposition::patterns::{build_program, Pattern, PillarSpec};
use deposition::process::Process;
use deposition::write_program;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "pillar_gen", about = "Generates a pillar deposition toolpath")]
struct Opt {
    /// Height above the surface to rapid to when the program starts, should be above any screws, in mm
    #[structopt(long, default_value = "20.0")]
    approach_height: f64,

    /// Duration over which to approach the layer height, in s
    #[structopt(long, default_value = "30.0")]
    approach_duration: f64,

    /// Diameter of the feedstock wire, in mm
    #[structopt(long, default_value = "0.9")]
    wire_diameter: f64,

    /// Estimated diameter of the deposition area, in mm
    #[structopt(long, default_value = "4.0")]
    deposition_diameter: f64,

    /// Height of the pillar, in mm
    #[structopt(long, default_value = "10.0")]
    pillar_height: f64,

    /// Wire feed rate, in mm/s
    #[structopt(long, default_value = "1.0")]
    feed_rate: f64,

    /// Spindle speed, in rpm
    #[structopt(long, default_value = "24000")]
    spindle_speed: u32,

    /// Time spent paused at zero height for preheating, in s
    #[structopt(long, default_value = "5.0")]
    initial_pause: f64,

    /// Unique sample number, used to name the output file
    #[structopt(long, default_value = "999")]
    sample_num: u32,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let process = Process {
        approach_height: opt.approach_height,
        approach_duration: opt.approach_duration,
        wire_diameter: opt.wire_diameter,
        deposition_diameter: opt.deposition_diameter,
        feed_rate: opt.feed_rate,
        spindle_speed: opt.spindle_speed,
    };
    let pattern = Pattern::Pillar(PillarSpec {
        height: opt.pillar_height,
        initial_pause: opt.initial_pause,
    });

    let program = build_program(&process, &pattern, opt.sample_num)?;
    let filename = program.filename();
    let mut file = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&filename)?,
    );
    write_program(&mut file, &program)?;
    file.flush()?;

    println!(
        "Wrote {} ({:.2} min of deposition)",
        filename, program.total_time_min
    );
    Ok(())
}

//! Generates a linear deposition toolpath for the wire deposition head,
//! controlled by the Centroid Acorn.
use anyhow::Result;
use deposition::patterns::{build_program, LineSpec, Pattern};
use deposition::process::Process;
use deposition::write_program;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "line_gen", about = "Generates a linear deposition toolpath")]
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
    #[structopt(long, default_value = "3.3")]
    deposition_diameter: f64,

    /// Length of the line, in mm
    #[structopt(long, default_value = "10.0")]
    line_length: f64,

    /// Number of layers to deposit
    #[structopt(long, default_value = "5")]
    num_layers: u32,

    /// Wire feed rate, in mm/s
    #[structopt(long, default_value = "1.0")]
    feed_rate: f64,

    /// Height of the tool tip above the substrate or previous layer, in mm
    #[structopt(long, default_value = "0.05")]
    layer_height: f64,

    /// Spindle speed, in rpm
    #[structopt(long, default_value = "24000")]
    spindle_speed: u32,

    /// Start the first pass going left instead of right
    #[structopt(long)]
    left_right: bool,

    /// Trace the line once at zero height without feeding wire
    #[structopt(long)]
    first_pass: bool,

    /// Wait at zero height for operator input before depositing
    #[structopt(long)]
    initial_pause: bool,

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
    let pattern = Pattern::Line(LineSpec {
        length: opt.line_length,
        num_layers: opt.num_layers,
        layer_height: opt.layer_height,
        left_right: opt.left_right,
        first_pass: opt.first_pass,
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

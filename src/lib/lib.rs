use std::io::{Result, Write};

pub mod geometry;
pub mod patterns;
pub mod process;

use crate::patterns::{Escape, Pattern, Pause, Program, Target};

/// Write a standalone `;` comment line.
pub fn comment(file: &mut dyn Write, s: &str) -> Result<()> {
    writeln!(file, "; {}", s)
}

trait AsGVals {
    fn as_gvals(&self, file: &mut dyn Write) -> Result<()>;
}

/// Axis words for one move. The C axis carries the wire feeder position.
#[derive(Clone, Debug)]
pub struct PosAndFeed {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    c: Option<f64>,
    feed: Option<f64>,
}

pub fn xy(x: f64, y: f64) -> PosAndFeed {
    PosAndFeed {
        x: Some(x),
        y: Some(y),
        z: None,
        c: None,
        feed: None,
    }
}

pub fn z(z: f64) -> PosAndFeed {
    PosAndFeed {
        x: None,
        y: None,
        z: Some(z),
        c: None,
        feed: None,
    }
}

pub fn zf(z: f64, feed: f64) -> PosAndFeed {
    PosAndFeed {
        x: None,
        y: None,
        z: Some(z),
        c: None,
        feed: Some(feed),
    }
}

pub fn zcf(z: f64, c: f64, feed: f64) -> PosAndFeed {
    PosAndFeed {
        x: None,
        y: None,
        z: Some(z),
        c: Some(c),
        feed: Some(feed),
    }
}

pub fn xycf(x: f64, y: f64, c: f64, feed: f64) -> PosAndFeed {
    PosAndFeed {
        x: Some(x),
        y: Some(y),
        z: None,
        c: Some(c),
        feed: Some(feed),
    }
}

impl AsGVals for PosAndFeed {
    fn as_gvals(&self, file: &mut dyn Write) -> Result<()> {
        if self.x.is_none() && self.y.is_none() && self.z.is_none() && self.c.is_none() {
            panic!("Refusing to make illegal move");
        }
        g_val(file, "X", self.x)?;
        g_val(file, "Y", self.y)?;
        g_val(file, "Z", self.z)?;
        g_val(file, "C", self.c)?;
        g_val(file, "F", self.feed)?;
        Ok(())
    }
}

/// Emit a gcode parameter value, if `ov` is `Some`. The Acorn is happy with
/// two decimal places everywhere.
fn g_val(file: &mut dyn Write, name: &str, ov: Option<f64>) -> Result<()> {
    if let Some(v) = ov {
        write!(file, " {}{:.2}", name, v)
    } else {
        Ok(())
    }
}

fn g_move_linear(file: &mut dyn Write, g: &str, p: &dyn AsGVals, label: &str) -> Result<()> {
    write!(file, "{}", g)?;
    p.as_gvals(file)?;
    writeln!(file, " ; {}", label)
}

pub fn g0(file: &mut dyn Write, p: PosAndFeed, label: &str) -> Result<()> {
    assert!(p.feed.is_none(), "g0 moves must not include a feed rate");
    if let Some(z) = p.z {
        assert!(z > 0.0, "Rapid move at negative z");
    }
    g_move_linear(file, "G0", &p, label)
}

/// Linear move. In inverse-time mode every G1 must carry an F word.
pub fn g1(file: &mut dyn Write, p: PosAndFeed, label: &str) -> Result<()> {
    assert!(p.feed.is_some(), "g1 moves must include a feed rate");
    g_move_linear(file, "G1", &p, label)
}

/// Enable inverse-time feed rate mode (G93). Each non-rapid move then
/// carries `F`, the inverse of the move time in minutes: `F3.0` means
/// "complete this move in 20 seconds".
pub fn inv_feed_g93(file: &mut dyn Write) -> Result<()> {
    writeln!(file, "G93 ; Turn on Inverse Time mode")
}

/// Enable units-per-minute feed rate mode (G94)
pub fn standard_feed_g94(file: &mut dyn Write) -> Result<()> {
    writeln!(file, "G94 ; Turn off Inverse Time mode")
}

pub fn relative_g91(file: &mut dyn Write) -> Result<()> {
    writeln!(file, "G91 ; Relative positioning mode")
}

pub fn spindle_on(file: &mut dyn Write, rpm: u32) -> Result<()> {
    writeln!(file, "M3 S{} ; Start the spindle", rpm)
}

pub fn spindle_off(file: &mut dyn Write) -> Result<()> {
    writeln!(file, "M05 ; Turn off spindle")
}

pub fn operator_hold(file: &mut dyn Write) -> Result<()> {
    writeln!(file, "M0 ; Pause for operator to allow preheating")
}

pub fn dwell(file: &mut dyn Write, seconds: f64) -> Result<()> {
    writeln!(file, "G4 P{:.2} ; Pause at zero height", seconds)
}

/// Modal preamble to set the machine into a known state, plus the wire
/// axis reset.
pub fn preamble(file: &mut dyn Write) -> Result<()> {
    writeln!(file, "G17 ; Select XY plane for circular interpolation")?;
    writeln!(file, "G21 ; Select metric units of [mm]")?;
    writeln!(file, "G54 ; Select G54 Work Coordinate System")?;
    writeln!(file, "G90 ; Absolute positioning mode")?;
    writeln!(file)?;
    writeln!(file, "G92 C0.0 ; Reset the C axis to zero")?;
    Ok(())
}

fn arg(file: &mut dyn Write, label: &str, value: f64, unit: &str) -> Result<()> {
    comment(
        file,
        &format!("{:<28}{:7.2} {}", format!("{}:", label), value, unit),
    )
}

fn arg_count(file: &mut dyn Write, label: &str, value: u32, unit: &str) -> Result<()> {
    comment(
        file,
        &format!("{:<28}{:7} {}", format!("{}:", label), value, unit),
    )
}

fn arg_flag(file: &mut dyn Write, label: &str, value: bool) -> Result<()> {
    comment(file, &format!("{:<31}{}", format!("{}:", label), value))
}

/// Header comment block: the sample id, the arguments the program was
/// generated from, and the derived rates an operator will want to check
/// against the controller's display.
fn header(file: &mut dyn Write, program: &Program) -> Result<()> {
    let p = &program.process;
    let calc = &program.calc;

    comment(
        file,
        &format!("Sample ID:                {}", program.sample_id),
    )?;
    comment(file, "~~~ Arguments used for gcode generation ~~~")?;
    arg(file, "Approach Height", p.approach_height, "[mm]")?;
    arg(file, "Approach Duration", p.approach_duration, "[s]")?;
    arg(file, "Wire Diameter", p.wire_diameter, "[mm]")?;
    arg(file, "Deposition Diameter", p.deposition_diameter, "[mm]")?;
    match &program.pattern {
        Pattern::Line(spec) => {
            arg(file, "Line Length", spec.length, "[mm]")?;
            arg_count(file, "Number of Layers", spec.num_layers, "[unitless]")?;
            arg(file, "Wire Feed Rate", p.feed_rate, "[mm/s]")?;
            arg(file, "Layer Height", spec.layer_height, "[mm]")?;
            arg_count(file, "Spindle Speed", p.spindle_speed, "[rpm]")?;
            arg_flag(file, "Initial Pass Left-to-Right", spec.left_right)?;
            arg_flag(file, "Dummy First Pass", spec.first_pass)?;
            arg_flag(file, "Initial Preheating Pause", spec.initial_pause)?;
        }
        Pattern::LetterN(spec) => {
            arg(file, "Vertical Length", spec.vertical_length, "[mm]")?;
            arg(file, "Horizontal Length", spec.horizontal_length, "[mm]")?;
            arg_count(file, "Number of Layers", spec.num_layers, "[unitless]")?;
            arg(file, "Wire Feed Rate", p.feed_rate, "[mm/s]")?;
            arg(file, "Layer Height", spec.layer_height, "[mm]")?;
            arg_count(file, "Spindle Speed", p.spindle_speed, "[rpm]")?;
            arg_flag(file, "Initial Preheating Pause", spec.initial_pause)?;
        }
        Pattern::Pillar(spec) => {
            arg(file, "Pillar Height", spec.height, "[mm]")?;
            arg(file, "Wire Feed Rate", p.feed_rate, "[mm/s]")?;
            arg_count(file, "Spindle Speed", p.spindle_speed, "[rpm]")?;
            arg(file, "Initial Pause", spec.initial_pause, "[s]")?;
        }
    }

    comment(file, "~~~ Calculated Values ~~~")?;
    match &program.pattern {
        Pattern::Line(spec) => {
            arg(file, "Wire Feed Rate", p.feed_rate * 60.0, "[mm/min]")?;
            let traverse = calc.traverse(spec.length, spec.layer_height);
            arg(file, "Traverse Rate", traverse.rate, "[mm/min]")?;
            arg(file, "Climb Rate", calc.climb(spec.layer_height).rate, "[mm/min]")?;
        }
        Pattern::LetterN(spec) => {
            arg(file, "Wire Feed Rate", p.feed_rate * 60.0, "[mm/min]")?;
            let vertical = calc.traverse(spec.vertical_length, spec.layer_height);
            arg(file, "Vertical Rate", vertical.rate, "[mm/min]")?;
            let diagonal_length = (spec.vertical_length * spec.vertical_length
                + spec.horizontal_length * spec.horizontal_length)
                .sqrt();
            let diagonal = calc.traverse(diagonal_length, spec.layer_height);
            arg(file, "Diagonal Rate", diagonal.rate, "[mm/min]")?;
            arg(file, "Climb Rate", calc.climb(spec.layer_height).rate, "[mm/min]")?;
        }
        Pattern::Pillar(spec) => {
            arg(file, "Climb Rate", calc.climb(spec.height).rate, "[mm/min]")?;
        }
    }
    arg(file, "Total Time", program.total_time_min, "[min]")?;
    writeln!(file)?;

    Ok(())
}

fn start_label(pattern: &Pattern) -> &'static str {
    match pattern {
        Pattern::Line(_) => "Rapid to the start of the line in XY",
        Pattern::LetterN(_) => "Rapid to the start of the N in XY",
        Pattern::Pillar(_) => "Rapid to the start of the pillar in XY",
    }
}

/// Serialize a planned program as a `.nc` listing: header comments, modal
/// preamble, approach, the absolute deposition steps, and the relative
/// escape.
pub fn write_program(file: &mut dyn Write, program: &Program) -> Result<()> {
    header(file, program)?;
    preamble(file)?;
    g0(
        file,
        z(program.process.approach_height),
        "Rapid to the approach height",
    )?;
    g0(
        file,
        xy(program.start.x, program.start.y),
        start_label(&program.pattern),
    )?;
    spindle_on(file, program.process.spindle_speed)?;
    inv_feed_g93(file)?;
    writeln!(file)?;

    g1(
        file,
        zf(0.0, 60.0 / program.process.approach_duration),
        "Feed down to the substrate in Z",
    )?;
    match program.pause {
        Pause::None => {}
        Pause::Operator => operator_hold(file)?,
        Pause::Dwell(seconds) => dwell(file, seconds)?,
    }
    for step in &program.steps {
        let pos = match step.target {
            Target::Xy(p) => xycf(p.x, p.y, step.feed_pos, step.f_word),
            Target::Z(h) => zcf(h, step.feed_pos, step.f_word),
        };
        g1(file, pos, &step.label)?;
    }
    writeln!(file)?;

    match program.escape {
        Escape::Timed {
            z_travel,
            wire,
            duration,
        } => {
            relative_g91(file)?;
            g1(
                file,
                zcf(z_travel, wire, 60.0 / duration),
                "Move up while extruding",
            )?;
            standard_feed_g94(file)?;
        }
        Escape::Fixed {
            z_travel,
            wire,
            rate,
        } => {
            standard_feed_g94(file)?;
            relative_g91(file)?;
            g1(
                file,
                zcf(z_travel, wire, rate),
                "Move up while extruding",
            )?;
        }
    }
    spindle_off(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{build_program, LineSpec, PillarSpec};
    use crate::process::Process;

    fn process() -> Process {
        Process {
            approach_height: 20.0,
            approach_duration: 30.0,
            wire_diameter: 0.9,
            deposition_diameter: 3.3,
            feed_rate: 1.0,
            spindle_speed: 24000,
        }
    }

    fn render(program: &Program) -> String {
        let mut out = Vec::new();
        write_program(&mut out, program).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn line_program_listing() {
        let pattern = Pattern::Line(LineSpec {
            length: 10.0,
            num_layers: 2,
            layer_height: 0.05,
            left_right: false,
            first_pass: false,
            initial_pause: false,
        });
        let program = build_program(&process(), &pattern, 6).unwrap();
        let text = render(&program);

        assert!(text.contains("; Sample ID:                DEP-L-006"));
        assert!(text.contains("G92 C0.0 ; Reset the C axis to zero"));
        assert!(text.contains("G0 Z20.00 ; Rapid to the approach height"));
        assert!(text.contains("G0 X5.00 Y0.00 ; Rapid to the start of the line in XY"));
        assert!(text.contains("M3 S24000 ; Start the spindle"));
        // Approach takes 30s, so its inverse-time word is 2/min
        assert!(text.contains("G1 Z0.00 F2.00 ; Feed down to the substrate in Z"));
        assert!(text.contains("; Move up to layer 1"));
        assert!(text.contains("; Feed across layer 1"));
        assert!(text.contains("; Feed across layer 2"));
        // Inverse time is on for the whole body, including the escape
        let g93 = text.find("G93").unwrap();
        let g94 = text.find("G94").unwrap();
        let escape = text.find("G1 Z20.00 C10.00").unwrap();
        assert!(g93 < escape && escape < g94);
        assert!(text.ends_with("M05 ; Turn off spindle\n"));
    }

    #[test]
    fn pillar_program_listing() {
        let pattern = Pattern::Pillar(PillarSpec {
            height: 10.0,
            initial_pause: 5.0,
        });
        let p = Process {
            deposition_diameter: 4.0,
            ..process()
        };
        let program = build_program(&p, &pattern, 3).unwrap();
        let text = render(&program);

        assert!(text.contains("; Sample ID:                DEP-P-003"));
        assert!(text.contains("G0 X0.00 Y0.00 ; Rapid to the start of the pillar in XY"));
        assert!(text.contains("G4 P5.00 ; Pause at zero height"));
        assert!(text.contains("G1 Z10.00 C197.53"));
        // The pillar escape runs after inverse time mode is switched off
        let g94 = text.find("G94").unwrap();
        let escape = text.find("G1 Z15.00 C10.00 F60.00").unwrap();
        assert!(g94 < escape);
    }

    #[test]
    fn operator_hold_between_approach_and_first_climb() {
        let pattern = Pattern::Line(LineSpec {
            length: 10.0,
            num_layers: 1,
            layer_height: 0.05,
            left_right: false,
            first_pass: false,
            initial_pause: true,
        });
        let program = build_program(&process(), &pattern, 1).unwrap();
        let text = render(&program);
        let approach = text.find("Feed down to the substrate").unwrap();
        let hold = text.find("M0 ; Pause for operator").unwrap();
        let climb = text.find("Move up to layer 1").unwrap();
        assert!(approach < hold && hold < climb);
    }
}

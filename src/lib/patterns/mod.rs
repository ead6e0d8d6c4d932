//! Path generators for the fixed deposition geometries.
//!
//! Each pattern produces an ordered list of segments, invoking the
//! deposition calculator once per segment, and a single fold turns those
//! into absolute motion steps. The tool height and the wire feed position
//! are threaded through the fold and only ever increase.

use crate::geometry::travel_length;
use crate::process::{positive, ConfigError, DepositionCalc, Kinematics, Process};
use nalgebra::geometry::Point2;

/// Escape values shared by the layered paths.
const ESCAPE_TRAVEL: f64 = 20.0;
const ESCAPE_WIRE: f64 = 10.0;

/// The pillar keeps its historical escape: a shorter retreat at a literal
/// F60 in units-per-minute mode, feeding the same 10mm of wire.
const PILLAR_ESCAPE_TRAVEL: f64 = 15.0;
const PILLAR_ESCAPE_WIRE: f64 = 10.0;
const PILLAR_ESCAPE_RATE: f64 = 60.0;

/// A straight line traced back and forth, one pass per layer.
#[derive(Debug, Clone)]
pub struct LineSpec {
    /// Length of the line, mm
    pub length: f64,
    /// Number of layers to deposit
    pub num_layers: u32,
    /// Height of the tool tip above the substrate or previous layer, mm
    pub layer_height: f64,
    /// Start the first pass going left (true) or right (false)
    pub left_right: bool,
    /// Trace the line once at zero height without feeding wire
    pub first_pass: bool,
    /// Hold for the operator (M0) before depositing
    pub initial_pause: bool,
}

/// A letter-N shape: two uprights joined by a diagonal, retraced in
/// alternating directions so consecutive layers never double back over
/// just-laid material.
#[derive(Debug, Clone)]
pub struct NSpec {
    /// Height of the N, mm
    pub vertical_length: f64,
    /// Distance between the two uprights of the N, mm
    pub horizontal_length: f64,
    /// Number of layers to deposit
    pub num_layers: u32,
    /// Height of the tool tip above the substrate or previous layer, mm
    pub layer_height: f64,
    /// Hold for the operator (M0) before depositing
    pub initial_pause: bool,
}

/// A vertical pillar grown in one continuous climb.
#[derive(Debug, Clone)]
pub struct PillarSpec {
    /// Height of the pillar, mm
    pub height: f64,
    /// Preheating dwell at zero height, s
    pub initial_pause: f64,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Line(LineSpec),
    LetterN(NSpec),
    Pillar(PillarSpec),
}

impl Pattern {
    /// Single-letter pattern code used in sample ids.
    pub fn letter(&self) -> char {
        match self {
            Pattern::Line(_) => 'L',
            Pattern::LetterN(_) => 'N',
            Pattern::Pillar(_) => 'P',
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Pattern::Line(spec) => {
                positive("line length", spec.length)?;
                positive("layer height", spec.layer_height)?;
                if spec.num_layers == 0 {
                    return Err(ConfigError::NoLayers);
                }
            }
            Pattern::LetterN(spec) => {
                positive("vertical length", spec.vertical_length)?;
                positive("horizontal length", spec.horizontal_length)?;
                positive("layer height", spec.layer_height)?;
                if spec.num_layers == 0 {
                    return Err(ConfigError::NoLayers);
                }
            }
            Pattern::Pillar(spec) => {
                positive("pillar height", spec.height)?;
                if spec.initial_pause < 0.0 {
                    return Err(ConfigError::NegativePause(spec.initial_pause));
                }
            }
        }
        Ok(())
    }
}

/// One geometric move, before the running state is folded in.
#[derive(Debug, Clone, Copy)]
enum Motion {
    /// Lateral move to an absolute XY target. Unfed traverses move at the
    /// usual rate but leave the wire where it is.
    Traverse { to: Point2<f64>, fed: bool },
    /// Straight climb in Z with the nozzle held over one spot.
    Climb { rise: f64 },
}

#[derive(Debug, Clone)]
struct Segment {
    motion: Motion,
    kin: Kinematics,
    label: String,
}

impl Segment {
    fn traverse(to: Point2<f64>, fed: bool, kin: Kinematics, label: &str) -> Segment {
        Segment {
            motion: Motion::Traverse { to, fed },
            kin,
            label: label.to_string(),
        }
    }

    fn climb(rise: f64, kin: Kinematics, label: String) -> Segment {
        Segment {
            motion: Motion::Climb { rise },
            kin,
            label,
        }
    }
}

/// Pause emitted between the approach move and the first deposition move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pause {
    None,
    /// M0: wait for the operator
    Operator,
    /// G4: dwell for the given number of seconds
    Dwell(f64),
}

/// Final retreat, in relative mode, while still feeding wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Escape {
    /// Inverse-time escape: retreat `z_travel` mm over the time it takes
    /// to feed `wire` mm at the configured feed rate.
    Timed {
        z_travel: f64,
        wire: f64,
        duration: f64,
    },
    /// Units-per-minute escape at a fixed displayed rate.
    Fixed {
        z_travel: f64,
        wire: f64,
        rate: f64,
    },
}

/// One emitted linear move in absolute coordinates.
#[derive(Debug, Clone)]
pub struct Step {
    pub target: Target,
    /// Cumulative wire feed position (the C axis), mm
    pub feed_pos: f64,
    /// Inverse-time F word: 60 / duration
    pub f_word: f64,
    /// Trailing comment describing the move
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Xy(Point2<f64>),
    Z(f64),
}

/// A fully planned program, ready for serialization.
#[derive(Debug, Clone)]
pub struct Program {
    pub sample_id: String,
    pub process: Process,
    pub pattern: Pattern,
    pub calc: DepositionCalc,
    /// XY position rapided to before the spindle starts
    pub start: Point2<f64>,
    pub pause: Pause,
    pub steps: Vec<Step>,
    pub escape: Escape,
    /// Planned deposition time (approach included, escape excluded), min
    pub total_time_min: f64,
}

impl Program {
    /// Output filename for this program.
    pub fn filename(&self) -> String {
        format!("{}.nc", self.sample_id)
    }
}

pub fn sample_id(letter: char, sample_num: u32) -> String {
    format!("DEP-{}-{:03}", letter, sample_num)
}

/// Validate the configuration, run the pattern's generator, and fold the
/// segments into the final step sequence.
pub fn build_program(
    process: &Process,
    pattern: &Pattern,
    sample_num: u32,
) -> Result<Program, ConfigError> {
    let calc = DepositionCalc::new(process)?;
    pattern.validate()?;
    let plan = match pattern {
        Pattern::Line(spec) => line_segments(&calc, spec),
        Pattern::LetterN(spec) => n_segments(&calc, spec),
        Pattern::Pillar(spec) => pillar_segments(&calc, spec),
    };
    let steps = fold_segments(&plan.segments);
    Ok(Program {
        sample_id: sample_id(pattern.letter(), sample_num),
        process: process.clone(),
        pattern: pattern.clone(),
        calc,
        start: plan.start,
        pause: plan.pause,
        steps,
        escape: plan.escape,
        total_time_min: (process.approach_duration + plan.deposition_time) / 60.0,
    })
}

struct PatternPlan {
    start: Point2<f64>,
    segments: Vec<Segment>,
    pause: Pause,
    escape: Escape,
    /// Seconds of deposition after the approach move
    deposition_time: f64,
}

/// Fold the segments through the running tool state. The wire feed
/// position accumulates over every fed segment; the height only over
/// climbs. Neither ever decreases.
fn fold_segments(segments: &[Segment]) -> Vec<Step> {
    let mut height = 0.0;
    let mut feed = 0.0;
    let mut steps = Vec::with_capacity(segments.len());
    for seg in segments {
        let target = match seg.motion {
            Motion::Traverse { to, fed } => {
                if fed {
                    feed += seg.kin.feed_length;
                }
                Target::Xy(to)
            }
            Motion::Climb { rise } => {
                height += rise;
                feed += seg.kin.feed_length;
                Target::Z(height)
            }
        };
        steps.push(Step {
            target,
            feed_pos: feed,
            f_word: 60.0 / seg.kin.duration,
            label: seg.label.clone(),
        });
    }
    steps
}

fn line_segments(calc: &DepositionCalc, spec: &LineSpec) -> PatternPlan {
    let traverse = calc.traverse(spec.length, spec.layer_height);
    let climb = calc.climb(spec.layer_height);
    let half = spec.length / 2.0;
    let mut direction = if spec.left_right { 1.0 } else { -1.0 };
    let start = Point2::new(-direction * half, 0.0);

    let mut segments = Vec::new();
    if spec.first_pass {
        segments.push(Segment::traverse(
            Point2::new(direction * half, 0.0),
            false,
            traverse,
            "Blank pass",
        ));
        direction = -direction;
    }
    segments.push(Segment::climb(
        spec.layer_height,
        climb,
        "Move up to layer 1".to_string(),
    ));
    for layer in 1..=spec.num_layers {
        segments.push(Segment::traverse(
            Point2::new(direction * half, 0.0),
            true,
            traverse,
            &format!("Feed across layer {}", layer),
        ));
        direction = -direction;
        if layer < spec.num_layers {
            segments.push(Segment::climb(
                spec.layer_height,
                climb,
                format!("Move up to layer {}", layer + 1),
            ));
        }
    }

    PatternPlan {
        start,
        segments,
        pause: if spec.initial_pause {
            Pause::Operator
        } else {
            Pause::None
        },
        escape: Escape::Timed {
            z_travel: ESCAPE_TRAVEL,
            wire: ESCAPE_WIRE,
            duration: calc.escape_duration(ESCAPE_WIRE),
        },
        deposition_time: spec.num_layers as f64 * (traverse.duration + climb.duration),
    }
}

fn n_segments(calc: &DepositionCalc, spec: &NSpec) -> PatternPlan {
    let half_h = spec.horizontal_length / 2.0;
    let half_v = spec.vertical_length / 2.0;
    let lower_left = Point2::new(-half_h, -half_v);
    let lower_right = Point2::new(half_h, -half_v);
    let upper_left = Point2::new(-half_h, half_v);
    let upper_right = Point2::new(half_h, half_v);

    let vertical = calc.traverse(spec.vertical_length, spec.layer_height);
    let diagonal = calc.traverse(
        travel_length(&lower_left, &upper_right),
        spec.layer_height,
    );
    let climb = calc.climb(spec.layer_height);

    let mut segments = Vec::new();
    // One unfed trace of the full N at zero height before the first climb
    segments.push(Segment::traverse(
        upper_left,
        false,
        vertical,
        "Move up the left vertical of the N",
    ));
    segments.push(Segment::traverse(
        lower_right,
        false,
        diagonal,
        "Move down across the diagonal of the N",
    ));
    segments.push(Segment::traverse(
        upper_right,
        false,
        vertical,
        "Move up the right vertical of the N",
    ));
    segments.push(Segment::climb(
        spec.layer_height,
        climb,
        "Move up one layer height while feeding".to_string(),
    ));

    // The unfed trace ends at the upper right, so the first fed layer runs
    // the strokes backwards; parity flips every layer after that
    let mut from_lower_left = false;
    for layer in 0..spec.num_layers {
        if from_lower_left {
            segments.push(Segment::traverse(
                upper_left,
                true,
                vertical,
                "Move up the left vertical of the N",
            ));
            segments.push(Segment::traverse(
                lower_right,
                true,
                diagonal,
                "Move down across the diagonal of the N",
            ));
            segments.push(Segment::traverse(
                upper_right,
                true,
                vertical,
                "Move up the right vertical of the N",
            ));
        } else {
            segments.push(Segment::traverse(
                lower_right,
                true,
                vertical,
                "Move down the right vertical of the N",
            ));
            segments.push(Segment::traverse(
                upper_left,
                true,
                diagonal,
                "Move up across the diagonal of the N",
            ));
            segments.push(Segment::traverse(
                lower_left,
                true,
                vertical,
                "Move down the left vertical of the N",
            ));
        }
        from_lower_left = !from_lower_left;
        if layer + 1 < spec.num_layers {
            segments.push(Segment::climb(
                spec.layer_height,
                climb,
                "Move up one layer height while feeding".to_string(),
            ));
        }
    }

    PatternPlan {
        start: lower_left,
        segments,
        pause: if spec.initial_pause {
            Pause::Operator
        } else {
            Pause::None
        },
        escape: Escape::Timed {
            z_travel: ESCAPE_TRAVEL,
            wire: ESCAPE_WIRE,
            duration: calc.escape_duration(ESCAPE_WIRE),
        },
        deposition_time: spec.num_layers as f64
            * (2.0 * vertical.duration + diagonal.duration + climb.duration),
    }
}

fn pillar_segments(calc: &DepositionCalc, spec: &PillarSpec) -> PatternPlan {
    let climb = calc.climb(spec.height);
    PatternPlan {
        start: Point2::new(0.0, 0.0),
        segments: vec![Segment::climb(
            spec.height,
            climb,
            "Move up to the pillar height while feeding".to_string(),
        )],
        pause: Pause::Dwell(spec.initial_pause),
        escape: Escape::Fixed {
            z_travel: PILLAR_ESCAPE_TRAVEL,
            wire: PILLAR_ESCAPE_WIRE,
            rate: PILLAR_ESCAPE_RATE,
        },
        deposition_time: climb.duration + spec.initial_pause,
    }
}

//! Driver binary: reads a layer-description file, builds one `LayerPlan`
//! per layer in parallel, runs the transformer passes, and writes the
//! result through the exporter chain (console trace plus, optionally, a
//! G-code file).

mod input;
mod ordering;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use clap::Parser;
use rayon::prelude::*;

use slicer_core::exporter::{ConsoleExporter, GCodeExporter, MultiExporter, PlanExporter};
use slicer_core::feature_type::FeatureType;
use slicer_core::transformers::{
    FeatureOrderingTransformer, SmoothingTransformer, StraightTravelMoveGenerator,
    TravelInsertionTransformer,
};
use slicer_core::tree::traversal::apply_transformer;
use slicer_core::tree::{
    ExtruderMoveData, ExtruderPlanData, FeatureExtrusionData, FeatureKind, LayerPlanData, MoveKind,
    MovePosition, NodeId, OperationTree, PrintOperation, RetractionConfig,
};
use slicer_core::wall::{self, WallGeneratorSettings};
use slicer_core::{CoreSettings, Point, Shape};

use input::{LayerInput, PrintJob};
use ordering::InsetOrderConstraints;

/// Path-planning driver for a fused-filament-fabrication slicer back-end.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to a JSON layer-description file (see `input::PrintJob`).
    input: PathBuf,

    /// If set, also write G-code to this path.
    #[arg(long)]
    gcode_out: Option<PathBuf>,

    /// Simulate an out-of-band cancellation (Ctrl-C, a host message) firing
    /// immediately. Layers already in flight on another worker thread still
    /// finish; everything not yet started is skipped.
    #[arg(long, default_value_t = false)]
    cancel: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let job = match PrintJob::load(&args.input) {
        Ok(job) => job,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    let cancelled = Arc::new(AtomicBool::new(args.cancel));

    let plans = build_layer_plans(&job, &cancelled);

    let mut exporter = build_exporter(args.gcode_out.as_deref());
    for (index, (tree, root)) in plans.into_iter().enumerate() {
        if cancelled.load(AtomicOrdering::SeqCst) {
            log::info!("cancellation observed before layer {index}; stopping");
            break;
        }
        tree.write(root, exporter.as_mut(), &mut Vec::new());
        if let Some(err) = exporter.take_error() {
            log::error!("layer {index}: {err}");
        }
    }
}

fn build_exporter(gcode_out: Option<&std::path::Path>) -> Box<dyn PlanExporter> {
    match gcode_out {
        None => Box::new(ConsoleExporter::new()),
        Some(path) => {
            let mut multi = MultiExporter::new();
            multi.register(Box::new(ConsoleExporter::new()));
            match File::create(path) {
                Ok(file) => multi.register(Box::new(GCodeExporter::new(BufWriter::new(file)))),
                Err(err) => log::warn!("could not open {path:?} for G-code output: {err}"),
            }
            Box::new(multi)
        }
    }
}

/// Builds every layer's `LayerPlan` in parallel: plan construction is
/// CPU-bound and independent per layer. `rayon`'s
/// `par_iter().map().collect()` both parallelizes the work and preserves
/// the original layer order in the returned `Vec`, which is exactly the
/// "hand layers to the exporter in increasing index order" contract.
fn build_layer_plans(job: &PrintJob, cancelled: &Arc<AtomicBool>) -> Vec<(OperationTree, NodeId)> {
    job.layers
        .iter()
        .enumerate()
        .collect::<Vec<_>>()
        .into_par_iter()
        .filter_map(|(index, layer)| {
            if cancelled.load(AtomicOrdering::SeqCst) {
                return None;
            }
            Some(build_layer_plan(index, layer, &job.settings))
        })
        .collect()
}

fn build_layer_plan(
    layer_index: usize,
    layer: &LayerInput,
    settings: &CoreSettings,
) -> (OperationTree, NodeId) {
    let mut tree = OperationTree::new();

    let layer_root = tree.insert(PrintOperation::LayerPlan(LayerPlanData {
        layer_index,
        z: layer.z,
        thickness: layer.thickness,
    }));

    let extruder_plan = tree.insert(PrintOperation::ExtruderPlan(ExtruderPlanData {
        extruder_nr: 0,
        travel_speed: layer.travel_speed,
        fan_speed: 1.0,
        layer_time_target: layer.layer_time_target,
        retraction: RetractionConfig {
            speed: layer.retraction_speed,
            distance: layer.retraction_distance,
        },
        back_pressure_compensation: settings.back_pressure_compensation,
    }));
    tree.append_child(layer_root, extruder_plan).expect("fresh node has no parent");

    let outline: Shape = layer
        .outline
        .iter()
        .map(|poly| poly.iter().map(|&[x, y]| Point::new(x, y)).collect())
        .collect();

    let wall_settings = WallGeneratorSettings {
        beading_strategy_type: settings.beading_strategy_type,
        fill_outline_gaps: settings.fill_outline_gaps,
        min_feature_size: settings.min_feature_size,
        min_bead_width: settings.min_bead_width,
    };

    let (toolpaths, _inner_contour) = wall::generate(
        &outline,
        layer.bead_width_0,
        layer.bead_width_x,
        layer.inset_count,
        &wall_settings,
    );

    for lines in &toolpaths {
        for line in lines {
            let nominal_width = if line.inset_index == 0 {
                layer.bead_width_0
            } else {
                layer.bead_width_x
            };
            let feature = tree.insert(PrintOperation::FeatureExtrusion(FeatureExtrusionData {
                kind: FeatureKind::Wall {
                    inset_index: line.inset_index,
                },
                feature_type: FeatureType::Wall,
                nominal_line_width: nominal_width,
                flow_ratio: 1.0,
                layer_thickness: layer.thickness,
                width_factor: 1.0,
                speed: layer.wall_speed,
                speed_factor: 1.0,
            }));
            let sequence = tree.insert(PrintOperation::ContinuousExtruderMoveSequence);
            tree.append_child(feature, sequence).expect("fresh node has no parent");

            for junction in &line.junctions {
                let line_width_ratio = (junction.w as f64 / nominal_width.max(1.0)).max(0.0);
                let mv = tree.insert(PrintOperation::ExtruderMove(ExtruderMoveData {
                    kind: MoveKind::ExtrusionMove { line_width_ratio },
                    position: MovePosition::RelativeToLayerZ {
                        xy: junction.p,
                        dz: 0.0,
                    },
                }));
                tree.append_child(sequence, mv).expect("fresh node has no parent");
            }

            tree.append_child(extruder_plan, feature).expect("fresh node has no parent");
        }
    }

    apply_transformer(
        &mut tree,
        layer_root,
        &mut FeatureOrderingTransformer::new(InsetOrderConstraints),
    );
    apply_transformer(
        &mut tree,
        layer_root,
        &mut SmoothingTransformer {
            max_resolution: settings.max_resolution,
            fluid_angle: settings.fluid_angle,
        },
    );
    apply_transformer(
        &mut tree,
        layer_root,
        &mut TravelInsertionTransformer::new(StraightTravelMoveGenerator),
    );

    (tree, layer_root)
}

use std::path::PathBuf;

use hexmind_engine::{
    Board, BoardEdge, CandidateAction, CellTerrain, Facing, GridBoard, HexCoord, UnitId, UnitRole,
    UnitSnapshot,
};
use hexmind_evaluator::{
    ParameterVector, TacticalCostFunction, TransitionCostFunction, TransitionTacticalCostFunction,
    cost_function::UnitStates,
};
use hexmind_stats::descriptive::DescriptiveStats;
use hexmind_training::{
    InMemoryTrainingSet, Optimizer, OptimizerConfig, TrainingOutcome, TrainingSample, TrainingSet,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::{model::TrainedModel, util::Output};

/// Which cost function to fit.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum CostKind {
    /// The seventeen-term utility function.
    #[default]
    Utility,
    /// The transition-aware variant with the damage-swing term.
    Extended,
}

const BOARD_WIDTH: u32 = 16;
const BOARD_HEIGHT: u32 = 16;
const UNITS_PER_SIDE: u32 = 4;
const REPORT_INTERVAL: u64 = 100;

const ROLES: [UnitRole; 7] = [
    UnitRole::Scout,
    UnitRole::Striker,
    UnitRole::Skirmisher,
    UnitRole::Brawler,
    UnitRole::Sniper,
    UnitRole::MissileBoat,
    UnitRole::Juggernaut,
];

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Cost function to train
    #[arg(long, default_value = "utility")]
    cost: CostKind,
    /// Seed for scenario generation, batch sampling and descent noise
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Number of synthetic expert actions to train on
    #[arg(long, default_value_t = 500)]
    samples: u32,
    /// Iteration budget
    #[arg(long, default_value_t = 5000)]
    iterations: u64,
    /// Output file path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        cost,
        seed,
        samples,
        iterations,
        output,
    } = arg;

    let mut rng = Pcg64Mcg::seed_from_u64(*seed);
    let board = synthetic_board(&mut rng)?;
    let dataset = synthetic_dataset(&board, *samples, &mut rng);
    eprintln!(
        "Generated {} expert actions on a {BOARD_WIDTH}x{BOARD_HEIGHT} board",
        dataset.len()
    );

    let config = OptimizerConfig {
        max_iterations: *iterations,
        ..OptimizerConfig::default()
    };

    let (slot_names, outcome) = match cost {
        CostKind::Utility => {
            let mut function = TacticalCostFunction::new(&board, BoardEdge::South);
            let names = function.layout().names().to_vec();
            (names, train(config, &mut function, &dataset, &mut rng))
        }
        CostKind::Extended => {
            let mut function = TransitionTacticalCostFunction::new(&board, BoardEdge::South);
            let names = function.layout().names().to_vec();
            (names, train(config, &mut function, &dataset, &mut rng))
        }
    };

    eprintln!("{cost:?} training completed.");
    eprintln!(
        "  Best loss {:.6} at iteration {} ({} iterations run, converged: {})",
        outcome.best_loss, outcome.best_iteration, outcome.iterations_run, outcome.converged
    );

    let model_name = match cost {
        CostKind::Utility => "utility",
        CostKind::Extended => "extended",
    };
    let model = TrainedModel::from_outcome(model_name, &slot_names, &outcome);
    Output::save_json(&model, output.clone())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Final loss: {:.6}", model.final_loss);
    eprintln!("  Weights: {} slots", model.weights.len());

    Ok(())
}

fn train<C>(
    config: OptimizerConfig,
    function: &mut C,
    dataset: &InMemoryTrainingSet,
    rng: &mut Pcg64Mcg,
) -> TrainingOutcome
where
    C: TransitionCostFunction,
{
    let optimizer = Optimizer::new(config);
    let initial =
        ParameterVector::random_gaussian(function.parameter_count(), 0.5, 0.1, rng).clamp(0.0, 1.0);

    let mut window = Vec::new();
    optimizer.optimize(function, dataset, initial, rng, |report| {
        window.push(report.loss);
        if (report.iteration + 1).is_multiple_of(REPORT_INTERVAL)
            && let Some(stats) = DescriptiveStats::new(window.drain(..))
        {
            eprintln!(
                "Iteration #{:5}: loss {:.6} (window mean {:.6} +/- {:.6}, min {:.6}), best {:.6}, lr {:.5}",
                report.iteration + 1,
                report.loss,
                stats.mean,
                stats.std_dev,
                stats.min,
                report.best_loss,
                report.learning_rate,
            );
        }
    })
}

/// A random skirmish board: mostly open ground with scattered woods,
/// buildings, water and low hills.
fn synthetic_board<R>(rng: &mut R) -> anyhow::Result<GridBoard>
where
    R: Rng,
{
    let mut board = GridBoard::flat(BOARD_WIDTH, BOARD_HEIGHT)?;
    #[expect(clippy::cast_possible_wrap)]
    for y in 0..BOARD_HEIGHT as i32 {
        #[expect(clippy::cast_possible_wrap)]
        for x in 0..BOARD_WIDTH as i32 {
            let roll: f64 = rng.random();
            let cell = if roll < 0.12 {
                CellTerrain {
                    wooded: true,
                    clear: false,
                    ..CellTerrain::clear_ground()
                }
            } else if roll < 0.18 {
                CellTerrain {
                    building: true,
                    building_level: rng.random_range(1..=2),
                    clear: false,
                    ..CellTerrain::clear_ground()
                }
            } else if roll < 0.22 {
                CellTerrain {
                    water_depth: 1,
                    clear: false,
                    ..CellTerrain::clear_ground()
                }
            } else if roll < 0.30 {
                CellTerrain {
                    floor_elevation: rng.random_range(1..=2),
                    ..CellTerrain::clear_ground()
                }
            } else {
                continue;
            };
            board.set_cell(HexCoord::new(x, y), cell);
        }
    }
    Ok(board)
}

fn synthetic_unit<R>(id: UnitId, owner: u32, board: &GridBoard, rng: &mut R) -> UnitSnapshot
where
    R: Rng,
{
    // Side 0 deploys along the north rows, side 1 along the south rows.
    let y = if owner == 0 {
        rng.random_range(0..3)
    } else {
        board.height() - 3 + rng.random_range(0..3)
    };
    #[expect(clippy::cast_possible_wrap)]
    let position = HexCoord::new(rng.random_range(0..board.width()) as i32, y as i32);
    UnitSnapshot {
        id,
        position,
        facing: if owner == 0 { Facing::South } else { Facing::North },
        owner,
        role: ROLES[rng.random_range(0..ROLES.len())],
        armor_fraction: rng.random_range(0.4..1.0),
        internal_fraction: rng.random_range(0.6..1.0),
        max_weapon_range: rng.random_range(4..12),
        max_damage: rng.random_range(5.0..25.0),
        crippled: rng.random_bool(0.1),
        jump_capable: rng.random_bool(0.3),
    }
}

fn synthetic_states<R>(board: &GridBoard, rng: &mut R) -> UnitStates
where
    R: Rng,
{
    let mut states = UnitStates::new();
    for owner in 0..2 {
        for slot in 0..UNITS_PER_SIDE {
            let id = owner * 16 + slot;
            states.insert(id, synthetic_unit(id, owner, board, rng));
        }
    }
    states
}

/// Builds one expert decision: a friendly unit advances along the line toward
/// its nearest enemy and faces it, and the follow-up snapshot records the
/// move plus any damage dealt.
fn expert_sample<R>(states: UnitStates, rng: &mut R) -> TrainingSample
where
    R: Rng,
{
    let mover_id = rng.random_range(0..UNITS_PER_SIDE);
    let mover = states[&mover_id].clone();
    let enemy = states
        .values()
        .filter(|u| u.owner != mover.owner)
        .min_by_key(|u| mover.position.distance(u.position))
        .cloned()
        .expect("both sides are always populated");

    let line = mover.position.line_to(enemy.position);
    // Stop short of the enemy's own hex.
    let max_step = line.len().saturating_sub(2);
    let steps = if max_step == 0 {
        0
    } else {
        rng.random_range(1..=max_step.min(4))
    };
    let to = line[steps];
    let facing = to.facing_toward(enemy.position);

    #[expect(clippy::cast_possible_truncation)]
    let action = CandidateAction {
        unit_id: mover.id,
        from: mover.position,
        to,
        facing,
        path: line[1..=steps].to_vec(),
        hexes_moved: steps as u32,
        jumped: mover.jump_capable && rng.random_bool(0.2),
        fall_probability: rng.random_range(0.0..0.15),
        armor_fraction: mover.armor_fraction,
        internal_fraction: mover.internal_fraction,
    };

    let mut next_states = states.clone();
    if let Some(moved) = next_states.get_mut(&mover.id) {
        moved.position = to;
        moved.facing = facing;
    }
    if to.distance(enemy.position) <= mover.max_weapon_range
        && let Some(hit) = next_states.get_mut(&enemy.id)
    {
        hit.armor_fraction *= rng.random_range(0.7..1.0);
    }

    TrainingSample {
        action,
        states,
        next_states,
    }
}

fn synthetic_dataset<R>(board: &GridBoard, samples: u32, rng: &mut R) -> InMemoryTrainingSet
where
    R: Rng,
{
    let mut set = InMemoryTrainingSet::default();
    for _ in 0..samples {
        let states = synthetic_states(board, rng);
        set.push(expert_sample(states, rng));
    }
    set
}

//! The multi-term tactical utility function.
//!
//! [`TacticalCostFunction`] scores one candidate move against the full
//! battlefield snapshot. Seventeen independent sub-terms measure threat
//! proximity, formation geometry, line-of-sight, terrain cover and swarm
//! cohesion; each is a function of one weight tag and is clamped into
//! `[0, 1]` on its own.
//!
//! # Aggregation
//!
//! Terms are combined as a floored geometric mean: every term is raised to a
//! minimum of [`TERM_FLOOR`] (never capped on the high side), the arithmetic
//! mean of the natural logs is taken, and the result is exponentiated. The
//! floor keeps a single zero term from collapsing the whole product through
//! `ln(0)`, while still punishing very low terms far harder than an
//! arithmetic mean would.
//!
//! A behavior state is then classified per action:
//!
//! - [`BehaviorState::Scouting`] when the unit's role is scout
//! - [`BehaviorState::Aggressive`] when health is above 70% and damage
//!   potential at engagement range exceeds the aggression threshold
//! - [`BehaviorState::Defensive`] otherwise
//!
//! and the matching bonus weight multiplies the mean by
//! `1 + weight * signal` (flank distance, aggression/mobility, or local
//! cover density). The final utility is clamped into `[0, 1]`.
//!
//! # Cost orientation
//!
//! `resolve` returns `1 - utility`: training minimizes the squared cost of
//! recorded actions, which pushes their utility toward 1. The raw utility is
//! available through [`TacticalCostFunction::utility`].
//!
//! [`TransitionTacticalCostFunction`] additionally folds in the realized
//! damage swing between the current and next snapshots; it implements only
//! the transition capability, so it cannot be called through the state-only
//! path.

use std::collections::HashMap;

use hexmind_engine::{
    Board, BoardEdge, CandidateAction, HexCoord, TerrainIndex, UnitRole, UnitSnapshot,
};

use crate::{
    cost_function::{CostFunction, TransitionCostFunction, UnitStates},
    params::{ParameterVector, WeightLayout, WeightTag},
    swarm::SwarmContext,
};

/// Per-term lower clamp applied before taking logs.
pub const TERM_FLOOR: f64 = 0.01;

/// Range in hexes at which bravery and the aggressive classifier sample
/// damage potential.
pub const ENGAGEMENT_RANGE: u32 = 5;

const AGGRESSIVE_DAMAGE_THRESHOLD: f64 = 10.0;
const HEALTHY_FRACTION: f64 = 0.7;
const CAUTION_AMPLIFIER: f64 = 1.5;
const OPTIMAL_SPACING: f64 = 2.0;
const COHESION_RADIUS: f64 = 10.0;
const EXPECTED_DAMAGE_SCALE: f64 = 40.0;
const COVERAGE_CAP: f64 = 4.0;
const CLOSEST_ENEMY_COUNT: usize = 5;
const SAME_ROLE_CROWD_RADIUS: u32 = 2;
const ENEMY_CROWD_RADIUS: u32 = 3;

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Weighted geometric mean with the implicit [`TERM_FLOOR`].
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn floored_geometric_mean(terms: &[f64]) -> f64 {
    assert!(!terms.is_empty());
    let mean_log = terms.iter().map(|t| t.max(TERM_FLOOR).ln()).sum::<f64>() / terms.len() as f64;
    mean_log.exp()
}

/// Behavior classification applied on top of the geometric mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorState {
    Scouting,
    Aggressive,
    Defensive,
}

impl BehaviorState {
    /// Classifies `unit` for one action.
    #[must_use]
    pub fn classify(unit: &UnitSnapshot) -> Self {
        if unit.role == UnitRole::Scout {
            Self::Scouting
        } else if unit.health_fraction() > HEALTHY_FRACTION
            && unit.damage_at(ENGAGEMENT_RANGE) > AGGRESSIVE_DAMAGE_THRESHOLD
        {
            Self::Aggressive
        } else {
            Self::Defensive
        }
    }
}

/// One weight tag per term, registered once at construction.
#[derive(Debug, Clone, Copy)]
struct TermTags {
    aggression: WeightTag,
    fall_risk: WeightTag,
    bravery: WeightTag,
    movement_modifier: WeightTag,
    facing: WeightTag,
    self_preservation: WeightTag,
    strategic_goal: WeightTag,
    formation: WeightTag,
    exposure: WeightTag,
    health: WeightTag,
    nearby_pressure: WeightTag,
    swarm_cohesion: WeightTag,
    enemy_positioning: WeightTag,
    expected_damage: WeightTag,
    advanced_coverage: WeightTag,
    environment: WeightTag,
    anti_crowding: WeightTag,
    scouting_bonus: WeightTag,
    aggressive_bonus: WeightTag,
    defensive_bonus: WeightTag,
}

impl TermTags {
    fn register(layout: &mut WeightLayout) -> Self {
        Self {
            aggression: layout.slot("aggression"),
            fall_risk: layout.slot("fall-risk"),
            bravery: layout.slot("bravery"),
            movement_modifier: layout.slot("movement-modifier"),
            facing: layout.slot("facing"),
            self_preservation: layout.slot("self-preservation"),
            strategic_goal: layout.slot("strategic-goal"),
            formation: layout.slot("formation"),
            exposure: layout.slot("exposure"),
            health: layout.slot("health"),
            nearby_pressure: layout.slot("nearby-pressure"),
            swarm_cohesion: layout.slot("swarm-cohesion"),
            enemy_positioning: layout.slot("enemy-positioning"),
            expected_damage: layout.slot("expected-damage"),
            advanced_coverage: layout.slot("advanced-coverage"),
            environment: layout.slot("environment"),
            anti_crowding: layout.slot("anti-crowding"),
            scouting_bonus: layout.slot("scouting-bonus"),
            aggressive_bonus: layout.slot("aggressive-bonus"),
            defensive_bonus: layout.slot("defensive-bonus"),
        }
    }
}

/// The concrete seventeen-term utility function.
#[derive(Debug, Clone)]
pub struct TacticalCostFunction {
    layout: WeightLayout,
    tags: TermTags,
    terrain: TerrainIndex,
    width: u32,
    height: u32,
    home_edge: BoardEdge,
    waypoints: Vec<HexCoord>,
    swarm: SwarmContext,
    /// Times each destination hex has been scored this run.
    visits: HashMap<HexCoord, u32>,
}

impl TacticalCostFunction {
    /// Builds the cost function for `board`, with strategic waypoints at the
    /// four quadrant centers.
    ///
    /// # Panics
    ///
    /// Panics if the board has zero area.
    #[must_use]
    pub fn new(board: &dyn Board, home_edge: BoardEdge) -> Self {
        let waypoints = default_waypoints(board.width(), board.height());
        Self::with_waypoints(board, home_edge, waypoints)
    }

    /// Builds the cost function with explicit strategic waypoints.
    #[must_use]
    pub fn with_waypoints(
        board: &dyn Board,
        home_edge: BoardEdge,
        waypoints: Vec<HexCoord>,
    ) -> Self {
        let mut layout = WeightLayout::new();
        let tags = TermTags::register(&mut layout);
        Self::from_parts(layout, tags, board, home_edge, waypoints)
    }

    fn from_parts(
        layout: WeightLayout,
        tags: TermTags,
        board: &dyn Board,
        home_edge: BoardEdge,
        waypoints: Vec<HexCoord>,
    ) -> Self {
        Self {
            layout,
            tags,
            terrain: TerrainIndex::build(board),
            width: board.width(),
            height: board.height(),
            home_edge,
            waypoints,
            swarm: SwarmContext::new(),
            visits: HashMap::new(),
        }
    }

    /// Names and offsets of every weight slot, in vector order.
    #[must_use]
    pub fn layout(&self) -> &WeightLayout {
        &self.layout
    }

    /// Raw clamped utility of `action` in `[0, 1]`; higher is better.
    ///
    /// # Panics
    ///
    /// Panics if the acting unit is missing from `states`.
    pub fn utility(
        &mut self,
        action: &CandidateAction,
        states: &UnitStates,
        params: &ParameterVector,
    ) -> f64 {
        let Some(unit) = states.get(&action.unit_id) else {
            panic!("acting unit {} missing from state snapshot", action.unit_id);
        };
        self.swarm.update(states, unit.owner);
        let cluster_centroid = self.swarm.cluster_for(unit).centroid();
        let prior_visits = self.visits.get(&action.to).copied().unwrap_or(0);

        let enemies: Vec<&UnitSnapshot> =
            states.values().filter(|u| u.owner != unit.owner).collect();
        let allies: Vec<&UnitSnapshot> = states
            .values()
            .filter(|u| u.owner == unit.owner && u.id != unit.id)
            .collect();
        let ctx = EvalContext {
            unit,
            action,
            destination: action.to,
            enemies: &enemies,
            allies: &allies,
            cluster_centroid,
            prior_visits,
        };

        let tags = self.tags;
        let terms = [
            Self::aggression_term(&ctx, params.get_tag(tags.aggression)),
            Self::fall_risk_term(&ctx, params.get_tag(tags.fall_risk)),
            Self::bravery_term(&ctx, params.get_tag(tags.bravery)),
            Self::movement_modifier_term(&ctx, params.get_tag(tags.movement_modifier)),
            Self::facing_term(&ctx, params.get_tag(tags.facing)),
            self.self_preservation_term(&ctx, params.get_tag(tags.self_preservation)),
            self.strategic_goal_term(&ctx, params.get_tag(tags.strategic_goal)),
            self.formation_term(&ctx, params.get_tag(tags.formation)),
            self.exposure_term(&ctx, params.get_tag(tags.exposure)),
            Self::health_term(&ctx, params.get_tag(tags.health)),
            self.nearby_pressure_term(&ctx, params.get_tag(tags.nearby_pressure)),
            Self::swarm_cohesion_term(&ctx, params.get_tag(tags.swarm_cohesion)),
            self.enemy_positioning_term(&ctx, params.get_tag(tags.enemy_positioning)),
            Self::expected_damage_term(&ctx, params.get_tag(tags.expected_damage)),
            self.advanced_coverage_term(&ctx, params.get_tag(tags.advanced_coverage)),
            self.environment_term(&ctx, params.get_tag(tags.environment)),
            Self::anti_crowding_term(&ctx, params.get_tag(tags.anti_crowding)),
        ];
        let mean = floored_geometric_mean(&terms);

        let (bonus_weight, bonus_signal) = match BehaviorState::classify(unit) {
            BehaviorState::Scouting => (
                params.get_tag(tags.scouting_bonus),
                self.flank_distance_signal(&ctx),
            ),
            BehaviorState::Aggressive => (
                params.get_tag(tags.aggressive_bonus),
                Self::aggression_mobility_signal(&ctx),
            ),
            BehaviorState::Defensive => (
                params.get_tag(tags.defensive_bonus),
                self.terrain.cover_density(ctx.destination),
            ),
        };
        let utility = clamp01(mean * (1.0 + bonus_weight * bonus_signal));

        *self.visits.entry(action.to).or_insert(0) += 1;
        utility
    }

    fn max_dimension(&self) -> f64 {
        f64::from(self.width.max(self.height))
    }

    // Inverse of distance-to-nearest-enemy relative to maximum weapon range.
    fn aggression_term(ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let Some(enemy) = ctx.nearest_enemy() else {
            return clamp01(weight);
        };
        let distance = ctx.destination.distance(enemy.position).max(1);
        clamp01(weight * f64::from(ctx.unit.max_weapon_range) / f64::from(distance))
    }

    fn fall_risk_term(ctx: &EvalContext<'_>, weight: f64) -> f64 {
        clamp01(1.0 - weight * ctx.action.fall_probability)
    }

    // Expected damage dealt vs. taken at engagement range, scaled by the
    // action's success probability.
    fn bravery_term(ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let dealt = ctx.unit.damage_at(ENGAGEMENT_RANGE);
        let taken: f64 = ctx
            .enemies
            .iter()
            .map(|e| e.damage_at(ctx.destination.distance(e.position)))
            .sum();
        let swing = ctx.action.success_probability() * dealt - taken;
        clamp01(0.5 + 0.5 * weight * swing / (dealt + taken).max(1.0))
    }

    fn movement_modifier_term(ctx: &EvalContext<'_>, weight: f64) -> f64 {
        clamp01(weight * f64::from(ctx.action.target_movement_modifier()) / 6.0)
    }

    // Alignment of the final facing with the direction of the nearest threat.
    fn facing_term(ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let Some(enemy) = ctx.nearest_enemy() else {
            return clamp01(weight);
        };
        let desired = ctx.destination.facing_toward(enemy.position);
        let offset = ctx.action.facing.offset_to(desired);
        clamp01(weight * (1.0 - f64::from(offset) / 3.0))
    }

    // Retreat-edge distance improvement, only relevant when crippled.
    fn self_preservation_term(&self, ctx: &EvalContext<'_>, weight: f64) -> f64 {
        if !ctx.unit.crippled {
            return 1.0;
        }
        let before = self
            .home_edge
            .distance_from(ctx.action.from, self.width, self.height);
        let after = self
            .home_edge
            .distance_from(ctx.action.to, self.width, self.height);
        let moved = f64::from(ctx.action.hexes_moved.max(1));
        let improvement = ((f64::from(before) - f64::from(after)) / moved).clamp(-1.0, 1.0);
        clamp01(weight * (0.5 + 0.5 * improvement))
    }

    // Inverse distance to the nearest unclaimed waypoint in the unit's board
    // quadrant, decayed for destinations this run has already scored often.
    fn strategic_goal_term(&self, ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let quadrant = self.quadrant_of(ctx.destination);
        let unclaimed = |wp: &&HexCoord| {
            !ctx.allies
                .iter()
                .any(|a| a.position.distance(**wp) <= 1)
        };
        let in_quadrant = self
            .waypoints
            .iter()
            .filter(|wp| self.quadrant_of(**wp) == quadrant)
            .filter(unclaimed)
            .min_by_key(|wp| ctx.destination.distance(**wp));
        let target = in_quadrant.or_else(|| {
            self.waypoints
                .iter()
                .filter(unclaimed)
                .min_by_key(|wp| ctx.destination.distance(**wp))
        });
        let Some(target) = target else {
            return clamp01(weight * 0.5);
        };
        let distance = f64::from(ctx.destination.distance(*target));
        let base = 1.0 - (distance / self.max_dimension()).min(1.0);
        clamp01(weight * base / (1.0 + f64::from(ctx.prior_visits)))
    }

    // Composite of line-position quality, optimal spacing, and ally
    // line-of-sight coverage of the destination.
    #[expect(clippy::cast_precision_loss)]
    fn formation_term(&self, ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let spacing = match ctx.nearest_ally_distance() {
            Some(d) => clamp01(1.0 - (d - OPTIMAL_SPACING).abs() / (2.0 * OPTIMAL_SPACING)),
            None => 0.5,
        };
        let line = match (ctx.enemy_median(), ctx.allies.is_empty()) {
            (Some(median), false) => {
                let own = f64::from(ctx.destination.distance(median));
                let mean_ally = ctx
                    .allies
                    .iter()
                    .map(|a| f64::from(a.position.distance(median)))
                    .sum::<f64>()
                    / ctx.allies.len() as f64;
                clamp01(1.0 - (own - mean_ally).abs() / self.max_dimension())
            }
            _ => 0.5,
        };
        let sighted = ctx
            .allies
            .iter()
            .filter(|a| self.terrain.has_line_of_sight(a.position, ctx.destination))
            .count();
        let coverage = if ctx.allies.is_empty() {
            0.0
        } else {
            sighted as f64 / ctx.allies.len() as f64
        };
        clamp01(weight * (line + spacing + coverage) / 3.0)
    }

    // Recon and sniper roles shy away from being seen by many enemies,
    // unless allies cover the destination.
    #[expect(clippy::cast_precision_loss)]
    fn exposure_term(&self, ctx: &EvalContext<'_>, weight: f64) -> f64 {
        if !ctx.unit.role.is_recon() {
            return 1.0;
        }
        let threats = ctx
            .enemies
            .iter()
            .filter(|e| {
                ctx.destination.distance(e.position) <= e.max_weapon_range
                    && self.terrain.has_line_of_sight(e.position, ctx.destination)
            })
            .count();
        let covered = ctx.allies.iter().any(|a| {
            ctx.destination.distance(a.position) <= a.max_weapon_range
                && self.terrain.has_line_of_sight(a.position, ctx.destination)
        });
        let mut base = 1.0 / (1.0 + threats as f64);
        if !covered {
            base *= 0.5;
        }
        clamp01(weight * base)
    }

    // Caution scales with missing health, amplified below 70%.
    fn health_term(ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let health = ctx.action.health_fraction();
        let amplifier = if health < HEALTHY_FRACTION {
            CAUTION_AMPLIFIER
        } else {
            1.0
        };
        clamp01(1.0 - weight * (1.0 - health) * amplifier)
    }

    fn nearby_pressure_term(&self, ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let Some(enemy) = ctx.nearest_enemy() else {
            return clamp01(weight);
        };
        let distance = f64::from(ctx.destination.distance(enemy.position));
        clamp01(weight * (1.0 - (distance / self.max_dimension()).min(1.0)))
    }

    // Distance and directional alignment to the unit's cluster centroid.
    fn swarm_cohesion_term(ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let distance = f64::from(ctx.destination.distance(ctx.cluster_centroid));
        let closeness = 1.0 - (distance / COHESION_RADIUS).min(1.0);
        let desired = ctx.action.from.facing_toward(ctx.cluster_centroid);
        let alignment = 1.0 - f64::from(ctx.action.facing.offset_to(desired)) / 3.0;
        clamp01(weight * (closeness + alignment) / 2.0)
    }

    // Distance to the enemy median plus inverse distances to the closest
    // valid (non-crippled) enemies.
    #[expect(clippy::cast_precision_loss)]
    fn enemy_positioning_term(&self, ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let Some(median) = ctx.enemy_median() else {
            return clamp01(weight * 0.5);
        };
        let closeness =
            1.0 - (f64::from(ctx.destination.distance(median)) / self.max_dimension()).min(1.0);
        let mut distances: Vec<u32> = ctx
            .enemies
            .iter()
            .filter(|e| !e.crippled)
            .map(|e| ctx.destination.distance(e.position))
            .collect();
        distances.sort_unstable();
        distances.truncate(CLOSEST_ENEMY_COUNT);
        if distances.is_empty() {
            return clamp01(weight * 0.5 * closeness);
        }
        let inverse_mean = distances
            .iter()
            .map(|d| 1.0 / (1.0 + f64::from(*d)))
            .sum::<f64>()
            / distances.len() as f64;
        clamp01(weight * (closeness + (2.0 * inverse_mean).min(1.0)) / 2.0)
    }

    // One minus the normalized enemy damage potential at the destination.
    fn expected_damage_term(ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let danger: f64 = ctx
            .enemies
            .iter()
            .map(|e| e.damage_at(ctx.destination.distance(e.position)))
            .sum();
        clamp01(1.0 - weight * (danger / EXPECTED_DAMAGE_SCALE).min(1.0))
    }

    // Allies with both range and line-of-sight on the destination, plus
    // local cover density.
    #[expect(clippy::cast_precision_loss)]
    fn advanced_coverage_term(&self, ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let covering = ctx
            .allies
            .iter()
            .filter(|a| {
                ctx.destination.distance(a.position) <= a.max_weapon_range
                    && self.terrain.has_line_of_sight(a.position, ctx.destination)
            })
            .count();
        let coverage = (covering as f64 / COVERAGE_CAP).min(1.0);
        let density = self.terrain.cover_density(ctx.destination);
        clamp01(weight * (coverage + density) / 2.0)
    }

    // Terrain height, water, building and wood bonuses around the
    // destination.
    fn environment_term(&self, ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let destination = ctx.destination;
        let neighbor_mean = {
            let neighbors = destination.neighbors();
            let total: i32 = neighbors
                .iter()
                .map(|n| self.terrain.elevation_at(*n))
                .sum();
            f64::from(total) / 6.0
        };
        let advantage = f64::from(self.terrain.elevation_at(destination)) - neighbor_mean;
        let height = clamp01(0.5 + advantage / 4.0);
        let wood = if self.terrain.is_wooded(destination) { 0.25 } else { 0.0 };
        let building = if self.terrain.is_building(destination) { 0.25 } else { 0.0 };
        let water = if self.terrain.is_water(destination) { 0.5 } else { 0.0 };
        clamp01(weight * clamp01(0.25 + 0.5 * height + wood + building - water))
    }

    // Weighted count of same-role allies and of enemies within their
    // respective crowding radii.
    #[expect(clippy::cast_precision_loss)]
    fn anti_crowding_term(ctx: &EvalContext<'_>, weight: f64) -> f64 {
        let same_role = ctx
            .allies
            .iter()
            .filter(|a| {
                a.role == ctx.unit.role
                    && ctx.destination.distance(a.position) <= SAME_ROLE_CROWD_RADIUS
            })
            .count();
        let enemies = ctx
            .enemies
            .iter()
            .filter(|e| ctx.destination.distance(e.position) <= ENEMY_CROWD_RADIUS)
            .count();
        clamp01(1.0 - weight * (0.15 * same_role as f64 + 0.1 * enemies as f64))
    }

    fn flank_distance_signal(&self, ctx: &EvalContext<'_>) -> f64 {
        let Some(median) = ctx.enemy_median() else {
            return 0.0;
        };
        clamp01(f64::from(ctx.destination.distance(median)) / self.max_dimension())
    }

    fn aggression_mobility_signal(ctx: &EvalContext<'_>) -> f64 {
        let damage = (ctx.unit.damage_at(ENGAGEMENT_RANGE) / 20.0).min(1.0);
        let mobility = f64::from(ctx.action.hexes_moved.min(10)) / 10.0;
        clamp01(0.5 * damage + 0.5 * mobility)
    }

    fn quadrant_of(&self, coord: HexCoord) -> (bool, bool) {
        #[expect(clippy::cast_possible_wrap)]
        let (mid_x, mid_y) = ((self.width / 2) as i32, (self.height / 2) as i32);
        (coord.x < mid_x, coord.y < mid_y)
    }
}

impl CostFunction for TacticalCostFunction {
    fn parameter_count(&self) -> usize {
        self.layout.len()
    }

    fn resolve(
        &mut self,
        action: &CandidateAction,
        states: &UnitStates,
        params: &ParameterVector,
    ) -> f64 {
        1.0 - self.utility(action, states, params)
    }
}

/// Snapshot context shared by all term computations of one evaluation.
struct EvalContext<'a> {
    unit: &'a UnitSnapshot,
    action: &'a CandidateAction,
    destination: HexCoord,
    enemies: &'a [&'a UnitSnapshot],
    allies: &'a [&'a UnitSnapshot],
    cluster_centroid: HexCoord,
    prior_visits: u32,
}

impl EvalContext<'_> {
    fn nearest_enemy(&self) -> Option<&UnitSnapshot> {
        self.enemies
            .iter()
            .min_by_key(|e| self.destination.distance(e.position))
            .copied()
    }

    fn nearest_ally_distance(&self) -> Option<f64> {
        self.allies
            .iter()
            .map(|a| self.destination.distance(a.position))
            .min()
            .map(f64::from)
    }

    /// Component-wise median of enemy positions.
    fn enemy_median(&self) -> Option<HexCoord> {
        if self.enemies.is_empty() {
            return None;
        }
        let mut xs: Vec<i32> = self.enemies.iter().map(|e| e.position.x).collect();
        let mut ys: Vec<i32> = self.enemies.iter().map(|e| e.position.y).collect();
        xs.sort_unstable();
        ys.sort_unstable();
        Some(HexCoord::new(xs[xs.len() / 2], ys[ys.len() / 2]))
    }
}

/// Transition-aware variant: folds the realized damage swing between the
/// current and next snapshots into the utility.
///
/// Implements only [`TransitionCostFunction`]; there is no state-only entry
/// point to misuse.
#[derive(Debug, Clone)]
pub struct TransitionTacticalCostFunction {
    inner: TacticalCostFunction,
    damage_swing: WeightTag,
}

impl TransitionTacticalCostFunction {
    /// # Panics
    ///
    /// Panics if the board has zero area.
    #[must_use]
    pub fn new(board: &dyn Board, home_edge: BoardEdge) -> Self {
        let mut layout = WeightLayout::new();
        let tags = TermTags::register(&mut layout);
        let damage_swing = layout.slot("damage-swing");
        let waypoints = default_waypoints(board.width(), board.height());
        let inner = TacticalCostFunction::from_parts(layout, tags, board, home_edge, waypoints);
        Self {
            inner,
            damage_swing,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &WeightLayout {
        self.inner.layout()
    }

    /// Net normalized health swing in the acting side's favor, in `[-1, 1]`.
    fn realized_swing(owner: u32, states: &UnitStates, next_states: &UnitStates) -> f64 {
        let mut enemy_loss = 0.0;
        let mut friendly_loss = 0.0;
        for (id, before) in states {
            let Some(after) = next_states.get(id) else {
                continue;
            };
            let loss = (before.health_fraction() - after.health_fraction()).max(0.0);
            if before.owner == owner {
                friendly_loss += loss;
            } else {
                enemy_loss += loss;
            }
        }
        (enemy_loss - friendly_loss).clamp(-1.0, 1.0)
    }
}

impl TransitionCostFunction for TransitionTacticalCostFunction {
    fn parameter_count(&self) -> usize {
        self.inner.layout.len()
    }

    fn resolve_transition(
        &mut self,
        action: &CandidateAction,
        states: &UnitStates,
        next_states: &UnitStates,
        params: &ParameterVector,
    ) -> f64 {
        let Some(unit) = states.get(&action.unit_id) else {
            panic!("acting unit {} missing from state snapshot", action.unit_id);
        };
        let owner = unit.owner;
        let utility = self.inner.utility(action, states, params);
        let swing = Self::realized_swing(owner, states, next_states);
        let weight = params.get_tag(self.damage_swing);
        1.0 - clamp01(utility * (1.0 + weight * swing))
    }
}

fn default_waypoints(width: u32, height: u32) -> Vec<HexCoord> {
    #[expect(clippy::cast_possible_wrap)]
    let (w, h) = (width as i32, height as i32);
    vec![
        HexCoord::new(w / 4, h / 4),
        HexCoord::new(3 * w / 4, h / 4),
        HexCoord::new(w / 4, 3 * h / 4),
        HexCoord::new(3 * w / 4, 3 * h / 4),
    ]
}

#[cfg(test)]
mod tests {
    use hexmind_engine::{Facing, GridBoard};

    use super::*;

    fn unit(id: u32, owner: u32, role: UnitRole, position: HexCoord) -> UnitSnapshot {
        UnitSnapshot {
            id,
            position,
            facing: Facing::North,
            owner,
            role,
            armor_fraction: 1.0,
            internal_fraction: 1.0,
            max_weapon_range: 8,
            max_damage: 15.0,
            crippled: false,
            jump_capable: false,
        }
    }

    fn fixture() -> (TacticalCostFunction, CandidateAction, UnitStates) {
        let board = GridBoard::flat(10, 10).unwrap();
        let cost = TacticalCostFunction::new(&board, BoardEdge::North);
        let attacker = unit(1, 0, UnitRole::Brawler, HexCoord::new(0, 0));
        let enemy = unit(2, 1, UnitRole::Brawler, HexCoord::new(5, 5));
        let action = CandidateAction::stay(1, HexCoord::new(0, 0), Facing::SouthEast);
        let states: UnitStates = [(1, attacker), (2, enemy)].into_iter().collect();
        (cost, action, states)
    }

    #[test]
    fn test_all_ones_geometric_mean_is_one() {
        let terms = [1.0; 17];
        assert!((floored_geometric_mean(&terms) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_floor_prevents_log_of_zero() {
        let mut terms = [1.0; 17];
        terms[3] = 0.0;
        let mean = floored_geometric_mean(&terms);
        assert!(mean.is_finite());
        assert!(mean > 0.0);
        assert!((mean - TERM_FLOOR.powf(1.0 / 17.0)).abs() < 1e-12);
    }

    #[test]
    fn test_behavior_classification() {
        let scout = unit(1, 0, UnitRole::Scout, HexCoord::new(0, 0));
        assert_eq!(BehaviorState::classify(&scout), BehaviorState::Scouting);

        let healthy_bruiser = unit(2, 0, UnitRole::Brawler, HexCoord::new(0, 0));
        assert_eq!(
            BehaviorState::classify(&healthy_bruiser),
            BehaviorState::Aggressive
        );

        let mut hurt = unit(3, 0, UnitRole::Brawler, HexCoord::new(0, 0));
        hurt.armor_fraction = 0.2;
        hurt.internal_fraction = 0.5;
        assert_eq!(BehaviorState::classify(&hurt), BehaviorState::Defensive);

        let mut toothless = unit(4, 0, UnitRole::MissileBoat, HexCoord::new(0, 0));
        toothless.max_damage = 5.0;
        assert_eq!(BehaviorState::classify(&toothless), BehaviorState::Defensive);
    }

    #[test]
    fn test_resolve_is_bounded_and_deterministic() {
        let params = ParameterVector::from(vec![0.5; 20]);
        let (mut first, action, states) = fixture();
        let a = first.resolve(&action, &states, &params);
        let (mut second, _, _) = fixture();
        let b = second.resolve(&action, &states, &params);
        assert!((0.0..=1.0).contains(&a), "cost {a} out of bounds");
        assert!((a - b).abs() < 1e-12, "fresh instances disagree: {a} vs {b}");
    }

    #[test]
    fn test_utility_complements_cost() {
        let params = ParameterVector::from(vec![0.5; 20]);
        let (mut cost, action, states) = fixture();
        let utility = cost.utility(&action, &states, &params);
        let (mut other, _, _) = fixture();
        let resolved = other.resolve(&action, &states, &params);
        assert!((utility + resolved - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parameter_count_covers_terms_and_bonuses() {
        let (cost, _, _) = fixture();
        assert_eq!(CostFunction::parameter_count(&cost), 20);
        assert_eq!(cost.layout().names().len(), 20);
    }

    #[test]
    fn test_closing_distance_scores_better_than_retreating() {
        let params = ParameterVector::from(vec![0.5; 20]);
        let (mut cost, _, states) = fixture();

        let mut closing = CandidateAction::stay(1, HexCoord::new(0, 0), Facing::SouthEast);
        closing.to = HexCoord::new(3, 3);
        closing.hexes_moved = 5;
        let toward = cost.utility(&closing, &states, &params);

        let (mut cost, _, _) = fixture();
        let staying = CandidateAction::stay(1, HexCoord::new(0, 0), Facing::SouthEast);
        let away = cost.utility(&staying, &states, &params);
        assert!(
            toward > away,
            "closing utility {toward} should beat staying {away}"
        );
    }

    #[test]
    #[should_panic(expected = "missing from state snapshot")]
    fn test_missing_acting_unit_is_fatal() {
        let params = ParameterVector::from(vec![0.5; 20]);
        let (mut cost, action, _) = fixture();
        let _ = cost.resolve(&action, &UnitStates::new(), &params);
    }

    #[test]
    fn test_transition_function_has_extra_slot() {
        let board = GridBoard::flat(10, 10).unwrap();
        let cost = TransitionTacticalCostFunction::new(&board, BoardEdge::North);
        assert_eq!(TransitionCostFunction::parameter_count(&cost), 21);
        assert_eq!(cost.layout().names().last().unwrap(), "damage-swing");
    }

    #[test]
    fn test_damage_swing_rewards_enemy_losses() {
        let board = GridBoard::flat(10, 10).unwrap();
        let params = ParameterVector::from(vec![0.5; 21]);
        let attacker = unit(1, 0, UnitRole::Brawler, HexCoord::new(0, 0));
        let enemy = unit(2, 1, UnitRole::Brawler, HexCoord::new(5, 5));
        let states: UnitStates = [(1, attacker), (2, enemy.clone())].into_iter().collect();
        let action = CandidateAction::stay(1, HexCoord::new(0, 0), Facing::SouthEast);

        let mut hurt_enemy = enemy;
        hurt_enemy.armor_fraction = 0.2;
        let mut next_states = states.clone();
        next_states.insert(2, hurt_enemy);

        let mut cost = TransitionTacticalCostFunction::new(&board, BoardEdge::North);
        let with_swing = cost.resolve_transition(&action, &states, &next_states, &params);
        let mut cost = TransitionTacticalCostFunction::new(&board, BoardEdge::North);
        let without = cost.resolve_transition(&action, &states, &states, &params);
        assert!(
            with_swing < without,
            "damaging the enemy should lower the cost ({with_swing} vs {without})"
        );
    }
}

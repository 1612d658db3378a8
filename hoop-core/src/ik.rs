//! Jacobian pseudo-inverse inverse kinematics for a two-armed figure.
//!
//! ## Degrees of freedom
//!
//! Each arm carries its own 10-element DOF vector:
//!
//! | index | joint    | meaning                 | articulation      |
//! |-------|----------|-------------------------|-------------------|
//! | 0..3  | root     | translation x, y, z     | `T(x, y, z)`      |
//! | 3..6  | shoulder | rotation about x, y, z  | `Rz * Ry * Rx`    |
//! | 6..8  | elbow    | rotation about x, y     | `Ry * Rx`         |
//! | 8..10 | wrist    | rotation about y, z     | `Rz * Ry`         |
//!
//! The root arc is shared by both arms and follows the right arm's vector.
//!
//! ## Solve loop
//!
//! Per call and per arm: if the goal is far away while shooting, take one
//! coarse step toward a resting target below the shoulder and stop.
//! Otherwise, up to `max_iterations` times:
//!
//! ```text
//! J   = finite-difference Jacobian (3x10, disabled columns zero)
//! J⁺  = Jᵀ(JJᵀ + λ²I)⁻¹, or Jᵀ if that is numerically singular
//! dθ  = J⁺ * (step * (goal - end_effector))
//! θ  += dθ, rebuild articulations, recompute end effector
//! ```
//!
//! stopping early once the error drops to `epsilon`. Running out of
//! iterations is a normal outcome, reported in [`IkOutcome`].

use nalgebra::{SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{SimError, SimResult};
use crate::linalg::{self, origin_of, pseudo_inverse, Mat4};
use crate::render::{DrawSink, ShapeKind};
use crate::skeleton::{ArcId, Skeleton};
use crate::types::Vec3;

pub const DOF_COUNT: usize = 10;

pub type DofVector = SVector<f64, DOF_COUNT>;
pub type Jacobian = SMatrix<f64, 3, DOF_COUNT>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Limb {
    Right,
    Left,
}

impl Limb {
    pub const BOTH: [Limb; 2] = [Limb::Right, Limb::Left];

    /// +1 for the right arm, -1 for the left (mirrors x offsets).
    pub fn side(self) -> f64 {
        match self {
            Limb::Right => 1.0,
            Limb::Left => -1.0,
        }
    }

    fn slot(self) -> usize {
        match self {
            Limb::Right => 0,
            Limb::Left => 1,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Limb::Right => "r",
            Limb::Left => "l",
        }
    }
}

/// Which DOF columns of the Jacobian are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DofMask(pub [bool; DOF_COUNT]);

impl Default for DofMask {
    /// Root translation and elbow twist off, everything else on.
    fn default() -> Self {
        let mut enabled = [true; DOF_COUNT];
        for i in [0, 1, 2, 6] {
            enabled[i] = false;
        }
        Self(enabled)
    }
}

impl DofMask {
    pub fn is_enabled(&self, dof: usize) -> bool {
        self.0.get(dof).copied().unwrap_or(false)
    }

    pub fn enabled_count(&self) -> usize {
        self.0.iter().filter(|&&on| on).count()
    }

    /// Zero every disabled column.
    pub fn apply(&self, jacobian: &mut Jacobian) {
        for (i, on) in self.0.iter().enumerate() {
            if !on {
                jacobian.column_mut(i).fill(0.0);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IkConfig {
    /// Converged once the end effector is this close to the goal
    pub epsilon: f64,
    pub max_iterations: usize,
    /// Fraction of the positional error requested per iteration
    pub step: f64,
    /// Finite-difference perturbation per DOF
    pub fd_delta: f64,
    /// Damping λ of the pseudo-inverse; bounds the DOF change near a straight arm
    pub damping: f64,
    /// Error above which a shooting arm takes the coarse recovery step
    pub recovery_threshold: f64,
    /// Recovery target relative to the root location (x mirrored for the left arm)
    pub recovery_offset: Vec3,
    pub mask: DofMask,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.001,
            max_iterations: 10,
            step: 0.001,
            fd_delta: 0.001,
            damping: 0.1,
            recovery_threshold: 2.0,
            recovery_offset: Vec3::new(3.0, -10.0, 0.0),
            mask: DofMask::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IkStatus {
    /// Error at or below epsilon
    Converged,
    /// Iteration budget spent; best-effort pose kept
    IterationLimit,
    /// Coarse recovery step taken instead of solving
    Recovery,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkOutcome {
    pub status: IkStatus,
    pub iterations: usize,
    /// Distance to the goal after the call
    pub error: f64,
}

/// Articulation matrices `[root, shoulder, elbow, wrist]` for a DOF vector.
pub fn articulations(dofs: &DofVector) -> [Mat4; 4] {
    [
        linalg::translation(dofs[0], dofs[1], dofs[2]),
        linalg::rotation_z(dofs[5]) * linalg::rotation_y(dofs[4]) * linalg::rotation_x(dofs[3]),
        linalg::rotation_y(dofs[7]) * linalg::rotation_x(dofs[6]),
        linalg::rotation_z(dofs[9]) * linalg::rotation_y(dofs[8]),
    ]
}

/// The arcs of one arm and the fixed matrices its forward kinematics needs.
#[derive(Debug, Clone, PartialEq)]
pub struct LimbChain {
    /// `[root, shoulder, elbow, wrist]`
    pub arcs: [ArcId; 4],
    locations: [Mat4; 4],
    hand_transform: Mat4,
}

impl LimbChain {
    /// Look the arm's arcs and hand node up by name.
    pub fn resolve(skeleton: &Skeleton, limb: Limb) -> SimResult<Self> {
        let p = limb.prefix();
        let names = [
            "root".to_string(),
            format!("{p}_shoulder"),
            format!("{p}_elbow"),
            format!("{p}_wrist"),
        ];

        let mut arcs = [ArcId(0); 4];
        let mut locations = [Mat4::identity(); 4];
        for (k, name) in names.iter().enumerate() {
            let id = skeleton
                .find_arc(name)
                .ok_or_else(|| SimError::NotFound(format!("arc '{name}'")))?;
            let arc = skeleton
                .arc(id)
                .ok_or_else(|| SimError::NotFound(format!("arc '{name}'")))?;
            arcs[k] = id;
            locations[k] = arc.location;
        }

        let hand_name = format!("{p}_hand");
        let hand_transform = skeleton
            .find_node(&hand_name)
            .and_then(|id| skeleton.node(id))
            .map(|n| n.transform)
            .ok_or_else(|| SimError::NotFound(format!("node '{hand_name}'")))?;

        Ok(Self {
            arcs,
            locations,
            hand_transform,
        })
    }

    /// Hand position for the given articulations.
    pub fn end_effector(&self, articulation: &[Mat4; 4]) -> Vec3 {
        let m = self
            .locations
            .iter()
            .zip(articulation)
            .fold(Mat4::identity(), |acc, (l, a)| acc * l * a);
        origin_of(&(m * self.hand_transform))
    }

    pub fn root_location(&self) -> Vec3 {
        origin_of(&self.locations[0])
    }
}

/// Humanoid figure: torso, head, two arms, two legs.
///
/// Torso origin 3.5 above the floor, arms along x, legs along -y.
pub fn humanoid_skeleton() -> Skeleton {
    use linalg::{scale, translation};

    let mut sk = Skeleton::new();
    let sphere = ShapeKind::Sphere;

    let torso = sk.add_node("torso", sphere, scale(0.8, 1.5, 0.7));
    sk.add_arc("root", None, torso, translation(0.0, 3.5, 2.0));

    let head = sk.add_node("head", sphere, translation(0.0, 0.7, 0.0) * scale(0.7, 0.7, 0.7));
    sk.add_arc("neck", Some(torso), head, translation(0.0, 1.5, 0.0));

    for limb in Limb::BOTH {
        let p = limb.prefix();
        let s = limb.side();

        let upper = sk.add_node(
            &format!("{p}u_arm"),
            sphere,
            translation(s * 1.2, 0.0, 0.0) * scale(1.2, 0.2, 0.2),
        );
        sk.add_arc(&format!("{p}_shoulder"), Some(torso), upper, translation(s * 0.6, 1.1, 0.0));

        let lower = sk.add_node(
            &format!("{p}l_arm"),
            sphere,
            translation(s * 1.0, 0.0, 0.0) * scale(1.0, 0.2, 0.2),
        );
        sk.add_arc(&format!("{p}_elbow"), Some(upper), lower, translation(s * 2.4, 0.0, 0.0));

        let hand = sk.add_node(
            &format!("{p}_hand"),
            sphere,
            translation(s * 0.4, 0.0, 0.0) * scale(0.4, 0.3, 0.2),
        );
        sk.add_arc(&format!("{p}_wrist"), Some(lower), hand, translation(s * 2.0, 0.0, 0.0));
    }

    for limb in Limb::BOTH {
        let p = limb.prefix();
        let s = limb.side();

        let leg = sk.add_node(
            &format!("{p}u_leg"),
            sphere,
            translation(0.0, -0.5, 0.0) * scale(0.3, 1.0, 0.3),
        );
        sk.add_arc(&format!("{p}_hip"), Some(torso), leg, translation(s * 0.4, -1.75, 0.0));

        let foot = sk.add_node(
            &format!("{p}_foot"),
            sphere,
            translation(0.0, -0.2, 0.0) * scale(0.3, 0.2, 0.4),
        );
        sk.add_arc(&format!("{p}_ankle"), Some(leg), foot, translation(0.0, -1.4, 0.0));
    }

    sk
}

/// The figure plus per-arm DOF state and cached end effectors.
///
/// Articulation matrices are only ever derived from the DOF vectors; every
/// mutation goes through [`ArticulatedHuman::set_dofs`] or the solver, both
/// of which rebuild them.
#[derive(Debug, Clone)]
pub struct ArticulatedHuman {
    skeleton: Skeleton,
    chains: [LimbChain; 2],
    dofs: [DofVector; 2],
    end_effectors: [Vec3; 2],
    pub config: IkConfig,
}

impl ArticulatedHuman {
    pub fn new(config: IkConfig) -> SimResult<Self> {
        let skeleton = humanoid_skeleton();
        let chains = [
            LimbChain::resolve(&skeleton, Limb::Right)?,
            LimbChain::resolve(&skeleton, Limb::Left)?,
        ];
        let mut human = Self {
            skeleton,
            chains,
            dofs: [DofVector::zeros(); 2],
            end_effectors: [Vec3::ZERO; 2],
            config,
        };
        human.refresh();
        Ok(human)
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn dofs(&self, limb: Limb) -> &DofVector {
        &self.dofs[limb.slot()]
    }

    pub fn set_dofs(&mut self, limb: Limb, dofs: DofVector) {
        self.dofs[limb.slot()] = dofs;
        self.refresh();
    }

    /// Cached hand position, always consistent with the current DOFs.
    pub fn end_effector(&self, limb: Limb) -> Vec3 {
        self.end_effectors[limb.slot()]
    }

    /// Hand position for a hypothetical DOF vector of `limb`.
    ///
    /// The left arm sees the shared root as driven by the right arm.
    pub fn forward(&self, limb: Limb, dofs: &DofVector) -> Vec3 {
        let mut articulation = articulations(dofs);
        if limb == Limb::Left {
            articulation[0] = articulations(&self.dofs[Limb::Right.slot()])[0];
        }
        self.chains[limb.slot()].end_effector(&articulation)
    }

    /// Finite-difference Jacobian of the hand position for `limb`.
    pub fn jacobian(&self, limb: Limb) -> Jacobian {
        let slot = limb.slot();
        let base = self.end_effectors[slot];
        let delta = self.config.fd_delta;
        let mut j = Jacobian::zeros();

        for i in (0..DOF_COUNT).filter(|&i| self.config.mask.is_enabled(i)) {
            let mut perturbed = self.dofs[slot];
            perturbed[i] += delta;
            let column = (self.forward(limb, &perturbed) - base) / delta;
            j.set_column(i, &Vector3::from(column));
        }
        j
    }

    /// Solve both arms toward `goal`, right first.
    pub fn update(&mut self, goal: Vec3, shooting: bool) -> [IkOutcome; 2] {
        [
            self.update_limb(Limb::Right, goal, shooting),
            self.update_limb(Limb::Left, goal, shooting),
        ]
    }

    /// One bounded solve of `limb` toward `goal`.
    pub fn update_limb(&mut self, limb: Limb, goal: Vec3, shooting: bool) -> IkOutcome {
        let slot = limb.slot();
        let mut error = goal.distance(&self.end_effectors[slot]);

        if shooting && error > self.config.recovery_threshold {
            self.move_hand_down(limb);
            return IkOutcome {
                status: IkStatus::Recovery,
                iterations: 1,
                error: goal.distance(&self.end_effectors[slot]),
            };
        }

        let mut iterations = 0;
        while error > self.config.epsilon && iterations < self.config.max_iterations {
            self.step_toward(limb, goal);
            error = goal.distance(&self.end_effectors[slot]);
            iterations += 1;
        }

        let status = if error <= self.config.epsilon {
            IkStatus::Converged
        } else {
            IkStatus::IterationLimit
        };
        trace!(?limb, iterations, error, ?status, "IK solve");

        IkOutcome {
            status,
            iterations,
            error,
        }
    }

    /// Coarse recovery: one step of the arm's own hand toward a point below
    /// and outside its shoulder.
    pub fn move_hand_down(&mut self, limb: Limb) {
        let target = self.recovery_target(limb);
        warn!(?limb, ?target, "IK goal out of reach while shooting, lowering hand");
        self.step_toward(limb, target);
    }

    /// Root location plus the configured offset, x mirrored per side.
    pub fn recovery_target(&self, limb: Limb) -> Vec3 {
        let offset = self.config.recovery_offset;
        self.chains[limb.slot()].root_location() + Vec3::new(limb.side() * offset.x, offset.y, offset.z)
    }

    /// Draw the figure with its current articulations.
    pub fn draw(&self, sink: &mut dyn DrawSink) {
        self.skeleton.draw(sink);
    }

    fn step_toward(&mut self, limb: Limb, target: Vec3) {
        let slot = limb.slot();
        let dx = (target - self.end_effectors[slot]) * self.config.step;
        let j_inv = pseudo_inverse(&self.jacobian(limb), self.config.damping);
        let dtheta = j_inv * Vector3::from(dx);
        self.dofs[slot] += dtheta;
        self.refresh();
    }

    /// Rebuild articulation matrices from DOFs and recompute end effectors.
    fn refresh(&mut self) {
        for limb in Limb::BOTH {
            let slot = limb.slot();
            let [root, shoulder, elbow, wrist] = articulations(&self.dofs[slot]);
            let arcs = self.chains[slot].arcs;
            if limb == Limb::Right {
                self.skeleton.set_articulation(arcs[0], root);
            }
            self.skeleton.set_articulation(arcs[1], shoulder);
            self.skeleton.set_articulation(arcs[2], elbow);
            self.skeleton.set_articulation(arcs[3], wrist);
        }
        for limb in Limb::BOTH {
            let ee = self.forward(limb, &self.dofs[limb.slot()]);
            self.end_effectors[limb.slot()] = ee;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawList;
    use approx::assert_relative_eq;

    fn human() -> ArticulatedHuman {
        ArticulatedHuman::new(IkConfig::default()).unwrap()
    }

    /// Shoulder raised and elbow bent: away from the straight-arm singularity.
    fn bent(limb: Limb) -> ArticulatedHuman {
        let mut h = human();
        let mut dofs = DofVector::zeros();
        dofs[5] = 0.3 * limb.side();
        dofs[7] = 0.5;
        h.set_dofs(limb, dofs);
        h
    }

    #[test]
    fn test_rest_pose_end_effectors() {
        let h = human();
        let r = h.end_effector(Limb::Right);
        let l = h.end_effector(Limb::Left);

        assert_relative_eq!(r.x, 5.4, epsilon = 1e-12);
        assert_relative_eq!(r.y, 4.6, epsilon = 1e-12);
        assert_relative_eq!(r.z, 2.0, epsilon = 1e-12);
        assert_relative_eq!(l.x, -5.4, epsilon = 1e-12);
        assert_relative_eq!(l.y, 4.6, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_dofs_give_identity_articulations() {
        for m in articulations(&DofVector::zeros()) {
            assert_eq!(m, Mat4::identity());
        }
    }

    #[test]
    fn test_shoulder_columns_match_rotation_axes() {
        let h = human();
        let j = h.jacobian(Limb::Right);

        // Hand sits 4.8 m along +x from the shoulder; a rotation column is
        // the rotation axis crossed with that lever
        let lever = Vec3::new(4.8, 0.0, 0.0);
        let about_z = Vec3::new(0.0, 0.0, 1.0).cross(&lever);
        let about_y = Vec3::new(0.0, 1.0, 0.0).cross(&lever);
        assert_relative_eq!(j[(1, 5)], about_z.y, epsilon = 1e-2);
        assert_relative_eq!(j[(2, 4)], about_y.z, epsilon = 1e-2);
        assert!(j[(0, 5)].abs() < 1e-2);
    }

    #[test]
    fn test_disabled_columns_are_zero() {
        let h = bent(Limb::Right);
        let j = h.jacobian(Limb::Right);

        for i in [0, 1, 2, 6] {
            assert!(j.column(i).iter().all(|&v| v == 0.0), "Column {} should be disabled", i);
        }
        assert!(j.column(7).norm() > 0.1);
        assert_eq!(h.config.mask.enabled_count(), 6);
    }

    #[test]
    fn test_mask_apply_zeroes_columns() {
        let mut j = Jacobian::from_element(1.0);
        DofMask::default().apply(&mut j);
        assert_eq!(j.column(0).sum(), 0.0);
        assert_eq!(j.column(6).sum(), 0.0);
        assert_eq!(j.column(3).sum(), 3.0);
        assert!(!DofMask::default().is_enabled(42));
    }

    #[test]
    fn test_error_never_increases() {
        for limb in Limb::BOTH {
            let mut h = bent(limb);
            let goal = h.end_effector(limb) + Vec3::new(0.2, -0.1, 0.15);
            let initial = goal.distance(&h.end_effector(limb));
            let mut previous = initial;

            for _ in 0..100 {
                let outcome = h.update_limb(limb, goal, false);
                assert_eq!(outcome.status, IkStatus::IterationLimit);
                assert!(
                    outcome.error <= previous + 1e-9,
                    "{:?} error grew: {} -> {}",
                    limb,
                    previous,
                    outcome.error
                );
                previous = outcome.error;
            }

            assert!(previous < 0.5 * initial, "{:?}: {} -> {}", limb, initial, previous);
        }
    }

    #[test]
    fn test_straight_arm_solve_stays_bounded() {
        // Rest pose: the arm lies along x and the Jacobian's x row is nearly
        // dependent on the other two
        let mut h = human();
        let limb = Limb::Right;
        let goal = h.end_effector(limb) + Vec3::new(-0.5, 0.3, 0.2);
        let initial = goal.distance(&h.end_effector(limb));
        let mut previous = initial;

        for call in 0..50 {
            let outcome = h.update_limb(limb, goal, false);
            assert!(
                outcome.error <= previous * (1.0 + h.config.step) + 1e-9,
                "call {}: error grew {} -> {}",
                call,
                previous,
                outcome.error
            );
            assert!(
                h.dofs(limb).iter().all(|d| d.abs() < std::f64::consts::PI),
                "call {}: DOFs ran away: {:?}",
                call,
                h.dofs(limb)
            );
            previous = outcome.error;
        }

        assert!(previous < initial, "{} -> {}", initial, previous);
    }

    #[test]
    fn test_reaches_nearby_goal() {
        let mut h = bent(Limb::Right);
        let goal = h.end_effector(Limb::Right) + Vec3::new(-0.1, 0.1, 0.05);

        let mut last = None;
        for _ in 0..2_000 {
            let outcome = h.update_limb(Limb::Right, goal, false);
            last = Some(outcome);
            if outcome.status == IkStatus::Converged {
                break;
            }
        }

        let outcome = last.unwrap();
        assert_eq!(outcome.status, IkStatus::Converged);
        assert!(outcome.error <= 0.001);
        assert!(goal.distance(&h.end_effector(Limb::Right)) <= 0.001);
    }

    #[test]
    fn test_goal_at_hand_needs_no_iterations() {
        let mut h = bent(Limb::Left);
        let goal = h.end_effector(Limb::Left);
        let outcome = h.update_limb(Limb::Left, goal, true);
        assert_eq!(outcome.status, IkStatus::Converged);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_masked_dofs_stay_fixed() {
        for limb in Limb::BOTH {
            let mut h = bent(limb);
            let goal = h.end_effector(limb) + Vec3::new(0.3, 0.3, 0.0);
            for _ in 0..20 {
                h.update_limb(limb, goal, false);
            }
            for i in [0, 1, 2, 6] {
                assert_eq!(h.dofs(limb)[i], 0.0, "{:?} DOF {} moved", limb, i);
            }
            assert_ne!(h.dofs(limb)[4], 0.0);
        }
    }

    #[test]
    fn test_recovery_moves_hand_toward_rest_target() {
        for limb in Limb::BOTH {
            let mut h = bent(limb);
            let target = h.recovery_target(limb);
            assert_relative_eq!(target.x, 3.0 * limb.side(), epsilon = 1e-12);
            assert_relative_eq!(target.y, -6.5, epsilon = 1e-12);

            let before = target.distance(&h.end_effector(limb));
            let far_goal = Vec3::new(0.0, 30.0, -8.8);
            let outcome = h.update_limb(limb, far_goal, true);

            assert_eq!(outcome.status, IkStatus::Recovery);
            let after = target.distance(&h.end_effector(limb));
            assert!(after < before, "{:?}: {} -> {}", limb, before, after);
        }
    }

    #[test]
    fn test_far_goal_without_shooting_iterates() {
        let mut h = bent(Limb::Right);
        let outcome = h.update_limb(Limb::Right, Vec3::new(0.0, 30.0, -8.8), false);
        assert_eq!(outcome.status, IkStatus::IterationLimit);
        assert_eq!(outcome.iterations, 10);
    }

    #[test]
    fn test_skeleton_follows_dofs() {
        let h = bent(Limb::Right);
        let shoulder = h.chains[0].arcs[1];
        let expected = articulations(h.dofs(Limb::Right))[1];
        assert_eq!(h.skeleton().arc(shoulder).unwrap().articulation, expected);

        let mut list = DrawList::new();
        h.draw(&mut list);
        assert_eq!(list.count(ShapeKind::Sphere), 12);
    }

    #[test]
    fn test_hand_node_matches_end_effector() {
        let h = bent(Limb::Left);
        let hand = h.skeleton().find_node("l_hand").unwrap();
        let world = h
            .skeleton()
            .world_transforms()
            .into_iter()
            .find(|(id, _)| *id == hand)
            .map(|(_, m)| origin_of(&m))
            .unwrap();
        let ee = h.end_effector(Limb::Left);
        assert_relative_eq!(world.x, ee.x, epsilon = 1e-12);
        assert_relative_eq!(world.y, ee.y, epsilon = 1e-12);
        assert_relative_eq!(world.z, ee.z, epsilon = 1e-12);
    }
}

//! The hoop net: a tapered cylindrical lattice hanging from the rim.
//!
//! ```text
//!   row 0   ●───●───●───●   rim (pinned)
//!           │ ╲ │ ╱ │ ╲ │
//!   row 1    ●──●───●──●
//!            │ ╳ │ ╳ │        structural: ring + vertical
//!   row 2     ●─●───●─●       shear: both quad diagonals
//! ```
//!
//! Each row is a ring of `segments` particles whose radius shrinks by
//! `taper` per row. Rest lengths are the as-built distances, so the lattice
//! starts unstressed and only sags under gravity during the settling pass.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{SimError, SimResult};
use crate::forces::GroundContact;
use crate::mass_spring::Simulation;
use crate::types::Vec3;

/// Hoop net lattice parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    pub rim_center: Vec3,
    pub rim_radius: f64,
    /// Rings including the pinned rim
    pub rows: usize,
    /// Particles per ring
    pub segments: usize,
    /// Vertical distance between rings
    pub row_spacing: f64,
    /// Radius multiplier from one ring to the next
    pub taper: f64,
    pub particle_mass: f64,
    pub ks: f64,
    pub kd: f64,
    pub ground: GroundContact,
    pub settle_steps: usize,
    pub settle_dt: f64,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            rim_center: Vec3::new(0.0, 6.5, -8.8),
            rim_radius: 0.75,
            rows: 8,
            segments: 12,
            row_spacing: 0.18,
            taper: 0.85,
            particle_mass: 0.05,
            ks: 400.0,
            kd: 2.0,
            ground: GroundContact::default(),
            settle_steps: 10_000,
            settle_dt: 0.001,
        }
    }
}

/// A settled hoop net with its rim pinned.
#[derive(Debug, Clone)]
pub struct HoopNet {
    sim: Simulation,
    pinned: Vec<usize>,
    segments: usize,
}

impl HoopNet {
    /// Build the lattice and run the settling pass.
    pub fn build(config: &NetConfig, gravity: Vec3) -> SimResult<Self> {
        let mut net = Self::unsettled(config, gravity)?;
        net.settle(config.settle_steps, config.settle_dt)?;
        Ok(net)
    }

    /// Build the lattice in its as-constructed shape without settling.
    pub fn unsettled(config: &NetConfig, gravity: Vec3) -> SimResult<Self> {
        let rows = config.rows;
        let segments = config.segments;
        if rows < 2 || segments < 3 {
            return Err(SimError::InvalidNet { rows, segments });
        }

        let idx = |r: usize, s: usize| r * segments + (s % segments);

        let mut sim = Simulation::new(gravity, config.ground);
        sim.create_particles(rows * segments);

        let mut radius = config.rim_radius;
        for r in 0..rows {
            let y = -(r as f64) * config.row_spacing;
            for s in 0..segments {
                let theta = TAU * s as f64 / segments as f64;
                let offset = Vec3::new(radius * theta.cos(), y, radius * theta.sin());
                sim.set_particle(idx(r, s), config.particle_mass, config.rim_center + offset, Vec3::ZERO)?;
            }
            radius *= config.taper;
        }

        let mut pairs = Vec::with_capacity(rows * segments + 3 * (rows - 1) * segments);
        for r in 0..rows {
            for s in 0..segments {
                pairs.push((idx(r, s), idx(r, s + 1)));
                if r + 1 < rows {
                    pairs.push((idx(r, s), idx(r + 1, s)));
                    pairs.push((idx(r, s), idx(r + 1, s + 1)));
                    pairs.push((idx(r, s + 1), idx(r + 1, s)));
                }
            }
        }

        sim.create_springs(pairs.len());
        for (k, &(a, b)) in pairs.iter().enumerate() {
            let rest = sim.particles()[a].pos.distance(&sim.particles()[b].pos);
            sim.set_spring(k, a, b, config.ks, config.kd, rest)?;
        }

        Ok(Self {
            sim,
            pinned: (0..segments).collect(),
            segments,
        })
    }

    /// Relax with the rim pinned.
    pub fn settle(&mut self, steps: usize, dt: f64) -> SimResult<()> {
        self.sim.settle(steps, dt, &self.pinned)?;
        info!(steps, "Hoop net settled");
        Ok(())
    }

    /// One sub-step with the rim pinned.
    pub fn step(&mut self, dt: f64) -> SimResult<()> {
        self.sim.step(dt, &self.pinned)
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Indices of the pinned rim particles.
    pub fn pinned(&self) -> &[usize] {
        &self.pinned
    }

    pub fn rows(&self) -> usize {
        self.sim.particles().len() / self.segments
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.sim.particles().iter().map(|p| p.pos).collect()
    }

    /// Endpoint positions of every spring, for line rendering.
    pub fn spring_segments(&self) -> Vec<(Vec3, Vec3)> {
        let particles = self.sim.particles();
        self.sim
            .springs()
            .iter()
            .filter_map(|s| s.endpoints().ok())
            .map(|(a, b)| (particles[a].pos, particles[b].pos))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> NetConfig {
        NetConfig {
            rows: 4,
            segments: 6,
            settle_steps: 10_000,
            ..NetConfig::default()
        }
    }

    fn gravity() -> Vec3 {
        Vec3::new(0.0, -9.8, 0.0)
    }

    #[test]
    fn test_rejects_degenerate_lattice() {
        let config = NetConfig {
            rows: 1,
            ..NetConfig::default()
        };
        assert!(matches!(
            HoopNet::unsettled(&config, gravity()),
            Err(SimError::InvalidNet { rows: 1, .. })
        ));
    }

    #[test]
    fn test_lattice_topology() {
        let config = small_config();
        let net = HoopNet::unsettled(&config, gravity()).unwrap();

        assert_eq!(net.simulation().particles().len(), 24);
        // 4 rings of 6, plus 3 bands of (vertical + 2 shear) * 6
        assert_eq!(net.simulation().springs().len(), 4 * 6 + 3 * 3 * 6);
        assert_eq!(net.pinned(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(net.rows(), 4);

        for p in &net.simulation().particles()[..6] {
            let r = Vec3::new(p.pos.x, 0.0, p.pos.z) - Vec3::new(config.rim_center.x, 0.0, config.rim_center.z);
            assert!((r.magnitude() - config.rim_radius).abs() < 1e-12);
            assert!((p.pos.y - config.rim_center.y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_springs_start_at_rest_length() {
        let net = HoopNet::unsettled(&small_config(), gravity()).unwrap();
        let particles = net.simulation().particles();
        for spring in net.simulation().springs() {
            let (a, b) = spring.endpoints().unwrap();
            let len = particles[a].pos.distance(&particles[b].pos);
            assert!((len - spring.rest_length).abs() < 1e-12);
        }
    }

    #[test]
    fn test_settled_net_hangs_from_fixed_rim() {
        let config = small_config();
        let before = HoopNet::unsettled(&config, gravity()).unwrap().positions();
        let net = HoopNet::build(&config, gravity()).unwrap();
        let after = net.positions();

        for &i in net.pinned() {
            assert_eq!(after[i], before[i], "Rim particle {} moved during settling", i);
        }

        // Lower rings sag under gravity but stay above the floor
        let bottom = &after[after.len() - config.segments..];
        let bottom_before = &before[before.len() - config.segments..];
        for (p, q) in bottom.iter().zip(bottom_before) {
            assert!(p.y < q.y, "Bottom ring should sag: {} vs {}", p.y, q.y);
            assert!(p.y > 0.0);
        }

        let max_speed = net
            .simulation()
            .particles()
            .iter()
            .map(|p| p.vel.magnitude())
            .fold(0.0, f64::max);
        assert!(max_speed < 0.1, "Net should be at rest after settling, max speed {}", max_speed);
    }

    #[test]
    fn test_step_keeps_rim_fixed() {
        let mut config = small_config();
        config.settle_steps = 100;
        let mut net = HoopNet::build(&config, gravity()).unwrap();
        let rim: Vec<_> = net.pinned().iter().map(|&i| net.positions()[i]).collect();

        for _ in 0..500 {
            net.step(0.001).unwrap();
        }

        for (k, &i) in net.pinned().iter().enumerate() {
            assert_eq!(net.positions()[i], rim[k]);
        }
        assert_eq!(net.spring_segments().len(), net.simulation().springs().len());
    }
}

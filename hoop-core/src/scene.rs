//! The basketball scene: ball, court, hoop net and shooter driven per frame.
//!
//! ## Frame loop
//!
//! ```text
//! advance(frame_dt)
//!   dt = min(max_frame_dt, frame_dt) * sim_speed
//!   while running and t_sim < t_sim_start + dt:
//!       tick(time_step)          fixed sub-step
//!       t_sim += time_step
//! ```
//!
//! ## Tick
//!
//! 1. ball force = gravity * mass + pending launch force (then cleared)
//! 2. penalty force from each of the five court planes
//! 3. kinetic friction at ground level
//! 4. symplectic Euler on the ball, one sub-step of the net
//!
//! Aiming inputs accumulate into the pending launch force and refresh the
//! trajectory preview. The launch force is applied on the first tick after
//! the shot starts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ball::{ArcSettings, Ball};
use crate::collision::Court;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::ik::{ArticulatedHuman, IkOutcome, Limb};
use crate::linalg;
use crate::net::{HoopNet, NetConfig};
use crate::render::{CurveSink, DrawSink, ShapeKind};
use crate::spline::HermiteSpline;
use crate::types::Vec3;

const NET_PARTICLE_SCALE: f64 = 0.03;
const PREVIEW_SAMPLES: usize = 100;

/// Fixed-step timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Physics sub-step (s)
    pub time_step: f64,
    /// Largest frame time honoured per frame (s)
    pub max_frame_dt: f64,
    pub sim_speed: f64,
    /// Cap on trajectory preview sub-steps
    pub arc_steps: usize,
    pub arc_sample_interval: usize,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_step: 0.001,
            max_frame_dt: 1.0 / 30.0,
            sim_speed: 1.0,
            arc_steps: 10_000,
            arc_sample_interval: 100,
        }
    }
}

/// Force impulses added to the pending launch force per input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Vertical impulse for angle up/down (N)
    pub angle_vertical: f64,
    /// Sideways impulse for angle left/right (N)
    pub angle_lateral: f64,
    /// Impulse along -z for power up/down (N)
    pub power: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            angle_vertical: 5000.0,
            angle_lateral: 1000.0,
            power: 1000.0,
        }
    }
}

/// Discrete user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShotInput {
    AngleUp,
    AngleDown,
    AngleLeft,
    AngleRight,
    PowerUp,
    PowerDown,
    Shoot,
    Reset,
}

impl ShotInput {
    pub const ALL: [ShotInput; 8] = [
        ShotInput::AngleUp,
        ShotInput::AngleDown,
        ShotInput::AngleLeft,
        ShotInput::AngleRight,
        ShotInput::PowerUp,
        ShotInput::PowerDown,
        ShotInput::Shoot,
        ShotInput::Reset,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShotInput::AngleUp => "angle_up",
            ShotInput::AngleDown => "angle_down",
            ShotInput::AngleLeft => "angle_left",
            ShotInput::AngleRight => "angle_right",
            ShotInput::PowerUp => "power_up",
            ShotInput::PowerDown => "power_down",
            ShotInput::Shoot => "shoot",
            ShotInput::Reset => "reset",
        }
    }
}

impl fmt::Display for ShotInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShotInput {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShotInput::ALL
            .into_iter()
            .find(|input| input.name() == s)
            .ok_or_else(|| SimError::UnknownInput(s.to_string()))
    }
}

/// Everything the shooting demo simulates.
#[derive(Debug, Clone)]
pub struct BasketballScene {
    config: SimConfig,
    ball: Ball,
    court: Court,
    net: HoopNet,
    human: ArticulatedHuman,
    pending_force: Vec3,
    running: bool,
    t_sim: f64,
}

impl BasketballScene {
    /// Build the scene and settle the hoop net.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let court = Court::from_config(&config.court);
        let net_config = NetConfig {
            rim_center: court.hoop_center,
            ..config.net.clone()
        };
        let net = HoopNet::build(&net_config, config.gravity)?;
        let human = ArticulatedHuman::new(config.ik.clone())?;

        let mut scene = Self {
            ball: Ball::new(config.ball.clone()),
            court,
            net,
            human,
            pending_force: Vec3::ZERO,
            running: false,
            t_sim: 0.0,
            config,
        };
        scene.refresh_preview();

        info!(
            net_particles = scene.net.simulation().particles().len(),
            net_springs = scene.net.simulation().springs().len(),
            "Basketball scene ready"
        );
        Ok(scene)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn court(&self) -> &Court {
        &self.court
    }

    pub fn net(&self) -> &HoopNet {
        &self.net
    }

    pub fn human(&self) -> &ArticulatedHuman {
        &self.human
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Simulated time since the scene was built or last reset (s).
    pub fn sim_time(&self) -> f64 {
        self.t_sim
    }

    /// Launch force that the next shot will apply.
    pub fn pending_force(&self) -> Vec3 {
        self.pending_force
    }

    /// Current trajectory preview.
    pub fn arc(&self) -> Option<&HermiteSpline> {
        self.ball.arc()
    }

    pub fn hand_position(&self, limb: Limb) -> Vec3 {
        self.human.end_effector(limb)
    }

    pub fn handle_input(&mut self, input: ShotInput) {
        let controls = &self.config.controls;
        match input {
            ShotInput::AngleUp => self.pending_force.y += controls.angle_vertical,
            ShotInput::AngleDown => self.pending_force.y -= controls.angle_vertical,
            ShotInput::AngleRight => self.pending_force.x += controls.angle_lateral,
            ShotInput::AngleLeft => self.pending_force.x -= controls.angle_lateral,
            ShotInput::PowerUp => self.pending_force.z -= controls.power,
            ShotInput::PowerDown => {
                // Power never reverses into a backwards shot
                let z = self.pending_force.z + controls.power;
                if z <= 0.0 {
                    self.pending_force.z = z;
                }
            }
            ShotInput::Shoot => {
                self.running = !self.running;
                debug!(running = self.running, force = ?self.pending_force, "Shot toggled");
            }
            ShotInput::Reset => {
                self.ball.reset();
                self.pending_force = Vec3::ZERO;
                self.running = false;
                self.t_sim = 0.0;
                debug!("Scene reset");
            }
        }
        self.refresh_preview();
    }

    /// Advance by one rendered frame. Returns the number of physics ticks run.
    pub fn advance(&mut self, frame_dt: f64) -> SimResult<usize> {
        if !self.running {
            return Ok(0);
        }

        let time = &self.config.time;
        let dt = frame_dt.min(time.max_frame_dt) * time.sim_speed;
        let step = time.time_step;
        let t_next = self.t_sim + dt;

        let mut ticks = 0;
        while self.t_sim < t_next {
            self.tick(step)?;
            self.t_sim += step;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// One fixed physics sub-step of the ball and the net.
    pub fn tick(&mut self, dt: f64) -> SimResult<()> {
        let gravity = self.config.gravity;
        self.ball.ext_force = gravity * self.ball.mass() + self.pending_force;
        self.pending_force = Vec3::ZERO;

        self.ball.apply_court_forces(&self.court);
        self.ball.calculate_friction(gravity);
        self.ball.update(dt);

        self.net.step(dt)
    }

    /// Re-solve both arms with the ball as the goal.
    pub fn animate_arms(&mut self) -> [IkOutcome; 2] {
        self.human.update(self.ball.pos, self.running)
    }

    /// Whether the ball centre is within `tolerance` of the hoop centre.
    pub fn is_scored(&self, tolerance: f64) -> bool {
        self.ball.pos.distance(&self.court.hoop_center) <= tolerance
    }

    /// Feed ball, net particles and the figure to `sink`; while aiming, feed
    /// the trajectory preview to `curve`.
    pub fn draw(&self, sink: &mut dyn DrawSink, curve: &mut dyn CurveSink) {
        sink.draw(ShapeKind::Ball, &self.ball.model_transform());

        let s = NET_PARTICLE_SCALE;
        for p in self.net.simulation().particles() {
            let m = linalg::translation(p.pos.x, p.pos.y, p.pos.z) * linalg::scale(s, s, s);
            sink.draw(ShapeKind::NetParticle, &m);
        }

        self.human.draw(sink);

        if !self.running {
            if let Some(arc) = self.ball.arc() {
                curve.update_curve(&|t| arc.get_position(t), PREVIEW_SAMPLES);
            }
        }
    }

    fn arc_settings(&self) -> ArcSettings {
        ArcSettings {
            dt: self.config.time.time_step,
            max_steps: self.config.time.arc_steps,
            sample_interval: self.config.time.arc_sample_interval,
        }
    }

    fn refresh_preview(&mut self) {
        let settings = self.arc_settings();
        self.ball
            .update_arc(&self.court, self.config.gravity, self.pending_force, &settings);
    }
}

//! Python bindings for the hoop-core basketball physics engine.
//!
//! Provides a simple Python API:
//!
//! ```python
//! from hoop_physics import Scene
//!
//! scene = Scene()                       # or Scene("config/scenes/moon.yaml")
//! scene.input("angle_up")
//! scene.input("power_up")
//! scene.input("shoot")
//!
//! for _ in range(120):
//!     scene.advance(1 / 60)
//!     pos = scene.ball_position()
//!     print(f"Ball at ({pos.x}, {pos.y}, {pos.z})")
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use hoop_core::ik::{IkStatus, Limb};
use hoop_core::{BasketballScene, ShotInput, SimConfig, SimError, Vec3 as CoreVec3};

/// 3D vector for positions, velocities, etc.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec3 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub z: f64,
}

#[pymethods]
impl Vec3 {
    #[new]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn __repr__(&self) -> String {
        format!("Vec3({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }

    fn magnitude(&self) -> f64 {
        CoreVec3::from(*self).magnitude()
    }

    fn to_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl From<CoreVec3> for Vec3 {
    fn from(v: CoreVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3> for CoreVec3 {
    fn from(v: Vec3) -> Self {
        CoreVec3::new(v.x, v.y, v.z)
    }
}

/// Bad arguments and configs raise `ValueError`; failures while stepping
/// raise `RuntimeError`.
fn to_py_err(err: SimError) -> PyErr {
    match err {
        SimError::NotFound(_)
        | SimError::InvalidConfig(_)
        | SimError::UnknownInput(_)
        | SimError::InvalidMass(_)
        | SimError::InvalidSpring { .. }
        | SimError::InvalidNet { .. }
        | SimError::Io(_)
        | SimError::Parse(_) => PyValueError::new_err(err.to_string()),
        SimError::Uninitialized { .. } | SimError::OutOfBounds { .. } => {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}

fn parse_limb(side: &str) -> PyResult<Limb> {
    match side {
        "right" => Ok(Limb::Right),
        "left" => Ok(Limb::Left),
        other => Err(PyValueError::new_err(format!(
            "side must be 'right' or 'left', got '{}'",
            other
        ))),
    }
}

fn status_name(status: IkStatus) -> &'static str {
    match status {
        IkStatus::Converged => "converged",
        IkStatus::IterationLimit => "iteration_limit",
        IkStatus::Recovery => "recovery",
    }
}

/// The basketball shooting scene.
///
/// Handles aiming input, fixed-step physics, the hoop net and the shooter.
#[pyclass(name = "Scene")]
pub struct Scene {
    inner: BasketballScene,
}

#[pymethods]
impl Scene {
    /// Build a scene from a YAML file, or from defaults.
    #[new]
    #[pyo3(signature = (config_path=None))]
    fn new(config_path: Option<&str>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => SimConfig::from_path(path).map_err(to_py_err)?,
            None => SimConfig::default(),
        };
        let inner = BasketballScene::new(config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Whether a shot is in flight.
    #[getter]
    fn running(&self) -> bool {
        self.inner.is_running()
    }

    /// Simulated time in seconds.
    #[getter]
    fn time(&self) -> f64 {
        self.inner.sim_time()
    }

    /// Advance by one rendered frame. Returns the number of physics ticks.
    fn advance(&mut self, frame_dt: f64) -> PyResult<usize> {
        self.inner.advance(frame_dt).map_err(to_py_err)
    }

    /// Apply a named input: angle_up, angle_down, angle_left, angle_right,
    /// power_up, power_down, shoot or reset.
    fn input(&mut self, name: &str) -> PyResult<()> {
        let input: ShotInput = name.parse().map_err(to_py_err)?;
        self.inner.handle_input(input);
        Ok(())
    }

    /// Put the ball back and stop the shot.
    fn reset(&mut self) {
        self.inner.handle_input(ShotInput::Reset);
    }

    fn ball_position(&self) -> Vec3 {
        self.inner.ball().pos.into()
    }

    fn ball_velocity(&self) -> Vec3 {
        self.inner.ball().vel.into()
    }

    /// Launch force the next shot will apply.
    fn pending_force(&self) -> Vec3 {
        self.inner.pending_force().into()
    }

    /// Sampled trajectory preview, `samples + 1` points.
    #[pyo3(signature = (samples=100))]
    fn arc_points(&self, samples: usize) -> Vec<Vec3> {
        match self.inner.arc() {
            Some(arc) => arc.sample(samples).into_iter().map(Vec3::from).collect(),
            None => vec![],
        }
    }

    fn net_positions(&self) -> Vec<Vec3> {
        self.inner
            .net()
            .positions()
            .into_iter()
            .map(Vec3::from)
            .collect()
    }

    /// Hand position for "right" or "left".
    fn hand_position(&self, side: &str) -> PyResult<Vec3> {
        let limb = parse_limb(side)?;
        Ok(self.inner.hand_position(limb).into())
    }

    /// Re-solve both arms toward the ball.
    ///
    /// Returns `[(status, iterations, error), ...]` for right then left.
    fn animate_arms(&mut self) -> Vec<(&'static str, usize, f64)> {
        self.inner
            .animate_arms()
            .iter()
            .map(|o| (status_name(o.status), o.iterations, o.error))
            .collect()
    }

    #[pyo3(signature = (tolerance=0.5))]
    fn is_scored(&self, tolerance: f64) -> bool {
        self.inner.is_scored(tolerance)
    }

    /// Get current state as dict for easy inspection.
    fn state_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let ball = self.inner.ball();
        let dict = PyDict::new_bound(py);
        dict.set_item("time", self.inner.sim_time())?;
        dict.set_item("running", self.inner.is_running())?;
        dict.set_item("ball_x", ball.pos.x)?;
        dict.set_item("ball_y", ball.pos.y)?;
        dict.set_item("ball_z", ball.pos.z)?;
        dict.set_item("ball_vx", ball.vel.x)?;
        dict.set_item("ball_vy", ball.vel.y)?;
        dict.set_item("ball_vz", ball.vel.z)?;
        dict.set_item("ball_speed", ball.vel.magnitude())?;
        dict.set_item("scored", self.inner.is_scored(0.5))?;
        Ok(dict)
    }
}

/// Python module definition.
#[pymodule]
fn hoop_physics(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec3>()?;
    m.add_class::<Scene>()?;
    Ok(())
}

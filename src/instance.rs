//! Module for loading and representing die-route planning instances.
//!
//! An instance is read from a JSON job file describing the platform's start
//! pose, its kinematic limits, and the dies to visit as raw corner
//! coordinates. Each die is reduced to a [`Target`]: its center and the
//! camera orientation that aligns with its first edge.

use crate::cost::{self, CostModel};
use crate::error::{PlannerError, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A point on the stage plane, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    #[inline]
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[f64; 2]> for Position {
    fn from(p: [f64; 2]) -> Self {
        Position::new(p[0], p[1])
    }
}

impl From<Position> for [f64; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

/// Platform state: stage position plus camera heading in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Position,
    pub angle: f64,
}

impl Pose {
    pub fn new(position: Position, angle: f64) -> Self {
        Pose { position, angle }
    }
}

/// A die center and the camera angle (degrees) needed to align with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: Position,
    pub angle: f64,
}

impl Target {
    pub fn new(position: Position, angle: f64) -> Self {
        Target { position, angle }
    }

    /// Derive a target from a die's four corners.
    ///
    /// The center is the mean of the corners; the angle is the heading of
    /// the edge from corner 0 to corner 1.
    pub fn from_corners(corners: &[[f64; 2]]) -> Result<Self> {
        if corners.len() != 4 {
            return Err(PlannerError::schema(format!(
                "expected 4 corners, found {}",
                corners.len()
            )));
        }
        if corners.iter().flatten().any(|v| !v.is_finite()) {
            return Err(PlannerError::schema("corner coordinates must be finite"));
        }

        let cx = corners.iter().map(|c| c[0]).sum::<f64>() / 4.0;
        let cy = corners.iter().map(|c| c[1]).sum::<f64>() / 4.0;

        let dx = corners[1][0] - corners[0][0];
        let dy = corners[1][1] - corners[0][1];
        let angle = dy.atan2(dx).to_degrees();

        Ok(Target::new(Position::new(cx, cy), angle))
    }

    /// Pose held by the platform once aligned on this target.
    #[inline]
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.angle)
    }
}

/// Peak velocities and accelerations of both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicLimits {
    /// Stage peak velocity (units/s)
    pub stage_velocity: f64,
    /// Stage acceleration (units/s²)
    pub stage_acceleration: f64,
    /// Camera peak angular velocity (deg/s)
    pub camera_velocity: f64,
    /// Camera angular acceleration (deg/s²)
    pub camera_acceleration: f64,
}

impl KinematicLimits {
    pub fn new(
        stage_velocity: f64,
        stage_acceleration: f64,
        camera_velocity: f64,
        camera_acceleration: f64,
    ) -> Self {
        KinematicLimits {
            stage_velocity,
            stage_acceleration,
            camera_velocity,
            camera_acceleration,
        }
    }

    fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("StageVelocity", self.stage_velocity),
            ("StageAcceleration", self.stage_acceleration),
            ("CameraVelocity", self.camera_velocity),
            ("CameraAcceleration", self.camera_acceleration),
        ]
    }

    /// Limits must be finite and non-negative. Zero is allowed and selects
    /// the degenerate fallback of the cost model.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.fields() {
            if !value.is_finite() || value < 0.0 {
                return Err(PlannerError::schema(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Job-file names of the limits that are zero.
    pub fn zero_limits(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|&(_, value)| value == 0.0)
            .map(|(name, _)| name)
            .collect()
    }
}

/// One die of the job file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DieRecord {
    #[serde(rename = "Corners")]
    pub corners: Vec<[f64; 2]>,
}

/// The job file as it appears on disk.
///
/// `InitialPosition`, `StageVelocity` and `Dies` are required. The other
/// limits and the initial angle default to zero, which turns the matching
/// axis into its degenerate fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceFile {
    pub initial_position: [f64; 2],
    #[serde(default)]
    pub initial_angle: f64,
    pub stage_velocity: f64,
    #[serde(default)]
    pub stage_acceleration: f64,
    #[serde(default)]
    pub camera_velocity: f64,
    #[serde(default)]
    pub camera_acceleration: f64,
    pub dies: Vec<DieRecord>,
}

/// A complete planning instance: where the platform starts, how fast it can
/// move, and what it must visit.
#[derive(Debug, Clone)]
pub struct PlanningInstance {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    /// Initial platform pose
    pub start: Pose,
    /// Kinematic limits, constant for the whole run
    pub limits: KinematicLimits,
    /// Targets in input order; tours index into this list
    pub targets: Vec<Target>,
}

impl PlanningInstance {
    pub fn new(name: &str, start: Pose, limits: KinematicLimits, targets: Vec<Target>) -> Self {
        PlanningInstance {
            name: name.to_string(),
            start,
            limits,
            targets,
        }
    }

    /// Load an instance from a JSON job file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "instance".to_string());

        let instance = Self::from_json_str(&name, &text)?;
        log::debug!(
            "loaded {} from {:?}: {} targets",
            instance.name,
            path,
            instance.dimension()
        );
        Ok(instance)
    }

    /// Parse a job file held in memory. Shape violations surface as
    /// [`PlannerError::Schema`], malformed JSON as [`PlannerError::Json`].
    pub fn from_json_str(name: &str, text: &str) -> Result<Self> {
        let file: InstanceFile = serde_json::from_str(text).map_err(|e| {
            if e.is_data() {
                PlannerError::schema(e.to_string())
            } else {
                PlannerError::Json(e)
            }
        })?;
        Self::from_input(name, &file)
    }

    /// Build an instance from a parsed job file, extracting one target per die.
    pub fn from_input(name: &str, file: &InstanceFile) -> Result<Self> {
        let limits = KinematicLimits::new(
            file.stage_velocity,
            file.stage_acceleration,
            file.camera_velocity,
            file.camera_acceleration,
        );
        limits.validate()?;

        if file.initial_position.iter().any(|v| !v.is_finite()) || !file.initial_angle.is_finite() {
            return Err(PlannerError::schema("initial pose must be finite"));
        }

        for limit in limits.zero_limits() {
            let fallback = match limit {
                "StageVelocity" | "CameraVelocity" => "axis moves take no time",
                _ => "constant-velocity fallback",
            };
            log::warn!("{}: {} is 0, {}", name, limit, fallback);
        }

        let targets = file
            .dies
            .iter()
            .enumerate()
            .map(|(i, die)| {
                Target::from_corners(&die.corners).map_err(|e| match e {
                    PlannerError::Schema(msg) => PlannerError::schema(format!("die {}: {}", i, msg)),
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let start = Pose::new(file.initial_position.into(), file.initial_angle);
        Ok(PlanningInstance::new(name, start, limits, targets))
    }

    /// Number of targets.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.targets.len()
    }

    /// Pose the platform holds after visiting target `index`.
    #[inline]
    pub fn pose(&self, index: usize) -> Pose {
        self.targets[index].pose()
    }

    /// Trapezoidal duration of the move between two targets.
    #[inline]
    pub fn segment_time(&self, from: usize, to: usize) -> f64 {
        cost::segment_time(&self.pose(from), &self.pose(to), &self.limits)
    }

    /// Total motion time of walking `tour` from the start pose.
    pub fn tour_time(&self, tour: &[usize]) -> f64 {
        self.route_cost(tour, CostModel::Trapezoidal)
    }

    /// Total cost of walking `tour` from the start pose under `model`.
    pub fn route_cost(&self, tour: &[usize], model: CostModel) -> f64 {
        let mut total = 0.0;
        let mut current = self.start;
        for &idx in tour {
            let next = self.pose(idx);
            total += model.segment_time(&current, &next, &self.limits);
            current = next;
        }
        total
    }

    /// Straight-line length of the path start -> tour[0] -> ... -> tour[n-1].
    pub fn path_length(&self, tour: &[usize]) -> f64 {
        let mut length = 0.0;
        let mut current = self.start.position;
        for &idx in tour {
            let next = self.targets[idx].position;
            length += current.distance(&next);
            current = next;
        }
        length
    }

    /// Coordinates visited by `tour`, starting with the initial position.
    pub fn path(&self, tour: &[usize]) -> Vec<Position> {
        std::iter::once(self.start.position)
            .chain(tour.iter().map(|&idx| self.targets[idx].position))
            .collect()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut min_x = self.start.position.x;
        let mut max_x = self.start.position.x;
        let mut min_y = self.start.position.y;
        let mut max_y = self.start.position.y;
        for t in &self.targets {
            min_x = min_x.min(t.position.x);
            max_x = max_x.max(t.position.x);
            min_y = min_y.min(t.position.y);
            max_y = max_y.max(t.position.y);
        }

        let mut distances: Vec<f64> = Vec::new();
        for i in 0..self.dimension() {
            for j in i + 1..self.dimension() {
                distances.push(self.targets[i].position.distance(&self.targets[j].position));
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        let max_rotation = self
            .targets
            .iter()
            .map(|t| cost::minimal_angle_delta(self.start.angle, t.angle))
            .fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            num_targets: self.dimension(),
            limits: self.limits,
            width: max_x - min_x,
            height: max_y - min_y,
            avg_distance,
            max_distance,
            max_rotation,
        }
    }
}

/// Statistics about a planning instance
#[derive(Debug, Clone)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_targets: usize,
    pub limits: KinematicLimits,
    pub width: f64,
    pub height: f64,
    pub avg_distance: f64,
    pub max_distance: f64,
    pub max_rotation: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Targets: {}", self.num_targets)?;
        writeln!(
            f,
            "  Stage: v_max={} a_max={}",
            self.limits.stage_velocity, self.limits.stage_acceleration
        )?;
        writeln!(
            f,
            "  Camera: omega_max={} alpha_max={}",
            self.limits.camera_velocity, self.limits.camera_acceleration
        )?;
        writeln!(f, "  Extent: {:.2} x {:.2}", self.width, self.height)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)?;
        writeln!(f, "  Max rotation from start: {:.2} deg", self.max_rotation)
    }
}

/// Seeded generator of wafer-like job files: a grid of square dies clipped
/// to a circular wafer, each die slightly rotated.
#[derive(Debug, Clone)]
pub struct SyntheticWafer {
    pub rows: usize,
    pub cols: usize,
    /// Center-to-center spacing of the grid
    pub pitch: f64,
    /// Side length of a die
    pub die_size: f64,
    /// Maximum rotation of a die in degrees (uniform in `[-jitter, jitter]`)
    pub angle_jitter: f64,
    /// Drop dies whose center falls outside the inscribed circle
    pub circular: bool,
    pub limits: KinematicLimits,
    pub seed: u64,
}

impl Default for SyntheticWafer {
    fn default() -> Self {
        SyntheticWafer {
            rows: 5,
            cols: 5,
            pitch: 10.0,
            die_size: 8.0,
            angle_jitter: 5.0,
            circular: true,
            limits: KinematicLimits::new(50.0, 500.0, 90.0, 900.0),
            seed: 42,
        }
    }
}

impl SyntheticWafer {
    pub fn generate(&self) -> InstanceFile {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let cx = (self.cols as f64 - 1.0) * self.pitch / 2.0;
        let cy = (self.rows as f64 - 1.0) * self.pitch / 2.0;
        let radius = cx.max(cy) + self.pitch / 2.0;
        let half = self.die_size / 2.0;

        let mut dies = Vec::with_capacity(self.rows * self.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                let x = c as f64 * self.pitch;
                let y = r as f64 * self.pitch;
                if self.circular && Position::new(x, y).distance(&Position::new(cx, cy)) > radius {
                    continue;
                }

                let jitter = if self.angle_jitter > 0.0 {
                    rng.gen_range(-self.angle_jitter..=self.angle_jitter)
                } else {
                    0.0
                };
                let (sin, cos) = jitter.to_radians().sin_cos();
                let corners = [(-half, -half), (half, -half), (half, half), (-half, half)]
                    .iter()
                    .map(|&(dx, dy)| [x + dx * cos - dy * sin, y + dx * sin + dy * cos])
                    .collect();
                dies.push(DieRecord { corners });
            }
        }
        dies.shuffle(&mut rng);

        InstanceFile {
            initial_position: [-self.pitch, -self.pitch],
            initial_angle: 0.0,
            stage_velocity: self.limits.stage_velocity,
            stage_acceleration: self.limits.stage_acceleration,
            camera_velocity: self.limits.camera_velocity,
            camera_acceleration: self.limits.camera_acceleration,
            dies,
        }
    }

    /// Generate straight into a planning instance.
    pub fn instance(&self, name: &str) -> Result<PlanningInstance> {
        PlanningInstance::from_input(name, &self.generate())
    }
}

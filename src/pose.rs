/// A single 6-DoF sample pulled from the sensor, in the sensor's
/// coordinate frame. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    pub position: [f32; 3],
    /// Orientation quaternion as (x, y, z, w).
    pub orientation: [f32; 4],
    pub velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub acceleration: [f32; 3],
    pub angular_acceleration: [f32; 3],
    pub timestamp_ns: u64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Failed = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl From<u32> for Confidence {
    fn from(value: u32) -> Self {
        match value & 0x3 {
            1 => Confidence::Low,
            2 => Confidence::Medium,
            3 => Confidence::High,
            _ => Confidence::Failed,
        }
    }
}

/// Tracking state reported to the host alongside each pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingResult {
    Uninitialized = 1,
    Calibrating = 100,
    OutOfRange = 101,
    RunningOk = 200,
    RunningOutOfRange = 201,
    Fallback = 300,
}

/// Quaternion in the host's (w, x, y, z) layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
}

/// Pose record in the shape the host runtime consumes.
///
/// Converted deterministically from a [`PoseSample`]: motion vectors and the
/// rotation quaternion map component-wise, `pose_is_valid` tracks the sensor
/// confidence, and the calibration quaternions stay at identity. The host
/// never sees a tracking result other than `RunningOk` while the device is
/// connected.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverPose {
    pub pose_is_valid: bool,
    pub device_is_connected: bool,
    pub result: TrackingResult,
    // TODO: expose the calibration rotations through the settings section
    // once the host-side launcher can edit them.
    pub world_from_driver_rotation: Quaternion,
    pub driver_from_head_rotation: Quaternion,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub acceleration: [f64; 3],
    pub angular_velocity: [f64; 3],
    pub angular_acceleration: [f64; 3],
    pub rotation: Quaternion,
}

impl DriverPose {
    /// Placeholder pose for the host's synchronous query path: valid,
    /// connected, and motionless. Built without any sensor sample.
    pub fn placeholder() -> Self {
        DriverPose {
            pose_is_valid: true,
            device_is_connected: true,
            result: TrackingResult::RunningOk,
            world_from_driver_rotation: Quaternion::IDENTITY,
            driver_from_head_rotation: Quaternion::IDENTITY,
            position: [0.0; 3],
            velocity: [0.0; 3],
            acceleration: [0.0; 3],
            angular_velocity: [0.0; 3],
            angular_acceleration: [0.0; 3],
            rotation: Quaternion::IDENTITY,
        }
    }
}

impl From<&PoseSample> for DriverPose {
    fn from(sample: &PoseSample) -> Self {
        let [qx, qy, qz, qw] = sample.orientation;
        DriverPose {
            pose_is_valid: sample.confidence != Confidence::Failed,
            device_is_connected: true,
            result: TrackingResult::RunningOk,
            world_from_driver_rotation: Quaternion::IDENTITY,
            driver_from_head_rotation: Quaternion::IDENTITY,
            position: widen(sample.position),
            velocity: widen(sample.velocity),
            acceleration: widen(sample.acceleration),
            angular_velocity: widen(sample.angular_velocity),
            angular_acceleration: widen(sample.angular_acceleration),
            rotation: Quaternion {
                w: qw as f64,
                x: qx as f64,
                y: qy as f64,
                z: qz as f64,
            },
        }
    }
}

fn widen(v: [f32; 3]) -> [f64; 3] {
    [v[0] as f64, v[1] as f64, v[2] as f64]
}

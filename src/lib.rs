//! OpenVR server driver that bridges the Intel RealSense T265's 6-DoF pose
//! stream into the host runtime as a generic tracker.

mod bridge;
mod device;
mod discovery;
mod error;
mod pose;
mod protocol;
mod server;
mod source;

pub use bridge::{HostPosePublisher, PoseBridge};
pub use device::{
    DeviceDescriptor, HostPropertyRegistry, Property, PropertyValue, TrackedDevice,
    TrackedDeviceIndex, CONTROLLER_ROLE_OPT_OUT, SETTINGS_KEY_MODEL_NUMBER,
    SETTINGS_KEY_SERIAL_NUMBER, SETTINGS_SECTION, TRACKED_DEVICE_INDEX_INVALID,
};
pub use error::{Error, Result};
pub use pose::{Confidence, DriverPose, PoseSample, Quaternion, TrackingResult};
pub use protocol::{
    SIXDOF_MODE_DISABLE_JUMPING, SIXDOF_MODE_ENABLE_MAPPING, SIXDOF_MODE_ENABLE_RELOCALIZATION,
    SIXDOF_MODE_NORMAL,
};
pub use server::{
    DeviceClass, DriverFactory, HostDeviceRegistry, HostEvent, HostEventSource, ServerProvider,
    SERVER_PROVIDER_INTERFACE,
};
pub use source::{PoseSession, SensorSource, UsbPoseSource};

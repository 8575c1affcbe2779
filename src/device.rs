use crate::bridge::{HostPosePublisher, PoseBridge};
use crate::error::Result;
use crate::pose::DriverPose;
use crate::source::SensorSource;
use log::info;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Host-assigned handle correlating the registered device with its pose
/// updates.
pub type TrackedDeviceIndex = u32;
pub const TRACKED_DEVICE_INDEX_INVALID: TrackedDeviceIndex = u32::MAX;

// Settings keys the host uses to override the device identity strings.
// Read-through is not wired up yet; the descriptor defaults apply.
pub const SETTINGS_SECTION: &str = "driver_t265";
pub const SETTINGS_KEY_SERIAL_NUMBER: &str = "serialNumber";
pub const SETTINGS_KEY_MODEL_NUMBER: &str = "modelNumber";

/// Static identity reported to the host at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub serial_number: String,
    pub model_number: String,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        DeviceDescriptor {
            serial_number: "CTRL_1234".to_string(),
            model_number: "MyController".to_string(),
        }
    }
}

/// Property keys registered once at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    ModelNumber,
    RenderModelName,
    CurrentUniverseId,
    IsOnDesktop,
    NeverTracked,
    ControllerRoleHint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Int32(i32),
    Uint64(u64),
}

/// The device opts out of the hand-controller role; it is a generic tracker.
pub const CONTROLLER_ROLE_OPT_OUT: i32 = 5;

/// Host-side property store, written once per activation.
pub trait HostPropertyRegistry {
    fn set_property(&mut self, key: Property, value: PropertyValue);
}

type BridgeSpawner = fn(
    Box<dyn crate::source::PoseSession>,
    Arc<AtomicU32>,
    Arc<dyn HostPosePublisher>,
) -> Result<PoseBridge>;

/// The tracked device exposed to the host: owns the identity slot and the
/// acquisition bridge, and implements the host's lifecycle contract.
///
/// Exactly two threads touch an instance: the host's tick thread drives the
/// lifecycle calls, and the bridge thread reads the identity slot.
pub struct TrackedDevice {
    descriptor: DeviceDescriptor,
    source: Box<dyn SensorSource>,
    publisher: Arc<dyn HostPosePublisher>,
    identity: Arc<AtomicU32>,
    bridge: Option<PoseBridge>,
    bridge_spawner: BridgeSpawner,
}

impl TrackedDevice {
    pub fn new(
        descriptor: DeviceDescriptor,
        source: Box<dyn SensorSource>,
        publisher: Arc<dyn HostPosePublisher>,
    ) -> Self {
        Self::with_bridge_spawner(descriptor, source, publisher, PoseBridge::spawn)
    }

    fn with_bridge_spawner(
        descriptor: DeviceDescriptor,
        source: Box<dyn SensorSource>,
        publisher: Arc<dyn HostPosePublisher>,
        bridge_spawner: BridgeSpawner,
    ) -> Self {
        TrackedDevice {
            descriptor,
            source,
            publisher,
            identity: Arc::new(AtomicU32::new(TRACKED_DEVICE_INDEX_INVALID)),
            bridge: None,
            bridge_spawner,
        }
    }

    pub fn serial_number(&self) -> &str {
        &self.descriptor.serial_number
    }

    pub fn is_activated(&self) -> bool {
        self.identity.load(Ordering::Relaxed) != TRACKED_DEVICE_INDEX_INVALID
    }

    /// Bind the device to a host index and start pose delivery.
    ///
    /// Static properties are registered before the sensor is opened, so a
    /// failed activation may leave them registered. On any failure the
    /// identity stays invalid and no acquisition loop runs; the host must
    /// not mark the device active.
    pub fn activate(
        &mut self,
        index: TrackedDeviceIndex,
        properties: &mut dyn HostPropertyRegistry,
    ) -> Result<()> {
        // A bridge from an earlier activation cycle may still be draining;
        // join it so two loops never serve the same device.
        if let Some(mut bridge) = self.bridge.take() {
            bridge.stop();
        }

        self.register_static_properties(properties);

        let session = self.source.open()?;
        self.identity.store(index, Ordering::Relaxed);
        match (self.bridge_spawner)(
            session,
            Arc::clone(&self.identity),
            Arc::clone(&self.publisher),
        ) {
            Ok(bridge) => {
                self.bridge = Some(bridge);
                info!(
                    "tracked device {} activated with index {}",
                    self.descriptor.serial_number, index
                );
                Ok(())
            }
            Err(e) => {
                self.identity
                    .store(TRACKED_DEVICE_INDEX_INVALID, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Unbind from the host index. The bridge keeps running; the invalid
    /// index stops publishing within one sample.
    pub fn deactivate(&mut self) {
        self.identity
            .store(TRACKED_DEVICE_INDEX_INVALID, Ordering::Relaxed);
        info!("tracked device {} deactivated", self.descriptor.serial_number);
    }

    /// Reserved hook; the device has no standby behavior.
    pub fn enter_standby(&mut self) {}

    /// Reserved hook; the device has no power-off behavior.
    pub fn power_off(&mut self) {}

    /// Per-tick hook from the host. Pose delivery is push-driven from the
    /// acquisition thread, so there is nothing to do here.
    pub fn run_frame(&mut self) {}

    /// Reserved for future input handling.
    pub fn process_event(&mut self, _event: &crate::server::HostEvent) {}

    /// Synchronous query path some hosts use: a placeholder pose built
    /// without any sensor sample.
    pub fn get_pose(&self) -> DriverPose {
        DriverPose::placeholder()
    }

    /// Stop and join the acquisition thread. Called on provider cleanup and
    /// from `Drop`.
    pub fn shutdown(&mut self) {
        self.deactivate();
        if let Some(mut bridge) = self.bridge.take() {
            bridge.stop();
        }
    }

    fn register_static_properties(&self, properties: &mut dyn HostPropertyRegistry) {
        properties.set_property(
            Property::ModelNumber,
            PropertyValue::String(self.descriptor.model_number.clone()),
        );
        properties.set_property(
            Property::RenderModelName,
            PropertyValue::String(self.descriptor.model_number.clone()),
        );
        // Anything but 0 (invalid) or 1 (reserved for another vendor).
        properties.set_property(Property::CurrentUniverseId, PropertyValue::Uint64(27));
        properties.set_property(Property::IsOnDesktop, PropertyValue::Bool(false));
        properties.set_property(Property::NeverTracked, PropertyValue::Bool(false));
        properties.set_property(
            Property::ControllerRoleHint,
            PropertyValue::Int32(CONTROLLER_ROLE_OPT_OUT),
        );
    }
}

impl Drop for TrackedDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Confidence, PoseSample, TrackingResult};
    use crate::source::{PoseSession, SensorSource};
    use crate::{Error, Result};
    use std::collections::VecDeque;
    use std::sync::mpsc;

    struct ScriptedSession {
        rx: mpsc::Receiver<PoseSample>,
    }

    impl PoseSession for ScriptedSession {
        fn next_sample(&mut self) -> Result<Option<PoseSample>> {
            self.rx
                .recv()
                .map(Some)
                .map_err(|_| Error::SensorUnavailable("script finished".into()))
        }
    }

    struct ScriptedSource {
        sessions: VecDeque<ScriptedSession>,
    }

    impl SensorSource for ScriptedSource {
        fn open(&mut self) -> Result<Box<dyn PoseSession>> {
            self.sessions
                .pop_front()
                .map(|session| Box::new(session) as Box<dyn PoseSession>)
                .ok_or_else(|| Error::SensorUnavailable("no session available".into()))
        }
    }

    struct ChannelPublisher {
        tx: mpsc::Sender<(TrackedDeviceIndex, DriverPose)>,
    }

    impl HostPosePublisher for ChannelPublisher {
        fn pose_updated(&self, index: TrackedDeviceIndex, pose: &DriverPose) {
            let _ = self.tx.send((index, pose.clone()));
        }
    }

    #[derive(Default)]
    struct RecordingProperties {
        entries: Vec<(Property, PropertyValue)>,
    }

    impl HostPropertyRegistry for RecordingProperties {
        fn set_property(&mut self, key: Property, value: PropertyValue) {
            self.entries.push((key, value));
        }
    }

    struct Fixture {
        // Senders drop before the device so a joining bridge always sees its
        // scripted session end.
        sample_txs: Vec<mpsc::Sender<PoseSample>>,
        device: TrackedDevice,
        publish_rx: mpsc::Receiver<(TrackedDeviceIndex, DriverPose)>,
    }

    fn fixture(session_count: usize) -> Fixture {
        let mut sessions = VecDeque::new();
        let mut sample_txs = Vec::new();
        for _ in 0..session_count {
            let (tx, rx) = mpsc::channel();
            sample_txs.push(tx);
            sessions.push_back(ScriptedSession { rx });
        }
        let (publish_tx, publish_rx) = mpsc::channel();
        let device = TrackedDevice::new(
            DeviceDescriptor::default(),
            Box::new(ScriptedSource { sessions }),
            Arc::new(ChannelPublisher { tx: publish_tx }),
        );
        Fixture {
            sample_txs,
            device,
            publish_rx,
        }
    }

    fn sample(position: [f32; 3]) -> PoseSample {
        PoseSample {
            position,
            orientation: [0.0, 0.0, 0.0, 1.0],
            velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
            acceleration: [0.0; 3],
            angular_acceleration: [0.0; 3],
            timestamp_ns: 0,
            confidence: Confidence::High,
        }
    }

    #[test]
    fn activate_registers_static_properties_once() {
        let mut f = fixture(1);
        let mut properties = RecordingProperties::default();
        f.device.activate(3, &mut properties).unwrap();
        assert!(f.device.is_activated());

        let keys: Vec<Property> = properties.entries.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                Property::ModelNumber,
                Property::RenderModelName,
                Property::CurrentUniverseId,
                Property::IsOnDesktop,
                Property::NeverTracked,
                Property::ControllerRoleHint,
            ]
        );
        assert_eq!(
            properties.entries[0].1,
            PropertyValue::String("MyController".to_string())
        );
        assert_eq!(properties.entries[2].1, PropertyValue::Uint64(27));
        assert_eq!(
            properties.entries[5].1,
            PropertyValue::Int32(CONTROLLER_ROLE_OPT_OUT)
        );
    }

    #[test]
    fn activated_device_publishes_with_bound_index() {
        let mut f = fixture(1);
        f.device.activate(42, &mut RecordingProperties::default()).unwrap();

        f.sample_txs[0].send(sample([1.0, 2.0, 3.0])).unwrap();
        let (index, pose) = f.publish_rx.recv().unwrap();
        assert_eq!(index, 42);
        assert_eq!(pose.position, [1.0, 2.0, 3.0]);
        assert!(pose.pose_is_valid);
        assert_eq!(pose.result, TrackingResult::RunningOk);
    }

    #[test]
    fn activation_failure_leaves_device_inactive() {
        // Source has no sessions to hand out; open() fails.
        let mut f = fixture(0);
        let mut properties = RecordingProperties::default();
        let result = f.device.activate(3, &mut properties);
        assert!(matches!(result, Err(Error::SensorUnavailable(_))));
        assert!(!f.device.is_activated());
        // Registration precedes the open; the entries are already there.
        assert_eq!(properties.entries.len(), 6);
    }

    #[test]
    fn spawn_failure_rolls_back_activation() {
        fn failing_spawner(
            _session: Box<dyn PoseSession>,
            _identity: Arc<AtomicU32>,
            _publisher: Arc<dyn HostPosePublisher>,
        ) -> Result<PoseBridge> {
            Err(Error::ThreadStartFailed(std::io::Error::new(
                std::io::ErrorKind::Other,
                "out of threads",
            )))
        }

        let (_tx, rx) = mpsc::channel();
        let mut sessions = VecDeque::new();
        sessions.push_back(ScriptedSession { rx });
        let (publish_tx, _publish_rx) = mpsc::channel();
        let mut device = TrackedDevice::with_bridge_spawner(
            DeviceDescriptor::default(),
            Box::new(ScriptedSource { sessions }),
            Arc::new(ChannelPublisher { tx: publish_tx }),
            failing_spawner,
        );

        let mut properties = RecordingProperties::default();
        let result = device.activate(5, &mut properties);
        assert!(matches!(result, Err(Error::ThreadStartFailed(_))));
        // The identity written before the spawn must be rolled back.
        assert!(!device.is_activated());
        assert_eq!(properties.entries.len(), 6);
    }

    #[test]
    fn deactivate_stops_publishing() {
        let mut f = fixture(1);
        f.device.activate(8, &mut RecordingProperties::default()).unwrap();
        f.sample_txs[0].send(sample([0.0; 3])).unwrap();
        f.publish_rx.recv().unwrap();

        f.device.deactivate();
        assert!(!f.device.is_activated());
        for _ in 0..3 {
            f.sample_txs[0].send(sample([0.0; 3])).unwrap();
        }
        // End the session so shutdown can join the bridge.
        drop(f.sample_txs.remove(0));
        f.device.shutdown();
        assert!(f.publish_rx.try_recv().is_err());
    }

    #[test]
    fn reactivation_replaces_the_previous_bridge() {
        let mut f = fixture(2);
        f.device.activate(1, &mut RecordingProperties::default()).unwrap();
        f.sample_txs[0].send(sample([0.0; 3])).unwrap();
        assert_eq!(f.publish_rx.recv().unwrap().0, 1);

        f.device.deactivate();
        // End the first session so activate can join the old bridge before
        // spawning the replacement.
        drop(f.sample_txs.remove(0));
        f.device.activate(2, &mut RecordingProperties::default()).unwrap();

        f.sample_txs[0].send(sample([0.0; 3])).unwrap();
        assert_eq!(f.publish_rx.recv().unwrap().0, 2);
        drop(f.sample_txs.remove(0));
        f.device.shutdown();
        assert!(f.publish_rx.try_recv().is_err());
    }

    #[test]
    fn get_pose_returns_placeholder_without_samples() {
        let f = fixture(0);
        let pose = f.device.get_pose();
        assert_eq!(pose, DriverPose::placeholder());
    }

    #[test]
    fn lifecycle_noops_never_fail() {
        let mut f = fixture(0);
        f.device.enter_standby();
        f.device.power_off();
        f.device.run_frame();
        f.device.process_event(&crate::server::HostEvent {
            event_type: 100,
            device_index: 0,
        });
    }
}

use crate::device::{TrackedDevice, TrackedDeviceIndex};
use log::info;

/// Versioned interface name the host resolves at load time. Must stay
/// stable for host compatibility.
pub const SERVER_PROVIDER_INTERFACE: &str = "IServerTrackedDeviceProvider_004";

/// Interface names this driver can hand out, checked against lookups.
const SUPPORTED_INTERFACES: &[&str] = &[SERVER_PROVIDER_INTERFACE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    GenericTracker,
}

/// Host-side registry that assigns identities to newly announced devices.
pub trait HostDeviceRegistry {
    fn tracked_device_added(&mut self, serial: &str, class: DeviceClass);
}

/// Event polled from the host runtime each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostEvent {
    pub event_type: u32,
    pub device_index: TrackedDeviceIndex,
}

/// Per-frame event queue on the host side, drained during `run_frame`.
pub trait HostEventSource {
    fn poll_next_event(&mut self) -> Option<HostEvent>;
}

/// The server-side provider the host drives: announces the tracked device
/// at init, forwards the per-frame tick, and drains the host event queue.
pub struct ServerProvider {
    device: TrackedDevice,
}

impl ServerProvider {
    pub fn new(device: TrackedDevice) -> Self {
        ServerProvider { device }
    }

    /// Announce the device to the host. The host answers with an
    /// `activate` call on the device once it has assigned an index.
    pub fn init(&mut self, registry: &mut dyn HostDeviceRegistry) {
        registry.tracked_device_added(self.device.serial_number(), DeviceClass::GenericTracker);
        info!("registered tracked device {}", self.device.serial_number());
    }

    /// Per-tick entry point: forward the frame to the device, then drain
    /// every pending host event.
    pub fn run_frame(&mut self, events: &mut dyn HostEventSource) {
        self.device.run_frame();
        while let Some(event) = events.poll_next_event() {
            self.device.process_event(&event);
        }
    }

    pub fn should_block_standby_mode(&self) -> bool {
        false
    }

    pub fn enter_standby(&mut self) {}

    pub fn leave_standby(&mut self) {}

    /// Stop pose delivery and join the acquisition thread.
    pub fn cleanup(&mut self) {
        self.device.shutdown();
    }

    pub fn device(&self) -> &TrackedDevice {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut TrackedDevice {
        &mut self.device
    }
}

/// Process entry point for the host: owns the provider and resolves it by
/// versioned interface name. Unknown names yield `None`, which the loader
/// reports as interface-not-found.
pub struct DriverFactory {
    provider: ServerProvider,
}

impl DriverFactory {
    pub fn new(provider: ServerProvider) -> Self {
        DriverFactory { provider }
    }

    pub fn get_interface(&mut self, name: &str) -> Option<&mut ServerProvider> {
        if SUPPORTED_INTERFACES.contains(&name) {
            Some(&mut self.provider)
        } else {
            None
        }
    }
}

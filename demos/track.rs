//! Run the driver against real hardware with a stdout publisher standing in
//! for the host runtime.

use std::sync::Arc;
use t265_openvr::{
    DeviceClass, DeviceDescriptor, DriverFactory, DriverPose, HostDeviceRegistry, HostEvent,
    HostEventSource, HostPosePublisher, HostPropertyRegistry, Property, PropertyValue,
    ServerProvider, TrackedDevice, TrackedDeviceIndex, UsbPoseSource, SERVER_PROVIDER_INTERFACE,
};

struct StdoutPublisher;

impl HostPosePublisher for StdoutPublisher {
    fn pose_updated(&self, index: TrackedDeviceIndex, pose: &DriverPose) {
        println!(
            "[{}] pos: [{:.3}, {:.3}, {:.3}] rot: [{:.3}, {:.3}, {:.3}, {:.3}] valid: {}",
            index,
            pose.position[0],
            pose.position[1],
            pose.position[2],
            pose.rotation.w,
            pose.rotation.x,
            pose.rotation.y,
            pose.rotation.z,
            pose.pose_is_valid,
        );
    }
}

struct LoggingRegistry;

impl HostDeviceRegistry for LoggingRegistry {
    fn tracked_device_added(&mut self, serial: &str, class: DeviceClass) {
        println!("device added: {serial} ({class:?})");
    }
}

struct LoggingProperties;

impl HostPropertyRegistry for LoggingProperties {
    fn set_property(&mut self, key: Property, value: PropertyValue) {
        println!("property {key:?} = {value:?}");
    }
}

struct NoEvents;

impl HostEventSource for NoEvents {
    fn poll_next_event(&mut self) -> Option<HostEvent> {
        None
    }
}

fn main() -> t265_openvr::Result<()> {
    env_logger::init();

    let device = TrackedDevice::new(
        DeviceDescriptor::default(),
        Box::new(UsbPoseSource::new()),
        Arc::new(StdoutPublisher),
    );
    let mut factory = DriverFactory::new(ServerProvider::new(device));

    let provider = factory
        .get_interface(SERVER_PROVIDER_INTERFACE)
        .expect("provider interface");
    provider.init(&mut LoggingRegistry);
    provider
        .device_mut()
        .activate(1, &mut LoggingProperties)?;

    let mut events = NoEvents;
    loop {
        provider.run_frame(&mut events);
        std::thread::sleep(std::time::Duration::from_millis(11));
    }
}

use crate::error::{Error, Result};
use crate::protocol::{T265_BOOT_PID, T265_BOOT_VID, T265_PID, T265_VID};
use log::warn;
use rusb::{DeviceHandle, GlobalContext, UsbContext};
use std::time::Duration;

pub struct DiscoveredDevice {
    pub handle: DeviceHandle<GlobalContext>,
    pub serial: String,
}

/// Open the first T265 on the bus and claim its control interface.
///
/// Devices still in bootloader mode are counted and skipped; they need
/// firmware loaded by librealsense tooling before they can stream.
pub fn open_first() -> Result<DiscoveredDevice> {
    let context = GlobalContext::default();
    let mut bootloader_count = 0usize;

    for device in context.devices()?.iter() {
        let descriptor = device.device_descriptor()?;

        if descriptor.vendor_id() == T265_BOOT_VID && descriptor.product_id() == T265_BOOT_PID {
            bootloader_count += 1;
            continue;
        }
        if descriptor.vendor_id() != T265_VID || descriptor.product_id() != T265_PID {
            continue;
        }

        let handle = device.open()?;
        let timeout = Duration::from_secs(1);
        let serial = handle
            .read_languages(timeout)
            .ok()
            .and_then(|languages| languages.first().copied())
            .and_then(|language| {
                handle
                    .read_serial_number_string(language, &descriptor, timeout)
                    .ok()
            })
            .unwrap_or_else(|| "unknown".to_string());

        handle.claim_interface(0)?;
        return Ok(DiscoveredDevice { handle, serial });
    }

    if bootloader_count > 0 {
        warn!(
            "{} device(s) stuck in bootloader mode; load firmware with rs-enumerate-devices first",
            bootloader_count
        );
    }
    Err(Error::DeviceNotFound)
}

use crate::discovery::{self, DiscoveredDevice};
use crate::error::{Error, Result};
use crate::pose::{Confidence, PoseSample};
use crate::protocol::*;
use log::{debug, info, warn};
use rusb::{DeviceHandle, GlobalContext};

/// A live pose stream: a lazy, infinite, non-restartable sequence of
/// samples. Dropping the session is the only way to stop it.
pub trait PoseSession: Send {
    /// Block until the next sample arrives or the transport's poll timeout
    /// elapses. `Ok(None)` means no sample was available in time; callers
    /// re-check their stop condition before pulling again. An error is
    /// fatal to the session; callers must not retry.
    fn next_sample(&mut self) -> Result<Option<PoseSample>>;
}

/// Capability that starts a streaming session against the sensor.
pub trait SensorSource: Send {
    fn open(&mut self) -> Result<Box<dyn PoseSession>>;
}

/// Pose source backed directly by the T265's USB endpoints.
pub struct UsbPoseSource {
    mode: u8,
}

impl UsbPoseSource {
    pub fn new() -> Self {
        Self::with_mode(SIXDOF_MODE_ENABLE_MAPPING | SIXDOF_MODE_ENABLE_RELOCALIZATION)
    }

    /// Use a specific 6-DoF mode (`SIXDOF_MODE_*` flags) for opened sessions.
    pub fn with_mode(mode: u8) -> Self {
        Self { mode }
    }
}

impl Default for UsbPoseSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for UsbPoseSource {
    fn open(&mut self) -> Result<Box<dyn PoseSession>> {
        let DiscoveredDevice { handle, serial } = discovery::open_first()?;
        let mut session = UsbPoseSession {
            handle,
            serial,
            buffer: vec![0u8; 128],
        };
        session.enable_6dof(self.mode)?;
        session.start_streaming()?;
        info!("pose stream started on device {}", session.serial);
        Ok(Box::new(session))
    }
}

struct UsbPoseSession {
    handle: DeviceHandle<GlobalContext>,
    serial: String,
    buffer: Vec<u8>,
}

impl UsbPoseSession {
    fn bulk_request<Req: bytemuck::Pod, Resp: bytemuck::Pod>(&self, request: &Req) -> Result<Resp> {
        self.handle
            .write_bulk(ENDPOINT_CONTROL_OUT, bytemuck::bytes_of(request), USB_TIMEOUT)?;

        let mut response_buf = vec![0u8; 1024];
        let size = self
            .handle
            .read_bulk(ENDPOINT_CONTROL_IN, &mut response_buf, USB_TIMEOUT)?;

        if size < std::mem::size_of::<Resp>() {
            return Err(Error::MalformedFrame {
                expected: std::mem::size_of::<Resp>(),
                actual: size,
            });
        }

        let response: Resp =
            bytemuck::pod_read_unaligned(&response_buf[..std::mem::size_of::<Resp>()]);

        if std::mem::size_of::<Resp>() >= std::mem::size_of::<BulkResponseHeader>() {
            let header: BulkResponseHeader = bytemuck::pod_read_unaligned(
                &response_buf[..std::mem::size_of::<BulkResponseHeader>()],
            );
            let status = header.status;
            let message_id = header.message_id;
            if status != SUCCESS {
                return Err(Error::SensorUnavailable(format!(
                    "control request {message_id:#x} failed with status {status:#x}"
                )));
            }
        }

        Ok(response)
    }

    fn enable_6dof(&mut self, mode: u8) -> Result<()> {
        let request = BulkRequest6DofControl {
            header: BulkRequestHeader {
                length: 9,
                message_id: SLAM_6DOF_CONTROL,
            },
            enable: 1,
            mode,
        };
        let _response: BulkResponse6DofControl = self.bulk_request(&request)?;
        Ok(())
    }

    fn start_streaming(&mut self) -> Result<()> {
        let request = BulkRequestStart {
            header: BulkRequestHeader {
                length: 4,
                message_id: DEV_START,
            },
        };
        let _response: BulkResponseStart = self.bulk_request(&request)?;
        Ok(())
    }

    fn stop_streaming(&mut self) -> Result<()> {
        let request = BulkRequestStop {
            header: BulkRequestHeader {
                length: 4,
                message_id: DEV_STOP,
            },
        };
        let _response: BulkResponseStop = self.bulk_request(&request)?;
        Ok(())
    }
}

// Interrupt reads use a short poll interval so a silent device hands
// control back to the caller's stop check instead of pinning the thread.
const POLL_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(1000);

impl PoseSession for UsbPoseSession {
    fn next_sample(&mut self) -> Result<Option<PoseSample>> {
        loop {
            let size = match self
                .handle
                .read_interrupt(ENDPOINT_INTERRUPT_IN, &mut self.buffer, POLL_TIMEOUT)
            {
                Ok(size) => size,
                Err(rusb::Error::Timeout) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            match decode_frame(&self.buffer[..size])? {
                Some(sample) => return Ok(Some(sample)),
                None => continue,
            }
        }
    }
}

impl Drop for UsbPoseSession {
    fn drop(&mut self) {
        if let Err(e) = self.stop_streaming() {
            debug!("stop request on device {} failed: {}", self.serial, e);
        }
    }
}

/// Decode one interrupt transfer. `Ok(Some)` is a pose sample, `Ok(None)` a
/// frame to skip (SLAM warnings, relocalization events, benign status,
/// unknown ids), `Err` a condition fatal to the session. A truncated pose
/// payload is fatal; a truncated auxiliary message is skipped.
fn decode_frame(frame: &[u8]) -> Result<Option<PoseSample>> {
    let header_size = std::mem::size_of::<InterruptHeader>();
    if frame.len() < header_size {
        return Err(Error::MalformedFrame {
            expected: header_size,
            actual: frame.len(),
        });
    }
    let header: InterruptHeader = bytemuck::pod_read_unaligned(&frame[..header_size]);

    match header.message_id {
        DEV_GET_POSE => {
            let expected = std::mem::size_of::<InterruptGetPose>();
            if frame.len() < expected {
                return Err(Error::MalformedFrame {
                    expected,
                    actual: frame.len(),
                });
            }
            let message: InterruptGetPose = bytemuck::pod_read_unaligned(&frame[..expected]);
            Ok(Some(sample_from_wire(message.pose)))
        }
        DEV_ERROR => {
            let status = read_status(frame).unwrap_or(0);
            Err(Error::SensorUnavailable(format!(
                "device error {status:#x}"
            )))
        }
        SLAM_ERROR => {
            if let Some(status) = read_status(frame) {
                warn!("SLAM error {:#x}, continuing", status);
            }
            Ok(None)
        }
        SLAM_RELOCALIZATION_EVENT => {
            let expected = std::mem::size_of::<InterruptRelocalizationEvent>();
            if frame.len() >= expected {
                let message: InterruptRelocalizationEvent =
                    bytemuck::pod_read_unaligned(&frame[..expected]);
                let timestamp_ns = message.nanoseconds;
                let session_id = message.session_id;
                if session_id == 0 {
                    info!("relocalized within current session at {} ns", timestamp_ns);
                } else {
                    info!(
                        "relocalized from previous session {} at {} ns",
                        session_id, timestamp_ns
                    );
                }
            }
            Ok(None)
        }
        DEV_STATUS => match read_status(frame) {
            Some(DEVICE_STOPPED) => Err(Error::SensorUnavailable("device stopped".into())),
            Some(TEMPERATURE_WARNING) => {
                warn!("device temperature warning");
                Ok(None)
            }
            Some(status) => {
                warn!("unknown device status {:#x}, continuing", status);
                Ok(None)
            }
            None => Ok(None),
        },
        unknown => {
            warn!("unknown interrupt message id {:#x}, skipping", unknown);
            Ok(None)
        }
    }
}

fn read_status(frame: &[u8]) -> Option<u16> {
    let expected = std::mem::size_of::<InterruptStatus>();
    if frame.len() < expected {
        return None;
    }
    let message: InterruptStatus = bytemuck::pod_read_unaligned(&frame[..expected]);
    Some(message.status)
}

fn sample_from_wire(data: PoseData) -> PoseSample {
    PoseSample {
        position: [data.x, data.y, data.z],
        orientation: [data.qi, data.qj, data.qk, data.qr],
        velocity: [data.vx, data.vy, data.vz],
        angular_velocity: [data.vax, data.vay, data.vaz],
        acceleration: [data.ax, data.ay, data.az],
        angular_acceleration: [data.aax, data.aay, data.aaz],
        timestamp_ns: data.nanoseconds,
        confidence: Confidence::from(data.tracker_confidence),
    }
}

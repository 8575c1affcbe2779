use crate::device::{TrackedDeviceIndex, TRACKED_DEVICE_INDEX_INVALID};
use crate::pose::DriverPose;
use crate::source::PoseSession;
use log::error;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Sink for pose updates on the host side. Called from the acquisition
/// thread, never from the host's tick thread.
pub trait HostPosePublisher: Send + Sync {
    fn pose_updated(&self, index: TrackedDeviceIndex, pose: &DriverPose);
}

/// Owns the acquisition thread that pumps samples from a [`PoseSession`]
/// into a [`HostPosePublisher`] while the shared identity slot is valid.
pub struct PoseBridge {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PoseBridge {
    /// Spawn the acquisition thread. Fails if the thread itself cannot be
    /// created; that failure must abort activation.
    pub fn spawn(
        session: Box<dyn PoseSession>,
        identity: Arc<AtomicU32>,
        publisher: Arc<dyn HostPosePublisher>,
    ) -> crate::Result<PoseBridge> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = std::thread::Builder::new()
            .name("pose-bridge".into())
            .spawn(move || acquisition_loop(session, identity, publisher, flag))?;
        Ok(PoseBridge {
            running,
            handle: Some(handle),
        })
    }

    /// Signal the loop and wait for it to exit. The loop observes the flag
    /// at each iteration head; a blocked sensor read delays the join until
    /// the next sample or transfer timeout.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PoseBridge {
    fn drop(&mut self) {
        self.stop();
    }
}

fn acquisition_loop(
    mut session: Box<dyn PoseSession>,
    identity: Arc<AtomicU32>,
    publisher: Arc<dyn HostPosePublisher>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        let sample = match session.next_sample() {
            Ok(Some(sample)) => sample,
            // No sample within the transport timeout; back to the stop
            // check so a silent device cannot wedge the join.
            Ok(None) => continue,
            // Fatal to this bridge only; no retry. Pose delivery resumes on
            // the next activation.
            Err(e) => {
                error!("pose acquisition stopped: {}", e);
                break;
            }
        };

        // Relaxed is enough for the identity slot: a stale read delays the
        // effect of an activate or deactivate by at most one sample.
        let index = identity.load(Ordering::Relaxed);
        if index == TRACKED_DEVICE_INDEX_INVALID {
            continue;
        }
        publisher.pose_updated(index, &DriverPose::from(&sample));
    }
}

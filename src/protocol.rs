//! USB wire format for the T265's control (bulk) and pose (interrupt)
//! endpoints, limited to the messages the pose path needs.

// Reserved and padding fields exist for layout only and are never read.
#![allow(dead_code)]

use bytemuck::{Pod, Zeroable};

pub const ENDPOINT_CONTROL_OUT: u8 = 0x02;
pub const ENDPOINT_CONTROL_IN: u8 = 0x82;
pub const ENDPOINT_INTERRUPT_IN: u8 = 0x83;

pub const T265_VID: u16 = 0x8087;
pub const T265_PID: u16 = 0x0B37;

// A device stuck in bootloader mode enumerates under these ids and cannot
// stream until firmware is loaded.
pub const T265_BOOT_VID: u16 = 0x03E7;
pub const T265_BOOT_PID: u16 = 0x2150;

pub const USB_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(10000);

pub const DEV_START: u16 = 0x0012;
pub const DEV_STOP: u16 = 0x0013;
pub const DEV_STATUS: u16 = 0x0014;
pub const DEV_GET_POSE: u16 = 0x0015;
pub const SLAM_6DOF_CONTROL: u16 = 0x1006;
pub const SLAM_RELOCALIZATION_EVENT: u16 = 0x100E;
pub const DEV_ERROR: u16 = 0x8000;
pub const SLAM_ERROR: u16 = 0x9000;

pub const SUCCESS: u16 = 0x0000;
pub const DEVICE_STOPPED: u16 = 0x000C;
pub const TEMPERATURE_WARNING: u16 = 0x0010;

pub const SIXDOF_MODE_NORMAL: u8 = 0x00;
pub const SIXDOF_MODE_ENABLE_MAPPING: u8 = 0x02;
pub const SIXDOF_MODE_ENABLE_RELOCALIZATION: u8 = 0x04;
pub const SIXDOF_MODE_DISABLE_JUMPING: u8 = 0x08;

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BulkRequestHeader {
    pub length: u32,
    pub message_id: u16,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BulkResponseHeader {
    pub length: u32,
    pub message_id: u16,
    pub status: u16,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InterruptHeader {
    pub length: u32,
    pub message_id: u16,
}

/// Raw 6-DoF payload of a DEV_GET_POSE interrupt message.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PoseData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub qi: f32,
    pub qj: f32,
    pub qk: f32,
    pub qr: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub vax: f32,
    pub vay: f32,
    pub vaz: f32,
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
    pub aax: f32,
    pub aay: f32,
    pub aaz: f32,
    pub nanoseconds: u64,
    pub tracker_confidence: u32,
    pub mapper_confidence: u32,
    pub tracker_state: u32,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InterruptGetPose {
    pub header: InterruptHeader,
    pub index: u8,
    pub reserved: u8,
    pub pose: PoseData,
}

/// Shared shape of DEV_STATUS, DEV_ERROR and SLAM_ERROR interrupt messages.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InterruptStatus {
    pub header: InterruptHeader,
    pub status: u16,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InterruptRelocalizationEvent {
    pub header: InterruptHeader,
    pub nanoseconds: u64,
    pub session_id: u16,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BulkRequest6DofControl {
    pub header: BulkRequestHeader,
    pub enable: u8,
    pub mode: u8,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BulkResponse6DofControl {
    pub header: BulkResponseHeader,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BulkRequestStart {
    pub header: BulkRequestHeader,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BulkResponseStart {
    pub header: BulkResponseHeader,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BulkRequestStop {
    pub header: BulkRequestHeader,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BulkResponseStop {
    pub header: BulkResponseHeader,
}

//! Accelerator discovery and memory-growth setup
//!
//! Before the first inference the predictor lists the physical accelerators
//! and switches each of them to incremental memory allocation. The setup is a
//! plain function over a device list so it can be called again without
//! side effects.

use serde::{Deserialize, Serialize};

/// Kind of accelerator an inference backend can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Cuda,
    CoreMl,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cuda => write!(f, "CUDA"),
            Self::CoreMl => write!(f, "CoreML"),
        }
    }
}

/// A discovered accelerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceleratorDevice {
    pub kind: DeviceKind,
    pub id: i32,
    /// Allocate memory on demand instead of reserving the arena up front
    pub memory_growth: bool,
}

impl AcceleratorDevice {
    #[must_use]
    pub fn new(kind: DeviceKind, id: i32) -> Self {
        Self {
            kind,
            id,
            memory_growth: false,
        }
    }
}

impl std::fmt::Display for AcceleratorDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// List the accelerators visible to the compiled backends
///
/// Only the ONNX Runtime backend can drive accelerators. CUDA device ids are
/// taken from `CUDA_VISIBLE_DEVICES` when it is set, otherwise device 0 is
/// assumed once the CUDA provider reports itself available.
#[must_use]
pub fn list_physical_devices() -> Vec<AcceleratorDevice> {
    #[cfg(feature = "onnx")]
    {
        let mut devices = Vec::new();
        let (cuda_available, coreml_available) = crate::backends::OnnxBackend::accelerators();

        if cuda_available {
            let visible = std::env::var("CUDA_VISIBLE_DEVICES").ok();
            for id in cuda_device_ids(visible.as_deref()) {
                devices.push(AcceleratorDevice::new(DeviceKind::Cuda, id));
            }
        }
        if coreml_available {
            devices.push(AcceleratorDevice::new(DeviceKind::CoreMl, 0));
        }

        tracing::debug!(count = devices.len(), "Discovered accelerator devices");
        devices
    }

    #[cfg(not(feature = "onnx"))]
    {
        tracing::debug!("No accelerator-capable backend compiled in");
        Vec::new()
    }
}

/// Parse a `CUDA_VISIBLE_DEVICES` value into device ordinals
///
/// The runtime renumbers visible devices from zero, so the result is the
/// ordinal range, not the listed ids. An empty value hides every device.
#[must_use]
pub fn cuda_device_ids(visible: Option<&str>) -> Vec<i32> {
    match visible {
        None => vec![0],
        Some(list) => {
            let count = list
                .split(',')
                .map(str::trim)
                .take_while(|id| !id.is_empty() && *id != "-1")
                .count();
            (0..count).filter_map(|i| i32::try_from(i).ok()).collect()
        },
    }
}

/// Enable incremental memory allocation on every device
///
/// Returns how many devices changed. Calling it again on the same list
/// changes nothing.
pub fn enable_memory_growth(devices: &mut [AcceleratorDevice]) -> usize {
    let mut configured = 0;
    for device in devices.iter_mut().filter(|d| !d.memory_growth) {
        device.memory_growth = true;
        configured += 1;
        tracing::debug!(device = %device, "Enabled memory growth");
    }
    configured
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_memory_growth_is_idempotent() {
        let mut devices = vec![
            AcceleratorDevice::new(DeviceKind::Cuda, 0),
            AcceleratorDevice::new(DeviceKind::Cuda, 1),
        ];

        assert_eq!(enable_memory_growth(&mut devices), 2);
        assert!(devices.iter().all(|d| d.memory_growth));

        assert_eq!(enable_memory_growth(&mut devices), 0);
        assert!(devices.iter().all(|d| d.memory_growth));
    }

    #[test]
    fn test_enable_memory_growth_empty_list() {
        let mut devices: Vec<AcceleratorDevice> = Vec::new();
        assert_eq!(enable_memory_growth(&mut devices), 0);
    }

    #[test]
    fn test_cuda_device_ids() {
        assert_eq!(cuda_device_ids(None), vec![0]);
        assert_eq!(cuda_device_ids(Some("")), Vec::<i32>::new());
        assert_eq!(cuda_device_ids(Some("-1")), Vec::<i32>::new());
        assert_eq!(cuda_device_ids(Some("2,3")), vec![0, 1]);
        assert_eq!(cuda_device_ids(Some("5, 1, -1, 2")), vec![0, 1]);
    }

    #[test]
    fn test_device_display() {
        let device = AcceleratorDevice::new(DeviceKind::Cuda, 1);
        assert_eq!(device.to_string(), "CUDA:1");
        assert!(!device.memory_growth);
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_no_accelerators_without_onnx() {
        assert!(list_physical_devices().is_empty());
    }
}

//! Compute device selection

use candle_core::Device;
use tracing::info;

use crate::{ClassifierError, Result};

/// Pick the best available device: CUDA, then Metal, then CPU.
///
/// An accelerator that is present but fails to initialize is an error.
pub fn select_device() -> Result<Device> {
    let cuda = Device::cuda_if_available(0).map_err(ClassifierError::Device)?;
    if cuda.is_cuda() {
        info!("Using device: cuda:0");
        return Ok(cuda);
    }

    let metal = Device::metal_if_available(0).map_err(ClassifierError::Device)?;
    if metal.is_metal() {
        info!("Using device: metal:0");
        return Ok(metal);
    }

    info!("Using device: cpu");
    Ok(Device::Cpu)
}

/// Short device name for logs
pub fn device_name(device: &Device) -> &'static str {
    if device.is_cuda() {
        "cuda"
    } else if device.is_metal() {
        "metal"
    } else {
        "cpu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_device() {
        let device = select_device().unwrap();
        if !candle_core::utils::cuda_is_available() && !candle_core::utils::metal_is_available() {
            assert!(device.is_cpu());
        }
    }

    #[test]
    fn test_device_name() {
        assert_eq!(device_name(&Device::Cpu), "cpu");
    }
}

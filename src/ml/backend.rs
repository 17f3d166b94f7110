use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu};
use serde::{Deserialize, Serialize};
use std::fmt;

/// GPU through wgpu (Vulkan / Metal / DX12)
pub type GpuBackend = Wgpu;
/// Pure-Rust CPU backend
pub type CpuBackend = NdArray<f32>;

pub type GpuTrainBackend = Autodiff<GpuBackend>;
pub type CpuTrainBackend = Autodiff<CpuBackend>;

/// Where tensors live, chosen with `--device`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// GPU through wgpu
    #[default]
    #[value(alias = "gpu")]
    Wgpu,
    /// NdArray on the CPU
    Cpu,
}

impl DeviceKind {
    pub fn wgpu_device() -> WgpuDevice {
        WgpuDevice::default()
    }

    pub fn cpu_device() -> NdArrayDevice {
        NdArrayDevice::Cpu
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wgpu => write!(f, "wgpu"),
            Self::Cpu  => write!(f, "cpu"),
        }
    }
}

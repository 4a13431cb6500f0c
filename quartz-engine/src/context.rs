//! Engine context: ownership of all reusable GPU resources.
//!
//! An [`EngineContext`] binds one adapter, one device, one command
//! queue and one compiled pipeline per kernel. It is created once and
//! reused for every dispatch; dropping it releases everything. There
//! is no global or static GPU state anywhere in this crate, so any
//! number of contexts can coexist without interference.

use std::borrow::Cow;

use wgpu::{Adapter, ComputePipeline, Device, Instance, Queue};

use crate::error::EngineError;
use crate::kernels::KERNELS_WGSL;

/// The compute pipelines compiled from the embedded WGSL module, one
/// per kernel entry point.
pub(crate) struct KernelSet {
    pub matmul: ComputePipeline,
    pub row_sum: ComputePipeline,
}

impl KernelSet {
    fn new(device: &Device) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quartz Kernels"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(KERNELS_WGSL)),
        });

        let compile = |entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry_point),
                layout: None,
                module: &module,
                entry_point,
            })
        };

        Self {
            matmul: compile("matmul"),
            row_sum: compile("row_sum"),
        }
    }
}

/// Owns the per-engine GPU resources: device binding, command queue
/// and precompiled kernel pipelines.
///
/// Operations in [`crate::ops`] borrow a context; they never create
/// GPU state of their own. Resources are released when the context is
/// dropped.
pub struct EngineContext {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
    pub(crate) kernels: KernelSet,
}

impl EngineContext {
    /// Bind a GPU adapter, create a device and queue, and compile all
    /// kernel pipelines. Blocks until the device is ready.
    ///
    /// Returns [`EngineError::NoAdapter`] when no compatible GPU is
    /// present; this is an expected condition and callers should fall
    /// back to a CPU implementation.
    pub fn new() -> Result<Self, EngineError> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Result<Self, EngineError> {
        let instance = Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or(EngineError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .map_err(|e| EngineError::DeviceRequest(e.to_string()))?;

        let kernels = KernelSet::new(&device);

        let info = adapter.get_info();
        log::debug!(
            "engine context created on {} ({:?})",
            info.name,
            info.backend
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            kernels,
        })
    }

    /// Human-readable description of the bound adapter.
    pub fn adapter_info(&self) -> String {
        let info = self.adapter.get_info();
        format!("{} ({:?})", info.name, info.backend)
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("adapter", &self.adapter_info())
            .finish()
    }
}

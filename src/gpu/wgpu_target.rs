//! Storage buffers on a [wgpu] device

use log::debug;

use super::{Binding, BufferTarget};

/// Binding sizes must be non-zero, so empty arrays still get one slot.
const MIN_BUFFER_SIZE: u64 = 16;

const EMPTY_SLOT: [u8; MIN_BUFFER_SIZE as usize] = [0; MIN_BUFFER_SIZE as usize];

/// Size of the storage buffer holding `len` bytes of scene data.
fn buffer_size(len: usize) -> u64 {
    (len as u64).max(MIN_BUFFER_SIZE)
}

/// Bytes written for an upload; an empty array clears its placeholder slot.
fn upload_bytes(bytes: &[u8]) -> &[u8] {
    if bytes.is_empty() {
        &EMPTY_SLOT
    } else {
        bytes
    }
}

/// The four scene storage buffers, kept alive between uploads.
#[derive(Debug, Default)]
pub struct WgpuBuffers {
    buffers: [Option<wgpu::Buffer>; 4],
}

impl WgpuBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows the buffers as an upload target on `device` / `queue`.
    pub fn target<'a>(&'a mut self, device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> WgpuUpload<'a> {
        WgpuUpload {
            device,
            queue,
            buffers: self,
        }
    }

    pub fn get(&self, binding: Binding) -> Option<&wgpu::Buffer> {
        self.buffers[binding.index() as usize].as_ref()
    }

    /// Layout with a read-only storage buffer at each scene binding.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let entries = Binding::ALL.map(|binding| wgpu::BindGroupLayoutEntry {
            binding: binding.index(),
            visibility: wgpu::ShaderStages::COMPUTE | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_layout"),
            entries: &entries,
        })
    }

    /// Binds all four buffers; `None` until every binding has been uploaded.
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> Option<wgpu::BindGroup> {
        let mut entries = Vec::with_capacity(Binding::ALL.len());
        for binding in Binding::ALL {
            entries.push(wgpu::BindGroupEntry {
                binding: binding.index(),
                resource: self.get(binding)?.as_entire_binding(),
            });
        }
        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout,
            entries: &entries,
        }))
    }
}

/// Upload target writing into [WgpuBuffers] through a device queue.
pub struct WgpuUpload<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    buffers: &'a mut WgpuBuffers,
}

impl BufferTarget for WgpuUpload<'_> {
    fn write(&mut self, binding: Binding, bytes: &[u8]) {
        let size = buffer_size(bytes.len());
        let slot = &mut self.buffers.buffers[binding.index() as usize];

        // buffers are only reused when the size matches exactly
        if slot.as_ref().map_or(true, |buffer| buffer.size() != size) {
            if let Some(old) = slot.take() {
                old.destroy();
            }
            debug!("allocating {size} byte storage buffer for {}", binding.label());
            *slot = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(binding.label()),
                size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }

        if let Some(buffer) = slot.as_ref() {
            self.queue.write_buffer(buffer, 0, upload_bytes(bytes));
        }
    }
}

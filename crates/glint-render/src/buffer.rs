use bytemuck::Pod;
use glint_test_utils::{BufferId, BufferKind, BufferUsage, GraphicsDevice, UploadMode};

/// Device-side storage with a tracked allocation size.
///
/// Uploads reuse the existing allocation whenever the data fits and only
/// reallocate when it grows. The allocation never shrinks.
#[derive(Debug)]
pub struct GpuBuffer {
    id: BufferId,
    kind: BufferKind,
    usage: BufferUsage,
    size: u64,
}

impl GpuBuffer {
    /// Create an empty buffer. The first [`update`](Self::update) allocates.
    pub fn new(device: &dyn GraphicsDevice, kind: BufferKind, usage: BufferUsage) -> Self {
        let id = device.create_buffer(kind, usage);
        Self {
            id,
            kind,
            usage,
            size: 0,
        }
    }

    /// Create a buffer with `bytes` of storage already allocated.
    ///
    /// Only the size is sent to the device; no host-side data is built.
    pub fn with_capacity(
        device: &dyn GraphicsDevice,
        kind: BufferKind,
        usage: BufferUsage,
        bytes: u64,
    ) -> Self {
        let mut buffer = Self::new(device, kind, usage);
        if bytes > 0 {
            device.allocate_buffer(buffer.id, bytes);
            buffer.size = bytes;
        }
        buffer
    }

    /// Upload `data` to the start of the buffer.
    ///
    /// Returns the upload mode used.
    pub fn update<T: Pod>(&mut self, device: &dyn GraphicsDevice, data: &[T]) -> UploadMode {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let len = bytes.len() as u64;

        let mode = if len > self.size {
            tracing::debug!(
                "Growing {:?} buffer {:?}: {} -> {} bytes",
                self.kind,
                self.id,
                self.size,
                len
            );
            self.size = len;
            UploadMode::Reallocate
        } else {
            UploadMode::SubData
        };

        device.upload_buffer(self.id, bytes, mode);
        mode
    }

    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if !self.id.is_null() {
            device.destroy_buffer(self.id);
            self.id = BufferId::NULL;
            self.size = 0;
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Current allocation in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

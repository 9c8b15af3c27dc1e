//! Destinations for encoded scene buffers

use std::{io, path::Path};

use log::debug;

use super::Binding;

/// Receives the encoded scene arrays, one binding at a time.
///
/// Every write replaces whatever the binding held before in full.
pub trait BufferTarget {
    fn write(&mut self, binding: Binding, bytes: &[u8]);
}

/// CPU-side copy of the four bindings.
///
/// Used for inspection and for dumping the layout to disk, where another
/// process can map the files straight into GPU memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostBuffers {
    bindings: [Vec<u8>; 4],
}

impl HostBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, binding: Binding) -> &[u8] {
        &self.bindings[binding.index() as usize]
    }

    /// Writes each binding to `<dir>/<label>.bin`, creating `dir` if needed.
    pub fn write_to_dir(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)?;
        for binding in Binding::ALL {
            let path = dir.join(format!("{}.bin", binding.label()));
            std::fs::write(&path, self.get(binding))?;
            debug!("wrote {} bytes to {}", self.get(binding).len(), path.display());
        }
        Ok(())
    }
}

impl BufferTarget for HostBuffers {
    fn write(&mut self, binding: Binding, bytes: &[u8]) {
        let slot = &mut self.bindings[binding.index() as usize];
        slot.clear();
        slot.extend_from_slice(bytes);
    }
}

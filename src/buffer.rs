//! Host/device mirrored storage.
//!
//! Kernels only ever touch the device copy and callers only the host copy.
//! Moving data between the two is explicit, and reading a copy that is older
//! than the other one is an error instead of a silent use of stale values.

use smartstring::{LazyCompact, SmartString};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Device copy of buffer '{0}' is stale, upload the host copy first")]
    StaleDevice(String),
    #[error("Host copy of buffer '{0}' is stale, download the device copy first")]
    StaleHost(String),
    #[error("Buffer '{name}' holds {actual} elements, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Synced,
    HostModified,
    DeviceModified,
}

#[derive(Debug, Clone)]
pub struct MirroredBuffer<T> {
    name: SmartString<LazyCompact>,
    host: Vec<T>,
    device: Vec<T>,
    state: SyncState,
}

impl<T: Clone + Default> MirroredBuffer<T> {
    /// Zero-initialised buffer with both copies in sync.
    pub fn new(name: &str, len: usize) -> Self {
        MirroredBuffer {
            name: name.into(),
            host: vec![T::default(); len],
            device: vec![T::default(); len],
            state: SyncState::Synced,
        }
    }

    /// Buffer whose host copy holds `data`. The device copy is stale until
    /// the first `upload`.
    pub fn from_host(name: &str, data: Vec<T>) -> Self {
        let len = data.len();
        MirroredBuffer {
            name: name.into(),
            host: data,
            device: vec![T::default(); len],
            state: SyncState::HostModified,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.host.len()
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn host(&self) -> Result<&[T], BufferError> {
        match self.state {
            SyncState::DeviceModified => Err(BufferError::StaleHost(self.name.to_string())),
            _ => Ok(&self.host),
        }
    }

    pub fn host_mut(&mut self) -> &mut [T] {
        self.state = SyncState::HostModified;
        &mut self.host
    }

    /// Replaces the host contents, resizing both copies.
    pub fn set_host(&mut self, data: Vec<T>) {
        self.device.resize(data.len(), T::default());
        self.host = data;
        self.state = SyncState::HostModified;
    }

    pub fn device(&self) -> Result<&[T], BufferError> {
        match self.state {
            SyncState::HostModified => Err(BufferError::StaleDevice(self.name.to_string())),
            _ => Ok(&self.device),
        }
    }

    pub fn device_mut(&mut self) -> Result<&mut [T], BufferError> {
        match self.state {
            SyncState::HostModified => Err(BufferError::StaleDevice(self.name.to_string())),
            _ => {
                self.state = SyncState::DeviceModified;
                Ok(&mut self.device)
            }
        }
    }

    /// host → device
    pub fn upload(&mut self) {
        self.device.clone_from_slice(&self.host);
        self.state = SyncState::Synced;
    }

    /// device → host
    pub fn download(&mut self) {
        self.host.clone_from_slice(&self.device);
        self.state = SyncState::Synced;
    }

    pub fn check_len(&self, expected: usize) -> Result<(), BufferError> {
        if self.len() == expected {
            Ok(())
        } else {
            Err(BufferError::LengthMismatch {
                name: self.name.to_string(),
                expected,
                actual: self.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_copies_are_detected() {
        let mut buffer = MirroredBuffer::from_host("momenta", vec![1.0, 2.0, 3.0]);
        assert_eq!(
            buffer.device().unwrap_err(),
            BufferError::StaleDevice("momenta".to_string())
        );
        assert!(buffer.device_mut().is_err());

        buffer.upload();
        assert_eq!(buffer.device().unwrap(), &[1.0, 2.0, 3.0]);

        buffer.host_mut()[1] = 5.0;
        assert_eq!(buffer.state(), SyncState::HostModified);
        assert!(buffer.device().is_err());
        buffer.upload();
        assert_eq!(buffer.device().unwrap()[1], 5.0);
    }

    #[test]
    fn device_writes_need_a_download() {
        let mut buffer = MirroredBuffer::<f64>::new("output", 2);
        buffer.device_mut().unwrap()[0] = 4.0;
        assert_eq!(
            buffer.host().unwrap_err(),
            BufferError::StaleHost("output".to_string())
        );
        buffer.download();
        assert_eq!(buffer.host().unwrap(), &[4.0, 0.0]);
        assert_eq!(buffer.state(), SyncState::Synced);
    }

    #[test]
    fn resizing_and_length_checks() {
        let mut buffer = MirroredBuffer::<usize>::new("good_helicities", 0);
        assert!(buffer.is_empty());
        buffer.set_host(vec![3, 5, 7]);
        buffer.upload();
        assert_eq!(buffer.device().unwrap(), &[3, 5, 7]);
        assert!(buffer.check_len(3).is_ok());
        assert_eq!(
            buffer.check_len(4),
            Err(BufferError::LengthMismatch {
                name: "good_helicities".to_string(),
                expected: 4,
                actual: 3
            })
        );
    }
}

//! In-memory [`AudioTransport`] test double.
//!
//! Replays a fixed input buffer on `read` and records everything written to
//! an output buffer, with no real device — used to drive the RX/TX
//! pipelines end to end in tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{AudioError, AudioTransport, ReadStatus};

pub struct MemoryTransport {
    input: Vec<f32>,
    read_pos: AtomicUsize,
    output: Arc<Mutex<Vec<f32>>>,
    started: AtomicBool,
    aborted: Arc<AtomicBool>,
}

impl MemoryTransport {
    /// Build a transport that yields `input` on `read` (zero-padded once
    /// exhausted) and records `write`s.
    pub fn new(input: Vec<f32>) -> Self {
        Self {
            input,
            read_pos: AtomicUsize::new(0),
            output: Arc::new(Mutex::new(Vec::new())),
            started: AtomicBool::new(false),
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle to the recorded output buffer, readable concurrently with the
    /// pipeline thread still writing to it.
    pub fn output_handle(&self) -> Arc<Mutex<Vec<f32>>> {
        self.output.clone()
    }

    /// Snapshot of everything written so far.
    pub fn recorded(&self) -> Vec<f32> {
        self.output.lock().unwrap().clone()
    }
}

impl AudioTransport for MemoryTransport {
    fn open(
        &mut self,
        _device: &str,
        _sample_rate: u32,
        _frames_per_buffer: usize,
    ) -> Result<(), AudioError> {
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn read(&self, buf: &mut [f32]) -> Result<ReadStatus, AudioError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(AudioError::NotStarted);
        }
        if self.aborted.load(Ordering::SeqCst) {
            return Err(AudioError::Closed);
        }
        for slot in buf.iter_mut() {
            let pos = self.read_pos.fetch_add(1, Ordering::SeqCst);
            *slot = self.input.get(pos).copied().unwrap_or(0.0);
        }
        Ok(ReadStatus::Ok)
    }

    fn write(&self, buf: &[f32]) -> Result<(), AudioError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(AudioError::NotStarted);
        }
        self.output.lock().unwrap().extend_from_slice(buf);
        Ok(())
    }

    fn drain(&self) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    fn close(&mut self) -> Result<(), AudioError> {
        self.started.store(false, Ordering::SeqCst);
        self.aborted.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_replays_input_then_zero_pads() {
        let mut t = MemoryTransport::new(vec![1.0, 2.0, 3.0]);
        t.open("mem", 8000, 512).unwrap();
        t.start().unwrap();

        let mut buf = [0.0f32; 5];
        t.read(&mut buf).unwrap();
        assert_eq!(buf, [1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn write_accumulates_into_output_handle() {
        let mut t = MemoryTransport::new(vec![]);
        t.open("mem", 8000, 512).unwrap();
        t.start().unwrap();

        t.write(&[0.5, -0.5]).unwrap();
        t.write(&[1.0]).unwrap();
        assert_eq!(t.recorded(), vec![0.5, -0.5, 1.0]);
    }

    #[test]
    fn read_before_start_errors() {
        let mut t = MemoryTransport::new(vec![1.0]);
        let mut buf = [0.0f32; 1];
        assert!(matches!(t.read(&mut buf), Err(AudioError::NotStarted)));
    }

    #[test]
    fn abort_closes_pending_reads() {
        let mut t = MemoryTransport::new(vec![1.0]);
        t.open("mem", 8000, 512).unwrap();
        t.start().unwrap();
        t.abort();

        let mut buf = [0.0f32; 1];
        assert!(matches!(t.read(&mut buf), Err(AudioError::Closed)));
    }
}

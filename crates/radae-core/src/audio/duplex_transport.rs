//! Combines two single-direction transports into one full-duplex
//! [`AudioTransport`], since capture and playback are frequently different
//! physical devices (e.g. TX's microphone vs. radio interface) while the
//! trait itself is a single device-agnostic contract.

use super::{AudioError, AudioTransport, ReadStatus};

pub struct DuplexTransport {
    input: Box<dyn AudioTransport>,
    output: Box<dyn AudioTransport>,
}

impl DuplexTransport {
    pub fn new(input: Box<dyn AudioTransport>, output: Box<dyn AudioTransport>) -> Self {
        Self { input, output }
    }

    /// Open the input and output sides against independently-named devices;
    /// the controller uses this instead of the trait's single-device `open`.
    pub fn open_separate(
        &mut self,
        input_device: &str,
        output_device: &str,
        sample_rate: u32,
        frames_per_buffer: usize,
    ) -> Result<(), AudioError> {
        self.input.open(input_device, sample_rate, frames_per_buffer)?;
        self.output.open(output_device, sample_rate, frames_per_buffer)
    }
}

impl AudioTransport for DuplexTransport {
    fn open(
        &mut self,
        device: &str,
        sample_rate: u32,
        frames_per_buffer: usize,
    ) -> Result<(), AudioError> {
        self.open_separate(device, device, sample_rate, frames_per_buffer)
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.input.start()?;
        self.output.start()
    }

    fn read(&self, buf: &mut [f32]) -> Result<ReadStatus, AudioError> {
        self.input.read(buf)
    }

    fn write(&self, buf: &[f32]) -> Result<(), AudioError> {
        self.output.write(buf)
    }

    fn drain(&self) -> Result<(), AudioError> {
        self.output.drain()
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.input.stop()?;
        self.output.stop()
    }

    fn abort(&self) {
        self.input.abort();
        self.output.abort();
    }

    fn close(&mut self) -> Result<(), AudioError> {
        self.input.close()?;
        self.output.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryTransport;

    #[test]
    fn reads_from_input_and_writes_to_output_independently() {
        let mut input = MemoryTransport::new(vec![1.0, 2.0, 3.0]);
        input.open("in", 8000, 512).unwrap();
        input.start().unwrap();
        let mut output = MemoryTransport::new(vec![]);
        output.open("out", 8000, 512).unwrap();
        output.start().unwrap();
        let out_handle = output.output_handle();

        let mut duplex = DuplexTransport::new(Box::new(input), Box::new(output));

        let mut buf = [0.0f32; 3];
        duplex.read(&mut buf).unwrap();
        assert_eq!(buf, [1.0, 2.0, 3.0]);

        duplex.write(&[9.0, 8.0]).unwrap();
        assert_eq!(*out_handle.lock().unwrap(), vec![9.0, 8.0]);
    }

    #[test]
    fn abort_propagates_to_both_sides() {
        let mut input = MemoryTransport::new(vec![1.0]);
        input.open("in", 8000, 512).unwrap();
        input.start().unwrap();
        let mut output = MemoryTransport::new(vec![]);
        output.open("out", 8000, 512).unwrap();
        output.start().unwrap();

        let duplex = DuplexTransport::new(Box::new(input), Box::new(output));
        duplex.abort();

        let mut buf = [0.0f32; 1];
        assert!(matches!(duplex.read(&mut buf), Err(AudioError::Closed)));
    }
}

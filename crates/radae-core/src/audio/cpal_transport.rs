//! `cpal`-backed [`AudioTransport`](super::AudioTransport).
//!
//! cpal drives capture/playback through callbacks invoked on its own audio
//! thread; the transport bridges that to blocking `read`/`write` with one
//! bounded `crossbeam-channel` ring per direction. `read` blocks on the
//! capture channel's receiver; `write` blocks on the playback channel's
//! sender, so a full ring applies backpressure to the caller rather than
//! growing without bound.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::stderr_guard;
use super::{AudioError, AudioTransport, ReadStatus};

/// Number of `f32` samples buffered per direction before `read`/`write`
/// start blocking.
const CHANNEL_CAPACITY_SAMPLES: usize = 48_000;
/// Poll interval `read`/`write` use to notice `abort()` between channel ops.
const ABORT_POLL: Duration = Duration::from_millis(20);

pub struct CpalTransport {
    direction: Direction,
    input_stream: Option<cpal::Stream>,
    output_stream: Option<cpal::Stream>,
    capture_rx: Option<Receiver<CaptureMsg>>,
    playback_tx: Option<Sender<f32>>,
    aborted: Arc<AtomicBool>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
    Duplex,
}

enum CaptureMsg {
    Sample(f32),
    Overflow,
}

impl CpalTransport {
    /// Build a transport that only captures audio (RX-side microphone-free
    /// use is not expected, but TX needs capture-only and RX needs
    /// playback-only, so both are supported independently).
    pub fn new_input() -> Self {
        Self::new(Direction::Input)
    }

    /// Build a transport that only plays audio.
    pub fn new_output() -> Self {
        Self::new(Direction::Output)
    }

    fn new(direction: Direction) -> Self {
        Self {
            direction,
            input_stream: None,
            output_stream: None,
            capture_rx: None,
            playback_tx: None,
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    fn open_input(
        &mut self,
        device: &str,
        sample_rate: u32,
        frames_per_buffer: usize,
    ) -> Result<(), AudioError> {
        let _guard = stderr_guard::suppress();
        let host = cpal::default_host();
        let dev = find_input_device(&host, device)?;
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: buffer_size_for(frames_per_buffer),
        };

        let (tx, rx) = bounded::<CaptureMsg>(CHANNEL_CAPACITY_SAMPLES);
        self.capture_rx = Some(rx);

        let stream = dev.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for &s in data {
                    if tx.try_send(CaptureMsg::Sample(s)).is_err() {
                        let _ = tx.try_send(CaptureMsg::Overflow);
                    }
                }
            },
            move |err| crate::error!("capture stream error: {err}"),
            None,
        )?;

        self.input_stream = Some(stream);
        Ok(())
    }

    fn open_output(
        &mut self,
        device: &str,
        sample_rate: u32,
        frames_per_buffer: usize,
    ) -> Result<(), AudioError> {
        let _guard = stderr_guard::suppress();
        let host = cpal::default_host();
        let dev = find_output_device(&host, device)?;
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: buffer_size_for(frames_per_buffer),
        };

        let (tx, rx) = bounded::<f32>(CHANNEL_CAPACITY_SAMPLES);
        self.playback_tx = Some(tx);

        let stream = dev.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for slot in data.iter_mut() {
                    *slot = rx.try_recv().unwrap_or(0.0);
                }
            },
            move |err| crate::error!("playback stream error: {err}"),
            None,
        )?;

        self.output_stream = Some(stream);
        Ok(())
    }
}

impl AudioTransport for CpalTransport {
    fn open(
        &mut self,
        device: &str,
        sample_rate: u32,
        frames_per_buffer: usize,
    ) -> Result<(), AudioError> {
        match self.direction {
            Direction::Input => self.open_input(device, sample_rate, frames_per_buffer),
            Direction::Output => self.open_output(device, sample_rate, frames_per_buffer),
            Direction::Duplex => {
                self.open_input(device, sample_rate, frames_per_buffer)?;
                self.open_output(device, sample_rate, frames_per_buffer)
            }
        }
    }

    fn start(&mut self) -> Result<(), AudioError> {
        if let Some(s) = &self.input_stream {
            s.play()?;
        }
        if let Some(s) = &self.output_stream {
            s.play()?;
        }
        Ok(())
    }

    fn read(&self, buf: &mut [f32]) -> Result<ReadStatus, AudioError> {
        let rx = self.capture_rx.as_ref().ok_or(AudioError::NotStarted)?;
        let mut status = ReadStatus::Ok;
        for slot in buf.iter_mut() {
            loop {
                if self.aborted.load(Ordering::SeqCst) {
                    return Err(AudioError::Closed);
                }
                match rx.recv_timeout(ABORT_POLL) {
                    Ok(CaptureMsg::Sample(s)) => {
                        *slot = s;
                        break;
                    }
                    Ok(CaptureMsg::Overflow) => {
                        status = ReadStatus::Overflow;
                        *slot = 0.0;
                        break;
                    }
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                        return Err(AudioError::Closed)
                    }
                }
            }
        }
        Ok(status)
    }

    fn write(&self, buf: &[f32]) -> Result<(), AudioError> {
        let tx = self.playback_tx.as_ref().ok_or(AudioError::NotStarted)?;
        for &s in buf {
            let mut sample = s;
            loop {
                if self.aborted.load(Ordering::SeqCst) {
                    return Err(AudioError::Closed);
                }
                match tx.send_timeout(sample, ABORT_POLL) {
                    Ok(()) => break,
                    Err(crossbeam_channel::SendTimeoutError::Timeout(s)) => {
                        sample = s;
                        continue;
                    }
                    Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                        return Err(AudioError::Closed)
                    }
                }
            }
        }
        Ok(())
    }

    fn drain(&self) -> Result<(), AudioError> {
        if let Some(tx) = &self.playback_tx {
            while !tx.is_empty() {
                std::thread::sleep(std::time::Duration::from_millis(5));
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(s) = &self.input_stream {
            s.pause()?;
        }
        if let Some(s) = &self.output_stream {
            s.pause()?;
        }
        Ok(())
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    fn close(&mut self) -> Result<(), AudioError> {
        self.input_stream = None;
        self.output_stream = None;
        self.capture_rx = None;
        self.playback_tx = None;
        self.aborted.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// `0` means "no preference, use the backend's default"; otherwise pin the
/// stream's period to `frames_per_buffer` so the host can't fall back to a
/// multi-second default fragment size (spec §9's PulseAudio gotcha).
fn buffer_size_for(frames_per_buffer: usize) -> cpal::BufferSize {
    if frames_per_buffer == 0 {
        cpal::BufferSize::Default
    } else {
        cpal::BufferSize::Fixed(frames_per_buffer as u32)
    }
}

fn find_input_device(host: &cpal::Host, name: &str) -> Result<cpal::Device, AudioError> {
    if name.is_empty() || name == "default" {
        return host
            .default_input_device()
            .ok_or_else(|| AudioError::device_not_found("default input"));
    }
    host.input_devices()?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| AudioError::device_not_found(name))
}

fn find_output_device(host: &cpal::Host, name: &str) -> Result<cpal::Device, AudioError> {
    if name.is_empty() || name == "default" {
        return host
            .default_output_device()
            .ok_or_else(|| AudioError::device_not_found("default output"));
    }
    host.output_devices()?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| AudioError::device_not_found(name))
}

/// Names of every input and output device the default cpal host can see, for
/// a CLI front-end to list.
pub fn list_devices() -> Result<(Vec<String>, Vec<String>), AudioError> {
    let _guard = stderr_guard::suppress();
    let host = cpal::default_host();
    let inputs = host.input_devices()?.filter_map(|d| d.name().ok()).collect();
    let outputs = host.output_devices()?.filter_map(|d| d.name().ok()).collect();
    Ok((inputs, outputs))
}

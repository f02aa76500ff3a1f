//! WAV file recorder (spec §4.8): writes a canonical 44-byte PCM16 mono
//! header with placeholder sizes, appends samples as they arrive under a
//! mutex (so any pipeline thread can feed it), and idempotently back-patches
//! the header's size fields on close.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::wav::WavError;

const HEADER_LEN: u64 = 44;

struct Inner {
    file: File,
    samples_written: u64,
    sample_rate: u32,
    closed: bool,
}

/// Mutex-guarded WAV recorder; `append` may be called from any thread that
/// holds a reference, `close` back-patches the header exactly once.
pub struct WavRecorder {
    inner: Mutex<Inner>,
}

impl WavRecorder {
    /// Create `path`, writing a placeholder 44-byte mono PCM16 header.
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, WavError> {
        let mut file = File::create(path)?;
        write_header(&mut file, sample_rate, 0)?;
        Ok(Self {
            inner: Mutex::new(Inner {
                file,
                samples_written: 0,
                sample_rate,
                closed: false,
            }),
        })
    }

    /// Append S16 samples to the file.
    pub fn append(&self, samples: &[i16]) -> Result<(), WavError> {
        let mut guard = self.inner.lock().unwrap();
        if guard.closed {
            return Ok(());
        }
        for &s in samples {
            guard.file.write_all(&s.to_le_bytes())?;
        }
        guard.samples_written += samples.len() as u64;
        Ok(())
    }

    /// Back-patch the RIFF and data chunk sizes. Safe to call more than
    /// once: subsequent calls are no-ops.
    pub fn close(&self) -> Result<(), WavError> {
        let mut guard = self.inner.lock().unwrap();
        if guard.closed {
            return Ok(());
        }
        let data_bytes = guard.samples_written * 2;
        let sample_rate = guard.sample_rate;
        patch_header(&mut guard.file, sample_rate, data_bytes)?;
        guard.file.flush()?;
        guard.closed = true;
        Ok(())
    }
}

impl Drop for WavRecorder {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn write_header(file: &mut File, sample_rate: u32, data_bytes: u32) -> Result<(), WavError> {
    let channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);

    file.write_all(b"RIFF")?;
    file.write_all(&(36 + data_bytes).to_le_bytes())?;
    file.write_all(b"WAVE")?;

    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?;
    file.write_all(&1u16.to_le_bytes())?; // PCM
    file.write_all(&channels.to_le_bytes())?;
    file.write_all(&sample_rate.to_le_bytes())?;
    file.write_all(&byte_rate.to_le_bytes())?;
    file.write_all(&block_align.to_le_bytes())?;
    file.write_all(&bits_per_sample.to_le_bytes())?;

    file.write_all(b"data")?;
    file.write_all(&data_bytes.to_le_bytes())?;

    debug_assert_eq!(file.stream_position()?, HEADER_LEN);
    Ok(())
}

fn patch_header(file: &mut File, sample_rate: u32, data_bytes: u64) -> Result<(), WavError> {
    let data_bytes = data_bytes.min(u32::MAX as u64) as u32;
    let riff_size = 36u32.wrapping_add(data_bytes);

    file.seek(SeekFrom::Start(4))?;
    file.write_all(&riff_size.to_le_bytes())?;

    file.seek(SeekFrom::Start(40))?;
    file.write_all(&data_bytes.to_le_bytes())?;

    file.seek(SeekFrom::End(0))?;
    let _ = sample_rate; // header's rate field was already correct at create time
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_back_patches_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let rec = WavRecorder::create(&path, 8000).unwrap();
        rec.append(&[1, 2, 3, 4]).unwrap();
        rec.append(&[5, 6]).unwrap();
        rec.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, HEADER_LEN + 6 * 2);
        let riff_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(riff_size, 36 + 12);
        let data_size = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        assert_eq!(data_size, 12);
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out2.wav");

        let rec = WavRecorder::create(&path, 8000).unwrap();
        rec.append(&[1, 2]).unwrap();
        rec.close().unwrap();
        rec.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let data_size = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        assert_eq!(data_size, 4);
    }

    #[test]
    fn append_after_close_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out3.wav");

        let rec = WavRecorder::create(&path, 8000).unwrap();
        rec.append(&[1, 2]).unwrap();
        rec.close().unwrap();
        rec.append(&[3, 4, 5]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let data_size = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        assert_eq!(data_size, 4);
    }
}

//! WAV file playback source (spec §4.7).
//!
//! Hand-parses RIFF/WAVE chunks rather than depending on a WAV crate: PCM
//! 8/16/24/32-bit integer and IEEE float 32/64-bit, any channel count and
//! sample rate, downmixed to mono and resampled once to 8kHz up front since
//! the whole file is available before playback starts.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::constants::FS_MODEM;
use crate::resample::{downmix_to_mono, resample_batch};
use crate::wav::WavError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SampleFormat {
    Pcm,
    Float,
}

/// A WAV file decoded to mono f32 samples at the modem's 8kHz rate.
pub struct WavSource {
    samples: Vec<f32>,
    pos: usize,
}

impl WavSource {
    /// Parse and fully decode `path`, resampling once to `FS_MODEM`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WavError> {
        let mut file = File::open(path)?;
        let (fmt, data) = parse_riff(&mut file)?;

        let raw = decode_samples(&data, &fmt)?;
        let mono = downmix_to_mono(&raw, fmt.channels);
        let samples = resample_batch(&mono, fmt.sample_rate, FS_MODEM);

        Ok(Self { samples, pos: 0 })
    }

    /// Read up to `buf.len()` samples; returns the number actually read
    /// (fewer than `buf.len()` at end of file).
    pub fn read(&mut self, buf: &mut [f32]) -> usize {
        let remaining = self.samples.len() - self.pos;
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&self.samples[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.samples.len()
    }

    pub fn total_samples(&self) -> usize {
        self.samples.len()
    }
}

struct Fmt {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

fn parse_riff(file: &mut File) -> Result<(Fmt, Vec<u8>), WavError> {
    let mut riff_header = [0u8; 12];
    file.read_exact(&mut riff_header)?;
    if &riff_header[0..4] != b"RIFF" || &riff_header[8..12] != b"WAVE" {
        return Err(WavError::NotWav);
    }

    let mut fmt: Option<Fmt> = None;
    let mut data: Option<Vec<u8>> = None;

    loop {
        let mut chunk_header = [0u8; 8];
        if file.read_exact(&mut chunk_header).is_err() {
            break;
        }
        let chunk_id = &chunk_header[0..4];
        let chunk_size = u32::from_le_bytes(chunk_header[4..8].try_into().unwrap()) as usize;

        match chunk_id {
            b"fmt " => {
                let mut body = vec![0u8; chunk_size];
                file.read_exact(&mut body)?;
                fmt = Some(Fmt {
                    format_tag: u16::from_le_bytes(body[0..2].try_into().unwrap()),
                    channels: u16::from_le_bytes(body[2..4].try_into().unwrap()),
                    sample_rate: u32::from_le_bytes(body[4..8].try_into().unwrap()),
                    bits_per_sample: u16::from_le_bytes(body[14..16].try_into().unwrap()),
                });
            }
            b"data" => {
                let mut body = vec![0u8; chunk_size];
                file.read_exact(&mut body)?;
                data = Some(body);
            }
            _ => {
                file.seek(SeekFrom::Current(chunk_size as i64))?;
            }
        }
        // Chunks are word-aligned; skip the pad byte if chunk_size is odd.
        if chunk_size % 2 == 1 {
            file.seek(SeekFrom::Current(1))?;
        }
    }

    let fmt = fmt.ok_or(WavError::MissingFmtChunk)?;
    let data = data.ok_or(WavError::MissingDataChunk)?;
    Ok((fmt, data))
}

fn decode_samples(data: &[u8], fmt: &Fmt) -> Result<Vec<f32>, WavError> {
    const WAVE_FORMAT_PCM: u16 = 1;
    const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;
    const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

    let format = match fmt.format_tag {
        WAVE_FORMAT_PCM => SampleFormat::Pcm,
        WAVE_FORMAT_IEEE_FLOAT => SampleFormat::Float,
        // WAVE_FORMAT_EXTENSIBLE files in practice carry PCM sub-format for
        // bit depths above 16; treat as PCM, which matches the bit depths
        // this decoder accepts below.
        WAVE_FORMAT_EXTENSIBLE => SampleFormat::Pcm,
        other => return Err(WavError::UnsupportedFormat(format!("tag {other:#x}"))),
    };

    let bytes_per_sample = (fmt.bits_per_sample / 8) as usize;
    if bytes_per_sample == 0 {
        return Err(WavError::UnsupportedFormat("0-bit samples".into()));
    }

    let mut out = Vec::with_capacity(data.len() / bytes_per_sample);
    for chunk in data.chunks_exact(bytes_per_sample) {
        let sample = match (format, fmt.bits_per_sample) {
            (SampleFormat::Pcm, 8) => (chunk[0] as f32 - 128.0) / 128.0,
            (SampleFormat::Pcm, 16) => {
                i16::from_le_bytes(chunk.try_into().unwrap()) as f32 / 32768.0
            }
            (SampleFormat::Pcm, 24) => {
                let mut b = [0u8; 4];
                b[1..4].copy_from_slice(chunk);
                (i32::from_le_bytes(b) >> 8) as f32 / 8_388_608.0
            }
            (SampleFormat::Pcm, 32) => {
                i32::from_le_bytes(chunk.try_into().unwrap()) as f32 / 2_147_483_648.0
            }
            (SampleFormat::Float, 32) => f32::from_le_bytes(chunk.try_into().unwrap()),
            (SampleFormat::Float, 64) => f64::from_le_bytes(chunk.try_into().unwrap()) as f32,
            (_, bits) => {
                return Err(WavError::UnsupportedFormat(format!(
                    "{bits}-bit {format:?}"
                )))
            }
        };
        out.push(sample);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_pcm16_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let mut f = File::create(path).unwrap();
        let data_bytes = samples.len() * 2;
        let byte_rate = sample_rate * channels as u32 * 2;
        let block_align = channels * 2;

        f.write_all(b"RIFF").unwrap();
        f.write_all(&((36 + data_bytes) as u32).to_le_bytes())
            .unwrap();
        f.write_all(b"WAVE").unwrap();

        f.write_all(b"fmt ").unwrap();
        f.write_all(&16u32.to_le_bytes()).unwrap();
        f.write_all(&1u16.to_le_bytes()).unwrap(); // PCM
        f.write_all(&channels.to_le_bytes()).unwrap();
        f.write_all(&sample_rate.to_le_bytes()).unwrap();
        f.write_all(&byte_rate.to_le_bytes()).unwrap();
        f.write_all(&block_align.to_le_bytes()).unwrap();
        f.write_all(&16u16.to_le_bytes()).unwrap();

        f.write_all(b"data").unwrap();
        f.write_all(&(data_bytes as u32).to_le_bytes()).unwrap();
        for &s in samples {
            f.write_all(&s.to_le_bytes()).unwrap();
        }
    }

    #[test]
    fn decodes_mono_16khz_pcm16_and_resamples_to_8k() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wav");
        let samples: Vec<i16> = (0..1600).map(|i| (i % 100) as i16 * 100).collect();
        write_pcm16_wav(&path, 16000, 1, &samples);

        let mut src = WavSource::load(&path).unwrap();
        assert!((src.total_samples() as i64 - 800).abs() <= 2);

        let mut buf = vec![0.0; src.total_samples()];
        let n = src.read(&mut buf);
        assert_eq!(n, buf.len());
        assert!(src.is_exhausted());
    }

    #[test]
    fn downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let samples: Vec<i16> = vec![1000, -1000, 2000, -2000];
        write_pcm16_wav(&path, 8000, 2, &samples);

        let src = WavSource::load(&path).unwrap();
        assert_eq!(src.total_samples(), 2);
    }

    #[test]
    fn rejects_non_riff_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notwav.bin");
        std::fs::write(&path, b"not a wav file at all").unwrap();
        assert!(matches!(WavSource::load(&path), Err(WavError::NotWav)));
    }
}

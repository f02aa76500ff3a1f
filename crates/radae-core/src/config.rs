//! Persisted controller configuration (spec §6.1): a flat `key=value` file
//! at `$HOME/.config/radae-decoder.conf`. Deliberately not `serde` — there
//! are nine scalar keys and no nesting, so a hand-rolled line parser keeps
//! the format trivially hand-editable, matching the file's own description
//! as a plain key=value list rather than a structured document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::callsign::sanitize_callsign;
use crate::error::{RadaeError, Result};

const CONFIG_FILE_NAME: &str = "radae-decoder.conf";

/// Persisted controller settings; every field is optional since the file
/// itself is optional and every key may be absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub input: Option<String>,
    pub output: Option<String>,
    pub tx_input: Option<String>,
    pub tx_output: Option<String>,
    /// 0..100, mapped to codec TX scale by `pct/100 * 32767`.
    pub tx_level: Option<u8>,
    /// 0..100, mapped to mic gain by `pct/100 * 2.0`.
    pub mic_level: Option<u8>,
    pub bpf_enabled: Option<bool>,
    pub callsign: Option<String>,
    pub gridsquare: Option<String>,
}

impl Config {
    /// Default config file path: `$HOME/.config/radae-decoder.conf`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .ok_or_else(|| RadaeError::config("could not determine config directory"))
    }

    /// Load from `path`, or return an all-`None` config if the file doesn't
    /// exist yet (first run).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "input" => cfg.input = Some(value.to_string()),
                "output" => cfg.output = Some(value.to_string()),
                "tx_input" => cfg.tx_input = Some(value.to_string()),
                "tx_output" => cfg.tx_output = Some(value.to_string()),
                "tx_level" => cfg.tx_level = value.parse::<u8>().ok().map(|v| v.min(100)),
                "mic_level" => cfg.mic_level = value.parse::<u8>().ok().map(|v| v.min(100)),
                "bpf_enabled" => cfg.bpf_enabled = Some(value == "1"),
                "callsign" => cfg.callsign = Some(sanitize_callsign(value)),
                "gridsquare" => cfg.gridsquare = Some(value.chars().take(8).collect()),
                _ => {}
            }
        }
        cfg
    }

    /// Write every present field to `path`, one `key=value` line each.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        macro_rules! write_opt {
            ($key:literal, $val:expr) => {
                if let Some(v) = &$val {
                    writeln!(file, "{}={}", $key, v)?;
                }
            };
        }
        write_opt!("input", self.input);
        write_opt!("output", self.output);
        write_opt!("tx_input", self.tx_input);
        write_opt!("tx_output", self.tx_output);
        write_opt!("tx_level", self.tx_level);
        write_opt!("mic_level", self.mic_level);
        if let Some(v) = self.bpf_enabled {
            writeln!(file, "bpf_enabled={}", if v { 1 } else { 0 })?;
        }
        write_opt!("callsign", self.callsign);
        write_opt!("gridsquare", self.gridsquare);
        Ok(())
    }

    /// TX scale the codec expects (`pct/100 * 32767`); `None` if unset.
    pub fn tx_scale(&self) -> Option<f32> {
        self.tx_level
            .map(|pct| pct as f32 / 100.0 * crate::constants::S16_MAX)
    }

    /// Mic gain multiplier (`pct/100 * 2.0`); `None` if unset.
    pub fn mic_gain(&self) -> Option<f32> {
        self.mic_level.map(|pct| pct as f32 / 100.0 * 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radae-decoder.conf");

        let mut cfg = Config::default();
        cfg.input = Some("Built-in Microphone".to_string());
        cfg.tx_level = Some(80);
        cfg.mic_level = Some(50);
        cfg.bpf_enabled = Some(true);
        cfg.callsign = Some("vk2abc".to_string());
        cfg.gridsquare = Some("QF56OD".to_string());
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.input.as_deref(), Some("Built-in Microphone"));
        assert_eq!(loaded.tx_level, Some(80));
        assert_eq!(loaded.mic_level, Some(50));
        assert_eq!(loaded.bpf_enabled, Some(true));
        assert_eq!(loaded.callsign.as_deref(), Some("VK2ABC"));
        assert_eq!(loaded.gridsquare.as_deref(), Some("QF56OD"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.conf");
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn percentage_mappings_match_spec() {
        let mut cfg = Config::default();
        cfg.tx_level = Some(100);
        cfg.mic_level = Some(100);
        assert!((cfg.tx_scale().unwrap() - 32767.0).abs() < 1.0);
        assert!((cfg.mic_gain().unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn ignores_blank_lines_and_comments() {
        let cfg = Config::parse("# a comment\n\ninput=foo\n");
        assert_eq!(cfg.input.as_deref(), Some("foo"));
    }
}

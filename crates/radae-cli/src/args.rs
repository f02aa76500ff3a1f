use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(name = "radae")]
#[command(version)]
#[command(about = "Command-line front-end for the RADAE narrow-band digital voice transceiver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose per-frame pipeline logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (default: $HOME/.config/radae-decoder.conf)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the RX decoder: demodulate OFDM baseband into speech
    Rx(RxArgs),

    /// Run the TX encoder: modulate microphone audio into OFDM baseband
    Tx(TxArgs),

    /// Get, set, or list persisted configuration values
    Config {
        /// Configuration key to get or set
        key: Option<String>,

        /// Value to set (omit to print the current value)
        value: Option<String>,

        /// List every configured key
        #[arg(long, conflicts_with_all = ["key", "value"])]
        list: bool,

        /// Print the configuration file path and exit
        #[arg(long, conflicts_with_all = ["key", "value", "list"])]
        path: bool,
    },

    /// List available audio input/output device names
    Devices,
}

#[derive(Args)]
pub struct ModelArgs {
    /// Path to the rade_rx model weights (.bin)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub rade_rx_model: Option<PathBuf>,

    /// Path to the rade_tx model weights (.bin)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub rade_tx_model: Option<PathBuf>,

    /// Path to the FARGAN vocoder model weights (.bin)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub fargan_model: Option<PathBuf>,
}

#[derive(Args)]
pub struct RxArgs {
    /// Capture device name (live mode); ignored when --input-file is given
    #[arg(long)]
    pub input_device: Option<String>,

    /// Playback device name for decoded speech
    #[arg(long)]
    pub output_device: Option<String>,

    /// Device sample rate in Hz
    #[arg(long, default_value_t = 48_000)]
    pub device_rate: u32,

    /// Replay OFDM baseband from a WAV file instead of a live capture device
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub input_file: Option<PathBuf>,

    /// Record decoded speech to a WAV file while running
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub record: Option<PathBuf>,

    #[command(flatten)]
    pub models: ModelArgs,

    /// Run for a fixed duration (e.g. "10s", "1m") then stop; omit to run
    /// until interrupted (Ctrl-C)
    #[arg(short = 'd', long, value_parser = parse_duration)]
    pub duration: Option<std::time::Duration>,
}

#[derive(Args)]
pub struct TxArgs {
    /// Microphone capture device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Radio-interface playback device name
    #[arg(long)]
    pub output_device: Option<String>,

    /// Device sample rate in Hz
    #[arg(long, default_value_t = 48_000)]
    pub device_rate: u32,

    /// Microphone gain multiplier
    #[arg(long)]
    pub mic_gain: Option<f32>,

    /// TX output scale applied before clipping (0..32767)
    #[arg(long)]
    pub tx_scale: Option<f32>,

    /// Enable the TX band-pass filter
    #[arg(long)]
    pub bpf: bool,

    /// Callsign to embed in the End-Of-Over marker (A-Z, 0-9, and
    /// `&'()*+,-./`, max 8 characters)
    #[arg(long)]
    pub callsign: Option<String>,

    #[command(flatten)]
    pub models: ModelArgs,

    /// Run for a fixed duration (e.g. "10s", "1m") then stop and flush EOO;
    /// omit to run until interrupted (Ctrl-C)
    #[arg(short = 'd', long, value_parser = parse_duration)]
    pub duration: Option<std::time::Duration>,
}

/// Parse a duration string like "10s", "30s", "1m", or a bare number of
/// seconds.
fn parse_duration(s: &str) -> Result<std::time::Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration cannot be empty".to_string());
    }
    if let Some(num_str) = s.strip_suffix('s') {
        let secs: u64 = num_str
            .parse()
            .map_err(|_| format!("invalid number: {num_str}"))?;
        Ok(std::time::Duration::from_secs(secs))
    } else if let Some(num_str) = s.strip_suffix('m') {
        let mins: u64 = num_str
            .parse()
            .map_err(|_| format!("invalid number: {num_str}"))?;
        Ok(std::time::Duration::from_secs(mins * 60))
    } else {
        let secs: u64 = s.parse().map_err(|_| format!("invalid duration: {s}"))?;
        Ok(std::time::Duration::from_secs(secs))
    }
}

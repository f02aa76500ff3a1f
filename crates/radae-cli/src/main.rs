mod args;
mod error;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use radae_core::controller::{ModelPaths, RxController, RxOpenParams, TxController, TxOpenParams};
use radae_core::{list_devices, set_verbose, Config, RadaeError, Telemetry, WavRecorder};

fn main() -> Result<()> {
    if let Err(err) = run() {
        error::display_anyhow_error(err);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    let cli = args::Cli::parse();
    set_verbose(cli.verbose);

    let config_path = match &cli.config {
        Some(p) => p.clone(),
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    match cli.command {
        args::Commands::Rx(rx_args) => run_rx(rx_args, &config),
        args::Commands::Tx(tx_args) => run_tx(tx_args, &config),
        args::Commands::Config { key, value, list, path } => {
            run_config(&config_path, config, key, value, list, path)
        }
        args::Commands::Devices => run_devices(),
    }
}

fn run_devices() -> Result<()> {
    let (inputs, outputs) = list_devices().map_err(RadaeError::from)?;
    println!("Input devices:");
    for name in inputs {
        println!("  {name}");
    }
    println!("Output devices:");
    for name in outputs {
        println!("  {name}");
    }
    Ok(())
}

fn run_config(
    path: &Path,
    mut config: Config,
    key: Option<String>,
    value: Option<String>,
    list: bool,
    show_path: bool,
) -> Result<()> {
    if show_path {
        println!("{}", path.display());
        return Ok(());
    }
    if list || key.is_none() {
        print_config(&config);
        return Ok(());
    }
    let key = key.unwrap();
    match value {
        None => {
            print_config_value(&config, &key);
        }
        Some(value) => {
            set_config_value(&mut config, &key, &value)
                .map_err(RadaeError::config)?;
            config.save(path)?;
            println!("Saved {key}={value} to {}", path.display());
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    macro_rules! line {
        ($label:literal, $val:expr) => {
            if let Some(v) = &$val {
                println!("{} = {}", $label, v);
            }
        };
    }
    line!("input", config.input);
    line!("output", config.output);
    line!("tx_input", config.tx_input);
    line!("tx_output", config.tx_output);
    line!("tx_level", config.tx_level);
    line!("mic_level", config.mic_level);
    if let Some(v) = config.bpf_enabled {
        println!("bpf_enabled = {}", v);
    }
    line!("callsign", config.callsign);
    line!("gridsquare", config.gridsquare);
}

fn print_config_value(config: &Config, key: &str) {
    let value = match key {
        "input" => config.input.clone(),
        "output" => config.output.clone(),
        "tx_input" => config.tx_input.clone(),
        "tx_output" => config.tx_output.clone(),
        "tx_level" => config.tx_level.map(|v| v.to_string()),
        "mic_level" => config.mic_level.map(|v| v.to_string()),
        "bpf_enabled" => config.bpf_enabled.map(|v| v.to_string()),
        "callsign" => config.callsign.clone(),
        "gridsquare" => config.gridsquare.clone(),
        _ => None,
    };
    match value {
        Some(v) => println!("{v}"),
        None => println!("(unset)"),
    }
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<(), String> {
    match key {
        "input" => config.input = Some(value.to_string()),
        "output" => config.output = Some(value.to_string()),
        "tx_input" => config.tx_input = Some(value.to_string()),
        "tx_output" => config.tx_output = Some(value.to_string()),
        "tx_level" => {
            config.tx_level = Some(value.parse::<u8>().map_err(|e| e.to_string())?.min(100))
        }
        "mic_level" => {
            config.mic_level = Some(value.parse::<u8>().map_err(|e| e.to_string())?.min(100))
        }
        "bpf_enabled" => config.bpf_enabled = Some(value == "1" || value == "true"),
        "callsign" => config.callsign = Some(radae_core::sanitize_callsign(value)),
        "gridsquare" => config.gridsquare = Some(value.chars().take(8).collect()),
        _ => return Err(format!("unknown configuration key: {key}")),
    }
    Ok(())
}

fn model_paths(args: &args::ModelArgs) -> ModelPaths {
    ModelPaths {
        rade_rx: args
            .rade_rx_model
            .clone()
            .unwrap_or_else(|| PathBuf::from("rade_rxv2.bin")),
        rade_tx: args
            .rade_tx_model
            .clone()
            .unwrap_or_else(|| PathBuf::from("rade_txv2.bin")),
        fargan: args
            .fargan_model
            .clone()
            .unwrap_or_else(|| PathBuf::from("fargan.bin")),
    }
}

fn run_rx(args: args::RxArgs, config: &Config) -> Result<()> {
    let mut controller = RxController::new();

    let recorder = match &args.record {
        Some(path) => {
            let recorder = Arc::new(WavRecorder::create(path, args.device_rate)?);
            controller.attach_recorder(recorder.clone());
            Some(recorder)
        }
        None => None,
    };

    let params = RxOpenParams {
        input_device: args
            .input_device
            .or_else(|| config.input.clone())
            .unwrap_or_else(|| "default".to_string()),
        output_device: args
            .output_device
            .or_else(|| config.output.clone())
            .unwrap_or_else(|| "default".to_string()),
        device_rate: args.device_rate,
        models: model_paths(&args.models),
        input_file: args.input_file,
    };

    controller
        .open(params)
        .context("failed to open RX pipeline")?;
    controller.start().context("failed to start RX pipeline")?;

    let telemetry = controller.telemetry();
    let done = Arc::new(AtomicBool::new(false));
    let monitor = spawn_rx_monitor(telemetry, done.clone());

    wait_for_stop(args.duration);
    done.store(true, Ordering::Relaxed);
    let _ = monitor.join();

    if let Some(recorder) = recorder {
        controller.detach_recorder();
        recorder.close()?;
    }

    controller.stop().context("failed to stop RX pipeline")?;
    controller.close().context("failed to close RX pipeline")?;
    Ok(())
}

fn run_tx(args: args::TxArgs, config: &Config) -> Result<()> {
    let mut controller = TxController::new();

    if let Some(gain) = args.mic_gain.or_else(|| config.mic_gain()) {
        controller.set_mic_gain(gain);
    }
    if let Some(scale) = args.tx_scale.or_else(|| config.tx_scale()) {
        controller.set_tx_scale(scale);
    }
    controller.set_bpf_enabled(args.bpf || config.bpf_enabled.unwrap_or(false));
    if let Some(callsign) = args.callsign.or_else(|| config.callsign.clone()) {
        controller.set_callsign(&callsign);
    }

    let params = TxOpenParams {
        input_device: args
            .input_device
            .or_else(|| config.tx_input.clone())
            .unwrap_or_else(|| "default".to_string()),
        output_device: args
            .output_device
            .or_else(|| config.tx_output.clone())
            .unwrap_or_else(|| "default".to_string()),
        device_rate: args.device_rate,
        models: model_paths(&args.models),
    };

    controller
        .open(params)
        .context("failed to open TX pipeline")?;
    controller.start().context("failed to start TX pipeline")?;

    let telemetry = controller.telemetry();
    let done = Arc::new(AtomicBool::new(false));
    let monitor = spawn_tx_monitor(telemetry, done.clone());

    wait_for_stop(args.duration);
    done.store(true, Ordering::Relaxed);
    let _ = monitor.join();

    controller.stop().context("failed to stop TX pipeline")?;
    controller.close().context("failed to close TX pipeline")?;
    Ok(())
}

/// Block the calling thread until `duration` elapses, or until the operator
/// presses Enter if no duration was given.
fn wait_for_stop(duration: Option<Duration>) {
    match duration {
        Some(d) => std::thread::sleep(d),
        None => {
            println!("Running. Press Enter to stop.");
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
        }
    }
}

fn spawn_rx_monitor(telemetry: Arc<Telemetry>, done: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while !done.load(Ordering::Relaxed) {
            println!(
                "sync={} snr={:.1}dB foff={:.1}Hz in={:.3} out={:.3}",
                telemetry.synced(),
                telemetry.snr_db(),
                telemetry.freq_offset_hz(),
                telemetry.input_level(),
                telemetry.output_level(),
            );
            if let Some(callsign) = telemetry.last_callsign() {
                println!("last callsign: {callsign}");
            }
            std::thread::sleep(Duration::from_millis(500));
        }
    })
}

fn spawn_tx_monitor(telemetry: Arc<Telemetry>, done: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while !done.load(Ordering::Relaxed) {
            println!(
                "in={:.3} out={:.3} mic_gain={:.2} tx_scale={:.0} bpf={}",
                telemetry.input_level(),
                telemetry.output_level(),
                telemetry.mic_gain(),
                telemetry.tx_scale(),
                telemetry.bpf_enabled(),
            );
            std::thread::sleep(Duration::from_millis(500));
        }
    })
}

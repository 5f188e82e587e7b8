mod app;
mod engine;
mod frontend;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use audrt_audio::list_output_devices;
use audrt_data::session_paths;
use audrt_experiment::SessionConfig;
use crossbeam::channel::unbounded;
use winit::event_loop::EventLoop;

use app::App;
use engine::EngineLaunch;
use frontend::WinitFrontend;

const CONFIG_PATH: &str = "task.json";
const NOISE_CACHE: &str = "white_noise.wav";
const DATA_DIR: &str = "data";

fn main() -> Result<()> {
    env_logger::init();

    let config = load_config();
    let participant = prompt("Participant id: ")?;
    let device_selection = select_audio_device()?;
    let (csv_path, json_path) = session_paths(Path::new(DATA_DIR), &participant);

    let event_loop = EventLoop::new().context("creating event loop")?;
    let proxy = event_loop.create_proxy();

    let (scene_tx, scene_rx) = unbounded();
    let (key_tx, key_rx) = unbounded();

    let launch = EngineLaunch {
        frontend: WinitFrontend::new(scene_tx, key_rx, proxy),
        config,
        device_selection,
        noise_cache: NOISE_CACHE.into(),
        csv_path,
        json_path,
    };

    App::new(scene_rx, key_tx, launch).run(event_loop)
}

fn load_config() -> SessionConfig {
    match File::open(CONFIG_PATH) {
        Ok(file) => match serde_json::from_reader(file) {
            Ok(config) => {
                log::info!("loaded session config from {CONFIG_PATH}");
                config
            }
            Err(e) => {
                log::warn!("{CONFIG_PATH} is invalid ({e}); using defaults");
                SessionConfig::default()
            }
        },
        Err(_) => SessionConfig::default(),
    }
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_owned())
}

/// Lists output devices and reads a selection, exactly once before the
/// session starts. Blank input (or a failed enumeration) means the system
/// default.
fn select_audio_device() -> Result<Option<usize>> {
    let devices = match list_output_devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::warn!("could not enumerate audio outputs: {e}");
            return Ok(None);
        }
    };

    println!("Available audio output devices:");
    for device in &devices {
        let default = if device.is_default { " (default)" } else { "" };
        println!("{}: {}{}", device.index, device.name, default);
    }

    let answer = prompt("Enter device index to use (or leave blank for default): ")?;
    if answer.is_empty() {
        return Ok(None);
    }
    match answer.parse::<usize>() {
        Ok(index) if devices.iter().any(|d| d.index == index) => Ok(Some(index)),
        Ok(index) => {
            log::warn!("device index {index} not listed; using the system default");
            Ok(None)
        }
        Err(_) => {
            log::warn!("invalid selection {answer:?}; using the system default");
            Ok(None)
        }
    }
}

// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Stream sensor hub events to stdout.
//!
//! Usage:
//!   cwmcu-hub --sensor accel --sensor rotation --delay-ms 20

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};

use cwmcu_hub::constants::NS_PER_MS;
use cwmcu_hub::{HubConfig, OutputEvent, Payload, SensorHub, SensorKind};

fn parse_kind(name: &str) -> Result<SensorKind, String> {
    match SensorKind::from_name(name) {
        Some(kind) if kind.is_physical() => Ok(kind),
        _ => {
            let known: Vec<_> = SensorKind::ALL
                .iter()
                .filter(|k| k.is_physical())
                .map(|k| k.name())
                .collect();
            Err(format!("unknown sensor '{}', expected one of: {}", name, known.join(", ")))
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "cwmcu-hub")]
#[command(about = "Stream events from a CwMcu sensor hub", long_about = None)]
struct Args {
    /// IIO character device carrying the record stream
    #[arg(short, long, default_value = cwmcu_hub::config::DEFAULT_DEVICE_NODE)]
    device: PathBuf,

    /// Directory holding the firmware control attributes
    #[arg(short, long, default_value = cwmcu_hub::config::DEFAULT_CONTROL_DIR)]
    control_dir: PathBuf,

    /// IIO trigger to bind to the event buffer
    #[arg(long, default_value = cwmcu_hub::config::DEFAULT_TRIGGER_NAME)]
    trigger: String,

    /// Sensor to enable, may be repeated
    #[arg(short, long = "sensor", value_parser = parse_kind, default_value = "accel")]
    sensors: Vec<SensorKind>,

    /// Sampling period in milliseconds
    #[arg(long, default_value = "20")]
    delay_ms: i64,

    /// FIFO batch timeout in milliseconds (0 disables batching)
    #[arg(long, default_value = "0")]
    timeout_ms: i64,

    /// Stop after this many events (runs until Ctrl+C if omitted)
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Skip restoring and saving calibration files
    #[arg(long)]
    no_calibration: bool,

    /// Log around every blocking read of the device
    #[arg(long)]
    fill_debug: bool,
}

fn describe(event: &OutputEvent) -> String {
    let sample = match event {
        OutputEvent::FlushComplete { handle } => {
            return format!(
                "flush complete  handle={} type={} what={:?}",
                handle,
                event.sensor_type(),
                event.meta_what()
            )
        }
        OutputEvent::Sensor(sample) => sample,
    };
    let values = match sample.payload {
        Payload::Vector([x, y, z]) => format!("{:9.3} {:9.3} {:9.3}", x, y, z),
        Payload::Quaternion([x, y, z, w]) => format!("{:7.4} {:7.4} {:7.4} {:7.4}", x, y, z, w),
        Payload::Uncalibrated { values, bias } => format!(
            "{:9.3} {:9.3} {:9.3}  bias {:7.3} {:7.3} {:7.3}",
            values[0], values[1], values[2], bias[0], bias[1], bias[2]
        ),
        Payload::Pressure { hpa, temperature } => format!("{:.2} hPa {:.2} C", hpa, temperature),
        Payload::Light(lux) => format!("{} lux", lux),
        Payload::StepCount(steps) => format!("{} steps", steps),
        Payload::Trigger(value) => format!("{}", value),
    };
    match sample.accuracy {
        Some(accuracy) => format!(
            "{:>18} {:>20} {} [acc {}]",
            sample.timestamp, sample.kind, values, accuracy
        ),
        None => format!("{:>18} {:>20} {}", sample.timestamp, sample.kind, values),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = HubConfig::new()
        .with_device_node(&args.device)
        .with_control_dir(&args.control_dir)
        .with_trigger_name(args.trigger.clone())
        .with_fill_debug(args.fill_debug);
    if args.no_calibration {
        config = config.with_mag_calibration(None).with_acc_calibration(None);
    }

    let mut hub = SensorHub::open(config)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    for kind in &args.sensors {
        let Some(handle) = kind.handle() else {
            continue;
        };
        hub.batch(handle, 0, args.delay_ms * NS_PER_MS, args.timeout_ms * NS_PER_MS)?;
        hub.set_enable(handle, true)?;
        info!("enabled {} at {} ms", kind, args.delay_ms);
    }

    let mut total = 0usize;
    while running.load(Ordering::SeqCst) {
        let budget = args.count.map_or(64, |count| count.saturating_sub(total).min(64));
        if budget == 0 {
            break;
        }
        let events = match hub.read_events(budget) {
            Ok(events) => events,
            Err(e) => {
                warn!("read_events failed: {}", e);
                return Err(e.into());
            }
        };
        for event in &events {
            println!("{}", describe(event));
        }
        total += events.len();
    }

    info!("received {} events", total);
    Ok(())
}

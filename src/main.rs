mod aggregator;
mod charts;
mod config;
mod downsample;
mod error;
mod monitor;
mod normalizer;
mod range_config;
mod scheduler;
mod source;
mod status;
mod ticks;
mod timeseries;
mod window;
mod y_domain;

use chrono::{DateTime, Utc};
use config::Config;
use monitor::{build_detail, build_ward, DetailSnapshot, DeviceMonitor, MonitorUpdate, WardCard};
use scheduler::PollScheduler;
use source::JsonFileSource;
use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use timeseries::VitalField;
use window::TimeWindow;

const USAGE: &str = "Usage: ward-vitals [--config PATH] [--device ID] \
[--range -6h | --from RFC3339 --to RFC3339] [--ward] [--once]";

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    device: Option<String>,
    range: Option<String>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    ward: bool,
    once: bool,
}

fn parse_time(flag: &str, value: &str) -> Result<DateTime<Utc>, Box<dyn Error>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("{} {}: {}", flag, value, e).into())
}

fn parse_args() -> Result<Options, Box<dyn Error>> {
    let mut opts = Options::default();
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{} needs a value\n{}", arg, USAGE));
        match arg.as_str() {
            "--config" => opts.config = Some(PathBuf::from(value()?)),
            "--device" => opts.device = Some(value()?),
            "--range" => opts.range = Some(value()?),
            "--from" => opts.from = Some(parse_time("--from", &value()?)?),
            "--to" => opts.to = Some(parse_time("--to", &value()?)?),
            "--ward" => opts.ward = true,
            "--once" => opts.once = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => return Err(format!("Unknown argument '{}'\n{}", other, USAGE).into()),
        }
    }

    Ok(opts)
}

fn detail_window(opts: &Options, config: &Config) -> Result<TimeWindow, Box<dyn Error>> {
    match (opts.from, opts.to, &opts.range) {
        (Some(start), Some(end), None) => Ok(TimeWindow::custom(start, end)?),
        (None, None, Some(range)) => Ok(range.parse()?),
        (None, None, None) => Ok(config.detail_window()?),
        _ => Err(format!("Use either --range or both --from and --to\n{}", USAGE).into()),
    }
}

fn log_detail(detail: &DetailSnapshot) {
    let view = &detail.view;
    let patient = detail
        .assignment
        .patient()
        .map(|p| format!("{} ({})", p.name, p.hn))
        .unwrap_or_else(|| "unassigned".to_string());
    let heart_rate = detail
        .latest
        .as_ref()
        .and_then(|r| r.heart_rate)
        .map(|v| format!("{:.0} bpm", v))
        .unwrap_or_else(|| "-".to_string());

    log::info!(
        "{} [{}] {} | {} | HR {}",
        detail.device_id,
        detail.window,
        patient,
        detail.status,
        heart_rate
    );

    if view.is_empty() {
        log::info!("  no readings in window");
        return;
    }

    let labels = view.tick_labels();
    log::info!(
        "  {} {} points, {} min buckets, {} ticks at {}° ({} .. {})",
        if view.is_reduced() { "reduced to" } else { "showing all" },
        if view.is_reduced() {
            format!("{} of {}", view.points.len(), view.source_len)
        } else {
            view.source_len.to_string()
        },
        view.config.bucket_interval_ms / range_config::MINUTE_MS,
        view.ticks.len(),
        view.angle,
        labels.first().map(String::as_str).unwrap_or("-"),
        labels.last().map(String::as_str).unwrap_or("-"),
    );
    for field in VitalField::all() {
        let (lo, hi) = view.y_domain(field);
        log::debug!("  {} axis {} .. {} {}", field, lo, hi, field.unit());
    }
}

fn log_ward(cards: &[WardCard]) {
    for card in cards {
        let patient = card.patient.as_ref().map(|p| p.name.as_str()).unwrap_or("-");
        let line = format!(
            "{:<12} {:<9} {:<16} HR {:>5} T {:>5} battery {:<8} posture {}",
            card.device_id,
            card.status,
            patient,
            card.heart_rate().map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".into()),
            card.temperature().map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".into()),
            card.battery.map(|b| b.label()).unwrap_or("-"),
            card.posture.map(|p| p.label()).unwrap_or("-"),
        );
        if card.status.is_alert() || card.has_fallen() {
            log::warn!("{}", line);
        } else {
            log::info!("{}", line);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = parse_args()?;
    let config = match &opts.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let source = Arc::new(JsonFileSource::new(&config.data_file));
    log::info!("Reading vitals from {}", source.path().display());

    let devices = if config.devices.is_empty() {
        let ids = source.device_ids()?;
        log::info!("No devices configured, using all {} in the data file", ids.len());
        ids
    } else {
        config.devices.clone()
    };

    let device = match &opts.device {
        Some(id) => id.clone(),
        None => devices
            .first()
            .cloned()
            .ok_or("No --device given and no devices found")?,
    };
    let window = detail_window(&opts, &config)?;
    let lookback = config.ward_window()?;
    let offset = ticks::display_offset(config.display_utc_offset_minutes);

    if opts.once {
        let now = Utc::now();
        if opts.ward {
            log_ward(&build_ward(source.as_ref(), source.as_ref(), &devices, &lookback, now));
        } else {
            log_detail(&build_detail(
                source.as_ref(),
                source.as_ref(),
                &device,
                &window,
                now,
                offset,
            )?);
        }
        return Ok(());
    }

    let (sender, receiver) = crossbeam_channel::unbounded();
    let mut schedulers = Vec::new();

    if opts.ward {
        let source = source.clone();
        let devices = devices.clone();
        schedulers.push(PollScheduler::start(
            "ward",
            config.ward_period(),
            move || {
                MonitorUpdate::Ward(build_ward(
                    source.as_ref(),
                    source.as_ref(),
                    &devices,
                    &lookback,
                    Utc::now(),
                ))
            },
            sender.clone(),
        )?);
    }

    if !opts.ward || opts.device.is_some() {
        let source = source.clone();
        let job = move || {
            MonitorUpdate::Detail(build_detail(
                source.as_ref(),
                source.as_ref(),
                &device,
                &window,
                Utc::now(),
                offset,
            ))
        };
        schedulers.push(PollScheduler::start(
            "detail",
            config.detail_period(),
            job,
            sender.clone(),
        )?);
    }
    drop(sender);

    let mut monitor = DeviceMonitor::new();
    while let Ok(update) = receiver.recv() {
        let is_ward = matches!(update.value, MonitorUpdate::Ward(_));
        if !monitor.apply(update) {
            continue;
        }
        if is_ward {
            log_ward(monitor.ward());
            let alerts: Vec<&str> = monitor.alerts().map(|c| c.device_id.as_str()).collect();
            if !alerts.is_empty() {
                log::warn!("{} critical: {}", alerts.len(), alerts.join(", "));
            }
        } else if let Some(error) = monitor.detail_error() {
            log::error!("{}", error);
        } else if let Some(detail) = monitor.detail() {
            log_detail(detail);
        }
    }

    log::info!("All pollers stopped, shutting down");
    drop(schedulers);
    Ok(())
}

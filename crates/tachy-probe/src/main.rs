//! Display timing probe.
//!
//! Opens a surface, calibrates the refresh cadence, then flashes a square
//! under a fixation cross until Escape (or the frame limit) and reports frame
//! pacing and reaction times to the flash onsets.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use tachy_engine::calibrate::{CalibrationConfig, RefreshCalibration, RefreshCalibrator};
use tachy_engine::coords::{Rect, Vec2};
use tachy_engine::device::{DisplayConfig, DisplaySurface, FrameRecord, MonitorInfo};
use tachy_engine::input::{EventSource, InputCapture};
use tachy_engine::logging::{LoggingConfig, init_logging};
use tachy_engine::paint::Color;
use tachy_engine::render::{center_rect_on_point, draw_fixation_cross, draw_rectangle};
use tachy_engine::session::{FrameLoop, LoopControl, SessionSummary, reaction_time};
use tachy_engine::time::{Clock, IntervalStats};
use tachy_engine::window::WinitPlatform;

/// Flashes per second of the probe square.
const FLASH_HZ: f64 = 2.0;
const SQUARE_SIZE: f32 = 200.0;

#[derive(Parser, Debug)]
#[command(name = "tachy-probe", about = "Calibrate refresh timing and probe frame pacing")]
struct Cli {
    /// Monitor index from `--list-monitors`.
    #[arg(long, default_value_t = 0)]
    monitor: usize,

    /// Open a window instead of going fullscreen.
    #[arg(long)]
    windowed: bool,

    /// Desired refresh rate in Hz.
    #[arg(long, default_value_t = 60.0)]
    refresh: f64,

    /// Disable vsync; presents are paced by the software limiter instead.
    #[arg(long)]
    no_vsync: bool,

    /// Presents used for calibration.
    #[arg(long, default_value_t = 50)]
    samples: usize,

    /// Leading calibration intervals to discard.
    #[arg(long, default_value_t = 5)]
    warmup: usize,

    /// Stop after this many frames instead of waiting for Escape.
    #[arg(long)]
    frames: Option<u64>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// List monitors and exit.
    #[arg(long)]
    list_monitors: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    monitor: &'a MonitorInfo,
    calibration: &'a RefreshCalibration,
    frames_presented: usize,
    frame_stats: Option<IntervalStats>,
    stop: String,
    onsets: usize,
    reaction_times_ms: Vec<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::default());
    log::debug!("{cli:?}");

    let mut platform = WinitPlatform::new()?;

    if cli.list_monitors {
        let monitors = platform.monitors()?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&monitors)?);
        } else {
            for m in &monitors {
                println!(
                    "{}: {}x{} at ({}, {}) {} {}",
                    m.index,
                    m.width,
                    m.height,
                    m.x,
                    m.y,
                    m.nominal_refresh_hz
                        .map_or_else(|| "refresh unknown".to_string(), |hz| format!("{hz:.3} Hz")),
                    m.name.as_deref().unwrap_or("")
                );
            }
        }
        return Ok(());
    }

    let mut config = DisplayConfig::default()
        .with_monitor(cli.monitor)
        .with_vsync(!cli.no_vsync)
        .with_refresh_rate(Some(cli.refresh));
    config.title = "tachy-probe".to_string();
    if cli.windowed {
        config = config.windowed();
    }

    let clock = Clock::monotonic();
    let mut surface = platform
        .open_surface(config, clock.clone())
        .context("failed to open display surface")?;

    let calibrator = RefreshCalibrator::new(CalibrationConfig {
        warmup_frames: cli.warmup,
        sample_count: cli.samples,
    });

    let mut input = InputCapture::new(platform, clock);
    let outcome = calibrator
        .run(&mut surface)
        .map_err(anyhow::Error::from)
        .and_then(|cal| {
            let (summary, onsets) = run_probe(&mut surface, &mut input, &cal, cli.frames)?;
            Ok((cal, summary, onsets))
        });

    let monitor = surface.geometry().clone();
    // The window goes before the event loop that owns it.
    surface.close();
    let (calibration, summary, onsets) = outcome?;

    let reaction_times_ms = reaction_times(&summary, &onsets)
        .into_iter()
        .map(|d| d.as_secs_f64() * 1e3)
        .collect::<Vec<_>>();

    let report = Report {
        monitor: &monitor,
        calibration: &calibration,
        frames_presented: summary.frames_presented(),
        frame_stats: summary.frame_stats,
        stop: format!("{:?}", summary.stop),
        onsets: onsets.len(),
        reaction_times_ms,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Runs the flash loop and returns the session plus the records of the
/// frames on which the square appeared.
fn run_probe<S: EventSource>(
    surface: &mut DisplaySurface,
    input: &mut InputCapture<S>,
    calibration: &RefreshCalibration,
    max_frames: Option<u64>,
) -> Result<(SessionSummary, Vec<FrameRecord>)> {
    let cycle = calibration.frames_per_cycle(FLASH_HZ);
    let on_frames = (cycle / 2).max(1);

    let (w, h) = surface.size();
    let center = Vec2::new(w as f32 / 2.0, h as f32 / 2.0);
    let square = center_rect_on_point(Rect::new(0.0, 0.0, SQUARE_SIZE, SQUARE_SIZE), center);

    let mut frame_loop = FrameLoop::new().with_background(Color::GRAY);
    if let Some(max) = max_frames {
        frame_loop = frame_loop.with_max_frames(max);
    }

    let mut onset_indices = Vec::new();
    let summary = frame_loop.run(surface, input, |ctx| {
        let phase = ctx.index % cycle;
        if phase < on_frames {
            draw_rectangle(ctx.surface, square, true, 0.0, Color::WHITE)?;
            if phase == 0 {
                onset_indices.push(ctx.index);
            }
        }
        draw_fixation_cross(ctx.surface, center, 10.0, 10.0, 2.0, Color::BLACK)?;
        Ok(LoopControl::Continue)
    })?;

    let onsets = onset_indices
        .into_iter()
        .filter_map(|i| summary.frames.get(i as usize).copied())
        .collect();
    Ok((summary, onsets))
}

/// First response after each onset, if it arrived before the next onset.
fn reaction_times(summary: &SessionSummary, onsets: &[FrameRecord]) -> Vec<Duration> {
    onsets
        .iter()
        .enumerate()
        .filter_map(|(i, onset)| {
            let (event, rt) = summary.first_response_after(onset)?;
            match onsets.get(i + 1) {
                Some(next) if reaction_time(next, &event).is_some() => None,
                _ => Some(rt),
            }
        })
        .collect()
}

fn print_report(report: &Report<'_>) {
    let cal = report.calibration;
    println!();
    println!("  monitor {}  {}x{}", report.monitor.index, report.monitor.width, report.monitor.height);
    match report.monitor.nominal_refresh_hz {
        Some(hz) => println!("  nominal   {hz:.3} Hz"),
        None => println!("  nominal   unknown"),
    }
    println!(
        "  measured  {:.3} Hz  ({:.4} ms ± {:.4} ms, {} samples, {} discarded)",
        cal.observed_rate_hz(),
        cal.observed_interval_seconds * 1e3,
        cal.jitter_seconds * 1e3,
        cal.samples,
        cal.discarded
    );
    if let Some(dev) = cal.deviation_hz() {
        println!("  deviation {dev:+.3} Hz from requested");
    }
    println!();
    println!("  frames    {} ({})", report.frames_presented, report.stop);
    if let Some(stats) = report.frame_stats {
        println!(
            "  pacing    {:.4} ms ± {:.4} ms  [{:.4} .. {:.4}]",
            stats.mean_ms(),
            stats.std_dev_ms(),
            stats.min * 1e3,
            stats.max * 1e3
        );
    }
    println!(
        "  responses {} / {} onsets",
        report.reaction_times_ms.len(),
        report.onsets
    );
    if let Some(rt) = IntervalStats::from_seconds(report.reaction_times_ms.iter().map(|ms| ms / 1e3)) {
        println!("  rt        {:.1} ms ± {:.1} ms", rt.mean_ms(), rt.std_dev_ms());
    }
    println!();
}

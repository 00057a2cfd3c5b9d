//! Composed poll → draw → present loop against the headless backend.

use std::time::Duration;

use tachy_engine::TachyError;
use tachy_engine::calibrate::{CalibrationConfig, RefreshCalibrator};
use tachy_engine::coords::{Rect, Vec2};
use tachy_engine::device::{DisplayConfig, DisplaySurface, DrawCmd, HeadlessBackend, HeadlessProbe, MonitorInfo};
use tachy_engine::input::{InputCapture, Key, MouseButton, RawInput, ScriptedEvents};
use tachy_engine::paint::Color;
use tachy_engine::render::{draw_fixation_cross, draw_rectangle, draw_stimulus};
use tachy_engine::session::{FrameLoop, LoopControl, StopReason};
use tachy_engine::texture::{PixelBuffer, ReleaseOutcome, TextureResource};
use tachy_engine::time::Clock;

const FRAME: Duration = Duration::from_nanos(16_666_667);

fn open(clock: &Clock, config: DisplayConfig) -> (DisplaySurface, HeadlessProbe) {
    let backend = HeadlessBackend::new((640, 480), clock.clone()).with_refresh_interval(FRAME);
    let probe = backend.probe();
    let monitors = [MonitorInfo::new(0, 640, 480, 0, 0).with_refresh(60.0)];
    let surface = DisplaySurface::create(&monitors, config, clock.clone(), move |_, _| {
        Ok(Box::new(backend))
    })
    .unwrap();
    (surface, probe)
}

// ── ordering ──────────────────────────────────────────────────────────────

#[test]
fn quit_is_honoured_after_the_frame_is_presented() {
    let (clock, _manual) = Clock::manual();
    let (mut surface, probe) = open(&clock, DisplayConfig::default().windowed());
    let events = ScriptedEvents::new()
        .then([])
        .then([RawInput::key_down(Key::Space)])
        .then([RawInput::key_up(Key::Space)])
        .then([RawInput::key_down(Key::Escape)]);
    let mut input = InputCapture::new(events, clock.clone());

    let mut seen_space = Vec::new();
    let summary = FrameLoop::new()
        .run(&mut surface, &mut input, |ctx| {
            seen_space.push((ctx.input.is_key_down(Key::Space), ctx.input.pressed_this_poll(Key::Space)));
            Ok(LoopControl::Continue)
        })
        .unwrap();

    assert_eq!(summary.stop, StopReason::Quit);
    assert_eq!(summary.frames_presented(), 4);
    assert_eq!(probe.presented(), 4);
    assert_eq!(
        seen_space,
        vec![(false, false), (true, true), (false, false), (false, false)]
    );

    for pair in summary.frames.windows(2) {
        assert!(pair[1].sequence > pair[0].sequence);
        assert!(pair[1].presented_at >= pair[0].presented_at);
    }

    // Space was drained by the poll right after frame 0 was presented.
    let (event, rt) = summary.first_response_after(&summary.frames[0]).unwrap();
    assert_eq!(event.key(), Some(Key::Space));
    assert_eq!(rt, Duration::ZERO);
    assert_eq!(summary.key_presses.len(), 2);
}

#[test]
fn responses_are_timed_against_frame_onsets() {
    let (clock, manual) = Clock::manual();
    let (mut surface, _probe) = open(&clock, DisplayConfig::default().windowed());
    let events = ScriptedEvents::new()
        .then([])
        .then([])
        .then([RawInput::button_down(MouseButton::Left), RawInput::button_up(MouseButton::Left)]);
    let mut input = InputCapture::new(events, clock.clone());

    let summary = FrameLoop::new()
        .with_max_frames(4)
        .run(&mut surface, &mut input, |_| {
            // Draw work that fits well inside a refresh.
            manual.advance(Duration::from_millis(3));
            Ok(LoopControl::Continue)
        })
        .unwrap();

    assert_eq!(summary.stop, StopReason::FrameLimit);
    let clicks = &summary.mouse_clicks;
    assert_eq!(clicks.len(), 2);
    assert_eq!(clicks[0].at, summary.frames[1].presented_at);

    let (_, rt) = summary.first_response_after(&summary.frames[0]).unwrap();
    assert_eq!(rt, FRAME);

    let stats = summary.frame_stats.unwrap();
    assert_eq!(stats.count, 3);
    assert!((stats.mean - FRAME.as_secs_f64()).abs() < 1e-9);
}

#[test]
fn callback_can_stop_the_loop() {
    let (clock, _manual) = Clock::manual();
    let (mut surface, _probe) = open(&clock, DisplayConfig::default().windowed());
    let mut input = InputCapture::new(ScriptedEvents::new(), clock.clone());

    let summary = FrameLoop::new()
        .run(&mut surface, &mut input, |ctx| {
            Ok(if ctx.index == 2 { LoopControl::Stop } else { LoopControl::Continue })
        })
        .unwrap();

    assert_eq!(summary.stop, StopReason::Stopped);
    assert_eq!(summary.frames_presented(), 3);
}

#[test]
fn zero_frame_limit_presents_nothing() {
    let (clock, _manual) = Clock::manual();
    let (mut surface, probe) = open(&clock, DisplayConfig::default().windowed());
    let mut input = InputCapture::new(ScriptedEvents::new(), clock.clone());

    let mut calls = 0;
    let summary = FrameLoop::new()
        .with_max_frames(0)
        .run(&mut surface, &mut input, |_| {
            calls += 1;
            Ok(LoopControl::Continue)
        })
        .unwrap();

    assert_eq!(summary.stop, StopReason::FrameLimit);
    assert_eq!(summary.frames_presented(), 0);
    assert_eq!(summary.frame_stats, None);
    assert_eq!(probe.presented(), 0);
    assert_eq!(calls, 0);
}

#[test]
fn draw_errors_end_the_loop() {
    let (clock, _manual) = Clock::manual();
    let (mut surface, probe) = open(&clock, DisplayConfig::default().windowed());
    let mut input = InputCapture::new(ScriptedEvents::new(), clock.clone());

    let err = FrameLoop::new()
        .run(&mut surface, &mut input, |ctx| {
            draw_rectangle(ctx.surface, Rect::from_corners(10.0, 10.0, 5.0, 20.0), true, 0.0, Color::WHITE)?;
            Ok(LoopControl::Continue)
        })
        .unwrap_err();

    assert!(matches!(err, TachyError::InvalidGeometry(_)));
    assert_eq!(probe.presented(), 0);
}

// ── drawing ───────────────────────────────────────────────────────────────

#[test]
fn each_frame_is_cleared_to_the_background() {
    let (clock, _manual) = Clock::manual();
    let (mut surface, probe) = open(&clock, DisplayConfig::default().windowed());
    let mut input = InputCapture::new(ScriptedEvents::new(), clock.clone());

    FrameLoop::new()
        .with_background([0u8, 0, 0])
        .with_max_frames(3)
        .run(&mut surface, &mut input, |ctx| {
            if ctx.index == 0 {
                draw_fixation_cross(ctx.surface, Vec2::new(320.0, 240.0), 10.0, 10.0, 2.0, Color::WHITE)?;
            }
            Ok(LoopControl::Continue)
        })
        .unwrap();

    assert_eq!(probe.last_clear(), Some(Color::BLACK));
    assert!(probe.last_frame().is_empty());
}

#[test]
fn stimulus_textures_survive_across_frames() {
    let (clock, _manual) = Clock::manual();
    let (mut surface, probe) = open(&clock, DisplayConfig::default().windowed());
    let mut input = InputCapture::new(ScriptedEvents::new(), clock.clone());

    let image = PixelBuffer::filled(10, 10, &[255, 0, 0]).unwrap();
    let mut texture = TextureResource::upload(&mut surface, &image).unwrap();
    let dest = Rect::new(100.0, 100.0, 64.0, 64.0);

    FrameLoop::new()
        .with_max_frames(5)
        .run(&mut surface, &mut input, |ctx| {
            draw_stimulus(ctx.surface, &texture, dest)?;
            Ok(LoopControl::Continue)
        })
        .unwrap();

    match probe.last_frame().as_slice() {
        [DrawCmd::Textured { texture: h, rect, tint }] => {
            assert_eq!(*h, texture.handle());
            assert_eq!(*rect, dest);
            assert_eq!(*tint, Color::WHITE);
        }
        other => panic!("unexpected frame contents: {other:?}"),
    }

    assert_eq!(texture.release(&mut surface).unwrap(), ReleaseOutcome::Released);
    assert_eq!(texture.release(&mut surface).unwrap(), ReleaseOutcome::AlreadyReleased);
    assert_eq!(probe.live_textures(), 0);
}

// ── calibration then loop ────────────────────────────────────────────────

#[test]
fn calibrated_frame_counts_drive_presentation() {
    let (clock, _manual) = Clock::manual();
    let (mut surface, _probe) = open(&clock, DisplayConfig::default().windowed());

    let calibration = RefreshCalibrator::new(CalibrationConfig::default())
        .run(&mut surface)
        .unwrap();
    let frames = calibration.frames_for_duration(0.5);
    assert_eq!(frames, 30);

    let mut input = InputCapture::new(ScriptedEvents::new(), clock.clone());
    let summary = FrameLoop::new()
        .with_max_frames(frames)
        .run(&mut surface, &mut input, |_| Ok(LoopControl::Continue))
        .unwrap();

    assert_eq!(summary.frames_presented(), 30);
    assert_eq!(summary.frames[0].sequence, 50);
    let elapsed = summary.frames[29].presented_at - summary.frames[0].presented_at;
    assert_eq!(elapsed, FRAME * 29);
}

//! Frame loop and session summary.
//!
//! One iteration is: poll input, clear, draw, present, then check for quit.
//! Drawing always sees the input state of the poll that immediately preceded
//! it, and quit is only honoured once the frame in flight has been presented.

use std::time::Duration;

use crate::device::{DisplaySurface, FrameRecord};
use crate::error::Result;
use crate::input::{EventSource, InputCapture, InputEvent};
use crate::paint::Color;
use crate::time::IntervalStats;

/// Returned by the draw callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    /// Present the current frame, then end the loop.
    Stop,
}

/// Why `FrameLoop::run` returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    Quit,
    Stopped,
    FrameLimit,
}

/// Per-frame context handed to the draw callback.
pub struct FrameCtx<'a, S> {
    pub surface: &'a mut DisplaySurface,
    pub input: &'a InputCapture<S>,

    /// Events delivered by this iteration's poll.
    pub events: &'a [InputEvent],

    /// Zero-based iteration within this run.
    pub index: u64,

    /// Most recent record before this frame, if any.
    pub previous: Option<FrameRecord>,
}

/// Drives the poll → draw → present cycle.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    background: Color,
    max_frames: Option<u64>,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self {
            background: Color::GRAY,
            max_frames: None,
        }
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color the back buffer is filled with before each draw.
    pub fn with_background(mut self, color: impl Into<Color>) -> Self {
        self.background = color.into();
        self
    }

    /// Stop after this many presented frames. A limit of zero returns
    /// before the first poll without presenting anything.
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Runs until the input latches quit, the callback returns
    /// `LoopControl::Stop`, or the frame limit is reached.
    ///
    /// Errors from the surface or the callback end the loop immediately.
    pub fn run<S, F>(
        &self,
        surface: &mut DisplaySurface,
        input: &mut InputCapture<S>,
        mut draw: F,
    ) -> Result<SessionSummary>
    where
        S: EventSource,
        F: FnMut(&mut FrameCtx<'_, S>) -> Result<LoopControl>,
    {
        let first = surface.frames().len();
        let mut index = 0u64;

        log::info!(
            "frame loop started (limit {:?}, vsync {})",
            self.max_frames,
            surface.vsync()
        );

        let stop = loop {
            if self.max_frames.is_some_and(|max| index >= max) {
                break StopReason::FrameLimit;
            }

            let events = input.poll_once();
            surface.fill(self.background)?;

            let previous = surface.frames().last().copied();
            let control = draw(&mut FrameCtx {
                surface: &mut *surface,
                input: &*input,
                events: &events,
                index,
                previous,
            })?;

            surface.present()?;
            index += 1;

            if input.should_quit() {
                break StopReason::Quit;
            }
            if control == LoopControl::Stop {
                break StopReason::Stopped;
            }
        };

        let summary = SessionSummary::collect(&surface.frames()[first..], input, stop);
        log::info!(
            "frame loop ended ({:?}) after {} frames, {} key presses, {} clicks",
            stop,
            summary.frames_presented(),
            summary.key_presses.len(),
            summary.mouse_clicks.len()
        );
        Ok(summary)
    }
}

/// Everything a run produced, copied out of the surface and the capture.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionSummary {
    pub frames: Vec<FrameRecord>,

    /// Statistics over the intervals between this run's frames.
    pub frame_stats: Option<IntervalStats>,

    pub key_presses: Vec<InputEvent>,
    pub mouse_clicks: Vec<InputEvent>,
    pub stop: StopReason,
}

impl SessionSummary {
    pub fn collect<S>(frames: &[FrameRecord], input: &InputCapture<S>, stop: StopReason) -> Self {
        // The first record's interval reaches back before the run.
        let frame_stats =
            IntervalStats::from_intervals(frames.iter().skip(1).filter_map(|f| f.interval));

        Self {
            frames: frames.to_vec(),
            frame_stats,
            key_presses: input.key_presses(),
            mouse_clicks: input.mouse_clicks(),
            stop,
        }
    }

    #[inline]
    pub fn frames_presented(&self) -> usize {
        self.frames.len()
    }

    /// Earliest key press or mouse click at or after `onset`, with its
    /// reaction time.
    pub fn first_response_after(&self, onset: &FrameRecord) -> Option<(InputEvent, Duration)> {
        self.key_presses
            .iter()
            .chain(self.mouse_clicks.iter())
            .filter_map(|ev| reaction_time(onset, ev).map(|rt| (*ev, rt)))
            .min_by_key(|(_, rt)| *rt)
    }
}

/// Time from a stimulus onset to a response. `None` when the response
/// precedes the onset.
pub fn reaction_time(onset: &FrameRecord, response: &InputEvent) -> Option<Duration> {
    response.at.checked_duration_since(onset.presented_at)
}

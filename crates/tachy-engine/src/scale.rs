//! Horizontal rating scale answered with the pointer.
//!
//! A bar with evenly spaced marks and taller end ticks, optional text labels
//! under the ends, and a handle that follows the pointer along the bar. The
//! handle position reads as a value from 0 at the left end to 100 at the
//! right end.

use crate::coords::Vec2;
use crate::device::DisplaySurface;
use crate::error::Result;
use crate::input::{EventSource, InputCapture, MouseButton};
use crate::paint::Color;
use crate::render::draw_line;
use crate::text::{Font, TextStimulus};

/// Geometry and colors, in physical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleLayout {
    /// Vertical position of the bar.
    pub y: f32,
    pub half_length: f32,
    pub bar_thickness: f32,
    pub bar_color: Color,

    /// Marks spread evenly from end to end, both ends included.
    pub marks: usize,
    pub half_mark_height: f32,
    pub mark_thickness: f32,
    pub mark_color: Color,

    pub half_end_height: f32,
    pub end_thickness: f32,
    pub end_color: Color,

    /// Gap between the end ticks and the label centers.
    pub label_offset: f32,

    pub half_handle_height: f32,
    pub handle_thickness: f32,
    pub handle_color: Color,
}

impl Default for ScaleLayout {
    fn default() -> Self {
        Self {
            y: 200.0,
            half_length: 400.0,
            bar_thickness: 4.0,
            bar_color: Color::BLACK,
            marks: 10,
            half_mark_height: 5.0,
            mark_thickness: 3.0,
            mark_color: Color::BLACK,
            half_end_height: 20.0,
            end_thickness: 4.0,
            end_color: Color::BLACK,
            label_offset: 12.0,
            half_handle_height: 12.0,
            handle_thickness: 6.0,
            handle_color: Color::RED,
        }
    }
}

/// Rating scale centered horizontally on the surface.
#[derive(Debug)]
pub struct RatingScale {
    layout: ScaleLayout,
    center_x: f32,
    handle_x: f32,
    labels: Option<[TextStimulus; 2]>,
}

impl RatingScale {
    /// Scale for a surface `surface_width` pixels wide, handle at the
    /// midpoint.
    pub fn new(surface_width: u32, layout: ScaleLayout) -> Self {
        let center_x = surface_width as f32 / 2.0;
        Self {
            layout,
            center_x,
            handle_x: center_x,
            labels: None,
        }
    }

    /// Renders `left` and `right` centered below the end ticks.
    pub fn attach_labels(
        &mut self,
        surface: &mut DisplaySurface,
        font: &Font,
        left: &str,
        right: &str,
        size_px: f32,
        color: impl Into<Color>,
    ) -> Result<()> {
        let color = color.into();
        let label_y = self.layout.y + self.layout.half_end_height + self.layout.label_offset;
        let (min_x, max_x) = self.extent();

        let left = TextStimulus::new(surface, font, left, size_px, color, Vec2::new(min_x, label_y))?;
        let right = match TextStimulus::new(surface, font, right, size_px, color, Vec2::new(max_x, label_y)) {
            Ok(right) => right,
            Err(err) => {
                let mut left = left;
                left.release(surface)?;
                return Err(err);
            }
        };
        if let Some(old) = self.labels.replace([left, right]) {
            release_labels(surface, old)?;
        }
        Ok(())
    }

    /// Left and right ends of the bar.
    pub fn extent(&self) -> (f32, f32) {
        (
            self.center_x - self.layout.half_length,
            self.center_x + self.layout.half_length,
        )
    }

    /// X positions of the marks.
    pub fn mark_positions(&self) -> Vec<f32> {
        let (min_x, max_x) = self.extent();
        let n = self.layout.marks;
        (0..n)
            .map(|i| {
                if n == 1 {
                    min_x
                } else {
                    min_x + (max_x - min_x) * i as f32 / (n - 1) as f32
                }
            })
            .collect()
    }

    /// Moves the handle under `pointer` when it is within two end-tick
    /// half-heights of the bar. Returns whether the handle moved.
    pub fn handle_pointer(&mut self, pointer: Vec2) -> bool {
        if (pointer.y - self.layout.y).abs() > self.layout.half_end_height * 2.0 {
            return false;
        }
        let (min_x, max_x) = self.extent();
        let x = pointer.x.clamp(min_x, max_x);
        let moved = x != self.handle_x;
        self.handle_x = x;
        moved
    }

    /// Drags the handle while the left button is held.
    pub fn track<S: EventSource>(&mut self, input: &InputCapture<S>) -> bool {
        match input.pointer_position() {
            Some(pointer) if input.is_button_down(MouseButton::Left) => self.handle_pointer(pointer),
            _ => false,
        }
    }

    /// Handle position from 0 (left end) to 100 (right end).
    pub fn value(&self) -> f64 {
        let (min_x, max_x) = self.extent();
        if max_x <= min_x {
            return 0.0;
        }
        f64::from((self.handle_x - min_x) / (max_x - min_x)) * 100.0
    }

    /// Places the handle at `value`, clamped to `0..=100`.
    pub fn set_value(&mut self, value: f64) {
        let (min_x, max_x) = self.extent();
        let t = (value.clamp(0.0, 100.0) / 100.0) as f32;
        self.handle_x = min_x + (max_x - min_x) * t;
    }

    pub fn handle_x(&self) -> f32 {
        self.handle_x
    }

    pub fn layout(&self) -> &ScaleLayout {
        &self.layout
    }

    /// Draws bar, marks, ends, labels and handle, in that order.
    pub fn draw(&self, surface: &mut DisplaySurface) -> Result<()> {
        let l = &self.layout;
        let (min_x, max_x) = self.extent();

        draw_line(surface, Vec2::new(min_x, l.y), Vec2::new(max_x, l.y), l.bar_thickness, l.bar_color)?;
        for x in self.mark_positions() {
            tick(surface, x, l.y, l.half_mark_height, l.mark_thickness, l.mark_color)?;
        }
        tick(surface, min_x, l.y, l.half_end_height, l.end_thickness, l.end_color)?;
        tick(surface, max_x, l.y, l.half_end_height, l.end_thickness, l.end_color)?;

        if let Some(labels) = &self.labels {
            for label in labels {
                label.draw(surface)?;
            }
        }

        tick(surface, self.handle_x, l.y, l.half_handle_height, l.handle_thickness, l.handle_color)
    }

    /// Frees the label textures, if any.
    pub fn release(&mut self, surface: &mut DisplaySurface) -> Result<()> {
        match self.labels.take() {
            Some(labels) => release_labels(surface, labels),
            None => Ok(()),
        }
    }
}

fn tick(surface: &mut DisplaySurface, x: f32, y: f32, half_height: f32, thickness: f32, color: Color) -> Result<()> {
    draw_line(surface, Vec2::new(x, y - half_height), Vec2::new(x, y + half_height), thickness, color)
}

fn release_labels(surface: &mut DisplaySurface, labels: [TextStimulus; 2]) -> Result<()> {
    for mut label in labels {
        label.release(surface)?;
    }
    Ok(())
}

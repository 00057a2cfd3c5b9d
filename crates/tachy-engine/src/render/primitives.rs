//! Back-buffer drawing helpers.
//!
//! Every function records commands into the surface's back buffer; nothing
//! becomes visible before the next `present()`. Colors accept `Color` or
//! 8-bit `[r, g, b]` triples.

use crate::coords::{Rect, Vec2};
use crate::device::{DisplaySurface, DrawCmd, TEXTURE_UNITS};
use crate::error::{Result, TachyError};
use crate::paint::Color;
use crate::texture::TextureResource;

/// Draws `rect` filled, or as an outline `thickness` pixels wide centered on
/// its edges.
///
/// Fails with `InvalidGeometry` when `x2 < x1` or `y2 < y1`.
pub fn draw_rectangle(
    surface: &mut DisplaySurface,
    rect: Rect,
    fill: bool,
    thickness: f32,
    color: impl Into<Color>,
) -> Result<()> {
    if !rect.is_ordered() {
        return Err(TachyError::InvalidGeometry(format!(
            "rectangle {:?} must have x2 >= x1 and y2 >= y1",
            rect.corners()
        )));
    }
    let color = color.into();

    if fill {
        return surface.draw(DrawCmd::Quad { rect, color });
    }

    if thickness.is_nan() || thickness <= 0.0 {
        return Err(TachyError::InvalidGeometry(format!(
            "outline thickness must be positive, got {thickness}"
        )));
    }

    let [x1, y1, x2, y2] = rect.corners();
    let half = thickness * 0.5;
    let edges = [
        Rect::from_corners(x1 - half, y1 - half, x2 + half, y1 + half),
        Rect::from_corners(x1 - half, y2 - half, x2 + half, y2 + half),
        Rect::from_corners(x1 - half, y1 + half, x1 + half, y2 - half),
        Rect::from_corners(x2 - half, y1 + half, x2 + half, y2 - half),
    ];
    for edge in edges {
        surface.draw(DrawCmd::Quad { rect: edge, color })?;
    }
    Ok(())
}

/// Draws a segment from `from` to `to`, `thickness` pixels wide.
pub fn draw_line(
    surface: &mut DisplaySurface,
    from: Vec2,
    to: Vec2,
    thickness: f32,
    color: impl Into<Color>,
) -> Result<()> {
    if !(from.is_finite() && to.is_finite() && thickness.is_finite() && thickness > 0.0) {
        return Err(TachyError::InvalidGeometry(format!(
            "line {from:?} -> {to:?} with thickness {thickness}"
        )));
    }
    surface.draw(DrawCmd::Line {
        from,
        to,
        thickness,
        color: color.into(),
    })
}

/// Draws a horizontal and a vertical stroke crossing at `center`.
pub fn draw_fixation_cross(
    surface: &mut DisplaySurface,
    center: Vec2,
    half_width: f32,
    half_height: f32,
    thickness: f32,
    color: impl Into<Color>,
) -> Result<()> {
    let color = color.into();
    draw_line(
        surface,
        Vec2::new(center.x - half_width, center.y),
        Vec2::new(center.x + half_width, center.y),
        thickness,
        color,
    )?;
    draw_line(
        surface,
        Vec2::new(center.x, center.y - half_height),
        Vec2::new(center.x, center.y + half_height),
        thickness,
        color,
    )
}

/// Moves `rect` so it is centered on `point`, keeping its size.
///
/// The top-left corner lands on `point - floor(size / 2)`, so odd sizes sit
/// on whole pixels.
pub fn center_rect_on_point(rect: Rect, point: Vec2) -> Rect {
    rect.centered_on(point)
}

/// Draws `texture` stretched over `dest`.
///
/// The texture occupies unit 0 for the duration of the call; the previous
/// occupant is restored afterwards.
pub fn draw_stimulus(
    surface: &mut DisplaySurface,
    texture: &TextureResource,
    dest: Rect,
) -> Result<()> {
    if !dest.has_area() {
        return Err(TachyError::InvalidGeometry(format!(
            "destination {:?} must have x2 > x1 and y2 > y1",
            dest.corners()
        )));
    }

    let previous = surface.bound_texture(0);
    texture.bind(surface)?;
    let drawn = draw_bound(surface, 0, dest);
    surface.restore_unit(0, previous);
    drawn
}

/// Draws whatever texture is bound to `unit` over `dest`.
///
/// The command captures the texture at record time; rebinding the unit
/// afterwards does not change what this draw shows.
pub fn draw_bound(surface: &mut DisplaySurface, unit: usize, dest: Rect) -> Result<()> {
    if unit >= TEXTURE_UNITS {
        return Err(TachyError::InvalidUnit {
            unit,
            available: TEXTURE_UNITS,
        });
    }
    let texture = surface
        .bound_texture(unit)
        .ok_or(TachyError::NothingBound { unit })?;

    surface.draw(DrawCmd::Textured {
        texture,
        rect: dest,
        tint: Color::WHITE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DisplayConfig, HeadlessBackend, HeadlessProbe, MonitorInfo};
    use crate::texture::PixelBuffer;
    use crate::time::Clock;

    fn surface() -> (DisplaySurface, HeadlessProbe) {
        let (clock, _manual) = Clock::manual();
        let monitors = [MonitorInfo::new(0, 800, 600, 0, 0)];
        let backend = HeadlessBackend::new((800, 600), clock.clone());
        let probe = backend.probe();
        let surface = DisplaySurface::create(
            &monitors,
            DisplayConfig::default().with_vsync(false),
            clock,
            move |_, _| Ok(Box::new(backend)),
        )
        .unwrap();
        (surface, probe)
    }

    // ── rectangles + lines ────────────────────────────────────────────────

    #[test]
    fn filled_rectangle_is_one_quad() {
        let (mut surface, probe) = surface();
        draw_rectangle(&mut surface, Rect::from_corners(10.0, 20.0, 30.0, 60.0), true, 1.0, [255u8, 0, 0])
            .unwrap();

        assert_eq!(
            probe.recording(),
            vec![DrawCmd::Quad {
                rect: Rect::new(10.0, 20.0, 20.0, 40.0),
                color: Color::RED,
            }]
        );
    }

    #[test]
    fn outline_is_four_edge_quads() {
        let (mut surface, probe) = surface();
        draw_rectangle(&mut surface, Rect::new(0.0, 0.0, 100.0, 50.0), false, 2.0, Color::WHITE)
            .unwrap();

        let rects: Vec<Rect> = probe
            .recording()
            .into_iter()
            .map(|cmd| match cmd {
                DrawCmd::Quad { rect, .. } => rect,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            rects,
            vec![
                Rect::new(-1.0, -1.0, 102.0, 2.0),
                Rect::new(-1.0, 49.0, 102.0, 2.0),
                Rect::new(-1.0, 1.0, 2.0, 48.0),
                Rect::new(99.0, 1.0, 2.0, 48.0),
            ]
        );
    }

    #[test]
    fn inverted_rectangle_is_rejected() {
        let (mut surface, probe) = surface();
        let err = draw_rectangle(&mut surface, Rect::from_corners(30.0, 0.0, 10.0, 5.0), true, 1.0, Color::WHITE)
            .unwrap_err();
        assert!(matches!(err, TachyError::InvalidGeometry(_)));
        assert!(probe.recording().is_empty());
    }

    #[test]
    fn fixation_cross_is_two_lines() {
        let (mut surface, probe) = surface();
        draw_fixation_cross(&mut surface, Vec2::new(400.0, 300.0), 10.0, 20.0, 3.0, Color::BLACK)
            .unwrap();

        let cmds = probe.recording();
        assert_eq!(cmds.len(), 2);
        assert_eq!(
            cmds[0],
            DrawCmd::Line {
                from: Vec2::new(390.0, 300.0),
                to: Vec2::new(410.0, 300.0),
                thickness: 3.0,
                color: Color::BLACK,
            }
        );
        assert_eq!(
            cmds[1],
            DrawCmd::Line {
                from: Vec2::new(400.0, 280.0),
                to: Vec2::new(400.0, 320.0),
                thickness: 3.0,
                color: Color::BLACK,
            }
        );
    }

    #[test]
    fn drawing_on_closed_surface_fails() {
        let (mut surface, _probe) = surface();
        surface.close();
        assert!(matches!(
            draw_line(&mut surface, Vec2::default(), Vec2::new(1.0, 1.0), 1.0, Color::WHITE),
            Err(TachyError::SurfaceClosed)
        ));
    }

    // ── centering ─────────────────────────────────────────────────────────

    #[test]
    fn center_rect_floors_half_size() {
        let r = center_rect_on_point(Rect::from_corners(0.0, 0.0, 101.0, 50.0), Vec2::new(400.0, 300.0));
        assert_eq!(r.corners(), [350.0, 275.0, 451.0, 325.0]);
    }

    // ── stimuli ───────────────────────────────────────────────────────────

    #[test]
    fn draw_stimulus_records_texture_and_restores_unit() {
        let (mut surface, probe) = surface();
        let image = PixelBuffer::filled(8, 8, &[200]).unwrap();
        let mut a = TextureResource::upload(&mut surface, &image).unwrap();
        let mut b = TextureResource::upload(&mut surface, &image).unwrap();

        a.bind(&mut surface).unwrap();
        let dest = Rect::from_corners(0.0, 0.0, 8.0, 8.0);
        draw_stimulus(&mut surface, &b, dest).unwrap();

        assert_eq!(surface.bound_texture(0), Some(a.handle()));
        assert_eq!(
            probe.recording(),
            vec![DrawCmd::Textured {
                texture: b.handle(),
                rect: dest,
                tint: Color::WHITE,
            }]
        );

        a.release(&mut surface).unwrap();
        b.release(&mut surface).unwrap();
    }

    #[test]
    fn draw_stimulus_rejects_degenerate_destination() {
        let (mut surface, _probe) = surface();
        let mut tex = TextureResource::upload(&mut surface, &PixelBuffer::filled(2, 2, &[0]).unwrap()).unwrap();

        for dest in [
            Rect::from_corners(10.0, 10.0, 10.0, 20.0),
            Rect::from_corners(10.0, 10.0, 20.0, 5.0),
        ] {
            assert!(matches!(
                draw_stimulus(&mut surface, &tex, dest),
                Err(TachyError::InvalidGeometry(_))
            ));
        }
        tex.release(&mut surface).unwrap();
    }

    #[test]
    fn draw_stimulus_after_release_fails() {
        let (mut surface, _probe) = surface();
        let mut tex = TextureResource::upload(&mut surface, &PixelBuffer::filled(2, 2, &[0]).unwrap()).unwrap();
        tex.release(&mut surface).unwrap();

        assert!(matches!(
            draw_stimulus(&mut surface, &tex, Rect::new(0.0, 0.0, 2.0, 2.0)),
            Err(TachyError::ResourceReleased)
        ));
    }

    #[test]
    fn draw_bound_requires_a_binding() {
        let (mut surface, _probe) = surface();
        assert!(matches!(
            draw_bound(&mut surface, 2, Rect::new(0.0, 0.0, 1.0, 1.0)),
            Err(TachyError::NothingBound { unit: 2 })
        ));
        assert!(matches!(
            draw_bound(&mut surface, 99, Rect::new(0.0, 0.0, 1.0, 1.0)),
            Err(TachyError::InvalidUnit { unit: 99, .. })
        ));
    }
}

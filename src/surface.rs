//! CPU raster surface the scene renderer paints onto.
//!
//! The buffer is straight-alpha RGBA8 and is kept fully opaque: every draw
//! blends "source over" against the existing pixels, so downstream consumers
//! (the encoder, PNG dumps) can treat frames as opaque rgba without a
//! flattening pass.

use crate::{
    color::{Rgba8, lerp_rgba},
    error::{ReelError, ReelResult},
};

/// One finished frame, snapshotted off the surface for the capture pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Acquire a drawing surface. Fails (rather than panicking later) when the
    /// requested dimensions cannot back a raster buffer.
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::surface("canvas dimensions must be non-zero"));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| ReelError::surface("canvas dimensions overflow"))?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Snapshot the current pixels for the capture pipeline.
    pub fn frame(&self) -> FrameRgba {
        FrameRgba {
            width: self.width,
            height: self.height,
            data: self.data.clone(),
        }
    }

    /// Overwrite every pixel with an opaque color.
    pub fn clear(&mut self, color: Rgba8) {
        for px in self.data.chunks_exact_mut(4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = 255;
        }
    }

    /// Blend one pixel, source-over. Out-of-bounds coordinates are ignored.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba8) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = &mut self.data[idx..idx + 4];
        let a = u16::from(color.a);
        if a == 0 {
            return;
        }
        let inv = 255 - a;
        px[0] = mul_div255(u16::from(color.r), a).saturating_add(mul_div255(u16::from(px[0]), inv));
        px[1] = mul_div255(u16::from(color.g), a).saturating_add(mul_div255(u16::from(px[1]), inv));
        px[2] = mul_div255(u16::from(color.b), a).saturating_add(mul_div255(u16::from(px[2]), inv));
        px[3] = 255;
    }

    /// Fill an axis-aligned rect (f64 coordinates, clipped to the surface).
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba8) {
        let Some((x0, y0, x1, y1)) = self.clip_rect(x, y, w, h) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px as i64, py as i64, color);
            }
        }
    }

    /// Fill a rect with a horizontal gradient from `left` to `right`.
    pub fn fill_rect_h_gradient(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        left: Rgba8,
        right: Rgba8,
    ) {
        let Some((x0, y0, x1, y1)) = self.clip_rect(x, y, w, h) else {
            return;
        };
        if w <= 0.0 {
            return;
        }
        for px in x0..x1 {
            let t = (px as f64 + 0.5 - x) / w;
            let color = lerp_rgba(left, right, t);
            for py in y0..y1 {
                self.blend_pixel(px as i64, py as i64, color);
            }
        }
    }

    /// Fill the whole surface with a gradient along the top-left to
    /// bottom-right diagonal.
    pub fn fill_diagonal_gradient(&mut self, start: Rgba8, end: Rgba8) {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let norm = w * w + h * h;
        for py in 0..self.height {
            for px in 0..self.width {
                // Projection of (x,y) onto the diagonal direction (w,h).
                let t = ((px as f64 + 0.5) * w + (py as f64 + 0.5) * h) / norm;
                let color = lerp_rgba(start, end, t);
                let idx = (py as usize * self.width as usize + px as usize) * 4;
                self.data[idx] = color.r;
                self.data[idx + 1] = color.g;
                self.data[idx + 2] = color.b;
                self.data[idx + 3] = 255;
            }
        }
    }

    /// Stroke a rect outline with the given line width.
    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, line: f64, color: Rgba8) {
        self.fill_rect(x, y, w, line, color);
        self.fill_rect(x, y + h - line, w, line, color);
        self.fill_rect(x, y + line, line, h - 2.0 * line, color);
        self.fill_rect(x + w - line, y + line, line, h - 2.0 * line, color);
    }

    fn clip_rect(&self, x: f64, y: f64, w: f64, h: f64) -> Option<(u32, u32, u32, u32)> {
        if !(w > 0.0) || !(h > 0.0) {
            return None;
        }
        let x0 = x.floor().max(0.0) as i64;
        let y0 = y.floor().max(0.0) as i64;
        let x1 = (x + w).ceil().min(f64::from(self.width)) as i64;
        let y1 = (y + h).ceil().min(f64::from(self.height)) as i64;
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(surface: &Surface, x: u32, y: u32) -> [u8; 4] {
        let f = surface.frame();
        let idx = (y as usize * f.width as usize + x as usize) * 4;
        [f.data[idx], f.data[idx + 1], f.data[idx + 2], f.data[idx + 3]]
    }

    #[test]
    fn new_rejects_zero_dimensions() {
        assert!(matches!(
            Surface::new(0, 10),
            Err(crate::error::ReelError::SurfaceUnavailable(_))
        ));
    }

    #[test]
    fn clear_overwrites_everything() {
        let mut s = Surface::new(4, 4).unwrap();
        s.fill_rect(0.0, 0.0, 4.0, 4.0, Rgba8::rgb(9, 9, 9));
        s.clear(Rgba8::rgb(1, 2, 3));
        assert_eq!(pixel(&s, 3, 3), [1, 2, 3, 255]);
    }

    #[test]
    fn fill_rect_blends_alpha_over_background() {
        let mut s = Surface::new(2, 2).unwrap();
        s.clear(Rgba8::rgb(0, 0, 0));
        s.fill_rect(0.0, 0.0, 2.0, 2.0, Rgba8::rgba(255, 0, 0, 128));
        let [r, g, b, a] = pixel(&s, 0, 0);
        assert_eq!((g, b, a), (0, 0, 255));
        assert!((127..=129).contains(&r));
    }

    #[test]
    fn fill_rect_clips_out_of_bounds() {
        let mut s = Surface::new(2, 2).unwrap();
        s.clear(Rgba8::rgb(0, 0, 0));
        s.fill_rect(-10.0, -10.0, 100.0, 5.0, Rgba8::rgb(255, 255, 255));
        assert_eq!(pixel(&s, 1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn diagonal_gradient_is_darker_at_origin() {
        let mut s = Surface::new(8, 8).unwrap();
        s.fill_diagonal_gradient(Rgba8::rgb(0, 0, 0), Rgba8::rgb(200, 200, 200));
        assert!(pixel(&s, 0, 0)[0] < pixel(&s, 7, 7)[0]);
    }

    #[test]
    fn horizontal_gradient_interpolates_left_to_right() {
        let mut s = Surface::new(10, 1).unwrap();
        s.clear(Rgba8::rgb(0, 0, 0));
        s.fill_rect_h_gradient(0.0, 0.0, 10.0, 1.0, Rgba8::rgb(0, 0, 0), Rgba8::rgb(250, 0, 0));
        assert!(pixel(&s, 0, 0)[0] < pixel(&s, 9, 0)[0]);
    }

    #[test]
    fn frame_snapshot_is_independent() {
        let mut s = Surface::new(2, 2).unwrap();
        s.clear(Rgba8::rgb(5, 5, 5));
        let before = s.frame();
        s.clear(Rgba8::rgb(6, 6, 6));
        assert_ne!(before, s.frame());
    }
}

//! Small sRGB color helpers for the renderer.

/// Straight-alpha RGBA8.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scale this color's alpha by `alpha` in [0,1].
    pub fn with_alpha(self, alpha: f64) -> Self {
        let a = (f64::from(self.a) * alpha.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

/// Convert HSL (hue in degrees, saturation/lightness in [0,1]) to opaque RGBA8.
///
/// Hue wraps, so callers can pass an unbounded rotating offset directly.
pub fn hsl_to_rgba(hue_deg: f64, saturation: f64, lightness: f64) -> Rgba8 {
    let h = hue_deg.rem_euclid(360.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba8::rgb(to_u8(r1), to_u8(g1), to_u8(b1))
}

/// Linear interpolation between two colors, `t` in [0,1].
pub fn lerp_rgba(a: Rgba8, b: Rgba8, t: f64) -> Rgba8 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * t).round() as u8;
    Rgba8 {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
        a: mix(a.a, b.a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgba(0.0, 1.0, 0.5), Rgba8::rgb(255, 0, 0));
        assert_eq!(hsl_to_rgba(120.0, 1.0, 0.5), Rgba8::rgb(0, 255, 0));
        assert_eq!(hsl_to_rgba(240.0, 1.0, 0.5), Rgba8::rgb(0, 0, 255));
    }

    #[test]
    fn hsl_grays_ignore_hue() {
        assert_eq!(hsl_to_rgba(37.0, 0.0, 0.5), hsl_to_rgba(290.0, 0.0, 0.5));
        assert_eq!(hsl_to_rgba(0.0, 1.0, 1.0), Rgba8::rgb(255, 255, 255));
        assert_eq!(hsl_to_rgba(0.0, 1.0, 0.0), Rgba8::rgb(0, 0, 0));
    }

    #[test]
    fn hue_wraps_past_360() {
        assert_eq!(hsl_to_rgba(420.0, 1.0, 0.5), hsl_to_rgba(60.0, 1.0, 0.5));
        assert_eq!(hsl_to_rgba(-60.0, 1.0, 0.5), hsl_to_rgba(300.0, 1.0, 0.5));
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = Rgba8::rgb(0, 0, 0);
        let b = Rgba8::rgb(255, 255, 255);
        assert_eq!(lerp_rgba(a, b, 0.0), a);
        assert_eq!(lerp_rgba(a, b, 1.0), b);
        assert_eq!(lerp_rgba(a, b, 0.5).r, 128);
    }

    #[test]
    fn with_alpha_scales() {
        let c = Rgba8::rgb(10, 20, 30).with_alpha(0.5);
        assert_eq!(c.a, 128);
        assert_eq!(c.r, 10);
    }
}

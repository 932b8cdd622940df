//! Diverging red-white-blue ramp and equal-width contour banding.

use plotters::style::RGBColor;

#[derive(Debug, Clone, Copy)]
struct ColorStop {
    t: f64,
    color: RGBColor,
}

const fn stop(t: f64, r: u8, g: u8, b: u8) -> ColorStop {
    ColorStop {
        t,
        color: RGBColor(r, g, b),
    }
}

/// Low end (negative anomalies) is dark red, the middle white, the high end dark blue.
const RED_WHITE_BLUE: &[ColorStop] = &[
    stop(0.0, 0x67, 0x00, 0x1f),
    stop(0.1, 0xb2, 0x18, 0x2b),
    stop(0.2, 0xd6, 0x60, 0x4d),
    stop(0.3, 0xf4, 0xa5, 0x82),
    stop(0.4, 0xfd, 0xdb, 0xc7),
    stop(0.5, 0xf7, 0xf7, 0xf7),
    stop(0.6, 0xd1, 0xe5, 0xf0),
    stop(0.7, 0x92, 0xc5, 0xde),
    stop(0.8, 0x43, 0x93, 0xc3),
    stop(0.9, 0x21, 0x66, 0xac),
    stop(1.0, 0x05, 0x30, 0x61),
];

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

/// Colour at normalised position `t`; values outside `[0, 1]` clamp to the ends.
pub fn diverging(t: f64) -> RGBColor {
    let stops = RED_WHITE_BLUE;
    if t.is_nan() {
        return stops[stops.len() / 2].color;
    }
    if t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }

    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let ratio = (t - lo.t) / (hi.t - lo.t);
            return RGBColor(
                lerp(lo.color.0, hi.color.0, ratio),
                lerp(lo.color.1, hi.color.1, ratio),
                lerp(lo.color.2, hi.color.2, ratio),
            );
        }
    }
    stops[stops.len() - 1].color
}

/// `levels` equal-width bands over `[min, max]`, each painted with the ramp
/// colour at its midpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourBands {
    min: f64,
    max: f64,
    colors: Vec<RGBColor>,
}

impl ContourBands {
    pub fn new(min: f64, max: f64, levels: usize) -> Self {
        let levels = levels.max(1);
        let colors = (0..levels)
            .map(|k| diverging((k as f64 + 0.5) / levels as f64))
            .collect();
        Self { min, max, colors }
    }

    pub fn levels(&self) -> usize {
        self.colors.len()
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Band containing `value`. A flat range puts everything in the middle band.
    pub fn band(&self, value: f64) -> usize {
        let levels = self.colors.len();
        let span = self.max - self.min;
        if span <= 0.0 || !span.is_finite() {
            return levels / 2;
        }
        let k = ((value - self.min) / span * levels as f64).floor();
        if k.is_nan() || k < 0.0 {
            0
        } else {
            (k as usize).min(levels - 1)
        }
    }

    pub fn color(&self, value: f64) -> RGBColor {
        self.colors[self.band(value)]
    }

    /// Lower and upper value of band `k`.
    pub fn bounds(&self, k: usize) -> (f64, f64) {
        let step = (self.max - self.min) / self.colors.len() as f64;
        (self.min + k as f64 * step, self.min + (k + 1) as f64 * step)
    }

    pub fn band_color(&self, k: usize) -> RGBColor {
        self.colors[k.min(self.colors.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints_and_midpoint() {
        assert_eq!(diverging(0.0), RGBColor(0x67, 0x00, 0x1f));
        assert_eq!(diverging(0.5), RGBColor(0xf7, 0xf7, 0xf7));
        assert_eq!(diverging(1.0), RGBColor(0x05, 0x30, 0x61));
        assert_eq!(diverging(-4.0), diverging(0.0));
        assert_eq!(diverging(7.0), diverging(1.0));
    }

    #[test]
    fn test_low_values_are_red_high_values_blue() {
        let low = diverging(0.05);
        let high = diverging(0.95);
        assert!(low.0 > low.2);
        assert!(high.2 > high.0);
    }

    #[test]
    fn test_bands_partition_range() {
        let bands = ContourBands::new(-20.0, 30.0, 50);
        assert_eq!(bands.levels(), 50);
        assert_eq!(bands.band(-20.0), 0);
        assert_eq!(bands.band(30.0), 49);
        assert_eq!(bands.band(-19.5), 0);
        assert_eq!(bands.band(-18.9), 1);
        assert_eq!(bands.band(1e9), 49);
        assert_eq!(bands.band(-1e9), 0);
        assert_eq!(bands.bounds(0), (-20.0, -19.0));
    }

    #[test]
    fn test_flat_range_uses_middle_band() {
        let bands = ContourBands::new(4.0, 4.0, 50);
        assert_eq!(bands.band(4.0), 25);
        assert_eq!(bands.color(4.0), bands.band_color(25));
    }
}

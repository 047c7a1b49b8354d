//! Sequential colour ramps.
//!
//! Each ramp is nine evenly spaced stops sampled from the matplotlib map of
//! the same name; values in between are linearly interpolated.

use image::Rgb;

type Stops = [[u8; 3]; 9];

const REDS: Stops = [
    [255, 245, 240],
    [254, 224, 210],
    [252, 187, 161],
    [252, 146, 114],
    [251, 106, 74],
    [239, 59, 44],
    [203, 24, 29],
    [165, 15, 21],
    [103, 0, 13],
];

const GREENS: Stops = [
    [247, 252, 245],
    [229, 245, 224],
    [199, 233, 192],
    [161, 217, 155],
    [116, 196, 118],
    [65, 171, 93],
    [35, 139, 69],
    [0, 109, 44],
    [0, 68, 27],
];

const BLUES: Stops = [
    [247, 251, 255],
    [222, 235, 247],
    [198, 219, 239],
    [158, 202, 225],
    [107, 174, 214],
    [66, 146, 198],
    [33, 113, 181],
    [8, 81, 156],
    [8, 48, 107],
];

const GREYS: Stops = [
    [255, 255, 255],
    [240, 240, 240],
    [217, 217, 217],
    [189, 189, 189],
    [150, 150, 150],
    [115, 115, 115],
    [82, 82, 82],
    [37, 37, 37],
    [0, 0, 0],
];

const MAGMA: Stops = [
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

const INFERNO: Stops = [
    [0, 0, 4],
    [31, 12, 72],
    [85, 15, 109],
    [136, 34, 106],
    [186, 54, 85],
    [227, 89, 51],
    [249, 140, 10],
    [249, 201, 50],
    [252, 255, 164],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRamp {
    Reds,
    Greens,
    Blues,
    Greys,
    Magma,
    Inferno,
}

impl ColorRamp {
    /// Ramps cycled through when plotting several cases on one chart.
    pub const CASE_CYCLE: [ColorRamp; 5] = [
        ColorRamp::Reds,
        ColorRamp::Greens,
        ColorRamp::Blues,
        ColorRamp::Greys,
        ColorRamp::Magma,
    ];

    /// Ramp for the `index`-th case.
    pub fn for_case(index: usize) -> Self {
        Self::CASE_CYCLE[index % Self::CASE_CYCLE.len()]
    }

    fn stops(self) -> &'static Stops {
        match self {
            ColorRamp::Reds => &REDS,
            ColorRamp::Greens => &GREENS,
            ColorRamp::Blues => &BLUES,
            ColorRamp::Greys => &GREYS,
            ColorRamp::Magma => &MAGMA,
            ColorRamp::Inferno => &INFERNO,
        }
    }

    /// Colour at `t`, clamped to `[0, 1]`. NaN maps to the low end.
    pub fn sample(self, t: f64) -> Rgb<u8> {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * (stops.len() - 1) as f64;
        let lo = (pos.floor() as usize).min(stops.len() - 1);
        let hi = (lo + 1).min(stops.len() - 1);
        let frac = pos - lo as f64;

        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        Rgb([
            mix(stops[lo][0], stops[hi][0]),
            mix(stops[lo][1], stops[hi][1]),
            mix(stops[lo][2], stops[hi][2]),
        ])
    }

    /// `n` colours evenly spaced over the full ramp.
    pub fn linspace(self, n: usize) -> Vec<Rgb<u8>> {
        match n {
            0 => vec![],
            1 => vec![self.sample(0.0)],
            _ => (0..n)
                .map(|i| self.sample(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

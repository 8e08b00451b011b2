//! Color stock and interpolation helpers shared by the bubble map, the
//! TSS-proximity track and the LD triangle.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const WHITE: Rgb = Rgb::new(255, 255, 255);
pub const BLACK: Rgb = Rgb::new(0, 0, 0);

/// Diverging blue-white-red ramp for signed effect sizes.
pub const BLUE_RED: [Rgb; 3] = [
    Rgb::new(5, 113, 176),
    Rgb::new(247, 247, 247),
    Rgb::new(202, 0, 32),
];

/// Sequential ramp for non-negative values.
pub const STEEL_BLUES: [Rgb; 10] = [
    Rgb::new(247, 250, 252),
    Rgb::new(222, 233, 242),
    Rgb::new(198, 217, 233),
    Rgb::new(173, 200, 223),
    Rgb::new(149, 184, 214),
    Rgb::new(125, 168, 204),
    Rgb::new(100, 151, 195),
    Rgb::new(76, 135, 185),
    Rgb::new(64, 118, 163),
    Rgb::new(54, 100, 139),
];

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
    v.round().clamp(0.0, 255.0) as u8
}

pub fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    Rgb::new(
        lerp_channel(a.r, b.r, t),
        lerp_channel(a.g, b.g, t),
        lerp_channel(a.b, b.b, t),
    )
}

/// Piecewise-linear interpolation over (value, color) stops.
/// Stops must be sorted by value; values outside the domain clamp to the ends.
pub fn ramp(stops: &[(f64, Rgb)], value: f64) -> Rgb {
    match stops {
        [] => BLACK,
        [only] => only.1,
        _ => {
            if value <= stops[0].0 {
                return stops[0].1;
            }
            for pair in stops.windows(2) {
                let (v0, c0) = pair[0];
                let (v1, c1) = pair[1];
                if value <= v1 {
                    let span = v1 - v0;
                    let t = if span > 0.0 { (value - v0) / span } else { 1.0 };
                    return lerp(c0, c1, t);
                }
            }
            stops[stops.len() - 1].1
        }
    }
}

/// Grey shade for an LD r-squared value: white at 0, black at 1.
pub fn ld_shade(r2: f64) -> Rgb {
    lerp(WHITE, BLACK, r2)
}

//! Conversion between color spaces.
//!
//! Every space can be converted to and from XYZ with a D65 white point, which acts as
//! the hub of the conversion graph. Spaces that share a simpler common base (the sRGB
//! family, Lab/LCh and OKLab/OKLCh) are converted directly without the detour.
//!
//! Channels are passed in the native units of each space, see [ColorSpace].
//! Nothing in here clamps, out-of-gamut values are passed through unchanged.
//!
//! Matrices and transfer functions follow <https://drafts.csswg.org/css-color-4/#color-conversion-code>.

use std::sync::LazyLock;

use crate::space::ColorSpace;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix3([[f64; 3]; 3]);

impl Matrix3 {
    #[must_use]
    pub const fn new(rows: [[f64; 3]; 3]) -> Self {
        Self(rows)
    }

    #[must_use]
    pub fn transform(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Compute the inverse through the adjugate.
    ///
    /// The matrix must not be singular, otherwise the result consists of non-finite values.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let m = &self.0;
        let inverse_determinant = 1. / self.determinant();

        let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
            (m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]) * inverse_determinant
        };

        Self([
            [cofactor(1, 2, 1, 2), -cofactor(0, 2, 1, 2), cofactor(0, 1, 1, 2)],
            [-cofactor(1, 2, 0, 2), cofactor(0, 2, 0, 2), -cofactor(0, 1, 0, 2)],
            [cofactor(1, 2, 0, 1), -cofactor(0, 2, 0, 1), cofactor(0, 1, 0, 1)],
        ])
    }
}

const LINEAR_SRGB_TO_XYZ: Matrix3 = Matrix3::new([
    [506752. / 1228815., 87881. / 245763., 12673. / 70218.],
    [87098. / 409605., 175762. / 245763., 12673. / 175545.],
    [7918. / 409605., 87881. / 737289., 1001167. / 1053270.],
]);

const XYZ_TO_LINEAR_SRGB: Matrix3 = Matrix3::new([
    [12831. / 3959., -329. / 214., -1974. / 3959.],
    [-851781. / 878810., 1648619. / 878810., 36519. / 878810.],
    [705. / 12673., -2585. / 12673., 705. / 667.],
]);

const LINEAR_P3_TO_XYZ: Matrix3 = Matrix3::new([
    [608311. / 1250200., 189793. / 714400., 198249. / 1000160.],
    [35783. / 156275., 247089. / 357200., 198249. / 2500400.],
    [0., 32229. / 714400., 5220557. / 5000800.],
]);

const XYZ_TO_LINEAR_P3: Matrix3 = Matrix3::new([
    [446124. / 178915., -333277. / 357830., -72051. / 178915.],
    [-14852. / 17905., 63121. / 35810., 423. / 17905.],
    [11844. / 330415., -50337. / 660830., 316169. / 330415.],
]);

const LINEAR_A98_TO_XYZ: Matrix3 = Matrix3::new([
    [573536. / 994567., 263643. / 1420810., 187206. / 994567.],
    [591459. / 1989134., 6239551. / 9945670., 374412. / 4972835.],
    [53769. / 1989134., 351524. / 4972835., 4929758. / 4972835.],
]);

const XYZ_TO_LINEAR_A98: Matrix3 = Matrix3::new([
    [1829569. / 896150., -506331. / 896150., -308931. / 896150.],
    [-851781. / 878810., 1648619. / 878810., 36519. / 878810.],
    [16779. / 1248040., -147721. / 1248040., 1266979. / 1248040.],
]);

const LINEAR_REC2020_TO_XYZ: Matrix3 = Matrix3::new([
    [63426534. / 99577255., 20160776. / 139408157., 47086771. / 278816314.],
    [26158966. / 99577255., 472592308. / 697040785., 8267143. / 139408157.],
    [0., 19567812. / 697040785., 295819943. / 278816314.],
]);

const XYZ_TO_LINEAR_REC2020: Matrix3 = Matrix3::new([
    [30757411. / 17917100., -6372589. / 17917100., -4539589. / 17917100.],
    [-19765991. / 29648200., 47925759. / 29648200., 467509. / 29648200.],
    [792561. / 44930125., -1921689. / 44930125., 42328811. / 44930125.],
]);

/// ProPhoto RGB is defined relative to D50
const LINEAR_PROPHOTO_TO_XYZ_D50: Matrix3 = Matrix3::new([
    [0.797_766_644_900_642_3, 0.135_181_297_400_533_08, 0.031_347_734_128_392_2],
    [0.288_074_828_819_401_3, 0.711_835_234_241_873, 0.000_089_936_938_725_64],
    [0., 0., 0.825_104_602_510_460_2],
]);

const XYZ_D50_TO_LINEAR_PROPHOTO: Matrix3 = Matrix3::new([
    [1.345_786_881_647_158_3, -0.255_572_087_379_794_64, -0.051_101_864_975_545_26],
    [-0.544_630_705_124_901_9, 1.508_247_742_845_146_8, 0.020_527_447_436_421_39],
    [0., 0., 1.211_967_545_638_945_2],
]);

/// Bradford chromatic adaptation from D65 to D50
const D65_TO_D50: Matrix3 = Matrix3::new([
    [1.047_929_792_544_996_9, 0.022_946_870_601_609_652, -0.050_192_266_289_205_24],
    [0.029_627_808_770_055_99, 0.990_434_426_753_879_9, -0.017_073_799_063_418_826],
    [-0.009_243_040_646_204_504, 0.015_055_191_490_298_152, 0.751_874_281_428_137_1],
]);

/// The exact inverse of [D65_TO_D50], so that adapting back and forth is stable
static D50_TO_D65: LazyLock<Matrix3> = LazyLock::new(|| D65_TO_D50.inverse());

const XYZ_TO_LMS: Matrix3 = Matrix3::new([
    [0.819_022_437_996_703, 0.361_906_260_052_890_4, -0.128_873_781_520_987_9],
    [0.032_983_653_932_388_5, 0.929_286_861_586_343_4, 0.036_144_666_350_642_4],
    [0.048_177_189_359_624_2, 0.264_239_531_752_730_8, 0.633_547_828_469_430_9],
]);

const LMS_TO_OKLAB: Matrix3 = Matrix3::new([
    [0.210_454_268_309_314, 0.793_617_774_702_305_4, -0.004_072_043_011_619_3],
    [1.977_998_532_431_168_4, -2.428_592_242_048_58, 0.450_593_709_617_411],
    [0.025_904_042_465_547_8, 0.782_771_712_457_529_6, -0.808_675_754_923_077_4],
]);

const OKLAB_TO_LMS: Matrix3 = Matrix3::new([
    [1., 0.396_337_777_376_174_9, 0.215_803_757_309_913_6],
    [1., -0.105_561_345_815_658_6, -0.063_854_172_825_813_3],
    [1., -0.089_484_177_529_811_9, -1.291_485_548_019_409_2],
]);

const LMS_TO_XYZ: Matrix3 = Matrix3::new([
    [1.226_879_875_845_924_3, -0.557_814_994_460_217_1, 0.281_391_045_665_964_7],
    [-0.040_575_745_214_800_8, 1.112_286_803_280_317, -0.071_711_058_065_516_4],
    [-0.076_372_936_674_660_1, -0.421_493_332_402_243_2, 1.586_924_019_836_781_6],
]);

/// CIE standard D50 white, from its chromaticity coordinates
pub const D50_WHITE: [f64; 3] = [
    0.3457 / 0.3585,
    1.,
    (1. - 0.3457 - 0.3585) / 0.3585,
];

/// CIE standard D65 white, from its chromaticity coordinates
pub const D65_WHITE: [f64; 3] = [
    0.3127 / 0.3290,
    1.,
    (1. - 0.3127 - 0.3290) / 0.3290,
];

const LAB_KAPPA: f64 = 24389. / 27.;
const LAB_EPSILON: f64 = 216. / 24389.;

fn map(values: [f64; 3], f: impl Fn(f64) -> f64) -> [f64; 3] {
    [f(values[0]), f(values[1]), f(values[2])]
}

/// Apply `f` to the magnitude of `c`, keeping its sign
fn mirrored(c: f64, f: impl Fn(f64) -> f64) -> f64 {
    f(c.abs()).copysign(c)
}

/// sRGB transfer function, also used by display-p3
fn srgb_to_linear(c: f64) -> f64 {
    if c.abs() <= 0.04045 {
        c / 12.92
    } else {
        mirrored(c, |c| ((c + 0.055) / 1.055).powf(2.4))
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    if c.abs() > 0.003_130_8 {
        mirrored(c, |c| 1.055 * c.powf(1. / 2.4) - 0.055)
    } else {
        12.92 * c
    }
}

fn a98_to_linear(c: f64) -> f64 {
    mirrored(c, |c| c.powf(563. / 256.))
}

fn linear_to_a98(c: f64) -> f64 {
    mirrored(c, |c| c.powf(256. / 563.))
}

fn prophoto_to_linear(c: f64) -> f64 {
    if c.abs() <= 16. / 512. {
        c / 16.
    } else {
        mirrored(c, |c| c.powf(1.8))
    }
}

fn linear_to_prophoto(c: f64) -> f64 {
    if c.abs() >= 1. / 512. {
        mirrored(c, |c| c.powf(1. / 1.8))
    } else {
        16. * c
    }
}

const REC2020_ALPHA: f64 = 1.099_296_826_809_44;
const REC2020_BETA: f64 = 0.018_053_968_510_807;

fn rec2020_to_linear(c: f64) -> f64 {
    if c.abs() < REC2020_BETA * 4.5 {
        c / 4.5
    } else {
        mirrored(c, |c| ((c + REC2020_ALPHA - 1.) / REC2020_ALPHA).powf(1. / 0.45))
    }
}

fn linear_to_rec2020(c: f64) -> f64 {
    if c.abs() > REC2020_BETA {
        mirrored(c, |c| REC2020_ALPHA * c.powf(0.45) - (REC2020_ALPHA - 1.))
    } else {
        4.5 * c
    }
}

/// Normalize a hue angle to `[0, 360)`
#[must_use]
pub fn normalize_hue(hue: f64) -> f64 {
    let normalized = hue.rem_euclid(360.);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360. {
        0.
    } else {
        normalized
    }
}

/// <https://drafts.csswg.org/css-color-4/#hsl-to-rgb>
#[must_use]
pub fn hsl_to_srgb([hue, saturation, lightness]: [f64; 3]) -> [f64; 3] {
    let hue = normalize_hue(hue);
    let saturation = saturation / 100.;
    let lightness = lightness / 100.;

    let f = |n: f64| {
        let k = (n + hue / 30.) % 12.;
        let a = saturation * lightness.min(1. - lightness);
        lightness - a * (k - 3.).min(9. - k).min(1.).max(-1.)
    };

    [f(0.), f(8.), f(4.)]
}

/// Hue, chroma, minimum and maximum of an sRGB color
fn hue_of_srgb([red, green, blue]: [f64; 3]) -> (f64, f64, f64) {
    let max = red.max(green).max(blue);
    let min = red.min(green).min(blue);
    let delta = max - min;

    let hue = if delta == 0. {
        0.
    } else if max == red {
        (green - blue) / delta + if green < blue { 6. } else { 0. }
    } else if max == green {
        (blue - red) / delta + 2.
    } else {
        (red - green) / delta + 4.
    };

    (hue * 60., min, max)
}

/// <https://drafts.csswg.org/css-color-4/#rgb-to-hsl>
#[must_use]
pub fn srgb_to_hsl(rgb: [f64; 3]) -> [f64; 3] {
    let (mut hue, min, max) = hue_of_srgb(rgb);
    let lightness = (min + max) / 2.;

    let mut saturation = if max == min || lightness == 0. || lightness == 1. {
        0.
    } else {
        (max - lightness) / lightness.min(1. - lightness)
    };

    // Out-of-gamut input can produce a negative saturation
    if saturation < 0. {
        hue += 180.;
        saturation = saturation.abs();
    }

    [normalize_hue(hue), saturation * 100., lightness * 100.]
}

/// <https://drafts.csswg.org/css-color-4/#hwb-to-rgb>
#[must_use]
pub fn hwb_to_srgb([hue, whiteness, blackness]: [f64; 3]) -> [f64; 3] {
    let whiteness = whiteness / 100.;
    let blackness = blackness / 100.;

    if whiteness + blackness >= 1. {
        let gray = whiteness / (whiteness + blackness);
        return [gray; 3];
    }

    map(hsl_to_srgb([hue, 100., 50.]), |c| {
        c * (1. - whiteness - blackness) + whiteness
    })
}

/// <https://drafts.csswg.org/css-color-4/#rgb-to-hwb>
#[must_use]
pub fn srgb_to_hwb(rgb: [f64; 3]) -> [f64; 3] {
    let (hue, min, max) = hue_of_srgb(rgb);
    [normalize_hue(hue), min * 100., (1. - max) * 100.]
}

#[must_use]
pub fn xyz_d50_to_lab(xyz: [f64; 3]) -> [f64; 3] {
    let f = |i: usize| {
        let value = xyz[i] / D50_WHITE[i];
        if value > LAB_EPSILON {
            value.cbrt()
        } else {
            (LAB_KAPPA * value + 16.) / 116.
        }
    };
    let (f0, f1, f2) = (f(0), f(1), f(2));

    [116. * f1 - 16., 500. * (f0 - f1), 200. * (f1 - f2)]
}

#[must_use]
pub fn lab_to_xyz_d50([lightness, a, b]: [f64; 3]) -> [f64; 3] {
    let f1 = (lightness + 16.) / 116.;
    let f0 = a / 500. + f1;
    let f2 = f1 - b / 200.;

    let x = if f0.powi(3) > LAB_EPSILON {
        f0.powi(3)
    } else {
        (116. * f0 - 16.) / LAB_KAPPA
    };
    let y = if lightness > LAB_KAPPA * LAB_EPSILON {
        f1.powi(3)
    } else {
        lightness / LAB_KAPPA
    };
    let z = if f2.powi(3) > LAB_EPSILON {
        f2.powi(3)
    } else {
        (116. * f2 - 16.) / LAB_KAPPA
    };

    [x * D50_WHITE[0], y * D50_WHITE[1], z * D50_WHITE[2]]
}

/// Rectangular to polar form, shared by Lab/LCh and OKLab/OKLCh
#[must_use]
pub fn rectangular_to_polar([lightness, a, b]: [f64; 3]) -> [f64; 3] {
    let chroma = a.hypot(b);
    let hue = normalize_hue(b.atan2(a).to_degrees());
    [lightness, chroma, hue]
}

#[must_use]
pub fn polar_to_rectangular([lightness, chroma, hue]: [f64; 3]) -> [f64; 3] {
    let radians = hue.to_radians();
    [lightness, chroma * radians.cos(), chroma * radians.sin()]
}

#[must_use]
pub fn xyz_d65_to_oklab(xyz: [f64; 3]) -> [f64; 3] {
    LMS_TO_OKLAB.transform(map(XYZ_TO_LMS.transform(xyz), f64::cbrt))
}

#[must_use]
pub fn oklab_to_xyz_d65(oklab: [f64; 3]) -> [f64; 3] {
    LMS_TO_XYZ.transform(map(OKLAB_TO_LMS.transform(oklab), |c| c.powi(3)))
}

#[must_use]
pub fn xyz_d65_to_d50(xyz: [f64; 3]) -> [f64; 3] {
    D65_TO_D50.transform(xyz)
}

#[must_use]
pub fn xyz_d50_to_d65(xyz: [f64; 3]) -> [f64; 3] {
    D50_TO_D65.transform(xyz)
}

/// Convert a member of the sRGB family (legacy rgb, srgb, hsl and hwb) to srgb
fn to_srgb(space: ColorSpace, values: [f64; 3]) -> Option<[f64; 3]> {
    let srgb = match space {
        ColorSpace::Rgb => map(values, |c| c / 255.),
        ColorSpace::Srgb => values,
        ColorSpace::Hsl => hsl_to_srgb(values),
        ColorSpace::Hwb => hwb_to_srgb(values),
        _ => return None,
    };
    Some(srgb)
}

fn from_srgb(space: ColorSpace, srgb: [f64; 3]) -> Option<[f64; 3]> {
    let values = match space {
        ColorSpace::Rgb => map(srgb, |c| c * 255.),
        ColorSpace::Srgb => srgb,
        ColorSpace::Hsl => srgb_to_hsl(srgb),
        ColorSpace::Hwb => srgb_to_hwb(srgb),
        _ => return None,
    };
    Some(values)
}

/// Convert any color to XYZ relative to D65
#[must_use]
pub fn to_xyz_d65(space: ColorSpace, values: [f64; 3]) -> [f64; 3] {
    match space {
        ColorSpace::Rgb | ColorSpace::Srgb | ColorSpace::Hsl | ColorSpace::Hwb => {
            let srgb = to_srgb(space, values).unwrap_or(values);
            LINEAR_SRGB_TO_XYZ.transform(map(srgb, srgb_to_linear))
        },
        ColorSpace::SrgbLinear => LINEAR_SRGB_TO_XYZ.transform(values),
        ColorSpace::DisplayP3 => LINEAR_P3_TO_XYZ.transform(map(values, srgb_to_linear)),
        ColorSpace::A98Rgb => LINEAR_A98_TO_XYZ.transform(map(values, a98_to_linear)),
        ColorSpace::Rec2020 => LINEAR_REC2020_TO_XYZ.transform(map(values, rec2020_to_linear)),
        ColorSpace::ProphotoRgb => xyz_d50_to_d65(
            LINEAR_PROPHOTO_TO_XYZ_D50.transform(map(values, prophoto_to_linear)),
        ),
        ColorSpace::XyzD65 => values,
        ColorSpace::XyzD50 => xyz_d50_to_d65(values),
        ColorSpace::Lab => xyz_d50_to_d65(lab_to_xyz_d50(values)),
        ColorSpace::Lch => xyz_d50_to_d65(lab_to_xyz_d50(polar_to_rectangular(values))),
        ColorSpace::Oklab => oklab_to_xyz_d65(values),
        ColorSpace::Oklch => oklab_to_xyz_d65(polar_to_rectangular(values)),
    }
}

/// Convert XYZ relative to D65 to any color space
#[must_use]
pub fn from_xyz_d65(space: ColorSpace, xyz: [f64; 3]) -> [f64; 3] {
    match space {
        ColorSpace::Rgb | ColorSpace::Srgb | ColorSpace::Hsl | ColorSpace::Hwb => {
            let srgb = map(XYZ_TO_LINEAR_SRGB.transform(xyz), linear_to_srgb);
            from_srgb(space, srgb).unwrap_or(srgb)
        },
        ColorSpace::SrgbLinear => XYZ_TO_LINEAR_SRGB.transform(xyz),
        ColorSpace::DisplayP3 => map(XYZ_TO_LINEAR_P3.transform(xyz), linear_to_srgb),
        ColorSpace::A98Rgb => map(XYZ_TO_LINEAR_A98.transform(xyz), linear_to_a98),
        ColorSpace::Rec2020 => map(XYZ_TO_LINEAR_REC2020.transform(xyz), linear_to_rec2020),
        ColorSpace::ProphotoRgb => map(
            XYZ_D50_TO_LINEAR_PROPHOTO.transform(xyz_d65_to_d50(xyz)),
            linear_to_prophoto,
        ),
        ColorSpace::XyzD65 => xyz,
        ColorSpace::XyzD50 => xyz_d65_to_d50(xyz),
        ColorSpace::Lab => xyz_d50_to_lab(xyz_d65_to_d50(xyz)),
        ColorSpace::Lch => rectangular_to_polar(xyz_d50_to_lab(xyz_d65_to_d50(xyz))),
        ColorSpace::Oklab => xyz_d65_to_oklab(xyz),
        ColorSpace::Oklch => rectangular_to_polar(xyz_d65_to_oklab(xyz)),
    }
}

/// Convert channel values from one color space to another
#[must_use]
pub fn convert(from: ColorSpace, to: ColorSpace, values: [f64; 3]) -> [f64; 3] {
    use ColorSpace::*;

    if from == to {
        return values;
    }

    match (from, to) {
        (Rgb | Srgb | Hsl | Hwb, Rgb | Srgb | Hsl | Hwb) => {
            let srgb = to_srgb(from, values).unwrap_or(values);
            from_srgb(to, srgb).unwrap_or(srgb)
        },
        (Lab, Lch) | (Oklab, Oklch) => rectangular_to_polar(values),
        (Lch, Lab) | (Oklch, Oklab) => polar_to_rectangular(values),
        (Lab | Lch, XyzD50) => {
            let lab = if from == Lch {
                polar_to_rectangular(values)
            } else {
                values
            };
            lab_to_xyz_d50(lab)
        },
        (XyzD50, Lab) => xyz_d50_to_lab(values),
        (XyzD50, Lch) => rectangular_to_polar(xyz_d50_to_lab(values)),
        _ => from_xyz_d65(to, to_xyz_d65(from, values)),
    }
}

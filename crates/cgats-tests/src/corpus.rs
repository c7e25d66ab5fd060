//! Synthetic chart generation
//!
//! Provides deterministic and seeded-random CGATS inputs for round-trip
//! and conformance evaluation.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Chart shapes used across the test suite
#[derive(Debug, Clone, Copy)]
pub enum ChartShape {
    /// Neutral ramp from black to white
    GrayRamp,
    /// Corners of the RGB cube (8 patches)
    RgbCube,
    /// Random device values and plausible XYZ, with seed
    Random(u64),
    /// Patches with alphanumeric sample identifiers (A1, A2, ...)
    OpaqueIds,
    /// Measurements with negative Lab channels
    NegativeLab,
}

/// Render a chart of the given shape as CGATS text
pub fn generate_chart(shape: ChartShape, sets: usize) -> String {
    match shape {
        ChartShape::GrayRamp => gray_ramp(sets),
        ChartShape::RgbCube => rgb_cube(),
        ChartShape::Random(seed) => random_chart(seed, sets),
        ChartShape::OpaqueIds => opaque_ids(sets),
        ChartShape::NegativeLab => negative_lab(sets),
    }
}

/// Every shape in the corpus, with a reasonable row count
pub fn all_shapes() -> Vec<(ChartShape, usize)> {
    vec![
        (ChartShape::GrayRamp, 16),
        (ChartShape::RgbCube, 8),
        (ChartShape::Random(7), 64),
        (ChartShape::Random(1234), 256),
        (ChartShape::OpaqueIds, 12),
        (ChartShape::NegativeLab, 24),
    ]
}

fn header(descriptor: &str, columns: &str) -> String {
    format!(
        "CTI3\nDESCRIPTOR \"{descriptor}\"\nORIGINATOR \"cgats-tests\"\n\
         BEGIN_DATA_FORMAT\n{columns}\nEND_DATA_FORMAT\nBEGIN_DATA\n"
    )
}

fn gray_ramp(sets: usize) -> String {
    let mut out = header("gray ramp", "SAMPLE_ID RGB_R RGB_G RGB_B XYZ_Y");
    for i in 0..sets {
        let t = if sets > 1 {
            i as f64 / (sets - 1) as f64
        } else {
            0.0
        };
        out.push_str(&format!(
            "{} {:.4} {:.4} {:.4} {:.4}\n",
            i + 1,
            t * 100.0,
            t * 100.0,
            t * 100.0,
            t * 100.0,
        ));
    }
    out.push_str("END_DATA\n");
    out
}

fn rgb_cube() -> String {
    let mut out = header("rgb cube corners", "SAMPLE_ID RGB_R RGB_G RGB_B");
    let mut id = 1;
    for r in [0.0, 100.0] {
        for g in [0.0, 100.0] {
            for b in [0.0, 100.0] {
                out.push_str(&format!("{id} {r:.1} {g:.1} {b:.1}\n"));
                id += 1;
            }
        }
    }
    out.push_str("END_DATA\n");
    out
}

fn random_chart(seed: u64, sets: usize) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = header(
        "random patches",
        "SAMPLE_ID RGB_R RGB_G RGB_B XYZ_X XYZ_Y XYZ_Z",
    );
    for i in 0..sets {
        let r: f64 = rng.gen_range(0.0..100.0);
        let g: f64 = rng.gen_range(0.0..100.0);
        let b: f64 = rng.gen_range(0.0..100.0);
        let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        out.push_str(&format!(
            "{} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4}\n",
            i + 1,
            r,
            g,
            b,
            y * 0.95047,
            y,
            y * 1.08883,
        ));
    }
    out.push_str("END_DATA\n");
    out
}

fn opaque_ids(sets: usize) -> String {
    let mut out = header("alphanumeric ids", "SAMPLE_ID RGB_R RGB_G RGB_B");
    for i in 0..sets {
        let row = (b'A' + (i / 6) as u8) as char;
        let v = (i % 6) as f64 * 20.0;
        out.push_str(&format!("{}{} {:.1} {:.1} {:.1}\n", row, i % 6 + 1, v, v, v));
    }
    out.push_str("END_DATA\n");
    out
}

fn negative_lab(sets: usize) -> String {
    let mut out = header("negative lab channels", "SAMPLE_ID LAB_L LAB_A LAB_B");
    for i in 0..sets {
        let t = i as f64 / sets.max(1) as f64;
        out.push_str(&format!(
            "{} {:.2} {:.2} {:.2}\n",
            i + 1,
            t * 100.0,
            t * 60.0 - 30.0,
            30.0 - t * 60.0,
        ));
    }
    out.push_str("END_DATA\n");
    out
}

/// A calibration-style document with a `Date:` line and keyword
pub fn cal_chart() -> String {
    "Date: Fri Aug 07 2026\n\
     CAL\n\
     DESCRIPTOR \"Device calibration curves\"\n\
     KEYWORD \"DEVICE_CLASS\"\n\
     DEVICE_CLASS \"DISPLAY\"\n\
     BEGIN_DATA_FORMAT\n\
     RGB_I RGB_R RGB_G RGB_B\n\
     END_DATA_FORMAT\n\
     BEGIN_DATA\n\
     0.0 0.0 0.0 0.0\n\
     0.5 0.4310 0.4423 0.4501\n\
     1.0 1.0 1.0 1.0\n\
     END_DATA\n"
        .to_string()
}

/// Several charts concatenated in one input
pub fn multi_chart(count: usize) -> String {
    let mut out = String::new();
    for _ in 0..count {
        out.push_str(&cal_chart());
    }
    out
}

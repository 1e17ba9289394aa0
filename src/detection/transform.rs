use super::raster::Raster;

/// Cubic convolution constant (Keys kernel with a = -0.75)
const CUBIC_A: f64 = -0.75;

fn cubic_weights(t: f64) -> [f64; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let w2 = ((a + 2.0) * (1.0 - t) - (a + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

/// Bicubic sample at a fractional position; taps outside the raster repeat
/// the nearest edge pixel.
fn sample_bicubic(src: &Raster, x: f64, y: f64, c: usize) -> u8 {
    let (x0, y0) = (x.floor(), y.floor());
    let wx = cubic_weights(x - x0);
    let wy = cubic_weights(y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = 0.0;
    for (j, wyj) in wy.iter().enumerate() {
        let sy = y0 - 1 + j as i64;
        let mut row = 0.0;
        for (i, wxi) in wx.iter().enumerate() {
            row += wxi * src.get_replicate(x0 - 1 + i as i64, sy, c) as f64;
        }
        acc += wyj * row;
    }

    acc.round().clamp(0.0, 255.0) as u8
}

/// Rotate the whole raster about `(width / 2, height / 2)` (integer halves).
///
/// `degrees` turns counter-clockwise on screen. The output keeps the input
/// size; corners uncovered by the rotation replicate the border instead of
/// being filled with a constant.
pub fn rotate_about_center(src: &Raster, degrees: f32) -> Raster {
    let (width, height) = (src.width(), src.height());
    let mut out = src.blank_like(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let cx = (width / 2) as f64;
    let cy = (height / 2) as f64;
    let theta = (degrees as f64).to_radians();
    let (sin, cos) = theta.sin_cos();

    // Inverse map: for every output pixel find where it came from
    for y in 0..height {
        let dy = y as f64 - cy;
        for x in 0..width {
            let dx = x as f64 - cx;
            let sx = cos * dx - sin * dy + cx;
            let sy = sin * dx + cos * dy + cy;
            for c in 0..src.channels() {
                out.set(x, y, c, sample_bicubic(src, sx, sy, c));
            }
        }
    }

    out
}

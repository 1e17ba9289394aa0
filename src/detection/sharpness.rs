use super::raster::Raster;

/// Unsharp kernel applied to blurry crops
pub const SHARPEN_KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

/// Variance of the 3x3 Laplacian (`[0,1,0; 1,-4,1; 0,1,0]`) over every
/// pixel and channel. Low values mean a blurry image.
pub fn laplacian_variance(src: &Raster) -> f64 {
    let (width, height) = (src.width() as i64, src.height() as i64);
    let count = (width * height) as usize * src.channels();
    if count == 0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..height {
        for x in 0..width {
            for c in 0..src.channels() {
                let center = src.get_reflect101(x, y, c) as f64;
                let laplacian = src.get_reflect101(x, y - 1, c) as f64
                    + src.get_reflect101(x, y + 1, c) as f64
                    + src.get_reflect101(x - 1, y, c) as f64
                    + src.get_reflect101(x + 1, y, c) as f64
                    - 4.0 * center;
                sum += laplacian;
                sum_sq += laplacian * laplacian;
            }
        }
    }

    let mean = sum / count as f64;
    (sum_sq / count as f64 - mean * mean).max(0.0)
}

/// Convolve every channel with [`SHARPEN_KERNEL`], saturating to `u8`
pub fn sharpen(src: &Raster) -> Raster {
    let mut out = src.blank_like(src.width(), src.height());

    for y in 0..src.height() {
        for x in 0..src.width() {
            for c in 0..src.channels() {
                let mut acc = 0i32;
                for (ky, row) in SHARPEN_KERNEL.iter().enumerate() {
                    for (kx, weight) in row.iter().enumerate() {
                        if *weight == 0 {
                            continue;
                        }
                        let sx = x as i64 + kx as i64 - 1;
                        let sy = y as i64 + ky as i64 - 1;
                        acc += weight * src.get_reflect101(sx, sy, c) as i32;
                    }
                }
                out.set(x, y, c, acc.clamp(0, 255) as u8);
            }
        }
    }

    out
}

use image::{DynamicImage, ImageBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Luma,
    LumaA,
    Rgb,
    Rgba,
}

impl Layout {
    fn channels(self) -> usize {
        match self {
            Layout::Luma => 1,
            Layout::LumaA => 2,
            Layout::Rgb => 3,
            Layout::Rgba => 4,
        }
    }

    fn blank_image(self, width: u32, height: u32) -> DynamicImage {
        match self {
            Layout::Luma => DynamicImage::new_luma8(width, height),
            Layout::LumaA => DynamicImage::new_luma_a8(width, height),
            Layout::Rgb => DynamicImage::new_rgb8(width, height),
            Layout::Rgba => DynamicImage::new_rgba8(width, height),
        }
    }
}

/// Interleaved 8-bit pixel buffer with the channel layout of its source image.
///
/// Wider sample types are narrowed to 8 bits on the way in; the colour and
/// alpha layout is kept so results go back out in the caller's format.
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    layout: Layout,
    data: Vec<u8>,
}

impl Raster {
    pub fn from_image(image: &DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let (layout, data) = match image {
            DynamicImage::ImageLuma8(buf) => (Layout::Luma, buf.as_raw().clone()),
            DynamicImage::ImageLumaA8(buf) => (Layout::LumaA, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => (Layout::Rgb, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => (Layout::Rgba, buf.as_raw().clone()),
            other => {
                let color = other.color();
                match (color.has_color(), color.has_alpha()) {
                    (false, false) => (Layout::Luma, other.to_luma8().into_raw()),
                    (false, true) => (Layout::LumaA, other.to_luma_alpha8().into_raw()),
                    (true, false) => (Layout::Rgb, other.to_rgb8().into_raw()),
                    (true, true) => (Layout::Rgba, other.to_rgba8().into_raw()),
                }
            }
        };

        Self { width, height, layout, data }
    }

    pub fn into_image(self) -> DynamicImage {
        let Raster { width, height, layout, data } = self;
        // The buffer length is fixed by construction, so from_raw only fails
        // on an internal bug; an empty image of the right shape is returned then.
        let image = match layout {
            Layout::Luma => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
            Layout::LumaA => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLumaA8),
            Layout::Rgb => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
            Layout::Rgba => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
        };
        image.unwrap_or_else(|| layout.blank_image(width, height))
    }

    /// Blank raster with this raster's layout
    pub fn blank_like(&self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layout: self.layout,
            data: vec![0; width as usize * height as usize * self.layout.channels()],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: u32, y: u32, c: usize) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels() + c
    }

    pub fn get(&self, x: u32, y: u32, c: usize) -> u8 {
        self.data[self.offset(x, y, c)]
    }

    pub fn set(&mut self, x: u32, y: u32, c: usize, value: u8) {
        let offset = self.offset(x, y, c);
        self.data[offset] = value;
    }

    /// Sample with out-of-range coordinates replicating the nearest edge pixel
    pub fn get_replicate(&self, x: i64, y: i64, c: usize) -> u8 {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.get(x, y, c)
    }

    /// Sample with out-of-range coordinates mirrored about the edge pixel
    /// (`dcb|abcd|cba`)
    pub fn get_reflect101(&self, x: i64, y: i64, c: usize) -> u8 {
        let x = reflect101(x, self.width as i64) as u32;
        let y = reflect101(y, self.height as i64) as u32;
        self.get(x, y, c)
    }
}

fn reflect101(mut i: i64, n: i64) -> i64 {
    if n <= 1 {
        return 0;
    }
    while i < 0 || i >= n {
        i = if i < 0 { -i } else { 2 * (n - 1) - i };
    }
    i
}

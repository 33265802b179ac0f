//! Pass geometry for progressive (Adam7) and sequential images.

/// One Adam7 pass: origin and step in each direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Pass {
    pub index: u8,
    pub x0: u32,
    pub y0: u32,
    pub dx: u32,
    pub dy: u32,
}

const ADAM7: [Pass; 7] = [
    Pass { index: 1, x0: 0, y0: 0, dx: 8, dy: 8 },
    Pass { index: 2, x0: 4, y0: 0, dx: 8, dy: 8 },
    Pass { index: 3, x0: 0, y0: 4, dx: 4, dy: 8 },
    Pass { index: 4, x0: 2, y0: 0, dx: 4, dy: 4 },
    Pass { index: 5, x0: 0, y0: 2, dx: 2, dy: 4 },
    Pass { index: 6, x0: 1, y0: 0, dx: 2, dy: 2 },
    Pass { index: 7, x0: 0, y0: 1, dx: 1, dy: 2 },
];

const SEQUENTIAL: Pass = Pass {
    index: 1,
    x0: 0,
    y0: 0,
    dx: 1,
    dy: 1,
};

impl Pass {
    /// Pixels this pass stores per row of a `width`-wide image.
    pub fn columns(&self, width: u32) -> u32 {
        if width > self.x0 {
            (width - self.x0).div_ceil(self.dx)
        } else {
            0
        }
    }

    /// Rows this pass stores for a `height`-tall image.
    pub fn rows(&self, height: u32) -> u32 {
        if height > self.y0 {
            (height - self.y0).div_ceil(self.dy)
        } else {
            0
        }
    }

    /// Whether the pass carries no pixels at all; such passes are absent from the stream.
    pub fn is_empty(&self, width: u32, height: u32) -> bool {
        self.columns(width) == 0 || self.rows(height) == 0
    }

    /// Whether image row `y` has pixels in this pass.
    pub fn contains_row(&self, y: u32) -> bool {
        y >= self.y0 && (y - self.y0) % self.dy == 0
    }

    /// Image column of the `j`-th pixel of a pass row.
    pub fn column(&self, j: u32) -> u32 {
        self.x0 + j * self.dx
    }

    /// Spread a packed pass row over `row`, touching only the positions this pass owns.
    pub fn scatter(&self, packed: &[u8], row: &mut [u8], bytes_per_pixel: usize) {
        for (j, px) in packed.chunks_exact(bytes_per_pixel).enumerate() {
            let at = self.column(j as u32) as usize * bytes_per_pixel;
            row[at..at + bytes_per_pixel].copy_from_slice(px);
        }
    }
}

/// The ordered passes an image is decoded in.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PassPlan {
    interlaced: bool,
}

impl PassPlan {
    pub fn new(interlaced: bool) -> Self {
        Self { interlaced }
    }

    pub fn passes(&self) -> &'static [Pass] {
        if self.interlaced {
            &ADAM7
        } else {
            std::slice::from_ref(&SEQUENTIAL)
        }
    }

    pub fn len(&self) -> usize {
        self.passes().len()
    }
}

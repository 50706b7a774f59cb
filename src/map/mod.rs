//! Dense per-pixel label and mask grids.
//!
//! `QuantizedMap` stores one byte of bit-field labels per pixel in row-major
//! order. Each set bit marks one quantized orientation bin, so a pixel can
//! carry several labels at once after spreading. `MaskMap` is the boolean
//! counterpart used to select pixels when a template is created.

use crate::util::{LinemodError, LinemodResult};

/// Owned row-major grid of quantized labels, one byte per pixel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuantizedMap {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl QuantizedMap {
    /// Creates a zero-filled map.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height],
            width,
            height,
        }
    }

    /// Wraps an existing buffer; its length must equal `width * height`.
    pub fn from_vec(data: Vec<u8>, width: usize, height: usize) -> LinemodResult<Self> {
        let needed = width
            .checked_mul(height)
            .ok_or(LinemodError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(LinemodError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Resizes the map, zero-filling any new cells.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.data.resize(width * height, 0);
        self.width = width;
        self.height = height;
    }

    /// Returns the map width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the map height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the backing buffer in row-major order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the backing buffer mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the label at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Sets the label at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Returns row `y` as a slice.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get(start..start + self.width)
    }

    /// Returns a spread copy of this map using the fastest available kernel.
    ///
    /// See [`crate::kernel`] for the window semantics.
    pub fn spread(&self, spreading_size: usize) -> LinemodResult<QuantizedMap> {
        let mut output = QuantizedMap::default();
        spread_quantized_map(self, &mut output, spreading_size)?;
        Ok(output)
    }
}

/// Spreads `input` into `output`, resizing `output` to the input dimensions.
pub fn spread_quantized_map(
    input: &QuantizedMap,
    output: &mut QuantizedMap,
    spreading_size: usize,
) -> LinemodResult<()> {
    use crate::kernel::SpreadKernel;

    #[cfg(not(feature = "simd"))]
    use crate::kernel::scalar::SpreadScalar as Spread;
    #[cfg(feature = "simd")]
    use crate::kernel::simd::SpreadSimd as Spread;

    <Spread as SpreadKernel>::spread(input, output, spreading_size)
}

/// Owned boolean grid selecting pixels for template creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaskMap {
    data: Vec<bool>,
    width: usize,
    height: usize,
}

impl MaskMap {
    /// Creates an all-unset mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![false; width * height],
            width,
            height,
        }
    }

    /// Creates a mask with every pixel set.
    pub fn filled(width: usize, height: usize) -> Self {
        Self {
            data: vec![true; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns whether `(x, y)` is set; out-of-bounds pixels are unset.
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = true;
        }
    }

    pub fn unset(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = false;
        }
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

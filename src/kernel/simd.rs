//! SIMD-accelerated spreading using the `wide` crate.
//!
//! Both passes OR 16 adjacent columns per instruction with `u8x16`. Columns
//! that do not fill a whole register fall back to the scalar row helpers, so
//! results are identical to [`SpreadScalar`](crate::kernel::scalar::SpreadScalar).

use crate::kernel::scalar::{spread_row_horizontal, spread_row_vertical};
use crate::kernel::{prepare_output, SpreadKernel};
use crate::map::QuantizedMap;
use crate::util::LinemodResult;
use wide::u8x16;

const LANES: usize = 16;

/// Load 16 bytes into a register.
#[inline]
fn load_u8x16(slice: &[u8]) -> u8x16 {
    let mut lanes = [0u8; LANES];
    lanes.copy_from_slice(&slice[..LANES]);
    u8x16::new(lanes)
}

#[inline]
fn store_u8x16(slice: &mut [u8], value: u8x16) {
    slice[..LANES].copy_from_slice(&value.to_array());
}

/// SIMD separable OR spreading.
pub struct SpreadSimd;

impl SpreadSimd {
    fn horizontal_row(src: &[u8], dst: &mut [u8], spreading_size: usize) {
        let half = spreading_size / 2;
        let starts = src.len() + 1 - spreading_size;

        let mut x = 0;
        while x + LANES <= starts {
            let mut acc = u8x16::new([0; LANES]);
            for dx in 0..spreading_size {
                acc = acc | load_u8x16(&src[x + dx..]);
            }
            store_u8x16(&mut dst[x + half..], acc);
            x += LANES;
        }

        // Scalar remainder
        spread_row_horizontal(src, dst, spreading_size, x);
    }

    fn vertical_row(
        scratch: &[u8],
        width: usize,
        top: usize,
        spreading_size: usize,
        dst: &mut [u8],
    ) {
        let mut x = 0;
        while x + LANES <= width {
            let mut acc = u8x16::new([0; LANES]);
            for dy in 0..spreading_size {
                acc = acc | load_u8x16(&scratch[(top + dy) * width + x..]);
            }
            store_u8x16(&mut dst[x..], acc);
            x += LANES;
        }

        // Scalar remainder
        spread_row_vertical(scratch, width, top, spreading_size, dst, x);
    }
}

impl SpreadKernel for SpreadSimd {
    fn spread(
        input: &QuantizedMap,
        output: &mut QuantizedMap,
        spreading_size: usize,
    ) -> LinemodResult<()> {
        if !prepare_output(input, output, spreading_size)? {
            return Ok(());
        }

        let width = input.width();
        let height = input.height();
        let half = spreading_size / 2;

        let mut scratch = vec![0u8; width * height];
        for (src, dst) in input
            .data()
            .chunks_exact(width)
            .zip(scratch.chunks_exact_mut(width))
        {
            Self::horizontal_row(src, dst, spreading_size);
        }

        let rows = height + 1 - spreading_size;
        let out = output.data_mut();
        for top in 0..rows {
            let start = (top + half) * width;
            Self::vertical_row(
                &scratch,
                width,
                top,
                spreading_size,
                &mut out[start..start + width],
            );
        }

        Ok(())
    }
}

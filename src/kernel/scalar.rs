//! Scalar reference spreading kernel.

use crate::kernel::{prepare_output, SpreadKernel};
use crate::map::QuantizedMap;
use crate::util::LinemodResult;

/// Scalar separable OR spreading.
pub struct SpreadScalar;

/// Horizontal pass for one row, starting at window position `x0`.
///
/// Writes `dst[x + half] = src[x] | ... | src[x + s - 1]` for every window
/// start `x >= x0` that fits in the row.
pub(crate) fn spread_row_horizontal(src: &[u8], dst: &mut [u8], spreading_size: usize, x0: usize) {
    let half = spreading_size / 2;
    let starts = src.len() + 1 - spreading_size;
    for x in x0..starts {
        let mut value = 0u8;
        for &label in &src[x..x + spreading_size] {
            value |= label;
        }
        dst[x + half] = value;
    }
}

/// Vertical pass producing one output row from `spreading_size` scratch rows
/// starting at `top`, beginning at column `x0`.
pub(crate) fn spread_row_vertical(
    scratch: &[u8],
    width: usize,
    top: usize,
    spreading_size: usize,
    dst: &mut [u8],
    x0: usize,
) {
    for (x, out) in dst.iter_mut().enumerate().skip(x0) {
        let mut value = 0u8;
        for dy in 0..spreading_size {
            value |= scratch[(top + dy) * width + x];
        }
        *out = value;
    }
}

impl SpreadKernel for SpreadScalar {
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
            spread_row_horizontal(src, dst, spreading_size, 0);
        }

        let rows = height + 1 - spreading_size;
        let out = output.data_mut();
        for top in 0..rows {
            let start = (top + half) * width;
            let dst = &mut out[start..start + width];
            spread_row_vertical(&scratch, width, top, spreading_size, dst, 0);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::spread_row_horizontal;

    #[test]
    fn horizontal_pass_centers_window() {
        let src = [1u8, 2, 4, 8, 16];
        let mut dst = [0u8; 5];
        spread_row_horizontal(&src, &mut dst, 3, 0);
        assert_eq!(dst, [0, 7, 14, 28, 0]);
    }

    #[test]
    fn horizontal_pass_even_window() {
        let src = [1u8, 2, 4, 8];
        let mut dst = [0u8; 4];
        spread_row_horizontal(&src, &mut dst, 2, 0);
        assert_eq!(dst, [0, 3, 6, 12]);
    }
}

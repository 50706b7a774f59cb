//! Rayon-parallel spreading (feature-gated).
//!
//! Both separable passes are split by row: every horizontal row and every
//! vertical output row is independent, so rows are distributed across the
//! pool with no synchronization beyond the join between the passes.

use crate::kernel::prepare_output;
use crate::kernel::scalar::{spread_row_horizontal, spread_row_vertical};
use crate::map::QuantizedMap;
use crate::util::LinemodResult;
use rayon::prelude::*;

/// Row-parallel spreading; results equal the scalar kernel.
pub fn spread_par(
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
    scratch
        .par_chunks_mut(width)
        .zip(input.data().par_chunks(width))
        .for_each(|(dst, src)| spread_row_horizontal(src, dst, spreading_size, 0));

    let rows = height + 1 - spreading_size;
    let scratch = &scratch;
    output.data_mut()[half * width..]
        .par_chunks_mut(width)
        .take(rows)
        .enumerate()
        .for_each(|(top, dst)| spread_row_vertical(scratch, width, top, spreading_size, dst, 0));

    Ok(())
}

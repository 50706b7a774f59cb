//! Spreading kernels for quantized label maps.
//!
//! Spreading dilates every set label bit over an `s x s` window so that small
//! misalignments between a template and the scene do not break matching. For
//! a window of size `s` with `half = s / 2`, the output cell `(x + half,
//! y + half)` receives the OR of the input window whose top-left corner is
//! `(x, y)`, for every window that lies fully inside the input. Cells no such
//! window reaches (a `half`-wide band at the top and left, `s - 1 - half` at
//! the bottom and right) are left at zero.
//!
//! The operator is separable: a horizontal OR pass into a scratch grid, then a
//! vertical OR pass over the scratch grid. `scalar` is the reference, `simd`
//! processes 16 columns per instruction, and `rayon` splits both passes by row.

use crate::map::QuantizedMap;
use crate::util::{LinemodError, LinemodResult};

/// Kernel trait for spreading implementations.
pub trait SpreadKernel {
    /// Spreads `input` into `output`, resizing `output` to match `input`.
    fn spread(
        input: &QuantizedMap,
        output: &mut QuantizedMap,
        spreading_size: usize,
    ) -> LinemodResult<()>;
}

/// Validates the window and clears `output`.
///
/// Returns `false` when no window fits inside the input, in which case the
/// cleared output is already the final result.
pub(crate) fn prepare_output(
    input: &QuantizedMap,
    output: &mut QuantizedMap,
    spreading_size: usize,
) -> LinemodResult<bool> {
    if spreading_size == 0 {
        return Err(LinemodError::InvalidInput("spreading size must be positive"));
    }
    output.resize(input.width(), input.height());
    output.data_mut().fill(0);
    Ok(spreading_size <= input.width() && spreading_size <= input.height())
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

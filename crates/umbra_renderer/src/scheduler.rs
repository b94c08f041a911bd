//! Row scheduling for parallel rendering.
//!
//! One image row is one unit of work. Rows are rendered into private
//! buffers by a fixed-size rayon pool and collected by row index, so the
//! assembled image never depends on completion order.

use crate::error::RenderResult;
use crate::progress::Progress;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use umbra_math::Color;

/// Generator for one row, derived from the render seed and the row index.
///
/// Each row draws from its own stream, so output is identical for any
/// thread count.
pub fn row_rng(seed: u64, row: u32) -> StdRng {
    StdRng::seed_from_u64(seed ^ (row as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Render `height` rows with at most `threads` workers.
///
/// `render_row` is called once per row index. Progress advances once per
/// finished row and once more after all rows are collected. With
/// `threads <= 1` rows run serially on the calling thread.
pub fn render_rows<F>(
    height: u32,
    threads: usize,
    progress: &dyn Progress,
    render_row: F,
) -> RenderResult<Vec<Vec<Color>>>
where
    F: Fn(u32) -> Vec<Color> + Sync,
{
    let run_row = |j: u32| {
        let row = render_row(j);
        progress.advance(1);
        row
    };

    let rows: Vec<Vec<Color>> = if threads <= 1 {
        log::debug!("Rendering {} rows serially", height);
        (0..height).map(run_row).collect()
    } else {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("umbra-row-{i}"))
            .build()?;
        log::debug!("Rendering {} rows on {} workers", height, pool.current_num_threads());

        // Indexed parallel collect keeps row order
        pool.install(|| (0..height).into_par_iter().map(run_row).collect())
    };

    progress.advance(1);
    Ok(rows)
}

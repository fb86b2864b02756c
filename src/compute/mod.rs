//! Compute dispatch utilities
//!
//! Workgroup arithmetic and mask readback helpers.

use crate::context::WgpuContext;
use crate::core::{ReadbackBuffer, StorageTexture2D};

/// Number of workgroups needed to cover `size` items with groups of
/// `workgroup_size` (rounding up).
pub fn compute_workgroup_count(size: u32, workgroup_size: u32) -> u32 {
    size.div_ceil(workgroup_size)
}

/// Read a resolved shadow mask back to the CPU.
///
/// Copies the storage texture into a staging buffer, waits for the
/// copy, and returns the texels as `[occlusion, depth]` pairs in row
/// order. Intended for capture and debugging, not the per-frame path:
/// it stalls the queue.
pub fn read_back_texture(
    ctx: &WgpuContext,
    texture: &StorageTexture2D,
) -> anyhow::Result<Vec<[f32; 2]>> {
    let (width, height) = texture.size();
    let readback = ReadbackBuffer::new(ctx, width, height, 8, Some("mask readback"));

    let mut encoder = ctx.create_encoder(Some("mask readback encoder"));
    readback.copy_from_texture(&mut encoder, texture.texture());
    ctx.submit_and_poll([encoder.finish()]);

    let bytes = readback.read(ctx)?;
    let texels = bytes
        .chunks_exact(8)
        .map(|chunk| {
            [
                f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
                f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
            ]
        })
        .collect();

    Ok(texels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_count_rounds_up() {
        assert_eq!(compute_workgroup_count(64, 8), 8);
        assert_eq!(compute_workgroup_count(65, 8), 9);
        assert_eq!(compute_workgroup_count(1, 8), 1);
        assert_eq!(compute_workgroup_count(0, 8), 0);
    }
}

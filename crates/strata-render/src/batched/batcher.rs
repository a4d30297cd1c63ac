//! Folds a paint context's primitives into draw batches.

use crate::error::RenderResult;
use crate::paint::BatchablePrimitive;

use super::types::{InstructionList, MAX_BATCH_TEXTURES};

/// Rebuild `out` from `primitives`.
///
/// Consecutive primitives merge into one batch while they share a blend mode,
/// their index ranges are contiguous and the batch's texture set has room
/// for their texture. Batch order follows primitive order.
pub fn build_instructions(
    primitives: &[BatchablePrimitive],
    max_textures: usize,
    out: &mut InstructionList,
) -> RenderResult<()> {
    let max_textures = max_textures.clamp(1, MAX_BATCH_TEXTURES);
    out.reset();

    for primitive in primitives {
        if let Some(batch) = out.last_mut() {
            let contiguous = batch.end() == primitive.start as u64;
            let fits = match &primitive.texture {
                Some(texture) => {
                    batch.textures.contains(texture) || batch.textures.len() < max_textures
                }
                None => true,
            };

            if contiguous && fits && batch.blend_mode == primitive.blend_mode {
                batch.size += primitive.size;
                if let Some(texture) = primitive.texture {
                    batch.textures.insert(texture)?;
                }
                continue;
            }
        }

        let batch = out.next_slot();
        batch.start = primitive.start;
        batch.size = primitive.size;
        batch.blend_mode = primitive.blend_mode;
        if let Some(texture) = primitive.texture {
            batch.textures.insert(texture)?;
        }
    }

    Ok(())
}

//! Batch execution against the recording encoders.

use std::sync::Arc;

use strata_render::batched::{GLOBAL_UNIFORM_SLOT, LOCAL_UNIFORM_SLOT, TEXTURE_SLOT};
use strata_render::shader::graphics_bits;
use strata_render::{
    AdaptorOptions, BackendKind, BatchTexture, BatchablePrimitive, BlendMode, GlobalUniformData,
    GraphicsRenderable, LegacyGraphicsAdaptor, ModernGraphicsAdaptor, PaintContextCache,
    PaintContextId, PipeState, RenderError, RendererBackendAdaptor, ShaderProgram,
    UniformBatchConfig, unpack_color_premultiplied,
};
use strata_test_utils::{
    BindingResource, EncoderCall, GpuGeometry, GpuSampler, GpuTexture, MockGlEncoder,
    MockGpuEncoder,
};

const MAX_TEXTURES: usize = 4;

fn textured(start: u32, size: u32, texture: u64) -> BatchablePrimitive {
    BatchablePrimitive {
        start,
        size,
        texture: Some(BatchTexture {
            texture: GpuTexture::new(texture, 8, 8),
            sampler: GpuSampler::new(500),
        }),
        blend_mode: BlendMode::Normal,
    }
}

fn plain(start: u32, size: u32) -> BatchablePrimitive {
    BatchablePrimitive {
        start,
        size,
        texture: None,
        blend_mode: BlendMode::Normal,
    }
}

fn contexts_with(
    id: PaintContextId,
    index_count: u32,
    primitives: Vec<BatchablePrimitive>,
) -> PaintContextCache {
    let mut contexts = PaintContextCache::new(MAX_TEXTURES);
    contexts
        .update(id, GpuGeometry::new(77, index_count), primitives)
        .unwrap();
    contexts
}

fn legacy() -> (Arc<MockGlEncoder>, LegacyGraphicsAdaptor) {
    strata_core::logging::init_for_tests();
    let encoder = Arc::new(MockGlEncoder::new());
    let mut adaptor = LegacyGraphicsAdaptor::new(encoder.clone(), MAX_TEXTURES);
    adaptor.init().unwrap();
    adaptor.begin_frame(&GlobalUniformData::for_view(800.0, 600.0)).unwrap();
    encoder.clear_calls();
    (encoder, adaptor)
}

fn modern() -> (Arc<MockGpuEncoder>, ModernGraphicsAdaptor) {
    strata_core::logging::init_for_tests();
    let encoder = Arc::new(MockGpuEncoder::new());
    let mut adaptor =
        ModernGraphicsAdaptor::new(encoder.clone(), MAX_TEXTURES, UniformBatchConfig::default());
    adaptor.init().unwrap();
    adaptor.begin_frame(&GlobalUniformData::for_view(800.0, 600.0)).unwrap();
    encoder.clear_calls();
    (encoder, adaptor)
}

#[test]
fn test_empty_context_issues_nothing() {
    let id = PaintContextId::new(1);
    let renderable = GraphicsRenderable::new(id);

    let (gl, mut legacy) = legacy();
    let mut contexts = contexts_with(id, 0, Vec::new());
    let stats = legacy
        .execute(&mut PipeState::default(), &renderable, &mut contexts)
        .unwrap();
    assert_eq!(gl.call_count(), 0);
    assert_eq!(stats.draw_calls, 0);
    assert_eq!(stats.empty_skips, 1);

    let (gpu, mut modern) = modern();
    let mut contexts = contexts_with(id, 0, Vec::new());
    let mut pipe = PipeState::default();
    let additive = renderable.clone().with_blend_mode(BlendMode::Add);
    modern.execute(&mut pipe, &additive, &mut contexts).unwrap();
    assert_eq!(gpu.call_count(), 0);
    // The pipe state is not touched either.
    assert_eq!(pipe, PipeState::default());
}

#[test]
fn test_batches_draw_in_order() {
    let id = PaintContextId::new(2);
    let primitives = vec![plain(0, 6), plain(10, 3), plain(20, 12)];
    let expected = vec![(0, 6), (10, 3), (20, 12)];
    let renderable = GraphicsRenderable::new(id);

    let (gl, mut legacy) = legacy();
    let mut contexts = contexts_with(id, 32, primitives.clone());
    let stats = legacy
        .execute(&mut PipeState::default(), &renderable, &mut contexts)
        .unwrap();
    assert_eq!(gl.draws(), expected);
    assert_eq!(stats.draw_calls, 3);

    let (gpu, mut modern) = modern();
    let mut contexts = contexts_with(id, 32, primitives);
    modern
        .execute(&mut PipeState::default(), &renderable, &mut contexts)
        .unwrap();
    assert_eq!(gpu.draws(), expected);
    let single_instance = |call: &EncoderCall| match call {
        EncoderCall::DrawIndexed { instance_count, .. } => *instance_count == 1,
        _ => true,
    };
    assert!(gpu.calls().iter().all(single_instance));
}

#[test]
fn test_binding_group_is_reused_across_executes() {
    let id = PaintContextId::new(3);
    let renderable = GraphicsRenderable::new(id);
    let (_, mut adaptor) = modern();
    let mut contexts = contexts_with(id, 12, vec![textured(0, 6, 1), textured(6, 6, 2)]);
    let mut pipe = PipeState::default();

    adaptor.execute(&mut pipe, &renderable, &mut contexts).unwrap();
    let first = contexts.render_data(id).unwrap().instructions.active()[0]
        .binding_group()
        .cloned()
        .unwrap();

    adaptor.execute(&mut pipe, &renderable, &mut contexts).unwrap();
    let second = contexts.render_data(id).unwrap().instructions.active()[0]
        .binding_group()
        .cloned()
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_destroyed_adaptor_fails_fast() {
    let id = PaintContextId::new(4);
    let mut contexts = contexts_with(id, 6, vec![plain(0, 6)]);

    let (gl, mut legacy) = legacy();
    legacy.destroy().unwrap();
    assert_eq!(
        gl.count_where(|call| matches!(call, EncoderCall::DestroyProgram { .. })),
        1
    );
    gl.clear_calls();

    let renderable = GraphicsRenderable::new(id);
    let result = legacy.execute(&mut PipeState::default(), &renderable, &mut contexts);
    assert!(matches!(result, Err(RenderError::AdaptorDestroyed(_))));
    assert!(matches!(legacy.init(), Err(RenderError::AdaptorDestroyed(_))));
    assert!(legacy.destroy().is_err());
    assert_eq!(gl.call_count(), 0);

    let (gpu, mut modern) = modern();
    modern.destroy().unwrap();
    assert!(matches!(
        modern.begin_frame(&GlobalUniformData::default()),
        Err(RenderError::AdaptorDestroyed(_))
    ));
    assert!(!modern.is_active());
    assert_eq!(
        gpu.count_where(|call| matches!(call, EncoderCall::DestroyBuffer { .. })),
        1
    );
}

#[test]
fn test_uninitialized_adaptor_reports_not_initialized() {
    let mut adaptor = LegacyGraphicsAdaptor::new(Arc::new(MockGlEncoder::new()), MAX_TEXTURES);
    assert!(matches!(
        adaptor.begin_frame(&GlobalUniformData::default()),
        Err(RenderError::NotInitialized(_))
    ));
    // Destroying an adaptor that never started is allowed.
    assert!(adaptor.destroy().is_ok());
}

#[test]
fn test_shared_texture_group_built_once() {
    let id = PaintContextId::new(5);
    let renderable = GraphicsRenderable::new(id);
    // Same texture, non-contiguous ranges: two batches, one texture set.
    let primitives = vec![textured(0, 6, 9), textured(12, 6, 9)];

    let (gpu, mut adaptor) = modern();
    let mut contexts = contexts_with(id, 18, primitives);
    let mut pipe = PipeState::default();

    let first = adaptor.execute(&mut pipe, &renderable, &mut contexts).unwrap();
    assert_eq!(first.texture_groups_created, 1);
    assert_eq!(gpu.count_bind_group_creates_at(TEXTURE_SLOT), 1);
    assert_eq!(gpu.count_bind_group_sets_at(TEXTURE_SLOT), 1);
    assert_eq!(gpu.draws(), vec![(0, 6), (12, 6)]);

    adaptor.end_frame().unwrap();
    adaptor.begin_frame(&GlobalUniformData::for_view(800.0, 600.0)).unwrap();
    gpu.clear_calls();

    let second = adaptor.execute(&mut pipe, &renderable, &mut contexts).unwrap();
    assert_eq!(second.texture_groups_created, 0);
    assert_eq!(gpu.count_bind_group_creates(), 0);
    assert_eq!(gpu.count_draws(), 2);
}

#[test]
fn test_legacy_binds_each_texture_set_once() {
    let id = PaintContextId::new(6);
    let (gl, mut adaptor) = legacy();
    let mut contexts = contexts_with(id, 18, vec![textured(0, 6, 9), textured(12, 6, 9)]);

    adaptor
        .execute(&mut PipeState::default(), &GraphicsRenderable::new(id), &mut contexts)
        .unwrap();
    assert_eq!(gl.count_texture_binds(), 1);
    assert_eq!(gl.count_uniform_uploads_at(GLOBAL_UNIFORM_SLOT), 1);
    assert_eq!(gl.count_uniform_uploads_at(LOCAL_UNIFORM_SLOT), 1);
    assert_eq!(gl.count_draws(), 2);
}

#[test]
fn test_legacy_uploads_premultiplied_color() {
    let id = PaintContextId::new(7);
    let (gl, mut adaptor) = legacy();
    let mut contexts = contexts_with(id, 6, vec![plain(0, 6)]);
    // Blue at half alpha: red in the low byte, alpha in the high byte.
    let renderable = GraphicsRenderable::new(id).with_color(0x80FF_0000);

    adaptor
        .execute(&mut PipeState::default(), &renderable, &mut contexts)
        .unwrap();

    let bytes = gl.last_upload_at(LOCAL_UNIFORM_SLOT).unwrap();
    let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
    let color = &floats[12..16];
    let alpha = 128.0 / 255.0;
    assert_eq!(color[0], 0.0);
    assert_eq!(color[1], 0.0);
    assert!((color[2] - alpha).abs() < 1e-6);
    assert!((color[3] - alpha).abs() < 1e-6);
}

#[test]
fn test_modern_packs_color_into_batch_buffer() {
    let id = PaintContextId::new(8);
    let (gpu, mut adaptor) = modern();
    let mut contexts = contexts_with(id, 6, vec![plain(0, 6)]);
    let color = 0xFF20_4080;
    let renderable = GraphicsRenderable::new(id).with_color(color);

    adaptor
        .execute(&mut PipeState::default(), &renderable, &mut contexts)
        .unwrap();
    adaptor.end_frame().unwrap();

    let writes: Vec<Vec<u8>> = gpu
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            EncoderCall::WriteBuffer { data, .. } => Some(data),
            _ => None,
        })
        .collect();
    assert_eq!(writes.len(), 1);

    // Globals at offset 0, the local block at the next 256-byte boundary.
    let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&writes[0][256..256 + 80]);
    assert_eq!(&floats[12..16], &unpack_color_premultiplied(color));
}

#[test]
fn test_out_of_bounds_batch_issues_nothing() {
    let id = PaintContextId::new(9);
    let renderable = GraphicsRenderable::new(id);

    let (gl, mut legacy) = legacy();
    let mut contexts = contexts_with(id, 6, vec![plain(0, 6), plain(8, 6)]);
    let result = legacy.execute(&mut PipeState::default(), &renderable, &mut contexts);
    assert!(matches!(result, Err(RenderError::BatchOutOfBounds { batch: 1, .. })));
    assert_eq!(gl.call_count(), 0);

    let (gpu, mut modern) = modern();
    let mut contexts = contexts_with(id, 6, vec![plain(0, 6), plain(8, 6)]);
    let result = modern.execute(&mut PipeState::default(), &renderable, &mut contexts);
    assert!(matches!(result, Err(RenderError::BatchOutOfBounds { .. })));
    assert_eq!(gpu.call_count(), 0);
}

#[test]
fn test_unknown_context_is_an_error() {
    let (_, mut adaptor) = legacy();
    let mut contexts = PaintContextCache::new(MAX_TEXTURES);
    let id = PaintContextId::new(404);
    assert_eq!(
        adaptor
            .execute(&mut PipeState::default(), &GraphicsRenderable::new(id), &mut contexts)
            .unwrap_err(),
        RenderError::UnknownPaintContext(id)
    );
}

#[test]
fn test_custom_shader_must_match_backend() {
    let id = PaintContextId::new(10);
    let gl = MockGlEncoder::new();
    let bits = graphics_bits(BackendKind::Legacy, MAX_TEXTURES);
    let shader: Arc<ShaderProgram> = ShaderProgram::compile_legacy(&gl, "custom", &bits);

    let (_, mut adaptor) = modern();
    let mut contexts = contexts_with(id, 6, vec![plain(0, 6)]);
    let renderable = GraphicsRenderable::new(id).with_shader(shader);
    assert_eq!(
        adaptor
            .execute(&mut PipeState::default(), &renderable, &mut contexts)
            .unwrap_err(),
        RenderError::BackendMismatch {
            adaptor: BackendKind::Modern,
            backend: BackendKind::Legacy,
        }
    );
}

#[test]
fn test_custom_shader_is_used_for_draws() {
    let id = PaintContextId::new(11);
    let (gl, mut adaptor) = legacy();
    let shader = ShaderProgram::compile_legacy(
        gl.as_ref(),
        "custom",
        &graphics_bits(BackendKind::Legacy, MAX_TEXTURES),
    );
    let custom = shader.program().id();
    let mut contexts = contexts_with(id, 6, vec![plain(0, 6)]);

    adaptor
        .execute(
            &mut PipeState::default(),
            &GraphicsRenderable::new(id).with_shader(shader),
            &mut contexts,
        )
        .unwrap();
    assert!(gl.calls().contains(&EncoderCall::UseProgram { program: custom }));
}

#[test]
fn test_batch_blend_mode_overrides_renderable() {
    let id = PaintContextId::new(12);
    let (gl, mut adaptor) = legacy();
    let mut screen = plain(6, 6);
    screen.blend_mode = BlendMode::Screen;
    let mut contexts = contexts_with(id, 12, vec![plain(0, 6), screen]);

    let stats = adaptor
        .execute(&mut PipeState::default(), &GraphicsRenderable::new(id), &mut contexts)
        .unwrap();
    assert_eq!(stats.pipeline_state_sets, 2);
    assert!(gl.calls().iter().any(|call| matches!(
        call,
        EncoderCall::SetRasterState { state } if state.blend == BlendMode::Screen.to_blend_state()
    )));
}

#[test]
fn test_options_defaults_keep_all_texture_slots() {
    assert_eq!(AdaptorOptions::default().max_textures, 16);
}

#[test]
fn test_zero_size_batches_skip_like_empty_context() {
    let id = PaintContextId::new(13);
    let additive = GraphicsRenderable::new(id).with_blend_mode(BlendMode::Add);

    let (gl, mut legacy) = legacy();
    let mut contexts = contexts_with(id, 6, vec![plain(0, 0)]);
    let mut pipe = PipeState::default();
    let stats = legacy.execute(&mut pipe, &additive, &mut contexts).unwrap();
    assert_eq!(gl.call_count(), 0);
    assert_eq!(stats.empty_skips, 1);
    assert_eq!(pipe, PipeState::default());

    let (gpu, mut modern) = modern();
    let mut contexts = contexts_with(id, 6, vec![plain(0, 0)]);
    let mut pipe = PipeState::default();
    let stats = modern.execute(&mut pipe, &additive, &mut contexts).unwrap();
    assert_eq!(gpu.call_count(), 0);
    assert_eq!(stats.empty_skips, 1);
    assert_eq!(stats.uniform_blocks_packed, 0);
    assert_eq!(pipe, PipeState::default());
}

#[test]
fn test_texture_groups_fill_every_declared_slot() {
    let id = PaintContextId::new(14);
    let (gpu, mut adaptor) = modern();
    // Untextured, then one texture; the index gap keeps them apart.
    let mut contexts = contexts_with(id, 18, vec![plain(0, 6), textured(12, 6, 900)]);

    adaptor
        .execute(&mut PipeState::default(), &GraphicsRenderable::new(id), &mut contexts)
        .unwrap();

    let groups = gpu.bind_group_resources_at(TEXTURE_SLOT);
    assert_eq!(groups.len(), 2);
    for resources in &groups {
        assert_eq!(resources.len(), 2 * MAX_TEXTURES);
    }

    let texture_ids = |resources: &[BindingResource]| -> Vec<u64> {
        resources
            .iter()
            .filter_map(|resource| match resource {
                BindingResource::Texture(texture) => Some(texture.id()),
                _ => None,
            })
            .collect()
    };
    let untextured = texture_ids(groups[0].as_slice());
    let placeholder = untextured[0];
    assert!(untextured.iter().all(|id| *id == placeholder));
    assert_eq!(
        texture_ids(groups[1].as_slice()),
        vec![900, placeholder, placeholder, placeholder]
    );
}

#[test]
fn test_placeholder_texture_released_on_destroy() {
    let (gpu, mut adaptor) = modern();
    adaptor.destroy().unwrap();
    assert_eq!(
        gpu.count_where(|call| matches!(call, EncoderCall::DestroyTexture { .. })),
        1
    );
}

#[test]
fn test_frames_without_begin_frame_rewind_uniforms() {
    strata_core::logging::init_for_tests();
    let encoder = Arc::new(MockGpuEncoder::new());
    // Room for the globals and one local block per chunk.
    let config = UniformBatchConfig {
        chunk_size: 512,
        alignment: 256,
    };
    let mut adaptor = ModernGraphicsAdaptor::new(encoder.clone(), MAX_TEXTURES, config);
    adaptor.init().unwrap();

    let id = PaintContextId::new(15);
    let renderable = GraphicsRenderable::new(id);
    let mut contexts = contexts_with(id, 6, vec![plain(0, 6)]);
    for _ in 0..4 {
        adaptor
            .execute(&mut PipeState::default(), &renderable, &mut contexts)
            .unwrap();
        adaptor.end_frame().unwrap();
    }

    assert_eq!(encoder.count_buffer_creates(), 1);
    assert_eq!(encoder.count_draws(), 4);
}

//! Shader programs assembled from composable bits.
//!
//! A template has `{{header}}`, `{{main}}` and `{{end}}` insertion points in
//! each stage. Every [`ShaderBit`] contributes a snippet to some of them;
//! snippets are inserted in bit order.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::Arc;

use strata_test_utils::{GlEncoder, GpuEncoder, GpuProgram, ProgramDescriptor};

use crate::backend::{BackendKind, RenderBackend};

const MODERN_VERTEX_TEMPLATE: &str = include_str!("shaders/graphics_vertex.wgsl");
const MODERN_FRAGMENT_TEMPLATE: &str = include_str!("shaders/graphics_fragment.wgsl");
const LEGACY_VERTEX_TEMPLATE: &str = include_str!("shaders/graphics.vert");
const LEGACY_FRAGMENT_TEMPLATE: &str = include_str!("shaders/graphics.frag");

/// Snippets one bit inserts into a single stage.
#[derive(Debug, Clone, Default)]
pub struct StageSnippets {
    pub header: Cow<'static, str>,
    pub main: Cow<'static, str>,
    pub end: Cow<'static, str>,
}

/// A named fragment of shader behavior.
#[derive(Debug, Clone, Default)]
pub struct ShaderBit {
    pub name: Cow<'static, str>,
    pub vertex: StageSnippets,
    pub fragment: StageSnippets,
}

/// Per-vertex color, premultiplied before interpolation.
pub fn color_bit(kind: BackendKind) -> ShaderBit {
    let (vertex_main, fragment_end) = match kind {
        BackendKind::Modern => (
            "vColor = vColor * vec4<f32>(input.aColor.rgb * input.aColor.a, input.aColor.a);",
            "outColor = outColor * input.vColor;",
        ),
        BackendKind::Legacy => (
            "color *= vec4(aColor.rgb * aColor.a, aColor.a);",
            "outColor *= vColor;",
        ),
    };
    ShaderBit {
        name: "color".into(),
        vertex: StageSnippets {
            main: vertex_main.into(),
            ..Default::default()
        },
        fragment: StageSnippets {
            end: fragment_end.into(),
            ..Default::default()
        },
    }
}

/// Per-draw transform and tint from the slot-2 uniform block.
pub fn local_uniform_bit(kind: BackendKind) -> ShaderBit {
    let (header, main) = match kind {
        BackendKind::Modern => (
            "struct LocalUniforms {\n    uTransformMatrix: mat3x3<f32>,\n    uColor: vec4<f32>,\n    uRound: f32,\n}\n\n@group(2) @binding(0) var<uniform> localUniforms: LocalUniforms;",
            "modelMatrix = localUniforms.uTransformMatrix;\n    vColor = vColor * localUniforms.uColor;",
        ),
        BackendKind::Legacy => (
            "layout(std140) uniform localUniforms {\n    mat3 uTransformMatrix;\n    vec4 uColor;\n    float uRound;\n};",
            "modelMatrix = uTransformMatrix;\n    color *= uColor;",
        ),
    };
    ShaderBit {
        name: "local-uniform".into(),
        vertex: StageSnippets {
            header: header.into(),
            main: main.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Snap output positions to whole pixels when `uRound` is set.
///
/// Must follow [`local_uniform_bit`], which declares `uRound`.
pub fn round_pixels_bit(kind: BackendKind) -> ShaderBit {
    let end = match kind {
        BackendKind::Modern => {
            "if (localUniforms.uRound == 1.0) {\n        position = roundPixels(position, globalUniforms.uResolution);\n    }"
        }
        BackendKind::Legacy => {
            "if (uRound == 1.0) {\n        position = roundPixels(position, uResolution);\n    }"
        }
    };
    ShaderBit {
        name: "round-pixels".into(),
        vertex: StageSnippets {
            end: end.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Sample one of `max_textures` textures chosen per vertex.
pub fn texture_batch_bit(kind: BackendKind, max_textures: usize) -> ShaderBit {
    let max_textures = max_textures.max(1);
    let mut header = String::new();
    let mut main = String::new();

    match kind {
        BackendKind::Modern => {
            for i in 0..max_textures {
                let _ = writeln!(
                    header,
                    "@group(1) @binding({}) var uTexture{i}: texture_2d<f32>;\n@group(1) @binding({}) var uSampler{i}: sampler;",
                    i * 2,
                    i * 2 + 1,
                );
            }
            header.push_str(
                "\nfn sampleBatch(id: u32, uv: vec2<f32>, dx: vec2<f32>, dy: vec2<f32>) -> vec4<f32> {\n    switch id {\n",
            );
            for i in 0..max_textures {
                let _ = writeln!(
                    header,
                    "        case {i}u: {{ return textureSampleGrad(uTexture{i}, uSampler{i}, uv, dx, dy); }}"
                );
            }
            header.push_str(
                "        default: { return textureSampleGrad(uTexture0, uSampler0, uv, dx, dy); }\n    }\n}",
            );
            main.push_str(
                "let dx = dpdx(input.vUV);\n    let dy = dpdy(input.vUV);\n    outColor = sampleBatch(input.vTextureId, input.vUV, dx, dy);",
            );
        }
        BackendKind::Legacy => {
            let _ = write!(header, "uniform sampler2D uTextures[{max_textures}];");
            for i in 0..max_textures {
                if i > 0 {
                    main.push_str(" else ");
                }
                let _ = write!(
                    main,
                    "if (vTextureId == {i}) {{\n        outColor = texture(uTextures[{i}], vUV);\n    }}"
                );
            }
        }
    }

    let vertex_main = match kind {
        BackendKind::Modern => "textureId = input.aTextureId;",
        BackendKind::Legacy => "textureId = int(aTextureId);",
    };

    ShaderBit {
        name: format!("texture-batch-{max_textures}").into(),
        vertex: StageSnippets {
            main: vertex_main.into(),
            ..Default::default()
        },
        fragment: StageSnippets {
            header: header.into(),
            main: main.into(),
            ..Default::default()
        },
    }
}

/// The default graphics recipe.
pub fn graphics_bits(kind: BackendKind, max_textures: usize) -> Vec<ShaderBit> {
    vec![
        color_bit(kind),
        texture_batch_bit(kind, max_textures),
        local_uniform_bit(kind),
        round_pixels_bit(kind),
    ]
}

fn assemble(template: &str, name: &str, stages: &[&StageSnippets]) -> String {
    fn join<'a>(snippets: impl Iterator<Item = &'a str>) -> String {
        snippets
            .filter(|snippet| !snippet.is_empty())
            .collect::<Vec<_>>()
            .join("\n    ")
    }
    template
        .replace("{{name}}", name)
        .replace("{{header}}", &join(stages.iter().map(|s| s.header.as_ref())))
        .replace("{{main}}", &join(stages.iter().map(|s| s.main.as_ref())))
        .replace("{{end}}", &join(stages.iter().map(|s| s.end.as_ref())))
}

/// Build the program sources for `kind` from `bits`.
pub fn compile_shader_source(kind: BackendKind, label: &str, bits: &[ShaderBit]) -> ProgramDescriptor {
    let (vertex_template, fragment_template) = match kind {
        BackendKind::Modern => (MODERN_VERTEX_TEMPLATE, MODERN_FRAGMENT_TEMPLATE),
        BackendKind::Legacy => (LEGACY_VERTEX_TEMPLATE, LEGACY_FRAGMENT_TEMPLATE),
    };
    let name = bits
        .iter()
        .map(|bit| bit.name.as_ref())
        .collect::<Vec<_>>()
        .join("+");

    ProgramDescriptor {
        label: label.to_string(),
        vertex_source: assemble(
            vertex_template,
            &name,
            &bits.iter().map(|bit| &bit.vertex).collect::<Vec<_>>(),
        ),
        fragment_source: assemble(
            fragment_template,
            &name,
            &bits.iter().map(|bit| &bit.fragment).collect::<Vec<_>>(),
        ),
    }
}

/// A compiled program for one backend.
///
/// Immutable after compilation and shared read-only through `Arc`. The
/// program object is released by [`ShaderProgram::destroy`], not on drop.
#[derive(Debug)]
pub struct ShaderProgram {
    kind: BackendKind,
    label: String,
    program: GpuProgram,
    bit_names: Vec<Cow<'static, str>>,
}

impl ShaderProgram {
    pub fn compile_modern(encoder: &dyn GpuEncoder, label: &str, bits: &[ShaderBit]) -> Arc<Self> {
        let desc = compile_shader_source(BackendKind::Modern, label, bits);
        let program = encoder.create_program(&desc);
        Arc::new(Self::from_parts(BackendKind::Modern, desc.label, program, bits))
    }

    pub fn compile_legacy(encoder: &dyn GlEncoder, label: &str, bits: &[ShaderBit]) -> Arc<Self> {
        let desc = compile_shader_source(BackendKind::Legacy, label, bits);
        let program = encoder.compile_program(&desc);
        Arc::new(Self::from_parts(BackendKind::Legacy, desc.label, program, bits))
    }

    /// Compile against whichever backend is connected.
    pub fn compile(backend: &RenderBackend, label: &str, bits: &[ShaderBit]) -> Arc<Self> {
        match backend {
            RenderBackend::Modern(encoder) => Self::compile_modern(encoder.as_ref(), label, bits),
            RenderBackend::Legacy(encoder) => Self::compile_legacy(encoder.as_ref(), label, bits),
        }
    }

    fn from_parts(kind: BackendKind, label: String, program: GpuProgram, bits: &[ShaderBit]) -> Self {
        tracing::debug!("Compiled {} shader '{}' ({} bits)", kind, label, bits.len());
        Self {
            kind,
            label,
            program,
            bit_names: bits.iter().map(|bit| bit.name.clone()).collect(),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn program(&self) -> &GpuProgram {
        &self.program
    }

    pub fn bit_names(&self) -> impl Iterator<Item = &str> {
        self.bit_names.iter().map(|name| name.as_ref())
    }

    /// Release the GPU program object.
    pub fn destroy(&self, backend: &RenderBackend) {
        tracing::debug!("Destroying shader '{}'", self.label);
        match backend {
            RenderBackend::Modern(encoder) => encoder.destroy_program(&self.program),
            RenderBackend::Legacy(encoder) => encoder.delete_program(&self.program),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_test_utils::{EncoderCall, MockGlEncoder, MockGpuEncoder};

    #[test]
    fn test_markers_are_replaced() {
        for kind in [BackendKind::Modern, BackendKind::Legacy] {
            let desc = compile_shader_source(kind, "graphics", &graphics_bits(kind, 4));
            for source in [&desc.vertex_source, &desc.fragment_source] {
                assert!(!source.contains("{{"), "{kind}: unreplaced marker");
            }
            assert!(
                desc.vertex_source
                    .contains("color+texture-batch-4+local-uniform+round-pixels")
            );
        }
    }

    #[test]
    fn test_texture_batch_bindings() {
        let desc = compile_shader_source(
            BackendKind::Modern,
            "graphics",
            &[texture_batch_bit(BackendKind::Modern, 2)],
        );
        assert!(desc.fragment_source.contains("@group(1) @binding(0) var uTexture0"));
        assert!(desc.fragment_source.contains("@group(1) @binding(3) var uSampler1"));
        assert!(!desc.fragment_source.contains("uTexture2"));

        let legacy = compile_shader_source(
            BackendKind::Legacy,
            "graphics",
            &[texture_batch_bit(BackendKind::Legacy, 3)],
        );
        assert!(legacy.fragment_source.contains("uniform sampler2D uTextures[3];"));
    }

    #[test]
    fn test_compile_goes_through_encoder() {
        let gpu = MockGpuEncoder::new();
        let shader = ShaderProgram::compile_modern(&gpu, "graphics", &graphics_bits(BackendKind::Modern, 16));
        assert_eq!(shader.kind(), BackendKind::Modern);
        assert_eq!(gpu.count_program_creates(), 1);

        let gl = Arc::new(MockGlEncoder::new());
        let backend = RenderBackend::Legacy(gl.clone());
        let shader = ShaderProgram::compile(&backend, "graphics", &graphics_bits(BackendKind::Legacy, 8));
        shader.destroy(&backend);
        assert_eq!(
            gl.calls().last(),
            Some(&EncoderCall::DestroyProgram {
                program: shader.program().id()
            })
        );
    }
}

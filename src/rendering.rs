//! Rendering system with wgpu pipeline and per-slot chunk buffers.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::info;
use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::params::{RenderConfig, TerrainParams};
use crate::terrain::{grid_indices, ChunkCoord, ChunkMesh, ChunkUploader, TerrainVertex};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Frame-wide uniforms (view-projection matrix + light)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 4],
}

/// Per-chunk uniforms: where to put the chunk and how to expand its grid
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ChunkUniforms {
    pub offset: [f32; 2],
    pub half_extent: f32,
    pub max_height: f32,
    pub precision: u32,
    pub _padding: [u32; 3], // Pad to 32 bytes
}

impl ChunkUniforms {
    pub fn new(coord: ChunkCoord, params: &TerrainParams) -> Self {
        let half = params.chunk_half_extent_m();
        Self {
            offset: [2.0 * half * coord.x as f32, 2.0 * half * coord.z as f32],
            half_extent: half,
            max_height: params.max_height,
            precision: params.precision,
            _padding: [0; 3],
        }
    }
}

/// Water plane uniforms: a square at `level` centered on the window
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WaterUniforms {
    pub center: [f32; 2],
    pub half_extent: f32,
    pub level: f32,
}

impl WaterUniforms {
    /// Plane under the whole resident window around `center`
    pub fn new(center: ChunkCoord, params: &TerrainParams) -> Self {
        let half = params.chunk_half_extent_m();
        Self {
            center: [2.0 * half * center.x as f32, 2.0 * half * center.z as f32],
            half_extent: half * params.window_side() as f32,
            level: 0.0,
        }
    }
}

/// GPU buffers of one chunk slot
///
/// Every chunk shares the same triangle list, so the index buffer lives on
/// [`RenderSystem`] instead.
pub struct GpuChunk {
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Rendering system managing wgpu device, pipeline and frame resources
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    water_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    chunk_bind_group_layout: wgpu::BindGroupLayout,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    water_buffer: wgpu::Buffer,
    water_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    terrain_params: TerrainParams,
    sky_color: wgpu::Color,
}

impl RenderSystem {
    /// Create new rendering system
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
        render_config: &RenderConfig,
        terrain_params: &TerrainParams,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::SurfaceCreation(e.to_string()))?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterNotFound)?;

        info!("Using GPU adapter: {}", adapter.get_info().name);

        // Request device
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DeviceCreation(e.to_string()))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        // Load shader
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Terrain Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let light = glam::Vec3::from_array(render_config.light_direction).normalize_or_zero();
        let globals = Globals {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            light_dir: light.extend(0.0).to_array(),
        };

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::cast_slice(&[globals]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_bind_group_layout = uniform_layout(&device, "Globals Bind Group Layout");
        let chunk_bind_group_layout = uniform_layout(&device, "Chunk Bind Group Layout");

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        // Create terrain render pipeline
        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&globals_bind_group_layout, &chunk_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Terrain Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<TerrainVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32,
                        },
                        wgpu::VertexAttribute {
                            offset: std::mem::size_of::<f32>() as wgpu::BufferAddress,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Shared triangle list for every chunk slot
        let indices = grid_indices(terrain_params.precision);
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chunk Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let water = WaterUniforms::new(ChunkCoord::default(), terrain_params);
        let water_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Water Buffer"),
            contents: bytemuck::cast_slice(&[water]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let water_bind_group_layout = uniform_layout(&device, "Water Bind Group Layout");
        let water_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Water Bind Group"),
            layout: &water_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: water_buffer.as_entire_binding(),
            }],
        });
        let water_pipeline = create_water_pipeline(
            &device,
            config.format,
            &globals_bind_group_layout,
            &water_bind_group_layout,
        );

        let [r, g, b] = render_config.sky_color;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            water_pipeline,
            globals_buffer,
            globals_bind_group,
            chunk_bind_group_layout,
            index_buffer,
            index_count: indices.len() as u32,
            water_buffer,
            water_bind_group,
            depth_view,
            terrain_params: terrain_params.clone(),
            sky_color: wgpu::Color { r, g, b, a: 1.0 },
        })
    }

    /// Reconfigure the surface and depth buffer after a window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }

    /// Current surface size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Upload this frame's camera matrix
    pub fn update_view_proj(&self, view_proj: Mat4) {
        self.queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::cast_slice(&view_proj.to_cols_array_2d()),
        );
    }

    /// Move the water plane under the window around `center`
    pub fn update_water(&self, center: ChunkCoord) {
        let water = WaterUniforms::new(center, &self.terrain_params);
        self.queue
            .write_buffer(&self.water_buffer, 0, bytemuck::cast_slice(&[water]));
    }

    /// Draw every given chunk, then the water plane, and present the frame
    pub fn render<'a>(
        &self,
        chunks: impl Iterator<Item = &'a GpuChunk>,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Terrain Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.sky_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for chunk in chunks {
                render_pass.set_bind_group(1, &chunk.bind_group, &[]);
                render_pass.set_vertex_buffer(0, chunk.vertex_buffer.slice(..));
                render_pass.draw_indexed(0..self.index_count, 0, 0..1);
            }

            // Translucent water last, over the seabed
            render_pass.set_pipeline(&self.water_pipeline);
            render_pass.set_bind_group(1, &self.water_bind_group, &[]);
            render_pass.draw(0..6, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl ChunkUploader for RenderSystem {
    type Buffers = GpuChunk;

    fn create(&mut self, slot: usize, coord: ChunkCoord, mesh: &ChunkMesh) -> GpuChunk {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Chunk {} Vertex Buffer", slot)),
                contents: mesh.vertex_bytes(),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        debug_assert_eq!(mesh.indices.len(), self.index_count as usize);

        let uniforms = ChunkUniforms::new(coord, &self.terrain_params);
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Chunk {} Uniform Buffer", slot)),
                contents: bytemuck::cast_slice(&[uniforms]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Chunk {} Bind Group", slot)),
            layout: &self.chunk_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        GpuChunk {
            vertex_buffer,
            uniform_buffer,
            bind_group,
        }
    }

    fn upload(&mut self, _slot: usize, buffers: &mut GpuChunk, coord: ChunkCoord, mesh: &ChunkMesh) {
        // Every chunk has the same vertex count, so the buffer is rewritten in place
        self.queue
            .write_buffer(&buffers.vertex_buffer, 0, mesh.vertex_bytes());

        let uniforms = ChunkUniforms::new(coord, &self.terrain_params);
        self.queue
            .write_buffer(&buffers.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }
}

fn create_water_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    globals_layout: &wgpu::BindGroupLayout,
    water_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Water Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("water.wgsl").into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Water Pipeline Layout"),
        bind_group_layouts: &[globals_layout, water_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Water Render Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        // Depth-tested against the terrain but never written, so it stays see-through
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layouts_match_shader() {
        assert_eq!(std::mem::size_of::<Globals>(), 80);
        assert_eq!(std::mem::size_of::<ChunkUniforms>(), 32);
    }

    #[test]
    fn test_water_covers_window() {
        assert_eq!(std::mem::size_of::<WaterUniforms>(), 16);

        let params = TerrainParams::default();
        let water = WaterUniforms::new(ChunkCoord::new(1, -2), &params);
        assert_eq!(water.center, [80.0, -160.0]);
        // 13 chunks of 80m across, so 520m from the center to each edge
        assert_eq!(water.half_extent, 520.0);
        assert_eq!(water.level, 0.0);

        // Every resident chunk lies inside the plane
        let chunk = ChunkUniforms::new(ChunkCoord::new(1 + 6, -2 - 6), &params);
        assert!(chunk.offset[0] + chunk.half_extent <= water.center[0] + water.half_extent);
        assert!(chunk.offset[1] - chunk.half_extent >= water.center[1] - water.half_extent);
    }

    #[test]
    fn test_chunk_uniforms_offset() {
        let params = TerrainParams::default();
        let uniforms = ChunkUniforms::new(ChunkCoord::new(2, -3), &params);
        assert_eq!(uniforms.offset, [160.0, -240.0]);
        assert_eq!(uniforms.half_extent, 40.0);
        assert_eq!(uniforms.precision, params.precision);
    }
}

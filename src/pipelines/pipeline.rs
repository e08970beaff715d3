
use crate::entities::Vertex;

use std::rc::Rc;

use gfx_hal as hal;
use gfx_auxil as auxil;

use hal::{
    format,
    image, pass,
    pass::Subpass,
    prelude::*,
    pso,
    pso::{
        ShaderStageFlags, VertexInputRate, InputAssemblerDesc,
        Primitive, PrimitiveAssemblerDesc
    },
};

use std::{
    iter,
    mem::ManuallyDrop,
    ptr,
};

const ENTRY_NAME: &str = "main";
const PIPELINE_CACHE_PATH: &str = "rubik_pipeline_cache";

const VERTEX_SHADER: &str = include_str!("../../shaders/cube.vert");
const FRAGMENT_SHADER: &str = include_str!("../../shaders/cube.frag");

pub struct Pipeline<B: hal::Backend> {
    device: Rc<B::Device>,
    render_pass: ManuallyDrop<B::RenderPass>,
    pipeline_layout: ManuallyDrop<B::PipelineLayout>,
    pipeline: ManuallyDrop<B::GraphicsPipeline>,
    pipeline_cache: ManuallyDrop<B::PipelineCache>,
}


impl<B: hal::Backend> Pipeline<B> {
    pub fn new(
        device: Rc<B::Device>,
        format: hal::format::Format,
    ) -> Self {
        let render_pass = create_render_pass::<B>(&device, format);
        let pipeline_layout = create_pipeline_layout::<B>(&device);
        let pipeline_cache = load_pipeline_cache::<B>(&device);
        let pipeline = create_pipeline::<B>(&device, &*render_pass, &*pipeline_layout, &pipeline_cache);
        save_pipeline_cache::<B>(&device, &pipeline_cache);

        Self {
            device,
            render_pass,
            pipeline_layout,
            pipeline,
            pipeline_cache
        }
    }

    pub fn render_pass(&self) -> &B::RenderPass {
        &*self.render_pass
    }

    pub fn pipeline_layout(&self) -> &B::PipelineLayout {
        &*self.pipeline_layout
    }

    pub fn pipeline(&self) -> &B::GraphicsPipeline {
        &*self.pipeline
    }
}

impl<B> Drop for Pipeline<B> where B: hal::Backend {
    fn drop(&mut self) {
        if let Err(err) = (*self.device).wait_idle() {
            log::error!("device lost while dropping pipeline: {:?}", err);
        }

        unsafe {
            (*self.device)
                .destroy_pipeline_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline_layout,
                )));

            (*self.device)
                .destroy_render_pass(ManuallyDrop::into_inner(ptr::read(
                    &self.render_pass,
                )));

            (*self.device)
                .destroy_graphics_pipeline(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline,
                )));

            (*self.device)
                .destroy_pipeline_cache(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline_cache
                )));
        }
    }
}

fn create_render_pass<B: hal::Backend>(device: &B::Device, format: hal::format::Format) -> ManuallyDrop<B::RenderPass> {
    let attachment = pass::Attachment {
        format: Some(format),
        samples: 1,
        ops: pass::AttachmentOps::new(
            pass::AttachmentLoadOp::Clear,
            pass::AttachmentStoreOp::Store,
        ),
        stencil_ops: pass::AttachmentOps::DONT_CARE,
        layouts: image::Layout::Undefined..image::Layout::Present,
    };

    // No depth attachment: the renderer submits triangles back to front.
    let subpass = pass::SubpassDesc {
        colors: &[(0, image::Layout::ColorAttachmentOptimal)],
        depth_stencil: None,
        inputs: &[],
        resolves: &[],
        preserves: &[],
    };

    ManuallyDrop::new(
        unsafe {
            device.create_render_pass(
                iter::once(attachment),
                iter::once(subpass),
                iter::empty(),
            )
        }
        .expect("Can't create render pass"),
    )
}

fn create_pipeline_layout<B: hal::Backend>(device: &B::Device) -> ManuallyDrop<B::PipelineLayout> {
    let push_constant_bytes = std::mem::size_of::<[[f32; 4]; 4]>() as u32;

    ManuallyDrop::new(
        unsafe {
            device.create_pipeline_layout(
                iter::empty(),
                iter::once((ShaderStageFlags::VERTEX, 0..push_constant_bytes)),
            )
        }
        .expect("Can't create pipeline layout"),
    )
}

fn compile_shader<B: hal::Backend>(
    device: &B::Device,
    source: &str,
    kind: glsl_to_spirv::ShaderType,
) -> B::ShaderModule {
    let file = glsl_to_spirv::compile(source, kind)
        .unwrap_or_else(|err| panic!("Failed to compile shader: {}", err));
    let spirv = auxil::read_spirv(file).expect("Invalid SPIR-V from shader compiler");

    unsafe { device.create_shader_module(&spirv) }.expect("Can't create shader module")
}

fn create_pipeline<B: hal::Backend>(
        device: &B::Device,
        render_pass: &B::RenderPass,
        pipeline_layout: &B::PipelineLayout,
        pipeline_cache: &B::PipelineCache
    ) -> ManuallyDrop<B::GraphicsPipeline> {

    let vs_module = compile_shader::<B>(device, VERTEX_SHADER, glsl_to_spirv::ShaderType::Vertex);
    let fs_module = compile_shader::<B>(device, FRAGMENT_SHADER, glsl_to_spirv::ShaderType::Fragment);

    let (vs_entry, fs_entry) = (
        pso::EntryPoint {
            entry: ENTRY_NAME,
            module: &vs_module,
            specialization: pso::Specialization::default(),
        },
        pso::EntryPoint {
            entry: ENTRY_NAME,
            module: &fs_module,
            specialization: pso::Specialization::default(),
        },
    );

    let primitive_assembler = {
        PrimitiveAssemblerDesc::Vertex {
            buffers: &[pso::VertexBufferDesc {
                binding: 0,
                stride: std::mem::size_of::<Vertex>() as u32,
                rate: VertexInputRate::Vertex,
            }],

            // position then colour, both vec3
            attributes: &[
                pso::AttributeDesc {
                    location: 0,
                    binding: 0,
                    element: pso::Element {
                        format: format::Format::Rgb32Sfloat,
                        offset: 0,
                    },
                },
                pso::AttributeDesc {
                    location: 1,
                    binding: 0,
                    element: pso::Element {
                        format: format::Format::Rgb32Sfloat,
                        offset: 12,
                    },
                },
            ],
            input_assembler: InputAssemblerDesc::new(Primitive::TriangleList),
            vertex: vs_entry,
            tessellation: None,
            geometry: None,
        }
    };

    let subpass = Subpass {
        index: 0,
        main_pass: render_pass,
    };

    // Both sides are drawn; ordering comes from the per-frame sort.
    let mut pipeline_desc = pso::GraphicsPipelineDesc::new(
        primitive_assembler,
        pso::Rasterizer {
            cull_face: pso::Face::NONE,
            ..pso::Rasterizer::FILL
        },
        Some(fs_entry),
        pipeline_layout,
        subpass,
    );

    pipeline_desc.blender.targets.push(pso::ColorBlendDesc {
        mask: pso::ColorMask::ALL,
        blend: Some(pso::BlendState::ALPHA),
    });

    let pipeline = unsafe {
        device.create_graphics_pipeline(&pipeline_desc, Some(pipeline_cache))
    };

    unsafe {
        device.destroy_shader_module(vs_module);
        device.destroy_shader_module(fs_module);
    }

    ManuallyDrop::new(pipeline.expect("Can't create graphics pipeline"))
}

fn load_pipeline_cache<B: hal::Backend>(device: &B::Device) -> ManuallyDrop<B::PipelineCache> {
    let previous_pipeline_cache_data = std::fs::read(PIPELINE_CACHE_PATH);

    if let Err(error) = previous_pipeline_cache_data.as_ref() {
        log::info!("No previous pipeline cache data: {}", error);
    }

    ManuallyDrop::new(unsafe {
        device
            .create_pipeline_cache(
                previous_pipeline_cache_data
                    .as_ref()
                    .ok()
                    .map(|vec| &vec[..]),
            )
            .expect("Can't create pipeline cache")
    })
}

fn save_pipeline_cache<B: hal::Backend>(device: &B::Device, pipeline_cache: &B::PipelineCache) {
    let pipeline_cache_data = match unsafe { device.get_pipeline_cache_data(pipeline_cache) } {
        Ok(data) => data,
        Err(err) => {
            log::warn!("Can't read pipeline cache data: {:?}", err);
            return;
        }
    };

    match std::fs::write(PIPELINE_CACHE_PATH, &pipeline_cache_data) {
        Ok(()) => log::info!(
            "Wrote the pipeline cache to {} ({} bytes)",
            PIPELINE_CACHE_PATH,
            pipeline_cache_data.len()
        ),
        Err(err) => log::warn!("Can't write pipeline cache to {}: {}", PIPELINE_CACHE_PATH, err),
    }
}

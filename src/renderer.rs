
extern crate nalgebra as na;

use crate::entities::Vertex;
use crate::cameras::{self, Camera};
use crate::pipelines::Pipeline;

use std::rc::Rc;
use gfx_hal as hal;

use hal::{
    buffer, command, format,
    format::ChannelType,
    image, memory,
    pool,
    prelude::*,
    pso,
    pso::ShaderStageFlags,
    queue::QueueGroup,
    window,
};

use std::{
    borrow::Borrow,
    iter,
    mem::{self, ManuallyDrop},
    ptr,
};

/// Host-visible vertex buffer rewritten every frame.
struct FrameBuffer<B: hal::Backend> {
    buffer: ManuallyDrop<B::Buffer>,
    memory: ManuallyDrop<B::Memory>,
    capacity: usize,
}

pub struct Renderer<B: hal::Backend> {
    surface: ManuallyDrop<B::Surface>,
    format: hal::format::Format,
    dimensions: window::Extent2D,
    viewport: pso::Viewport,
    framebuffer: ManuallyDrop<B::Framebuffer>,
    pipeline: Pipeline<B>,
    submission_complete_semaphores: Vec<B::Semaphore>,
    submission_complete_fences: Vec<B::Fence>,
    cmd_pools: Vec<B::CommandPool>,
    cmd_buffers: Vec<B::CommandBuffer>,
    vertex_buffers: Vec<FrameBuffer<B>>,
    camera: cameras::OrbitCamera,
    frames_in_flight: usize,
    frame: u64,
    // These members are dropped in the declaration order.
    device: Rc<B::Device>,
    adapter: hal::adapter::Adapter<B>,
    queue_group: QueueGroup<B>,
    instance: B::Instance,
}

impl<B> Renderer<B>
where
    B: hal::Backend,
{
    /// `max_vertices` bounds what a single `render` call can draw.
    pub fn new(
        instance: B::Instance,
        mut surface: B::Surface,
        adapter: hal::adapter::Adapter<B>,
        dimensions: window::Extent2D,
        max_vertices: usize,
    ) -> Renderer<B> {
        let memory_types = adapter.physical_device.memory_properties().memory_types;

        // Build a new device and associated command queues
        let family = adapter
            .queue_families
            .iter().find(|family| {
                surface.supports_queue_family(family) && family.queue_type().supports_graphics()
            })
            .expect("No queue family supports presentation");

        let physical_device = &adapter.physical_device;

        let mut gpu = unsafe {
            physical_device
                .open(
                    &[(family, &[1.0])],
                    hal::Features::empty()
                )
                .expect("Can't open logical device")
        };

        let queue_group = gpu.queue_groups.pop().expect("No queue group");

        // Logical device
        let device = Rc::new(gpu.device);

        log::debug!("Memory types: {:?}", memory_types);

        let caps = surface.capabilities(&adapter.physical_device);
        let formats = surface.supported_formats(&adapter.physical_device);
        log::debug!("formats: {:?}", formats);
        let format = formats.map_or(format::Format::Rgba8Srgb, |formats| {
            formats
                .iter()
                .find(|format| format.base_format().1 == ChannelType::Srgb)
                .map(|format| *format)
                .unwrap_or(formats[0])
        });

        let swap_config = window::SwapchainConfig::from_caps(&caps, format, dimensions);
        let fat = swap_config.framebuffer_attachment();
        log::info!("{:?}", swap_config);
        let extent = swap_config.extent;
        unsafe {
            surface
                .configure_swapchain(&*device, swap_config)
                .expect("Can't configure swapchain");
        };

        let pipeline = Pipeline::new(device.clone(), format);

        let framebuffer = ManuallyDrop::new(unsafe {
            (*device)
                .create_framebuffer(
                    pipeline.render_pass(),
                    iter::once(fat),
                    image::Extent {
                        width: extent.width,
                        height: extent.height,
                        depth: 1,
                    },
                )
                .expect("Can't create framebuffer")
        });

        // Define maximum number of frames we want to be able to be "in flight" (being computed
        // simultaneously) at once
        let frames_in_flight = 3;

        // Each frame in flight gets its own pool, fence and vertex buffer so the
        // CPU never rewrites vertices the GPU is still reading.
        let mut submission_complete_semaphores = Vec::with_capacity(frames_in_flight);
        let mut submission_complete_fences = Vec::with_capacity(frames_in_flight);
        let mut cmd_pools = Vec::with_capacity(frames_in_flight);
        let mut cmd_buffers = Vec::with_capacity(frames_in_flight);
        let mut vertex_buffers = Vec::with_capacity(frames_in_flight);

        for i in 0..frames_in_flight {
            unsafe {
                cmd_pools.push(
                    (*device)
                        .create_command_pool(
                            queue_group.family,
                            pool::CommandPoolCreateFlags::empty(),
                        )
                        .expect("Can't create command pool"),
                );
            }
            submission_complete_semaphores.push(
                (*device)
                    .create_semaphore()
                    .expect("Could not create semaphore"),
            );
            submission_complete_fences
                .push((*device).create_fence(true).expect("Could not create fence"));
            cmd_buffers.push(unsafe { cmd_pools[i].allocate_one(command::Level::Primary) });
            vertex_buffers.push(create_vertex_buffer::<B>(&device, &memory_types, max_vertices.max(3)));
        }

        // Rendering setup
        let viewport = pso::Viewport {
            rect: pso::Rect {
                x: 0,
                y: 0,
                w: extent.width as _,
                h: extent.height as _,
            },
            depth: 0.0..1.0,
        };

        let camera = cameras::OrbitCamera::new(extent.width as f32 / extent.height.max(1) as f32);

        Renderer {
            instance,
            device,
            queue_group,
            surface: ManuallyDrop::new(surface),
            adapter,
            format,
            dimensions,
            viewport,
            framebuffer,
            pipeline,
            submission_complete_semaphores,
            submission_complete_fences,
            cmd_pools,
            cmd_buffers,
            vertex_buffers,
            camera,
            frames_in_flight,
            frame: 0,
        }
    }

    pub fn recreate_swapchain(&mut self) {
        let caps = self.surface.capabilities(&self.adapter.physical_device);
        let swap_config = window::SwapchainConfig::from_caps(&caps, self.format, self.dimensions);
        log::info!("{:?}", swap_config);

        let extent = swap_config.extent.to_extent();
        self.viewport.rect.w = extent.width as _;
        self.viewport.rect.h = extent.height as _;

        unsafe {
            if let Err(err) = (*self.device).wait_idle() {
                log::error!("wait_idle failed: {:?}", err);
            }
            (*self.device)
                .destroy_framebuffer(ManuallyDrop::into_inner(ptr::read(&self.framebuffer)));
            self.framebuffer = ManuallyDrop::new(
                (*self.device)
                    .create_framebuffer(
                        self.pipeline.render_pass(),
                        iter::once(swap_config.framebuffer_attachment()),
                        extent,
                    )
                    .expect("Can't recreate framebuffer"),
            )
        };

        unsafe {
            self.surface
                .configure_swapchain(&*self.device, swap_config)
                .expect("Can't create swapchain");
        }
    }

    /// Draws one frame of `vertices`, a triangle list in world space.
    pub fn render(&mut self, vertices: &[Vertex]) {
        let surface_image = unsafe {
            match self.surface.acquire_image(!0) {
                Ok((image, _)) => image,
                Err(_) => {
                    self.recreate_swapchain();
                    return;
                }
            }
        };

        // Compute index into our resource ring buffers based on the frame number
        // and number of frames in flight.
        let frame_idx = self.frame as usize % self.frames_in_flight;

        // Wait for the fence of the previous submission of this frame and reset it; after
        // this the frame's vertex buffer is no longer in use by the GPU.
        unsafe {
            let fence = &mut self.submission_complete_fences[frame_idx];
            (*self.device)
                .wait_for_fence(fence, !0)
                .expect("Failed to wait for fence");
            (*self.device)
                .reset_fence(fence)
                .expect("Failed to reset fence");
            self.cmd_pools[frame_idx].reset(false);
        }

        self.camera.update_view();
        let sorted = depth_sorted(vertices, self.camera.eye());
        let vertex_count = upload_vertices::<B>(&self.device, &mut self.vertex_buffers[frame_idx], &sorted);

        // Rendering
        let cmd_buffer = &mut self.cmd_buffers[frame_idx];
        unsafe {
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);

            cmd_buffer.set_viewports(0, iter::once(self.viewport.clone()));
            cmd_buffer.set_scissors(0, iter::once(self.viewport.rect));
            cmd_buffer.bind_graphics_pipeline(self.pipeline.pipeline());

            cmd_buffer.bind_vertex_buffers(
                0,
                iter::once((&*self.vertex_buffers[frame_idx].buffer, buffer::SubRange::WHOLE)),
            );

            cmd_buffer.begin_render_pass(
                self.pipeline.render_pass(),
                &self.framebuffer,
                self.viewport.rect,
                iter::once(command::RenderAttachmentInfo {
                    image_view: surface_image.borrow(),
                    clear_value: command::ClearValue {
                        color: command::ClearColor {
                            float32: [0.12, 0.12, 0.14, 1.0],
                        },
                    },
                }),
                command::SubpassContents::Inline,
            );

            let transform: [[f32; 4]; 4] = self.camera.transform().into();
            cmd_buffer.push_graphics_constants(
                self.pipeline.pipeline_layout(),
                ShaderStageFlags::VERTEX,
                0,
                push_constant_bytes(&transform),
            );

            cmd_buffer.draw(0..vertex_count as u32, 0..1);
            cmd_buffer.end_render_pass();
            cmd_buffer.finish();

            self.queue_group.queues[0].submit(
                iter::once(&*cmd_buffer),
                iter::empty(),
                iter::once(&self.submission_complete_semaphores[frame_idx]),
                Some(&mut self.submission_complete_fences[frame_idx]),
            );

            // present frame
            let result = self.queue_group.queues[0].present(
                &mut self.surface,
                surface_image,
                Some(&mut self.submission_complete_semaphores[frame_idx]),
            );

            if result.is_err() {
                self.recreate_swapchain();
            }
        }

        // Increment our frame
        self.frame += 1;
    }

    pub fn dimensions_set(&mut self, dimensions: window::Extent2D) {
        self.dimensions = dimensions;
    }

    pub fn camera(&mut self) -> &mut cameras::OrbitCamera {
        &mut self.camera
    }
}

impl<B> Drop for Renderer<B>
where
    B: hal::Backend,
{
    fn drop(&mut self) {
        if let Err(err) = (*self.device).wait_idle() {
            log::error!("wait_idle failed: {:?}", err);
        }
        unsafe {
            for vb in self.vertex_buffers.drain(..) {
                (*self.device).destroy_buffer(ManuallyDrop::into_inner(vb.buffer));
                (*self.device).free_memory(ManuallyDrop::into_inner(vb.memory));
            }

            for p in self.cmd_pools.drain(..) {
                (*self.device).destroy_command_pool(p);
            }

            for s in self.submission_complete_semaphores.drain(..) {
                (*self.device).destroy_semaphore(s);
            }

            for f in self.submission_complete_fences.drain(..) {
                (*self.device).destroy_fence(f);
            }

            (*self.device).destroy_framebuffer(ManuallyDrop::into_inner(ptr::read(&self.framebuffer)));

            self.surface.unconfigure_swapchain(&*self.device);

            self.instance.destroy_surface(ManuallyDrop::into_inner(ptr::read(&self.surface)));
        }
        log::debug!("renderer dropped");
    }
}

const QUAD_VERTICES: usize = 6;

/// Quads (two triangles, six vertices) ordered farthest first from `eye`,
/// so that without a depth buffer nearer faces are drawn over farther ones.
///
/// A quad stacked right on top of the quad before it, like a sticker on its
/// body face, is kept directly after that quad and sorted by its depth.
/// Vertices past the last whole quad are sorted as single triangles.
pub fn depth_sorted(vertices: &[Vertex], eye: na::Point3<f32>) -> Vec<Vertex> {
    let distance = |part: &[Vertex]| (na::Point3::from(centre(part)) - eye).norm_squared();

    let quads = vertices.chunks_exact(QUAD_VERTICES);
    let tail = quads.remainder();

    // (distance, start, end) over contiguous runs of `vertices`
    let mut groups: Vec<(f32, usize, usize)> = Vec::new();
    let mut previous: Option<&[Vertex]> = None;
    for (i, quad) in quads.enumerate() {
        let start = i * QUAD_VERTICES;
        let end = start + QUAD_VERTICES;
        let stacked = previous.map_or(false, |base| stacked_on(base, quad));
        if stacked && !groups.is_empty() {
            let last = groups.len() - 1;
            groups[last].2 = end;
        } else {
            groups.push((distance(quad), start, end));
        }
        previous = Some(quad);
    }

    let tail_start = vertices.len() - tail.len();
    for (i, tri) in tail.chunks_exact(3).enumerate() {
        let start = tail_start + i * 3;
        groups.push((distance(tri), start, start + 3));
    }

    groups.sort_by(|a, b| b.0.total_cmp(&a.0));
    groups
        .into_iter()
        .flat_map(|(_, start, end)| vertices[start..end].iter().copied())
        .collect()
}

fn centre(part: &[Vertex]) -> na::Vector3<f32> {
    part.iter()
        .fold(na::Vector3::zeros(), |acc, v| acc + na::Vector3::from(v.pos))
        / part.len().max(1) as f32
}

/// Unit normal of the first triangle, following its winding.
fn facing(part: &[Vertex]) -> Option<na::Vector3<f32>> {
    let [a, b, c] = [part.first()?, part.get(1)?, part.get(2)?].map(|v| na::Vector3::from(v.pos));
    (b - a).cross(&(c - a)).try_normalize(f32::EPSILON)
}

/// `top` is parallel to `base`, centred over it and lifted by less than
/// half the width of `base`.
fn stacked_on(base: &[Vertex], top: &[Vertex]) -> bool {
    let (normal, other) = match (facing(base), facing(top)) {
        (Some(normal), Some(other)) => (normal, other),
        _ => return false,
    };
    if normal.dot(&other) < 0.999 {
        return false;
    }

    let offset = centre(top) - centre(base);
    let lift = offset.dot(&normal);
    let half_width = (na::Vector3::from(base[1].pos) - na::Vector3::from(base[0].pos)).norm() / 2.0;
    lift > 0.0 && lift < half_width && (offset - normal * lift).norm() < 1e-4
}

unsafe fn push_constant_bytes<T>(push_constants: &T) -> &[u32] {
    let size_in_bytes = std::mem::size_of::<T>();
    let size_in_u32s = size_in_bytes / std::mem::size_of::<u32>();
    let start_ptr = push_constants as *const T as *const u32;
    std::slice::from_raw_parts(start_ptr, size_in_u32s)
}

fn create_vertex_buffer<B: hal::Backend>(
    device: &B::Device,
    memory_types: &[hal::adapter::MemoryType],
    capacity: usize,
) -> FrameBuffer<B> {
    let buffer_len = (capacity * mem::size_of::<Vertex>()) as u64;

    let mut buffer = unsafe {
        device.create_buffer(
            buffer_len,
            buffer::Usage::VERTEX,
            memory::SparseFlags::empty(),
        )
    }
    .expect("Can't create vertex buffer");

    let buffer_req = unsafe { device.get_buffer_requirements(&buffer) };

    let upload_type = memory_types
        .iter()
        .enumerate()
        .position(|(id, mem_type)| {
            // type_mask is a bit field where each bit represents a memory type. If the bit is set
            // to 1 it means we can use that type for our buffer. So this code finds the first
            // memory type that has a `1` (or, is allowed), and is visible to the CPU.
            buffer_req.type_mask & (1 << id) != 0
                && mem_type.properties.contains(memory::Properties::CPU_VISIBLE)
        })
        .expect("No CPU visible memory type for the vertex buffer")
        .into();

    let memory = unsafe {
        let memory = device
            .allocate_memory(upload_type, buffer_req.size)
            .expect("Can't allocate vertex buffer memory");
        device
            .bind_buffer_memory(&memory, 0, &mut buffer)
            .expect("Can't bind vertex buffer memory");
        memory
    };

    FrameBuffer {
        buffer: ManuallyDrop::new(buffer),
        memory: ManuallyDrop::new(memory),
        capacity,
    }
}

/// Copies as many whole triangles as fit and returns the vertex count written.
fn upload_vertices<B: hal::Backend>(device: &B::Device, target: &mut FrameBuffer<B>, vertices: &[Vertex]) -> usize {
    let mut count = vertices.len().min(target.capacity);
    count -= count % 3;
    if count < vertices.len() {
        log::warn!("dropping {} vertices over buffer capacity", vertices.len() - count);
    }
    if count == 0 {
        return 0;
    }

    unsafe {
        let mapping = match device.map_memory(&mut target.memory, memory::Segment::ALL) {
            Ok(mapping) => mapping,
            Err(err) => {
                log::error!("Can't map vertex buffer: {:?}", err);
                return 0;
            }
        };
        ptr::copy_nonoverlapping(
            vertices.as_ptr() as *const u8,
            mapping,
            count * mem::size_of::<Vertex>(),
        );
        if let Err(err) = device.flush_mapped_memory_ranges(iter::once((&*target.memory, memory::Segment::ALL))) {
            log::error!("Can't flush vertex buffer: {:?}", err);
        }
        device.unmap_memory(&mut target.memory);
    }

    count
}

#[cfg(feature = "dx11")]
extern crate gfx_backend_dx11 as back;
#[cfg(feature = "dx12")]
extern crate gfx_backend_dx12 as back;
#[cfg(not(any(
    feature = "vulkan",
    feature = "dx11",
    feature = "dx12",
    feature = "metal",
    feature = "gl",
)))]
extern crate gfx_backend_empty as back;
#[cfg(feature = "gl")]
extern crate gfx_backend_gl as back;
#[cfg(feature = "metal")]
extern crate gfx_backend_metal as back;
#[cfg(feature = "vulkan")]
extern crate gfx_backend_vulkan as back;


mod backend;
mod cameras;
mod config;
mod controls;
mod cube;
mod entities;
mod fps_calculator;
mod pipelines;
mod renderer;

use anyhow::Context;
use clap::Parser;
use fps_calculator::FPScalculator;
use renderer::Renderer;
use crate::backend::CubeBackend;
use crate::cameras::Camera;
use crate::config::Config;
use crate::controls::{Command, Controls};

use std::thread;
use std::sync::{Arc, Mutex};
use std::time::{self, Instant};

use gfx_hal as hal;
use hal::{
    prelude::*,
    window,
};


pub const TITLE: &str = "Rubik's Cube";
const SCRAMBLE_LENGTH: usize = 25;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::parse();
    let seed = config.seed();
    log::info!("size {}, seed {}, backend {:?}", config.size(), seed, config.backend);

    let mut cube = backend::open(&config, seed).context("Failed to create the cube backend")?;
    prepare(cube.as_mut(), &config, seed)?;

    #[cfg(not(any(
        feature = "vulkan",
        feature = "dx11",
        feature = "dx12",
        feature = "metal",
        feature = "gl",
    )))]
    eprintln!(
        "You are running the example with the empty backend, no graphical output is to be expected"
    );

    let dims = window::Extent2D { width: config.width, height: config.height };
    let event_loop = winit::event_loop::EventLoop::new();

    let window_builder = winit::window::WindowBuilder::new()
        .with_min_inner_size(winit::dpi::Size::Logical(winit::dpi::LogicalSize::new(
            64.0, 64.0,
        )))
        .with_inner_size(winit::dpi::Size::Physical(winit::dpi::PhysicalSize::new(
            dims.width,
            dims.height,
        )))
        .with_title(title(cube.as_ref()));

    // instantiate backend
    let window = window_builder.build(&event_loop).context("Failed to create a window")?;

    let instance = back::Instance::create(TITLE, 1)
        .map_err(|err| anyhow::anyhow!("Failed to create an instance: {:?}", err))?;

    let surface = unsafe {
        instance
            .create_surface(&window)
            .map_err(|err| anyhow::anyhow!("Failed to create a surface: {:?}", err))?
    };

    let adapter = {
        let mut adapters = instance.enumerate_adapters();
        for adapter in &adapters {
            log::info!("{:?}", adapter.info);
        }
        anyhow::ensure!(!adapters.is_empty(), "No graphics adapter found");
        adapters.remove(0)
    };

    let max_vertices = entities::vertex_capacity(cube.size());
    let mut renderer = Renderer::new(instance, surface, adapter, dims, max_vertices);
    let mut controls = Controls::new();

    let fps_calculator = Arc::new(Mutex::new(FPScalculator::new()));
    let fps_calculator_clone = Arc::clone(&fps_calculator);
    thread::spawn(move || {
        loop {
            thread::sleep(time::Duration::from_secs(2));
            match fps_calculator_clone.lock() {
                Ok(mut calc) => log::info!("fps: {:.1}", calc.fps()),
                Err(_) => break,
            }
        }
    });

    let mut last_frame = Instant::now();
    let mut scrambles = 0u64;

    // It is important that the closure move captures the Renderer,
    // otherwise it will not be dropped when the event loop exits.
    event_loop.run(move |event, _, control_flow| {
        *control_flow = winit::event_loop::ControlFlow::Poll;

        renderer.camera().handle_event(&event);
        match event {
            winit::event::Event::WindowEvent { event, .. } => {
                if let Some(command) = controls.handle_window_event(&event) {
                    match command {
                        Command::Quit => *control_flow = winit::event_loop::ControlFlow::Exit,
                        Command::Scramble => {
                            scrambles += 1;
                            run_command(cube.as_mut(), Command::Scramble, seed.wrapping_add(scrambles));
                        }
                        command => run_command(cube.as_mut(), command, seed),
                    }
                    window.set_title(&title(cube.as_ref()));
                }

                match event {
                    winit::event::WindowEvent::CloseRequested => {
                        *control_flow = winit::event_loop::ControlFlow::Exit
                    }

                    winit::event::WindowEvent::Resized(dims) => {
                        log::debug!("resized to {:?}", dims);
                        renderer.dimensions_set(window::Extent2D {
                            width: dims.width,
                            height: dims.height,
                        });
                        renderer.recreate_swapchain();
                    }

                    _ => {}
                }
            },
            winit::event::Event::RedrawEventsCleared => {
                let now = Instant::now();
                let was_idle = cube.is_idle();
                cube.update(now - last_frame);
                last_frame = now;
                if !was_idle && cube.is_idle() {
                    window.set_title(&title(cube.as_ref()));
                }

                renderer.render(&cube.vertices());
                if let Ok(mut calc) = fps_calculator.lock() {
                    calc.count_one_frame();
                }
            }
            _ => {}
        }
    });
}

/// Startup moves: `--moves` first, then `--scramble`.
fn prepare(cube: &mut dyn CubeBackend, config: &Config, seed: u64) -> anyhow::Result<()> {
    let moves = config.initial_moves().context("Invalid --moves")?;
    cube.apply_now(&moves).context("Can't apply --moves")?;

    if config.scramble > 0 {
        let moves = cube.scramble(config.scramble, seed)?;
        log::info!("scramble: {}", cube::format_sequence(&moves));
    }
    Ok(())
}

fn run_command(cube: &mut dyn CubeBackend, command: Command, seed: u64) {
    match command {
        Command::Turn(mv) => {
            if let Err(err) = cube.queue(mv) {
                log::warn!("{}", err);
            }
        }
        Command::Scramble => match cube.scramble(SCRAMBLE_LENGTH, seed) {
            Ok(moves) => log::info!("scramble: {}", cube::format_sequence(&moves)),
            Err(err) => log::warn!("scramble failed: {}", err),
        },
        Command::Reset => {
            cube.reset();
            log::info!("reset");
        }
        Command::Undo => match cube.undo() {
            Some(mv) => log::info!("undid {}", mv),
            None => log::info!("nothing to undo"),
        },
        Command::PrintState => {
            println!("facelets: {}", cube.facelets());
            println!("moves ({}): {}", cube.history().len(), cube::format_sequence(&cube.history()));
            println!("solved: {}", cube.is_solved());
        }
        Command::Quit => {}
    }
}

fn title(cube: &dyn CubeBackend) -> String {
    let n = cube.size();
    let state = if cube.is_solved() { "solved" } else { "scrambled" };
    format!(
        "{} {}x{}x{} | {} moves | {} | {}",
        TITLE,
        n,
        n,
        n,
        cube.history().len(),
        state,
        cube.name()
    )
}

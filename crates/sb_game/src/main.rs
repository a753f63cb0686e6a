//! Space Blasto: main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Each `RedrawRequested`
//! is one variable-step frame:
//!
//!   1. `FrameClock::begin_frame()` sleeps out the tick budget and measures dt
//!   2. quit / overlay keys, then the meatball timer may drop a projectile
//!   3. the environment phase rotator advances one frame
//!   4. the world updates props, NPCs, players, then weapons
//!   5. background (unless acid mode) and sprites are batched and drawn
//!   6. the egui overlay composites on top, the frame is presented, and
//!      edge-triggered input is cleared
//!
//! Startup failures inside `resumed` are stored on the `App`, the event loop
//! exits, and `main` returns the error.

mod assets;
mod config;
mod entity;
mod error;
mod render;
mod spawner;
mod spray;
mod world;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::AssetCache;
use config::{load_startup_config, GameConfig, DEFAULT_CONFIG_PATH};
use render::{BackgroundQuad, SpriteKeys};
use sb_core::input::{InputState, Key};
use sb_core::phase::PhaseRotator;
use sb_core::time::FrameClock;
use sb_devtools::{DebugOverlay, OverlayStats};
use sb_platform::window::PlatformConfig;
use sb_render::{BoundTexture, GpuContext, MeshBuffers, ScreenCamera, SpriteBatch, SpritePipeline};
use spawner::MeatballSpawner;
use world::{StepContext, World};

/// Everything that exists once the window and GPU surface do.
struct GameState {
    window: Arc<Window>,
    gpu: GpuContext,
    clock: FrameClock,
    input: InputState,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,

    // --- Content ----------------------------------------------------------------
    assets: AssetCache,
    sprite_keys: SpriteKeys,
    textures: HashMap<Arc<str>, BoundTexture>,
    texture_bytes: usize,
    background: Option<BackgroundQuad>,
    background_color: wgpu::Color,
    acid_mode: bool,

    // --- Simulation ---------------------------------------------------------------
    world: World,
    rotator: PhaseRotator,
    spawner: Option<MeatballSpawner>,
    rng: Pcg32,

    // --- Per-frame GPU state ------------------------------------------------------
    camera: ScreenCamera,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh: MeshBuffers,
    batch: SpriteBatch,
}

impl GameState {
    fn new(window: Arc<Window>, config: &GameConfig) -> anyhow::Result<Self> {
        let gpu = GpuContext::new(Arc::clone(&window), config.vsync)
            .context("failed to initialise the GPU")?;

        let mut assets = AssetCache::new(&config.asset_dir, config.debug);
        assets.preload(config.sprite_specs())?;
        let background_image = match &config.background_image {
            Some(file) => assets.load_background(file)?,
            None => None,
        };
        let background = background_image.as_ref().map(|img| BackgroundQuad {
            width: img.width() as f32,
            height: img.height() as f32,
        });

        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let textures = render::upload_textures(
            &gpu.device,
            &gpu.queue,
            &sprite_pipeline,
            &assets,
            background_image.as_ref(),
        );
        let texture_bytes = textures
            .values()
            .map(|t| t.texture.size.0 as usize * t.texture.size.1 as usize * 4)
            .sum();
        let sprite_keys = SpriteKeys::from_cache(&assets);

        let viewport = config.viewport();
        let camera = ScreenCamera::new(viewport.width, viewport.height);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group = sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let seed = config.rng_seed.unwrap_or_else(|| rand::rng().random());
        log::info!("RNG seed: {seed}");
        let mut rng = Pcg32::seed_from_u64(seed);

        let world = World::populate(config, &assets, &mut rng)?;
        let rotator = PhaseRotator::new(config.phase_schedule()?);
        log::info!(
            "Environment cycle: {} frames over {} phases",
            rotator.cycle_length(),
            config.environment_phases.len()
        );

        let clock = FrameClock::new(config.tick_rate);
        if clock.is_uncapped() {
            log::info!("Frame rate uncapped (tick_rate = 0)");
        } else {
            log::info!("Frame rate capped at {} fps", config.tick_rate);
        }
        let spawner = MeatballSpawner::new(&config.meatball, clock.now_ms(), &mut rng);
        let debug_overlay =
            DebugOverlay::new(&gpu.device, gpu.surface_format, &window, config.show_overlay);
        let mesh = MeshBuffers::new(&gpu.device);
        let batch = SpriteBatch::with_capacity(world.stats().total() + 1);

        Ok(Self {
            window,
            gpu,
            clock,
            input: InputState::new(),
            sprite_pipeline,
            debug_overlay,
            assets,
            sprite_keys,
            textures,
            texture_bytes,
            background,
            background_color: config.background_color.to_wgpu(),
            acid_mode: config.acid_mode,
            world,
            rotator,
            spawner,
            rng,
            camera,
            camera_buffer,
            camera_bind_group,
            mesh,
            batch,
        })
    }

    /// Runs one simulation frame. Returns `false` when the game should quit.
    fn simulate(&mut self) -> bool {
        self.clock.begin_frame();

        if self.input.is_just_pressed(Key::Escape) {
            return false;
        }
        if self.input.is_just_pressed(Key::ToggleOverlay) {
            self.debug_overlay.toggle();
        }

        let now_ms = self.clock.now_ms();
        if let Some(spawner) = self.spawner.as_mut() {
            if let Some(at) = spawner.poll(now_ms, self.world.viewport(), &mut self.rng) {
                log::debug!("Meatball spawning at {:.0}, {:.0}", at.x, at.y);
                self.world.spawn_weapon(spawner.weapon_index(), at, Some(Vec2::Y));
                log::debug!("Next meatball at {} ms", spawner.next_spawn_ms());
            }
        }

        let phase = self.rotator.advance();
        self.world.step(&StepContext {
            dt: self.clock.dt,
            now_ms,
            phase,
            input: &self.input,
        });
        true
    }

    fn overlay_stats(&self) -> OverlayStats {
        let stats = self.world.stats();
        let mesh_bytes = self.mesh.byte_size();
        OverlayStats {
            phase_label: match self.rotator.active() {
                Some(phase) if self.rotator.is_clearing() => format!("{phase} (ending)"),
                Some(phase) => phase.name().to_string(),
                None => "none".to_string(),
            },
            phase_remaining: self.rotator.remaining(),
            props: stats.props,
            npcs: stats.npcs,
            players: stats.players,
            weapons: stats.weapons,
            draw_calls: self.batch.draw_calls.len() as u32,
            sprite_count: self.batch.quad_count() as u32,
            memory_estimate_mb: (self.texture_bytes + mesh_bytes + self.assets.byte_size()) as f32
                / (1024.0 * 1024.0),
            acid_mode: self.acid_mode,
        }
    }

    fn render(&mut self) {
        let background = if self.acid_mode { None } else { self.background };
        render::build_frame_batch(&self.world, &self.sprite_keys, background, &mut self.batch);
        self.mesh.upload(&self.gpu.device, &self.gpu.queue, &self.batch);
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let stats = self.overlay_stats();
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.clock, &stats);
        if overlay_actions.toggle_acid_mode {
            self.acid_mode = !self.acid_mode;
            log::info!("Acid mode: {}", if self.acid_mode { "ON" } else { "OFF" });
        }
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            // Acid mode keeps last frame's pixels so moving sprites smear.
            let load = if self.acid_mode {
                wgpu::LoadOp::Load
            } else {
                wgpu::LoadOp::Clear(self.background_color)
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            self.mesh.draw(&mut render_pass, &self.batch, &self.textures);
        }

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: GameConfig,
    state: Option<GameState>,
    startup_error: Option<anyhow::Error>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self {
            config,
            state: None,
            startup_error: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<GameState> {
        let platform = PlatformConfig {
            title: self.config.title.clone(),
            width: self.config.screen_width,
            height: self.config.screen_height,
        };
        let window = sb_platform::create_window(event_loop, &platform)
            .context("failed to create the game window")?;
        GameState::new(window, &self.config)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.startup_error.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Startup failed: {err:#}");
                self.startup_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                state.gpu.resize(physical_size.width, physical_size.height);
            }

            WindowEvent::Focused(false) => {
                // Key-up events for keys held while unfocused never arrive.
                state.input.release_all();
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(key),
                            ElementState::Released => state.input.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }
                if !state.simulate() {
                    log::info!("Escape pressed, exiting.");
                    event_loop.exit();
                    return;
                }
                state.render();
                state.input.end_frame();
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Space => Some(Key::Fire),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::ToggleOverlay),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Space Blasto starting...");

    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = load_startup_config(&config_path)?;

    let event_loop = EventLoop::new().context("failed to create the event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.startup_error.take() {
        return Err(err);
    }
    log::info!("Goodbye.");
    Ok(())
}

//! Label graph demo
//!
//! A ring of labeled nodes orbiting the window centre, drawn with `text-nodes`.
//!
//! Keys: `N` add a node, `D` remove one, `R` rename one, `Space` pause, `Esc` quit.
//! Mouse wheel zooms. Pass `--bitmap` to use the built-in stroke font instead of system fonts.

mod scene;

use glam::{Mat4, Vec3};
use scene::{Scene, SceneParams};
use std::sync::Arc;
use std::time::Instant;
use text_nodes::{AtlasRasterizer, Color, ColorError, FontOptions, RenderError, TextNodeProgram};
use text_nodes_raster::BitmapRasterizer;
use text_nodes_wgpu::WgpuContext;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const BACKGROUND: Color = Color::from_packed(0x0b0b12);

fn clear_color() -> wgpu::Color {
    wgpu::Color {
        r: BACKGROUND.r as f64,
        g: BACKGROUND.g as f64,
        b: BACKGROUND.b as f64,
        a: BACKGROUND.a as f64,
    }
}

type Program = TextNodeProgram<WgpuContext, Box<dyn AtlasRasterizer>>;

#[derive(thiserror::Error, Debug)]
enum SetupError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("invalid label colors: {0}")]
    Colors(#[from] ColorError),
    #[error("failed to load label program: {0}")]
    Program(#[from] RenderError),
}

fn make_rasterizer(use_bitmap: bool) -> Box<dyn AtlasRasterizer> {
    if use_bitmap {
        log::info!("✓ Using built-in bitmap font");
        Box::new(BitmapRasterizer::new())
    } else {
        log::info!("✓ Using system fonts (cosmic-text)");
        Box::new(text_nodes_raster::CosmicRasterizer::new())
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    config: wgpu::SurfaceConfiguration,
    program: Program,
    scene: Scene,
    zoom: f32,
    last_frame: Instant,
}

impl GpuState {
    async fn new(window: Arc<Window>, use_bitmap: bool) -> Result<Self, SetupError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

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
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let options = FontOptions::default()
            .with_size(16.0)
            .with_dpi_scale(4.0)
            .with_colors("#f0f0f0", "#1b1b26")?;
        let mut program = Program::new(options, make_rasterizer(use_bitmap));
        program.load(WgpuContext::new(device.clone(), queue, surface_format))?;

        let mut scene = Scene::new(SceneParams::default());
        scene.populate(&mut program);
        log::info!("✓ Scene initialized with {} nodes", scene.len());

        let mut state = Self {
            surface,
            device,
            config,
            program,
            scene,
            zoom: 1.0,
            last_frame: Instant::now(),
        };
        state.update_screen_size();
        Ok(state)
    }

    // Labels are positioned in pixels from the window centre, so the shader's
    // `pos / screen_size` must map half the window to 1.
    fn update_screen_size(&mut self) {
        self.program
            .update_size(self.config.width as f32 * 0.5, self.config.height as f32 * 0.5);
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.update_screen_size();
        }
    }

    fn zoom_by(&mut self, delta: f32) {
        self.zoom = (self.zoom * (1.0 + delta * 0.1)).clamp(0.2, 5.0);
        self.program
            .update_transform(Mat4::from_scale(Vec3::new(self.zoom, self.zoom, 1.0)));
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.scene.update(&mut self.program, dt);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let Some(context) = self.program.context_mut() else {
            return Ok(());
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        context.queue().submit(std::iter::once(encoder.finish()));
        context.set_target(view);

        if let Err(e) = self.program.render() {
            log::error!("label render failed: {e}");
        }
        if let Some(context) = self.program.context_mut() {
            context.take_target();
        }

        output.present();
        Ok(())
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    use_bitmap: bool,
}

impl App {
    fn on_key(&mut self, key: KeyCode) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };
        let GpuState { program, scene, .. } = gpu_state;
        match key {
            KeyCode::KeyN => scene.add_node(program),
            KeyCode::KeyD => scene.remove_random(program),
            KeyCode::KeyR => scene.rename_random(program),
            KeyCode::Space => scene.paused = !scene.paused,
            _ => return,
        }
        log::info!(
            "{} nodes, {} label characters, atlas v{}",
            scene.len(),
            program.active_characters(),
            program.atlas().version()
        );
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Label Graph")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GpuState::new(window.clone(), self.use_bitmap)) {
            Ok(state) => {
                self.gpu_state = Some(state);
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                log::error!("{e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.on_key(key),

            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                    };
                    gpu_state.zoom_by(scroll);
                }
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    match gpu_state.render() {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            let size = winit::dpi::PhysicalSize::new(
                                gpu_state.config.width,
                                gpu_state.config.height,
                            );
                            gpu_state.resize(size);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => log::warn!("surface error: {e:?}"),
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

fn main() {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let use_bitmap = std::env::args().any(|arg| arg == "--bitmap");
    log::info!("Starting label graph demo...");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {e}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        window: None,
        gpu_state: None,
        use_bitmap,
    };

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {e}");
    }
}

pub mod config;
pub mod primitives;
pub mod process;

use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;
use std::iter;
use std::time::Instant;

use anyhow::{Context, Result};
use cgmath::{Deg, EuclideanSpace, Matrix4, Point3, Rad, Vector3};
use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowBuilder, WindowLevel},
};

use config::DemoConfig;
use primitives::camera::{orthographic, perspective, Camera, CameraUniform};
use primitives::input::InputState;
use primitives::mesh::Mesh;
use primitives::texture::{RenderTarget, Texture};
use process::pipeline::{create_pipeline, create_shadow_pipeline, BindGroupLayouts, ShadingModel};
use process::timing::FrameTimer;

const SUN_NEAR: f32 = 0.1;

/// Places the held mesh in front of the camera, slightly right and below the view axis.
pub fn held_mesh_model(camera: &Camera) -> Matrix4<f32> {
    Matrix4::from_translation(camera.position.to_vec())
        * camera.rotation()
        * Matrix4::from_translation(Vector3::new(0.8, -0.6, -1.0))
        * Matrix4::from_angle_x(Rad(-FRAC_PI_2))
        * Matrix4::from_scale(0.8)
}

pub struct State {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    settings: DemoConfig,
    layouts: BindGroupLayouts,
    pipelines: HashMap<ShadingModel, wgpu::RenderPipeline>,
    shadow_pipeline: wgpu::RenderPipeline,
    input: InputState,
    camera: Camera,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sun: Camera,
    sun_buffer: wgpu::Buffer,
    sun_bind_group: wgpu::BindGroup,
    #[allow(dead_code)]
    screen_camera_buffer: wgpu::Buffer,
    screen_camera_bind_group: wgpu::BindGroup,
    shadow_map: Texture,
    player_target: RenderTarget,
    floor: Mesh,
    cube: Mesh,
    mesh: Mesh,
    held_mesh: Option<Mesh>,
    screen_quad: Mesh,
    spin: f32,
    frame_timer: FrameTimer,
    window: Window,
}

impl State {
    async fn new(window: Window, settings: DemoConfig) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(&window) }
            .context("Failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No compatible graphics adapter")?;

        // Log device and backend
        let info = adapter.get_info();
        log::info!("Using {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("Failed to create graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };

        surface.configure(&device, &config);

        // PIPELINES
        let layouts = BindGroupLayouts::new(&device);
        let pipelines: HashMap<ShadingModel, wgpu::RenderPipeline> = ShadingModel::ALL
            .iter()
            .map(|&shading| (shading, create_pipeline(&device, &layouts, shading, config.format)))
            .collect();
        let shadow_pipeline = create_shadow_pipeline(&device, &layouts);

        // CAMERAS
        let camera_settings = &settings.camera;
        let camera = Camera::new(
            Point3::from(camera_settings.start_position),
            perspective(
                Deg(camera_settings.fov_degrees),
                config.width as f32 / config.height as f32,
                camera_settings.near,
                camera_settings.far,
            ),
            camera_settings.speed,
            camera_settings.sensitivity,
        );

        let mut sun = Camera::new(
            camera.position + Vector3::from(settings.sun.offset),
            orthographic(settings.sun.view_size, SUN_NEAR, settings.sun.far),
            0.0,
            0.0,
        );
        sun.yaw = Rad::from(Deg(settings.sun.yaw_degrees)).0;
        sun.pitch = Rad::from(Deg(settings.sun.pitch_degrees)).0;

        let camera_buffer = CameraUniform::from(&camera)
            .with_sun(&sun, settings.sun.shadows)
            .to_buffer(&device, "Camera Buffer");
        let camera_bind_group =
            layouts.create_camera_bind_group(&device, &camera_buffer, "Camera Bind Group");

        let sun_buffer = CameraUniform::from(&sun).to_buffer(&device, "Sun Buffer");
        let sun_bind_group = layouts.create_camera_bind_group(&device, &sun_buffer, "Sun Bind Group");

        let screen_camera_buffer = CameraUniform::new().to_buffer(&device, "Screen Camera Buffer");
        let screen_camera_bind_group = layouts.create_camera_bind_group(
            &device,
            &screen_camera_buffer,
            "Screen Camera Bind Group",
        );

        // RENDER TARGETS
        let shadow_size = settings.sun.texture_size.max(1);
        let shadow_map = Texture::create_depth_target(&device, (shadow_size, shadow_size), "Sun Shadow Map");
        let player_target = RenderTarget::new(
            &device,
            config.format,
            (config.width, config.height),
            "Player Camera",
        );

        // SCENE SETUP
        let diffuse = match Texture::load(&device, &queue, &settings.assets.texture) {
            Ok(texture) => texture,
            Err(err) => {
                log::error!("{:#}; using a white texture instead", err);
                Texture::solid(&device, &queue, [255, 255, 255, 255], "White Texture")
            }
        };
        let lit_material = |label: &str| {
            layouts.create_material_bind_group(&device, &diffuse, &shadow_map, label)
        };

        let floor = Mesh::create_quad(
            &device,
            &layouts,
            "Floor",
            [
                Vector3::new(-10.0, 0.0, 10.0),
                Vector3::new(10.0, 0.0, 10.0),
                Vector3::new(10.0, 0.0, -10.0),
                Vector3::new(-10.0, 0.0, -10.0),
            ],
            ShadingModel::Gray,
            lit_material("Floor Material"),
        );

        let cube = Mesh::create_cube(
            &device,
            &layouts,
            "Cube",
            Vector3::new(3.0, 0.5, 0.0),
            1.0,
            ShadingModel::UvColor,
            lit_material("Cube Material"),
        );

        let mesh = Mesh::create_from_obj(
            &device,
            &layouts,
            &settings.assets.mesh,
            ShadingModel::Textured,
            lit_material("Mesh Material"),
        )?;

        let held_mesh = match &settings.assets.held_mesh {
            Some(path) => Some(Mesh::create_from_obj(
                &device,
                &layouts,
                path,
                ShadingModel::Textured,
                lit_material("Held Mesh Material"),
            )?),
            None => None,
        };

        let screen_quad = Mesh::create_quad(
            &device,
            &layouts,
            "Screen Quad",
            [
                Vector3::new(-1.0, 1.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
                Vector3::new(1.0, -1.0, 0.0),
                Vector3::new(-1.0, -1.0, 0.0),
            ],
            ShadingModel::Screen,
            layouts.create_material_bind_group(
                &device,
                &player_target.color,
                &player_target.depth,
                "Screen Material",
            ),
        );

        let frame_timer = FrameTimer::new(settings.render.fps_report_secs);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            settings,
            layouts,
            pipelines,
            shadow_pipeline,
            input: InputState::new(),
            camera,
            camera_buffer,
            camera_bind_group,
            sun,
            sun_buffer,
            sun_bind_group,
            screen_camera_buffer,
            screen_camera_bind_group,
            shadow_map,
            player_target,
            floor,
            cube,
            mesh,
            held_mesh,
            screen_quad,
            spin: 0.0,
            frame_timer,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            let camera_settings = &self.settings.camera;
            self.camera.projection = perspective(
                Deg(camera_settings.fov_degrees),
                new_size.width as f32 / new_size.height as f32,
                camera_settings.near,
                camera_settings.far,
            );

            self.player_target = RenderTarget::new(
                &self.device,
                self.config.format,
                (new_size.width, new_size.height),
                "Player Camera",
            );
            self.screen_quad.set_material(self.layouts.create_material_bind_group(
                &self.device,
                &self.player_target.color,
                &self.player_target.depth,
                "Screen Material",
            ));
        }
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        self.input.process_events(event)
    }

    fn mouse_motion(&mut self, delta: (f64, f64)) {
        self.input.process_mouse_motion(delta);
    }

    fn update(&mut self, dt: f32) {
        if let Some(fps) = self.frame_timer.tick(dt) {
            log::debug!("{:.1} fps", fps);
            self.window
                .set_title(&format!("{} (fps: {:.1})", self.settings.window.title, fps));
        }

        let input = self.input.snapshot();
        self.camera.update(dt, &input);

        let sun_settings = &self.settings.sun;
        self.sun.position = self.camera.position + Vector3::from(sun_settings.offset);
        self.sun.yaw = Rad::from(Deg(sun_settings.yaw_degrees)).0;
        self.sun.pitch = Rad::from(Deg(sun_settings.pitch_degrees)).0;

        self.spin += Rad::from(Deg(self.settings.render.spin_degrees_per_sec)).0 * dt;
        self.mesh.model = Matrix4::from_angle_y(Rad(self.spin));
        self.mesh.update_buffer(&self.queue);

        if let Some(held_mesh) = &mut self.held_mesh {
            held_mesh.model = held_mesh_model(&self.camera);
            held_mesh.update_buffer(&self.queue);
        }

        CameraUniform::from(&self.camera)
            .with_sun(&self.sun, sun_settings.shadows)
            .update_buffer(&self.camera_buffer, &self.queue);
        CameraUniform::from(&self.sun).update_buffer(&self.sun_buffer, &self.queue);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let lit_meshes = [&self.floor, &self.cube, &self.mesh];

        if self.settings.sun.shadows {
            // Sun shadow map
            let mut sun_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sun Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            sun_pass.set_pipeline(&self.shadow_pipeline);
            sun_pass.set_bind_group(0, &self.sun_bind_group, &[]);
            for mesh in lit_meshes {
                mesh.draw_geometry(&mut sun_pass);
            }
        }

        let [r, g, b, a] = self.settings.render.clear_color;
        let camera_view = if self.settings.render.screen_blit {
            &self.player_target.color.view
        } else {
            &view
        };

        {
            let mut camera_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Camera Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: camera_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.player_target.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            camera_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for mesh in lit_meshes.into_iter().chain(self.held_mesh.as_ref()) {
                camera_pass.set_pipeline(&self.pipelines[&mesh.shading]);
                mesh.draw(&mut camera_pass);
            }
        }

        if self.settings.render.screen_blit {
            let mut screen_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Screen Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            screen_pass.set_pipeline(&self.pipelines[&self.screen_quad.shading]);
            screen_pass.set_bind_group(0, &self.screen_camera_bind_group, &[]);
            self.screen_quad.draw(&mut screen_pass);
        }

        self.queue.submit(iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

pub async fn run(settings: DemoConfig) -> Result<()> {
    let event_loop = EventLoop::new();
    let mut builder = WindowBuilder::new()
        .with_title(settings.window.title.as_str())
        .with_inner_size(winit::dpi::PhysicalSize::new(
            settings.window.width,
            settings.window.height,
        ))
        .with_resizable(false);
    if settings.window.always_on_top {
        builder = builder.with_window_level(WindowLevel::AlwaysOnTop);
    }
    let window = builder.build(&event_loop).context("Failed to create window")?;

    if let Err(err) = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
    {
        log::warn!("Cursor grab not supported: {}", err);
    }
    window.set_cursor_visible(false);

    let mut state = State::new(window, settings).await?;
    let mut last_render_time = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == state.window().id() => {
                if !state.input(event) {
                    match event {
                        WindowEvent::CloseRequested
                        | WindowEvent::KeyboardInput {
                            input:
                                KeyboardInput {
                                    state: ElementState::Pressed,
                                    virtual_keycode: Some(VirtualKeyCode::Escape),
                                    ..
                                },
                            ..
                        } => {
                            log::info!("Exiting");
                            *control_flow = ControlFlow::Exit
                        }
                        WindowEvent::Resized(physical_size) => {
                            state.resize(*physical_size);
                        }
                        WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                            state.resize(**new_inner_size);
                        }
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => state.mouse_motion(delta),
            Event::RedrawRequested(window_id) if window_id == state.window().id() => {
                let now = Instant::now();
                let dt = (now - last_render_time).as_secs_f32();
                last_render_time = now;
                state.update(dt);

                match state.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        state.resize(state.size)
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory");
                        *control_flow = ControlFlow::Exit
                    }
                    Err(wgpu::SurfaceError::Timeout) => log::warn!("Surface timeout"),
                }
            }
            Event::MainEventsCleared => {
                state.window().request_redraw();
            }
            _ => {}
        }
    });
}

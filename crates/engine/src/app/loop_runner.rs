use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::input::{ActionStates, FighterAction};
use super::metrics::LoopMetrics;
use super::render::DrawList;
use super::scene::{InputSnapshot, SceneMachine, MAX_LOCAL_SLOTS};
use super::{Renderer, Scene, SceneKey};

pub const SLOW_FRAME_ENV_VAR: &str = "LEDGEFALL_SLOW_FRAME_MS";
pub const ASSETS_ENV_VAR: &str = "LEDGEFALL_ASSETS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Tick rate used whenever the active scene does not override it.
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
    pub asset_root: PathBuf,
    pub initial_scene: SceneKey,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Ledgefall".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 8,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
            asset_root: PathBuf::from("assets"),
            initial_scene: SceneKey::Lobby,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    lobby: Box<dyn Scene>,
    arena: Box<dyn Scene>,
) -> Result<(), AppError> {
    let mut scenes = SceneMachine::new(lobby, arena, config.initial_scene);
    let asset_root = resolve_asset_root(&config.asset_root);
    info!(asset_root = %asset_root.display(), "startup");

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer =
        Renderer::new(Arc::clone(&window), asset_root).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let default_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::default();
    scenes.load_active();
    info!(scene = ?scenes.active_scene(), "scene_loaded");

    info!(
        default_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics = LoopMetrics::new(metrics_log_interval, default_tps, Instant::now());
    let mut metrics_readout: Option<String> = None;
    let mut last_applied_title: Option<String> = None;
    let mut overlay_visible = false;
    let mut current_tps = default_tps;
    let mut draw_list = DrawList::default();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if slow_frame_delay > Duration::ZERO {
                        // Debug perturbation only; not the FPS cap.
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let next_tps =
                        effective_tick_rate(scenes.active_world().tick_rate(), default_tps);
                    if next_tps != current_tps {
                        info!(from = current_tps, to = next_tps, "tick_rate_changed");
                        current_tps = next_tps;
                        metrics.tick_rate_changed();
                    }
                    let fixed_dt = Duration::from_secs_f64(1.0 / current_tps as f64);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        if input_snapshot.overlay_toggle_pressed() {
                            overlay_visible = !overlay_visible;
                            info!(overlay_visible, "overlay_toggled");
                        }
                        let command = scenes.update_active(&input_snapshot);
                        if scenes.apply_command(command) {
                            info!(scene = ?scenes.active_scene(), ?command, "scene_switched");
                        }
                        metrics.tick(current_tps);
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        metrics.dropped(step_plan.dropped_backlog, fixed_dt);
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame,
                            "sim_clamp_triggered"
                        );
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    draw_list.clear();
                    scenes.render_active(&mut draw_list);
                    if let Err(error) = renderer.render_draw_list(
                        &draw_list,
                        scenes.active_world().camera(),
                        overlay_visible,
                    ) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    metrics.frame(raw_frame_dt);
                    if let Some(snapshot) = metrics.close_if_due(now, current_tps) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            target_tps = snapshot.target_tps,
                            slowed = snapshot.is_slowed(default_tps),
                            slowed_ticks = snapshot.slowed_ticks,
                            tick_rate_changes = snapshot.tick_rate_changes,
                            dropped_ticks = snapshot.dropped_ticks,
                            frame_time_ms = snapshot.frame_time_ms,
                            scene = ?scenes.active_scene(),
                            "loop_metrics"
                        );
                        metrics_readout = Some(snapshot.title_suffix());
                    }

                    let base_title = scenes
                        .debug_title_active()
                        .unwrap_or_else(|| config.window_title.clone());
                    let next_title = match &metrics_readout {
                        Some(readout) => format!("{base_title} | {readout}"),
                        None => base_title,
                    };
                    if last_applied_title.as_ref() != Some(&next_title) {
                        window.set_title(&next_title);
                        last_applied_title = Some(next_title);
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                scenes.shutdown_all();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    confirm_is_down: bool,
    confirm_pressed_edge: bool,
    overlay_toggle_is_down: bool,
    overlay_toggle_pressed_edge: bool,
    slots: [ActionStates; MAX_LOCAL_SLOTS],
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return;
        };
        self.handle_key(code, key_event.state);
    }

    fn handle_key(&mut self, code: KeyCode, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        if let Some((slot, action)) = slot_binding(code) {
            self.slots[slot].set(action, is_pressed);
            return;
        }

        match code {
            KeyCode::Enter | KeyCode::NumpadEnter => {
                latch_edge(&mut self.confirm_is_down, &mut self.confirm_pressed_edge, state)
            }
            KeyCode::F3 => latch_edge(
                &mut self.overlay_toggle_is_down,
                &mut self.overlay_toggle_pressed_edge,
                state,
            ),
            KeyCode::Escape if is_pressed => self.mark_quit_requested(),
            _ => {}
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.confirm_pressed_edge,
            self.overlay_toggle_pressed_edge,
            self.slots,
        );
        self.confirm_pressed_edge = false;
        self.overlay_toggle_pressed_edge = false;
        snapshot
    }
}

fn latch_edge(is_down: &mut bool, pressed_edge: &mut bool, state: ElementState) {
    match state {
        ElementState::Pressed => {
            if !*is_down {
                *pressed_edge = true;
            }
            *is_down = true;
        }
        ElementState::Released => *is_down = false,
    }
}

/// Two fighters share one keyboard: slot 0 on the left hand, slot 1 on the
/// arrow cluster.
fn slot_binding(code: KeyCode) -> Option<(usize, FighterAction)> {
    let binding = match code {
        KeyCode::KeyA => (0, FighterAction::Left),
        KeyCode::KeyD => (0, FighterAction::Right),
        KeyCode::KeyW => (0, FighterAction::Up),
        KeyCode::KeyS => (0, FighterAction::Down),
        KeyCode::ShiftLeft => (0, FighterAction::Shield),
        KeyCode::ArrowLeft => (1, FighterAction::Left),
        KeyCode::ArrowRight => (1, FighterAction::Right),
        KeyCode::ArrowUp => (1, FighterAction::Up),
        KeyCode::ArrowDown => (1, FighterAction::Down),
        KeyCode::ShiftRight => (1, FighterAction::Shield),
        _ => return None,
    };
    Some(binding)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn effective_tick_rate(scene_override: Option<u32>, default_tps: u32) -> u32 {
    scene_override
        .filter(|value| *value > 0)
        .unwrap_or(default_tps)
        .max(1)
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn resolve_asset_root(configured: &Path) -> PathBuf {
    match env::var(ASSETS_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        Ok(_) | Err(env::VarError::NotPresent) => configured.to_path_buf(),
        Err(err) => {
            warn!(
                env_var = ASSETS_ENV_VAR,
                error = %err,
                "unable to read asset root env var; falling back to config"
            );
            configured.to_path_buf()
        }
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

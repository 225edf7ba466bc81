/// Terminal host for the wire3d geometry pipeline
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use log::{debug, warn};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use wire3d_core::{
    GeometryError, Mesh, MeshData, ObjectId, Pipeline, Registry, SceneConfig, SceneObject, Vec3,
};

pub mod commands;
pub mod renderer;

pub use commands::{execute as execute_command, parse_command, Command, CommandError};
pub use renderer::AsciiRenderer;

fn to_io(err: GeometryError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

/// Paces the main loop and samples the frame rate once per second
struct FrameClock {
    budget: Duration,
    started: Instant,
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FrameClock {
    fn new(target_fps: u32) -> Self {
        let now = Instant::now();
        Self {
            budget: Duration::from_secs(1) / target_fps.max(1),
            started: now,
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    fn begin(&mut self) {
        self.started = Instant::now();
    }

    fn finish(&mut self) {
        if let Some(rest) = self.budget.checked_sub(self.started.elapsed()) {
            std::thread::sleep(rest);
        }
        self.frames += 1;
        let window = self.window_start.elapsed();
        if window >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / window.as_secs_f32();
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}

/// Interactive wireframe viewer over a scene registry
pub struct TerminalApp {
    registry: Registry,
    pipeline: Pipeline,
    config: SceneConfig,
    selected: Option<ObjectId>,
    renderer: AsciiRenderer,
    /// Some while the `:` console is open
    console: Option<String>,
    status: String,
    spinning: bool,
    running: bool,
}

impl TerminalApp {
    /// Set up a scene with a camera and a demo cube sized to the terminal
    pub fn new(config: SceneConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let display = &config.display;

        let mut registry = Registry::new();
        let camera = config
            .camera
            .build(width as u32, height as u32)
            .map_err(to_io)?;
        registry.add(SceneObject::camera("camera", camera));

        let span_x = width as f64 * display.units_per_cell_x;
        let span_y = height as f64 * display.units_per_cell_y;
        let cube = Mesh::from_data(&MeshData::cube(span_x.min(span_y) / 3.0)).map_err(to_io)?;
        let cube = SceneObject::mesh("cube", cube)
            .with_origin(Vec3::new(span_x / 2.0, span_y / 2.0, 0.0))
            .and_then(|o| o.with_rotation(Vec3::new(0.3, 0.3, 0.0)))
            .map_err(to_io)?;
        let selected = Some(registry.add(cube));

        Ok(Self {
            registry,
            pipeline: Pipeline::new(),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            config,
            selected,
            console: None,
            status: String::new(),
            spinning: true,
            running: true,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let mut clock = FrameClock::new(self.config.display.target_fps);

        while self.running {
            clock.begin();
            while event::poll(Duration::ZERO)? {
                self.handle_input()?;
            }

            self.update();
            self.render(clock.fps())?;
            clock.finish();
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        match event::read()? {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                if self.console.is_some() {
                    self.handle_console_key(code);
                } else {
                    self.handle_view_key(code);
                }
            }
            Event::Resize(width, height) => {
                self.renderer = AsciiRenderer::new(width as usize, height as usize);
                if let Ok(id) = self.registry.id_of("camera") {
                    if let Ok(camera) = self.registry.camera_mut(id) {
                        let resized = camera
                            .set_width(width as f64)
                            .and_then(|_| camera.set_height(height as f64));
                        if let Err(err) = resized {
                            warn!("camera kept its old viewport: {err}");
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_view_key(&mut self, code: KeyCode) {
        let step = self.config.display.rotation_step;
        let delta = match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                return;
            }
            KeyCode::Char(':') => {
                self.console = Some(String::new());
                return;
            }
            KeyCode::Char(' ') => {
                self.spinning = !self.spinning;
                return;
            }
            KeyCode::Char('w') | KeyCode::Up => Vec3::new(step, 0.0, 0.0),
            KeyCode::Char('s') | KeyCode::Down => Vec3::new(-step, 0.0, 0.0),
            KeyCode::Char('a') | KeyCode::Left => Vec3::new(0.0, -step, 0.0),
            KeyCode::Char('d') | KeyCode::Right => Vec3::new(0.0, step, 0.0),
            KeyCode::Char('e') => Vec3::new(0.0, 0.0, step),
            KeyCode::Char('r') => Vec3::new(0.0, 0.0, -step),
            _ => return,
        };
        self.rotate_selected(&delta);
    }

    fn handle_console_key(&mut self, code: KeyCode) {
        let Some(line) = self.console.as_mut() else {
            return;
        };
        match code {
            KeyCode::Char(c) => line.push(c),
            KeyCode::Backspace => {
                line.pop();
            }
            KeyCode::Esc => self.console = None,
            KeyCode::Enter => {
                let line = self.console.take().unwrap_or_default();
                self.run_command(&line);
            }
            _ => {}
        }
    }

    /// Parse and apply one console line, leaving the outcome in the status bar
    pub fn run_command(&mut self, line: &str) {
        let outcome = parse_command(line).and_then(|command| {
            if command == Command::Quit {
                self.running = false;
            }
            execute_command(command, &mut self.registry, &mut self.selected)
        });
        self.status = match outcome {
            Ok(message) => message,
            Err(err) => {
                warn!("console command {line:?} failed: {err}");
                err.to_string()
            }
        };
    }

    fn rotate_selected(&mut self, delta: &Vec3) {
        let Some(id) = self.selected else {
            return;
        };
        if let Err(err) = self.registry.get_mut(id).and_then(|o| o.rotate(delta)) {
            warn!("cannot rotate {id}: {err}");
            self.selected = None;
        }
    }

    fn update(&mut self) {
        if self.spinning {
            self.rotate_selected(&Vec3::new(0.01, 0.015, 0.0));
        }
    }

    fn render(&mut self, fps: f32) -> io::Result<()> {
        let stats = self.pipeline.update(&mut self.registry).map_err(to_io)?;
        if stats.recomputed > 0 {
            debug!("frame: {stats:?}");
        }

        self.renderer.clear();
        for (id, frame) in self.pipeline.frames() {
            if let Ok(mesh) = self.registry.mesh(id) {
                self.renderer.render_object(mesh, frame, &self.config.display);
            }
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "wire3d | FPS: {:.1} | objects: {} | WASD/Arrows=Rotate E/R=Roll Space=Spin :=Console Q=Quit",
                fps,
                self.registry.count()
            )),
            ResetColor
        )?;

        let bottom = self.renderer.height().saturating_sub(1) as u16;
        let footer = match &self.console {
            Some(line) => format!(":{line}"),
            None => self.status.clone(),
        };
        queue!(
            stdout,
            cursor::MoveTo(0, bottom),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Cyan),
            Print(footer),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

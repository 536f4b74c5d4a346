//! Menu Demo: Components updating on their own threads.
//!
//! Demonstrates:
//! - A clock that redraws itself from its update thread
//! - Counters that take focus (Enter) and respond to keys while focused
//! - Selection cycling with Up/Down
//! - A Controller holding the engine
//!
//! Press ESC to exit. Logs go to `menu_demo.log`.

use renderlite::{
    CancelToken, Component, ComponentHandle, ComponentState, Controller, Engine, EngineConfig,
    InputMode, KeyBindings, KeyCode, Position, Rgb, Style, Surface,
};
use std::fs::File;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const HIGHLIGHT: Rgb = Rgb::new(255, 200, 80);
const MUTED: Rgb = Rgb::new(140, 140, 140);

/// Shows seconds since start, redrawn every 250ms.
struct Clock {
    started: Instant,
}

impl Component for Clock {
    fn draw(&self, surface: &mut dyn Surface, state: &ComponentState) {
        let pos = state.position();
        let elapsed = self.started.elapsed();
        surface.set_fg(MUTED);
        surface.print_at(
            pos.x,
            pos.y,
            &format!("uptime {:>4}.{}s", elapsed.as_secs(), elapsed.subsec_millis() / 100),
        );
        surface.reset_style();
    }

    fn update(&self, state: &ComponentState, cancel: &CancelToken) {
        while cancel.sleep(Duration::from_millis(250)) {
            state.mark_dirty();
        }
    }
}

/// A labelled number. Enter focuses it, `+`/`-` change it while focused,
/// `r` resets it while merely selected.
struct Counter {
    label: &'static str,
    value: Arc<AtomicI64>,
    bindings: KeyBindings,
}

impl Counter {
    fn new(label: &'static str) -> Self {
        let value = Arc::new(AtomicI64::new(0));
        let (inc, dec, reset) = (Arc::clone(&value), Arc::clone(&value), Arc::clone(&value));
        let bindings = KeyBindings::new()
            .on_selected(KeyCode::Char('r'), move |_| reset.store(0, Ordering::Relaxed))
            .on_focus(KeyCode::Char('+'), move |_| {
                inc.fetch_add(1, Ordering::Relaxed);
            })
            .on_focus(KeyCode::Char('-'), move |_| {
                dec.fetch_sub(1, Ordering::Relaxed);
            })
            .on_focus(KeyCode::Enter, |state| {
                state.set_in_focus(false);
            });

        Self {
            label,
            value,
            bindings,
        }
    }
}

impl Component for Counter {
    fn draw(&self, surface: &mut dyn Surface, state: &ComponentState) {
        let pos = state.position();
        let (selected, in_focus) = state.selection_flags();
        let marker = match (selected, in_focus) {
            (_, true) => "»",
            (true, false) => ">",
            _ => " ",
        };

        if selected {
            surface.set_fg(HIGHLIGHT);
        }
        if in_focus {
            surface.set_style(Style::BOLD);
        }
        surface.print_at(
            pos.x,
            pos.y,
            &format!("{marker} {:<8} {:>6}", self.label, self.value.load(Ordering::Relaxed)),
        );
        surface.reset_style();
    }

    fn key_bindings(&self) -> Option<&KeyBindings> {
        Some(&self.bindings)
    }

    fn name(&self) -> &str {
        self.label
    }
}

/// Static help line.
struct Help;

impl Component for Help {
    fn draw(&self, surface: &mut dyn Surface, state: &ComponentState) {
        let pos = state.position();
        surface.set_fg(MUTED);
        surface.print_at(pos.x, pos.y, "Up/Down select  Enter focus  +/- change  r reset  Esc quit");
        surface.reset_style();
    }
}

struct MenuController {
    base: Controller,
}

impl MenuController {
    fn populate(&self) -> Result<(), renderlite::EngineError> {
        let engine = self.base.engine();
        engine.add_component(&ComponentHandle::spawn(
            Counter::new("apples"),
            Position::new(2, 2),
            true,
        )?);
        engine.add_component(&ComponentHandle::spawn(
            Counter::new("pears"),
            Position::new(2, 3),
            true,
        )?);
        engine.add_component(&ComponentHandle::spawn(
            Counter::new("plums"),
            Position::new(2, 4),
            true,
        )?);
        engine.add_component(&ComponentHandle::spawn(
            Clock {
                started: Instant::now(),
            },
            Position::new(2, 6),
            false,
        )?);
        engine.add_component(&ComponentHandle::spawn(Help, Position::new(2, 8), false)?);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log = File::create("menu_demo.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("renderlite=debug")),
        )
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let engine = Engine::stdout(EngineConfig {
        target_fps: 60,
        viewport_size: Some((80, 12)),
        input_mode: InputMode::EngineOwned,
        ..EngineConfig::default()
    })?;

    let controller = MenuController {
        base: Controller::new(&engine),
    };
    controller.populate()?;

    engine.begin()?;
    engine.wait();
    engine.dispose();

    let stats = engine.render_stats();
    println!(
        "Rendered {} frames ({} full refreshes, {} draws), avg {}us/frame",
        stats.frames, stats.full_refreshes, stats.components_drawn, stats.avg_frame_us
    );
    Ok(())
}

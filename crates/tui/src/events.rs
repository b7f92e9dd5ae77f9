use std::io::Write;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, MouseEventKind},
    execute,
    terminal::SetTitle,
};
use ratatui::{backend::Backend, Terminal};

use crate::{
    app::{notify::TerminalEffect, App},
    ui,
};

pub fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let mut last_draw = Instant::now();
    let heartbeat = Duration::from_millis(500);
    loop {
        apply_effects(app.take_effects());
        if app.dirty || last_draw.elapsed() >= heartbeat {
            terminal.draw(|f| ui::draw(f, app))?;
            app.dirty = false;
            last_draw = Instant::now();
        }

        let wait = app.idle_due_in().min(Duration::from_millis(50));
        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) => app.on_key(key),
                Event::Paste(s) => app.on_paste(&s),
                Event::FocusGained => app.on_focus_change(true),
                Event::FocusLost => app.on_focus_change(false),
                Event::Resize(_, _) => app.dirty = true,
                Event::Mouse(me) => {
                    let inside = app.output_area.is_some_and(|area| {
                        me.column >= area.x
                            && me.column < area.x + area.width
                            && me.row >= area.y
                            && me.row < area.y + area.height
                    });
                    if inside {
                        match me.kind {
                            MouseEventKind::ScrollUp => app.scroll_output_up(3),
                            MouseEventKind::ScrollDown => app.scroll_output_down(3),
                            _ => {}
                        }
                    }
                }
            }
        }

        app.on_tick();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn apply_effects(effects: Vec<TerminalEffect>) {
    let mut out = std::io::stdout();
    for effect in effects {
        let _ = match effect {
            TerminalEffect::SetTitle(t) => execute!(out, SetTitle(t)),
            TerminalEffect::Bell => out.write_all(b"\x07").and_then(|_| out.flush()),
        };
    }
}

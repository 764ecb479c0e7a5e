use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane, Popup};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply { pending, content } => app.receive_reply(pending, content),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any mode
    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.popup != Popup::None {
        handle_popup(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('n') if ctrl => {
            app.new_chat();
            return;
        }
        KeyCode::Char('t') if ctrl => {
            app.cycle_theme();
            return;
        }
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return;
        }
        KeyCode::BackTab => {
            app.focus = app.focus.prev();
            return;
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Composer => handle_composer(app, key),
        FocusPane::Sidebar => handle_sidebar(app, key),
        FocusPane::Suggestions => handle_suggestions(app, key),
    }
}

fn handle_popup(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.accept_popup(),
        KeyCode::Char('n') | KeyCode::Esc => app.dismiss_popup(),
        _ => {}
    }
}

fn handle_composer(app: &mut App, key: KeyEvent) {
    match key.code {
        // Enter without a modifier sends, Shift/Alt+Enter breaks the line
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.composer.newline();
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Esc => app.focus = FocusPane::Sidebar,
        KeyCode::Backspace => app.composer.backspace(),
        KeyCode::Delete => app.composer.delete(),
        KeyCode::Left => app.composer.move_left(),
        KeyCode::Right => app.composer.move_right(),
        KeyCode::Home => app.composer.move_home(),
        KeyCode::End => app.composer.move_end(),
        KeyCode::PageUp => app.scroll_up(5),
        KeyCode::PageDown => app.scroll_down(5),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.composer.insert(c);
        }
        _ => {}
    }
}

fn handle_sidebar(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.sidebar_down(),
        KeyCode::Char('k') | KeyCode::Up => app.sidebar_up(),
        KeyCode::Enter | KeyCode::Char('l') => {
            app.select_highlighted();
            app.focus = FocusPane::Composer;
        }
        KeyCode::Char('d') | KeyCode::Delete => app.confirm_delete_highlighted(),
        KeyCode::Char('n') => app.new_chat(),
        KeyCode::Char('i') | KeyCode::Esc => app.focus = FocusPane::Composer,
        _ => {}
    }
}

fn handle_suggestions(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('l') | KeyCode::Right => app.suggestion_next(),
        KeyCode::Char('h') | KeyCode::Left => app.suggestion_prev(),
        KeyCode::Enter => app.apply_suggestion(),
        KeyCode::Esc => app.focus = FocusPane::Composer,
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Determine which area the mouse is in (position-based scrolling)
    let in_sidebar = app.sidebar_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_transcript = app.transcript_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_transcript {
                app.scroll_down(3);
            } else if in_sidebar {
                app.sidebar_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_transcript {
                app.scroll_up(3);
            } else if in_sidebar {
                app.sidebar_up();
            }
        }
        _ => {}
    }
}

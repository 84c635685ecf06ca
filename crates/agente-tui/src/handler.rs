use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The clear-history confirmation swallows the next key
    if app.confirm_clear {
        if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('s')) {
            app.clear_chat_history();
        } else {
            app.confirm_clear = false;
        }
        return;
    }

    match (app.screen, app.input_mode) {
        (Screen::Auth, _) => handle_auth(app, key),
        (Screen::Dashboard, _) => handle_dashboard(app, key),
        (Screen::Ebook, _) => handle_ebook(app, key),
        (Screen::Chat, InputMode::Normal) => handle_chat_normal(app, key),
        (Screen::Chat, InputMode::Editing) => handle_chat_editing(app, key),
    }
}

fn handle_auth(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit_login(),
        _ => edit_line(&mut app.name_input, &mut app.name_cursor, key),
    }
}

/// Keys shared by the screens you reach after logging in
fn handle_common(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('L') => app.logout(),
        KeyCode::Char('p') => app.toggle_podcast(),
        KeyCode::Char('1') | KeyCode::Char('d') => app.open_dashboard(),
        KeyCode::Char('2') | KeyCode::Char('a') => app.open_chat(),
        KeyCode::Char('3') | KeyCode::Char('e') => app.open_ebook(),
        _ => return false,
    }
    true
}

fn handle_dashboard(app: &mut App, key: KeyEvent) {
    if handle_common(app, key) {
        return;
    }
    match key.code {
        KeyCode::Tab
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::Char('h')
        | KeyCode::Char('l') => app.toggle_dashboard_card(),
        KeyCode::Enter => app.open_selected_card(),
        _ => {}
    }
}

fn handle_ebook(app: &mut App, key: KeyEvent) {
    if handle_common(app, key) {
        return;
    }
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.chapter_down(),
        KeyCode::Char('k') | KeyCode::Up => app.chapter_up(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_chapter(),
        KeyCode::Char('J') | KeyCode::PageDown => {
            for _ in 0..5 {
                app.ebook_scroll_down();
            }
        }
        KeyCode::Char('K') | KeyCode::PageUp => {
            for _ in 0..5 {
                app.ebook_scroll_up();
            }
        }
        KeyCode::Esc => app.open_dashboard(),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('l') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.confirm_clear = true;
        return;
    }
    if handle_common(app, key) {
        return;
    }
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('x') => app.confirm_clear = true,
        KeyCode::Char('j') | KeyCode::Down => app.chat_scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.chat_scroll_up(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,
        KeyCode::Esc => app.open_dashboard(),
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('l') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.confirm_clear = true;
        return;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.send_chat(),
        KeyCode::Up => app.chat_scroll_up(),
        KeyCode::Down => app.chat_scroll_down(),
        _ => edit_line(&mut app.chat_input, &mut app.chat_cursor, key),
    }
}

/// Single-line text editing with a char-indexed cursor
fn edit_line(input: &mut String, cursor: &mut usize, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            *cursor = (*cursor + 1).min(input.chars().count());
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match (mouse.kind, app.screen) {
        (MouseEventKind::ScrollDown, Screen::Chat) => app.chat_scroll_down(),
        (MouseEventKind::ScrollUp, Screen::Chat) => app.chat_scroll_up(),
        (MouseEventKind::ScrollDown, Screen::Ebook) => app.ebook_scroll_down(),
        (MouseEventKind::ScrollUp, Screen::Ebook) => app.ebook_scroll_up(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "ação";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[test]
    fn test_edit_line_inserts_and_deletes_utf8() {
        let mut input = String::new();
        let mut cursor = 0;
        for c in "olá".chars() {
            edit_line(&mut input, &mut cursor, key(KeyCode::Char(c)));
        }
        assert_eq!(input, "olá");
        assert_eq!(cursor, 3);

        edit_line(&mut input, &mut cursor, key(KeyCode::Left));
        edit_line(&mut input, &mut cursor, key(KeyCode::Backspace));
        assert_eq!(input, "oá");
        assert_eq!(cursor, 1);

        edit_line(&mut input, &mut cursor, key(KeyCode::Delete));
        assert_eq!(input, "o");
    }
}

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl combos first, so they never fall through to text input
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('d') => app.scroll_half_page_down(),
            KeyCode::Char('u') => app.scroll_half_page_up(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // The in-flight guard lives in send_question: Enter while a
        // request is outstanding is a no-op
        KeyCode::Enter => app.send_question(),

        // Chat scrollback
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),

        // Input editing
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_down();
            app.scroll_down();
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_up();
            app.scroll_up();
            app.scroll_up();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentClient;
    use crate::app::SessionPhase;

    fn test_app() -> App {
        App::new(AgentClient::new("http://127.0.0.1:9"))
    }

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "aé日b";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 1);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 3), 6);
        assert_eq!(char_to_byte_index(s, 4), s.len());
        // Past the end clamps to len
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[test]
    fn test_typing_inserts_at_cursor() {
        let mut app = test_app();
        handle_event(&mut app, press(KeyCode::Char('h')));
        handle_event(&mut app, press(KeyCode::Char('i')));
        handle_event(&mut app, press(KeyCode::Left));
        handle_event(&mut app, press(KeyCode::Char('é')));

        assert_eq!(app.input, "héi");
        assert_eq!(app.cursor, 2);
    }

    #[test]
    fn test_backspace_and_delete_multibyte() {
        let mut app = test_app();
        app.input = "a日b".to_string();
        app.cursor = 2;

        handle_event(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.input, "ab");
        assert_eq!(app.cursor, 1);

        handle_event(&mut app, press(KeyCode::Delete));
        assert_eq!(app.input, "a");
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn test_home_and_end() {
        let mut app = test_app();
        app.input = "hello".to_string();
        app.cursor = 2;

        handle_event(&mut app, press(KeyCode::End));
        assert_eq!(app.cursor, 5);
        handle_event(&mut app, press(KeyCode::Home));
        assert_eq!(app.cursor, 0);
    }

    #[tokio::test]
    async fn test_enter_sends_question() {
        let mut app = test_app();
        app.input = "What is Segment?".to_string();
        app.cursor = app.input.chars().count();

        handle_event(&mut app, press(KeyCode::Enter));

        assert_eq!(app.phase, SessionPhase::AwaitingResponse);
        assert_eq!(app.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_rapid_enter_issues_one_request() {
        let mut app = test_app();
        app.input = "question".to_string();

        handle_event(&mut app, press(KeyCode::Enter));
        app.input = "another".to_string();
        handle_event(&mut app, press(KeyCode::Enter));
        handle_event(&mut app, press(KeyCode::Enter));

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.phase, SessionPhase::AwaitingResponse);
    }

    #[tokio::test]
    async fn test_typing_still_works_while_awaiting() {
        let mut app = test_app();
        app.input = "question".to_string();
        handle_event(&mut app, press(KeyCode::Enter));

        handle_event(&mut app, press(KeyCode::Char('n')));
        assert_eq!(app.input, "n");
    }

    #[test]
    fn test_ctrl_c_and_esc_quit() {
        let mut app = test_app();
        handle_event(&mut app, ctrl('c'));
        assert!(app.should_quit);

        let mut app = test_app();
        handle_event(&mut app, press(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_combo_does_not_insert_text() {
        let mut app = test_app();
        handle_event(&mut app, ctrl('d'));
        handle_event(&mut app, ctrl('u'));
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_tick_advances_animation_only_while_awaiting() {
        let mut app = test_app();
        handle_event(&mut app, AppEvent::Tick);
        assert_eq!(app.animation_frame, 0);

        app.phase = SessionPhase::AwaitingResponse;
        handle_event(&mut app, AppEvent::Tick);
        assert_eq!(app.animation_frame, 1);
    }

    #[test]
    fn test_scroll_keys() {
        let mut app = test_app();
        app.chat_height = 2;
        app.chat_width = 80;
        for i in 0..5 {
            app.push_message(crate::app::ChatMessage::bot(format!("msg {}", i)));
        }
        let bottom = app.chat_scroll;
        assert!(bottom > 0);

        handle_event(&mut app, press(KeyCode::Up));
        assert_eq!(app.chat_scroll, bottom - 1);
        handle_event(&mut app, press(KeyCode::Down));
        assert_eq!(app.chat_scroll, bottom);
        // Clamped at the bottom
        handle_event(&mut app, press(KeyCode::Down));
        assert_eq!(app.chat_scroll, bottom);
    }
}

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, Dialog, InputMode, SystemEditorState};
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
        AppEvent::Key(key) => handle_key(app, key)?,
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick();
        }
        AppEvent::Dictation(transcript) => {
            app.dictation_result(transcript);
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // Modal overlays swallow all input while open
    if app.dialog.is_some() {
        handle_dialog(app, key);
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_dialog(app: &mut App, key: KeyEvent) {
    match app.dialog.as_mut() {
        Some(Dialog::Error(_)) | Some(Dialog::Notice(_)) => match key.code {
            KeyCode::Enter | KeyCode::Esc => app.dismiss_dialog(),
            _ => {}
        },
        Some(Dialog::Confirm(_)) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_command(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.dismiss_dialog(),
            _ => {}
        },
        Some(Dialog::System(editor)) => {
            // Only the Editing state accepts text; Loading/Saving just allow
            // cancellation.
            if editor.state != SystemEditorState::Editing {
                if key.code == KeyCode::Esc {
                    app.dismiss_dialog();
                }
                return;
            }

            match key.code {
                KeyCode::Esc => app.dismiss_dialog(),
                KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.save_system_editor();
                }
                KeyCode::Enter => {
                    let byte_pos = char_to_byte_index(&editor.content, editor.cursor);
                    editor.content.insert(byte_pos, '\n');
                    editor.cursor += 1;
                }
                KeyCode::Backspace => {
                    if editor.cursor > 0 {
                        editor.cursor -= 1;
                        let byte_pos = char_to_byte_index(&editor.content, editor.cursor);
                        editor.content.remove(byte_pos);
                    }
                }
                KeyCode::Delete => {
                    let char_count = editor.content.chars().count();
                    if editor.cursor < char_count {
                        let byte_pos = char_to_byte_index(&editor.content, editor.cursor);
                        editor.content.remove(byte_pos);
                    }
                }
                KeyCode::Left => {
                    editor.cursor = editor.cursor.saturating_sub(1);
                }
                KeyCode::Right => {
                    let char_count = editor.content.chars().count();
                    editor.cursor = (editor.cursor + 1).min(char_count);
                }
                KeyCode::Home => {
                    editor.cursor = 0;
                }
                KeyCode::End => {
                    editor.cursor = editor.content.chars().count();
                }
                KeyCode::Char(c) => {
                    let byte_pos = char_to_byte_index(&editor.content, editor.cursor);
                    editor.content.insert(byte_pos, c);
                    editor.cursor += 1;
                }
                _ => {}
            }
        }
        None => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Focus the input line
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.cursor = app.input.chars().count();
        }

        // Cycle the action selector
        KeyCode::Tab => app.action = app.action.next(),

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.transcript_scroll = 0,
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Voice input; inert when the capability is unavailable
        KeyCode::Char('v') => app.start_dictation(),

        // Session commands, gated behind confirmation
        KeyCode::Char('r') => app.request_command("reset"),
        KeyCode::Char('a') => app.request_command("archive"),

        // System prompt editor
        KeyCode::Char('S') => app.open_system_editor(),

        // Copy affordances for rendered code blocks
        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as usize) - ('1' as usize);
            app.copy_code_block(index);
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Tab => app.action = app.action.next(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Author, SessionCommand};
    use crate::bridge::HostBridge;
    use crate::config::Config;
    use std::sync::Arc;

    fn test_app() -> App {
        let (bridge, _rx) = HostBridge::new(["dictation", "session"]);
        App::new(&Config::new(), Arc::new(bridge), None)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typed_characters_land_at_the_cursor() {
        let mut app = test_app();
        app.input_mode = InputMode::Editing;

        for c in "héllo".chars() {
            handle_key(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        handle_key(&mut app, press(KeyCode::Left)).unwrap();
        handle_key(&mut app, press(KeyCode::Backspace)).unwrap();

        assert_eq!(app.input, "hélo");
        assert_eq!(app.cursor, 3);
    }

    #[tokio::test]
    async fn enter_in_editing_mode_submits() {
        let mut app = test_app();
        app.input_mode = InputMode::Editing;
        app.input = "hello".into();
        app.cursor = 5;

        handle_key(&mut app, press(KeyCode::Enter)).unwrap();

        assert_eq!(app.transcript.len(), 1);
        assert_eq!(app.transcript[0].author, Author::User);
        assert!(app.typing);
        assert!(app.input.is_empty());
    }

    #[test]
    fn command_keys_open_the_confirmation_gate() {
        let mut app = test_app();
        handle_key(&mut app, press(KeyCode::Char('r'))).unwrap();
        assert_eq!(app.dialog, Some(Dialog::Confirm(SessionCommand::Reset)));

        // Declining leaves no trace.
        handle_key(&mut app, press(KeyCode::Char('n'))).unwrap();
        assert!(app.dialog.is_none());
        assert!(!app.typing);
    }

    #[tokio::test]
    async fn confirming_with_y_dispatches_the_command() {
        let mut app = test_app();
        handle_key(&mut app, press(KeyCode::Char('a'))).unwrap();
        handle_key(&mut app, press(KeyCode::Char('y'))).unwrap();
        assert!(app.typing);
        assert!(app.dialog.is_none());
    }

    #[test]
    fn dialog_swallows_ordinary_keys() {
        let mut app = test_app();
        app.dialog = Some(Dialog::Error("boom".into()));

        handle_key(&mut app, press(KeyCode::Char('q'))).unwrap();
        assert!(!app.should_quit);

        handle_key(&mut app, press(KeyCode::Enter)).unwrap();
        assert!(app.dialog.is_none());
    }

    #[test]
    fn dictation_event_releases_busy_and_submits() {
        // Without a runtime the submit path would spawn; use an empty
        // transcript to exercise only the release path here.
        let mut app = test_app();
        app.dictation_busy = true;
        handle_event(&mut app, AppEvent::Dictation(String::new())).unwrap();
        assert!(!app.dictation_busy);
    }

    #[test]
    fn voice_key_is_inert_without_the_capability() {
        let mut app = test_app();
        assert!(!app.dictation_available());
        handle_key(&mut app, press(KeyCode::Char('v'))).unwrap();
        assert!(!app.dictation_busy);
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn tab_cycles_the_action_selector() {
        let mut app = test_app();
        let first = app.action;
        handle_key(&mut app, press(KeyCode::Tab)).unwrap();
        assert_ne!(app.action, first);
    }

    #[test]
    fn system_editor_accepts_multiline_text() {
        let mut app = test_app();
        app.dialog = Some(Dialog::System(crate::app::SystemEditor {
            content: String::new(),
            cursor: 0,
            state: SystemEditorState::Editing,
        }));

        handle_key(&mut app, press(KeyCode::Char('a'))).unwrap();
        handle_key(&mut app, press(KeyCode::Enter)).unwrap();
        handle_key(&mut app, press(KeyCode::Char('b'))).unwrap();

        match &app.dialog {
            Some(Dialog::System(editor)) => {
                assert_eq!(editor.content, "a\nb");
                assert_eq!(editor.cursor, 3);
            }
            other => panic!("expected system editor, got {other:?}"),
        }
    }
}

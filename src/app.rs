use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bridge::HostBridge;
use crate::client::{BackendClient, MessageResponse, SystemContent, SystemSaved};
use crate::clipboard::CopyButtons;
use crate::config::Config;
use crate::dictation::DictationEngine;
use crate::error::ChatError;
use crate::markdown::{self, CodeBlock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Bot,
}

/// One transcript entry. Entries are append-only and never edited.
#[derive(Debug, Clone)]
pub struct Message {
    pub author: Author,
    pub text: String,
}

/// Mode value sent verbatim alongside each user message. The backend owns
/// its semantics; the client only carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Chat,
    Summarize,
    Query,
    Url,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Summarize => "summarize",
            Self::Query => "query",
            Self::Url => "url",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "chat" => Some(Self::Chat),
            "summarize" => Some(Self::Summarize),
            "query" => Some(Self::Query),
            "url" => Some(Self::Url),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Chat => Self::Summarize,
            Self::Summarize => Self::Query,
            Self::Query => Self::Url,
            Self::Url => Self::Chat,
        }
    }
}

/// Out-of-band session commands. Anything outside this set is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Reset,
    Archive,
}

impl SessionCommand {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "reset" => Some(Self::Reset),
            "archive" => Some(Self::Archive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Archive => "archive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEditorState {
    Loading,
    Editing,
    Saving,
}

/// System prompt editor overlay state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEditor {
    pub content: String,
    pub cursor: usize,
    pub state: SystemEditorState,
}

/// Modal overlays. Each blocks interaction until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// Backend-reported error, shown instead of a transcript entry.
    Error(String),
    /// Informational status, e.g. the system-save response message.
    Notice(String),
    /// Confirmation gate in front of a session command.
    Confirm(SessionCommand),
    System(SystemEditor),
}

struct PendingRequest {
    seq: u64,
    handle: JoinHandle<Result<MessageResponse, ChatError>>,
}

enum SystemTask {
    Load(JoinHandle<Result<SystemContent, ChatError>>),
    Save(JoinHandle<Result<SystemSaved, ChatError>>),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Transcript state
    pub transcript: Vec<Message>,
    pub typing: bool,
    pub transcript_scroll: u16,
    pub transcript_height: u16, // inner height, updated during render
    pub transcript_width: u16,  // inner width, for wrap calculations
    pub animation_frame: u8,    // 0-2 for the typing dots

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars
    pub action: Action,

    // Copy affordances, one per closed code block across the transcript
    pub code_blocks: Vec<CodeBlock>,
    pub copy_buttons: CopyButtons,

    pub dialog: Option<Dialog>,

    // Collaborators
    pub client: BackendClient,
    pub bridge: Arc<HostBridge>,
    pub dictation: Option<Arc<DictationEngine>>,
    pub dictation_busy: bool,

    // In-flight work
    pending: Option<PendingRequest>,
    request_seq: u64,
    system_task: Option<SystemTask>,
}

impl App {
    pub fn new(
        config: &Config,
        bridge: Arc<HostBridge>,
        dictation: Option<Arc<DictationEngine>>,
    ) -> Self {
        let action = config
            .default_action
            .as_deref()
            .and_then(Action::parse)
            .unwrap_or(Action::Chat);

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            transcript: Vec::new(),
            typing: false,
            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,
            animation_frame: 0,

            input: String::new(),
            cursor: 0,
            action,

            code_blocks: Vec::new(),
            copy_buttons: CopyButtons::new(),

            dialog: None,

            client: BackendClient::new(config.server_url()),
            bridge,
            dictation,
            dictation_busy: false,

            pending: None,
            request_seq: 0,
            system_task: None,
        }
    }

    // Transcript view

    /// Append one entry and keep the view pinned to the bottom.
    pub fn append_message(&mut self, author: Author, text: impl Into<String>) {
        let text = text.into();
        if author == Author::Bot {
            let rendered = markdown::render(&text);
            self.code_blocks.extend(rendered.code_blocks);
        }
        self.transcript.push(Message { author, text });
        self.scroll_to_bottom();
    }

    pub fn show_typing_indicator(&mut self) {
        self.typing = true;
        self.scroll_to_bottom();
    }

    /// No-op when the indicator is already hidden.
    pub fn hide_typing_indicator(&mut self) {
        self.typing = false;
    }

    /// Advance animation timers. The dot animation steps even while no
    /// placeholder is shown; that is a harmless no-op against an empty view.
    pub fn tick(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;
        self.copy_buttons.tick();
    }

    /// Total transcript lines as drawn, using the same wrap arithmetic as
    /// the renderer: label line + wrapped content lines + one blank line per
    /// message, plus two lines for the typing placeholder.
    pub fn transcript_line_count(&self) -> u16 {
        let wrap_width = if self.transcript_width > 0 {
            self.transcript_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in &self.transcript {
            total_lines += 1; // label line ("You" / "Bot")
            for segment in markdown::render(&msg.text).segments {
                let text = match segment {
                    markdown::Segment::Text(line) | markdown::Segment::CodeLine(line) => line,
                    markdown::Segment::CodeStart { language } => language,
                    markdown::Segment::CodeEnd { .. } => String::new(),
                };
                // Character count, not byte length, for UTF-8 safety.
                let char_count = text.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // blank line after message
        }

        if self.typing {
            total_lines += 2; // label + animated dots
        }

        total_lines
    }

    pub fn scroll_to_bottom(&mut self) {
        let visible_height = if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        };
        let total_lines = self.transcript_line_count();
        self.transcript_scroll = total_lines.saturating_sub(visible_height);
    }

    pub fn scroll_up(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self
            .transcript_line_count()
            .saturating_sub(self.transcript_height.max(1));
        if self.transcript_scroll < max {
            self.transcript_scroll += 1;
        }
    }

    // Input controller

    /// The single submit path shared by typed and dictated input.
    pub fn submit(&mut self) {
        if self.input.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.input);
        self.cursor = 0;

        self.append_message(Author::User, text.clone());
        self.show_typing_indicator();
        self.dispatch(text, self.action.as_str().to_string());
    }

    /// Dictation result: fill the input field, then drive the same submit
    /// path as typed text.
    pub fn dictation_result(&mut self, transcript: String) {
        self.dictation_busy = false;
        if transcript.is_empty() {
            return;
        }
        self.cursor = transcript.chars().count();
        self.input = transcript;
        self.submit();
    }

    pub fn dictation_available(&self) -> bool {
        self.dictation.is_some()
    }

    /// Kick off the dictation helper. Inert when the capability is absent.
    pub fn start_dictation(&mut self) {
        let Some(engine) = self.dictation.clone() else {
            return;
        };
        if self.dictation_busy {
            return;
        }
        self.dictation_busy = true;

        let bridge = self.bridge.clone();
        tokio::spawn(async move {
            match engine.listen().await {
                // Delivered over the bridge; the UI listener feeds it back
                // into the event loop.
                Ok(text) => bridge.emit("dictation", &[json!(text)]),
                Err(e) => {
                    warn!("dictation failed: {e}");
                    // Empty delivery releases the busy flag without
                    // touching the input field.
                    bridge.emit("dictation", &[]);
                }
            }
        });
    }

    // Message dispatcher

    /// Issue the backend request for one turn. A newer dispatch supersedes
    /// any in-flight one: the old generation's response is dropped, never
    /// applied over newer transcript state.
    pub fn dispatch(&mut self, input: String, action: String) {
        self.request_seq += 1;
        let seq = self.request_seq;
        let client = self.client.clone();
        debug!("dispatching request {seq} (action: {action})");

        let handle = tokio::spawn(async move { client.send_message(&input, &action).await });
        self.pending = Some(PendingRequest { seq, handle });
    }

    /// Route a finished request into the transcript view.
    fn apply_response(&mut self, seq: u64, outcome: Result<MessageResponse, ChatError>) {
        if seq != self.request_seq {
            debug!("dropping stale response for request {seq}");
            return;
        }

        match outcome {
            Ok(resp) if resp.is_error() => {
                self.hide_typing_indicator();
                self.dialog = Some(Dialog::Error(resp.response));
            }
            Ok(resp) => {
                self.hide_typing_indicator();
                self.append_message(Author::Bot, resp.response);
            }
            Err(e) => {
                // Transport failures are diagnostic-only: the placeholder
                // stays and no dialog is raised.
                warn!("message request failed: {e}");
            }
        }
    }

    /// Check in-flight work without blocking. Called once per loop turn.
    pub async fn poll(&mut self) {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.handle.is_finished())
        {
            if let Some(p) = self.pending.take() {
                match p.handle.await {
                    Ok(outcome) => self.apply_response(p.seq, outcome),
                    Err(e) => warn!("request task failed: {e}"),
                }
            }
        }

        let finished = match &self.system_task {
            Some(SystemTask::Load(h)) => h.is_finished(),
            Some(SystemTask::Save(h)) => h.is_finished(),
            None => false,
        };
        if finished {
            if let Some(task) = self.system_task.take() {
                self.apply_system_task(task).await;
            }
        }
    }

    // Session command sender

    /// Gate a session command behind confirmation. Unknown commands are
    /// silently ignored.
    pub fn request_command(&mut self, raw: &str) {
        if let Some(command) = SessionCommand::parse(raw) {
            self.dialog = Some(Dialog::Confirm(command));
        }
    }

    /// The user confirmed: announce to the host, then dispatch the command
    /// through the regular message path with empty user text.
    pub fn confirm_command(&mut self) {
        let command = match self.dialog {
            Some(Dialog::Confirm(command)) => command,
            _ => return,
        };
        self.dialog = None;

        if let Err(e) = self
            .bridge
            .send("session", vec![json!({ "command": command.as_str() })])
        {
            warn!("session announcement failed: {e}");
        }

        self.show_typing_indicator();
        self.dispatch(String::new(), command.as_str().to_string());
    }

    pub fn dismiss_dialog(&mut self) {
        self.dialog = None;
    }

    // System prompt editor

    /// Open the editor and fetch the current system prompt.
    pub fn open_system_editor(&mut self) {
        self.dialog = Some(Dialog::System(SystemEditor {
            content: String::new(),
            cursor: 0,
            state: SystemEditorState::Loading,
        }));

        let client = self.client.clone();
        self.system_task = Some(SystemTask::Load(tokio::spawn(async move {
            client.get_system().await
        })));
    }

    /// Save the edited system prompt.
    pub fn save_system_editor(&mut self) {
        let Some(Dialog::System(editor)) = &mut self.dialog else {
            return;
        };
        if editor.state != SystemEditorState::Editing {
            return;
        }
        editor.state = SystemEditorState::Saving;

        let content = editor.content.clone();
        let client = self.client.clone();
        self.system_task = Some(SystemTask::Save(tokio::spawn(async move {
            client.set_system(&content).await
        })));
    }

    async fn apply_system_task(&mut self, task: SystemTask) {
        match task {
            SystemTask::Load(handle) => match handle.await {
                Ok(Ok(system)) => {
                    if let Some(Dialog::System(editor)) = &mut self.dialog {
                        editor.cursor = system.content.chars().count();
                        editor.content = system.content;
                        editor.state = SystemEditorState::Editing;
                    }
                }
                Ok(Err(e)) => {
                    warn!("failed to load system prompt: {e}");
                    if matches!(self.dialog, Some(Dialog::System(_))) {
                        self.dialog = None;
                    }
                }
                Err(e) => warn!("system load task failed: {e}"),
            },
            SystemTask::Save(handle) => match handle.await {
                Ok(Ok(saved)) => {
                    // Status message replaces the editor, like the original
                    // alert-then-close flow.
                    self.dialog = Some(Dialog::Notice(saved.message));
                }
                Ok(Err(e)) => {
                    warn!("failed to save system prompt: {e}");
                    if let Some(Dialog::System(editor)) = &mut self.dialog {
                        editor.state = SystemEditorState::Editing;
                    }
                }
                Err(e) => warn!("system save task failed: {e}"),
            },
        }
    }

    // Clipboard helper

    /// Copy the code block behind affordance `index`.
    pub fn copy_code_block(&mut self, index: usize) {
        if let Some(block) = self.code_blocks.get(index) {
            let body = block.body.clone();
            self.copy_buttons.copy(index, &body);
        }
    }
}

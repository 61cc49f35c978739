//! Fence-aware renderer for bot responses.
//!
//! Bot text is plain UTF-8 that may contain triple-backtick fenced code
//! blocks. A line *starting* with the fence token toggles code mode; text
//! after the opening fence on the same line is a free-form language tag.
//! Every line maps to exactly one segment, inside or outside a block, so
//! joining segments in order reproduces the message line for line.
//!
//! An odd number of fence lines leaves the final block open: no closing
//! segment and no copy affordance are emitted for it, and `unterminated`
//! reports the condition. Callers render the trailing lines in code style
//! rather than repairing the input.

/// The code-fence token. Only recognized at the start of a line.
pub const FENCE: &str = "```";

/// One renderable line of a bot message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A line outside any code block.
    Text(String),
    /// Opening fence line, replaced by a block header.
    CodeStart { language: String },
    /// A line inside a code block.
    CodeLine(String),
    /// Closing fence line, replaced by the copy affordance for block
    /// `copy_index`.
    CodeEnd { copy_index: usize },
}

/// A closed code block, collected for the clipboard helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub body: String,
}

/// Result of rendering one bot message.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub segments: Vec<Segment>,
    /// Closed blocks in order of appearance. An unterminated trailing block
    /// is not collected; it has no copy affordance.
    pub code_blocks: Vec<CodeBlock>,
    /// True when the input ended while still inside a code block.
    pub unterminated: bool,
}

/// Scan `text` into segments, toggling code mode on fence lines.
pub fn render(text: &str) -> Rendered {
    let mut segments = Vec::new();
    let mut code_blocks: Vec<CodeBlock> = Vec::new();
    let mut in_code = false;
    let mut language = String::new();
    let mut body: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if let Some(rest) = line.strip_prefix(FENCE) {
            if in_code {
                let copy_index = code_blocks.len();
                code_blocks.push(CodeBlock {
                    language: std::mem::take(&mut language),
                    body: body.join("\n"),
                });
                body.clear();
                segments.push(Segment::CodeEnd { copy_index });
                in_code = false;
            } else {
                language = rest.to_string();
                segments.push(Segment::CodeStart {
                    language: language.clone(),
                });
                in_code = true;
            }
        } else if in_code {
            body.push(line);
            segments.push(Segment::CodeLine(line.to_string()));
        } else {
            segments.push(Segment::Text(line.to_string()));
        }
    }

    Rendered {
        segments,
        code_blocks,
        unterminated: in_code,
    }
}

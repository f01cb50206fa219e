//! Extraction of a payload from model output that may be wrapped in a
//! Markdown code fence.

/// Parser position while scanning lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    /// No opening fence seen yet
    Prelude,
    /// Inside the fenced block
    Body,
    /// Closing fence seen; remaining lines are ignored
    Closed,
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Return the contents of the first fenced block, or the whole trimmed text
/// when there is no fence. An unterminated fence runs to the end of input.
pub fn extract_payload(text: &str) -> &str {
    let mut state = FenceState::Prelude;
    let mut start = None;
    let mut end = text.len();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        match state {
            FenceState::Prelude if is_fence(line) => {
                state = FenceState::Body;
                start = Some(offset);
            }
            FenceState::Prelude => {}
            FenceState::Body if is_fence(line) => {
                state = FenceState::Closed;
                end = line_start;
            }
            FenceState::Body => {}
            FenceState::Closed => break,
        }
    }

    match start {
        Some(start) if start <= end => text[start..end].trim(),
        Some(_) => "",
        None => text.trim(),
    }
}

const MAX_PREVIEW_LENGTH: usize = 200;
const MAX_ERROR_LENGTH: usize = 2_000;

/// Cut `text` to at most `max` bytes without splitting a character.
fn clip(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Single-line preview of an extracted value for console output.
pub fn truncate_preview(value: &str) -> String {
    let flat: String = value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let clipped = clip(&flat, MAX_PREVIEW_LENGTH);
    if clipped.len() < flat.len() {
        format!("{}... [{} chars]", clipped, flat.chars().count())
    } else {
        flat
    }
}

pub fn truncate_error(error: &str) -> String {
    let clipped = clip(error, MAX_ERROR_LENGTH);
    if clipped.len() < error.len() {
        format!("{}...", clipped)
    } else {
        error.to_string()
    }
}

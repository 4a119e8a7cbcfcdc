//! Top-level splitting of attribute and argument lists

/// Split `text` on `delimiter`, ignoring delimiters nested inside `[]`, `()`
/// or `<>`. Bracket balance is not validated; unbalanced input gives a
/// best-effort split. A trailing empty part is dropped.
pub fn smart_split(text: &str, delimiter: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut square_depth: i32 = 0;
    let mut paren_depth: i32 = 0;
    let mut angle_depth: i32 = 0;

    for ch in text.chars() {
        match ch {
            '[' => square_depth += 1,
            ']' => square_depth -= 1,
            '(' => paren_depth += 1,
            ')' => paren_depth -= 1,
            '<' => angle_depth += 1,
            '>' => angle_depth -= 1,
            c if c == delimiter && square_depth == 0 && paren_depth == 0 && angle_depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

//! Built-in extraction strategies.
//!
//! Tree-sitter parsers cover the main programming languages, hand-written
//! scanners cover data and markup formats, and two language-agnostic
//! strategies ([`ctags`] and [`fallback`]) close the chain.

pub mod c_family;
pub mod clojure;
pub mod csv;
pub mod ctags;
pub mod ecmascript;
pub mod fallback;
pub mod go;
pub mod json;
pub mod jsonl;
pub mod markdown;
pub mod python;
pub mod rust;
pub mod sql;
pub mod toml;
pub mod yaml;

/// Lines assumed for the last tag of a flat tag list.
const TRAILING_SPAN: u32 = 50;

/// End line for a flat tag starting at `line`: the line before the next tag,
/// or a fixed span past the last one, clamped to the file.
pub(crate) fn inferred_end(line: u32, next: Option<u32>, total_lines: u32) -> u32 {
    match next {
        Some(next) => line.max(next.saturating_sub(1)),
        None => line.saturating_add(TRAILING_SPAN).min(total_lines).max(line),
    }
}

#[cfg(test)]
mod tests {
    use super::inferred_end;

    #[test]
    fn ends_before_next_tag() {
        assert_eq!(inferred_end(10, Some(20), 100), 19);
        assert_eq!(inferred_end(10, Some(10), 100), 10);
    }

    #[test]
    fn last_tag_is_clamped() {
        assert_eq!(inferred_end(10, None, 100), 60);
        assert_eq!(inferred_end(90, None, 100), 100);
        assert_eq!(inferred_end(90, None, 40), 90);
    }
}

//! Placeholder scanner.

use super::Segment;
use crate::{Error, Result};

/// Returns true if the character may appear in a placeholder name.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Splits template source into literal and placeholder segments.
///
/// `{{` and `}}` are literal braces. Adjacent literal text is merged into a
/// single segment.
pub(crate) fn parse_segments(source: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, next)| next == '{').is_some() {
                    literal.push('{');
                    continue;
                }

                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) if is_name_char(c) => name.push(c),
                        Some((offset, '{')) => {
                            return Err(Error::malformed(offset, "nested opening brace"));
                        }
                        Some((offset, c)) => {
                            return Err(Error::malformed(
                                offset,
                                format!("invalid character {c:?} in placeholder name"),
                            ));
                        }
                        None => return Err(Error::malformed(position, "unclosed placeholder")),
                    }
                }

                if name.is_empty() {
                    return Err(Error::malformed(position, "empty placeholder"));
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(name));
            }
            '}' => {
                if chars.next_if(|&(_, next)| next == '}').is_some() {
                    literal.push('}');
                } else {
                    return Err(Error::malformed(position, "unmatched closing brace"));
                }
            }
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

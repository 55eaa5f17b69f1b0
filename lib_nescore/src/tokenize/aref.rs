//! The aref self-closing marker tokenizer. Spec §6. Grounded on `ne-scoring-gen.cc`'s
//! `aref_extract_tags()`.
//!
//! Several markers may legitimately share the same `id`: each contributes one boundary
//! alternative to the entity that `id` groups (e.g. two `ftype=s` markers give that entity two
//! candidate start offsets). What must be rejected is a single marker carrying the *same
//! attribute key twice*, e.g. `<annotation ftype=s ftype=e .../>`. The original tokenizer declares
//! a `has_frontiers` flag for exactly this check but never sets it, so the check never fires (see
//! SPEC_FULL.md §9 / open question 2); this implementation actually sets it, for every attribute.

use nom::{
    IResult, Parser,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt},
    multi::many0,
    sequence::{delimited, preceded, separated_pair},
};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ftype {
    Start,
    End,
    StartEnd,
}

impl Ftype {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "s" => Some(Self::Start),
            "e" => Some(Self::End),
            "se" => Some(Self::StartEnd),
            _ => None,
        }
    }

    pub fn contributes_start(self) -> bool {
        matches!(self, Self::Start | Self::StartEnd)
    }

    pub fn contributes_end(self) -> bool {
        matches!(self, Self::End | Self::StartEnd)
    }
}

/// One `<annotation .../>` marker. `id` groups markers belonging to the same entity; a single
/// entity may be described by several markers contributing different boundary alternatives.
#[derive(Debug, Clone)]
pub struct ArefMarker {
    pub id: i64,
    pub tag: String,
    pub ftype: Ftype,
    pub depth: usize,
    /// `None` when `parent=-1`.
    pub parent: Option<i64>,
    /// Byte offset in the *stripped* (marker-free) text.
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct ArefTokenizeResult {
    pub text: String,
    pub markers: Vec<ArefMarker>,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == ':'
}

fn parse_name(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char).parse(input)
}

fn parse_attr_value(input: &str) -> IResult<&str, String> {
    nom::branch::alt((
        delimited(char('"'), map(is_not("\""), str::to_string), char('"')),
        map(
            take_while1(|c: char| !c.is_whitespace() && c != '>' && c != '/'),
            str::to_string,
        ),
    ))
    .parse(input)
}

fn parse_attr(input: &str) -> IResult<&str, (String, String)> {
    map(
        separated_pair(parse_name, char('='), parse_attr_value),
        |(name, value)| (name.to_string(), value),
    )
    .parse(input)
}

struct RawMarker {
    attrs: Vec<(String, String)>,
}

fn parse_marker(input: &str) -> IResult<&str, RawMarker> {
    let (input, _) = tag("<annotation").parse(input)?;
    let (input, attrs) = many0(preceded(multispace0, parse_attr)).parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = opt(char('/')).parse(input)?;
    let (input, _) = char('>').parse(input)?;
    Ok((input, RawMarker { attrs }))
}

fn attr_value<'a>(
    attrs: &'a [(String, String)],
    name: &str,
    file_name: &str,
    line: usize,
    col: usize,
) -> Result<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| Error::MalformedTag {
            file: file_name.to_string(),
            line,
            col,
            message: format!("missing required attribute '{name}'"),
        })
}

/// Strips aref markers from `input`, returning the marker-free text and the parsed markers with
/// offsets in that stripped text.
pub fn tokenize(input: &str, file_name: &str) -> Result<ArefTokenizeResult> {
    const KNOWN_ATTRS: &[&str] = &["id", "type", "ftype", "depth", "parent"];

    let mut text = String::with_capacity(input.len());
    let mut markers = Vec::new();

    let mut line = 1usize;
    let mut col = 1usize;
    let mut rest = input;

    while !rest.is_empty() {
        if rest.starts_with("<annotation") {
            match parse_marker(rest) {
                Ok((remainder, raw)) => {
                    for &known in KNOWN_ATTRS {
                        let occurrences = raw.attrs.iter().filter(|(key, _)| key == known).count();
                        if occurrences > 1 {
                            return Err(Error::DuplicateAttribute {
                                file: file_name.to_string(),
                                line,
                                col,
                                attribute: known.to_string(),
                            });
                        }
                    }
                    for (key, _) in &raw.attrs {
                        if !KNOWN_ATTRS.contains(&key.as_str()) {
                            return Err(Error::MalformedTag {
                                file: file_name.to_string(),
                                line,
                                col,
                                message: format!("unknown aref attribute '{key}'"),
                            });
                        }
                    }

                    let id: i64 = attr_value(&raw.attrs, "id", file_name, line, col)?
                        .parse()
                        .map_err(|_| Error::MalformedTag {
                            file: file_name.to_string(),
                            line,
                            col,
                            message: "attribute 'id' is not an integer".to_string(),
                        })?;
                    let tag_name = attr_value(&raw.attrs, "type", file_name, line, col)?.to_string();
                    let ftype_str = attr_value(&raw.attrs, "ftype", file_name, line, col)?;
                    let ftype = Ftype::parse(ftype_str).ok_or_else(|| Error::UnknownFtype {
                        file: file_name.to_string(),
                        line,
                        col,
                        ftype: ftype_str.to_string(),
                    })?;
                    let depth: usize = attr_value(&raw.attrs, "depth", file_name, line, col)?
                        .parse()
                        .map_err(|_| Error::MalformedTag {
                            file: file_name.to_string(),
                            line,
                            col,
                            message: "attribute 'depth' is not a non-negative integer".to_string(),
                        })?;
                    let parent_raw: i64 = attr_value(&raw.attrs, "parent", file_name, line, col)?
                        .parse()
                        .map_err(|_| Error::MalformedTag {
                            file: file_name.to_string(),
                            line,
                            col,
                            message: "attribute 'parent' is not an integer".to_string(),
                        })?;
                    let parent = if parent_raw < 0 { None } else { Some(parent_raw) };

                    let consumed_len = rest.len() - remainder.len();
                    let consumed = &rest[..consumed_len];

                    markers.push(ArefMarker {
                        id,
                        tag: tag_name,
                        ftype,
                        depth,
                        parent,
                        offset: text.len(),
                        line,
                        col,
                    });

                    advance_position(consumed, &mut line, &mut col);
                    rest = remainder;
                    continue;
                }
                Err(_) => {
                    return Err(Error::MalformedTag {
                        file: file_name.to_string(),
                        line,
                        col,
                        message: "malformed <annotation> marker".to_string(),
                    });
                }
            }
        }

        let mut chars = rest.char_indices();
        let (_, c) = chars.next().unwrap();
        let next_index = chars.next().map(|(index, _)| index).unwrap_or(rest.len());
        text.push(c);
        advance_position(&rest[..next_index], &mut line, &mut col);
        rest = &rest[next_index..];
    }

    Ok(ArefTokenizeResult { text, markers })
}

fn advance_position(consumed: &str, line: &mut usize, col: &mut usize) {
    for c in consumed.chars() {
        if c == '\n' {
            *line += 1;
            *col = 1;
        } else {
            *col += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_and_end_markers() {
        let input = r#"<annotation id=1 type=N ftype=s depth=0 parent=-1/>Alice<annotation id=1 type=N ftype=e depth=0 parent=-1/>"#;
        let result = tokenize(input, "ref").unwrap();
        assert_eq!(result.text, "Alice");
        assert_eq!(result.markers.len(), 2);
        assert_eq!(result.markers[0].ftype, Ftype::Start);
        assert_eq!(result.markers[1].ftype, Ftype::End);
        assert_eq!(result.markers[0].offset, 0);
        assert_eq!(result.markers[1].offset, 5);
    }

    #[test]
    fn parses_single_se_marker() {
        let input = r#"<annotation id=2 type=N ftype=se depth=1 parent=0/>"#;
        let result = tokenize(input, "ref").unwrap();
        assert_eq!(result.markers[0].ftype, Ftype::StartEnd);
        assert_eq!(result.markers[0].parent, Some(0));
    }

    #[test]
    fn allows_multiple_start_markers_for_same_id_as_boundary_alternatives() {
        let input = r#"<annotation id=1 type=N ftype=s depth=0 parent=-1/>Alice <annotation id=1 type=N ftype=s depth=0 parent=-1/>Smith<annotation id=1 type=N ftype=e depth=0 parent=-1/>"#;
        let result = tokenize(input, "ref").unwrap();
        assert_eq!(result.markers.iter().filter(|m| m.ftype == Ftype::Start).count(), 2);
    }

    #[test]
    fn rejects_duplicate_ftype_attribute_within_one_marker() {
        let input = r#"<annotation id=1 type=N ftype=s ftype=e depth=0 parent=-1/>"#;
        let result = tokenize(input, "ref");
        assert!(matches!(result, Err(Error::DuplicateAttribute { .. })));
    }

    #[test]
    fn rejects_unknown_ftype() {
        let input = r#"<annotation id=1 type=N ftype=x depth=0 parent=-1/>"#;
        let result = tokenize(input, "ref");
        assert!(matches!(result, Err(Error::UnknownFtype { .. })));
    }

    #[test]
    fn rejects_unknown_attribute() {
        let input = r#"<annotation id=1 type=N ftype=s depth=0 parent=-1 bogus=1/>"#;
        let result = tokenize(input, "ref");
        assert!(matches!(result, Err(Error::MalformedTag { .. })));
    }
}

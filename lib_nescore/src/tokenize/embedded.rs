//! The embedded XML-like tag tokenizer. Spec §6. Grounded on `ne-scoring-gen.cc`'s
//! `xml_extract_tags()`.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{delimited, preceded, separated_pair},
};

use crate::error::{Error, Result};

/// One opening or closing tag encountered in the embedded-format source text.
#[derive(Debug, Clone)]
pub struct EmbeddedTag {
    pub tag: String,
    pub opening: bool,
    /// Byte offset in the *stripped* (tag-free) text.
    pub offset: usize,
    pub line: usize,
    pub col: usize,
    /// Only present on opening tags.
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct EmbeddedTokenizeResult {
    pub text: String,
    pub tags: Vec<EmbeddedTag>,
}

enum ParsedTag {
    Opening { name: String, attrs: Vec<(String, String)> },
    Closing { name: String },
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == ':'
}

fn parse_name(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char).parse(input)
}

fn parse_attr_value(input: &str) -> IResult<&str, String> {
    alt((
        delimited(char('"'), map(is_not("\""), str::to_string), char('"')),
        delimited(char('\''), map(is_not("'"), str::to_string), char('\'')),
        map(take_while1(|c: char| !c.is_whitespace() && c != '>' && c != '/'), str::to_string),
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

fn parse_opening_tag(input: &str) -> IResult<&str, ParsedTag> {
    let (input, _) = char('<').parse(input)?;
    let (input, name) = parse_name(input)?;
    let (input, attrs) = many0(preceded(multispace0, parse_attr)).parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = opt(char('/')).parse(input)?;
    let (input, _) = char('>').parse(input)?;
    Ok((
        input,
        ParsedTag::Opening {
            name: name.to_string(),
            attrs,
        },
    ))
}

fn parse_closing_tag(input: &str) -> IResult<&str, ParsedTag> {
    let (input, name) = recognize(preceded(tag("</"), parse_name)).parse(input)?;
    let name = name.trim_start_matches("</").to_string();
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char('>').parse(input)?;
    Ok((input, ParsedTag::Closing { name }))
}

fn parse_tag(input: &str) -> IResult<&str, ParsedTag> {
    alt((parse_closing_tag, parse_opening_tag)).parse(input)
}

/// Strips embedded tags from `input`, returning the tag-free text and a list of tag events with
/// offsets in that stripped text. Tag names outside `known_tags` are passed through verbatim as
/// literal text; unmatched opening/closing tags among `known_tags` are rejected.
pub fn tokenize(input: &str, file_name: &str, known_tags: &[String]) -> Result<EmbeddedTokenizeResult> {
    let mut text = String::with_capacity(input.len());
    let mut tags = Vec::new();
    let mut stack: Vec<(String, usize)> = Vec::new();

    let mut line = 1usize;
    let mut col = 1usize;
    let mut rest = input;

    while !rest.is_empty() {
        if rest.starts_with('<') {
            match parse_tag(rest) {
                Ok((remainder, parsed)) => {
                    let consumed_len = rest.len() - remainder.len();
                    let consumed = &rest[..consumed_len];
                    let name = match &parsed {
                        ParsedTag::Opening { name, .. } | ParsedTag::Closing { name } => name,
                    };

                    if known_tags.iter().any(|known| known == name) {
                        match parsed {
                            ParsedTag::Opening { name, attrs } => {
                                tags.push(EmbeddedTag {
                                    tag: name.clone(),
                                    opening: true,
                                    offset: text.len(),
                                    line,
                                    col,
                                    attrs,
                                });
                                stack.push((name, tags.len() - 1));
                            }
                            ParsedTag::Closing { name } => {
                                let Some((top_name, open_index)) = stack.pop() else {
                                    return Err(Error::UnmatchedClosingTag {
                                        file: file_name.to_string(),
                                        tag: name,
                                    });
                                };
                                if top_name != name {
                                    return Err(Error::UnmatchedClosingTag {
                                        file: file_name.to_string(),
                                        tag: name,
                                    });
                                }
                                let _ = open_index;
                                tags.push(EmbeddedTag {
                                    tag: name,
                                    opening: false,
                                    offset: text.len(),
                                    line,
                                    col,
                                    attrs: Vec::new(),
                                });
                            }
                        }
                        advance_position(consumed, &mut line, &mut col);
                        rest = remainder;
                        continue;
                    }
                    // Unknown tag: pass through verbatim as literal text.
                }
                Err(_) => {
                    // Does not parse as a tag at all (e.g. a bare '<' in text); fall through to
                    // literal single-character handling below.
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

    if let Some((name, _)) = stack.pop() {
        return Err(Error::UnmatchedOpeningTag {
            file: file_name.to_string(),
            tag: name,
        });
    }

    Ok(EmbeddedTokenizeResult { text, tags })
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

    fn tags() -> Vec<String> {
        vec!["N".to_string(), "L".to_string()]
    }

    #[test]
    fn strips_known_tags_and_records_offsets() {
        let result = tokenize("<N>Alice</N> met <N>Bob</N>.", "ref", &tags()).unwrap();
        assert_eq!(result.text, "Alice met Bob.");
        assert_eq!(result.tags.len(), 4);
        assert_eq!(result.tags[0].tag, "N");
        assert!(result.tags[0].opening);
        assert_eq!(result.tags[0].offset, 0);
        assert_eq!(result.tags[1].offset, 5);
        assert!(!result.tags[1].opening);
    }

    #[test]
    fn passes_through_unknown_tags_as_literal_text() {
        let result = tokenize("Hello <b>world</b>.", "ref", &tags()).unwrap();
        assert_eq!(result.text, "Hello <b>world</b>.");
        assert!(result.tags.is_empty());
    }

    #[test]
    fn parses_quoted_attributes() {
        let result = tokenize(r#"<N id="1" kind=person>Alice</N>"#, "ref", &tags()).unwrap();
        assert_eq!(result.text, "Alice");
        assert_eq!(
            result.tags[0].attrs,
            vec![
                ("id".to_string(), "1".to_string()),
                ("kind".to_string(), "person".to_string())
            ]
        );
    }

    #[test]
    fn rejects_unmatched_closing_tag() {
        let result = tokenize("</N>", "ref", &tags());
        assert!(matches!(result, Err(Error::UnmatchedClosingTag { .. })));
    }

    #[test]
    fn rejects_unclosed_opening_tag() {
        let result = tokenize("<N>Alice", "ref", &tags());
        assert!(matches!(result, Err(Error::UnmatchedOpeningTag { .. })));
    }

    #[test]
    fn supports_nesting() {
        let result = tokenize("<N><L>Paris</L></N>", "ref", &tags()).unwrap();
        assert_eq!(result.text, "Paris");
        assert_eq!(result.tags.len(), 4);
    }
}

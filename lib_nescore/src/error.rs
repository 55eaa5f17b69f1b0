use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("An IO error occurred: {0}.")]
    Io(#[from] std::io::Error),

    #[error("A parsing error occurred on string '{input}': {kind:?}.")]
    Parser {
        input: String,
        kind: nom::error::ErrorKind,
    },

    #[error("Parsing was unsuccessful due to incomplete input: {0:?}.")]
    ParserIncomplete(nom::Needed),

    #[error("{file}:{line}:{col}: malformed tag: {message}.")]
    MalformedTag {
        file: String,
        line: usize,
        col: usize,
        message: String,
    },

    #[error("{file}:{line}:{col}: unknown aref marker type '{ftype}'.")]
    UnknownFtype {
        file: String,
        line: usize,
        col: usize,
        ftype: String,
    },

    #[error("{file}:{line}:{col}: duplicate '{attribute}' attribute in annotation marker.")]
    DuplicateAttribute {
        file: String,
        line: usize,
        col: usize,
        attribute: String,
    },

    #[error("{file}: unmatched closing tag '</{tag}>' with no matching opening tag.")]
    UnmatchedClosingTag { file: String, tag: String },

    #[error("{file}: unmatched opening tag '<{tag}>' was never closed.")]
    UnmatchedOpeningTag { file: String, tag: String },

    #[error(
        "alignment mismatch between reference and hypothesis text at reference offset {reference_offset}: reference context '{reference_context}', hypothesis context '{hypothesis_context}'."
    )]
    OffsetAlignmentMismatch {
        reference_offset: usize,
        reference_context: String,
        hypothesis_context: String,
    },

    #[error("entity '{tag}' (starting near offset {offset}) became empty after whitespace refinement.")]
    EmptyEntityAfterRefinement { tag: String, offset: usize },

    #[error("cost model error while evaluating entity '{tag}': {message}.")]
    CostModel { tag: String, message: String },

    #[error("configuration error: {0}.")]
    Config(String),

    #[error("tag '{0}' is used in the input but is not declared in the configuration.")]
    UndeclaredTag(String),

    #[error("alignment search terminated without reaching the final segment: {0}.")]
    AlignmentFailed(String),
}

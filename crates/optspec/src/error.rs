use thiserror::Error;

/// Rejection of an option specification.
///
/// The spec text is written by the program's author, not its user, so these
/// are configuration bugs: [`crate::OptionSpec::new`] panics on them and
/// [`crate::OptionSpec::try_new`] surfaces them for callers that want to
/// inspect the failure. Line numbers are zero-based, counting from the first
/// line of the spec string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// An option stanza line did not match `names[=]  description`.
    #[error("line {line}: no parse: {text}")]
    Malformed { line: usize, text: String },

    /// A declared name was empty, `-`, or `--`.
    #[error("line {line}: bad name: {name:?}")]
    BadName { line: usize, name: String },

    /// A name was already registered by an earlier declaration.
    #[error("line {line}: duplicate name: {name}")]
    DuplicateName { line: usize, name: String },
}

/// Failure to parse a command line against a compiled spec.
///
/// These describe bad input from the program's user. [`crate::OptionSpec::parse`]
/// reports them through the usage/exit hooks; [`crate::OptionSpec::try_parse`]
/// returns them for callers that manage their own termination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An option that requires an argument was given none.
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// An option that takes no argument was given one anyway.
    #[error("unexpected argument: {option}: {value}")]
    UnexpectedArgument { option: String, value: String },

    /// An undeclared option, with unknown options configured fatal.
    #[error("unexpected option: {0}")]
    UnknownOption(String),

    /// A non-option token, with extra values configured fatal.
    #[error("unexpected argument: {0}")]
    UnexpectedPositional(String),
}

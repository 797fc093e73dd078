//! Declarative command line option parsing driven by a textual spec.
//!
//! A program describes its interface as a short text document: a free-text
//! synopsis, a line containing only `--`, then one declaration line per
//! option. Compiling that text yields an [`OptionSpec`] whose tables drive
//! parsing of the actual command line:
//!
//! ```
//! use optspec::OptionSpec;
//!
//! let spec = OptionSpec::new(
//!     "cat - concatenate files to standard output\n\
//!      Usage: cat [OPTIONS] file...\n\
//!      --\n\
//!      n,numerate,number     number input lines\n\
//!      i,input-encoding=     charset input is encoded in [utf-8]\n\
//!      v,verbose             be verbose",
//! );
//! let opt = spec.parse(&["-vv", "--number", "hello.txt"]);
//!
//! assert_eq!(opt.get("input-encoding"), "utf-8"); // the declared default
//! assert!(opt.get_bool("number"));
//! assert_eq!(opt.get_int("verbose"), 2); // bare flags count repeats
//! assert_eq!(opt.extra, vec!["hello.txt".to_string()]);
//! ```
//!
//! Options may have any number of comma-separated aliases; the last one is
//! the canonical name, and the only name [`Matches::get`] accepts. A
//! trailing `=` on the name list means the option requires an argument,
//! given either inline (`--foo=bar`) or as the following token (`--foo bar`).
//! A description ending in a bracketed literal declares a default value.
//! Single-character options cluster (`-abc` means `-a -b -c`), with only the
//! final character able to take a value. A literal `--` stops parsing;
//! whatever follows lands in [`Matches::leftover`] untouched, and other
//! non-option tokens land in [`Matches::extra`].
//!
//! Besides the per-option values, every occurrence is logged in
//! [`Matches::flags`] exactly as presented, repeats included, so callers can
//! do their own handling of repeated options (see [`get_all`]).
//!
//! Bad user input is reported through the spec's usage/exit hooks: by
//! default the error and the rendered usage text go to stderr and the
//! process exits with [`EX_USAGE`]. Both the sinks and the exit hook are
//! injectable ([`OptionSpec::set_exit_hook`]), and
//! [`OptionSpec::try_parse`] skips the hooks entirely for callers that
//! manage their own termination. A malformed spec, by contrast, is a bug in
//! the calling program and panics.
//!
//! For a static, match-based style of parsing, install a callback with
//! [`OptionSpec::set_parse_callback`]; the engine then hands every option
//! occurrence (with any consumed value) to the callback instead of
//! recording it.

mod error;
mod matches;
mod parse;
mod spec;

pub use error::{ParseError, SpecError};
pub use matches::{Matches, Occurrence, get_all};
pub use spec::{EX_USAGE, ExitHook, OptionSpec, OutputSink, ParseCallback};

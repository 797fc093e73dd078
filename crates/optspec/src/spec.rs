use std::fmt;
use std::sync::LazyLock;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use tracing::debug;

use crate::error::SpecError;

/// Exit status for bad command lines, per the sysexits convention.
pub const EX_USAGE: i32 = 64;

/// Hook invoked to terminate the process. Must not return: the defaults call
/// [`std::process::exit`], and a test substitute should panic instead.
pub type ExitHook = Box<dyn Fn(i32) + Send + Sync>;

/// Sink receiving usage or error text in place of stdout/stderr.
pub type OutputSink = Box<dyn Fn(&str) + Send + Sync>;

/// Callback receiving the spec, the presented flag name (dashes stripped,
/// cluster text unsplit), and the consumed value, if any.
pub type ParseCallback = Box<dyn Fn(&OptionSpec, &str, Option<&str>) + Send + Sync>;

static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-\w,]+)(=?)\s+(.*)$").unwrap());

static DEFAULT_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*)\]$").unwrap());

/// Which stanza of the spec text the compiler is reading.
enum Stanza {
    Synopsis,
    Options,
}

/// A compiled command line interface description.
///
/// Built once from a textual spec by [`OptionSpec::new`], then reused for any
/// number of [`parse`](OptionSpec::parse) calls. The alias, default, and
/// requires-argument tables are immutable after compilation; the behavior
/// switches and the usage/exit hooks may be set once before use.
pub struct OptionSpec {
    usage: String,
    unknown_options_fatal: bool,
    unknown_values_fatal: bool,
    pub(crate) aliases: IndexMap<String, String>,
    pub(crate) defaults: IndexMap<String, String>,
    pub(crate) requires_arg: IndexSet<String>,
    pub(crate) parse_callback: Option<ParseCallback>,
    exit_hook: ExitHook,
    output_sink: OutputSink,
    error_sink: OutputSink,
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("aliases", &self.aliases)
            .field("defaults", &self.defaults)
            .field("requires_arg", &self.requires_arg)
            .field("unknown_options_fatal", &self.unknown_options_fatal)
            .field("unknown_values_fatal", &self.unknown_values_fatal)
            .finish_non_exhaustive()
    }
}

impl OptionSpec {
    /// Compile a spec, panicking on a malformed one.
    ///
    /// The spec text is part of the program, so failing to compile it is a
    /// bug in the program, not bad user input. Use [`OptionSpec::try_new`]
    /// to inspect the failure instead.
    pub fn new(spec: &str) -> Self {
        Self::try_new(spec).unwrap_or_else(|err| panic!("invalid option spec: {err}"))
    }

    /// Compile a spec, surfacing any [`SpecError`].
    pub fn try_new(spec: &str) -> Result<Self, SpecError> {
        let mut compiled = Self {
            usage: String::new(),
            unknown_options_fatal: true,
            unknown_values_fatal: false,
            aliases: IndexMap::new(),
            defaults: IndexMap::new(),
            requires_arg: IndexSet::new(),
            parse_callback: None,
            exit_hook: Box::new(|code| std::process::exit(code)),
            output_sink: Box::new(|text| print!("{text}")),
            error_sink: Box::new(|text| eprint!("{text}")),
        };

        let mut stanza = Stanza::Synopsis;
        for (number, line) in spec.split('\n').enumerate() {
            match stanza {
                Stanza::Synopsis => {
                    if line == "--" {
                        compiled.usage.push('\n');
                        stanza = Stanza::Options;
                    } else {
                        compiled.usage.push_str(line);
                        compiled.usage.push('\n');
                    }
                }
                Stanza::Options => compiled.compile_option_line(number, line)?,
            }
        }

        debug!(
            names = compiled.aliases.len(),
            defaults = compiled.defaults.len(),
            "compiled option spec"
        );
        Ok(compiled)
    }

    fn compile_option_line(&mut self, number: usize, line: &str) -> Result<(), SpecError> {
        if line.is_empty() {
            self.usage.push('\n');
            return Ok(());
        }

        let caps = OPTION_LINE.captures(line).ok_or_else(|| SpecError::Malformed {
            line: number,
            text: line.to_string(),
        })?;
        let names: Vec<&str> = caps[1].split(',').collect();
        let canonical = names[names.len() - 1];

        for name in &names {
            if name.is_empty() || *name == "-" || *name == "--" {
                return Err(SpecError::BadName {
                    line: number,
                    name: name.to_string(),
                });
            }
            if self.aliases.contains_key(*name) {
                return Err(SpecError::DuplicateName {
                    line: number,
                    name: name.to_string(),
                });
            }
            self.aliases.insert(name.to_string(), canonical.to_string());
        }

        let marker = &caps[2];
        if marker == "=" {
            self.requires_arg.insert(canonical.to_string());
        }

        let description = &caps[3];
        if let Some(default) = DEFAULT_VALUE.captures(description) {
            self.defaults
                .insert(canonical.to_string(), default[1].to_string());
        }

        let rendered: Vec<String> = names.iter().map(|name| pretty_flag(name)).collect();
        self.usage.push_str("  ");
        self.usage.push_str(&rendered.join(", "));
        self.usage.push_str(marker);
        self.usage.push_str("  ");
        self.usage.push_str(description);
        self.usage.push('\n');
        Ok(())
    }

    /// The rendered usage text: synopsis verbatim, a blank line, then one
    /// formatted line per option.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Resolve any declared name to its canonical name. Handy for tidying up
    /// match arms when using the callback interface.
    pub fn canonical_of(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub(crate) fn unknown_options_fatal(&self) -> bool {
        self.unknown_options_fatal
    }

    pub(crate) fn unknown_values_fatal(&self) -> bool {
        self.unknown_values_fatal
    }

    /// Whether undeclared options abort the parse. Defaults to true.
    pub fn set_unknown_options_fatal(&mut self, fatal: bool) -> &mut Self {
        self.unknown_options_fatal = fatal;
        self
    }

    /// Whether non-option tokens abort the parse. Defaults to false.
    pub fn set_unknown_values_fatal(&mut self, fatal: bool) -> &mut Self {
        self.unknown_values_fatal = fatal;
        self
    }

    /// Install a callback that receives every option occurrence in place of
    /// the default recording into the parse result.
    pub fn set_parse_callback(
        &mut self,
        callback: impl Fn(&OptionSpec, &str, Option<&str>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.parse_callback = Some(Box::new(callback));
        self
    }

    /// Replace the process-termination hook. The hook must diverge (exit the
    /// process or panic); a test substitute that panics lets the test observe
    /// the termination without dying.
    pub fn set_exit_hook(&mut self, hook: impl Fn(i32) + Send + Sync + 'static) -> &mut Self {
        self.exit_hook = Box::new(hook);
        self
    }

    /// Replace the sink that receives usage text on the success path.
    pub fn set_output_sink(&mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> &mut Self {
        self.output_sink = Box::new(sink);
        self
    }

    /// Replace the sink that receives error and usage text on the failure path.
    pub fn set_error_sink(&mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> &mut Self {
        self.error_sink = Box::new(sink);
        self
    }

    /// Write the usage text and terminate through the exit hook.
    ///
    /// An empty `err` means usage itself was requested: it goes to the output
    /// sink and the status is 0, so `myprog --help | less` behaves as the
    /// user expects. Otherwise the error and usage go to the error sink and
    /// the status is [`EX_USAGE`].
    pub fn print_usage_and_exit(&self, err: &str) {
        if err.is_empty() {
            (self.output_sink)(&format!("{}\n", self.usage));
            (self.exit_hook)(0);
        } else {
            (self.error_sink)(&format!("{err}\n{}\n", self.usage));
            (self.exit_hook)(EX_USAGE);
        }
    }
}

fn pretty_flag(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}

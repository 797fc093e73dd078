use indexmap::{IndexMap, IndexSet};

/// One option token as presented on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// The flag exactly as typed, dashes included, inline value stripped
    /// (`--ccc=foo` is presented as `--ccc`).
    pub presented: String,
    /// The value consumed for this occurrence, if any.
    pub value: Option<String>,
}

/// The result of parsing one command line.
///
/// Lookup goes through [`Matches::get`] and friends using an option's
/// canonical name. The raw occurrence log and the non-option tokens are
/// public fields.
#[derive(Debug, Clone, Default)]
pub struct Matches {
    values: IndexMap<String, String>,
    known: IndexSet<String>,
    /// Every option occurrence in encounter order, repeats included.
    pub flags: Vec<Occurrence>,
    /// Non-option tokens seen before any `--` terminator.
    pub extra: Vec<String>,
    /// Tokens strictly after a literal `--`, never interpreted.
    pub leftover: Vec<String>,
}

impl Matches {
    pub(crate) fn with_tables(values: IndexMap<String, String>, known: IndexSet<String>) -> Self {
        Self {
            values,
            known,
            flags: Vec::new(),
            extra: Vec::new(),
            leftover: Vec::new(),
        }
    }

    pub(crate) fn set_value(&mut self, canonical: &str, value: &str) {
        self.values.insert(canonical.to_string(), value.to_string());
    }

    /// Counting semantics for no-argument options: current value read as an
    /// integer (empty or unset is zero), incremented, stored back as a string.
    pub(crate) fn bump_count(&mut self, canonical: &str) {
        let count = self.get_int(canonical) + 1;
        self.values.insert(canonical.to_string(), count.to_string());
    }

    fn assert_known(&self, flag: &str) {
        if !self.known.contains(flag) {
            panic!(
                "programmer error: unknown option: {flag} (canonical names: {:?})",
                self.known
            );
        }
    }

    /// The stored value of an option, or the empty string if unset.
    ///
    /// `flag` must be a canonical name declared by the spec that produced
    /// this result; anything else is API misuse and panics. Bad input from
    /// the command line never panics here.
    pub fn get(&self, flag: &str) -> &str {
        match self.values.get(flag) {
            Some(value) => value,
            None => {
                self.assert_known(flag);
                ""
            }
        }
    }

    /// The value of an option as an integer. Empty or unset is zero;
    /// any other value must parse or this panics.
    pub fn get_int(&self, flag: &str) -> i64 {
        let value = self.get(flag);
        if value.is_empty() {
            return 0;
        }
        value
            .parse()
            .unwrap_or_else(|_| panic!("bad integer value for option {flag}: {value:?}"))
    }

    /// The value of an option as a bool. Everything is true except the
    /// empty string and the spellings `0`, `false`, `off`, `nil`, `null`, `no`.
    pub fn get_bool(&self, flag: &str) -> bool {
        !matches!(self.get(flag), "" | "0" | "false" | "off" | "nil" | "null" | "no")
    }

    /// Whether a value is recorded for the option, from a default or from
    /// the command line. Panics on undeclared names, like [`Matches::get`].
    pub fn have(&self, flag: &str) -> bool {
        self.assert_known(flag);
        self.values.contains_key(flag)
    }
}

/// Gather every value a flag was presented with, in encounter order.
///
/// `flag` is compared literally against the presented text in the log
/// (so `--author`, dashes included, for a long option). Every matching
/// occurrence must carry a value; a no-argument occurrence under the same
/// presented text is API misuse and panics.
pub fn get_all<'a>(flag: &str, flags: &'a [Occurrence]) -> Vec<&'a str> {
    flags
        .iter()
        .filter(|occurrence| occurrence.presented == flag)
        .map(|occurrence| {
            occurrence
                .value
                .as_deref()
                .unwrap_or_else(|| panic!("programmer error: option does not take arguments: {flag}"))
        })
        .collect()
}

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use tracing::trace;

use crate::error::ParseError;
use crate::matches::{Matches, Occurrence};
use crate::spec::OptionSpec;

static OPTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((--?)([-\w]+))(=(.*))?$").unwrap());

/// An option-shaped token split into its parts.
struct Token<'a> {
    /// Dashes and name as typed, inline value stripped.
    presented: &'a str,
    single_dash: bool,
    name: &'a str,
    inline: Option<&'a str>,
}

impl<'a> Token<'a> {
    fn split(raw: &'a str) -> Option<Self> {
        let caps = OPTION_TOKEN.captures(raw)?;
        Some(Self {
            presented: caps.get(1).unwrap().as_str(),
            single_dash: &caps[2] == "-",
            name: caps.get(3).unwrap().as_str(),
            inline: caps.get(5).map(|m| m.as_str()),
        })
    }

    fn occurrence(&self, value: Option<&str>) -> Occurrence {
        Occurrence {
            presented: self.presented.to_string(),
            value: value.map(str::to_string),
        }
    }
}

impl OptionSpec {
    /// Parse a command line, reporting any failure through the usage/exit
    /// hooks. The token list excludes the program's own name, so pass
    /// `std::env::args().skip(1).collect::<Vec<_>>()` from a real program.
    ///
    /// Once the error has been handed to the hooks the exit hook must
    /// terminate; a partial result is never returned.
    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> Matches {
        match self.try_parse(args) {
            Ok(matches) => matches,
            Err(err) => {
                self.print_usage_and_exit(&err.to_string());
                panic!("exit hook returned after fatal parse error: {err}");
            }
        }
    }

    /// Parse a command line, surfacing any [`ParseError`] instead of
    /// terminating. For callers that manage their own exit behavior.
    pub fn try_parse<S: AsRef<str>>(&self, args: &[S]) -> Result<Matches, ParseError> {
        let known: IndexSet<String> = self.aliases.values().cloned().collect();
        let mut matches = Matches::with_tables(self.defaults.clone(), known);

        let mut index = 0;
        while index < args.len() {
            let raw = args[index].as_ref();
            if raw == "--" {
                matches
                    .leftover
                    .extend(args[index + 1..].iter().map(|t| t.as_ref().to_string()));
                break;
            }

            let Some(token) = Token::split(raw) else {
                if self.unknown_values_fatal() {
                    return Err(ParseError::UnexpectedPositional(raw.to_string()));
                }
                matches.extra.push(raw.to_string());
                index += 1;
                continue;
            };

            let next = args.get(index + 1).map(|t| t.as_ref());
            let (value, consumed_next) = self.value_consumption(&token, next);

            if let Some(callback) = &self.parse_callback {
                // Callback mode: the consumption decision above still ran,
                // but recording, validation, and termination are the
                // callback's business.
                callback(self, token.name, value);
            } else {
                self.dispatch(&token, value, &mut matches)?;
            }

            index += 1 + usize::from(consumed_next);
        }

        trace!(
            flags = matches.flags.len(),
            extra = matches.extra.len(),
            leftover = matches.leftover.len(),
            "parsed command line"
        );
        Ok(matches)
    }

    /// Decide, without side effects, which value (if any) belongs to this
    /// token and whether it comes from the following token. Runs identically
    /// in default and callback mode.
    fn value_consumption<'a>(
        &self,
        token: &Token<'a>,
        next: Option<&'a str>,
    ) -> (Option<&'a str>, bool) {
        if let Some(canonical) = self.aliases.get(token.name) {
            if self.requires_arg.contains(canonical) {
                if token.inline.is_some() {
                    return (token.inline, false);
                }
                if next.is_some() {
                    return (next, true);
                }
            }
            // A no-argument option never consumes; a declared inline value is
            // left for the dispatcher to reject.
            return (None, false);
        }

        if token.inline.is_some() {
            return (token.inline, false);
        }

        if token.single_dash {
            // Cluster: only the final character may take a value, and it
            // consumes the next token exactly when it is declared to.
            let last = token.name.chars().next_back().expect("name is never empty");
            if let Some(canonical) = self.aliases.get(last.to_string().as_str()) {
                if self.requires_arg.contains(canonical) && next.is_some() {
                    return (next, true);
                }
                return (None, false);
            }
        }

        // Unknown option: silently assume the next token is its value UNLESS
        // that token syntactically looks like another flag. With no
        // declaration to consult this can misread an adjacent positional;
        // that is accepted best-effort behavior.
        match next {
            Some(n) if !n.starts_with('-') => (next, true),
            _ => (None, false),
        }
    }

    fn dispatch(
        &self,
        token: &Token<'_>,
        value: Option<&str>,
        matches: &mut Matches,
    ) -> Result<(), ParseError> {
        if let Some(canonical) = self.aliases.get(token.name) {
            if self.requires_arg.contains(canonical) {
                let Some(value) = value else {
                    return Err(ParseError::MissingArgument(canonical.clone()));
                };
                matches.set_value(canonical, value);
            } else {
                if let Some(inline) = token.inline {
                    return Err(ParseError::UnexpectedArgument {
                        option: canonical.clone(),
                        value: inline.to_string(),
                    });
                }
                matches.bump_count(canonical);
            }
            matches.flags.push(token.occurrence(value));
            return Ok(());
        }

        if token.single_dash {
            self.dispatch_cluster(token, value, matches)?;
            matches.flags.push(token.occurrence(value));
            return Ok(());
        }

        if self.unknown_options_fatal() {
            return Err(ParseError::UnknownOption(token.presented.to_string()));
        }
        matches.flags.push(token.occurrence(value));
        Ok(())
    }

    /// Decode a single-dash token that is not itself an alias as a cluster of
    /// short options, dispatching each character through the same
    /// argument/no-argument rules as a standalone flag.
    fn dispatch_cluster(
        &self,
        token: &Token<'_>,
        value: Option<&str>,
        matches: &mut Matches,
    ) -> Result<(), ParseError> {
        let count = token.name.chars().count();
        for (position, short) in token.name.chars().enumerate() {
            let is_last = position == count - 1;
            let short = short.to_string();
            match self.aliases.get(&short) {
                Some(canonical) => {
                    if self.requires_arg.contains(canonical) {
                        if !is_last {
                            // A value can only trail the cluster, so an
                            // argument-requiring option anywhere else has
                            // nothing to take.
                            return Err(ParseError::MissingArgument(short));
                        }
                        let Some(value) = value else {
                            return Err(ParseError::MissingArgument(short));
                        };
                        matches.set_value(canonical, value);
                    } else {
                        match value {
                            Some(value) if is_last => {
                                return Err(ParseError::UnexpectedArgument {
                                    option: short,
                                    value: value.to_string(),
                                });
                            }
                            _ => matches.bump_count(canonical),
                        }
                    }
                }
                None => {
                    if self.unknown_options_fatal() {
                        return Err(ParseError::UnknownOption(token.presented.to_string()));
                    }
                    // Untracked short option: it has no canonical name, so it
                    // shows up in the flags log only.
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(presented: &str, value: Option<&str>) -> Occurrence {
        Occurrence {
            presented: presented.to_string(),
            value: value.map(str::to_string),
        }
    }

    #[test]
    fn empty_command_line_yields_defaults() {
        let spec = OptionSpec::new("Hi\n--\na,bbb,ccc= doc [def]");
        let opt = spec.parse::<&str>(&[]);
        assert_eq!(opt.get("ccc"), "def");
        assert!(opt.flags.is_empty());
        assert!(opt.extra.is_empty());
        assert!(opt.leftover.is_empty());
    }

    #[test]
    fn every_alias_stores_under_the_canonical_name() {
        let spec = OptionSpec::new("Hi\n--\na,bbb,ccc= doc [def]");
        for name in ["--ccc", "--bbb", "-a"] {
            let opt = spec.parse(&[name, "myval"]);
            assert_eq!(opt.get("ccc"), "myval", "{name}");
            assert_eq!(opt.flags, vec![occ(name, Some("myval"))], "{name}");
            assert!(opt.extra.is_empty());
        }
    }

    #[test]
    fn inline_and_spaced_values_are_equivalent() {
        let spec = OptionSpec::new("Hi\n--\na,bbb,ccc= doc [def]");
        for name in ["--ccc", "--bbb", "-a"] {
            let inline = spec.parse(&[format!("{name}=myval")]);
            let spaced = spec.parse(&[name.to_string(), "myval".to_string()]);
            assert_eq!(inline.get("ccc"), "myval", "{name}");
            assert_eq!(inline.get("ccc"), spaced.get("ccc"), "{name}");
            assert_eq!(inline.flags, vec![occ(name, Some("myval"))], "{name}");
        }
    }

    #[test]
    fn last_occurrence_wins_for_argument_options() {
        let spec = OptionSpec::new("Hi\n--\na,bbb,ccc= doc [def]");
        let opt = spec.parse(&["--bbb", "111", "--ccc", "222", "-a", "333"]);
        assert_eq!(opt.get("ccc"), "333");
    }

    #[test]
    fn repeated_bare_flags_accumulate_a_count() {
        let spec = OptionSpec::new("Hi\n--\na,bbb,ccc doc");
        let opt = spec.parse(&["-a"]);
        assert_eq!(opt.get_int("ccc"), 1);

        let opt = spec.parse(&["-a", "-a", "--ccc"]);
        assert_eq!(opt.get_int("ccc"), 3);
        assert_eq!(
            opt.flags,
            vec![occ("-a", None), occ("-a", None), occ("--ccc", None)]
        );
    }

    #[test]
    fn missing_required_argument_is_fatal() {
        let spec = OptionSpec::new("Hi\n--\na,bbb,ccc= doc [def]");
        assert_eq!(
            spec.try_parse(&["--ccc"]).unwrap_err(),
            ParseError::MissingArgument("ccc".to_string())
        );
    }

    #[test]
    fn inline_value_on_bare_flag_is_fatal() {
        let spec = OptionSpec::new("Hi\n--\nv,verbose doc");
        assert_eq!(
            spec.try_parse(&["--verbose=3"]).unwrap_err(),
            ParseError::UnexpectedArgument {
                option: "verbose".to_string(),
                value: "3".to_string(),
            }
        );
    }

    #[test]
    fn non_option_tokens_collect_as_extra() {
        let spec = OptionSpec::new("Hi\n--\nccc= doc [def]");
        let opt = spec.parse(&["extra1", "--ccc", "myval", "extra2", "extra3=foo"]);
        assert_eq!(opt.get("ccc"), "myval");
        assert_eq!(opt.flags, vec![occ("--ccc", Some("myval"))]);
        assert_eq!(opt.extra, vec!["extra1", "extra2", "extra3=foo"]);
    }

    #[test]
    fn extra_tokens_can_be_made_fatal() {
        let mut spec = OptionSpec::new("Hi\n--\nccc= doc [def]");
        spec.set_unknown_values_fatal(true);
        assert_eq!(
            spec.try_parse(&["extra1", "--ccc", "myval"]).unwrap_err(),
            ParseError::UnexpectedPositional("extra1".to_string())
        );
    }

    #[test]
    fn leftover_collects_everything_after_the_terminator() {
        let mut spec = OptionSpec::new("Hi\n--\nccc= doc [def]");
        spec.set_unknown_values_fatal(true);

        let opt = spec.parse(&["--ccc", "myval"]);
        assert!(opt.leftover.is_empty());

        let opt = spec.parse(&["--ccc", "myval", "--"]);
        assert!(opt.leftover.is_empty());

        let opt = spec.parse(&["--ccc", "myval", "--", "leftover1", "--ccc=shaped"]);
        assert_eq!(opt.leftover, vec!["leftover1", "--ccc=shaped"]);
        assert_eq!(opt.get("ccc"), "myval");
        assert_eq!(opt.flags, vec![occ("--ccc", Some("myval"))]);
    }

    #[test]
    fn unknown_options_are_fatal_by_default() {
        let spec = OptionSpec::new("Hi\n--\nccc= doc [def]");
        assert_eq!(
            spec.try_parse(&["--ccc", "myval", "--unk"]).unwrap_err(),
            ParseError::UnknownOption("--unk".to_string())
        );
    }

    #[test]
    fn unknown_options_record_best_effort_when_not_fatal() {
        let mut spec = OptionSpec::new("Hi\n--\nccc= doc [def]");
        spec.set_unknown_options_fatal(false);
        let opt = spec.parse(&["--unk1", "--ccc", "myval", "--unk2", "val2", "--unk3"]);
        assert_eq!(opt.get("ccc"), "myval");
        assert_eq!(
            opt.flags,
            vec![
                occ("--unk1", None),
                occ("--ccc", Some("myval")),
                occ("--unk2", Some("val2")),
                occ("--unk3", None),
            ]
        );
        assert!(opt.extra.is_empty());
    }

    #[test]
    fn unknown_option_inline_value_is_used() {
        let mut spec = OptionSpec::new("Hi\n--\nccc= doc [def]");
        spec.set_unknown_options_fatal(false);
        let opt = spec.parse(&["--unk=val", "positional"]);
        assert_eq!(opt.flags, vec![occ("--unk", Some("val"))]);
        assert_eq!(opt.extra, vec!["positional"]);
    }

    #[test]
    fn clustered_shorts_count_independently() {
        let spec = OptionSpec::new("Hi\n--\na,bbb doc\nb,ccc doc");
        let opt = spec.parse(&["-abbb"]);
        assert!(opt.get_bool("bbb"));
        assert_eq!(opt.get_int("bbb"), 1);
        assert_eq!(opt.get_int("ccc"), 3);
        assert_eq!(opt.flags, vec![occ("-abbb", None)]);
    }

    #[test]
    fn cluster_tail_takes_an_inline_value() {
        let spec = OptionSpec::new("Hi\n--\na,bbb doc\nb,ccc= doc");
        let opt = spec.parse(&["-aab=foo"]);
        assert_eq!(opt.get_int("bbb"), 2);
        assert_eq!(opt.get("ccc"), "foo");
        assert_eq!(opt.flags, vec![occ("-aab", Some("foo"))]);
    }

    #[test]
    fn cluster_tail_takes_the_next_token() {
        let spec = OptionSpec::new("Hi\n--\na,bbb doc\nb,ccc= doc");
        let opt = spec.parse(&["-aab", "foo"]);
        assert_eq!(opt.get_int("bbb"), 2);
        assert_eq!(opt.get("ccc"), "foo");

        // The declared requirement wins even over a dash-shaped token.
        let opt = spec.parse(&["-aab", "-a"]);
        assert_eq!(opt.get_int("bbb"), 2);
        assert_eq!(opt.get("ccc"), "-a");
    }

    #[test]
    fn cluster_tail_missing_argument_is_fatal() {
        let spec = OptionSpec::new("Hi\n--\na,bbb doc\nb,ccc= doc");
        assert_eq!(
            spec.try_parse(&["-aab"]).unwrap_err(),
            ParseError::MissingArgument("b".to_string())
        );
    }

    #[test]
    fn argument_option_midway_through_a_cluster_is_fatal() {
        let spec = OptionSpec::new("Hi\n--\na,bbb doc\nb,ccc= doc");
        assert_eq!(
            spec.try_parse(&["-ba", "foo"]).unwrap_err(),
            ParseError::MissingArgument("b".to_string())
        );
    }

    #[test]
    fn bare_cluster_does_not_swallow_a_positional() {
        let spec = OptionSpec::new("Hi\n--\na,bbb doc\nb,ccc doc");
        let opt = spec.parse(&["-ab", "file.txt"]);
        assert_eq!(opt.get_int("bbb"), 1);
        assert_eq!(opt.get_int("ccc"), 1);
        assert_eq!(opt.extra, vec!["file.txt"]);
        assert_eq!(opt.flags, vec![occ("-ab", None)]);
    }

    #[test]
    fn unknown_character_in_cluster_is_fatal_by_default() {
        let spec = OptionSpec::new("Hi\n--\na,bbb doc");
        assert_eq!(
            spec.try_parse(&["-ax"]).unwrap_err(),
            ParseError::UnknownOption("-ax".to_string())
        );
    }

    #[test]
    fn unknown_cluster_tail_applies_the_best_effort_heuristic() {
        let mut spec = OptionSpec::new("Hi\n--\na,bbb doc");
        spec.set_unknown_options_fatal(false);
        let opt = spec.parse(&["-ax", "foo"]);
        assert_eq!(opt.get_int("bbb"), 1);
        assert_eq!(opt.flags, vec![occ("-ax", Some("foo"))]);
        assert!(opt.extra.is_empty());
    }

    #[test]
    fn single_dash_long_alias_resolves_without_clustering() {
        let spec = OptionSpec::new("Hi\n--\na,bbb,ccc= doc [def]");
        let opt = spec.parse(&["-bbb", "myval"]);
        assert_eq!(opt.get("ccc"), "myval");
        assert_eq!(opt.flags, vec![occ("-bbb", Some("myval"))]);
    }

    #[test]
    fn results_do_not_leak_between_parse_calls() {
        let spec = OptionSpec::new("Hi\n--\nv,verbose doc\nc,ccc= doc [def]");
        let first = spec.parse(&["-vv", "--ccc", "one"]);
        let second = spec.parse::<&str>(&[]);
        assert_eq!(first.get_int("verbose"), 2);
        assert_eq!(first.get("ccc"), "one");
        assert_eq!(second.get_int("verbose"), 0);
        assert_eq!(second.get("ccc"), "def");
    }

    #[test]
    fn callback_observes_every_option_token() {
        use std::sync::{Arc, Mutex};

        let mut spec = OptionSpec::new("Hi\n--\na,bbb,ccc= doc\nddd more doc\n");
        let seen: Arc<Mutex<Vec<(String, Option<String>)>>> = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        spec.set_parse_callback(move |_, option, argument| {
            log.lock()
                .unwrap()
                .push((option.to_string(), argument.map(str::to_string)));
        });

        let opt = spec.parse(&[
            "--unk1", "--ccc", "myval", "--bbb=noooo", "hi", "a=b", "-a", "myotherval", "--unk2",
            "val2", "--ddd", "--unk3",
        ]);

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            [
                ("unk1".to_string(), None),
                ("ccc".to_string(), Some("myval".to_string())),
                ("bbb".to_string(), Some("noooo".to_string())),
                ("a".to_string(), Some("myotherval".to_string())),
                ("unk2".to_string(), Some("val2".to_string())),
                ("ddd".to_string(), None),
                ("unk3".to_string(), None),
            ]
        );
        // The callback owns recording: the engine writes neither values nor
        // the flags log in this mode.
        assert_eq!(opt.get("ccc"), "");
        assert!(opt.flags.is_empty());
        assert_eq!(opt.extra, vec!["hi", "a=b"]);
    }

    #[test]
    fn callback_resolves_canonicals_through_the_spec() {
        use std::sync::{Arc, Mutex};

        let mut spec = OptionSpec::new("Hi\n--\na,bbb,ccc= doc");
        let resolved: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&resolved);
        spec.set_parse_callback(move |spec, option, _| {
            log.lock()
                .unwrap()
                .push(spec.canonical_of(option).map(str::to_string));
        });
        spec.set_unknown_options_fatal(false);
        spec.parse(&["-a", "one", "--unk"]);
        assert_eq!(
            resolved.lock().unwrap().as_slice(),
            [Some("ccc".to_string()), None]
        );
    }
}

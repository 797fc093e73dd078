//! Example front-end in the spirit of `cat`, using the callback/static
//! style. With callbacks the program owns its state, including defaults.

use std::sync::{Arc, Mutex};

use optspec::OptionSpec;

const CAT_SPEC: &str = "\
cat - concatenate files to standard output
Usage: cat [OPTIONS] file...
This version of cat supports character set conversion.
--
h,help                show this help
n,numerate,number     number input lines
e,escape              escape nonprintable characters
i,input-encoding=     charset input is encoded in
o,output-encoding=    charset output is encoded in
r,repeat=             repeat every line some number of times
v,verbose             be verbose";

#[derive(Debug)]
struct Config {
    number: bool,
    escape: bool,
    input_encoding: String,
    output_encoding: String,
    repeat: i64,
    verbose: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            number: false,
            escape: false,
            input_encoding: "utf-8".to_string(),
            output_encoding: "utf-8".to_string(),
            repeat: 1,
            verbose: 0,
        }
    }
}

fn main() {
    let config = Arc::new(Mutex::new(Config::default()));

    let mut spec = OptionSpec::new(CAT_SPEC);
    let state = Arc::clone(&config);
    spec.set_parse_callback(move |spec, option, argument| {
        let mut config = state.lock().unwrap();
        let canonical = spec.canonical_of(option).unwrap_or_default().to_string();
        match (canonical.as_str(), argument) {
            ("input-encoding", Some(value)) => config.input_encoding = value.to_string(),
            ("output-encoding", Some(value)) => config.output_encoding = value.to_string(),
            ("repeat", Some(value)) => match value.parse() {
                Ok(repeat) => config.repeat = repeat,
                Err(_) => spec.print_usage_and_exit(&format!("bad repeat count: {value}")),
            },
            ("number", None) => config.number = true,
            ("escape", None) => config.escape = true,
            ("verbose", None) => config.verbose += 1,
            ("help", None) => spec.print_usage_and_exit(""),
            _ => spec.print_usage_and_exit(&format!("unknown option: {option}")),
        }
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let opt = spec.parse(&args);

    let config = config.lock().unwrap();
    println!("I will concatenate the files: {:?}", opt.extra);
    if config.number {
        println!("I will number each line");
    }
    if config.escape {
        println!("I will escape each line");
    }
    if config.repeat != 1 {
        println!("I will repeat each line {} times", config.repeat);
    }
    if config.verbose > 0 {
        println!("I will be verbose (level {})", config.verbose);
    }
    println!("Input charset: {}", config.input_encoding);
    println!("Output charset: {}", config.output_encoding);
}

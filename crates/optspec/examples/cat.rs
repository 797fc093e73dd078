//! Example front-end in the spirit of `cat`, using the default
//! values/flags/extra interface. Try running it with various options,
//! including invalid ones.

use optspec::{OptionSpec, get_all};
use tracing_subscriber::{EnvFilter, fmt};

const CAT_SPEC: &str = "\
cat - concatenate files to standard output
Usage: cat [OPTIONS] file...
This version of cat supports character set conversion.
Fancifully, you can say \"-r 3\" and have everything told you three times.
--
n,numerate,number     number input lines
e,escape              escape nonprintable characters
i,input-encoding=     charset input is encoded in [utf-8]
o,output-encoding=    charset output is encoded in [utf-8]
r,repeat=             repeat every line some number of times [1]
v,verbose             be verbose
author=               authors you like (may be repeated)";

fn main() {
    init_tracing();

    let spec = OptionSpec::new(CAT_SPEC);
    let args: Vec<String> = std::env::args().skip(1).collect();
    let opt = spec.parse(&args);

    println!("I will concatenate the files: {:?}", opt.extra);
    if opt.get_bool("number") {
        println!("I will number each line");
    }
    if opt.get_bool("escape") {
        println!("I will escape each line");
    }
    let repeat = opt.get_int("repeat");
    if repeat != 1 {
        println!("I will repeat each line {repeat} times");
    }
    let verbose = opt.get_int("verbose");
    if verbose > 0 {
        println!("I will be verbose (level {verbose})");
    }
    println!("Input charset: {}", opt.get("input-encoding"));
    println!("Output charset: {}", opt.get("output-encoding"));

    let authors = get_all("--author", &opt.flags);
    if !authors.is_empty() {
        println!("You like these authors. I'll tell you if I see them: {authors:?}");
    }

    println!("For reference, here are the flags you gave me: {:?}", opt.flags);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

//! `resolve` subcommand: print the fetch path of each identifier.

use crate::resolver;

use super::{EXIT_FAILURE, EXIT_OK};

/// Resolve every name, one line each. Failures go to stderr.
pub fn run_resolve(names: &[String]) -> i32 {
    if names.is_empty() {
        eprintln!("resolve: expected at least one identifier");
        return EXIT_FAILURE;
    }

    let (lines, failed) = resolve_all(names);
    for line in lines {
        match line {
            Ok(line) => println!("{line}"),
            Err(line) => eprintln!("{line}"),
        }
    }

    if failed {
        EXIT_FAILURE
    } else {
        EXIT_OK
    }
}

fn resolve_all(names: &[String]) -> (Vec<Result<String, String>>, bool) {
    let mut failed = false;
    let lines = names
        .iter()
        .map(|name| match resolver::resolve(name) {
            Ok(path) => Ok(format!("{name}\t{path}")),
            Err(e) => {
                failed = true;
                Err(format!("{name}\t{e}"))
            }
        })
        .collect();
    (lines, failed)
}

//! Debug command - dump CI variables

use anstream::println;
use std::env;

/// Prefixes of variables worth seeing when debugging a pipeline
const PREFIXES: [&str; 3] = ["CI", "GITLAB", "NAGGER"];

/// Print CI-related environment variables, sorted by name
///
/// Values of token and password variables are masked.
pub fn run_debug_variables() {
    for (key, value) in ci_variables(env::vars()) {
        println!("{key}={value}");
    }
}

fn ci_variables(vars: impl Iterator<Item = (String, String)>) -> Vec<(String, String)> {
    let mut vars: Vec<(String, String)> = vars
        .filter(|(key, _)| PREFIXES.iter().any(|p| key.starts_with(p)))
        .map(|(key, value)| {
            if key.contains("TOKEN") || key.contains("PASSWORD") {
                (key, "[masked]".to_string())
            } else {
                (key, value)
            }
        })
        .collect();
    vars.sort();
    vars
}

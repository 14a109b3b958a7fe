#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Writes an executable shell script standing in for the `rdme` CLI.
/// The script appends its arguments and `RDME_API_KEY` to `calls.log`
/// next to itself, then prints `output`.
#[cfg(unix)]
pub fn fake_rdme(dir: &Path, output: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-rdme");
    let log = dir.join("calls.log");
    let body = format!(
        "#!/bin/sh\necho \"$* key=$RDME_API_KEY\" >> '{}'\ncat <<'OUT'\n{}\nOUT\n",
        log.display(),
        output
    );
    fs::write(&script, body).expect("write fake rdme");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod fake rdme");
    script
}

pub fn recorded_calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

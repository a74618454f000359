//! Shell stand-ins for `stat`, `matchpathcon` and `chcon`.
//!
//! # Design
//! - Labels live in sidecar files (`<path>.selctx-label`) so tests never need SELinux.
//! - Scripts are run through `/bin/sh`, so no executable bit is required.
//! - Every `chcon` invocation is appended to `<path>.selctx-calls` for assertions.
//! - The fake `chcon` follows symlinks unless called with `-h`, like the real one.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const SHELL: &str = "/bin/sh";
const LABEL_SUFFIX: &str = ".selctx-label";
const DEFAULT_SUFFIX: &str = ".selctx-default";
const CALLS_SUFFIX: &str = ".selctx-calls";

const QUERY_SCRIPT: &str = r#"#!/bin/sh
if [ -f "$1.selctx-label" ]; then
    cat "$1.selctx-label"
else
    echo "stat: failed to get security context of '$1': Operation not supported" >&2
    exit 1
fi
"#;

const DEFAULT_SCRIPT: &str = r#"#!/bin/sh
if [ -f "$1.selctx-default" ]; then
    cat "$1.selctx-default"
else
    echo "<<none>>"
fi
"#;

const APPLY_SCRIPT: &str = r#"#!/bin/sh
dereference=1
if [ "$1" = "-h" ]; then
    dereference=0
    shift
fi
flag="$1"
value="$2"
target="$3"
if [ "$dereference" = 1 ] && [ -L "$target" ]; then
    target=$(readlink -f "$target")
fi
label="$target.selctx-label"
echo "$flag $value" >> "$target.selctx-calls"
if [ ! -f "$label" ]; then
    echo "chcon: can't apply partial context to unlabeled file '$target'" >&2
    exit 1
fi
IFS=: read -r user role type rest < "$label"
case "$flag" in
    -u) user="$value" ;;
    -r) role="$value" ;;
    -t) type="$value" ;;
    *) echo "chcon: invalid option -- '$flag'" >&2; exit 1 ;;
esac
if [ -n "$rest" ]; then
    printf '%s:%s:%s:%s\n' "$user" "$role" "$type" "$rest" > "$label"
else
    printf '%s:%s:%s\n' "$user" "$role" "$type" > "$label"
fi
"#;

/// Installed set of fake label tools.
#[derive(Debug, Clone)]
pub struct FakeToolbox {
    query: PathBuf,
    default: PathBuf,
    apply: PathBuf,
}

impl FakeToolbox {
    /// Write the fake tool scripts into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if any script cannot be written.
    pub fn install(dir: &Path) -> Result<Self> {
        let bin = dir.join("bin");
        fs::create_dir_all(&bin)
            .with_context(|| format!("failed to create {}", bin.display()))?;
        let toolbox = Self {
            query: bin.join("stat.sh"),
            default: bin.join("matchpathcon.sh"),
            apply: bin.join("chcon.sh"),
        };
        for (path, body) in [
            (&toolbox.query, QUERY_SCRIPT),
            (&toolbox.default, DEFAULT_SCRIPT),
            (&toolbox.apply, APPLY_SCRIPT),
        ] {
            fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(toolbox)
    }

    /// Argument vector standing in for `stat -c %C`.
    #[must_use]
    pub fn query_command(&self) -> Vec<String> {
        Self::shell_command(&self.query)
    }

    /// Argument vector standing in for `matchpathcon -n`.
    #[must_use]
    pub fn default_command(&self) -> Vec<String> {
        Self::shell_command(&self.default)
    }

    /// Argument vector standing in for `chcon`.
    #[must_use]
    pub fn apply_command(&self) -> Vec<String> {
        Self::shell_command(&self.apply)
    }

    /// Record `raw` as the current label of `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar cannot be written.
    pub fn set_label(target: &Path, raw: &str) -> Result<()> {
        let sidecar = sidecar(target, LABEL_SUFFIX);
        fs::write(&sidecar, format!("{raw}\n"))
            .with_context(|| format!("failed to write {}", sidecar.display()))
    }

    /// Record `raw` as the policy default for `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar cannot be written.
    pub fn set_default(target: &Path, raw: &str) -> Result<()> {
        let sidecar = sidecar(target, DEFAULT_SUFFIX);
        fs::write(&sidecar, format!("{raw}\n"))
            .with_context(|| format!("failed to write {}", sidecar.display()))
    }

    /// Current label recorded for `target`, if any.
    #[must_use]
    pub fn label(target: &Path) -> Option<String> {
        fs::read_to_string(sidecar(target, LABEL_SUFFIX))
            .ok()
            .map(|raw| raw.trim().to_string())
    }

    /// `chcon` invocations recorded for `target`, oldest first.
    #[must_use]
    pub fn calls(target: &Path) -> Vec<String> {
        fs::read_to_string(sidecar(target, CALLS_SUFFIX))
            .map(|raw| raw.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn shell_command(script: &Path) -> Vec<String> {
        vec![SHELL.to_string(), script.display().to_string()]
    }
}

fn sidecar(target: &Path, suffix: &str) -> PathBuf {
    let mut raw = target.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

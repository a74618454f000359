//! Tool-backed label accessor (`stat`, `matchpathcon`, `chcon`).
//!
//! # Design
//! - Each tool is an argument-vector prefix; the accessor appends operation arguments and the
//!   target path, so wrappers such as `sudo chcon` are plain configuration.
//! - Existence is decided with `symlink_metadata` before any tool runs.
//! - `chcon` runs with `-h` so a symlink is relabelled itself, as it is queried.
//! - Non-zero exits surface as system failures with the tool's stderr attached.

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accessor::{LabelAccessor, LabelQuery};
use crate::error::{LabelError, LabelResult};
use crate::label::{FieldKind, LabelFormat, SecurityLabel, validate_field_value};

/// Marker `matchpathcon` prints when no policy entry matches.
const NO_DEFAULT_MARKER: &str = "<<none>>";

/// Makes `chcon` act on a symlink instead of its target.
const NO_DEREFERENCE_FLAG: &str = "-h";

/// A program plus leading arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCommand(Vec<String>);

impl ToolCommand {
    /// Build a command from an argument vector.
    #[must_use]
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(argv.into_iter().map(Into::into).collect())
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Arguments passed ahead of the operation arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    /// `true` when no program is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.first().is_none_or(|program| program.trim().is_empty())
    }
}

/// The three tools the accessor drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSet {
    /// Prints the current label of a path.
    pub query: ToolCommand,
    /// Prints the policy default label of a path.
    pub default: ToolCommand,
    /// Changes one label field of a path, called as `<apply> -h <flag> <value> <path>`.
    pub apply: ToolCommand,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self {
            query: ToolCommand::new(["stat", "-c", "%C"]),
            default: ToolCommand::new(["matchpathcon", "-n"]),
            apply: ToolCommand::new(["chcon"]),
        }
    }
}

/// Platform accessor that shells out to the SELinux userland tools.
#[derive(Debug, Clone, Default)]
pub struct CommandAccessor {
    tools: ToolSet,
    format: LabelFormat,
}

impl CommandAccessor {
    /// Create an accessor from a tool set and the platform label format.
    #[must_use]
    pub const fn new(tools: ToolSet, format: LabelFormat) -> Self {
        Self { tools, format }
    }

    /// Tools the accessor invokes.
    #[must_use]
    pub const fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Label format used to decompose tool output.
    #[must_use]
    pub const fn format(&self) -> LabelFormat {
        self.format
    }

    fn run(
        operation: &'static str,
        tool: &ToolCommand,
        extra: &[&str],
        path: &Path,
    ) -> LabelResult<String> {
        let program = match tool.program() {
            Some(program) if !tool.is_empty() => program,
            _ => return Err(LabelError::EmptyCommand { operation }),
        };
        debug!(
            operation,
            program,
            path = %path.display(),
            "invoking label tool"
        );
        let output = Command::new(program)
            .args(tool.args())
            .args(extra)
            .arg(path)
            .output()
            .map_err(|source| LabelError::Spawn {
                operation,
                program: program.to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(LabelError::CommandFailed {
                operation,
                path: path.to_path_buf(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8(output.stdout).map_err(|source| {
            LabelError::OutputEncoding {
                operation,
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(stdout.trim().to_string())
    }
}

impl LabelAccessor for CommandAccessor {
    fn current_label(&self, path: &Path) -> LabelResult<LabelQuery> {
        match fs::symlink_metadata(path) {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(LabelQuery::Absent),
            Err(source) => return Err(LabelError::io("stat", path, source)),
        }
        let raw = Self::run("query_label", &self.tools.query, &[], path)?;
        self.format.parse(&raw).map(LabelQuery::Present)
    }

    fn default_label(&self, path: &Path) -> LabelResult<Option<SecurityLabel>> {
        let raw = Self::run("query_default_label", &self.tools.default, &[], path)?;
        if raw.is_empty() || raw == NO_DEFAULT_MARKER {
            return Ok(None);
        }
        self.format.parse(&raw).map(Some)
    }

    fn apply_field(&self, path: &Path, field: FieldKind, value: &str) -> LabelResult<()> {
        validate_field_value(field, value)?;
        Self::run(
            "set_label_field",
            &self.tools.apply,
            &[NO_DEREFERENCE_FLAG, field.flag(), value],
            path,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use selctx_test_support::fixtures::temp_dir;
    use selctx_test_support::toolbox::FakeToolbox;

    fn fake_accessor(toolbox: &FakeToolbox, format: LabelFormat) -> CommandAccessor {
        CommandAccessor::new(
            ToolSet {
                query: ToolCommand::new(toolbox.query_command()),
                default: ToolCommand::new(toolbox.default_command()),
                apply: ToolCommand::new(toolbox.apply_command()),
            },
            format,
        )
    }

    #[test]
    fn default_tools_match_userland_invocations() {
        let tools = ToolSet::default();
        assert_eq!(tools.query.program(), Some("stat"));
        assert_eq!(tools.query.args(), ["-c", "%C"]);
        assert_eq!(tools.default.args(), ["-n"]);
        assert_eq!(tools.apply.program(), Some("chcon"));
        assert!(tools.apply.args().is_empty());
    }

    #[test]
    fn tool_command_detects_empty_program() {
        assert!(ToolCommand::new(Vec::<String>::new()).is_empty());
        assert!(ToolCommand::new([" "]).is_empty());
        assert!(!ToolCommand::new(["chcon"]).is_empty());
    }

    #[test]
    fn missing_path_is_absent_without_running_tools() -> Result<()> {
        let dir = temp_dir()?;
        let accessor = CommandAccessor::new(
            ToolSet {
                query: ToolCommand::new(["/definitely/missing/stat"]),
                ..ToolSet::default()
            },
            LabelFormat::Triple,
        );
        let query = accessor.current_label(&dir.path().join("missing"))?;
        assert!(query.is_absent());
        Ok(())
    }

    #[test]
    fn current_label_parses_tool_output() -> Result<()> {
        let dir = temp_dir()?;
        let toolbox = FakeToolbox::install(dir.path())?;
        let target = dir.path().join("index.html");
        fs::write(&target, "hello")?;
        FakeToolbox::set_label(&target, "system_u:object_r:root_t")?;

        let accessor = fake_accessor(&toolbox, LabelFormat::Triple);
        let query = accessor.current_label(&target)?;
        let label = query.label().ok_or_else(|| anyhow::anyhow!("label missing"))?;
        assert_eq!(label.type_(), "root_t");
        Ok(())
    }

    #[test]
    fn malformed_tool_output_is_a_parse_failure() -> Result<()> {
        let dir = temp_dir()?;
        let toolbox = FakeToolbox::install(dir.path())?;
        let target = dir.path().join("index.html");
        fs::write(&target, "hello")?;
        FakeToolbox::set_label(&target, "system_u:object_r")?;

        let accessor = fake_accessor(&toolbox, LabelFormat::Triple);
        let err = accessor
            .current_label(&target)
            .expect_err("two components must not parse");
        assert!(err.is_parse_failure());
        Ok(())
    }

    #[test]
    fn failing_query_tool_is_a_system_failure() -> Result<()> {
        let dir = temp_dir()?;
        let toolbox = FakeToolbox::install(dir.path())?;
        let target = dir.path().join("unlabeled");
        fs::write(&target, "hello")?;

        let accessor = fake_accessor(&toolbox, LabelFormat::Triple);
        match accessor.current_label(&target) {
            Err(LabelError::CommandFailed { status, stderr, .. }) => {
                assert_eq!(status, Some(1));
                assert!(stderr.contains("failed to get security context"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn default_label_handles_none_marker() -> Result<()> {
        let dir = temp_dir()?;
        let toolbox = FakeToolbox::install(dir.path())?;
        let accessor = fake_accessor(&toolbox, LabelFormat::Triple);
        let target = dir.path().join("srv");

        assert!(accessor.default_label(&target)?.is_none());
        FakeToolbox::set_default(&target, "system_u:object_r:var_t")?;
        let default = accessor
            .default_label(&target)?
            .ok_or_else(|| anyhow::anyhow!("default missing"))?;
        assert_eq!(default.type_(), "var_t");
        Ok(())
    }

    #[test]
    fn apply_field_changes_only_one_component() -> Result<()> {
        let dir = temp_dir()?;
        let toolbox = FakeToolbox::install(dir.path())?;
        let target = dir.path().join("index.html");
        fs::write(&target, "hello")?;
        FakeToolbox::set_label(&target, "system_u:object_r:root_t:s0")?;

        let accessor = fake_accessor(&toolbox, LabelFormat::Mls);
        accessor.apply_field(&target, FieldKind::Type, "httpd_sys_content_t")?;
        assert_eq!(
            FakeToolbox::label(&target).as_deref(),
            Some("system_u:object_r:httpd_sys_content_t:s0")
        );
        accessor.apply_field(&target, FieldKind::Type, "httpd_sys_content_t")?;
        assert_eq!(
            FakeToolbox::label(&target).as_deref(),
            Some("system_u:object_r:httpd_sys_content_t:s0")
        );
        assert_eq!(
            FakeToolbox::calls(&target),
            vec!["-t httpd_sys_content_t", "-t httpd_sys_content_t"]
        );
        Ok(())
    }

    #[test]
    fn apply_field_relabels_symlinks_without_following_them() -> Result<()> {
        let dir = temp_dir()?;
        let toolbox = FakeToolbox::install(dir.path())?;
        let target = dir.path().join("index.html");
        fs::write(&target, "hello")?;
        FakeToolbox::set_label(&target, "system_u:object_r:root_t")?;
        let link = dir.path().join("current");
        std::os::unix::fs::symlink(&target, &link)?;
        FakeToolbox::set_label(&link, "system_u:object_r:root_t")?;

        let accessor = fake_accessor(&toolbox, LabelFormat::Triple);
        accessor.apply_field(&link, FieldKind::Type, "httpd_sys_content_t")?;
        assert_eq!(
            FakeToolbox::label(&link).as_deref(),
            Some("system_u:object_r:httpd_sys_content_t")
        );
        assert_eq!(
            FakeToolbox::label(&target).as_deref(),
            Some("system_u:object_r:root_t")
        );
        Ok(())
    }

    #[test]
    fn apply_field_rejects_invalid_values_before_running_tools() -> Result<()> {
        let dir = temp_dir()?;
        let toolbox = FakeToolbox::install(dir.path())?;
        let target = dir.path().join("index.html");
        fs::write(&target, "hello")?;
        FakeToolbox::set_label(&target, "system_u:object_r:root_t")?;

        let accessor = fake_accessor(&toolbox, LabelFormat::Triple);
        let err = accessor
            .apply_field(&target, FieldKind::Role, "object_r:s0")
            .expect_err("separator must be rejected");
        assert!(matches!(err, LabelError::InvalidField { field: "role", .. }));
        assert!(FakeToolbox::calls(&target).is_empty());
        Ok(())
    }

    #[test]
    fn empty_tool_is_reported() {
        let accessor = CommandAccessor::new(
            ToolSet {
                apply: ToolCommand::new(Vec::<String>::new()),
                ..ToolSet::default()
            },
            LabelFormat::Triple,
        );
        let err = accessor
            .apply_field(Path::new("/srv/www"), FieldKind::User, "system_u")
            .expect_err("empty tool must fail");
        assert!(matches!(
            err,
            LabelError::EmptyCommand {
                operation: "set_label_field"
            }
        ));
        assert!(err.is_system_failure());
    }

    #[test]
    fn unknown_program_is_a_spawn_failure() {
        let accessor = CommandAccessor::new(
            ToolSet {
                default: ToolCommand::new(["/definitely/missing/matchpathcon"]),
                ..ToolSet::default()
            },
            LabelFormat::Triple,
        );
        let err = accessor
            .default_label(Path::new("/srv/www"))
            .expect_err("missing program must fail");
        assert!(matches!(err, LabelError::Spawn { .. }));
    }
}

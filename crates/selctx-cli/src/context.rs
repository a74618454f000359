//! Shared error types, exit codes and the per-run context.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use anyhow::anyhow;
use selctx_config::{
    ConfigError, LabelDeclaration, Manifest, Settings, apply_env_overrides, load_manifest,
    validate_settings,
};
use selctx_label::CommandAccessor;
use selctx_telemetry::Metrics;

use crate::cli::{Cli, OutputFormat};

/// Every field converged or was already in sync.
pub(crate) const EXIT_OK: i32 = 0;
/// Check mode found at least one divergent field.
pub(crate) const EXIT_DRIFT: i32 = 1;
/// At least one field failed to converge.
pub(crate) const EXIT_FAILED: i32 = 3;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => EXIT_FAILED,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Rendered text plus the exit code a command finished with.
#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub(crate) text: String,
    pub(crate) exit_code: i32,
}

/// Settings, declarations and sinks shared by command handlers.
pub(crate) struct AppContext {
    pub(crate) settings: Settings,
    pub(crate) resources: Vec<LabelDeclaration>,
    pub(crate) output: OutputFormat,
    pub(crate) metrics: Metrics,
    pub(crate) metrics_file: Option<PathBuf>,
}

impl AppContext {
    /// Resolve settings from the manifest, then the environment, then command-line flags.
    pub(crate) fn load<F>(cli: &Cli, lookup: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Manifest {
            mut settings,
            resources,
        } = match &cli.manifest {
            Some(path) => load_manifest(path).map_err(|err| {
                CliError::validation(format!(
                    "manifest {} rejected: {}",
                    path.display(),
                    describe_config_error(&err)
                ))
            })?,
            None => Manifest::default(),
        };
        apply_env_overrides(&mut settings, lookup)
            .map_err(|err| CliError::validation(describe_config_error(&err)))?;

        if let Some(format) = cli.label_format {
            settings.label_format = format;
        }
        if let Some(level) = &cli.log_level {
            settings.logging.level.clone_from(level);
        }
        if let Some(format) = cli.log_format {
            settings.logging.format = format;
        }
        validate_settings(&settings)
            .map_err(|err| CliError::validation(describe_config_error(&err)))?;

        let metrics = Metrics::new()
            .map_err(|err| CliError::failure(anyhow!("failed to build metrics registry: {err}")))?;
        Ok(Self {
            settings,
            resources,
            output: cli.output,
            metrics,
            metrics_file: cli.metrics_file.clone(),
        })
    }

    /// Accessor configured from the resolved settings.
    pub(crate) fn accessor(&self) -> CommandAccessor {
        CommandAccessor::new(self.settings.tools.clone(), self.settings.label_format)
    }

    /// Write the metrics exposition when `--metrics-file` was given.
    pub(crate) fn flush_metrics(&self) -> CliResult<()> {
        let Some(path) = &self.metrics_file else {
            return Ok(());
        };
        self.metrics
            .write_textfile(path)
            .map_err(|err| CliError::failure(anyhow!("failed to write metrics: {err}")))
    }
}

#[cfg(test)]
impl AppContext {
    /// Context wired to the shell tool stand-ins, without a manifest.
    pub(crate) fn with_toolbox(
        toolbox: &selctx_test_support::toolbox::FakeToolbox,
        output: OutputFormat,
    ) -> Self {
        use selctx_label::{ToolCommand, ToolSet};

        let mut settings = Settings::default();
        settings.tools = ToolSet {
            query: ToolCommand::new(toolbox.query_command()),
            default: ToolCommand::new(toolbox.default_command()),
            apply: ToolCommand::new(toolbox.apply_command()),
        };
        Self {
            settings,
            resources: Vec::new(),
            output,
            metrics: Metrics::new().expect("metrics registry"),
            metrics_file: None,
        }
    }
}

pub(crate) fn describe_config_error(err: &ConfigError) -> String {
    match err {
        ConfigError::InvalidField {
            section,
            field,
            value,
            reason,
        } => match value {
            Some(value) => format!("{section}.{field} '{value}' {reason}"),
            None => format!("{section}.{field} {reason}"),
        },
        ConfigError::InvalidEnv {
            variable,
            value,
            reason,
        } => format!("{variable}='{value}' {reason}"),
        ConfigError::Json { path, source } => {
            format!("{} is not a valid manifest: {source}", path.display())
        }
        ConfigError::Io {
            operation,
            path,
            source,
        } => format!("{operation} {} failed: {source}", path.display()),
    }
}

use selctx_config::{LabelDeclaration, Manifest, validate_manifest};
use selctx_label::FieldKind;
use selctx_property::{ConvergeMode, Convergence, ConvergenceReport, EnsureKind};
use tracing::info;

use crate::cli::FieldArgs;
use crate::context::{
    AppContext, CliError, CliResult, CommandOutput, EXIT_DRIFT, EXIT_FAILED, EXIT_OK,
    describe_config_error,
};
use crate::output::{ReportView, render_reports};

pub(crate) fn handle_converge(
    ctx: &AppContext,
    args: &FieldArgs,
    ensure: EnsureKind,
    mode: ConvergeMode,
) -> CliResult<CommandOutput> {
    let declarations = collect_declarations(ctx, args, ensure)?;
    let accessor = ctx.accessor();
    let driver = Convergence::new(&accessor)
        .with_mode(mode)
        .with_metrics(ctx.metrics.clone());

    let reports: Vec<ConvergenceReport> = declarations
        .iter()
        .map(|declaration| driver.converge(&declaration.resource(), &declaration.properties()))
        .collect();
    info!(
        mode = ?mode,
        resources = reports.len(),
        changed = reports.iter().filter(|report| report.changed()).count(),
        failed = reports.iter().filter(|report| report.failed()).count(),
        "convergence finished"
    );
    ctx.flush_metrics()?;

    let views: Vec<ReportView> = reports.iter().map(ReportView::from).collect();
    Ok(CommandOutput {
        text: render_reports(&views, ctx.output)?,
        exit_code: exit_code(mode, &reports),
    })
}

fn collect_declarations(
    ctx: &AppContext,
    args: &FieldArgs,
    ensure: EnsureKind,
) -> CliResult<Vec<LabelDeclaration>> {
    let flagged = args.user.is_some() || args.role.is_some() || args.type_.is_some();
    if flagged && args.paths.is_empty() {
        return Err(CliError::validation(
            "--user, --role and --type apply to PATH arguments; none were given",
        ));
    }

    let mut declarations = ctx.resources.clone();
    for path in &args.paths {
        let path = std::path::absolute(path).map_err(|err| {
            CliError::validation(format!("cannot resolve path '{}': {err}", path.display()))
        })?;
        declarations.push(
            LabelDeclaration::new(path)
                .with_field(FieldKind::User, args.user.clone())
                .with_field(FieldKind::Role, args.role.clone())
                .with_field(FieldKind::Type, args.type_.clone())
                .with_ensure(ensure),
        );
    }
    if declarations.is_empty() {
        return Err(CliError::validation(
            "no paths to converge; pass PATH arguments or --manifest",
        ));
    }

    let manifest = Manifest {
        settings: ctx.settings.clone(),
        resources: declarations,
    };
    validate_manifest(&manifest).map_err(|err| CliError::validation(describe_config_error(&err)))?;
    Ok(manifest.resources)
}

fn exit_code(mode: ConvergeMode, reports: &[ConvergenceReport]) -> i32 {
    if reports.iter().any(ConvergenceReport::failed) {
        EXIT_FAILED
    } else if mode == ConvergeMode::Check && reports.iter().any(ConvergenceReport::drifted) {
        EXIT_DRIFT
    } else {
        EXIT_OK
    }
}

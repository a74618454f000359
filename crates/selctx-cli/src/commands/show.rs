use std::path::{Path, PathBuf};

use selctx_label::{LabelAccessor, LabelQuery};
use tracing::warn;

use crate::cli::ShowArgs;
use crate::context::{AppContext, CliError, CliResult, CommandOutput, EXIT_FAILED, EXIT_OK};
use crate::output::{LabelView, describe_label_error, render_labels};

pub(crate) fn handle_show(ctx: &AppContext, args: &ShowArgs) -> CliResult<CommandOutput> {
    let paths: Vec<PathBuf> = if args.paths.is_empty() {
        ctx.resources
            .iter()
            .map(|declaration| declaration.path.clone())
            .collect()
    } else {
        args.paths.clone()
    };
    if paths.is_empty() {
        return Err(CliError::validation(
            "no paths to show; pass PATH arguments or --manifest",
        ));
    }

    let accessor = ctx.accessor();
    let views: Vec<LabelView> = paths.iter().map(|path| inspect(&accessor, path)).collect();
    let exit_code = if views.iter().any(|view| view.error.is_some()) {
        EXIT_FAILED
    } else {
        EXIT_OK
    };
    Ok(CommandOutput {
        text: render_labels(&views, ctx.output)?,
        exit_code,
    })
}

fn inspect<A: LabelAccessor + ?Sized>(accessor: &A, path: &Path) -> LabelView {
    let mut errors = Vec::new();
    let current = match accessor.current_label(path) {
        Ok(LabelQuery::Present(label)) => Some(label.to_string()),
        Ok(LabelQuery::Absent) => None,
        Err(err) => {
            errors.push(describe_label_error(&err));
            None
        }
    };
    let default = match accessor.default_label(path) {
        Ok(default) => default.map(|label| label.to_string()),
        Err(err) => {
            errors.push(describe_label_error(&err));
            None
        }
    };
    if !errors.is_empty() {
        warn!(path = %path.display(), "label inspection failed");
    }
    LabelView {
        path: path.display().to_string(),
        current,
        default,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    }
}

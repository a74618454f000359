use std::fs;

use selctx_label::{CommandAccessor, FieldKind, LabelAccessor, LabelFormat, ToolSet};
use selctx_test_support::fixtures::{selinux_available, temp_dir};

#[test]
fn command_accessor_reads_and_rewrites_live_labels() -> anyhow::Result<()> {
    if !selinux_available() {
        eprintln!("skipping command_accessor_reads_and_rewrites_live_labels: SELinux unavailable");
        return Ok(());
    }
    let dir = temp_dir()?;
    let target = dir.path().join("probe");
    fs::write(&target, "probe")?;

    let accessor = CommandAccessor::new(ToolSet::default(), LabelFormat::Mls);
    let before = accessor
        .current_label(&target)?
        .label()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("probe should exist"))?;

    accessor.apply_field(&target, FieldKind::Type, before.type_())?;

    let after = accessor
        .current_label(&target)?
        .label()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("probe should still exist"))?;
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn command_accessor_reports_missing_paths_as_absent() -> anyhow::Result<()> {
    let dir = temp_dir()?;
    let accessor = CommandAccessor::default();
    for _ in FieldKind::ALL {
        assert!(accessor.current_label(&dir.path().join("missing"))?.is_absent());
    }
    Ok(())
}

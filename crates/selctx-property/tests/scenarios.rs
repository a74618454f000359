//! End-to-end convergence against the shell tool stand-ins.

use std::fs;
use std::path::Path;

use anyhow::Result;
use selctx_label::{CommandAccessor, FieldKind, LabelFormat, ToolCommand, ToolSet};
use selctx_property::{
    ConvergeMode, Convergence, EnsureKind, FieldOutcome, FieldProperty, FileResource,
    ManagedResource, PropertyError,
};
use selctx_test_support::fixtures::temp_dir;
use selctx_test_support::toolbox::FakeToolbox;

fn accessor(toolbox: &FakeToolbox) -> CommandAccessor {
    CommandAccessor::new(
        ToolSet {
            query: ToolCommand::new(toolbox.query_command()),
            default: ToolCommand::new(toolbox.default_command()),
            apply: ToolCommand::new(toolbox.apply_command()),
        },
        LabelFormat::Triple,
    )
}

fn labelled_file(dir: &Path, name: &str, label: &str) -> Result<FileResource> {
    let path = dir.join(name);
    fs::write(&path, "<html></html>")?;
    FakeToolbox::set_label(&path, label)?;
    Ok(FileResource::new(path, EnsureKind::Present))
}

#[test]
fn only_the_declared_type_is_synced() -> Result<()> {
    let dir = temp_dir()?;
    let toolbox = FakeToolbox::install(dir.path())?;
    let resource = labelled_file(dir.path(), "index.html", "system_u:object_r:root_t")?;
    FakeToolbox::set_default(resource.path(), "system_u:object_r:httpd_sys_content_t")?;

    let accessor = accessor(&toolbox);
    let properties = FieldProperty::for_label(None, None, Some("httpd_sys_content_t".into()));
    let report = Convergence::new(&accessor).converge(&resource, &properties);

    let outcomes: Vec<&str> = report
        .fields
        .iter()
        .map(|field| field.outcome.label())
        .collect();
    assert_eq!(outcomes, vec!["in_sync", "in_sync", "synced"]);
    assert!(report.changed());
    assert_eq!(
        FakeToolbox::label(resource.path()).as_deref(),
        Some("system_u:object_r:httpd_sys_content_t")
    );
    assert_eq!(
        FakeToolbox::calls(resource.path()),
        vec!["-t httpd_sys_content_t"]
    );
    Ok(())
}

#[test]
fn second_pass_is_in_sync() -> Result<()> {
    let dir = temp_dir()?;
    let toolbox = FakeToolbox::install(dir.path())?;
    let resource = labelled_file(dir.path(), "index.html", "system_u:object_r:root_t")?;
    let accessor = accessor(&toolbox);
    let properties = FieldProperty::for_label(
        Some("system_u".into()),
        Some("object_r".into()),
        Some("httpd_sys_content_t".into()),
    );
    let driver = Convergence::new(&accessor);

    assert!(driver.converge(&resource, &properties).changed());
    let second = driver.converge(&resource, &properties);
    assert!(!second.changed());
    assert!(
        second
            .fields
            .iter()
            .all(|field| matches!(field.outcome, FieldOutcome::InSync { .. }))
    );
    assert_eq!(FakeToolbox::calls(resource.path()).len(), 1);
    Ok(())
}

#[test]
fn symlinked_resource_converges_on_the_link() -> Result<()> {
    let dir = temp_dir()?;
    let toolbox = FakeToolbox::install(dir.path())?;
    let target = labelled_file(dir.path(), "index.html", "system_u:object_r:root_t")?;
    let link = dir.path().join("current");
    std::os::unix::fs::symlink(target.path(), &link)?;
    FakeToolbox::set_label(&link, "system_u:object_r:root_t")?;
    let resource = FileResource::new(link, EnsureKind::Present);
    let accessor = accessor(&toolbox);
    let properties = FieldProperty::for_label(None, None, Some("httpd_sys_content_t".into()));
    let driver = Convergence::new(&accessor);

    assert!(driver.converge(&resource, &properties).changed());
    let second = driver.converge(&resource, &properties);
    assert!(!second.changed());
    assert!(matches!(
        second.fields[2].outcome,
        FieldOutcome::InSync { .. }
    ));
    assert_eq!(
        FakeToolbox::label(target.path()).as_deref(),
        Some("system_u:object_r:root_t")
    );
    Ok(())
}

#[test]
fn two_component_label_fails_every_field_without_sync() -> Result<()> {
    let dir = temp_dir()?;
    let toolbox = FakeToolbox::install(dir.path())?;
    let resource = labelled_file(dir.path(), "index.html", "system_u:object_r")?;
    let accessor = accessor(&toolbox);
    let properties = FieldProperty::for_label(
        Some("system_u".into()),
        Some("object_r".into()),
        Some("httpd_sys_content_t".into()),
    );

    let report = Convergence::new(&accessor).converge(&resource, &properties);
    for field in &report.fields {
        match &field.outcome {
            FieldOutcome::Failed { error, .. } => assert!(error.is_parse_failure()),
            other => panic!("{} should fail to parse, got {other:?}", field.kind),
        }
    }
    assert!(FakeToolbox::calls(resource.path()).is_empty());
    Ok(())
}

#[test]
fn role_sync_leaves_user_and_type_alone() -> Result<()> {
    let dir = temp_dir()?;
    let toolbox = FakeToolbox::install(dir.path())?;
    let resource = labelled_file(dir.path(), "socket", "system_u:object_r:root_t")?;
    let accessor = accessor(&toolbox);

    let role = FieldProperty::new(FieldKind::Role, Some("system_r".into()));
    let report = Convergence::new(&accessor).converge_field(&role, &resource);
    assert!(matches!(report.outcome, FieldOutcome::Synced { .. }));
    assert_eq!(
        FakeToolbox::label(resource.path()).as_deref(),
        Some("system_u:system_r:root_t")
    );
    Ok(())
}

#[test]
fn undeclared_field_without_default_never_syncs() -> Result<()> {
    let dir = temp_dir()?;
    let toolbox = FakeToolbox::install(dir.path())?;
    let resource = labelled_file(dir.path(), "index.html", "system_u:object_r:root_t")?;
    let accessor = accessor(&toolbox);

    let properties = FieldProperty::for_label(None, None, None);
    let report = Convergence::new(&accessor).converge(&resource, &properties);
    assert!(
        report
            .fields
            .iter()
            .all(|field| matches!(field.outcome, FieldOutcome::Unconstrained))
    );
    assert!(FakeToolbox::calls(resource.path()).is_empty());
    Ok(())
}

#[test]
fn failed_creation_aborts_before_any_label_change() -> Result<()> {
    let dir = temp_dir()?;
    let toolbox = FakeToolbox::install(dir.path())?;
    let path = dir.path().join("missing").join("index.html");
    let resource = FileResource::new(&path, EnsureKind::File);
    let accessor = accessor(&toolbox);

    let property = FieldProperty::new(FieldKind::Type, Some("httpd_sys_content_t".into()));
    let report = Convergence::new(&accessor).converge_field(&property, &resource);
    assert!(matches!(
        report.outcome,
        FieldOutcome::Failed {
            error: PropertyError::Create { .. },
            ..
        }
    ));
    assert!(FakeToolbox::calls(&path).is_empty());
    Ok(())
}

#[test]
fn missing_file_is_created_then_labelled() -> Result<()> {
    let dir = temp_dir()?;
    let toolbox = FakeToolbox::install(dir.path())?;
    let path = dir.path().join("index.html");
    // Label the policy would assign on creation.
    FakeToolbox::set_label(&path, "system_u:object_r:default_t")?;
    let resource = FileResource::new(&path, EnsureKind::File);
    let accessor = accessor(&toolbox);

    let property = FieldProperty::new(FieldKind::Type, Some("httpd_sys_content_t".into()));
    let report = Convergence::new(&accessor).converge_field(&property, &resource);
    assert!(matches!(
        &report.outcome,
        FieldOutcome::Synced { previous, .. } if previous.value().is_none()
    ));
    assert!(path.is_file());
    assert_eq!(
        FakeToolbox::label(&path).as_deref(),
        Some("system_u:object_r:httpd_sys_content_t")
    );
    Ok(())
}

#[test]
fn check_mode_leaves_missing_files_alone() -> Result<()> {
    let dir = temp_dir()?;
    let toolbox = FakeToolbox::install(dir.path())?;
    let path = dir.path().join("index.html");
    let resource = FileResource::new(&path, EnsureKind::File);
    let accessor = accessor(&toolbox);

    let properties = FieldProperty::for_label(None, None, Some("httpd_sys_content_t".into()));
    let report = Convergence::new(&accessor)
        .with_mode(ConvergeMode::Check)
        .converge(&resource, &properties);
    assert!(report.drifted());
    assert!(!path.exists());
    Ok(())
}

//! Release orchestration tests against the mock forge

mod common;

use common::{
    make_change, make_issue, make_milestone, make_milestone_with_window, make_project, merged_at,
    utc, MockForge, WriteCall,
};
use nagger::changelog::NO_CHANGES;
use nagger::classify::Taxonomy;
use nagger::error::Error;
use nagger::release::{
    build_issue_report, build_milestone_changelog, discover_projects, fixup_milestone,
    release_milestones, run_release, NoopProgress, ProjectStatus, ReleaseRequest, Step,
};
use nagger::types::{MilestoneState, Project};

fn paths(projects: &[&Project]) -> Vec<String> {
    projects.iter().map(|p| p.path.clone()).collect()
}

/// Three projects; `group/b` has no `v1.2` milestone
fn three_projects() -> (MockForge, Vec<Project>) {
    let forge = MockForge::new();
    let a = make_project(1, "group/a");
    let b = make_project(2, "group/b");
    let c = make_project(3, "group/c");
    let milestone = make_milestone(10, "v1.2");

    for project in [&a, &b, &c] {
        forge.add_project(project);
    }
    forge.add_milestone(&a, &milestone);
    forge.add_milestone(&c, &milestone);
    forge.set_merged(
        &a,
        &milestone,
        vec![
            make_change(&a, 1, "Add export", &["feature"]),
            make_change(&a, 2, "Fix crash", &["bug"]),
        ],
    );
    forge.set_merged(&c, &milestone, vec![make_change(&c, 7, "Update docs", &["docs"])]);

    (forge, vec![a, b, c])
}

fn request() -> ReleaseRequest {
    ReleaseRequest::from_tag("v1.2.0").unwrap()
}

#[tokio::test]
async fn test_partial_failure_is_isolated() {
    let (forge, projects) = three_projects();
    let paths = paths(&projects.iter().collect::<Vec<_>>());

    let report = run_release(&forge, &paths, &request(), &Taxonomy::default(), &NoopProgress).await;

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.failed_count(), 1);
    assert!(matches!(report.outcomes[0].status, ProjectStatus::Released { .. }));
    assert!(matches!(report.outcomes[2].status, ProjectStatus::Released { .. }));

    let failed = &report.outcomes[1];
    assert_eq!(failed.project, "group/b");
    match &failed.status {
        ProjectStatus::Failed { step, error } => {
            assert_eq!(*step, Step::ResolveMilestone);
            assert!(matches!(error, Error::MilestoneNotFound { .. }));
        }
        other => panic!("expected failure, got {other:?}"),
    }

    assert!(forge.project_writes("group/b").is_empty());
    let releases = forge
        .writes()
        .iter()
        .filter(|w| matches!(w, WriteCall::CreateRelease { .. }))
        .count();
    assert_eq!(releases, 2);

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, Error::PartialFailure { failed: 1, total: 3 }));
}

#[tokio::test]
async fn test_tag_created_before_release() {
    let (forge, projects) = three_projects();

    let report = run_release(
        &forge,
        &[projects[0].path.clone()],
        &request(),
        &Taxonomy::default(),
        &NoopProgress,
    )
    .await;
    assert!(report.is_success());

    let writes = forge.project_writes("group/a");
    assert_eq!(writes.len(), 2);
    match (&writes[0], &writes[1]) {
        (
            WriteCall::CreateTag {
                name,
                git_ref,
                message,
                ..
            },
            WriteCall::CreateRelease { tag, notes, .. },
        ) => {
            assert_eq!(name, "v1.2.0");
            assert_eq!(git_ref, "main");
            assert!(message.starts_with("v1.2.0\n\n"));
            assert!(message.contains("- Add export (group/a!1)"));
            assert_eq!(tag, "v1.2.0");
            assert!(notes.starts_with("## v1.2.0"));
            assert!(notes.contains("### New features"));
        }
        other => panic!("unexpected writes: {other:?}"),
    }
}

#[tokio::test]
async fn test_explicit_ref_is_tagged() {
    let (forge, projects) = three_projects();
    let request = ReleaseRequest {
        git_ref: Some("release/1.2".to_string()),
        ..request()
    };

    run_release(
        &forge,
        &[projects[0].path.clone()],
        &request,
        &Taxonomy::default(),
        &NoopProgress,
    )
    .await;

    match &forge.project_writes("group/a")[0] {
        WriteCall::CreateTag { git_ref, .. } => assert_eq!(git_ref, "release/1.2"),
        other => panic!("unexpected write: {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_tag_skips_release() {
    let (forge, projects) = three_projects();
    forge.fail_tag_for("group/a");

    let report = run_release(
        &forge,
        &paths(&[&projects[0], &projects[2]]),
        &request(),
        &Taxonomy::default(),
        &NoopProgress,
    )
    .await;

    assert!(matches!(
        report.outcomes[0].status,
        ProjectStatus::Failed {
            step: Step::CreateTag,
            ..
        }
    ));
    assert!(forge.project_writes("group/a").is_empty());
    assert_eq!(forge.project_writes("group/c").len(), 2);
}

#[tokio::test]
async fn test_failed_release_keeps_tag() {
    let (forge, projects) = three_projects();
    forge.fail_release_for("group/a");

    let report = run_release(
        &forge,
        &[projects[0].path.clone()],
        &request(),
        &Taxonomy::default(),
        &NoopProgress,
    )
    .await;

    assert!(matches!(
        report.outcomes[0].status,
        ProjectStatus::Failed {
            step: Step::CreateRelease,
            ..
        }
    ));
    let writes = forge.project_writes("group/a");
    assert_eq!(writes.len(), 1);
    assert!(matches!(writes[0], WriteCall::CreateTag { .. }));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let (forge, projects) = three_projects();
    let request = ReleaseRequest {
        dry_run: true,
        ..request()
    };

    let report = run_release(
        &forge,
        &paths(&[&projects[0]]),
        &request,
        &Taxonomy::default(),
        &NoopProgress,
    )
    .await;

    assert!(forge.writes().is_empty());
    match &report.outcomes[0].status {
        ProjectStatus::DryRun {
            tag_message,
            release_notes,
        } => {
            assert!(tag_message.contains("Bug fixes:"));
            assert!(release_notes.contains("### Bug fixes"));
        }
        other => panic!("expected dry run, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_milestone_renders_no_changes() {
    let forge = MockForge::new();
    let project = make_project(1, "group/empty");
    let milestone = make_milestone(10, "v1.2");
    forge.add_project(&project);
    forge.add_milestone(&project, &milestone);

    let report = run_release(
        &forge,
        &[project.path.clone()],
        &request(),
        &Taxonomy::default(),
        &NoopProgress,
    )
    .await;

    assert!(report.is_success());
    assert_eq!(report.outcomes[0].changes, 0);
    match &forge.project_writes("group/empty")[0] {
        WriteCall::CreateTag { message, .. } => {
            assert_eq!(message, &format!("v1.2.0\n\n{NO_CHANGES}\n"));
        }
        other => panic!("unexpected write: {other:?}"),
    }
}

#[tokio::test]
async fn test_outcomes_keep_input_order_with_concurrency() {
    let (forge, projects) = three_projects();
    let request = ReleaseRequest {
        concurrency: 1,
        ..request()
    };
    let reversed = vec![
        projects[2].path.clone(),
        projects[1].path.clone(),
        projects[0].path.clone(),
    ];

    let report =
        run_release(&forge, &reversed, &request, &Taxonomy::default(), &NoopProgress).await;

    let order: Vec<&str> = report.outcomes.iter().map(|o| o.project.as_str()).collect();
    assert_eq!(order, vec!["group/c", "group/b", "group/a"]);
}

#[tokio::test]
async fn test_milestone_changelog_across_projects() {
    let (forge, projects) = three_projects();

    let changelog = build_milestone_changelog(
        &forge,
        &paths(&projects.iter().collect::<Vec<_>>()),
        "v1.2",
        &Taxonomy::default(),
        4,
    )
    .await;

    assert_eq!(changelog.projects.len(), 2);
    assert_eq!(changelog.failures.len(), 1);
    assert_eq!(changelog.failures[0].project, "group/b");

    let text = changelog.render_external().unwrap();
    let a = text.find("## group/a").unwrap();
    let c = text.find("## group/c").unwrap();
    assert!(a < c);
    assert!(text.contains("### Documentation"));
}

#[tokio::test]
async fn test_issue_report_nests_children() {
    let forge = MockForge::new();
    let project = make_project(1, "group/app");
    let milestone = make_milestone(10, "v1.2");
    forge.add_project(&project);
    forge.add_milestone(&project, &milestone);
    forge.set_issues(
        &project,
        &milestone,
        vec![make_issue(1, None, &[]), make_issue(2, Some(1), &[])],
    );

    let report = build_issue_report(&forge, &[project.path.clone()], "v1.2", 2).await;
    assert!(report.failures.is_empty());

    let text = report.render().unwrap();
    assert!(text.contains("- [ ] [#1]"));
    assert!(text.contains("  - [ ] [#2]"));
}

#[tokio::test]
async fn test_fixup_assigns_changes_inside_window() {
    let forge = MockForge::new();
    let project = make_project(1, "group/app");
    let milestone = make_milestone_with_window(10, "v1.2", (2024, 3, 1), (2024, 3, 15));
    forge.add_project(&project);
    forge.add_milestone(&project, &milestone);
    forge.set_unmilestoned(
        &project,
        vec![
            merged_at(make_change(&project, 1, "Inside", &[]), utc(2024, 3, 5, 12)),
            merged_at(make_change(&project, 2, "Too late", &[]), utc(2024, 3, 20, 9)),
            make_change(&project, 3, "Never merged", &[]),
        ],
    );

    let dry = fixup_milestone(&forge, &[project.path.clone()], "v1.2", true).await;
    assert_eq!(dry.assigned.len(), 1);
    assert_eq!(dry.skipped, 2);
    assert!(forge.writes().is_empty());

    let report = fixup_milestone(&forge, &[project.path.clone()], "v1.2", false).await;
    assert!(report.is_success());
    assert_eq!(
        forge.writes(),
        vec![WriteCall::AssignMilestone {
            reference: "group/app!1".to_string(),
            milestone: "v1.2".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_fixup_without_dates_fails_project() {
    let forge = MockForge::new();
    let project = make_project(1, "group/app");
    forge.add_project(&project);
    forge.add_milestone(&project, &make_milestone(10, "v1.2"));

    let report = fixup_milestone(&forge, &[project.path.clone()], "v1.2", false).await;
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, Error::Config(_)));
}

#[tokio::test]
async fn test_release_milestones_filters_versions() {
    let forge = MockForge::new();
    let project = make_project(1, "group/app");
    forge.add_project(&project);
    forge.add_milestone(&project, &make_milestone(1, "v1.2"));
    forge.add_milestone(&project, &make_milestone(2, "autumn"));
    let mut closed = make_milestone(3, "v1.1");
    closed.state = MilestoneState::Closed;
    forge.add_milestone(&project, &closed);

    let milestones = release_milestones(&forge, &project).await.unwrap();
    let titles: Vec<&str> = milestones.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["v1.2"]);
}

#[tokio::test]
async fn test_group_milestone_adds_unconfigured_projects() {
    let (forge, projects) = three_projects();
    let (a, b, c) = (&projects[0], &projects[1], &projects[2]);
    let d = make_project(4, "group/d");
    let milestone = make_milestone(10, "v1.2");
    forge.add_project(&d);
    forge.add_milestone(b, &milestone);
    forge.add_milestone(&d, &milestone);
    forge.set_merged(&d, &milestone, vec![make_change(&d, 3, "Add API", &["feature"])]);
    forge.set_group_merged(
        "group",
        "v1.2",
        vec![
            make_change(&d, 3, "Add API", &["feature"]),
            make_change(a, 1, "Add export", &["feature"]),
            make_change(c, 7, "Update docs", &["docs"]),
            make_change(&d, 4, "Fix API", &["bug"]),
        ],
    );

    let configured = vec![a.path.clone(), b.path.clone()];
    let ignored = vec![c.path.clone()];
    let found = discover_projects(&forge, &configured, &ignored, Some("group"), "v1.2")
        .await
        .unwrap();
    assert_eq!(found, vec!["group/a", "group/b", "group/d"]);

    let report = run_release(&forge, &found, &request(), &Taxonomy::default(), &NoopProgress)
        .await;
    assert!(report.is_success());
    assert_eq!(forge.project_writes("group/d").len(), 2);
    assert!(forge.project_writes("group/c").is_empty());
}

#[tokio::test]
async fn test_configured_project_by_id_is_not_duplicated() {
    let (forge, projects) = three_projects();
    forge.set_group_merged(
        "group",
        "v1.2",
        vec![make_change(&projects[0], 1, "Add export", &["feature"])],
    );

    let found = discover_projects(&forge, &["1".to_string()], &[], Some("group"), "v1.2")
        .await
        .unwrap();
    assert_eq!(found, vec!["1"]);
}

#[tokio::test]
async fn test_without_group_only_configured_projects_are_used() {
    let (forge, _) = three_projects();
    let configured = vec!["group/a".to_string(), "group/c".to_string()];

    let found = discover_projects(&forge, &configured, &["group/a".to_string()], None, "v1.2")
        .await
        .unwrap();
    assert_eq!(found, vec!["group/c"]);
}

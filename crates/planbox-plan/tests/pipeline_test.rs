//! End-to-end integration tests for the plan compiler.
//!
//! These tests drive the full pipeline:
//! 1. Parse `.pbx` scripts
//! 2. Evaluate the script graph (includes, guards, bindings, interpolation)
//! 3. Register and apply deferred hooks
//! 4. Merge environment declarations
//! 5. Seal the plan and compute its digest
//! 6. Render external-builder invocations

#![allow(clippy::expect_used, clippy::unwrap_used)]

use planbox_common::env::EnvSource;
use planbox_common::error::PlanboxError;
use planbox_plan::pipeline::compile;
use planbox_plan::plan::{BuildPlan, Step};
use planbox_plan::render;
use planbox_script::source::{FsSource, MemorySource, ScriptSource};

fn compile_files(
    env: &[(&str, &str)],
    files: &[(&str, &str)],
    root: &str,
) -> planbox_common::error::Result<BuildPlan> {
    let env = EnvSource::from_pairs(env.iter().copied());
    let source = MemorySource::from_files(files.iter().copied());
    compile(&env, &source, root, None)
}

fn env_value<'a>(plan: &'a BuildPlan, name: &str) -> Option<&'a str> {
    plan.env
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}

fn run_commands(plan: &BuildPlan) -> Vec<&str> {
    plan.steps
        .iter()
        .filter_map(|step| match step {
            Step::Run { command } => Some(command.as_str()),
            Step::Copy { .. } => None,
        })
        .collect()
}

// ── Full Scenario ────────────────────────────────────────────────────

const CI_SCRIPT: &str = r#"# CI toolchain image
FROM "debian:bookworm"

LET GO_VERSION = "1.22.1"

ENV {
    GOPATH = "/go"
    PATH = ["/go/bin", "/usr/local/go/bin"]
    TZ = "${TZ:-Etc/UTC}"
}

RUN "apt-get update && apt-get install -y curl git"
RUN "curl -sSL https://dl.google.com/go/go${GO_VERSION}.linux-amd64.tar.gz | tar -xz -C /usr/local"

INCLUDE "shared/tooling.pbx"

AFTER {
    RUN "apt-get clean"
    FLATTEN
}

UNLESS included {
    COPY "entrypoint.sh" -> "/entrypoint.sh"
    RUN "chmod 755 /entrypoint.sh"
    ENTRYPOINT "/entrypoint.sh"
}
"#;

const TOOLING_FRAGMENT: &str = r#"# Shared tooling fragment
ENV { PATH = ["/opt/tools/bin"] }
RUN "install-tools --prefix /opt/tools"

UNLESS included {
    ENTRYPOINT "/bin/sh"
}
"#;

#[test]
fn pipeline_ci_toolchain_scenario() {
    let plan = compile_files(
        &[],
        &[("ci.pbx", CI_SCRIPT), ("shared/tooling.pbx", TOOLING_FRAGMENT)],
        "ci.pbx",
    )
    .expect("should compile CI scenario");

    assert_eq!(plan.base_image, "debian:bookworm");
    assert_eq!(
        plan.steps,
        vec![
            Step::Run {
                command: "apt-get update && apt-get install -y curl git".into()
            },
            Step::Run {
                command: concat!(
                    "curl -sSL https://dl.google.com/go/go1.22.1.linux-amd64.tar.gz",
                    " | tar -xz -C /usr/local"
                )
                .into()
            },
            Step::Run {
                command: "install-tools --prefix /opt/tools".into()
            },
            Step::Copy {
                source: "entrypoint.sh".into(),
                dest: "/entrypoint.sh".into()
            },
            Step::Run {
                command: "chmod 755 /entrypoint.sh".into()
            },
            Step::Run {
                command: "apt-get clean".into()
            },
        ]
    );

    // The hook's FLATTEN lands after every step, including the hook's own.
    assert_eq!(plan.flatten_points, vec![6]);
    assert_eq!(plan.entrypoint.as_deref(), Some("/entrypoint.sh"));

    // Environment keeps first-declaration order; the fragment extends PATH.
    let names: Vec<&str> = plan.env.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["GOPATH", "PATH", "TZ"]);
    assert_eq!(env_value(&plan, "GOPATH"), Some("/go"));
    assert_eq!(
        env_value(&plan, "PATH"),
        Some("/go/bin:/usr/local/go/bin:/opt/tools/bin")
    );
    assert_eq!(env_value(&plan, "TZ"), Some("Etc/UTC"));
}

#[test]
fn pipeline_environment_snapshot_feeds_fallbacks() {
    let plan = compile_files(
        &[("TZ", "America/New_York")],
        &[("ci.pbx", CI_SCRIPT), ("shared/tooling.pbx", TOOLING_FRAGMENT)],
        "ci.pbx",
    )
    .expect("should compile");
    assert_eq!(env_value(&plan, "TZ"), Some("America/New_York"));
}

// ── Deferred Hooks ───────────────────────────────────────────────────

#[test]
fn pipeline_hook_steps_run_after_body_steps() {
    let plan = compile_files(
        &[],
        &[(
            "app.pbx",
            r#"FROM "alpine"
AFTER { RUN "cleanup" }
RUN "build""#,
        )],
        "app.pbx",
    )
    .expect("should compile");
    assert_eq!(run_commands(&plan), vec!["build", "cleanup"]);
    assert!(plan.flatten_points.is_empty());
}

#[test]
fn pipeline_hooks_apply_in_registration_order() {
    let plan = compile_files(
        &[],
        &[
            (
                "app.pbx",
                r#"FROM "alpine"
AFTER { RUN "root-early" }
INCLUDE "frag.pbx"
AFTER { RUN "root-late" }
RUN "body""#,
            ),
            ("frag.pbx", r#"AFTER { RUN "fragment" }"#),
        ],
        "app.pbx",
    )
    .expect("should compile");
    assert_eq!(
        run_commands(&plan),
        vec!["body", "root-early", "fragment", "root-late"]
    );
}

#[test]
fn pipeline_adjacent_flatten_requests_collapse() {
    let plan = compile_files(
        &[],
        &[(
            "app.pbx",
            r#"FROM "alpine"
RUN "build"
AFTER { FLATTEN }
AFTER { FLATTEN }"#,
        )],
        "app.pbx",
    )
    .expect("should compile");
    assert_eq!(plan.flatten_points, vec![1]);
}

#[test]
fn pipeline_hook_guard_reads_evaluation_time_environment() {
    let files = [(
        "app.pbx",
        r#"FROM "alpine"
RUN "build"
AFTER {
    IF ENV("PACKAGE_FOR_CI") {
        RUN "apt-get clean"
        FLATTEN
    }
}"#,
    )];

    let with = compile_files(&[("PACKAGE_FOR_CI", "1")], &files, "app.pbx")
        .expect("should compile with probe set");
    assert_eq!(run_commands(&with), vec!["build", "apt-get clean"]);
    assert_eq!(with.flatten_points, vec![2]);

    let without = compile_files(&[], &files, "app.pbx").expect("should compile with probe unset");
    assert_eq!(run_commands(&without), vec!["build"]);
    assert!(without.flatten_points.is_empty());
}

// ── Inclusion Guard ──────────────────────────────────────────────────

#[test]
fn pipeline_shared_fragment_applies_once_per_build() {
    let plan = compile_files(
        &[],
        &[
            (
                "app.pbx",
                r#"FROM "alpine"
INCLUDE "a.pbx"
INCLUDE "b.pbx""#,
            ),
            ("a.pbx", "INCLUDE \"common.pbx\"\nRUN \"a\""),
            ("b.pbx", "INCLUDE \"common.pbx\"\nRUN \"b\""),
            ("common.pbx", "RUN \"common\""),
        ],
        "app.pbx",
    )
    .expect("should compile");
    assert_eq!(run_commands(&plan), vec!["common", "a", "b"]);
}

#[test]
fn pipeline_fragment_reapplies_on_a_fresh_build() {
    let env = EnvSource::from_pairs::<&str, &str>([]);
    let source = MemorySource::from_files([
        ("app.pbx", "FROM \"alpine\"\nINCLUDE \"frag.pbx\""),
        ("frag.pbx", "RUN \"tooling\""),
    ]);

    let first = compile(&env, &source, "app.pbx", None).expect("first build should compile");
    let second = compile(&env, &source, "app.pbx", None).expect("second build should compile");
    assert_eq!(run_commands(&first), vec!["tooling"]);
    assert_eq!(run_commands(&second), vec!["tooling"]);
}

#[test]
fn pipeline_self_include_is_inert() {
    let plan = compile_files(
        &[],
        &[(
            "app.pbx",
            r#"FROM "alpine"
INCLUDE "app.pbx"
RUN "once""#,
        )],
        "app.pbx",
    )
    .expect("should compile");
    assert_eq!(run_commands(&plan), vec!["once"]);
}

// ── Conditional Guards ───────────────────────────────────────────────

#[test]
fn pipeline_top_level_script_is_not_included() {
    let plan = compile_files(
        &[],
        &[(
            "app.pbx",
            r#"FROM "alpine"
IF included { RUN "fragment-only" }
UNLESS included { RUN "top-level-only" }"#,
        )],
        "app.pbx",
    )
    .expect("should compile");
    assert_eq!(run_commands(&plan), vec!["top-level-only"]);
}

#[test]
fn pipeline_empty_env_value_reads_as_unset() {
    let plan = compile_files(
        &[("FLAG", "")],
        &[(
            "app.pbx",
            r#"FROM "alpine"
IF ENV("FLAG") { RUN "flagged" }
UNLESS ENV("FLAG") { RUN "unflagged" }"#,
        )],
        "app.pbx",
    )
    .expect("should compile");
    assert_eq!(run_commands(&plan), vec!["unflagged"]);
}

// ── Environment Merging ──────────────────────────────────────────────

#[test]
fn pipeline_scalar_redeclaration_wins_in_place() {
    let plan = compile_files(
        &[],
        &[
            (
                "app.pbx",
                r#"FROM "alpine"
ENV {
    TZ = "UTC"
    GOPATH = "/go"
}
INCLUDE "frag.pbx""#,
            ),
            ("frag.pbx", r#"ENV { TZ = "Etc/UTC" }"#),
        ],
        "app.pbx",
    )
    .expect("should compile");
    let names: Vec<&str> = plan.env.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["TZ", "GOPATH"]);
    assert_eq!(env_value(&plan, "TZ"), Some("Etc/UTC"));
}

// ── Failure Modes ────────────────────────────────────────────────────

#[test]
fn pipeline_script_without_base_image_fails() {
    let err = compile_files(&[], &[("app.pbx", r#"RUN "true""#)], "app.pbx")
        .expect_err("should fail without FROM");
    assert!(matches!(err, PlanboxError::MissingBaseImage { .. }), "got: {err}");
}

#[test]
fn pipeline_second_base_image_conflicts() {
    let err = compile_files(
        &[],
        &[
            ("app.pbx", "FROM \"alpine\"\nINCLUDE \"frag.pbx\""),
            ("frag.pbx", "FROM \"debian:bookworm\""),
        ],
        "app.pbx",
    )
    .expect_err("should reject second FROM");
    assert!(
        matches!(err, PlanboxError::ConflictingDirective { directive: "FROM", .. }),
        "got: {err}"
    );
}

#[test]
fn pipeline_disagreeing_entrypoints_conflict() {
    let err = compile_files(
        &[],
        &[
            (
                "app.pbx",
                "FROM \"alpine\"\nENTRYPOINT \"/entrypoint.sh\"\nINCLUDE \"frag.pbx\"",
            ),
            ("frag.pbx", "ENTRYPOINT \"/bin/sh\""),
        ],
        "app.pbx",
    )
    .expect_err("should reject disagreeing entrypoints");
    assert!(
        matches!(err, PlanboxError::ConflictingDirective { directive: "ENTRYPOINT", .. }),
        "got: {err}"
    );
}

#[test]
fn pipeline_identical_entrypoint_redeclaration_is_noop() {
    let plan = compile_files(
        &[],
        &[
            (
                "app.pbx",
                "FROM \"alpine\"\nENTRYPOINT \"/bin/sh\"\nINCLUDE \"frag.pbx\"",
            ),
            ("frag.pbx", "ENTRYPOINT \"/bin/sh\""),
        ],
        "app.pbx",
    )
    .expect("identical redeclaration should be accepted");
    assert_eq!(plan.entrypoint.as_deref(), Some("/bin/sh"));
}

#[test]
fn pipeline_required_variable_aborts_the_build() {
    let err = compile_files(
        &[],
        &[(
            "app.pbx",
            r#"FROM "alpine"
RUN "install version ${VERSION:?}""#,
        )],
        "app.pbx",
    )
    .expect_err("unset required variable should abort");
    let PlanboxError::MissingRequiredVariable { name, .. } = err else {
        panic!("expected MissingRequiredVariable, got: {err}");
    };
    assert_eq!(name, "VERSION");
}

#[test]
fn pipeline_missing_include_names_the_includer() {
    let err = compile_files(
        &[],
        &[("app.pbx", "FROM \"alpine\"\nINCLUDE \"ghost.pbx\"")],
        "app.pbx",
    )
    .expect_err("missing include should fail");
    let PlanboxError::MissingInclude { script, .. } = err else {
        panic!("expected MissingInclude, got: {err}");
    };
    assert_eq!(script, "app.pbx");
}

#[test]
fn pipeline_unterminated_interpolation_is_a_parse_error() {
    let err = compile_files(
        &[],
        &[("app.pbx", "FROM \"alpine\"\nRUN \"echo ${HOME\"")],
        "app.pbx",
    )
    .expect_err("unterminated interpolation should fail");
    assert!(matches!(err, PlanboxError::Parse { .. }), "got: {err}");
}

// ── Determinism ──────────────────────────────────────────────────────

#[test]
fn pipeline_digest_is_stable_across_compiles() {
    let files = [
        ("ci.pbx", CI_SCRIPT),
        ("shared/tooling.pbx", TOOLING_FRAGMENT),
    ];
    let first = compile_files(&[], &files, "ci.pbx").expect("first compile");
    let second = compile_files(&[], &files, "ci.pbx").expect("second compile");

    assert_eq!(first, second);
    assert_eq!(
        first.digest().expect("digest"),
        second.digest().expect("digest")
    );
    assert_eq!(
        first.to_json().expect("manifest"),
        second.to_json().expect("manifest")
    );
}

#[test]
fn pipeline_digest_tracks_the_environment_snapshot() {
    let files = [
        ("ci.pbx", CI_SCRIPT),
        ("shared/tooling.pbx", TOOLING_FRAGMENT),
    ];
    let utc = compile_files(&[], &files, "ci.pbx").expect("compile");
    let local = compile_files(&[("TZ", "America/New_York")], &files, "ci.pbx").expect("compile");
    assert_ne!(
        utc.digest().expect("digest"),
        local.digest().expect("digest")
    );
}

// ── Invocation Rendering ─────────────────────────────────────────────

#[test]
fn pipeline_render_expands_flatten_into_squash_and_recreate() {
    let plan = compile_files(
        &[],
        &[(
            "app.pbx",
            r#"FROM "alpine"
RUN "echo one"
AFTER { FLATTEN }
ENTRYPOINT "/bin/sh""#,
        )],
        "app.pbx",
    )
    .expect("should compile");

    let stream = render::render(&plan, "buildah", "work", "app:latest");
    let verbs: Vec<&str> = stream.iter().map(|inv| inv.args[0].as_str()).collect();
    assert_eq!(
        verbs,
        vec!["from", "run", "commit", "from", "config", "commit"]
    );
    assert!(stream.iter().all(|inv| inv.program == "buildah"));
    assert!(stream[2].args.contains(&"--squash".to_owned()));
    assert_eq!(
        stream.last().expect("stream should not be empty").args,
        vec!["commit", "--rm", "work", "app:latest"]
    );
}

// ── Filesystem Source ────────────────────────────────────────────────

#[test]
fn pipeline_filesystem_scripts_with_nested_include() {
    let dir = tempfile::tempdir().expect("should create tempdir");
    let shared = dir.path().join("shared");
    std::fs::create_dir(&shared).expect("should create subdir");
    std::fs::write(
        dir.path().join("app.pbx"),
        r#"FROM "alpine"
INCLUDE "shared/golang.pbx"
RUN "go build ./...""#,
    )
    .expect("should write root script");
    std::fs::write(
        shared.join("golang.pbx"),
        r#"ENV { PATH = ["/usr/local/go/bin"] }
RUN "install-go""#,
    )
    .expect("should write fragment");

    let env = EnvSource::from_pairs::<&str, &str>([]);
    let source = FsSource::new();
    let root = dir.path().join("app.pbx");
    let plan = compile(&env, &source, root.to_string_lossy().as_ref(), None)
        .expect("should compile from disk");

    assert_eq!(run_commands(&plan), vec!["install-go", "go build ./..."]);
    assert_eq!(env_value(&plan, "PATH"), Some("/usr/local/go/bin"));

    // The build context defaults to the top-level script's directory.
    let canonical = dir.path().canonicalize().expect("should canonicalize");
    assert_eq!(plan.context_dir, canonical);

    // Both spellings of the fragment map to one identity.
    let id = source
        .resolve(None, root.to_string_lossy().as_ref())
        .expect("should resolve root");
    let direct = source
        .resolve(Some(&id), "shared/golang.pbx")
        .expect("should resolve");
    let dotted = source
        .resolve(Some(&id), "./shared/golang.pbx")
        .expect("should resolve");
    assert_eq!(direct, dotted);
}

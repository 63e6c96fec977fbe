// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::covtool;
use indoc::indoc;
use pretty_assertions::assert_eq;

#[test]
fn drop_exempt() {
    let output = covtool()
        .args([
            "drop-exempt",
            "--markers",
            "lcov/markers.txt",
            "lcov/unit.dat",
        ])
        .output();

    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            TN:unit
            SF:src/com/example/Foo.java
            DA:1,1
            DA:2,0
            end_of_record
            TN:unit
            SF:third_party/lib/Lib.java
            DA:1,1
            end_of_record
        "}
    );
}

#[test]
fn filter_from_stdin() {
    let input = fs_err::read_to_string(crate::fixture("lcov/integration.dat"))
        .expect("read fixture");
    let output = covtool()
        .args([
            "filter",
            "--include",
            "src/",
            "--exclude",
            "src/com/example/Bar",
        ])
        .stdin(input)
        .output();

    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            TN:integration
            SF:src/com/example/Foo.java
            DA:2,1
            DA:5,0
            end_of_record
        "}
    );
}

const MERGED: &str = indoc! {"
    SF:src/com/example/Bar.java
    DA:1,0
    DA:2,0
    end_of_record
    SF:src/com/example/Foo.java
    DA:1,1
    DA:2,1
    DA:3,1
    DA:4,0
    DA:5,0
    end_of_record
    SF:third_party/lib/Lib.java
    DA:1,1
    end_of_record
"};

#[test]
fn merge_to_stdout() {
    let output = covtool()
        .args(["merge", "lcov/unit.dat", "lcov/integration.dat"])
        .output();
    assert_eq!(output.stdout_as_str(), MERGED);
}

#[test]
fn merge_to_file() {
    let dir = camino_tempfile::tempdir().expect("created temp dir");
    let out = dir.path().join("merged.dat");
    let output = covtool()
        .args([
            "merge",
            "lcov/integration.dat",
            "lcov/unit.dat",
            "--output",
            out.as_str(),
        ])
        .output();

    assert!(output.stdout.is_empty(), "{output}");
    assert_eq!(fs_err::read_to_string(&out).expect("read output"), MERGED);
}

#[test]
fn merge_missing_input() {
    let output = covtool()
        .args(["merge", "lcov/unit.dat", "lcov/missing.dat"])
        .unchecked(true)
        .output();
    assert_eq!(output.exit_code(), Some(1), "{output}");
    assert!(
        output
            .stderr_as_str()
            .contains("error: failed to read `lcov/missing.dat`"),
        "{output}"
    );
}

#[test]
fn flatten_drops_test_names() {
    let output = covtool().args(["flatten", "lcov/unit.dat"]).output();
    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            SF:src/com/example/Foo.java
            DA:1,1
            DA:2,0
            DA:3,1
            DA:4,0
            end_of_record
            SF:third_party/lib/Lib.java
            DA:1,1
            end_of_record
        "}
    );
}

#[test]
fn merge_tests_uses_config_offsets() {
    // fixtures/.config/covtool.toml sets a 9-byte prefix for `testlogs/`.
    let output = covtool()
        .args([
            "merge-tests",
            "testlogs/foo_tests/coverage.dat",
            "testlogs/bar_tests/coverage.dat",
        ])
        .output();

    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            TN:bar_tests
            SF:src/com/example/Foo.java
            DA:1,0
            DA:2,1
            end_of_record
            TN:foo_tests
            SF:src/com/example/Foo.java
            DA:1,1
            DA:2,0
            end_of_record
        "}
    );
}

#[test]
fn merge_tests_uses_default_offsets_outside_fixtures() {
    // Without a .config/covtool.toml, paths like bazel-testlogs/<test>/coverage.dat are expected.
    let dir = camino_tempfile::tempdir().expect("created temp dir");
    let test_dir = dir.path().join("bazel-testlogs/foo_tests");
    fs_err::create_dir_all(&test_dir).expect("created test dir");
    fs_err::copy(
        crate::fixture("testlogs/foo_tests/coverage.dat"),
        test_dir.join("coverage.dat"),
    )
    .expect("copied tracefile");

    let output = covtool()
        .current_dir(dir.path())
        .args(["merge-tests", "bazel-testlogs/foo_tests/coverage.dat"])
        .output();

    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            TN:foo_tests
            SF:src/com/example/Foo.java
            DA:1,1
            DA:2,0
            end_of_record
        "}
    );
}

#[test]
fn filter_logs_prefixes_at_debug() {
    let output = covtool()
        .env("COVTOOL_LOG", "debug")
        .args(["filter", "--include", "src/", "lcov/integration.dat"])
        .output();

    let stderr = output.stderr_as_str();
    assert!(
        stderr.contains(r#"debug: filtering with includes ["src/"] and excludes []"#),
        "{output}"
    );
    assert!(output.stdout_as_str().starts_with("TN:integration\n"), "{output}");
}

#[test]
fn merge_tests_path_too_short() {
    let output = covtool()
        .args([
            "merge-tests",
            "--strip-prefix-len",
            "40",
            "testlogs/foo_tests/coverage.dat",
        ])
        .unchecked(true)
        .output();

    assert_eq!(output.exit_code(), Some(1), "{output}");
    let stderr = output.stderr_as_str();
    assert!(
        stderr.contains("error: failed to derive test name from tracefile path"),
        "{output}"
    );
    assert!(stderr.contains("Caused by:"), "{output}");
}

#[test]
fn list_component() {
    let output = covtool()
        .args([
            "list",
            "--name",
            "example",
            "lcov/unit.dat",
            "lcov/integration.dat",
        ])
        .output();

    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            CN:example
            TN:integration
            TN:unit
            SF:src/com/example/Bar.java
            SF:src/com/example/Foo.java
            SF:third_party/lib/Lib.java
            end_of_record
        "}
    );
}

#[test]
fn summary_totals() {
    let merged = covtool()
        .args(["merge", "lcov/unit.dat", "lcov/integration.dat"])
        .output();
    let output = covtool()
        .arg("summary")
        .stdin(merged.stdout)
        .output();

    let stdout = output.stdout_as_str();
    let rows: Vec<Vec<&str>> = stdout
        .lines()
        .map(|line| line.split_whitespace().collect())
        .collect();
    assert_eq!(
        rows,
        vec![
            vec!["src/com/example/Bar.java", "0/2", "0.0%"],
            vec!["src/com/example/Foo.java", "3/5", "60.0%"],
            vec!["third_party/lib/Lib.java", "1/1", "100.0%"],
            vec!["total", "4/8", "50.0%"],
        ]
    );
}

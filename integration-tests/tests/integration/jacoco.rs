// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::covtool;
use indoc::indoc;
use pretty_assertions::assert_eq;

const RESOLVED: &str = indoc! {"
    TN:example
    SF:src/main/java/com/example/Foo.java
    DA:3,1
    DA:4,0
    DA:5,1
    end_of_record
    TN:example
    SF:src/main/java/com/example/util/Helper.java
    DA:7,0
    DA:8,1
    end_of_record
"};

#[test]
fn resolve_report() {
    let dir = camino_tempfile::tempdir().expect("created temp dir");
    let unmatched = dir.path().join("unmatched.txt");

    let output = covtool()
        .args([
            "jacoco",
            "--source-root",
            "jacoco/tree",
            "--test-name",
            "example",
            "--unmatched-output",
            unmatched.as_str(),
            "jacoco/report.xml",
        ])
        .output();

    assert_eq!(output.stdout_as_str(), RESOLVED);

    // build/ is skipped while indexing, so Gen.java has no candidates at all.
    assert_eq!(
        fs_err::read_to_string(&unmatched).expect("read unmatched output"),
        "com/example/Gen.java\tno-candidates\ncom/missing/Foo.java\tpackage-mismatch\n"
    );
    let stderr = output.stderr_as_str();
    assert!(
        stderr.contains("warning: could not resolve com/missing/Foo.java: package-mismatch"),
        "{output}"
    );
}

#[test]
fn repeated_reports_merge() {
    let output = covtool()
        .args([
            "jacoco",
            "--source-root",
            "jacoco/tree",
            "--test-name",
            "example",
            "jacoco/report.xml",
            "jacoco/report.xml",
        ])
        .output();

    assert_eq!(output.stdout_as_str(), RESOLVED);
}

#[test]
fn malformed_report() {
    let output = covtool()
        .args(["jacoco", "--source-root", "jacoco/tree", "-"])
        .stdin("<report><package name=\"a\"><sourcefile name=\"A.java\"></package></report>")
        .unchecked(true)
        .output();

    assert_eq!(output.exit_code(), Some(1), "{output}");
    assert!(
        output
            .stderr_as_str()
            .contains("error: failed to parse JaCoCo report `<stdin>`"),
        "{output}"
    );
}

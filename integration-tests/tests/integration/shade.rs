// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::covtool;
use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read, Write};
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

fn write_jar(path: &Utf8Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .expect("added directory");
        } else {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("started file");
            writer.write_all(contents).expect("wrote contents");
        }
    }
    let bytes = writer.finish().expect("finished jar").into_inner();
    fs_err::write(path, bytes).expect("wrote jar");
}

fn read_jar(path: &Utf8Path) -> Vec<(String, Vec<u8>, CompressionMethod)> {
    let file = fs_err::File::open(path).expect("opened jar");
    let mut archive = ZipArchive::new(file).expect("valid zip");
    (0..archive.len())
        .map(|index| {
            let mut entry = archive.by_index(index).expect("entry exists");
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents).expect("read entry");
            (entry.name().to_owned(), contents, entry.compression())
        })
        .collect()
}

fn input_jar(dir: &Utf8Path) -> Utf8PathBuf {
    let input = dir.join("input.jar");
    write_jar(
        &input,
        &[
            ("META-INF/", b""),
            ("META-INF/services/", b""),
            (
                "META-INF/services/com.example.ServiceProvider",
                b"com.example.SomeClassA\ncom.example.Keep\n",
            ),
            ("com/example/BaitClass.class", b"\xca\xfe\xba\xbe"),
        ],
    );
    input
}

#[test]
fn shade_services() {
    let dir = camino_tempfile::tempdir().expect("created temp dir");
    let input = input_jar(dir.path());
    let output_jar = dir.path().join("output.jar");

    let output = covtool()
        .args([
            "shade-services",
            "--rules",
            "shade/rules.txt",
            "--output",
            output_jar.as_str(),
            "--compression",
            "stored",
            input.as_str(),
        ])
        .output();
    assert!(output.stdout.is_empty(), "{output}");

    let entries = read_jar(&output_jar);
    let names: Vec<_> = entries.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "META-INF/",
            "META-INF/services/",
            "META-INF/services/com.android.example.ServiceProvider",
            "com/example/BaitClass.class",
        ]
    );
    assert_eq!(
        String::from_utf8_lossy(&entries[2].1),
        "com.android.example.SomeClassA\ncom.android.example.Keep\n"
    );
    assert_eq!(entries[3].1, b"\xca\xfe\xba\xbe");
    assert_eq!(entries[3].2, CompressionMethod::Stored);
}

#[test]
fn zap_rule_fails_without_output() {
    let dir = camino_tempfile::tempdir().expect("created temp dir");
    let input = input_jar(dir.path());
    let output_jar = dir.path().join("output.jar");

    let output = covtool()
        .args([
            "shade-services",
            "--rules",
            "shade/zap-rules.txt",
            "-o",
            output_jar.as_str(),
            input.as_str(),
        ])
        .unchecked(true)
        .output();

    assert_eq!(output.exit_code(), Some(1), "{output}");
    let stderr = output.stderr_as_str();
    assert!(
        stderr.contains("error: invalid rule in `shade/zap-rules.txt` at line 2"),
        "{output}"
    );
    assert!(stderr.contains("`zap` rules are not supported"), "{output}");
    assert!(!output_jar.exists(), "no output jar is written");
}

#[test]
fn input_is_not_a_jar() {
    let dir = camino_tempfile::tempdir().expect("created temp dir");
    let input = dir.path().join("input.jar");
    fs_err::write(&input, "not a zip").expect("wrote input");
    let output_jar = dir.path().join("output.jar");

    let output = covtool()
        .args([
            "shade-services",
            "--rules",
            "shade/rules.txt",
            "-o",
            output_jar.as_str(),
            input.as_str(),
        ])
        .unchecked(true)
        .output();

    assert_eq!(output.exit_code(), Some(1), "{output}");
    assert!(
        output.stderr_as_str().contains("error: failed to shade archive"),
        "{output}"
    );
    assert!(!output_jar.exists(), "no output jar is written");
}

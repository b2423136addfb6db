#![cfg(feature = "cli")]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_frame(path: &Path, w: u32, h: u32, rgb: [u8; 3]) {
    let img = image::RgbImage::from_pixel(w, h, image::Rgb(rgb));
    img.save(path).expect("write png");
}

fn read_report(dir: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(dir.join("report.json")).expect("report written");
    serde_json::from_str(&raw).expect("report is json")
}

#[test]
fn step_writes_overlay_map_and_report() {
    let dir = tempdir().expect("tempdir");
    let frame = dir.path().join("frame.png");
    write_frame(&frame, 320, 160, [210, 200, 190]);
    let out = dir.path().join("out");

    Command::cargo_bin("rover-vision")
        .expect("binary built")
        .args(["step", "--image"])
        .arg(&frame)
        .args(["--x", "100", "--y", "100", "--yaw", "0", "--out-dir"])
        .arg(&out)
        .assert()
        .success();

    let overlay = image::open(out.join("overlay.png")).expect("overlay").to_rgb8();
    assert_eq!(overlay.dimensions(), (320, 160));
    let map = image::open(out.join("worldmap.png")).expect("map").to_rgb8();
    assert_eq!(map.dimensions(), (200, 200));

    let report = read_report(&out);
    assert_eq!(report["processed"], 1);
    assert_eq!(report["skipped"], 0);
    assert!(report["frames"][0]["report"]["navigable_pixels"].as_u64().unwrap_or(0) > 0);
}

#[test]
fn replay_skips_bad_frames_and_keeps_the_map() {
    let dir = tempdir().expect("tempdir");
    write_frame(&dir.path().join("a.png"), 320, 160, [210, 200, 190]);
    write_frame(&dir.path().join("b.png"), 100, 50, [210, 200, 190]);
    write_frame(&dir.path().join("c.png"), 320, 160, [20, 20, 20]);
    let manifest = dir.path().join("manifest.json");
    fs::write(
        &manifest,
        r#"[
            { "image_path": "a.png", "x": 100.0, "y": 100.0, "yaw": 0.0 },
            { "image_path": "b.png", "x": 100.0, "y": 100.0, "yaw": 0.0 },
            { "image_path": "c.png", "x": 100.0, "y": 100.0, "yaw": 180.0 }
        ]"#,
    )
    .expect("write manifest");
    let out = dir.path().join("out");

    Command::cargo_bin("rover-vision")
        .expect("binary built")
        .args(["replay", "--manifest"])
        .arg(&manifest)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success();

    let report = read_report(&out);
    assert_eq!(report["processed"], 2);
    assert_eq!(report["skipped"], 1);
    assert!(report["frames"][1]["error"]
        .as_str()
        .unwrap_or_default()
        .contains("frame is 100x50"));
    assert!(report["touched_cells"]["navigable"].as_u64().unwrap_or(0) > 0);
    assert!(report["touched_cells"]["obstacle"].as_u64().unwrap_or(0) > 0);
}

#[test]
fn malformed_params_fail_loudly() {
    let dir = tempdir().expect("tempdir");
    let frame = dir.path().join("frame.png");
    write_frame(&frame, 320, 160, [0, 0, 0]);
    let params = dir.path().join("params.json");
    fs::write(&params, "{ not json").expect("write params");

    Command::cargo_bin("rover-vision")
        .expect("binary built")
        .args(["step", "--image"])
        .arg(&frame)
        .args(["--x", "1", "--y", "1", "--yaw", "0", "--params"])
        .arg(&params)
        .arg("--out-dir")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn frame_smaller_than_calibration_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let frame = dir.path().join("small.png");
    write_frame(&frame, 64, 64, [0, 0, 0]);

    Command::cargo_bin("rover-vision")
        .expect("binary built")
        .args(["step", "--image"])
        .arg(&frame)
        .args(["--x", "1", "--y", "1", "--yaw", "0", "--out-dir"])
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot hold the calibration"));
}

#[test]
fn skipped_frames_are_warned_about_unless_quiet() {
    let dir = tempdir().expect("tempdir");
    write_frame(&dir.path().join("a.png"), 320, 160, [210, 200, 190]);
    let manifest = dir.path().join("manifest.json");
    fs::write(
        &manifest,
        r#"[
            { "image_path": "a.png", "x": 100.0, "y": 100.0, "yaw": 0.0 },
            { "image_path": "missing.png", "x": 100.0, "y": 100.0, "yaw": 0.0 }
        ]"#,
    )
    .expect("write manifest");

    let run = |quiet: bool| {
        let mut cmd = Command::cargo_bin("rover-vision").expect("binary built");
        cmd.env_remove("RUST_LOG");
        if quiet {
            cmd.arg("-q");
        }
        cmd.args(["replay", "--manifest"])
            .arg(&manifest)
            .arg("--out-dir")
            .arg(dir.path().join("out"))
            .assert()
            .success()
    };

    run(false).stderr(
        predicate::str::contains("skipping").and(predicate::str::contains("missing.png")),
    );
    run(true).stderr(predicate::str::contains("skipping").not());
}

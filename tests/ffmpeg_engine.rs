//! Runs the pipeline against a real `ffmpeg`, when one is installed.
//!
//! The input clip is synthesised with the `testsrc` lavfi source, so no
//! fixture files are needed. Tests return early if `ffmpeg` is missing.

use std::process::{Command, Stdio};

use stillpick::{ATTEMPT_BUDGET, DecodeEngine, FfmpegEngine, RunOptions, RunState, Session};

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

fn synthesise_clip(directory: &std::path::Path) -> std::path::PathBuf {
    let path = directory.join("testsrc.mp4");
    let status = Command::new("ffmpeg")
        .args([
            "-nostdin",
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=5:size=320x240:rate=10",
            "-c:v",
            "mpeg4",
            "-q:v",
            "2",
        ])
        .arg(&path)
        .status()
        .expect("Failed to run ffmpeg");
    assert!(status.success(), "Failed to synthesise test clip");
    path
}

#[test]
fn probe_reads_duration_from_real_ffmpeg() {
    if !ffmpeg_available() {
        return;
    }
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let clip = synthesise_clip(directory.path());

    let mut session = Session::new(FfmpegEngine::new().unwrap().with_binary("ffmpeg"));
    let probe = session.probe(&clip).unwrap();

    assert_eq!(probe.duration_seconds, Some(5));
    assert!(!probe.is_hdr);
}

#[test]
fn full_run_against_real_ffmpeg() {
    if !ffmpeg_available() {
        return;
    }
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let clip = synthesise_clip(directory.path());

    let engine = FfmpegEngine::new().unwrap().with_binary("ffmpeg");
    let mut session = Session::with_options(engine, RunOptions::new().with_seed(3));
    let report = session.run(&clip).unwrap();

    assert_eq!(session.state(), RunState::Done);
    assert_eq!(report.tally.attempts, ATTEMPT_BUDGET);
    assert_eq!(report.tally.skipped, 0, "{}", report.tally);
    assert!(report.tally.valid <= report.tally.attempts);

    // Only the mounted input directory is left in the scratch root.
    let engine = session.into_engine();
    let leftovers: Vec<_> = std::fs::read_dir(engine.root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, ["videos"]);
}

#[test]
fn engine_log_lines_carry_levels() {
    if !ffmpeg_available() {
        return;
    }
    let mut engine = FfmpegEngine::new().unwrap().with_binary("ffmpeg");
    let invocation = engine
        .invoke(&["-i".to_string(), "does_not_exist.mp4".to_string()])
        .unwrap();

    assert!(!invocation.success());
    assert!(
        invocation
            .log
            .iter()
            .any(|line| line.text.contains("does_not_exist.mp4")),
        "{:?}",
        invocation.log
    );
}

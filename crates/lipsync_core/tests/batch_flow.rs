//! End-to-end batch flow: scan directories, plan, run with a fake generator.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local, TimeZone};
use lipsync_core::logging::{LogConfig, RunLogger};
use lipsync_core::{
    BatchError, BatchRunner, Clock, CombinationPlanner, GenerationRequest, InferenceError,
    InferenceSettings, LipsyncGenerator, MediaKind, PlanOptions,
};
use tempfile::{tempdir, TempDir};

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }
}

/// Writes an empty file at the output path, failing on chosen calls.
struct FakeGenerator {
    calls: usize,
    fail_on: Vec<usize>,
    seen: Vec<GenerationRequest>,
}

impl FakeGenerator {
    fn failing_on(fail_on: &[usize]) -> Self {
        Self {
            calls: 0,
            fail_on: fail_on.to_vec(),
            seen: Vec::new(),
        }
    }
}

impl LipsyncGenerator for FakeGenerator {
    fn name(&self) -> &str {
        "fake"
    }

    fn generate(
        &mut self,
        request: &GenerationRequest,
        logger: &RunLogger,
    ) -> Result<PathBuf, InferenceError> {
        self.calls += 1;
        self.seen.push(request.clone());
        logger.output_line("loading model", false);

        if self.fail_on.contains(&self.calls) {
            logger.output_line("RuntimeError: CUDA out of memory", true);
            return Err(InferenceError::command_failed(
                "fake",
                1,
                "RuntimeError: CUDA out of memory",
            ));
        }

        fs::write(&request.output_path, b"").map_err(|e| InferenceError::other(e.to_string()))?;
        Ok(request.output_path.clone())
    }
}

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new(audio: &[&str], videos: &[&str]) -> Self {
        let root = tempdir().unwrap();
        for (dir, names) in [("audio", audio), ("video", videos)] {
            let dir = root.path().join(dir);
            fs::create_dir_all(&dir).unwrap();
            for name in names {
                fs::write(dir.join(name), b"").unwrap();
            }
        }
        Self { root }
    }

    fn audio_dir(&self) -> PathBuf {
        self.root.path().join("audio")
    }

    fn video_dir(&self) -> PathBuf {
        self.root.path().join("video")
    }

    fn output_dir(&self) -> PathBuf {
        self.root.path().join("output")
    }

    fn logger(&self) -> RunLogger {
        RunLogger::new("batch_test", self.root.path().join("logs"), LogConfig::default(), None)
            .unwrap()
    }
}

fn inference_settings() -> InferenceSettings {
    InferenceSettings {
        config_path: PathBuf::from("configs/unet/stage2_512.yaml"),
        checkpoint_path: PathBuf::from("checkpoints/latentsync_unet.pt"),
        inference_steps: 20,
        guidance_scale: 1.5,
        enable_deepcache: true,
        seed: Some(1247),
    }
}

fn planner(options: PlanOptions) -> CombinationPlanner {
    CombinationPlanner::new(options).with_clock(FixedClock)
}

#[test]
fn failure_in_the_middle_does_not_stop_the_run() {
    let ws = Workspace::new(&["a.wav", "b.wav", "c.wav"], &["v1.mp4", "v2.mp4"]);
    let plan = planner(PlanOptions::default().with_seed(3))
        .plan_dirs(&ws.audio_dir(), &ws.video_dir())
        .unwrap();

    fs::create_dir_all(ws.output_dir()).unwrap();
    let logger = ws.logger();
    let mut generator = FakeGenerator::failing_on(&[2]);
    let outcome = BatchRunner::new(inference_settings(), ws.output_dir()).run(
        plan,
        &mut generator,
        &logger,
    );

    assert_eq!(generator.calls, 3);
    assert_eq!(outcome.summary.attempted, 3);
    assert_eq!(outcome.summary.succeeded, 2);
    assert_eq!(outcome.summary.failed, 1);

    let failures: Vec<_> = outcome.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].index, 2);
    assert_eq!(failures[0].audio_name, "b.wav");
    assert!(failures[0].error().unwrap().contains("CUDA out of memory"));

    for result in outcome.results.iter().filter(|r| r.is_success()) {
        assert!(result.output_path().unwrap().exists());
    }

    logger.close();
    let log = fs::read_to_string(logger.log_path()).unwrap();
    assert!(log.contains("b.wav"));
    assert!(log.contains("[FAILED]"));
}

#[test]
fn single_video_is_reused_for_every_audio() {
    let ws = Workspace::new(&["a.wav", "b.wav"], &["v1.mp4"]);
    let plan = planner(PlanOptions::default())
        .plan_dirs(&ws.audio_dir(), &ws.video_dir())
        .unwrap();

    let names: Vec<String> = plan.map(|c| c.output_name().to_string()).collect();
    assert_eq!(
        names,
        vec![
            "v1_a_20240102_030405".to_string(),
            "v1_b_20240102_030405".to_string(),
        ]
    );
}

#[test]
fn requests_point_into_output_dir() {
    let ws = Workspace::new(&["a.wav", "b.wav"], &["v1.mp4"]);
    let plan = planner(PlanOptions::default())
        .plan_dirs(&ws.audio_dir(), &ws.video_dir())
        .unwrap();

    fs::create_dir_all(ws.output_dir()).unwrap();
    let mut generator = FakeGenerator::failing_on(&[]);
    let outcome = BatchRunner::new(inference_settings(), ws.output_dir()).run(
        plan,
        &mut generator,
        &ws.logger(),
    );

    assert_eq!(outcome.summary.succeeded, 2);
    for request in &generator.seen {
        assert_eq!(request.output_path.parent(), Some(ws.output_dir().as_path()));
        assert_eq!(request.video_path, ws.video_dir().join("v1.mp4"));
        assert_eq!(request.seed, 1247);
        assert_eq!(request.inference_steps, 20);
    }
    assert_eq!(generator.seen[0].audio_path, ws.audio_dir().join("a.wav"));
    assert_eq!(generator.seen[1].audio_path, ws.audio_dir().join("b.wav"));
}

#[test]
fn empty_audio_is_reported_before_video_dir_is_read() {
    let ws = Workspace::new(&[], &[]);
    let missing_video = ws.root.path().join("no-such-video-dir");

    let err = planner(PlanOptions::default())
        .plan_dirs(&ws.audio_dir(), &missing_video)
        .unwrap_err();

    assert!(matches!(
        err,
        BatchError::NoInput {
            kind: MediaKind::Audio,
            ..
        }
    ));
}

#[test]
fn empty_video_dir_is_no_input() {
    let ws = Workspace::new(&["a.wav"], &[]);
    let err = planner(PlanOptions::default())
        .plan_dirs(&ws.audio_dir(), &ws.video_dir())
        .unwrap_err();

    assert!(matches!(
        err,
        BatchError::NoInput {
            kind: MediaKind::Video,
            ..
        }
    ));
}

#[test]
fn audio_differing_only_in_extension_case_is_rejected() {
    let ws = Workspace::new(&["a.wav", "a.WAV"], &["v1.mp4"]);
    let err = planner(PlanOptions::default())
        .plan_dirs(&ws.audio_dir(), &ws.video_dir())
        .unwrap_err();

    assert!(matches!(
        err,
        BatchError::DuplicateBaseName {
            kind: MediaKind::Audio,
            ref base_name,
            ..
        } if base_name == "a"
    ));
}

#[test]
fn same_seed_same_pairings_from_disk() {
    let audio: Vec<String> = (0..12).map(|i| format!("clip{:02}.wav", i)).collect();
    let audio_refs: Vec<&str> = audio.iter().map(String::as_str).collect();
    let ws = Workspace::new(&audio_refs, &["v1.mp4", "v2.mp4", "v3.mp4", "v4.mp4"]);

    let pairings = |seed: u64, repeats: bool| -> Vec<(String, String)> {
        planner(PlanOptions::default().with_seed(seed).with_repeat_videos(repeats))
            .plan_dirs(&ws.audio_dir(), &ws.video_dir())
            .unwrap()
            .map(|c| (c.video().file_name(), c.audio().file_name()))
            .collect()
    };

    assert_eq!(pairings(99, false), pairings(99, false));
    assert_eq!(pairings(99, true), pairings(99, true));
}

#[test]
fn cycling_uses_every_video_before_repeating() {
    let audio: Vec<String> = (0..10).map(|i| format!("clip{:02}.wav", i)).collect();
    let audio_refs: Vec<&str> = audio.iter().map(String::as_str).collect();
    let ws = Workspace::new(&audio_refs, &["v1.mp4", "v2.mp4", "v3.mp4", "v4.mp4"]);

    let videos: Vec<String> = planner(PlanOptions::default().with_seed(5))
        .plan_dirs(&ws.audio_dir(), &ws.video_dir())
        .unwrap()
        .map(|c| c.video().file_name())
        .collect();

    let mut first_round = videos[..4].to_vec();
    first_round.sort();
    assert_eq!(first_round, vec!["v1.mp4", "v2.mp4", "v3.mp4", "v4.mp4"]);
}

#[test]
fn max_combinations_keeps_plan_prefix() {
    let audio: Vec<String> = (0..8).map(|i| format!("clip{:02}.wav", i)).collect();
    let audio_refs: Vec<&str> = audio.iter().map(String::as_str).collect();
    let ws = Workspace::new(&audio_refs, &["v1.mp4", "v2.mp4", "v3.mp4"]);

    let names = |options: PlanOptions| -> Vec<String> {
        planner(options)
            .plan_dirs(&ws.audio_dir(), &ws.video_dir())
            .unwrap()
            .map(|c| c.output_name().to_string())
            .collect()
    };

    let full = names(PlanOptions::default().with_seed(11));
    let truncated = names(PlanOptions::default().with_seed(11).with_max_combinations(3));

    assert_eq!(full.len(), 8);
    assert_eq!(truncated, full[..3].to_vec());
}

//! Async pipeline tests.

#![cfg(feature = "async")]

mod common;

use common::{RecordingSink, SyntheticSource, two_jump_track, zone};
use shotreel::{CancellationToken, PipelineOptions, RunConfig, ShotError, ShotPipeline};

fn pipeline(dir: &std::path::Path) -> ShotPipeline {
    let config = RunConfig::new(2, 2.0, 2.0, 30.0, 1.8).unwrap();
    ShotPipeline::new(zone(), config, dir).unwrap()
}

#[tokio::test]
async fn run_async_reports_progress_and_result() {
    let dir = tempfile::tempdir().unwrap();
    let mut task = pipeline(dir.path()).run_async(
        SyntheticSource::new(10.0, &[3, 7]),
        two_jump_track(),
        RecordingSink::default(),
    );

    let mut percents = Vec::new();
    while let Some(info) = task.progress().recv().await {
        percents.push(info.percent);
    }
    let summary = task.await.unwrap();

    assert_eq!(summary.raw_events, vec![3, 7]);
    assert_eq!(summary.clips.len(), 2);
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn run_async_honours_cancelled_token() {
    let dir = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let task = pipeline(dir.path())
        .with_options(PipelineOptions::new().with_cancellation(token))
        .run_async(
            SyntheticSource::new(10.0, &[3, 7]),
            two_jump_track(),
            RecordingSink::default(),
        );

    assert!(matches!(task.await, Err(ShotError::Cancelled)));
}

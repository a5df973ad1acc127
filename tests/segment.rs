//! Output segment clamping and planning tests.

use std::path::Path;

use shotreel::{OutputSegment, SegmentExtractor, merge_events};

fn bounds(segment: &OutputSegment) -> (f64, f64) {
    (segment.start, segment.end)
}

#[test]
fn interior_anchor_is_padded_both_ways() {
    let segment = OutputSegment::around(0, 5, 2.0, 3.0, 10.0);
    assert_eq!(bounds(&segment), (3.0, 8.0));
    assert_eq!(segment.anchor, 5);
    assert_eq!(segment.length(), 5.0);
}

#[test]
fn start_clamped_at_zero() {
    let segment = OutputSegment::around(0, 0, 2.0, 2.0, 10.0);
    assert_eq!(bounds(&segment), (0.0, 2.0));

    let segment = OutputSegment::around(0, 1, 2.5, 2.0, 10.0);
    assert_eq!(bounds(&segment), (0.0, 3.0));
}

#[test]
fn end_clamped_at_duration() {
    let segment = OutputSegment::around(0, 10, 2.0, 2.0, 10.0);
    assert_eq!(bounds(&segment), (8.0, 10.0));

    let segment = OutputSegment::around(0, 9, 2.0, 2.0, 9.5);
    assert_eq!(bounds(&segment), (7.0, 9.5));
}

#[test]
fn zero_padding_gives_empty_cut_at_anchor() {
    let segment = OutputSegment::around(0, 4, 0.0, 0.0, 10.0);
    assert!(segment.start <= segment.end);
    assert_eq!(bounds(&segment), (4.0, 4.0));
    assert_eq!(segment.length(), 0.0);
}

#[test]
fn short_media_keeps_bounds_ordered() {
    let segment = OutputSegment::around(0, 0, 2.0, 2.0, 0.5);
    assert_eq!(bounds(&segment), (0.0, 0.5));
    assert!(0.0 <= segment.start && segment.start <= segment.end && segment.end <= 0.5);
}

#[test]
fn file_stem_is_one_based() {
    assert_eq!(OutputSegment::around(0, 3, 1.0, 1.0, 10.0).file_stem(), "shot_1");
    assert_eq!(OutputSegment::around(4, 3, 1.0, 1.0, 10.0).file_stem(), "shot_5");
}

#[test]
fn plan_anchors_each_group_on_its_representative() {
    let groups = merge_events(&[0, 1, 2, 9, 20], 2);
    let extractor = SegmentExtractor::new(2.0, 2.0, Path::new("out"), "mp4");
    let segments = extractor.plan(&groups, 21.0);

    let summary: Vec<(usize, u64, f64, f64)> = segments
        .iter()
        .map(|s| (s.index, s.anchor, s.start, s.end))
        .collect();
    assert_eq!(
        summary,
        vec![(0, 1, 0.0, 3.0), (1, 9, 7.0, 11.0), (2, 20, 18.0, 21.0)]
    );
}

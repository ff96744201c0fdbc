use crate::types::Segment;

pub const DEFAULT_MIN_DURATION: f64 = 1.5;
pub const DEFAULT_GAP_THRESHOLD: f64 = 0.5;

/// Merge raw transcript segments into dubbing-safe units.
///
/// A segment shorter than `min_duration`, or followed by a gap smaller
/// than `gap_threshold`, is merged with its successor so that synthesized
/// clips cannot overlap each other in the output track. The engine only
/// coarsens granularity; it never splits or drops a segment. Ids are
/// re-assigned densely from 1 in output order.
pub fn merge_segments(raw: Vec<Segment>, min_duration: f64, gap_threshold: f64) -> Vec<Segment> {
    let mut iter = raw.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    for next in iter {
        let duration = current.end - current.start;
        let gap = next.start - current.end;

        if duration < min_duration || gap < gap_threshold {
            // Keep current's start, take next's end
            current.end = next.end;
            current.text.push(' ');
            current.text.push_str(&next.text);
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);

    reindex(&mut merged);
    merged
}

/// Densely re-assign ids 1..N in order.
pub fn reindex(segments: &mut [Segment]) {
    for (i, seg) in segments.iter_mut().enumerate() {
        seg.id = i as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: u32, start: f64, end: f64, text: &str) -> Segment {
        Segment {
            id,
            start,
            end,
            text: text.to_string(),
            translated: String::new(),
            audio_path: None,
        }
    }

    #[test]
    fn empty_input_produces_empty_output() {
        assert!(merge_segments(Vec::new(), DEFAULT_MIN_DURATION, DEFAULT_GAP_THRESHOLD).is_empty());
    }

    #[test]
    fn merges_short_and_close_segments() {
        let raw = vec![
            seg(1, 0.0, 0.8, "Hi"),
            seg(2, 0.9, 2.4, "there"),
            seg(3, 4.0, 7.0, "how are you"),
        ];

        let merged = merge_segments(raw, 1.5, 0.5);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].start, 0.0);
        assert_eq!(merged[0].end, 2.4);
        assert_eq!(merged[0].text, "Hi there");
        assert_eq!(merged[1].start, 4.0);
        assert_eq!(merged[1].end, 7.0);
        assert_eq!(merged[1].text, "how are you");
    }

    #[test]
    fn accumulator_keeps_absorbing_while_short() {
        // After "Hi" + "there" the accumulator spans 0.0..1.2, still under
        // the 1.5s minimum, so it absorbs the next segment despite the gap.
        let raw = vec![
            seg(1, 0.0, 0.8, "Hi"),
            seg(2, 0.9, 1.2, "there"),
            seg(3, 3.0, 6.0, "how are you"),
        ];

        let merged = merge_segments(raw, 1.5, 0.5);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, 0.0);
        assert_eq!(merged[0].end, 6.0);
        assert_eq!(merged[0].text, "Hi there how are you");
    }

    #[test]
    fn reassigns_ids_densely_from_one() {
        let raw = vec![
            seg(7, 0.0, 0.5, "a"),
            seg(12, 0.6, 1.0, "b"),
            seg(40, 5.0, 8.0, "c"),
        ];

        let merged = merge_segments(raw, 1.5, 0.5);

        let ids: Vec<u32> = merged.iter().map(|s| s.id).collect();
        assert_eq!(ids, (1..=merged.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn single_short_segment_is_still_emitted() {
        let merged = merge_segments(vec![seg(1, 0.0, 0.3, "hey")], 1.5, 0.5);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "hey");
    }

    #[test]
    fn run_of_short_segments_collapses_into_one() {
        let raw = vec![
            seg(1, 0.0, 0.4, "one"),
            seg(2, 0.5, 0.9, "two"),
            seg(3, 1.0, 1.4, "three"),
            seg(4, 1.5, 1.9, "four"),
        ];

        let merged = merge_segments(raw, 1.5, 0.5);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, 0.0);
        assert_eq!(merged[0].end, 1.9);
        assert_eq!(merged[0].text, "one two three four");
    }

    #[test]
    fn preserves_all_text_in_order() {
        let raw = vec![
            seg(1, 0.0, 0.8, "alpha"),
            seg(2, 0.9, 1.2, "beta"),
            seg(3, 3.0, 6.0, "gamma"),
            seg(4, 6.1, 6.2, "delta"),
        ];
        let joined_raw: Vec<String> = raw.iter().map(|s| s.text.clone()).collect();

        let merged = merge_segments(raw, 1.5, 0.5);

        let joined_merged: Vec<&str> = merged
            .iter()
            .flat_map(|s| s.text.split(' '))
            .collect();
        assert_eq!(joined_merged, joined_raw);
    }

    #[test]
    fn merge_is_idempotent() {
        let raw = vec![
            seg(1, 0.0, 0.8, "Hi"),
            seg(2, 0.9, 1.2, "there"),
            seg(3, 3.0, 6.0, "how are you"),
            seg(4, 7.2, 9.5, "fine thanks"),
        ];

        let once = merge_segments(raw, 1.5, 0.5);
        let twice = merge_segments(once.clone(), 1.5, 0.5);

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn output_is_ordered_and_non_overlapping() {
        let raw = vec![
            seg(1, 0.0, 0.4, "a"),
            seg(2, 0.5, 2.5, "b"),
            seg(3, 4.0, 4.2, "c"),
            seg(4, 4.3, 7.0, "d"),
            seg(5, 10.0, 12.0, "e"),
        ];

        let merged = merge_segments(raw, 1.5, 0.5);

        for pair in merged.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}

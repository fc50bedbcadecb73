//! Segmentation of long keypoint sequences into windows.

use posewatch_common::{PosewatchError, PosewatchResult};
use posewatch_skeleton_model::{FrameKeypoints, SequenceWindow};

/// Default minimum trailing segment length: half the window, rounded up.
pub fn default_min_tail(window_len: usize) -> usize {
    window_len.div_ceil(2)
}

/// Cut a video's frames into fixed-length windows.
///
/// Up to `window_len` frames produce exactly one padded window, including
/// the zero-frame case. Longer sequences are cut into consecutive
/// non-overlapping chunks; a final partial chunk is padded and kept only if
/// it has at least `min_tail` frames.
pub fn segment_frames(
    frames: &[FrameKeypoints],
    window_len: usize,
    min_tail: usize,
) -> PosewatchResult<Vec<SequenceWindow>> {
    if window_len == 0 {
        return Err(PosewatchError::config("window length must be at least 1"));
    }
    if frames.len() <= window_len {
        return Ok(vec![SequenceWindow::from_frames(frames, window_len)?]);
    }

    let mut windows = Vec::with_capacity(frames.len() / window_len + 1);
    for chunk in frames.chunks(window_len) {
        if chunk.len() < window_len && chunk.len() < min_tail {
            tracing::trace!(tail = chunk.len(), min_tail, "Discarding short trailing segment");
            continue;
        }
        windows.push(SequenceWindow::from_frames(chunk, window_len)?);
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use posewatch_skeleton_model::{Joint, JOINT_COUNT};

    fn frames(n: usize) -> Vec<FrameKeypoints> {
        (0..n)
            .map(|i| FrameKeypoints::new([Joint::new(i as f32 / 100.0, 0.5, 0.9); JOINT_COUNT]))
            .collect()
    }

    #[test]
    fn test_default_min_tail() {
        assert_eq!(default_min_tail(30), 15);
        assert_eq!(default_min_tail(5), 3);
        assert_eq!(default_min_tail(1), 1);
    }

    #[test]
    fn test_short_and_empty_sequences_yield_one_window() {
        assert_eq!(segment_frames(&frames(0), 5, 3).unwrap().len(), 1);
        let windows = segment_frames(&frames(2), 5, 3).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].len(), 5);
    }

    #[test]
    fn test_short_tail_discarded() {
        let windows = segment_frames(&frames(65), 30, 15).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].frames()[0], frames(65)[30]);
    }

    #[test]
    fn test_long_enough_tail_kept_and_padded() {
        let input = frames(75);
        let windows = segment_frames(&input, 30, 15).unwrap();
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.len() == 30));
        assert_eq!(*windows[2].last(), input[74]);
    }

    #[test]
    fn test_exact_multiple() {
        assert_eq!(segment_frames(&frames(60), 30, 15).unwrap().len(), 2);
    }
}

// Copyright 2026 @lucent

/// Per-pass accumulation parameters handed to the launch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassInfo {
    pub frame_id: u32,
    pub checkerboard_id: u32,
    /// Accumulation buffers are overwritten rather than summed into.
    pub overwrite: bool,
}

/// Accumulation state machine. A pass begins by comparing the scene's
/// commit/upload epochs and the denoise flag against what the previous pass
/// saw; any difference restarts accumulation at frame zero. With
/// checkerboarding each frame is four passes, one per 2x2 sub-pattern, and
/// the frame counter advances only when the pattern wraps.
pub struct FrameState {
    frame_id: u32,
    checkerboard_id: u32,
    seen: Option<(u64, u64, bool)>,
    sample_limit: Option<u32>,
}

impl FrameState {
    pub fn new(sample_limit: Option<u32>) -> Self {
        Self {
            frame_id: 0,
            checkerboard_id: 0,
            seen: None,
            sample_limit,
        }
    }

    /// Whether the next pass will restart accumulation, answerable without
    /// rendering anything.
    pub fn next_frame_reset(&self, commit: u64, upload: u64, denoise: bool) -> bool {
        match self.seen {
            None => true,
            Some(epochs) => epochs != (commit, upload, denoise),
        }
    }

    /// Number of completed full frames accumulated so far.
    pub fn num_samples(&self) -> u32 {
        self.frame_id
    }

    /// Forces the next pass to restart accumulation regardless of epochs.
    pub fn invalidate(&mut self) {
        self.seen = None;
    }

    /// Starts a pass; `None` once the sample limit is reached, making
    /// further renders no-ops until something resets accumulation.
    pub fn begin(&mut self, commit: u64, upload: u64, denoise: bool) -> Option<PassInfo> {
        if self.next_frame_reset(commit, upload, denoise) {
            self.frame_id = 0;
            self.checkerboard_id = 0;
        }
        self.seen = Some((commit, upload, denoise));

        if let Some(limit) = self.sample_limit {
            if self.frame_id >= limit {
                return None;
            }
        }

        Some(PassInfo {
            frame_id: self.frame_id,
            checkerboard_id: self.checkerboard_id,
            overwrite: self.frame_id == 0,
        })
    }

    /// Completes a pass and advances the counters.
    pub fn end(&mut self, checkerboard: bool) {
        if checkerboard {
            self.checkerboard_id = (self.checkerboard_id + 1) & 3;
            if self.checkerboard_id == 0 {
                self.frame_id += 1;
            }
        } else {
            self.frame_id += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_pass(state: &mut FrameState, epochs: (u64, u64), checkerboard: bool) -> PassInfo {
        let info = state.begin(epochs.0, epochs.1, false).expect("pass");
        state.end(checkerboard);
        info
    }

    #[test]
    fn test_checkerboard_cycle() {
        let mut state = FrameState::new(None);
        let mut ids = Vec::new();
        let mut frames = Vec::new();
        for _ in 0..5 {
            let info = run_pass(&mut state, (1, 1), true);
            ids.push(info.checkerboard_id);
            frames.push(info.frame_id);
        }
        assert_eq!(ids, vec![0, 1, 2, 3, 0]);
        assert_eq!(frames, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_frame_advances_every_pass_without_checkerboard() {
        let mut state = FrameState::new(None);
        for expected in 0..4 {
            let info = run_pass(&mut state, (1, 1), false);
            assert_eq!(info.frame_id, expected);
            assert_eq!(info.checkerboard_id, 0);
        }
    }

    #[test]
    fn test_epoch_change_resets_mid_sequence() {
        let mut state = FrameState::new(None);
        for _ in 0..3 {
            run_pass(&mut state, (1, 1), false);
        }
        assert!(!state.next_frame_reset(1, 1, false));
        assert!(state.next_frame_reset(2, 1, false));

        let info = run_pass(&mut state, (2, 1), false);
        assert_eq!(info.frame_id, 0);
        assert!(info.overwrite);
    }

    #[test]
    fn test_upload_change_resets() {
        let mut state = FrameState::new(None);
        run_pass(&mut state, (1, 1), false);
        let info = run_pass(&mut state, (1, 2), false);
        assert_eq!(info.frame_id, 0);
    }

    #[test]
    fn test_denoise_toggle_resets() {
        let mut state = FrameState::new(None);
        state.begin(1, 1, false).expect("pass");
        state.end(false);
        let info = state.begin(1, 1, true).expect("pass");
        assert_eq!(info.frame_id, 0);
    }

    #[test]
    fn test_sample_limit_saturates() {
        let mut state = FrameState::new(Some(2));
        run_pass(&mut state, (1, 1), false);
        run_pass(&mut state, (1, 1), false);
        assert!(state.begin(1, 1, false).is_none());
        assert_eq!(state.num_samples(), 2);

        // A scene edit lifts the cap by restarting accumulation.
        assert!(state.begin(2, 1, false).is_some());
    }

    #[test]
    fn test_invalidate_forces_reset() {
        let mut state = FrameState::new(None);
        run_pass(&mut state, (1, 1), false);
        run_pass(&mut state, (1, 1), false);
        state.invalidate();
        let info = run_pass(&mut state, (1, 1), false);
        assert_eq!(info.frame_id, 0);
    }

    #[test]
    fn test_second_frame_accumulates() {
        let mut state = FrameState::new(None);
        run_pass(&mut state, (1, 1), false);
        let info = state.begin(1, 1, false).expect("pass");
        assert_eq!(info.frame_id, 1);
        assert!(!info.overwrite);
    }
}

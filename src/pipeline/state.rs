//! Pipeline state machines.
//!
//! Each request walks its pipeline's states in order; [`StateTracker`]
//! records the walk and logs every transition.
//!
//! ```text
//! Interview: NotStarted ─▶ Normalizing ─▶ Running ─▶ Combining ─▶ Done(Success | Degraded)
//!                               └──validation error──────────────▶ Done(Fallback)
//!
//! Feedback:  NotStarted ─▶ Normalizing ─▶ Classifying ─▶ Routing ─▶ Responding ─▶ Done(Success | Degraded)
//!                               └──validation error───────────────────────────────▶ Done(Fallback)
//! ```

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every stage answered; the record has `success = true`.
    Success,
    /// A merged record was produced but at least one stage failed.
    Degraded,
    /// The uniform fallback record was returned.
    Fallback,
}

impl Outcome {
    /// Outcome of a run that reached the merge step.
    pub fn merged(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Degraded
        }
    }
}

/// Shared behaviour of the per-pipeline state enums.
pub trait PipelineState: Copy + PartialEq + std::fmt::Debug {
    fn label(&self) -> &'static str;

    /// Whether moving from `self` to `next` is a legal transition.
    fn can_advance_to(&self, next: &Self) -> bool;

    fn is_done(&self) -> bool;
}

// ---------------------------------------------------------------------------
// InterviewState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterviewState {
    #[default]
    NotStarted,
    Normalizing,
    /// The three analysis stages are in flight.
    Running,
    Combining,
    Done(Outcome),
}

impl PipelineState for InterviewState {
    fn label(&self) -> &'static str {
        match self {
            InterviewState::NotStarted => "NotStarted",
            InterviewState::Normalizing => "Normalizing",
            InterviewState::Running => "Running",
            InterviewState::Combining => "Combining",
            InterviewState::Done(Outcome::Success) => "Done(success)",
            InterviewState::Done(Outcome::Degraded) => "Done(degraded)",
            InterviewState::Done(Outcome::Fallback) => "Done(fallback)",
        }
    }

    fn can_advance_to(&self, next: &Self) -> bool {
        use InterviewState::*;
        matches!(
            (self, next),
            (NotStarted, Normalizing)
                | (Normalizing, Running)
                | (Running, Combining)
                | (Combining, Done(_))
                | (Normalizing, Done(Outcome::Fallback))
        )
    }

    fn is_done(&self) -> bool {
        matches!(self, InterviewState::Done(_))
    }
}

// ---------------------------------------------------------------------------
// FeedbackState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackState {
    #[default]
    NotStarted,
    Normalizing,
    Classifying,
    /// Picking the response stage for the classification.
    Routing,
    Responding,
    Done(Outcome),
}

impl PipelineState for FeedbackState {
    fn label(&self) -> &'static str {
        match self {
            FeedbackState::NotStarted => "NotStarted",
            FeedbackState::Normalizing => "Normalizing",
            FeedbackState::Classifying => "Classifying",
            FeedbackState::Routing => "Routing",
            FeedbackState::Responding => "Responding",
            FeedbackState::Done(Outcome::Success) => "Done(success)",
            FeedbackState::Done(Outcome::Degraded) => "Done(degraded)",
            FeedbackState::Done(Outcome::Fallback) => "Done(fallback)",
        }
    }

    fn can_advance_to(&self, next: &Self) -> bool {
        use FeedbackState::*;
        matches!(
            (self, next),
            (NotStarted, Normalizing)
                | (Normalizing, Classifying)
                | (Classifying, Routing)
                | (Routing, Responding)
                | (Responding, Done(_))
                | (Normalizing, Done(Outcome::Fallback))
        )
    }

    fn is_done(&self) -> bool {
        matches!(self, FeedbackState::Done(_))
    }
}

// ---------------------------------------------------------------------------
// StateTracker
// ---------------------------------------------------------------------------

/// Records the states one request passes through.
#[derive(Debug)]
pub struct StateTracker<S: PipelineState> {
    pipeline: &'static str,
    history: Vec<S>,
}

impl<S: PipelineState + Default> StateTracker<S> {
    pub fn new(pipeline: &'static str) -> Self {
        Self {
            pipeline,
            history: vec![S::default()],
        }
    }
}

impl<S: PipelineState> StateTracker<S> {
    pub fn current(&self) -> S {
        // history always holds the initial state
        self.history[self.history.len() - 1]
    }

    pub fn advance(&mut self, next: S) {
        let current = self.current();
        debug_assert!(
            current.can_advance_to(&next),
            "{}: illegal transition {} -> {}",
            self.pipeline,
            current.label(),
            next.label()
        );
        log::debug!("{}: {} -> {}", self.pipeline, current.label(), next.label());
        self.history.push(next);
    }

    pub fn history(&self) -> &[S] {
        &self.history
    }

    pub fn into_history(self) -> Vec<S> {
        self.history
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interview_labels() {
        assert_eq!(InterviewState::NotStarted.label(), "NotStarted");
        assert_eq!(InterviewState::Running.label(), "Running");
        assert_eq!(
            InterviewState::Done(Outcome::Fallback).label(),
            "Done(fallback)"
        );
    }

    #[test]
    fn feedback_labels() {
        assert_eq!(FeedbackState::Routing.label(), "Routing");
        assert_eq!(FeedbackState::Done(Outcome::Success).label(), "Done(success)");
    }

    #[test]
    fn interview_happy_path_is_legal() {
        use InterviewState::*;
        let path = [NotStarted, Normalizing, Running, Combining, Done(Outcome::Success)];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(&pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn interview_validation_shortcut_only_to_fallback() {
        use InterviewState::*;
        assert!(Normalizing.can_advance_to(&Done(Outcome::Fallback)));
        assert!(!Normalizing.can_advance_to(&Done(Outcome::Success)));
        assert!(!NotStarted.can_advance_to(&Running));
        assert!(!Running.can_advance_to(&Normalizing));
    }

    #[test]
    fn feedback_happy_path_is_legal() {
        use FeedbackState::*;
        let path = [
            NotStarted,
            Normalizing,
            Classifying,
            Routing,
            Responding,
            Done(Outcome::Success),
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(&pair[1]), "{:?}", pair);
        }
        assert!(!Classifying.can_advance_to(&Responding));
    }

    #[test]
    fn merged_outcome_follows_success() {
        assert_eq!(Outcome::merged(true), Outcome::Success);
        assert_eq!(Outcome::merged(false), Outcome::Degraded);
        assert_eq!(
            InterviewState::Done(Outcome::Degraded).label(),
            "Done(degraded)"
        );
        assert!(InterviewState::Combining.can_advance_to(&InterviewState::Done(Outcome::Degraded)));
        assert!(FeedbackState::Responding.can_advance_to(&FeedbackState::Done(Outcome::Degraded)));
        assert!(!FeedbackState::Normalizing.can_advance_to(&FeedbackState::Done(Outcome::Degraded)));
    }

    #[test]
    fn done_states() {
        assert!(InterviewState::Done(Outcome::Success).is_done());
        assert!(!InterviewState::Combining.is_done());
        assert!(FeedbackState::Done(Outcome::Fallback).is_done());
        assert!(!FeedbackState::NotStarted.is_done());
    }

    #[test]
    fn tracker_records_history() {
        let mut tracker = StateTracker::<FeedbackState>::new("feedback");
        assert_eq!(tracker.current(), FeedbackState::NotStarted);

        tracker.advance(FeedbackState::Normalizing);
        tracker.advance(FeedbackState::Done(Outcome::Fallback));

        assert_eq!(tracker.current(), FeedbackState::Done(Outcome::Fallback));
        assert_eq!(
            tracker.history(),
            &[
                FeedbackState::NotStarted,
                FeedbackState::Normalizing,
                FeedbackState::Done(Outcome::Fallback)
            ]
        );
        assert_eq!(tracker.into_history().len(), 3);
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    #[cfg(debug_assertions)]
    fn tracker_rejects_illegal_transition_in_debug() {
        let mut tracker = StateTracker::<InterviewState>::new("interview");
        tracker.advance(InterviewState::Combining);
    }
}

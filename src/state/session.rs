use serde::Serialize;

use crate::error::CoachError;

/// Where a guidance session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuidanceState {
    /// Created, first step not yet presented.
    AwaitingFirstStep,
    /// A step is on screen and the student owes an answer.
    AwaitingStepAnswer,
    /// Every step was answered correctly. Terminal.
    Correct,
    /// The student moved on to another problem. Terminal.
    Abandoned,
}

/// One attempted step: the prompt that was shown and the answer given.
/// Appended before the outcome of the attempt is known, so retried
/// attempts stay in the log even though the display moves on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepExchange {
    pub step_prompt: String,
    pub answer: String,
}

/// The outcome of one step evaluation, for the caller to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum StepTransition {
    Advance { step_prompt: String },
    Retry { step_prompt: String },
    Complete,
}

/// The step-by-step remediation session for one problem. Owned by
/// exactly one episode and destroyed with it, never reused.
///
/// `current_step_prompt` is non-empty whenever the state is
/// `AwaitingStepAnswer`, and `step_index` never decreases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidanceSession {
    pub problem_id: String,
    pub state: GuidanceState,
    /// Zero-based index of the step currently on screen.
    pub step_index: usize,
    pub current_step_prompt: String,
    pub exchanges: Vec<StepExchange>,
}

impl GuidanceSession {
    pub fn new<S: Into<String>>(problem_id: S) -> Self {
        GuidanceSession {
            problem_id: problem_id.into(),
            state: GuidanceState::AwaitingFirstStep,
            step_index: 0,
            current_step_prompt: String::new(),
            exchanges: Vec::new(),
        }
    }

    /// Install the first step and start awaiting an answer.
    pub fn begin(&mut self, first_step: String) -> Result<(), CoachError> {
        if self.state != GuidanceState::AwaitingFirstStep {
            return Err(CoachError::validation("guidance session already started"));
        }
        if first_step.trim().is_empty() {
            return Err(CoachError::validation("first step text is empty"));
        }
        self.current_step_prompt = first_step;
        self.state = GuidanceState::AwaitingStepAnswer;
        Ok(())
    }

    /// Record an attempt against the current step. Called once per
    /// evaluated answer, before the transition is applied.
    pub fn record_exchange(&mut self, answer: &str) {
        self.exchanges.push(StepExchange {
            step_prompt: self.current_step_prompt.clone(),
            answer: answer.to_string(),
        });
    }

    /// The answer was right and more steps remain; move to the next one.
    pub fn advance(&mut self, next_step: String) -> Result<StepTransition, CoachError> {
        self.require_awaiting_answer()?;
        if next_step.trim().is_empty() {
            return Err(CoachError::validation("next step text is empty"));
        }
        self.step_index += 1;
        self.current_step_prompt = next_step.clone();
        Ok(StepTransition::Advance {
            step_prompt: next_step,
        })
    }

    /// The answer was wrong; the same step is presented again, possibly
    /// restated with a hint.
    pub fn retry(&mut self, revised_step: String) -> Result<StepTransition, CoachError> {
        self.require_awaiting_answer()?;
        if revised_step.trim().is_empty() {
            return Err(CoachError::validation("retry step text is empty"));
        }
        self.current_step_prompt = revised_step.clone();
        Ok(StepTransition::Retry {
            step_prompt: revised_step,
        })
    }

    /// The final step was answered correctly.
    pub fn complete(&mut self) -> Result<StepTransition, CoachError> {
        self.require_awaiting_answer()?;
        self.state = GuidanceState::Correct;
        Ok(StepTransition::Complete)
    }

    /// Leave the session. No-op when already terminal.
    pub fn abandon(&mut self) {
        if matches!(
            self.state,
            GuidanceState::AwaitingFirstStep | GuidanceState::AwaitingStepAnswer
        ) {
            self.state = GuidanceState::Abandoned;
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == GuidanceState::AwaitingStepAnswer
    }

    fn require_awaiting_answer(&self) -> Result<(), CoachError> {
        if self.state != GuidanceState::AwaitingStepAnswer {
            return Err(CoachError::validation(
                "guidance session is not awaiting a step answer",
            ));
        }
        Ok(())
    }
}

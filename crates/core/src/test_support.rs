// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: proptest strategies and canned operations.

pub mod ops {
    use crate::operation::{OpStep, Operation, StepContext};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Operation that plays back a scripted sequence of step outcomes.
    ///
    /// Each `step` call consumes the next scripted outcome; once the script
    /// is exhausted, every further call reports `Done` with the configured
    /// final output. Handy for driving exact retry/continue sequences.
    pub struct ScriptedOp {
        kind: String,
        deps: Vec<usize>,
        script: Mutex<VecDeque<OpStep>>,
        final_output: Option<serde_json::Value>,
        data: serde_json::Value,
    }

    impl ScriptedOp {
        pub fn new(kind: impl Into<String>) -> Self {
            Self {
                kind: kind.into(),
                deps: Vec::new(),
                script: Mutex::new(VecDeque::new()),
                final_output: None,
                data: serde_json::Value::Null,
            }
        }

        /// Append one scripted outcome.
        pub fn then(self, step: OpStep) -> Self {
            self.script.lock().push_back(step);
            self
        }

        pub fn deps(mut self, deps: Vec<usize>) -> Self {
            self.deps = deps;
            self
        }

        pub fn final_output(mut self, output: serde_json::Value) -> Self {
            self.final_output = Some(output);
            self
        }

        pub fn data(mut self, data: serde_json::Value) -> Self {
            self.data = data;
            self
        }
    }

    #[async_trait]
    impl Operation for ScriptedOp {
        fn kind(&self) -> &str {
            &self.kind
        }

        fn dependencies(&self) -> Vec<usize> {
            self.deps.clone()
        }

        async fn step(&self, _ctx: StepContext<'_>) -> OpStep {
            match self.script.lock().pop_front() {
                Some(step) => step,
                None => OpStep::Done {
                    output: self.final_output.clone(),
                },
            }
        }

        fn serialize(&self) -> serde_json::Value {
            self.data.clone()
        }
    }
}

pub mod strategies {
    use crate::{JobState, StepCode, StopReason};
    use proptest::prelude::*;

    pub fn arb_job_state() -> impl Strategy<Value = JobState> {
        prop_oneof![
            Just(JobState::Pending),
            Just(JobState::Running),
            Just(JobState::Paused),
            Just(JobState::Retry),
            Just(JobState::Success),
            Just(JobState::Failure),
        ]
    }

    pub fn arb_stop_reason() -> impl Strategy<Value = StopReason> {
        prop_oneof![
            Just(StopReason::Paused),
            Just(StopReason::Canceled),
            Just(StopReason::Success),
            Just(StopReason::Failure),
            Just(StopReason::Retry),
        ]
    }

    pub fn arb_step_code() -> impl Strategy<Value = StepCode> {
        prop_oneof![
            Just(StepCode::Success),
            Just(StepCode::Continue),
            Just(StepCode::Retry),
            Just(StepCode::Failure),
        ]
    }
}

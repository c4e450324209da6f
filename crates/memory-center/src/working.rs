use serde::{Deserialize, Serialize};

/// Plan and loop bookkeeping for the goal currently being worked on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingMemory {
    pub plan: Vec<String>,
    pub step_index: usize,
    pub loop_counter: u32,
    pub loop_target: Option<u32>,
    /// Noun the loop counts (`applications`, `posts`), used in progress text.
    pub loop_subject: Option<String>,
}

impl WorkingMemory {
    pub fn set_plan(&mut self, steps: Vec<String>) {
        self.plan = steps
            .into_iter()
            .map(|step| step.trim().to_string())
            .filter(|step| !step.is_empty())
            .collect();
        self.step_index = 0;
    }

    pub fn current_step(&self) -> Option<&str> {
        self.plan.get(self.step_index).map(String::as_str)
    }

    /// Move to the next sub-task. Returns false once the plan is exhausted.
    pub fn advance_step(&mut self) -> bool {
        if self.step_index + 1 < self.plan.len() {
            self.step_index += 1;
            true
        } else {
            false
        }
    }

    pub fn set_loop_target(&mut self, target: u32, subject: Option<String>) {
        self.loop_target = (target > 0).then_some(target);
        self.loop_subject = subject;
        self.loop_counter = 0;
    }

    pub fn increment_loop(&mut self) -> u32 {
        self.loop_counter += 1;
        self.loop_counter
    }

    /// True when there is no target or the counter has reached it.
    pub fn loop_satisfied(&self) -> bool {
        self.loop_target
            .map(|target| self.loop_counter >= target)
            .unwrap_or(true)
    }

    pub fn loop_remaining(&self) -> u32 {
        self.loop_target
            .map(|target| target.saturating_sub(self.loop_counter))
            .unwrap_or(0)
    }

    pub(crate) fn step_progress(&self) -> Option<String> {
        let step = self.current_step()?;
        Some(format!(
            "CURRENT STEP: {}/{} - {}",
            self.step_index + 1,
            self.plan.len(),
            step
        ))
    }

    pub(crate) fn loop_progress(&self) -> Option<String> {
        let target = self.loop_target?;
        let subject = self.loop_subject.as_deref().unwrap_or("times");
        let mut line = format!("LOOP PROGRESS: {}/{} {}", self.loop_counter, target, subject);
        if self.loop_satisfied() {
            line.push_str(" (target reached)");
        } else {
            line.push_str(&format!(
                " ({} remaining; do not complete yet)",
                self.loop_remaining()
            ));
        }
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_advances_and_stops_at_the_last_step() {
        let mut working = WorkingMemory::default();
        working.set_plan(vec!["open site".into(), " ".into(), "search".into()]);
        assert_eq!(working.plan.len(), 2);
        assert_eq!(working.current_step(), Some("open site"));
        assert!(working.advance_step());
        assert!(!working.advance_step());
        assert_eq!(working.current_step(), Some("search"));
    }

    #[test]
    fn loop_target_gates_satisfaction() {
        let mut working = WorkingMemory::default();
        assert!(working.loop_satisfied());

        working.set_loop_target(3, Some("applications".into()));
        assert!(!working.loop_satisfied());
        working.increment_loop();
        working.increment_loop();
        assert_eq!(working.loop_remaining(), 1);
        assert_eq!(working.increment_loop(), 3);
        assert!(working.loop_satisfied());
    }

    #[test]
    fn zero_target_means_no_loop() {
        let mut working = WorkingMemory::default();
        working.set_loop_target(0, None);
        assert_eq!(working.loop_target, None);
        assert!(working.loop_progress().is_none());
    }
}

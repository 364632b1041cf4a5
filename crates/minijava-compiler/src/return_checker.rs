//! Return path verification for non-void methods.
//!
//! [`ReturnTracker`] is a two-state machine (satisfied or not) plus a
//! conditional-nesting counter. A `return` only satisfies the method when it
//! is not nested inside the body of an `if`, `while` or `for`, since the
//! fall-through path around that body would not return.
//!
//! An `if` with an `else` is the exception: both branches are tracked
//! separately at the current depth and the statement satisfies the method
//! when both of them do.
//!
//! # Example
//!
//! ```
//! use minijava_compiler::return_checker::ReturnTracker;
//!
//! let mut tracker = ReturnTracker::new(false);
//! tracker.enter_conditional();
//! tracker.record_return();
//! tracker.exit_conditional();
//! assert!(!tracker.is_satisfied());
//!
//! tracker.record_return();
//! assert!(tracker.is_satisfied());
//! ```

#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnTracker {
    satisfied: bool,
    depth: u32,
}

impl ReturnTracker {
    /// Void methods and constructors start out satisfied.
    pub fn new(pre_satisfied: bool) -> Self {
        Self {
            satisfied: pre_satisfied,
            depth: 0,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    /// A correctly typed `return` was seen.
    pub fn record_return(&mut self) {
        if self.depth == 0 {
            self.satisfied = true;
        }
    }

    pub fn enter_conditional(&mut self) {
        self.depth += 1;
    }

    pub fn exit_conditional(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced conditional exit");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Start tracking one arm of an `if`/`else`: returns the state so far
    /// and resets it.
    pub fn take(&mut self) -> bool {
        std::mem::replace(&mut self.satisfied, false)
    }

    /// Combine the two arms of an `if`/`else` with the state before it.
    pub fn merge(&mut self, before: bool, then_branch: bool, else_branch: bool) {
        self.satisfied = before || (then_branch && else_branch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_starts_satisfied() {
        assert!(ReturnTracker::new(true).is_satisfied());
        assert!(!ReturnTracker::new(false).is_satisfied());
    }

    #[test]
    fn top_level_return_satisfies() {
        let mut tracker = ReturnTracker::new(false);
        tracker.record_return();
        assert!(tracker.is_satisfied());
    }

    #[test]
    fn nested_return_does_not_satisfy() {
        let mut tracker = ReturnTracker::new(false);
        tracker.enter_conditional();
        tracker.enter_conditional();
        tracker.record_return();
        tracker.exit_conditional();
        tracker.record_return();
        tracker.exit_conditional();
        assert!(!tracker.is_satisfied());
    }

    #[test]
    fn both_arms_returning_satisfies() {
        let mut tracker = ReturnTracker::new(false);
        let before = tracker.take();
        tracker.record_return();
        let then_branch = tracker.take();
        tracker.record_return();
        let else_branch = tracker.take();
        tracker.merge(before, then_branch, else_branch);
        assert!(tracker.is_satisfied());
    }

    #[test]
    fn one_arm_returning_does_not_satisfy() {
        let mut tracker = ReturnTracker::new(false);
        let before = tracker.take();
        tracker.record_return();
        let then_branch = tracker.take();
        let else_branch = tracker.take();
        tracker.merge(before, then_branch, else_branch);
        assert!(!tracker.is_satisfied());
    }

    #[test]
    fn earlier_return_survives_later_if() {
        let mut tracker = ReturnTracker::new(false);
        tracker.record_return();
        let before = tracker.take();
        let then_branch = tracker.take();
        let else_branch = tracker.take();
        tracker.merge(before, then_branch, else_branch);
        assert!(tracker.is_satisfied());
    }
}

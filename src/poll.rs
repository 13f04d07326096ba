// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::time::Duration;

/// Retries after the first data-ready query.
pub const DATA_READY_MAX_RETRIES: u32 = 10;

/// Pause between two data-ready queries.
pub const DATA_READY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Ready,
    Failed,
}

/// Bounded data-ready wait. Fed one status per attempt, it decides whether
/// to stop or query again after [`DATA_READY_INTERVAL`].
///
/// The sensor occasionally answers a run of all-zero status words before a
/// ready one; that is absorbed by the retry budget like any other not-ready
/// answer.
#[derive(Debug, Clone)]
pub struct ReadyPoll {
    state: PollState,
    attempts: u32,
    max_retries: u32,
}

impl ReadyPoll {
    pub fn new(max_retries: u32) -> Self {
        ReadyPoll {
            state: PollState::Polling,
            attempts: 0,
            max_retries,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records the outcome of one query. Terminal states are sticky.
    pub fn observe(&mut self, ready: bool) -> PollState {
        if self.state != PollState::Polling {
            return self.state;
        }
        self.attempts += 1;
        if ready {
            self.state = PollState::Ready;
        } else if self.attempts > self.max_retries {
            self.state = PollState::Failed;
        }
        self.state
    }
}

impl Default for ReadyPoll {
    fn default() -> Self {
        ReadyPoll::new(DATA_READY_MAX_RETRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(answers: &[bool]) -> ReadyPoll {
        let mut poll = ReadyPoll::default();
        for &ready in answers {
            if poll.observe(ready) != PollState::Polling {
                break;
            }
        }
        poll
    }

    #[test]
    fn ready_on_sixth_attempt() {
        let poll = run(&[false, false, false, false, false, true]);
        assert_eq!(poll.state(), PollState::Ready);
        assert_eq!(poll.attempts(), 6);
    }

    #[test]
    fn eleven_not_ready_fails() {
        let poll = run(&[false; 11]);
        assert_eq!(poll.state(), PollState::Failed);
        assert_eq!(poll.attempts(), 11);
    }

    #[test]
    fn ready_on_last_attempt() {
        let mut answers = [false; 11];
        answers[10] = true;
        let poll = run(&answers);
        assert_eq!(poll.state(), PollState::Ready);
        assert_eq!(poll.attempts(), 11);
    }

    #[test]
    fn ten_not_ready_still_polling() {
        let poll = run(&[false; 10]);
        assert_eq!(poll.state(), PollState::Polling);
    }

    #[test]
    fn terminal_state_is_sticky() {
        let mut poll = ReadyPoll::new(0);
        assert_eq!(poll.observe(false), PollState::Failed);
        assert_eq!(poll.observe(true), PollState::Failed);
        assert_eq!(poll.attempts(), 1);
    }
}

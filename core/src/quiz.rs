//! Album quiz: pick the named album out of a shuffled set of options.

use crate::{
    config::QuizConfig,
    engine::GameEngine,
    event::GameEvent,
    rng::FeatureRng,
    types::TimestampMs,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRound {
    pub answer:  String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuessOutcome {
    Correct { reward: f64 },
    Incorrect,
    /// No round is open: either already answered or cooling down.
    Closed,
}

pub struct AlbumQuiz {
    config:         QuizConfig,
    rng:            FeatureRng,
    round:          Option<QuizRound>,
    cooldown_until: TimestampMs,
}

impl AlbumQuiz {
    pub fn new(config: QuizConfig, rng: FeatureRng) -> Self {
        Self {
            config,
            rng,
            round: None,
            cooldown_until: 0,
        }
    }

    pub fn round(&self) -> Option<&QuizRound> {
        self.round.as_ref()
    }

    pub fn cooldown_remaining_ms(&self, now_ms: TimestampMs) -> TimestampMs {
        (self.cooldown_until - now_ms).max(0)
    }

    /// Open a new round once the cooldown has run out. Returns the open round.
    pub fn poll(&mut self, now_ms: TimestampMs) -> Option<&QuizRound> {
        if self.round.is_none() && now_ms >= self.cooldown_until {
            self.round = Some(self.draw_round());
        }
        self.round.as_ref()
    }

    fn draw_round(&mut self) -> QuizRound {
        let albums = &self.config.albums;
        let answer = albums[self.rng.next_u64_below(albums.len() as u64) as usize].clone();

        let mut options = vec![answer.clone()];
        let mut pool: Vec<&String> = albums.iter().filter(|a| **a != answer).collect();
        self.rng.shuffle(&mut pool);
        options.extend(
            pool.into_iter()
                .take(self.config.options.saturating_sub(1))
                .cloned(),
        );
        self.rng.shuffle(&mut options);
        QuizRound { answer, options }
    }

    /// Judge a guess against the open round and start the cooldown.
    /// The coin reward is paid by [`GameEngine::answer_quiz`].
    fn judge(&mut self, guess: &str, now_ms: TimestampMs) -> GuessOutcome {
        let Some(round) = self.round.take() else {
            return GuessOutcome::Closed;
        };
        self.cooldown_until = now_ms + self.config.cooldown_ms;
        if round.answer == guess {
            GuessOutcome::Correct { reward: self.config.reward }
        } else {
            GuessOutcome::Incorrect
        }
    }
}

impl GameEngine {
    pub fn album_quiz(&mut self) -> AlbumQuiz {
        AlbumQuiz::new(self.config.quiz.clone(), self.quiz_rng.fork("album_quiz_round"))
    }

    pub fn answer_quiz(&mut self, quiz: &mut AlbumQuiz, guess: &str) -> GuessOutcome {
        let outcome = quiz.judge(guess, self.now_ms());
        match outcome {
            GuessOutcome::Correct { reward } => {
                self.add_coins(reward);
                self.record(GameEvent::QuizAnswered { correct: true, reward });
            }
            GuessOutcome::Incorrect => {
                self.record(GameEvent::QuizAnswered { correct: false, reward: 0.0 });
            }
            GuessOutcome::Closed => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, RngSlot};
    use std::collections::HashSet;

    fn quiz() -> AlbumQuiz {
        AlbumQuiz::new(QuizConfig::default(), RngBank::new(11).for_slot(RngSlot::AlbumQuiz))
    }

    #[test]
    fn round_has_distinct_options_including_answer() {
        let mut q = quiz();
        for _ in 0..20 {
            let round = q.draw_round();
            assert_eq!(round.options.len(), 4);
            assert!(round.options.contains(&round.answer));
            let unique: HashSet<&String> = round.options.iter().collect();
            assert_eq!(unique.len(), 4);
        }
    }

    #[test]
    fn guess_closes_round_and_starts_cooldown() {
        let mut q = quiz();
        let answer = q.poll(0).unwrap().answer.clone();
        assert_eq!(q.judge(&answer, 1_000), GuessOutcome::Correct { reward: 500.0 });
        assert_eq!(q.judge(&answer, 1_000), GuessOutcome::Closed);
        assert!(q.poll(30_999).is_none());
        assert_eq!(q.cooldown_remaining_ms(1_000), 30_000);
        assert!(q.poll(31_000).is_some());
    }

    #[test]
    fn wrong_guess_also_cools_down() {
        let mut q = quiz();
        q.poll(0);
        assert_eq!(q.judge("Not An Album", 0), GuessOutcome::Incorrect);
        assert!(q.poll(10_000).is_none());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HitTier {
    Perfect,
    Good,
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoteSide {
    /// The note that most recently passed.
    Previous,
    /// The upcoming note, hit slightly early.
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Judgement {
    Hit {
        side: NoteSide,
        tier: HitTier,
        error_ms: f64,
    },
    /// A note inside the window was already hit.
    Repeat { error_ms: f64 },
    /// Outside both windows.
    Between {
        prev_interval_ms: f64,
        next_interval_ms: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct JudgeWindows {
    pub(crate) tolerance_ms: f64,
    pub(crate) perfect_ms: f64,
    pub(crate) good_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RhythmStats {
    pub(crate) perfect: u32,
    pub(crate) good: u32,
    pub(crate) ok: u32,
    pub(crate) repeats: u32,
    pub(crate) between: u32,
    pub(crate) misses: u32,
}

impl RhythmStats {
    pub(crate) fn hits(&self) -> u32 {
        self.perfect + self.good + self.ok
    }
}

/// Beat grid with the previous and next note times. Hits are judged against whichever
/// note is within the tolerance window; a note that passes without a hit is a miss.
#[derive(Debug, Clone)]
pub(crate) struct RhythmJudge {
    windows: JudgeWindows,
    note_interval_ms: f64,
    prev_note_ms: f64,
    next_note_ms: f64,
    prev_note_hit: bool,
    next_note_hit: bool,
    stats: RhythmStats,
}

impl RhythmJudge {
    pub(crate) fn new(note_interval_ms: f64, windows: JudgeWindows) -> Self {
        Self {
            windows,
            note_interval_ms,
            prev_note_ms: 0.0,
            next_note_ms: note_interval_ms,
            prev_note_hit: false,
            next_note_hit: false,
            stats: RhythmStats::default(),
        }
    }

    pub(crate) fn stats(&self) -> RhythmStats {
        self.stats
    }

    pub(crate) fn prev_note_ms(&self) -> f64 {
        self.prev_note_ms
    }

    pub(crate) fn next_note_ms(&self) -> f64 {
        self.next_note_ms
    }

    /// Moves the grid to a note sounding at `at_ms`. Returns `true` when the note it
    /// replaces was never hit.
    pub(crate) fn note_passed(&mut self, at_ms: f64) -> bool {
        let missed = !self.prev_note_hit;
        if missed {
            self.stats.misses += 1;
        }
        self.prev_note_ms = at_ms;
        self.next_note_ms = at_ms + self.note_interval_ms;
        self.prev_note_hit = self.next_note_hit;
        self.next_note_hit = false;
        missed
    }

    pub(crate) fn judge(&mut self, hit_ms: f64) -> Judgement {
        let prev_interval_ms = hit_ms - self.prev_note_ms;
        let next_interval_ms = self.next_note_ms - hit_ms;
        let error_ms = prev_interval_ms.abs().min(next_interval_ms.abs());

        if prev_interval_ms.abs() < self.windows.tolerance_ms {
            self.claim(NoteSide::Previous, error_ms)
        } else if next_interval_ms.abs() < self.windows.tolerance_ms {
            self.claim(NoteSide::Next, error_ms)
        } else {
            self.stats.between += 1;
            Judgement::Between {
                prev_interval_ms,
                next_interval_ms,
            }
        }
    }

    fn claim(&mut self, side: NoteSide, error_ms: f64) -> Judgement {
        let already_hit = match side {
            NoteSide::Previous => &mut self.prev_note_hit,
            NoteSide::Next => &mut self.next_note_hit,
        };
        if *already_hit {
            self.stats.repeats += 1;
            return Judgement::Repeat { error_ms };
        }
        *already_hit = true;

        let tier = self.tier(error_ms);
        match tier {
            HitTier::Perfect => self.stats.perfect += 1,
            HitTier::Good => self.stats.good += 1,
            HitTier::Ok => self.stats.ok += 1,
        }
        Judgement::Hit {
            side,
            tier,
            error_ms,
        }
    }

    fn tier(&self, error_ms: f64) -> HitTier {
        if error_ms <= self.windows.perfect_ms {
            HitTier::Perfect
        } else if error_ms <= self.windows.good_ms {
            HitTier::Good
        } else {
            HitTier::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOWS: JudgeWindows = JudgeWindows {
        tolerance_ms: 30.0,
        perfect_ms: 5.0,
        good_ms: 10.0,
    };

    fn judge_at_500ms() -> RhythmJudge {
        let mut judge = RhythmJudge::new(500.0, WINDOWS);
        judge.note_passed(500.0);
        judge
    }

    #[test]
    fn hit_just_after_a_note_claims_it_with_tier() {
        let mut judge = judge_at_500ms();

        assert_eq!(
            judge.judge(503.0),
            Judgement::Hit {
                side: NoteSide::Previous,
                tier: HitTier::Perfect,
                error_ms: 3.0,
            }
        );
        assert_eq!(judge.judge(508.0), Judgement::Repeat { error_ms: 8.0 });
        assert_eq!(judge.stats().perfect, 1);
        assert_eq!(judge.stats().repeats, 1);
    }

    #[test]
    fn early_hit_pre_claims_the_next_note() {
        let mut judge = judge_at_500ms();

        let judgement = judge.judge(992.0);
        assert_eq!(
            judgement,
            Judgement::Hit {
                side: NoteSide::Next,
                tier: HitTier::Good,
                error_ms: 8.0,
            }
        );

        // the 500ms note itself was never hit
        assert!(judge.note_passed(1000.0));
        assert_eq!(judge.prev_note_ms(), 1000.0);
        assert_eq!(judge.next_note_ms(), 1500.0);
        assert!(!judge.note_passed(1500.0));
    }

    #[test]
    fn hit_between_windows_is_reported_with_both_intervals() {
        let mut judge = judge_at_500ms();

        assert_eq!(
            judge.judge(700.0),
            Judgement::Between {
                prev_interval_ms: 200.0,
                next_interval_ms: 300.0,
            }
        );
        assert_eq!(judge.stats().between, 1);
        assert_eq!(judge.stats().hits(), 0);
    }

    #[test]
    fn tiers_follow_error_bounds() {
        let mut judge = RhythmJudge::new(500.0, WINDOWS);
        for (note, offset, tier) in [
            (500.0, 5.0, HitTier::Perfect),
            (1000.0, 10.0, HitTier::Good),
            (1500.0, 29.0, HitTier::Ok),
        ] {
            judge.note_passed(note);
            let Judgement::Hit { tier: actual, .. } = judge.judge(note + offset) else {
                panic!("expected hit at {note}+{offset}");
            };
            assert_eq!(actual, tier);
        }
        assert_eq!(judge.stats().hits(), 3);
    }

    #[test]
    fn unhit_notes_count_as_misses() {
        let mut judge = RhythmJudge::new(500.0, WINDOWS);

        assert!(judge.note_passed(500.0));
        judge.judge(505.0);
        assert!(!judge.note_passed(1000.0));
        assert!(judge.note_passed(1500.0));

        assert_eq!(judge.stats().misses, 2);
    }
}

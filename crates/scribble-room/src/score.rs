//! Scoring rules. Pure functions, no room state.

/// Points for a correct guess made with `time_left` seconds remaining:
/// half the remaining time, rounded up.
pub fn guesser_score(time_left: u32) -> u32 {
    time_left.div_ceil(2)
}

/// Points for the drawer at round end: the fraction of non-drawing players
/// who guessed, scaled to 10 and rounded down. Zero when nobody else is in
/// the room.
pub fn drawer_score(correct: usize, non_drawing: usize) -> u32 {
    if non_drawing == 0 {
        return 0;
    }
    // correct <= non_drawing, so the result is at most 10.
    (correct.min(non_drawing) * 10 / non_drawing) as u32
}

/// Index of the player with the strictly greatest score. Ties go to the
/// earliest entry. `None` for an empty slice.
pub fn winner(scores: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guesser_score_rounds_up() {
        assert_eq!(guesser_score(60), 30);
        assert_eq!(guesser_score(59), 30);
        assert_eq!(guesser_score(1), 1);
        assert_eq!(guesser_score(0), 0);
    }

    #[test]
    fn test_drawer_score_floors() {
        assert_eq!(drawer_score(1, 1), 10);
        assert_eq!(drawer_score(1, 3), 3);
        assert_eq!(drawer_score(2, 3), 6);
        assert_eq!(drawer_score(0, 4), 0);
        assert_eq!(drawer_score(0, 0), 0);
    }

    #[test]
    fn test_winner_strict_max_first_on_tie() {
        assert_eq!(winner(&[]), None);
        assert_eq!(winner(&[3, 7, 7, 1]), Some(1));
        assert_eq!(winner(&[0, 0]), Some(0));
        assert_eq!(winner(&[1, 2, 3]), Some(2));
    }
}

use rand::Rng;

use super::draws;
use super::state::PlayChoice;
use crate::feed::types::CoachProbs;

/// Sample a play type from a coach's historical tendencies.
///
/// Walks run, pass, kick, punt accumulating probability and returns the first
/// whose cumulative mass reaches the draw. Falls back to a run when the row
/// does not sum to one and nothing matched.
pub fn choose_play_type<R: Rng + ?Sized>(probs: &CoachProbs, rng: &mut R) -> PlayChoice {
    let u = draws::uniform(rng);
    let ordered = [
        (probs.run_prob, PlayChoice::Run),
        (probs.pass_prob, PlayChoice::Pass),
        (probs.kick_prob, PlayChoice::FieldGoal),
        (probs.punt_prob, PlayChoice::Punt),
    ];

    let mut cumulative = 0.0;
    for (p, choice) in ordered {
        cumulative += p;
        if u <= cumulative {
            return choice;
        }
    }
    PlayChoice::Run
}

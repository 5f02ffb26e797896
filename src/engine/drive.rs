//! Drive state machine.
//!
//! One call to [`DriveMachine::advance`] takes the client's full state plus a
//! play choice and returns the next state together with the controls the
//! client should show. Nothing is kept between calls.
//!
//! Order of evaluation within a call:
//!   1. a deferred choice is resolved by the side's coach (tendency table or
//!      strategy model);
//!   2. extra point / two-point tries short-circuit;
//!   3. an inactive drive starts with a kickoff and nothing else happens;
//!   4. a ball at or behind the possessor's goal line is a safety;
//!   5. otherwise the chosen play is resolved;
//!   6. clock tick and distance bookkeeping, then game-over check;
//!   7. automated tries after a touchdown by a non-human side.

use rand::Rng;
use std::sync::Arc;

use super::blend;
use super::draws;
use super::outcome::{PlayOutcome, PuntOutcome};
use super::play_select::choose_play_type;
use super::state::{Coach, GameState, PlayChoice, UiMode};
use crate::config::{FieldGoalMode, RulesConfig};
use crate::error::SimError;
use crate::feed::types::{capped_distance, yardline_bin, CoachKey, DistributionKey, PlayType, Situation};
use crate::feed::{PlayData, Predictor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TryKind {
    ExtraPoint,
    TwoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turnover {
    Fumble,
    Interception,
}

impl Turnover {
    fn headline(self) -> &'static str {
        match self {
            Turnover::Fumble => "Fumble!",
            Turnover::Interception => "PASS INTERCEPTED!",
        }
    }
}

pub struct DriveMachine {
    data: Arc<dyn PlayData>,
    predictor: Arc<dyn Predictor>,
    rules: RulesConfig,
}

impl DriveMachine {
    pub fn new(data: Arc<dyn PlayData>, predictor: Arc<dyn Predictor>, rules: RulesConfig) -> Self {
        Self { data, predictor, rules }
    }

    /// Advance the drive by one decision.
    pub async fn advance<R: Rng + Send + ?Sized>(
        &self,
        state: GameState,
        choice: PlayChoice,
        rng: &mut R,
    ) -> Result<(GameState, UiMode), SimError> {
        let mut s = state;
        if s.sanitize() {
            tracing::warn!(time = s.time, loc = s.loc, down = s.down, "clamped out-of-range game state");
        }

        let choice = if choice == PlayChoice::Defer && s.drive {
            let coach = s.offense_coach().clone();
            self.decide(&s, &coach, rng).await?
        } else {
            choice
        };

        match choice {
            PlayChoice::ExtraPoint => return Ok(self.attempt_try(s, TryKind::ExtraPoint, rng)),
            PlayChoice::TwoPoint => return Ok(self.attempt_try(s, TryKind::TwoPoint, rng)),
            _ => {}
        }

        let natural = if !s.drive {
            self.kickoff(&mut s, rng);
            UiMode::PlaySelect
        } else if s.loc >= 100 {
            self.safety(&mut s);
            UiMode::Continue
        } else {
            match choice {
                PlayChoice::Run => self.scrimmage(&mut s, PlayType::Rush, rng).await?,
                PlayChoice::Pass => self.scrimmage(&mut s, PlayType::Pass, rng).await?,
                PlayChoice::FieldGoal => {
                    if s.loc > self.rules.field_goal_max_loc {
                        s.message = "Can't kick a field goal from this far!".to_string();
                        // No snap and no clock, but an automated side still chains.
                        let mode = if s.offense_coach().is_human() { UiMode::PlaySelect } else { UiMode::Continue };
                        return Ok((s, mode));
                    }
                    self.field_goal(&mut s, rng).await?
                }
                PlayChoice::Punt => self.punt(&mut s, rng).await?,
                _ => UiMode::Neutral,
            }
        };

        s.time = s.time.saturating_sub(1).max(0);
        s.loc = s.loc.clamp(0, 100);
        s.sync_distance();

        tracing::debug!(
            ?choice,
            down = s.down,
            distance = s.distance,
            loc = s.loc,
            time = s.time,
            message = %s.message,
            "play resolved"
        );

        if s.time <= 0 {
            return Ok((s, UiMode::TimeExpired));
        }

        // Evaluated before any automated try hands the ball over.
        let possessor_is_bot = !s.offense_coach().is_human();

        if natural == UiMode::TryChoice && possessor_is_bot {
            self.automated_try(&mut s, rng);
        }

        // Automated sides chain plays without manual controls.
        let mode = if possessor_is_bot { UiMode::Continue } else { natural };
        Ok((s, mode))
    }

    /// Turn a deferred choice into a concrete play for the side with the ball.
    async fn decide<R: Rng + Send + ?Sized>(
        &self,
        s: &GameState,
        coach: &Coach,
        rng: &mut R,
    ) -> Result<PlayChoice, SimError> {
        match coach {
            Coach::Human => Ok(PlayChoice::Defer),
            Coach::Historical(team) => {
                let key = CoachKey {
                    team: team.clone(),
                    year: s.offense().year,
                    down: s.down,
                    distance: capped_distance(s.distance),
                    yardline: s.loc,
                    is_defense: false,
                };
                let probs = self.data.coach_probs(&key).await?;
                let choice = choose_play_type(&probs, rng);
                tracing::debug!(coach = %team, ?choice, "historical coach call");
                Ok(choice)
            }
            Coach::Ai => {
                let situation = Situation {
                    down: s.down,
                    distance: s.distance,
                    loc: s.loc,
                    time: s.time,
                    score_diff: s.score_diff(),
                };
                match self.predictor.predict(&situation).await {
                    Ok(choice) => Ok(choice),
                    Err(e) => {
                        tracing::warn!(error = %e, "strategy prediction failed, defaulting to run");
                        Ok(PlayChoice::Run)
                    }
                }
            }
        }
    }

    /// Draw a try and credit the side in possession. Returns the narration.
    fn resolve_try<R: Rng + ?Sized>(&self, s: &mut GameState, kind: TryKind, rng: &mut R) -> &'static str {
        let (chance, points) = match kind {
            TryKind::ExtraPoint => (self.rules.extra_point_success, 1),
            TryKind::TwoPoint => (self.rules.two_point_success, 2),
        };
        let made = draws::uniform(rng) <= chance;
        if made {
            s.award_offense(points);
        }
        match (kind, made) {
            (TryKind::ExtraPoint, true) => "XP Made!",
            (TryKind::ExtraPoint, false) => "XP Missed!",
            (TryKind::TwoPoint, true) => "2PT Conversion Successful!",
            (TryKind::TwoPoint, false) => "2PT Conversion Failed!",
        }
    }

    fn attempt_try<R: Rng + ?Sized>(&self, mut s: GameState, kind: TryKind, rng: &mut R) -> (GameState, UiMode) {
        s.message = self.resolve_try(&mut s, kind, rng).to_string();
        s.flip_possession();
        let mode = if s.time <= 0 { UiMode::Neutral } else { UiMode::Continue };
        (s, mode)
    }

    fn automated_try<R: Rng + ?Sized>(&self, s: &mut GameState, rng: &mut R) {
        let go_for_two = s.time <= self.rules.two_point_max_time
            && self.rules.two_point_score_diffs.contains(&s.score_diff());
        let kind = if go_for_two { TryKind::TwoPoint } else { TryKind::ExtraPoint };
        let note = self.resolve_try(s, kind, rng);
        s.message = format!("{} {}", s.message, note);
        s.flip_possession();
    }

    fn kickoff<R: Rng + ?Sized>(&self, s: &mut GameState, rng: &mut R) {
        let spots = self.rules.kickoff_spots.max(1) as usize;
        s.drive = true;
        s.loc = self.rules.kickoff_min_loc + draws::index(rng, spots) as i32;
        s.target = s.loc - 10;
        s.down = 1;
        s.distance = 10;
        s.message = format!("Kickoff received at {}.", s.loc);
    }

    fn safety(&self, s: &mut GameState) {
        s.award_defense(2);
        s.drive = false;
        s.message = "SAFETY!".to_string();
        s.flip_possession();
    }

    async fn scrimmage<R: Rng + Send + ?Sized>(
        &self,
        s: &mut GameState,
        play_type: PlayType,
        rng: &mut R,
    ) -> Result<UiMode, SimError> {
        let distance = capped_distance(s.distance);
        let bin = yardline_bin(s.loc);
        let offense = s.offense();
        let defense = s.defense();
        let offense_key = DistributionKey {
            team: offense.team.to_string(),
            year: offense.year,
            down: s.down,
            distance,
            yardline_bin: bin.clone(),
            is_defense: false,
            play_type,
        };
        let defense_key = DistributionKey {
            team: defense.team.to_string(),
            year: defense.year,
            down: s.down,
            distance,
            yardline_bin: bin,
            is_defense: true,
            play_type,
        };

        let (offense_dist, defense_dist) = futures_util::try_join!(
            self.data.play_distribution(&offense_key),
            self.data.play_distribution(&defense_key),
        )?;

        let value = blend::blend(&offense_dist, &defense_dist, self.rules.defense_weight, rng)
            .ok_or_else(|| SimError::malformed("play_cdf", format!("no outcomes for {offense_key}")))?;

        let mode = match PlayOutcome::decode(value) {
            PlayOutcome::Interception { return_yards } => self.turnover(s, Turnover::Interception, return_yards),
            PlayOutcome::Fumble { return_yards } => self.turnover(s, Turnover::Fumble, return_yards),
            PlayOutcome::Gain(yards) => {
                // A gain never carries past the goal line.
                let yards = yards.min(s.loc);
                self.gain(s, play_type, yards)
            }
        };
        Ok(mode)
    }

    fn turnover(&self, s: &mut GameState, kind: Turnover, return_yards: i32) -> UiMode {
        s.loc = 100 - (s.loc - return_yards);
        s.flip_possession();

        let mode = if s.loc >= 100 {
            s.award_offense(6);
            s.drive = false;
            s.message = format!("{} Returned for a TOUCHDOWN!", kind.headline());
            UiMode::TryChoice
        } else if s.loc <= 0 {
            s.message = format!("{} TOUCHBACK!", kind.headline());
            // A fumble touchback keeps the mirrored spot.
            if kind == Turnover::Interception {
                s.loc = self.rules.interception_touchback_loc;
            }
            UiMode::PlaySelect
        } else {
            s.message = format!("{} Returned for {} yards!", kind.headline(), return_yards);
            UiMode::PlaySelect
        };

        s.reset_downs();
        mode
    }

    fn gain(&self, s: &mut GameState, play_type: PlayType, yards: i32) -> UiMode {
        let label = match play_type {
            PlayType::Rush => "Run",
            PlayType::Pass => "Pass",
        };
        let mut result = format!("{label} for {yards} yards.");

        if s.loc - yards <= 0 {
            s.loc -= yards;
            s.award_offense(6);
            s.drive = false;
            s.message = format!("{result} TOUCHDOWN!");
            return UiMode::TryChoice;
        }

        s.loc -= yards;
        s.down += 1;

        if play_type == PlayType::Pass {
            if yards == 0 {
                result = "Pass incomplete.".to_string();
            } else if yards < -3 {
                result = format!("Sacked for {yards} yards.");
            }
        }

        if s.loc <= s.target {
            s.reset_downs();
            s.message = format!("{result} First down!");
        } else if s.down > 4 {
            s.flip_possession();
            s.loc = 100 - s.loc;
            s.reset_downs();
            s.message = format!("{result} Turnover on downs.");
        } else {
            s.message = result;
        }
        UiMode::PlaySelect
    }

    async fn field_goal<R: Rng + Send + ?Sized>(
        &self,
        s: &mut GameState,
        rng: &mut R,
    ) -> Result<UiMode, SimError> {
        let good = match self.rules.field_goal_mode {
            FieldGoalMode::Threshold => s.loc <= self.rules.field_goal_auto_make_loc,
            FieldGoalMode::Probabilistic => {
                let chance = self.data.field_goal_prob(s.loc).await?;
                draws::uniform(rng) <= chance
            }
        };

        s.flip_possession();
        if good {
            s.award_defense(3);
            s.drive = false;
            s.message = "Field goal is GOOD!".to_string();
            Ok(UiMode::Continue)
        } else {
            s.loc = 100 - (s.loc + self.rules.field_goal_miss_offset);
            s.reset_downs();
            s.message = "Field goal MISSED!".to_string();
            Ok(UiMode::PlaySelect)
        }
    }

    async fn punt<R: Rng + Send + ?Sized>(&self, s: &mut GameState, rng: &mut R) -> Result<UiMode, SimError> {
        let samples = self.data.punt_outcomes(s.loc).await?;
        if samples.is_empty() {
            return Err(SimError::malformed("punts", format!("no samples at yardline {}", s.loc)));
        }
        let value = samples[draws::index(rng, samples.len())];

        let mode = match PuntOutcome::decode(value) {
            PuntOutcome::Muffed { recovery_yards } => {
                s.loc -= recovery_yards;
                let mode = if s.loc <= 0 {
                    s.award_offense(6);
                    s.drive = false;
                    s.message = "Punt MUFFED! Recovered in the end zone for a TOUCHDOWN!".to_string();
                    UiMode::TryChoice
                } else {
                    s.message = "Punt MUFFED! Kicking team recovers.".to_string();
                    UiMode::PlaySelect
                };
                s.reset_downs();
                mode
            }
            PuntOutcome::ReturnTouchdown => {
                s.flip_possession();
                s.award_offense(6);
                s.drive = false;
                s.message = "Punt returned for a TOUCHDOWN!".to_string();
                UiMode::TryChoice
            }
            PuntOutcome::Kicked(yards) => {
                s.loc -= yards;
                s.message = format!("Punt for {yards} yards.");
                if s.loc <= 0 {
                    s.loc = self.rules.punt_touchback_loc;
                    s.message.push_str(" TOUCHBACK");
                }
                s.loc = 100 - s.loc;
                s.flip_possession();
                s.reset_downs();
                UiMode::PlaySelect
            }
        };
        Ok(mode)
    }
}

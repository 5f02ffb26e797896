use serde::{Deserialize, Serialize};

/// Which team has the ball. Travels over the wire as `1` (team 1) or `-1` (team 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Possession {
    Team1,
    Team2,
}

impl Possession {
    pub fn flipped(self) -> Self {
        match self {
            Possession::Team1 => Possession::Team2,
            Possession::Team2 => Possession::Team1,
        }
    }
}

impl TryFrom<i8> for Possession {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Possession::Team1),
            -1 => Ok(Possession::Team2),
            other => Err(format!("possession must be 1 or -1, got {other}")),
        }
    }
}

impl From<Possession> for i8 {
    fn from(p: Possession) -> Self {
        match p {
            Possession::Team1 => 1,
            Possession::Team2 => -1,
        }
    }
}

/// Who calls plays for a side: the UI, the remote strategy model, or a
/// historical coach profile keyed by team code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Coach {
    Human,
    Ai,
    Historical(String),
}

impl Coach {
    pub fn is_human(&self) -> bool {
        matches!(self, Coach::Human)
    }
}

impl From<String> for Coach {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Human" => Coach::Human,
            "AI" => Coach::Ai,
            _ => Coach::Historical(s),
        }
    }
}

impl From<Coach> for String {
    fn from(c: Coach) -> Self {
        match c {
            Coach::Human => "Human".to_string(),
            Coach::Ai => "AI".to_string(),
            Coach::Historical(team) => team,
        }
    }
}

/// Client request codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum PlayChoice {
    TwoPoint,
    ExtraPoint,
    /// Let the side's coach decide.
    Defer,
    Continue,
    Run,
    Pass,
    FieldGoal,
    Punt,
}

impl PlayChoice {
    /// Scrimmage play codes 1-4, the only values a coach or model may return.
    pub fn from_action(action: i64) -> Option<Self> {
        match action {
            1 => Some(PlayChoice::Run),
            2 => Some(PlayChoice::Pass),
            3 => Some(PlayChoice::FieldGoal),
            4 => Some(PlayChoice::Punt),
            _ => None,
        }
    }
}

impl TryFrom<i8> for PlayChoice {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -3 => Ok(PlayChoice::TwoPoint),
            -2 => Ok(PlayChoice::ExtraPoint),
            -1 => Ok(PlayChoice::Defer),
            0 => Ok(PlayChoice::Continue),
            other => PlayChoice::from_action(other as i64)
                .ok_or_else(|| format!("unknown play choice {other}")),
        }
    }
}

impl From<PlayChoice> for i8 {
    fn from(c: PlayChoice) -> Self {
        match c {
            PlayChoice::TwoPoint => -3,
            PlayChoice::ExtraPoint => -2,
            PlayChoice::Defer => -1,
            PlayChoice::Continue => 0,
            PlayChoice::Run => 1,
            PlayChoice::Pass => 2,
            PlayChoice::FieldGoal => 3,
            PlayChoice::Punt => 4,
        }
    }
}

/// Which controls the client shows after an advance call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum UiMode {
    /// Clock ran out; show the drive log.
    TimeExpired,
    /// Continue button only; something automated is pending.
    Continue,
    /// Continue button after a kickoff-like neutral event.
    Neutral,
    /// Run / pass / field goal / punt.
    PlaySelect,
    /// Extra point or two-point try.
    TryChoice,
}

impl TryFrom<i8> for UiMode {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -10 => Ok(UiMode::TimeExpired),
            -1 => Ok(UiMode::Continue),
            0 => Ok(UiMode::Neutral),
            1 => Ok(UiMode::PlaySelect),
            2 => Ok(UiMode::TryChoice),
            other => Err(format!("unknown ui mode {other}")),
        }
    }
}

impl From<UiMode> for i8 {
    fn from(m: UiMode) -> Self {
        match m {
            UiMode::TimeExpired => -10,
            UiMode::Continue => -1,
            UiMode::Neutral => 0,
            UiMode::PlaySelect => 1,
            UiMode::TryChoice => 2,
        }
    }
}

/// A team and the season its distributions are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamSeason<'a> {
    pub team: &'a str,
    pub year: i32,
}

/// Full drive-simulation session, owned by the client and round-tripped
/// through every advance call.
///
/// `loc` counts the yards the possessing team still needs to reach the end
/// zone it is attacking: gains subtract from it, `<= 0` is a touchdown and
/// `>= 100` is the possessor's own goal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub score1: u32,
    pub score2: u32,
    pub team1: String,
    pub team2: String,
    pub year1: i32,
    pub year2: i32,
    pub coach1: Coach,
    pub coach2: Coach,
    pub time: i32,
    pub down: i32,
    pub distance: i32,
    pub loc: i32,
    pub target: i32,
    pub possession: Possession,
    pub drive: bool,
    #[serde(default)]
    pub message: String,
}

impl GameState {
    pub fn coach_of(&self, side: Possession) -> &Coach {
        match side {
            Possession::Team1 => &self.coach1,
            Possession::Team2 => &self.coach2,
        }
    }

    pub fn team_of(&self, side: Possession) -> TeamSeason<'_> {
        match side {
            Possession::Team1 => TeamSeason { team: &self.team1, year: self.year1 },
            Possession::Team2 => TeamSeason { team: &self.team2, year: self.year2 },
        }
    }

    pub fn offense_coach(&self) -> &Coach {
        self.coach_of(self.possession)
    }

    pub fn offense(&self) -> TeamSeason<'_> {
        self.team_of(self.possession)
    }

    pub fn defense(&self) -> TeamSeason<'_> {
        self.team_of(self.possession.flipped())
    }

    pub fn award(&mut self, side: Possession, points: u32) {
        match side {
            Possession::Team1 => self.score1 = self.score1.saturating_add(points),
            Possession::Team2 => self.score2 = self.score2.saturating_add(points),
        }
    }

    pub fn award_offense(&mut self, points: u32) {
        self.award(self.possession, points);
    }

    pub fn award_defense(&mut self, points: u32) {
        self.award(self.possession.flipped(), points);
    }

    pub fn flip_possession(&mut self) {
        self.possession = self.possession.flipped();
    }

    /// Possessor's score minus the opponent's.
    pub fn score_diff(&self) -> i32 {
        let (ours, theirs) = match self.possession {
            Possession::Team1 => (self.score1, self.score2),
            Possession::Team2 => (self.score2, self.score1),
        };
        ours as i32 - theirs as i32
    }

    /// First and ten (or goal) from the current spot.
    pub fn reset_downs(&mut self) {
        self.down = 1;
        self.target = (self.loc - 10).max(0);
    }

    pub fn sync_distance(&mut self) {
        self.distance = (self.loc - self.target).abs();
    }

    /// Pull client-supplied counters back into playable ranges. Returns
    /// whether anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = (self.time, self.loc, self.target, self.down, self.distance);
        self.time = self.time.max(0);
        self.loc = self.loc.clamp(0, 100);
        self.target = self.target.clamp(0, 100);
        self.down = self.down.clamp(1, 4);
        self.sync_distance();
        before != (self.time, self.loc, self.target, self.down, self.distance)
    }
}

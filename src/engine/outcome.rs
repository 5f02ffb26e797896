//! Decoding of the numeric outcome channel.
//!
//! Stored distributions multiplex turnovers onto yardage with large offsets.
//! These are the only functions that know about those offsets; everything
//! downstream works with the tagged variants.

const FUMBLE_FLOOR: i32 = -1000;
const INTERCEPTION_FLOOR: i32 = -2000;
const FUMBLE_OFFSET: i32 = 1100;
const INTERCEPTION_OFFSET: i32 = 2100;

const MUFF_FLOOR: i32 = 1000;
const MUFF_OFFSET: i32 = 1100;
const RETURN_TD_CEILING: i32 = -1000;

/// Result of a run or pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Yards gained by the offense (negative for a loss).
    Gain(i32),
    /// Ball lost; the defense returns it `return_yards`.
    Fumble { return_yards: i32 },
    /// Pass picked off; the defense returns it `return_yards`.
    Interception { return_yards: i32 },
}

impl PlayOutcome {
    pub fn decode(value: i32) -> Self {
        if value < INTERCEPTION_FLOOR {
            PlayOutcome::Interception { return_yards: value + INTERCEPTION_OFFSET }
        } else if value < FUMBLE_FLOOR {
            PlayOutcome::Fumble { return_yards: value + FUMBLE_OFFSET }
        } else {
            PlayOutcome::Gain(value)
        }
    }
}

/// Result of a punt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuntOutcome {
    /// Net punt distance.
    Kicked(i32),
    /// Receiver muffed; the kicking team recovers `recovery_yards` downfield.
    Muffed { recovery_yards: i32 },
    /// Receiving team took it back for six.
    ReturnTouchdown,
}

impl PuntOutcome {
    pub fn decode(value: i32) -> Self {
        if value > MUFF_FLOOR {
            PuntOutcome::Muffed { recovery_yards: value - MUFF_OFFSET }
        } else if value < RETURN_TD_CEILING {
            PuntOutcome::ReturnTouchdown
        } else {
            PuntOutcome::Kicked(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interception_return_yards() {
        assert_eq!(
            PlayOutcome::decode(-2095),
            PlayOutcome::Interception { return_yards: 5 }
        );
    }

    #[test]
    fn test_fumble_return_yards() {
        assert_eq!(PlayOutcome::decode(-1095), PlayOutcome::Fumble { return_yards: 5 });
        assert_eq!(PlayOutcome::decode(-2000), PlayOutcome::Fumble { return_yards: -900 });
    }

    #[test]
    fn test_ordinary_gains_pass_through() {
        assert_eq!(PlayOutcome::decode(0), PlayOutcome::Gain(0));
        assert_eq!(PlayOutcome::decode(-10), PlayOutcome::Gain(-10));
        assert_eq!(PlayOutcome::decode(-1000), PlayOutcome::Gain(-1000));
        assert_eq!(PlayOutcome::decode(60), PlayOutcome::Gain(60));
    }

    #[test]
    fn test_muffed_punt_recovery() {
        assert_eq!(PuntOutcome::decode(1150), PuntOutcome::Muffed { recovery_yards: 50 });
    }

    #[test]
    fn test_punt_return_touchdown() {
        assert_eq!(PuntOutcome::decode(-1001), PuntOutcome::ReturnTouchdown);
        assert_eq!(PuntOutcome::decode(42), PuntOutcome::Kicked(42));
        assert_eq!(PuntOutcome::decode(1000), PuntOutcome::Kicked(1000));
    }
}

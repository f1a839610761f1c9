use std::str::FromStr;

use serde::Serialize;
use serde_with::DeserializeFromStr;
use snafu::{ensure, OptionExt as _, ResultExt as _, Snafu};

/// A one-time subscriber bonus granted when a video's boosted views first reach `views`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardTier {
    pub views: u64,
    pub reward: u64,
}

impl RewardTier {
    pub const fn new(views: u64, reward: u64) -> Self {
        Self { views, reward }
    }

    /// Whether moving from `before` to `after` crosses this tier.
    pub fn crossed(&self, before: u64, after: u64) -> bool {
        before < self.views && self.views <= after
    }
}

/// Tiers ordered by strictly increasing view count.
///
/// Parses from `views:reward` pairs separated by commas, e.g. `1000:100,5000:500`.
#[derive(Debug, Clone, PartialEq, Eq, DeserializeFromStr)]
pub struct RewardSchedule {
    tiers: Vec<RewardTier>,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            tiers: vec![
                RewardTier::new(1_000, 100),
                RewardTier::new(5_000, 500),
                RewardTier::new(10_000, 1_000),
            ],
        }
    }
}

impl RewardSchedule {
    pub fn new(tiers: Vec<RewardTier>) -> Result<Self, RewardScheduleError> {
        for tier in &tiers {
            ensure!(tier.reward > 0, ZeroRewardSnafu { views: tier.views });
        }

        for pair in tiers.windows(2) {
            ensure!(
                pair[0].views < pair[1].views,
                NotIncreasingSnafu {
                    previous: pair[0].views,
                    next: pair[1].views,
                }
            );
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[RewardTier] {
        &self.tiers
    }

    /// Every tier whose threshold lies in `(before, after]`, lowest first.
    ///
    /// Each tier is checked on its own, a single jump may cross several.
    pub fn evaluate(&self, before: u64, after: u64) -> Vec<RewardTier> {
        self.tiers
            .iter()
            .filter(|tier| tier.crossed(before, after))
            .copied()
            .collect()
    }
}

impl FromStr for RewardSchedule {
    type Err = RewardScheduleError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let tiers = input
            .split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(parse_tier)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(tiers)
    }
}

fn parse_tier(pair: &str) -> Result<RewardTier, RewardScheduleError> {
    let (views, reward) = pair.split_once(':').context(MalformedTierSnafu { pair })?;

    let views = views
        .trim()
        .parse()
        .context(InvalidNumberSnafu { pair })?;
    let reward = reward
        .trim()
        .parse()
        .context(InvalidNumberSnafu { pair })?;

    Ok(RewardTier { views, reward })
}

#[derive(Debug, Snafu, PartialEq)]
pub enum RewardScheduleError {
    #[snafu(display("reward tier `{pair}` should look like `views:reward`"))]
    MalformedTier { pair: String },

    #[snafu(display("reward tier `{pair}` contains an invalid number: {source}"))]
    InvalidNumber {
        pair: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("reward tier at {views} views grants nothing"))]
    ZeroReward { views: u64 },

    #[snafu(display("reward tiers must strictly increase, {previous} is followed by {next}"))]
    NotIncreasing { previous: u64, next: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> RewardSchedule {
        RewardSchedule::default()
    }

    #[test]
    fn reaching_a_threshold_exactly_fires_it() {
        assert_eq!(schedule().evaluate(990, 1_000), vec![RewardTier::new(1_000, 100)]);
    }

    #[test]
    fn a_threshold_already_passed_does_not_fire_again() {
        assert!(schedule().evaluate(1_000, 1_010).is_empty());
        assert!(schedule().evaluate(1_500, 1_510).is_empty());
    }

    #[test]
    fn staying_below_fires_nothing() {
        assert!(schedule().evaluate(100, 110).is_empty());
        assert!(schedule().evaluate(980, 990).is_empty());
    }

    #[test]
    fn later_tiers_fire_independently() {
        assert_eq!(schedule().evaluate(4_995, 5_005), vec![RewardTier::new(5_000, 500)]);
        assert_eq!(schedule().evaluate(9_990, 10_000), vec![RewardTier::new(10_000, 1_000)]);
    }

    #[test]
    fn a_large_jump_fires_every_crossed_tier_in_order() {
        let fired = schedule().evaluate(900, 12_000);
        assert_eq!(
            fired,
            vec![
                RewardTier::new(1_000, 100),
                RewardTier::new(5_000, 500),
                RewardTier::new(10_000, 1_000),
            ]
        );
    }

    #[test]
    fn no_change_fires_nothing() {
        assert!(schedule().evaluate(1_000, 1_000).is_empty());
    }

    #[test]
    fn walking_every_step_fires_each_tier_once() {
        let schedule = schedule();
        let mut fired = Vec::new();
        let mut views = 100;

        while views < 20_000 {
            fired.extend(schedule.evaluate(views, views + 10));
            views += 10;
        }

        assert_eq!(fired, schedule.tiers().to_vec());
    }

    #[test]
    fn parses_the_environment_format() {
        let parsed: RewardSchedule = "1000:100, 5000:500,10000:1000".parse().unwrap();
        assert_eq!(parsed, RewardSchedule::default());
    }

    #[test]
    fn empty_input_means_no_tiers() {
        let parsed: RewardSchedule = "".parse().unwrap();
        assert!(parsed.tiers().is_empty());
        assert!(parsed.evaluate(0, u64::MAX).is_empty());
    }

    #[test]
    fn rejects_tiers_out_of_order() {
        let error = "5000:500,1000:100".parse::<RewardSchedule>().unwrap_err();
        assert_eq!(
            error,
            RewardScheduleError::NotIncreasing {
                previous: 5_000,
                next: 1_000
            }
        );

        assert!("1000:100,1000:200".parse::<RewardSchedule>().is_err());
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(matches!(
            "1000".parse::<RewardSchedule>(),
            Err(RewardScheduleError::MalformedTier { .. })
        ));
        assert!(matches!(
            "1000:lots".parse::<RewardSchedule>(),
            Err(RewardScheduleError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "1000:0".parse::<RewardSchedule>(),
            Err(RewardScheduleError::ZeroReward { views: 1_000 })
        ));
    }

    #[test]
    fn deserializes_from_a_string() {
        #[derive(serde::Deserialize)]
        struct Holder {
            tiers: RewardSchedule,
        }

        let holder: Holder = serde_json::from_str(r#"{"tiers":"10:1,20:2"}"#).unwrap();
        assert_eq!(
            holder.tiers.tiers(),
            &[RewardTier::new(10, 1), RewardTier::new(20, 2)]
        );
    }
}

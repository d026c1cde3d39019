//! Natural-language insights from computed statistics
//!
//! Classification is a pure function of an already computed [`Statistics`]
//! value. Nothing here looks at raw entries, and missing optional fields simply
//! suppress the insights that depend on them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{GoalType, Statistics};

pub const HIGH_CONSISTENCY: f64 = 90.0;
pub const LOW_CONSISTENCY: f64 = 50.0;
pub const CHEAT_MEAL_SHARE_WARNING: f64 = 0.20;
pub const RETENTION_SHARE_WARNING: f64 = 0.15;
/// Gap between MA7 and MA30 (kg) that counts as a short-term trend
pub const TREND_GAP_KG: f64 = 1.0;
pub const NEAR_GOAL_DAYS: f64 = 30.0;
pub const MEDIUM_GOAL_DAYS: f64 = 90.0;

/// Weekly gain bands during a bulk (kg/week)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkPace {
    /// Below zero
    Losing,
    /// [0, 0.05)
    Minimal,
    /// [0.05, 0.1)
    Slow,
    /// [0.1, 0.15]
    UltraClean,
    /// (0.15, 0.25]
    Optimal,
    /// (0.25, 0.35]
    VeryGood,
    /// (0.35, 0.5]
    Good,
    /// (0.5, 0.75]
    Fast,
    /// Above 0.75
    TooFast,
}

impl BulkPace {
    pub fn classify(weekly_change: f64) -> Self {
        let w = weekly_change;
        if w < 0.0 {
            BulkPace::Losing
        } else if w < 0.05 {
            BulkPace::Minimal
        } else if w < 0.1 {
            BulkPace::Slow
        } else if w <= 0.15 {
            BulkPace::UltraClean
        } else if w <= 0.25 {
            BulkPace::Optimal
        } else if w <= 0.35 {
            BulkPace::VeryGood
        } else if w <= 0.5 {
            BulkPace::Good
        } else if w <= 0.75 {
            BulkPace::Fast
        } else {
            BulkPace::TooFast
        }
    }

    /// Estimated share of the gain that is lean tissue (%)
    pub fn muscle_percentage(&self) -> u8 {
        match self {
            BulkPace::UltraClean => 85,
            BulkPace::Optimal => 72,
            BulkPace::VeryGood => 67,
            BulkPace::Good => 62,
            BulkPace::Fast | BulkPace::TooFast => 55,
            BulkPace::Losing | BulkPace::Minimal | BulkPace::Slow => 50,
        }
    }
}

/// Weekly loss bands during a cut (kg/week)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutPace {
    /// Below -1.5
    TooFast,
    /// [-1.5, -1)
    RiskOfMuscleLoss,
    /// [-1, -0.5]
    Ideal,
    /// (-0.5, -0.25]
    Moderate,
    /// (-0.25, 0)
    TooSlow,
    /// Zero or above
    NotLosing,
}

impl CutPace {
    pub fn classify(weekly_change: f64) -> Self {
        let w = weekly_change;
        if w < -1.5 {
            CutPace::TooFast
        } else if w < -1.0 {
            CutPace::RiskOfMuscleLoss
        } else if w <= -0.5 {
            CutPace::Ideal
        } else if w <= -0.25 {
            CutPace::Moderate
        } else if w < 0.0 {
            CutPace::TooSlow
        } else {
            CutPace::NotLosing
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Rising,
    Falling,
}

/// A single classified observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Insight {
    ExcellentConsistency,
    LowConsistency,
    BulkPace {
        pace: BulkPace,
        weekly_change: f64,
        monthly_change: f64,
    },
    BulkProjection {
        monthly_change: f64,
        three_month_change: f64,
        muscle_percentage: u8,
    },
    CutPace {
        pace: CutPace,
        weekly_change: f64,
    },
    FrequentCheatMeals,
    FrequentRetention,
    ShortTermTrend(TrendDirection),
    NearGoal {
        days: i64,
    },
    WeeksToGoal {
        weeks: i64,
    },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::ExcellentConsistency => {
                write!(f, "Excellent consistency! You are logging your weight almost every day.")
            }
            Insight::LowConsistency => {
                write!(f, "Try to weigh in more often to get more accurate trends.")
            }
            Insight::BulkPace {
                pace,
                weekly_change,
                monthly_change,
            } => match pace {
                BulkPace::UltraClean => write!(
                    f,
                    "PERFECT - ultra-clean bulk (0.1-0.15 kg/week). Maximum muscle, minimal fat. Ideal for advanced lifters."
                ),
                BulkPace::Optimal => write!(
                    f,
                    "OPTIMAL - clean bulk (0.15-0.25 kg/week). ~70-75% muscle. Ideal for intermediate and advanced lifters."
                ),
                BulkPace::VeryGood => write!(
                    f,
                    "VERY GOOD - moderate bulk (0.25-0.35 kg/week). ~65-70% muscle. Suits beginners (<1 year)."
                ),
                BulkPace::Good => write!(
                    f,
                    "GOOD - aggressive bulk (0.35-0.5 kg/week). ~60-65% muscle. Only for complete beginners or fast bulking."
                ),
                BulkPace::Fast => write!(
                    f,
                    "FAST - gaining {:.2} kg/week. Moderate fat-gain risk. Consider reducing calories slightly.",
                    weekly_change
                ),
                BulkPace::TooFast => write!(
                    f,
                    "TOO FAST - gaining {:.2} kg/week (>{:.1} kg/month). High fat share. REDUCE calories now.",
                    weekly_change, monthly_change
                ),
                BulkPace::Slow => write!(
                    f,
                    "Slow gain (0.05-0.1 kg/week). Very conservative but functional. Add calories if you want more mass."
                ),
                BulkPace::Minimal => write!(
                    f,
                    "Minimal gain (<0.05 kg/week, ~0.2 kg/month). Increase calories for better bulking results."
                ),
                BulkPace::Losing => write!(
                    f,
                    "You are LOSING weight on a bulk ({:.2} kg/week). Increase calories now.",
                    weekly_change
                ),
            },
            Insight::BulkProjection {
                monthly_change,
                three_month_change,
                muscle_percentage,
            } => write!(
                f,
                "Projection: ~{:.1} kg/month ({:.1} kg in 3 months). Estimated ~{}% lean mass.",
                monthly_change, three_month_change, muscle_percentage
            ),
            Insight::CutPace {
                pace,
                weekly_change,
            } => match pace {
                CutPace::Ideal => write!(
                    f,
                    "IDEAL loss rate for preserving muscle (-0.5 to -1 kg/week). Perfect!"
                ),
                CutPace::RiskOfMuscleLoss => write!(
                    f,
                    "Fast loss (-1 to -1.5 kg/week). Risk of losing muscle. Consider eating more."
                ),
                CutPace::TooFast => write!(
                    f,
                    "VERY fast loss (>{:.1} kg/week). High risk to muscle. Increase calories now.",
                    weekly_change.abs()
                ),
                CutPace::Moderate => {
                    write!(f, "Moderate loss (-0.25 to -0.5 kg/week). Safe but slow.")
                }
                CutPace::TooSlow => write!(
                    f,
                    "Very slow loss (<0.25 kg/week). Consider reducing calories slightly."
                ),
                CutPace::NotLosing => {
                    write!(f, "You are not losing weight. Reduce calories or increase activity.")
                }
            },
            Insight::FrequentCheatMeals => {
                write!(f, "High share of cheat meals. This can distort your averages.")
            }
            Insight::FrequentRetention => {
                write!(f, "Many retention entries. Review your sodium and water intake.")
            }
            Insight::ShortTermTrend(direction) => {
                let word = match direction {
                    TrendDirection::Rising => "rising",
                    TrendDirection::Falling => "falling",
                };
                write!(f, "Short-term trend is {} relative to the monthly average.", word)
            }
            Insight::NearGoal { days } => {
                write!(f, "You are close! About {} days to your goal.", days)
            }
            Insight::WeeksToGoal { weeks } => {
                write!(f, "About {} weeks to reach your goal.", weeks)
            }
        }
    }
}

/// Classify statistics into ordered insights
pub fn smart_insights(statistics: &Statistics, goal_type: GoalType) -> Vec<Insight> {
    let mut insights = Vec::new();

    if statistics.consistency_score >= HIGH_CONSISTENCY {
        insights.push(Insight::ExcellentConsistency);
    } else if statistics.consistency_score < LOW_CONSISTENCY {
        insights.push(Insight::LowConsistency);
    }

    let weekly = statistics.weekly_average_change;
    let monthly = statistics.monthly_average_change;

    match goal_type {
        GoalType::Bulk => {
            let pace = BulkPace::classify(weekly);
            insights.push(Insight::BulkPace {
                pace,
                weekly_change: weekly,
                monthly_change: monthly,
            });

            if monthly > 0.0 {
                insights.push(Insight::BulkProjection {
                    monthly_change: monthly,
                    three_month_change: monthly * 3.0,
                    muscle_percentage: pace.muscle_percentage(),
                });
            }
        }
        GoalType::Cut => insights.push(Insight::CutPace {
            pace: CutPace::classify(weekly),
            weekly_change: weekly,
        }),
        GoalType::Maintenance => {}
    }

    if statistics.total_entries > 0 {
        let total = statistics.total_entries as f64;
        if statistics.cheat_meal_count as f64 / total > CHEAT_MEAL_SHARE_WARNING {
            insights.push(Insight::FrequentCheatMeals);
        }
        if statistics.retention_count as f64 > total * RETENTION_SHARE_WARNING {
            insights.push(Insight::FrequentRetention);
        }
    }

    let ma7 = statistics.moving_average_7;
    let ma30 = statistics.moving_average_30;
    if (ma7 - ma30).abs() > TREND_GAP_KG {
        let direction = if ma7 > ma30 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        };
        insights.push(Insight::ShortTermTrend(direction));
    }

    if let Some(days) = statistics.estimated_days_to_goal.filter(|d| *d > 0.0) {
        let days = days.round();
        if days <= NEAR_GOAL_DAYS {
            insights.push(Insight::NearGoal { days: days as i64 });
        } else if days <= MEDIUM_GOAL_DAYS {
            insights.push(Insight::WeeksToGoal {
                weeks: (days / 7.0).round() as i64,
            });
        }
    }

    insights
}

/// Rendered insight strings, in the order they were classified
pub fn get_smart_insights(statistics: &Statistics, goal_type: GoalType) -> Vec<String> {
    smart_insights(statistics, goal_type)
        .iter()
        .map(ToString::to_string)
        .collect()
}

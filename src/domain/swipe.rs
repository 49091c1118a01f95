use super::RowId;
use super::account::{parse_mask_id, required_fields};
use crate::error::{MatchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwipeDecision {
    Like,
    Pass,
}

impl FromStr for SwipeDecision {
    type Err = MatchError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "LIKE" => Ok(SwipeDecision::Like),
            "PASS" => Ok(SwipeDecision::Pass),
            other => Err(MatchError::ValidationError(format!(
                "swipe_type: {other} does not validate as in(LIKE|PASS)"
            ))),
        }
    }
}

impl fmt::Display for SwipeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwipeDecision::Like => f.write_str("LIKE"),
            SwipeDecision::Pass => f.write_str("PASS"),
        }
    }
}

/// One swipe event. Append-only; at most one per (swiper, swipee) per UTC day.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SwipeLog {
    pub id: RowId,
    pub swiper_id: RowId,
    pub swipee_id: RowId,
    pub decision: SwipeDecision,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct NewSwipeLog {
    pub swiper_id: RowId,
    pub swipee_id: RowId,
    pub decision: SwipeDecision,
}

/// Swipe counters derived by the store for one account.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct SwipeCount {
    pub today: u32,
    pub total: u64,
}

/// Swipe request as received from the transport layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwipeRequest {
    /// Public mask id of the authenticated caller.
    pub swiper_id: String,
    pub swipee_id: String,
    pub swipe_type: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ValidSwipe {
    pub swiper: Uuid,
    pub swipee: Uuid,
    pub decision: SwipeDecision,
}

impl SwipeRequest {
    pub fn validate(&self) -> Result<ValidSwipe> {
        let mut missing = Vec::new();
        if self.swiper_id.trim().is_empty() {
            missing.push("swiper_id");
        }
        if self.swipee_id.trim().is_empty() {
            missing.push("swipee_id");
        }
        if self.swipe_type.trim().is_empty() {
            missing.push("swipe_type");
        }
        if !missing.is_empty() {
            return Err(required_fields(&missing));
        }

        Ok(ValidSwipe {
            swiper: parse_mask_id("swiper_id", &self.swiper_id)?,
            swipee: parse_mask_id("swipee_id", &self.swipee_id)?,
            decision: self.swipe_type.trim().parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_parsing_is_exact() {
        assert_eq!("LIKE".parse::<SwipeDecision>().unwrap(), SwipeDecision::Like);
        assert_eq!("PASS".parse::<SwipeDecision>().unwrap(), SwipeDecision::Pass);
        assert!("like".parse::<SwipeDecision>().is_err());
        assert!("SUPERLIKE".parse::<SwipeDecision>().is_err());
    }

    #[test]
    fn test_empty_request_reports_every_field() {
        let err = SwipeRequest::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: swiper_id: non zero value required;swipee_id: non zero value required;swipe_type: non zero value required"
        );
    }

    #[test]
    fn test_valid_request() {
        let swiper = Uuid::new_v4();
        let swipee = Uuid::new_v4();
        let request = SwipeRequest {
            swiper_id: swiper.to_string(),
            swipee_id: swipee.to_string(),
            swipe_type: "PASS".to_string(),
        };
        let swipe = request.validate().unwrap();
        assert_eq!(swipe.swiper, swiper);
        assert_eq!(swipe.swipee, swipee);
        assert_eq!(swipe.decision, SwipeDecision::Pass);
    }

    #[test]
    fn test_unknown_decision_is_rejected() {
        let request = SwipeRequest {
            swiper_id: Uuid::new_v4().to_string(),
            swipee_id: Uuid::new_v4().to_string(),
            swipe_type: "MAYBE".to_string(),
        };
        assert!(matches!(
            request.validate(),
            Err(MatchError::ValidationError(_))
        ));
    }
}

//! Versioned identifiers for time-bucketed project statistics
//!
//! Every field is written in a fixed order with a fixed width before hashing,
//! so `(type 1, sub-type 12)` and `(type 11, sub-type 2)` can never meet.
//! Identifiers come in two shapes: with and without a payment method.

use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const STAT_ID_VERSION: u8 = 1;

const SECONDS_PER_DAY: u64 = 86_400;

/// Width of a statistic bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGap {
    Week,
    Month,
}

impl TimeGap {
    pub const ALL: [TimeGap; 2] = [TimeGap::Week, TimeGap::Month];

    pub fn seconds(&self) -> u64 {
        match self {
            TimeGap::Week => 7 * SECONDS_PER_DAY,
            TimeGap::Month => 30 * SECONDS_PER_DAY,
        }
    }

    /// Index of the bucket containing `unix_time`
    pub fn bucket_index(&self, unix_time: u64) -> u64 {
        unix_time / self.seconds()
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "week" => Ok(TimeGap::Week),
            "month" => Ok(TimeGap::Month),
            other => Err(ValidationError::InvalidParameter(format!(
                "unknown time gap: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserMetric {
    /// Users holding access in the bucket
    Total,
    /// Users whose first purchase falls in the bucket
    New,
}

/// A statistic family together with its sub-type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    SoldAccessTime,
    Users(UserMetric),
    Votes,
    Income { payment_method: String },
}

impl Statistic {
    /// Every statistic that is cached without a payment method
    pub const WITHOUT_PAYMENT_METHOD: [Statistic; 4] = [
        Statistic::SoldAccessTime,
        Statistic::Users(UserMetric::Total),
        Statistic::Users(UserMetric::New),
        Statistic::Votes,
    ];

    pub fn type_code(&self) -> u16 {
        match self {
            Statistic::SoldAccessTime => 1,
            Statistic::Users(_) => 2,
            Statistic::Votes => 3,
            Statistic::Income { .. } => 4,
        }
    }

    /// Sub-type codes live in per-family hundreds so they never overlap
    pub fn sub_type_code(&self) -> u16 {
        match self {
            Statistic::SoldAccessTime => 101,
            Statistic::Users(UserMetric::Total) => 201,
            Statistic::Users(UserMetric::New) => 202,
            Statistic::Votes => 301,
            Statistic::Income { .. } => 401,
        }
    }

    pub fn payment_method(&self) -> Option<&str> {
        match self {
            Statistic::Income { payment_method } => Some(payment_method),
            _ => None,
        }
    }

    /// Build from the API's `metric` name and optional payment method.
    /// The payment method is expected already validated and lowercased.
    pub fn parse(metric: &str, payment_method: Option<String>) -> Result<Self, ValidationError> {
        let statistic = match metric {
            "sold-access-time" => Statistic::SoldAccessTime,
            "user-count" => Statistic::Users(UserMetric::Total),
            "new-users" => Statistic::Users(UserMetric::New),
            "votes" => Statistic::Votes,
            "income" => {
                let payment_method = payment_method
                    .ok_or_else(|| ValidationError::MissingParameter("payment_method".to_string()))?;
                return Ok(Statistic::Income { payment_method });
            }
            other => {
                return Err(ValidationError::InvalidParameter(format!(
                    "unknown metric: {}",
                    other
                )))
            }
        };

        if payment_method.is_some() {
            return Err(ValidationError::InvalidParameter(format!(
                "metric {} does not take a payment method",
                metric
            )));
        }
        Ok(statistic)
    }
}

/// Hash the fixed-shape tuple into a statistic identifier
pub fn raw_stat_id(
    chain_id: u64,
    entity_id: u64,
    time_gap_secs: u64,
    type_code: u16,
    sub_type_code: u16,
    payment_method: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update([STAT_ID_VERSION]);
    hasher.update(chain_id.to_be_bytes());
    hasher.update(entity_id.to_be_bytes());
    hasher.update(time_gap_secs.to_be_bytes());
    hasher.update(type_code.to_be_bytes());
    hasher.update(sub_type_code.to_be_bytes());

    match payment_method {
        None => hasher.update([0u8]),
        Some(method) => match decode_address(method) {
            Some(bytes) => {
                hasher.update([1u8]);
                hasher.update(bytes);
            }
            None => {
                hasher.update([2u8]);
                hasher.update((method.len() as u32).to_be_bytes());
                hasher.update(method.as_bytes());
            }
        },
    }

    format!("stat:v{}:{}", STAT_ID_VERSION, hex::encode(hasher.finalize()))
}

pub fn stat_id(chain_id: u64, entity_id: u64, gap: TimeGap, statistic: &Statistic) -> String {
    raw_stat_id(
        chain_id,
        entity_id,
        gap.seconds(),
        statistic.type_code(),
        statistic.sub_type_code(),
        statistic.payment_method(),
    )
}

/// Every identifier that may have been cached for a project.
/// Adding a statistic family means extending this enumeration.
pub fn project_stat_ids(chain_id: u64, entity_id: u64, payment_methods: &[String]) -> Vec<String> {
    let mut ids = Vec::with_capacity(TimeGap::ALL.len() * (4 + payment_methods.len()));

    for gap in TimeGap::ALL {
        for statistic in Statistic::WITHOUT_PAYMENT_METHOD.iter() {
            ids.push(stat_id(chain_id, entity_id, gap, statistic));
        }
        for method in payment_methods {
            let income = Statistic::Income {
                payment_method: method.to_lowercase(),
            };
            ids.push(stat_id(chain_id, entity_id, gap, &income));
        }
    }

    ids
}

fn decode_address(address: &str) -> Option<[u8; 20]> {
    let hex_part = address.strip_prefix("0x")?;
    let bytes = hex::decode(hex_part.to_lowercase()).ok()?;
    bytes.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const USDC: &str = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913";
    const WETH: &str = "0x4200000000000000000000000000000000000006";

    #[test]
    fn test_concatenation_collision_is_impossible() {
        let a = raw_stat_id(8453, 42, TimeGap::Week.seconds(), 1, 12, None);
        let b = raw_stat_id(8453, 42, TimeGap::Week.seconds(), 11, 2, None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_identical_tuples_hash_identically() {
        let income = Statistic::Income { payment_method: USDC.to_string() };
        assert_eq!(
            stat_id(8453, 42, TimeGap::Month, &income),
            stat_id(8453, 42, TimeGap::Month, &income)
        );
    }

    #[test]
    fn test_payment_method_presence_changes_shape() {
        let without = raw_stat_id(8453, 42, 604_800, 4, 401, None);
        let with = raw_stat_id(8453, 42, 604_800, 4, 401, Some(USDC));
        assert_ne!(without, with);
    }

    #[test]
    fn test_sub_type_codes_are_disjoint() {
        let mut all: Vec<Statistic> = Statistic::WITHOUT_PAYMENT_METHOD.to_vec();
        all.push(Statistic::Income { payment_method: USDC.to_string() });
        let codes: HashSet<u16> = all.iter().map(|s| s.sub_type_code()).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_bucket_index() {
        assert_eq!(TimeGap::Week.bucket_index(0), 0);
        assert_eq!(TimeGap::Week.bucket_index(604_799), 0);
        assert_eq!(TimeGap::Week.bucket_index(604_800), 1);
        assert_eq!(TimeGap::Month.bucket_index(2_592_000 * 3 + 5), 3);
    }

    #[test]
    fn test_project_enumeration_count() {
        let methods = vec![USDC.to_string(), WETH.to_string()];
        let ids = project_stat_ids(8453, 42, &methods);
        let distinct: HashSet<&String> = ids.iter().collect();
        assert_eq!(ids.len(), 4 * 2 + 2 * 2);
        assert_eq!(distinct.len(), ids.len());
    }

    #[test]
    fn test_parse_metric() {
        assert_eq!(Statistic::parse("votes", None), Ok(Statistic::Votes));
        assert_eq!(
            Statistic::parse("new-users", None),
            Ok(Statistic::Users(UserMetric::New))
        );
        assert!(Statistic::parse("income", None).is_err());
        assert!(Statistic::parse("votes", Some(USDC.to_string())).is_err());
        assert!(Statistic::parse("bogus", None).is_err());
    }
}

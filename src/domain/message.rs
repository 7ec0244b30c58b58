//! Synthetic social-media post published on every tick.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hashtags appended to generated posts
pub const HASHTAGS: &[&str] = &[
    "dapr",
    "microservices",
    "cloudnative",
    "kubernetes",
    "longhaul",
    "pubsub",
    "rustlang",
    "serverless",
];

/// Random body length is drawn from this half-open range
pub const MIN_BODY_LEN: usize = 5;
pub const MAX_BODY_LEN: usize = 10;

/// Message body sent to the broker. Field names follow the camelCase shape
/// the subscribers already deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMediaMessage {
    pub correlation_id: Uuid,
    pub message_id: Uuid,
    pub message: String,
    pub creation_date: DateTime<Utc>,
    pub previous_app_timestamp: DateTime<Utc>,
}

impl SocialMediaMessage {
    /// Serialize to the JSON bytes handed to the sidecar
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Build a fresh post with new ids and the current UTC time
pub fn generate_post() -> SocialMediaMessage {
    let mut rng = rand::rng();
    generate_post_with(&mut rng)
}

pub fn generate_post_with<R: Rng + ?Sized>(rng: &mut R) -> SocialMediaMessage {
    let message = generate_random_message(rng);
    let creation_date = Utc::now();

    SocialMediaMessage {
        correlation_id: Uuid::new_v4(),
        message_id: Uuid::new_v4(),
        message,
        creation_date,
        previous_app_timestamp: Utc::now(),
    }
}

/// Lowercase body of 5..10 characters followed by ` #<hashtag>`
pub fn generate_random_message<R: Rng + ?Sized>(rng: &mut R) -> String {
    let length = rng.random_range(MIN_BODY_LEN..MAX_BODY_LEN);

    let mut s: String = (0..length)
        .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
        .collect();

    s.push_str(" #");
    // HASHTAGS is a non-empty const table
    if let Some(tag) = HASHTAGS.choose(rng) {
        s.push_str(tag);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn assert_well_formed(msg: &str) {
        let (body, tag) = msg.split_once(" #").expect("missing hashtag separator");
        assert!(
            (MIN_BODY_LEN..MAX_BODY_LEN).contains(&body.len()),
            "body length {} out of range: {:?}",
            body.len(),
            msg
        );
        assert!(body.chars().all(|c| c.is_ascii_lowercase()), "{:?}", msg);
        assert!(HASHTAGS.contains(&tag), "unknown hashtag in {:?}", msg);
    }

    #[test]
    fn test_random_message_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            assert_well_formed(&generate_random_message(&mut rng));
        }
    }

    #[test]
    fn test_random_message_covers_length_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let lengths: HashSet<usize> = (0..2_000)
            .map(|_| {
                let msg = generate_random_message(&mut rng);
                msg.split_once(" #").map(|(b, _)| b.len()).unwrap_or(0)
            })
            .collect();

        let expected: HashSet<usize> = (MIN_BODY_LEN..MAX_BODY_LEN).collect();
        assert_eq!(lengths, expected);
    }

    #[test]
    fn test_generated_posts_have_unique_ids() {
        let mut correlation_ids = HashSet::new();
        let mut message_ids = HashSet::new();

        for _ in 0..1_000 {
            let post = generate_post();
            assert!(correlation_ids.insert(post.correlation_id));
            assert!(message_ids.insert(post.message_id));
            assert_ne!(post.correlation_id, post.message_id);
        }
    }

    #[test]
    fn test_timestamps_taken_at_generation() {
        let before = Utc::now();
        let post = generate_post();
        let after = Utc::now();

        assert!(post.creation_date >= before && post.creation_date <= after);
        assert!(post.previous_app_timestamp >= post.creation_date);
        assert!(post.previous_app_timestamp <= after);
    }

    #[test]
    fn test_serializes_camel_case() {
        let post = generate_post();
        let json: serde_json::Value =
            serde_json::from_slice(&post.to_json_bytes().expect("serialize")).expect("parse");

        for key in [
            "correlationId",
            "messageId",
            "message",
            "creationDate",
            "previousAppTimestamp",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["message"], post.message.as_str());
    }
}

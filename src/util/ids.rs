//! Participant and arrow identifiers
//!
//! Format is `<kind>_<yyyymmddHHMMSS>_<uuid>`. The timestamp only helps when
//! reading logs; uniqueness comes from the v4 UUID.

use chrono::Utc;
use uuid::Uuid;

fn generate(kind: &str) -> String {
    format!(
        "{}_{}_{}",
        kind,
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple()
    )
}

pub fn player_id() -> String {
    generate("player")
}

pub fn arrow_id() -> String {
    generate("arrow")
}

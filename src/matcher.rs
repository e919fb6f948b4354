//! Identity test between a local file's metadata and a remote candidate's.
//!
//! This is a symmetric "same content unit?" check, not equality: two movie
//! records always match because title-level grouping has already guaranteed
//! relevance, while episodes compare season plus episode numbers, falling
//! back to air-date equality when either side has no episode numbering.

use crate::metadata::{ContentType, Episodes, MediaMetadata};

/// Decides whether a local file and a remote entry refer to the same
/// content unit.
pub fn is_match(local: &MediaMetadata, remote: &MediaMetadata) -> bool {
    match (local.content_type, remote.content_type) {
        (ContentType::Movie, ContentType::Movie) => true,
        (ContentType::Episode, ContentType::Episode) => {
            if local.season != remote.season {
                return false;
            }
            match (&local.episodes, &remote.episodes) {
                // Date-based identity for shows without reliable episode
                // numbering (daily and talk-show content)
                (None, _) | (_, None) => match (local.air_date, remote.air_date) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                },
                (Some(local_set @ Episodes::Set(_)), Some(remote_eps)) => {
                    local_set.intersects(remote_eps)
                }
                (Some(Episodes::Single(n)), Some(remote_eps)) => remote_eps.contains(*n),
            }
        }
        _ => false,
    }
}

/// Stricter variant for the single-file pass: season-pack archives are not
/// acceptable stand-ins for an exact single-entry match.
pub fn is_exact_match(local: &MediaMetadata, remote: &MediaMetadata) -> bool {
    !remote.is_season_pack && is_match(local, remote)
}

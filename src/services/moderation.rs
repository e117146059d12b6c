//! Moderation state machine for model visibility and review.
//!
//! Review status and visibility are orthogonal: status tracks what a
//! reviewer has decided, the public flag tracks what the owner wants.
//! Only `Approved` + public rows appear in the public listing; `Pending` +
//! public rows feed the admin review queue; `Rejected` rows only surface
//! in the owner's own views. No transition touches stored artifacts.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Review status of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Freshly created, no decision recorded
    Initial,
    /// Waiting for an admin decision
    Pending,
    /// Cleared for public listing
    Approved,
    /// Turned down; owner may resubmit by toggling visibility
    Rejected,
}

impl ReviewStatus {
    /// Stored numeric code.
    pub fn code(self) -> i16 {
        match self {
            Self::Initial => 0,
            Self::Pending => 10,
            Self::Approved => 20,
            Self::Rejected => 30,
        }
    }

    pub fn from_code(code: i16) -> AppResult<Self> {
        match code {
            0 => Ok(Self::Initial),
            10 => Ok(Self::Pending),
            20 => Ok(Self::Approved),
            30 => Ok(Self::Rejected),
            other => Err(AppError::Validation(format!(
                "Unknown review status code: {}",
                other
            ))),
        }
    }
}

/// Status assigned when a model is uploaded.
///
/// Private uploads need no review. Public uploads by an admin are
/// self-trusted; public uploads by a plain user queue for review.
pub fn status_on_upload(is_public: bool, uploader_is_admin: bool) -> ReviewStatus {
    if !is_public {
        return ReviewStatus::Approved;
    }
    if uploader_is_admin {
        ReviewStatus::Approved
    } else {
        ReviewStatus::Pending
    }
}

/// Status assigned when visibility is toggled.
///
/// Admin actors are self-trusted regardless of direction. A plain user
/// going public re-enters review; going private clears it.
pub fn status_on_visibility_change(new_public: bool, actor_is_admin: bool) -> ReviewStatus {
    if actor_is_admin {
        return ReviewStatus::Approved;
    }
    if new_public {
        ReviewStatus::Pending
    } else {
        ReviewStatus::Approved
    }
}

/// Outcome of an admin audit decision: the new status and public flag.
///
/// Approval publishes the model; rejection unpublishes it. Rejection never
/// deletes stored artifacts.
pub fn audit_outcome(approved: bool) -> (ReviewStatus, bool) {
    if approved {
        (ReviewStatus::Approved, true)
    } else {
        (ReviewStatus::Rejected, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for status in [
            ReviewStatus::Initial,
            ReviewStatus::Pending,
            ReviewStatus::Approved,
            ReviewStatus::Rejected,
        ] {
            assert_eq!(ReviewStatus::from_code(status.code()).unwrap(), status);
        }
        assert!(ReviewStatus::from_code(15).is_err());
    }

    #[test]
    fn private_uploads_skip_review() {
        assert_eq!(status_on_upload(false, false), ReviewStatus::Approved);
        assert_eq!(status_on_upload(false, true), ReviewStatus::Approved);
    }

    #[test]
    fn public_upload_by_plain_user_queues_for_review() {
        assert_eq!(status_on_upload(true, false), ReviewStatus::Pending);
    }

    #[test]
    fn public_upload_by_admin_is_self_trusted() {
        assert_eq!(status_on_upload(true, true), ReviewStatus::Approved);
    }

    #[test]
    fn admin_visibility_toggle_always_approves() {
        assert_eq!(
            status_on_visibility_change(true, true),
            ReviewStatus::Approved
        );
        assert_eq!(
            status_on_visibility_change(false, true),
            ReviewStatus::Approved
        );
    }

    #[test]
    fn user_going_public_reenters_review() {
        assert_eq!(
            status_on_visibility_change(true, false),
            ReviewStatus::Pending
        );
        assert_eq!(
            status_on_visibility_change(false, false),
            ReviewStatus::Approved
        );
    }

    #[test]
    fn rejection_implies_private() {
        let (status, public) = audit_outcome(false);
        assert_eq!(status, ReviewStatus::Rejected);
        assert!(!public);
    }

    #[test]
    fn approval_implies_public() {
        let (status, public) = audit_outcome(true);
        assert_eq!(status, ReviewStatus::Approved);
        assert!(public);
    }
}

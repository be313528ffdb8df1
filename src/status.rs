use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown status value: {0}")]
pub struct ParseStatusError(String);

/// Team approval lifecycle. The only legal transitions are
/// pending -> approved and pending -> rejected; approved and rejected are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamStatus {
    Pending,
    Approved,
    Rejected,
}

impl TeamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamStatus::Pending => "pending",
            TeamStatus::Approved => "approved",
            TeamStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseStatusError> {
        match value {
            "pending" => Ok(TeamStatus::Pending),
            "approved" => Ok(TeamStatus::Approved),
            "rejected" => Ok(TeamStatus::Rejected),
            other => Err(ParseStatusError(other.to_string())),
        }
    }

    pub fn can_transition(self, next: TeamStatus) -> bool {
        matches!(
            (self, next),
            (TeamStatus::Pending, TeamStatus::Approved)
                | (TeamStatus::Pending, TeamStatus::Rejected)
        )
    }
}

/// Shared by join requests and invitations; both resolve exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseStatusError> {
        match value {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(ParseStatusError(other.to_string())),
        }
    }

    pub fn can_transition(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Accepted)
                | (RequestStatus::Pending, RequestStatus::Rejected)
        )
    }
}

/// Support tickets move forward only; there is no reopening path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    Open,
    InProgress,
    Resolved,
}

impl SupportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportStatus::Open => "open",
            SupportStatus::InProgress => "in_progress",
            SupportStatus::Resolved => "resolved",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseStatusError> {
        match value {
            "open" => Ok(SupportStatus::Open),
            "in_progress" => Ok(SupportStatus::InProgress),
            "resolved" => Ok(SupportStatus::Resolved),
            other => Err(ParseStatusError(other.to_string())),
        }
    }

    pub fn can_transition(self, next: SupportStatus) -> bool {
        matches!(
            (self, next),
            (SupportStatus::Open, SupportStatus::InProgress)
                | (SupportStatus::Open, SupportStatus::Resolved)
                | (SupportStatus::InProgress, SupportStatus::Resolved)
        )
    }
}

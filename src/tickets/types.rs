use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const CLAIM_AUDIT_PREFIX: &str = "Ticket übernommen von";
pub const COMPLETE_AUDIT_PREFIX: &str = "Ticket erledigt von";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    #[default]
    #[serde(rename = "new")]
    New,
    #[serde(rename = "inProgress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
        }
    }

    /// Display label used by the staff dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "Neu",
            Self::InProgress => "In Bearbeitung",
            Self::Completed => "Erledigt",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::New => 0,
            Self::InProgress => 1,
            Self::Completed => 2,
        }
    }

    /// Status only ever moves forward.
    pub fn can_advance_to(&self, next: Self) -> bool {
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "inProgress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown ticket status '{other}'")),
        }
    }
}

/// Hosted tables send `null` for empty nullable columns; read it as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Raw stored value; older rows hold malformed entries, so it is resolved
    /// through `images::resolve_ticket_images` rather than typed here.
    #[serde(default)]
    pub images: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TicketStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SupportTicket {
    pub fn image_urls(&self) -> Vec<String> {
        super::images::resolve_ticket_images(self.image_url.as_deref(), self.images.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketComment {
    pub id: i64,
    pub ticket_id: i64,
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Ticket as submitted; the store assigns `id`, `status`, `is_read` and `created_at`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTicket {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub error_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub ticket_id: i64,
    pub text: String,
    pub author: String,
}

/// A staff command that moves a ticket forward and leaves an audit comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
    Claim { staff: String },
    Complete { staff: String },
}

impl TicketAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Claim { .. } => "claim",
            Self::Complete { .. } => "complete",
        }
    }

    pub fn staff(&self) -> &str {
        match self {
            Self::Claim { staff } | Self::Complete { staff } => staff,
        }
    }

    pub fn target(&self) -> TicketStatus {
        match self {
            Self::Claim { .. } => TicketStatus::InProgress,
            Self::Complete { .. } => TicketStatus::Completed,
        }
    }

    /// Source statuses the action may start from.
    pub fn allowed_from(&self) -> &'static [TicketStatus] {
        match self {
            Self::Claim { .. } => &[TicketStatus::New],
            Self::Complete { .. } => &[TicketStatus::New, TicketStatus::InProgress],
        }
    }

    pub fn permits(&self, current: TicketStatus) -> bool {
        self.allowed_from().contains(&current) && current.can_advance_to(self.target())
    }

    /// Owner to record; only a claim assigns.
    pub fn assigns(&self) -> Option<&str> {
        match self {
            Self::Claim { staff } => Some(staff),
            Self::Complete { .. } => None,
        }
    }

    pub fn audit_text(&self) -> String {
        match self {
            Self::Claim { staff } => format!("{CLAIM_AUDIT_PREFIX} {staff}"),
            Self::Complete { staff } => format!("{COMPLETE_AUDIT_PREFIX} {staff}"),
        }
    }

    pub fn audit_comment(&self, ticket_id: i64) -> NewComment {
        NewComment {
            ticket_id,
            text: self.audit_text(),
            author: self.staff().to_string(),
        }
    }

    /// Applies the status change to a ticket that `permits` accepted.
    pub fn apply_to(&self, ticket: &mut SupportTicket) {
        ticket.status = self.target();
        if let Some(staff) = self.assigns() {
            ticket.assigned_to = Some(staff.to_string());
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StaffActionRequest {
    pub staff: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub author: String,
    pub text: String,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct TicketStats {
    pub total: usize,
    pub unread: usize,
    pub new: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl TicketStats {
    pub fn from_tickets(tickets: &[SupportTicket]) -> Self {
        tickets.iter().fold(Self::default(), |mut stats, ticket| {
            stats.total += 1;
            if !ticket.is_read {
                stats.unread += 1;
            }
            match ticket.status {
                TicketStatus::New => stats.new += 1,
                TicketStatus::InProgress => stats.in_progress += 1,
                TicketStatus::Completed => stats.completed += 1,
            }
            stats
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TicketDetail {
    pub ticket: SupportTicket,
    pub status_label: &'static str,
    pub images: Vec<String>,
    pub comments: Vec<TicketComment>,
    pub contact_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_status_wire_names() {
        assert_eq!(serde_json::to_string(&TicketStatus::InProgress).unwrap(), "\"inProgress\"");
        let status: TicketStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, TicketStatus::Completed);
        assert_eq!("new".parse::<TicketStatus>().unwrap(), TicketStatus::New);
        assert!("closed".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_ticket_status_labels() {
        assert_eq!(TicketStatus::New.label(), "Neu");
        assert_eq!(TicketStatus::InProgress.label(), "In Bearbeitung");
        assert_eq!(TicketStatus::Completed.label(), "Erledigt");
    }

    #[test]
    fn test_status_never_regresses() {
        assert!(TicketStatus::New.can_advance_to(TicketStatus::InProgress));
        assert!(TicketStatus::New.can_advance_to(TicketStatus::Completed));
        assert!(!TicketStatus::Completed.can_advance_to(TicketStatus::InProgress));
        assert!(!TicketStatus::InProgress.can_advance_to(TicketStatus::InProgress));
    }

    #[test]
    fn test_action_rules() {
        let claim = TicketAction::Claim { staff: "a@x.de".into() };
        let complete = TicketAction::Complete { staff: "a@x.de".into() };
        assert!(claim.permits(TicketStatus::New));
        assert!(!claim.permits(TicketStatus::InProgress));
        assert!(!claim.permits(TicketStatus::Completed));
        assert!(complete.permits(TicketStatus::New));
        assert!(complete.permits(TicketStatus::InProgress));
        assert!(!complete.permits(TicketStatus::Completed));
        assert_eq!(claim.audit_text(), "Ticket übernommen von a@x.de");
        assert_eq!(complete.audit_text(), "Ticket erledigt von a@x.de");
        assert_eq!(complete.assigns(), None);
    }

    #[test]
    fn test_ticket_tolerates_sparse_rows() {
        let ticket: SupportTicket = serde_json::from_value(serde_json::json!({
            "id": 3,
            "created_at": "2024-05-01T10:00:00Z",
            "images": [1, "https://x.com/a.png"]
        }))
        .unwrap();
        assert_eq!(ticket.status, TicketStatus::New);
        assert!(!ticket.is_read);
        assert_eq!(ticket.image_urls(), vec!["https://x.com/a.png".to_string()]);
    }
}

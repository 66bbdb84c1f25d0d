//! In-memory ticket book shared by the support tools and the console.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use concierge_contracts::context::IssueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub user_name: String,
    pub email: Option<String>,
    /// The session's issue type when the ticket was opened.
    pub category: IssueType,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

/// Details of a ticket to open.
#[derive(Debug, Clone)]
pub struct NewTicket<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub user_name: &'a str,
    pub email: Option<&'a str>,
    pub category: IssueType,
}

/// Why a refund could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundError {
    NotFound,
    AlreadyRefunded,
}

#[derive(Debug, Default)]
pub struct TicketBook {
    tickets: Mutex<Vec<Ticket>>,
}

impl TicketBook {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the Vec intact, so keep going.
    fn lock(&self) -> MutexGuard<'_, Vec<Ticket>> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self, new: NewTicket<'_>) -> Ticket {
        let ticket = Ticket {
            id: Uuid::new_v4().to_string(),
            title: new.title.to_string(),
            description: new.description.to_string(),
            user_name: new.user_name.to_string(),
            email: new.email.map(str::to_string),
            category: new.category,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        };
        self.lock().push(ticket.clone());
        ticket
    }

    /// Mark a ticket refunded. A ticket is refunded at most once.
    pub fn refund(&self, ticket_id: &str) -> Result<Ticket, RefundError> {
        let mut tickets = self.lock();
        let ticket = tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or(RefundError::NotFound)?;
        if ticket.status == TicketStatus::Refunded {
            return Err(RefundError::AlreadyRefunded);
        }
        ticket.status = TicketStatus::Refunded;
        Ok(ticket.clone())
    }

    pub fn get(&self, ticket_id: &str) -> Option<Ticket> {
        self.lock().iter().find(|t| t.id == ticket_id).cloned()
    }

    /// All tickets, oldest first.
    pub fn list(&self) -> Vec<Ticket> {
        self.lock().clone()
    }
}

//! # Query Sub-workflow
//!
//! Coder questions raised against the finalizing clinician. A query has its
//! own lifecycle (`open → answered → closed`) embedded in the record.
//!
//! Raising from `coded` moves the record to `queried`; raising while the
//! record is `under_review` leaves the top-level status alone but blocks
//! approval until the query is answered and closed.

use super::audit::AuditDetails;
use super::entities::{CodingQuery, CodingRecord};
use super::errors::CodingError;
use super::invariants;
use super::value_objects::{CodingStatus, QueryStatus, TransitionAction};
use chrono::{DateTime, Utc};
use shared_types::ActorId;
use uuid::Uuid;

/// Raise a query. Permitted while the record is `coded` or `under_review`.
///
/// Returns the new query's identifier.
pub fn raise_query(
    record: &mut CodingRecord,
    text: &str,
    actor: &ActorId,
    now: DateTime<Utc>,
) -> Result<Uuid, CodingError> {
    if !matches!(
        record.status,
        CodingStatus::Coded | CodingStatus::UnderReview
    ) {
        return Err(CodingError::InvalidTransition {
            from: record.status,
            action: TransitionAction::RaiseQuery,
        });
    }
    invariants::invariant_non_empty(text, "query text")?;

    let query_id = Uuid::new_v4();
    record.queries.push(CodingQuery {
        query_id,
        text: text.trim().to_string(),
        raised_by: actor.clone(),
        raised_at: now,
        response: None,
        responded_by: None,
        responded_at: None,
        status: QueryStatus::Open,
    });
    record.append_audit(
        AuditDetails::QueryRaised {
            query_id,
            text: text.trim().to_string(),
        },
        actor,
        now,
        None,
        None,
    );

    if record.status == CodingStatus::Coded {
        record.apply_transition(TransitionAction::RaiseQuery, actor, now, None)?;
    }
    Ok(query_id)
}

/// Answer an open query.
///
/// Stamps the responder and, when the record is `queried`, returns it to
/// `coded`.
pub fn answer_query(
    record: &mut CodingRecord,
    query_id: Uuid,
    response: &str,
    actor: &ActorId,
    now: DateTime<Utc>,
) -> Result<(), CodingError> {
    invariants::invariant_non_empty(response, "query response")?;

    let query = record
        .find_query_mut(query_id)
        .ok_or(CodingError::QueryNotFound { query_id })?;
    if query.status != QueryStatus::Open {
        return Err(CodingError::QueryAlreadyAnswered { query_id });
    }
    query.response = Some(response.trim().to_string());
    query.responded_by = Some(actor.clone());
    query.responded_at = Some(now);
    query.status = QueryStatus::Answered;

    record.append_audit(
        AuditDetails::QueryAnswered {
            query_id,
            response: response.trim().to_string(),
        },
        actor,
        now,
        None,
        None,
    );

    if record.status == CodingStatus::Queried {
        record.apply_transition(TransitionAction::AnswerQuery, actor, now, None)?;
    }
    Ok(())
}

/// Close an answered query. Only `answered` queries can be closed.
pub fn close_query(
    record: &mut CodingRecord,
    query_id: Uuid,
    actor: &ActorId,
    now: DateTime<Utc>,
) -> Result<(), CodingError> {
    let query = record
        .find_query_mut(query_id)
        .ok_or(CodingError::QueryNotFound { query_id })?;
    match query.status {
        QueryStatus::Answered => {}
        QueryStatus::Open => {
            return Err(CodingError::validation("query has not been answered yet"));
        }
        QueryStatus::Closed => {
            return Err(CodingError::validation("query is already closed"));
        }
    }
    query.status = QueryStatus::Closed;
    record.append_audit(
        AuditDetails::QueryClosed { query_id },
        actor,
        now,
        None,
        None,
    );
    Ok(())
}

//! # End-to-End Lifecycle Flows
//!
//! Drives complete coding workflows through the service API with all
//! components wired together: state machine, ledger, query sub-workflow,
//! store, allocator and billing gateway.

#[cfg(test)]
mod tests {
    use crate::integration::{encounter, in_memory_service, mock_billed_service};
    use coding_engine::{
        CodingError, CodingStatus, CodingWorkflowApi, NewAssignedCode, Page, QueryStatus,
        TransitionAction,
    };
    use rust_decimal::Decimal;
    use shared_types::{ActorId, BillRef, EncounterKind};

    fn actor(id: &str) -> ActorId {
        ActorId::new(id)
    }

    #[tokio::test]
    async fn test_opd_encounter_coded_through_to_closed() {
        let (service, _store) = mock_billed_service("BillRef-123");
        let coder = actor("coder-1");

        let record = service
            .create_record(encounter("E1", EncounterKind::OpdAppointment), actor("reg"))
            .await
            .unwrap();
        let id = record.id;
        assert_eq!(record.status, CodingStatus::AwaitingCoding);

        // Submitting before any code is assigned is rejected and leaves
        // the record untouched.
        let err = service
            .transition(id, TransitionAction::SubmitForReview, coder.clone(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CodingError::InvalidTransition { .. }));
        assert_eq!(
            service.get_record(id).await.unwrap().status,
            CodingStatus::AwaitingCoding
        );

        service
            .assign_code(
                id,
                NewAssignedCode::new("99213", 1, Decimal::from(150)),
                coder.clone(),
            )
            .await
            .unwrap();

        service
            .transition(id, TransitionAction::SubmitForReview, coder.clone(), None)
            .await
            .unwrap();
        service
            .transition(id, TransitionAction::ApproveReview, actor("rev-1"), None)
            .await
            .unwrap();
        service
            .transition(id, TransitionAction::SubmitToBilling, actor("clerk-1"), None)
            .await
            .unwrap();
        let record = service.sync_billing(id, actor("clerk-1")).await.unwrap();

        assert_eq!(record.status, CodingStatus::Closed);
        assert_eq!(record.linked_bill, Some(BillRef::new("BillRef-123")));
        assert_eq!(record.total_amount(), Decimal::from(150));
        assert_eq!(record.coded_by, Some(coder));
        assert_eq!(record.approved_by, Some(actor("rev-1")));
        assert_eq!(record.submitted_by, Some(actor("clerk-1")));
    }

    #[tokio::test]
    async fn test_return_and_resubmit_cycle() {
        let (service, _store, _billing) = in_memory_service();
        let coder = actor("coder-1");

        let record = service
            .create_record(encounter("E2", EncounterKind::Admission), actor("reg"))
            .await
            .unwrap();
        let id = record.id;
        service
            .assign_code(
                id,
                NewAssignedCode::new("99223", 1, Decimal::from(400)),
                coder.clone(),
            )
            .await
            .unwrap();
        service
            .transition(id, TransitionAction::SubmitForReview, coder.clone(), None)
            .await
            .unwrap();

        let record = service
            .transition(
                id,
                TransitionAction::ReturnToCoder,
                actor("rev-1"),
                Some("missing modifier".into()),
            )
            .await
            .unwrap();
        assert_eq!(record.status, CodingStatus::Returned);
        assert_eq!(record.current_return_reason.as_deref(), Some("missing modifier"));
        assert!(record.return_history[0].resolved_at.is_none());

        // Coder fixes the line item while the record is returned.
        let line_id = record.assigned_codes[0].line_id;
        service.remove_code(id, line_id, coder.clone()).await.unwrap();
        let mut fixed = NewAssignedCode::new("99223", 1, Decimal::from(400));
        fixed.modifier = Some("25".into());
        service.assign_code(id, fixed, coder.clone()).await.unwrap();

        let record = service
            .transition(id, TransitionAction::Resubmit, coder.clone(), None)
            .await
            .unwrap();
        assert_eq!(record.status, CodingStatus::Resubmitted);
        assert!(record.return_history[0].resolved_at.is_some());
        assert_eq!(record.current_return_reason, None);

        let record = service
            .transition(id, TransitionAction::SubmitForReview, coder.clone(), None)
            .await
            .unwrap();
        assert_eq!(record.status, CodingStatus::UnderReview);
        let record = service
            .transition(id, TransitionAction::ApproveReview, actor("rev-1"), None)
            .await
            .unwrap();
        assert_eq!(record.status, CodingStatus::Approved);
    }

    #[tokio::test]
    async fn test_query_gates_review_progress() {
        let (service, _store, _billing) = in_memory_service();
        let coder = actor("coder-1");
        let clinician = actor("dr-finalizer");

        let record = service
            .create_record(encounter("E3", EncounterKind::EmergencyVisit), actor("reg"))
            .await
            .unwrap();
        let id = record.id;
        service
            .assign_code(
                id,
                NewAssignedCode::new("99285", 1, Decimal::from(300)),
                coder.clone(),
            )
            .await
            .unwrap();

        let record = service
            .raise_query(id, "was the laceration repaired in layers?", coder.clone())
            .await
            .unwrap();
        assert_eq!(record.status, CodingStatus::Queried);
        let query_id = record.queries[0].query_id;

        // A queried record cannot go to review.
        let err = service
            .transition(id, TransitionAction::SubmitForReview, coder.clone(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CodingError::InvalidTransition { .. }));

        let record = service
            .answer_query(id, query_id, "yes, layered closure", clinician.clone())
            .await
            .unwrap();
        assert_eq!(record.status, CodingStatus::Coded);
        assert_eq!(record.queries[0].status, QueryStatus::Answered);
        assert_eq!(record.queries[0].responded_by, Some(clinician));

        service.close_query(id, query_id, coder.clone()).await.unwrap();
        let record = service
            .transition(id, TransitionAction::SubmitForReview, coder, None)
            .await
            .unwrap();
        assert_eq!(record.status, CodingStatus::UnderReview);
    }

    #[tokio::test]
    async fn test_query_during_review_blocks_approval_only() {
        let (service, _store, _billing) = in_memory_service();
        let coder = actor("coder-1");

        let record = service
            .create_record(encounter("E4", EncounterKind::OpdAppointment), actor("reg"))
            .await
            .unwrap();
        let id = record.id;
        service
            .assign_code(
                id,
                NewAssignedCode::new("99214", 1, Decimal::from(200)),
                coder.clone(),
            )
            .await
            .unwrap();
        service
            .transition(id, TransitionAction::SubmitForReview, coder.clone(), None)
            .await
            .unwrap();

        // Raised during review: status stays under_review.
        let record = service
            .raise_query(id, "is the time documented?", actor("rev-1"))
            .await
            .unwrap();
        assert_eq!(record.status, CodingStatus::UnderReview);
        let query_id = record.queries[0].query_id;

        let err = service
            .transition(id, TransitionAction::ApproveReview, actor("rev-1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CodingError::Validation { .. }));

        service
            .answer_query(id, query_id, "35 minutes documented", actor("dr-finalizer"))
            .await
            .unwrap();
        let record = service
            .transition(id, TransitionAction::ApproveReview, actor("rev-1"), None)
            .await
            .unwrap();
        assert_eq!(record.status, CodingStatus::Approved);
    }

    #[tokio::test]
    async fn test_duplicate_encounter_rejected_across_kinds() {
        let (service, _store, _billing) = in_memory_service();

        service
            .create_record(encounter("E5", EncounterKind::Admission), actor("reg"))
            .await
            .unwrap();
        let err = service
            .create_record(encounter("E5", EncounterKind::Admission), actor("reg"))
            .await
            .unwrap_err();
        assert!(matches!(err, CodingError::DuplicateEncounter { .. }));

        // The same reference under a different kind is a different encounter.
        service
            .create_record(encounter("E5", EncounterKind::EmergencyVisit), actor("reg"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_primary_diagnosis_stays_single_through_service() {
        let (service, _store, _billing) = in_memory_service();
        let coder = actor("coder-1");
        let record = service
            .create_record(encounter("E6", EncounterKind::OpdAppointment), actor("reg"))
            .await
            .unwrap();
        let id = record.id;

        let dx = |code: &str, primary: bool, sequence: u16| coding_engine::DiagnosisCode {
            code: code.to_string(),
            description: format!("diagnosis {code}"),
            is_primary: primary,
            sequence,
        };
        service.add_diagnosis(id, dx("E11.9", true, 1), coder.clone()).await.unwrap();
        service.add_diagnosis(id, dx("I10", false, 2), coder.clone()).await.unwrap();
        let record = service.set_primary_diagnosis(id, "I10", coder.clone()).await.unwrap();
        let primaries: Vec<_> = record
            .diagnosis_codes
            .iter()
            .filter(|d| d.is_primary)
            .collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].code, "I10");

        let record = service.set_primary_diagnosis(id, "E11.9", coder).await.unwrap();
        let primaries: Vec<_> = record
            .diagnosis_codes
            .iter()
            .filter(|d| d.is_primary)
            .collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].code, "E11.9");
    }

    #[tokio::test]
    async fn test_closed_records_leave_the_work_queues() {
        let (service, _store) = mock_billed_service("BillRef-9");
        let coder = actor("coder-1");

        let record = service
            .create_record(encounter("E7", EncounterKind::OpdAppointment), actor("reg"))
            .await
            .unwrap();
        let id = record.id;
        service
            .assign_code(id, NewAssignedCode::new("99213", 1, Decimal::from(150)), coder.clone())
            .await
            .unwrap();
        service
            .transition(id, TransitionAction::SubmitForReview, coder.clone(), None)
            .await
            .unwrap();
        service
            .transition(id, TransitionAction::ApproveReview, actor("rev"), None)
            .await
            .unwrap();
        service
            .transition(id, TransitionAction::SubmitToBilling, actor("clerk"), None)
            .await
            .unwrap();
        service.sync_billing(id, actor("clerk")).await.unwrap();

        assert!(service
            .list_queue(CodingStatus::Submitted, Page::default())
            .await
            .unwrap()
            .is_empty());
        assert!(service.list_by_coder(&coder).await.unwrap().is_empty());
        // Closed records remain retrievable for audit.
        let closed = service
            .list_queue(CodingStatus::Closed, Page::default())
            .await
            .unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, id);
    }
}

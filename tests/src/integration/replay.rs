//! # Audit Trail Replay Properties
//!
//! The trail is the authoritative history: replaying it must reproduce the
//! record's status and collection composition exactly, and a failed
//! operation must never leave a partial entry behind.

#[cfg(test)]
mod tests {
    use crate::integration::{encounter, in_memory_service, mock_billed_service};
    use coding_engine::{
        replay, CodingError, CodingStatus, CodingWorkflowApi, DiagnosisCode, NewAssignedCode,
        TransitionAction,
    };
    use rust_decimal::Decimal;
    use shared_types::{ActorId, EncounterKind};

    fn actor(id: &str) -> ActorId {
        ActorId::new(id)
    }

    #[tokio::test]
    async fn test_replay_reproduces_full_lifecycle() {
        let (service, _store) = mock_billed_service("BillRef-777");
        let coder = actor("coder-1");

        let record = service
            .create_record(encounter("E-replay", EncounterKind::Admission), actor("reg"))
            .await
            .unwrap();
        let id = record.id;

        service
            .assign_code(id, NewAssignedCode::new("99223", 1, Decimal::from(400)), coder.clone())
            .await
            .unwrap();
        let record = service
            .assign_code(id, NewAssignedCode::new("36415", 2, Decimal::from(25)), coder.clone())
            .await
            .unwrap();
        let second_line = record.assigned_codes[1].line_id;
        service.remove_code(id, second_line, coder.clone()).await.unwrap();

        service
            .add_diagnosis(
                id,
                DiagnosisCode {
                    code: "E11.9".into(),
                    description: "type 2 diabetes".into(),
                    is_primary: true,
                    sequence: 1,
                },
                coder.clone(),
            )
            .await
            .unwrap();
        service
            .add_diagnosis(
                id,
                DiagnosisCode {
                    code: "I10".into(),
                    description: "hypertension".into(),
                    is_primary: false,
                    sequence: 2,
                },
                coder.clone(),
            )
            .await
            .unwrap();
        service.set_primary_diagnosis(id, "I10", coder.clone()).await.unwrap();

        let query = service
            .raise_query(id, "confirm insulin dependence", coder.clone())
            .await
            .unwrap();
        let query_id = query.queries[0].query_id;
        service
            .answer_query(id, query_id, "not insulin dependent", actor("dr-finalizer"))
            .await
            .unwrap();
        service.close_query(id, query_id, coder.clone()).await.unwrap();

        service
            .transition(id, TransitionAction::SubmitForReview, coder.clone(), None)
            .await
            .unwrap();
        service
            .transition(
                id,
                TransitionAction::ReturnToCoder,
                actor("rev-1"),
                Some("sequence the hypertension first".into()),
            )
            .await
            .unwrap();
        service
            .transition(id, TransitionAction::Resubmit, coder.clone(), None)
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

        let replayed = replay(&record.audit_trail).unwrap();
        assert_eq!(replayed.status, record.status);
        assert_eq!(replayed.assigned_codes, record.assigned_codes);
        assert_eq!(replayed.diagnosis_codes, record.diagnosis_codes);
    }

    #[tokio::test]
    async fn test_rejected_operations_leave_no_trace() {
        let (service, _store, _billing) = in_memory_service();
        let record = service
            .create_record(encounter("E-clean", EncounterKind::OpdAppointment), actor("reg"))
            .await
            .unwrap();
        let id = record.id;
        let baseline = record.audit_trail.len();

        for (result, label) in [
            (
                service
                    .transition(id, TransitionAction::ApproveReview, actor("rev"), None)
                    .await
                    .err(),
                "approve from awaiting_coding",
            ),
            (
                service
                    .assign_code(
                        id,
                        NewAssignedCode::new("99213", 0, Decimal::from(150)),
                        actor("coder"),
                    )
                    .await
                    .err(),
                "zero quantity",
            ),
            (
                service.raise_query(id, "too early", actor("coder")).await.err(),
                "query before coding",
            ),
        ] {
            assert!(result.is_some(), "{label} should have been rejected");
        }

        let record = service.get_record(id).await.unwrap();
        assert_eq!(record.audit_trail.len(), baseline);
        assert_eq!(record.status, CodingStatus::AwaitingCoding);
        let replayed = replay(&record.audit_trail).unwrap();
        assert_eq!(replayed.status, CodingStatus::AwaitingCoding);
    }

    #[tokio::test]
    async fn test_trail_survives_serde_roundtrip() {
        let (service, _store, _billing) = in_memory_service();
        let coder = actor("coder-1");
        let record = service
            .create_record(encounter("E-serde", EncounterKind::EmergencyVisit), actor("reg"))
            .await
            .unwrap();
        let record = service
            .assign_code(
                record.id,
                NewAssignedCode::new("99285", 1, Decimal::from(300)),
                coder,
            )
            .await
            .unwrap();

        let json = serde_json::to_string(&record).unwrap();
        let back: coding_engine::CodingRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, record.status);
        assert_eq!(back.assigned_codes, record.assigned_codes);
        assert_eq!(back.audit_trail.len(), record.audit_trail.len());
        assert_eq!(
            back.audit_trail.last().unwrap().action(),
            record.audit_trail.last().unwrap().action()
        );

        let replayed = replay(&back.audit_trail).unwrap();
        assert_eq!(replayed.status, back.status);
        assert_eq!(replayed.assigned_codes, back.assigned_codes);
    }

    #[tokio::test]
    async fn test_trail_rejects_tampering() {
        let (service, _store, _billing) = in_memory_service();
        let record = service
            .create_record(encounter("E-tamper", EncounterKind::Admission), actor("reg"))
            .await
            .unwrap();

        let record = service
            .assign_code(
                record.id,
                NewAssignedCode::new("99223", 1, Decimal::from(400)),
                actor("coder"),
            )
            .await
            .unwrap();
        let line_id = record.assigned_codes[0].line_id;
        let record = service
            .remove_code(record.id, line_id, actor("coder"))
            .await
            .unwrap();

        // Strip the codes_added entry: its matching removal can no longer
        // be applied, so replay must refuse the trail.
        let tampered: Vec<_> = record
            .audit_trail
            .iter()
            .filter(|e| e.action() != "codes_added")
            .cloned()
            .collect();
        let err = replay(&tampered).unwrap_err();
        assert!(matches!(err, CodingError::CorruptTrail { .. }));
    }
}

// src/engine/scenarios.rs
//
// Fluxos completos sobre o motor puro: fornecedor executa, aprovadores aprovam
// e a atribuição agrega o resultado.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    engine::{
        aggregation,
        pipeline::{self, tests::{caller_with_role, template}},
        vendor_work::{self, tests::{blank_store, form_with}},
    },
    models::{
        approval::{ApprovalStageInstance, Decision, StageStatus},
        assignment::{Assignment, AssignmentRow, AssignmentStatus},
        store_assignment::{PoleSpecInput, StoreAssignment, StoreFormPayload, VendorWorkStatus},
    },
};

fn complete_vendor_work(sa: &mut StoreAssignment) {
    vendor_work::transition(sa, VendorWorkStatus::Started, Utc::now()).unwrap();
    vendor_work::apply_form(sa, form_with(Some("https://cdn/antes.jpg"), None), Utc::now()).unwrap();
    assert_eq!(sa.vendor_work_status, VendorWorkStatus::BeforeExecution);
    vendor_work::apply_form(sa, form_with(None, Some("https://cdn/depois.jpg")), Utc::now()).unwrap();
    assert_eq!(sa.vendor_work_status, VendorWorkStatus::AfterExecution);
    vendor_work::transition(sa, VendorWorkStatus::Completed, Utc::now()).unwrap();
}

fn assignment_from(
    stores: &[StoreAssignment],
    pipelines: &[Vec<ApprovalStageInstance>],
) -> Assignment {
    let all: Vec<ApprovalStageInstance> = pipelines.iter().flatten().cloned().collect();
    let now = Utc::now();
    Assignment::from(AssignmentRow {
        id: stores[0].assignment_id,
        tenant_id: Uuid::new_v4(),
        name: "Campanha Verão".into(),
        description: None,
        vendor_id: Uuid::new_v4(),
        workflow_definition_id: Uuid::new_v4(),
        assigned_by: Uuid::new_v4(),
        cancelled_at: None,
        created_dt: now,
        updated_dt: now,
        total_stores: stores.len() as i64,
        completed_stores: aggregation::count_completed(&all),
    })
}

fn assert_timestamps_monotonic(sa: &StoreAssignment) {
    let stamps: Vec<_> = [
        sa.started_date,
        sa.before_execution_date,
        sa.after_execution_date,
        sa.completed_date,
    ]
    .into_iter()
    .flatten()
    .collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn scenario_a_full_approval_of_one_of_two_stores() {
    let assignment_id = Uuid::new_v4();
    let mut store_1 = blank_store(assignment_id);
    let store_2 = blank_store(assignment_id);
    let roles = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let stages = template(&roles);

    complete_vendor_work(&mut store_1);
    assert_timestamps_monotonic(&store_1);

    let mut instances = pipeline::materialize(store_1.id, &stages, Utc::now()).unwrap();
    let active = pipeline::active_stage(&instances).unwrap();
    assert_eq!(active.role_required, roles[0]);

    for (index, role) in roles.iter().enumerate() {
        let result = pipeline::act(
            &mut instances,
            stages[index].id,
            &caller_with_role(*role),
            Decision::Approve,
            Some("aprovado"),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(result.actioned.status, StageStatus::Completed);
        match roles.get(index + 1) {
            Some(next_role) => {
                let next = result.activated.unwrap();
                assert_eq!(next.role_required, *next_role);
                assert_eq!(next.is_final_stage, index + 1 == roles.len() - 1);
            }
            None => {
                assert!(result.activated.is_none());
                assert!(result.fully_approved);
            }
        }
        assert!(pipeline::verify_pipeline(&instances).is_ok());
    }

    let assignment = assignment_from(&[store_1, store_2], &[instances]);
    assert_eq!(assignment.completed_stores, 1);
    assert_eq!(assignment.total_stores, 2);
    assert_eq!(assignment.progress_percent, 50.0);
    assert_eq!(assignment.status, AssignmentStatus::Active);
}

#[test]
fn scenario_b_completing_with_only_before_image_fails() {
    let mut sa = blank_store(Uuid::new_v4());
    vendor_work::apply_form(&mut sa, form_with(Some("https://cdn/antes.jpg"), None), Utc::now()).unwrap();

    let err = vendor_work::transition(&mut sa, VendorWorkStatus::Completed, Utc::now()).unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    // Mesmo estando no passo anterior, sem a foto "depois" o gate é a pré-condição.
    sa.vendor_work_status = VendorWorkStatus::AfterExecution;
    let err = vendor_work::transition(&mut sa, VendorWorkStatus::Completed, Utc::now()).unwrap_err();
    assert!(matches!(err, AppError::PreconditionFailed { ref field, .. } if field == "afterImageUrl"));
    assert_eq!(sa.vendor_work_status, VendorWorkStatus::AfterExecution);
}

#[tokio::test]
async fn scenario_c_concurrent_approvals_have_exactly_one_winner() {
    let role = Uuid::new_v4();
    let stages = template(&[role, Uuid::new_v4()]);
    let stage_id = stages[0].id;
    let instances = pipeline::materialize(Uuid::new_v4(), &stages, Utc::now()).unwrap();

    // O mutex faz o papel do lock de linha: leitura + checagem + escrita juntas.
    let shared = Arc::new(Mutex::new(instances));

    let attempts: Vec<_> = (0..2)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let caller = caller_with_role(role);
            tokio::spawn(async move {
                let mut guard = shared.lock().await;
                pipeline::act(&mut guard, stage_id, &caller, Decision::Approve, Some("ok"), Utc::now())
            })
        })
        .collect();

    let mut results = Vec::new();
    for attempt in attempts {
        results.push(attempt.await.unwrap());
    }

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::Conflict(_))))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 1);

    let final_state = shared.lock().await;
    assert_eq!(final_state.iter().filter(|i| i.status == StageStatus::InProgress).count(), 1);
    assert_eq!(final_state[0].status, StageStatus::Completed);
}

#[test]
fn scenario_d_rejection_halts_the_pipeline() {
    let mut sa = blank_store(Uuid::new_v4());
    let roles = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let stages = template(&roles);

    complete_vendor_work(&mut sa);
    let mut instances = pipeline::materialize(sa.id, &stages, Utc::now()).unwrap();

    pipeline::act(&mut instances, stages[0].id, &caller_with_role(roles[0]), Decision::Approve, Some("ok"), Utc::now())
        .unwrap();
    let result = pipeline::act(
        &mut instances,
        stages[1].id,
        &caller_with_role(roles[1]),
        Decision::Reject,
        Some("placa fora do padrão"),
        Utc::now(),
    )
    .unwrap();

    assert_eq!(result.actioned.status, StageStatus::Rejected);
    assert!(result.activated.is_none());
    assert!(!result.fully_approved);
    assert_eq!(instances[2].status, StageStatus::Pending);
    assert!(pipeline::active_stage(&instances).is_none());
    assert!(pipeline::verify_pipeline(&instances).is_ok());

    // O aprovador da etapa 3 nunca consegue agir.
    let err = pipeline::act(&mut instances, stages[2].id, &caller_with_role(roles[2]), Decision::Approve, Some("ok"), Utc::now())
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let assignment = assignment_from(&[sa], &[instances]);
    assert_eq!(assignment.completed_stores, 0);
}

#[test]
fn scenario_e_partial_pole_spec_persists_nothing() {
    let mut sa = blank_store(Uuid::new_v4());
    let snapshot = sa.clone();

    let payload = StoreFormPayload {
        board: vendor_work::tests::board(),
        pole: Some(PoleSpecInput {
            pole_quantity: Some(2),
            pole_width: Some(Decimal::new(15, 2)),
            pole_height: None,
            pole_cost: None,
        }),
        images: None,
        gps_location: None,
        notes: None,
    };

    let err = vendor_work::validate_form(payload)
        .and_then(|form| vendor_work::apply_form(&mut sa, form, Utc::now()))
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidField { ref field, .. } if field.contains("poleHeight")));
    assert_eq!(sa.board_id, snapshot.board_id);
    assert_eq!(sa.vendor_work_status, VendorWorkStatus::Pending);
}

#[test]
fn workflow_progress_counts_stages_across_stores() {
    let assignment_id = Uuid::new_v4();
    let roles = [Uuid::new_v4(), Uuid::new_v4()];
    let stages = template(&roles);

    let mut approved = pipeline::materialize(Uuid::new_v4(), &stages, Utc::now()).unwrap();
    for (index, role) in roles.iter().enumerate() {
        pipeline::act(&mut approved, stages[index].id, &caller_with_role(*role), Decision::Approve, Some("ok"), Utc::now())
            .unwrap();
    }
    let in_flight = pipeline::materialize(Uuid::new_v4(), &stages, Utc::now()).unwrap();

    let all: Vec<_> = approved.into_iter().chain(in_flight).collect();
    let progress = aggregation::workflow_progress(assignment_id, 3, &stages, &all);

    assert_eq!(progress.total_stores, 3);
    assert_eq!(progress.awaiting_vendor, 1);
    assert_eq!(progress.completed_stores, 1);
    assert_eq!(progress.stages.len(), 2);
    assert_eq!((progress.stages[0].completed, progress.stages[0].in_progress), (1, 1));
    assert_eq!((progress.stages[1].completed, progress.stages[1].pending), (1, 1));
}

#[test]
fn template_edits_do_not_touch_materialized_instances() {
    let roles = [Uuid::new_v4(), Uuid::new_v4()];
    let mut stages = template(&roles);
    let instances = pipeline::materialize(Uuid::new_v4(), &stages, Utc::now()).unwrap();

    stages[0].stage_name = "Renomeada".into();
    stages[0].role_required = Uuid::new_v4();

    assert_eq!(instances[0].stage_name, "BDE Approved");
    assert_eq!(instances[0].role_required, roles[0]);
}

#[test]
fn workflow_progress_reports_in_flight_stages_as_materialized() {
    let roles = [Uuid::new_v4(), Uuid::new_v4()];
    let stages = template(&roles);
    let store_id = Uuid::new_v4();
    let instances = pipeline::materialize(store_id, &stages, Utc::now()).unwrap();

    let payment_role = Uuid::new_v4();
    let mut edited = template(&[payment_role]);
    edited[0].stage_name = "Payment Approved".into();

    let progress = aggregation::workflow_progress(Uuid::new_v4(), 1, &edited, &instances);

    assert_eq!(progress.stages.len(), 2);
    let first = &progress.stages[0];
    assert_eq!(first.stage_order, 1);
    assert_eq!(first.stage_name, "BDE Approved");
    assert_eq!(first.role_required, roles[0]);
    assert!(!first.is_final_stage);
    assert_eq!(first.in_progress, 1);

    let second = &progress.stages[1];
    assert_eq!(second.stage_name, "BDM Approved");
    assert!(second.is_final_stage);
    assert_eq!(second.pending, 1);

    assert_eq!(progress.stages.iter().filter(|s| s.is_final_stage).count(), 1);
    assert!(progress.stages.iter().all(|s| s.stage_name != "Payment Approved"));
}

#[test]
fn workflow_progress_without_instances_lists_the_template() {
    let roles = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let stages = template(&roles);

    let progress = aggregation::workflow_progress(Uuid::new_v4(), 4, &stages, &[]);

    assert_eq!(progress.awaiting_vendor, 4);
    let orders: Vec<i32> = progress.stages.iter().map(|s| s.stage_order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert!(progress.stages.iter().all(|s| s.pending + s.in_progress + s.completed + s.rejected == 0));
}

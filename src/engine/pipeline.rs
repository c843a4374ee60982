// src/engine/pipeline.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    engine::definition::verify_stages,
    models::{
        approval::{
            ApprovalStageInstance, ApprovalStatus, Decision, StageAction, StageActionResult,
            StageProgressEntry, StageStatus,
        },
        auth::CallerContext,
        store_assignment::VendorWorkStatus,
        workflow::WorkflowStage,
    },
};

/// Cria uma instância para cada etapa do template, já ordenadas.
/// A primeira nasce `InProgress`; as demais `Pending`.
pub fn materialize(
    store_assignment_id: Uuid,
    stages: &[WorkflowStage],
    now: DateTime<Utc>,
) -> Result<Vec<ApprovalStageInstance>, AppError> {
    verify_stages(stages)?;

    let mut sorted: Vec<&WorkflowStage> = stages.iter().collect();
    sorted.sort_by_key(|s| s.stage_order);

    let instances = sorted
        .into_iter()
        .enumerate()
        .map(|(index, stage)| {
            let first = index == 0;
            ApprovalStageInstance {
                id: Uuid::new_v4(),
                store_assignment_id,
                workflow_stage_id: stage.id,
                stage_name: stage.stage_name.clone(),
                stage_order: stage.stage_order,
                is_final_stage: stage.is_final_stage,
                role_required: stage.role_required,
                status: if first { StageStatus::InProgress } else { StageStatus::Pending },
                actioned_by: None,
                actioned_by_role: None,
                action: None,
                comment: None,
                started_at: first.then_some(now),
                completed_at: None,
            }
        })
        .collect();

    Ok(instances)
}

pub fn active_stage(instances: &[ApprovalStageInstance]) -> Option<&ApprovalStageInstance> {
    instances.iter().find(|i| i.status == StageStatus::InProgress)
}

/// `canApprove` e `canReject` são o mesmo predicado.
pub fn can_act(instance: &ApprovalStageInstance, role_id: Uuid) -> bool {
    instance.status == StageStatus::InProgress
        && instance.role_required == role_id
        && instance.actioned_by.is_none()
}

pub fn progress(instances: &[ApprovalStageInstance], role_id: Uuid) -> Vec<StageProgressEntry> {
    let mut entries: Vec<StageProgressEntry> = instances
        .iter()
        .map(|instance| {
            let allowed = can_act(instance, role_id);
            StageProgressEntry {
                instance: instance.clone(),
                can_approve: allowed,
                can_reject: allowed,
            }
        })
        .collect();
    entries.sort_by_key(|e| e.instance.stage_order);
    entries
}

pub fn is_fully_approved(instances: &[ApprovalStageInstance]) -> bool {
    instances
        .iter()
        .any(|i| i.is_final_stage && i.status == StageStatus::Completed)
}

pub fn approval_status(
    vendor_status: VendorWorkStatus,
    instances: &[ApprovalStageInstance],
) -> ApprovalStatus {
    if vendor_status != VendorWorkStatus::Completed || instances.is_empty() {
        return ApprovalStatus::AwaitingVendor;
    }
    if is_fully_approved(instances) {
        return ApprovalStatus::Approved;
    }
    if let Some(rejected) = instances.iter().find(|i| i.status == StageStatus::Rejected) {
        return ApprovalStatus::Rejected { stage_name: rejected.stage_name.clone() };
    }
    match active_stage(instances) {
        Some(active) => ApprovalStatus::Pending { stage_name: active.stage_name.clone() },
        None => ApprovalStatus::AwaitingVendor,
    }
}

/// Confere o formato de um pipeline: `Completed* (InProgress | Rejected) Pending*`,
/// ou tudo `Completed` terminando na etapa final.
pub fn verify_pipeline(instances: &[ApprovalStageInstance]) -> Result<(), AppError> {
    if instances.is_empty() {
        return Ok(());
    }

    let mut sorted: Vec<&ApprovalStageInstance> = instances.iter().collect();
    sorted.sort_by_key(|i| i.stage_order);

    let completed_prefix = sorted
        .iter()
        .take_while(|i| i.status == StageStatus::Completed)
        .count();

    let rest = &sorted[completed_prefix..];
    let valid = match rest.split_first() {
        None => sorted.last().is_some_and(|last| last.is_final_stage),
        Some((head, tail)) => {
            matches!(head.status, StageStatus::InProgress | StageStatus::Rejected)
                && tail.iter().all(|i| i.status == StageStatus::Pending)
        }
    };

    if !valid {
        return Err(AppError::InternalServerError(anyhow::anyhow!(
            "pipeline da loja {} está inconsistente",
            instances[0].store_assignment_id
        )));
    }
    Ok(())
}

/// Aprova ou rejeita a etapa `workflow_stage_id`.
///
/// Ordem das checagens: etapa inexistente (`NotFound`), comentário vazio
/// (`InvalidField`), cargo errado (`Forbidden`), etapa não ativa ou já
/// tratada (`Conflict`). Em erro nada é alterado.
pub fn act(
    instances: &mut [ApprovalStageInstance],
    workflow_stage_id: Uuid,
    caller: &CallerContext,
    decision: Decision,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> Result<StageActionResult, AppError> {
    instances.sort_by_key(|i| i.stage_order);

    let index = instances
        .iter()
        .position(|i| i.workflow_stage_id == workflow_stage_id)
        .ok_or_else(|| AppError::not_found("ApprovalStage", workflow_stage_id))?;

    let comment = comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::invalid_field("comment", "required"))?;

    let target = &instances[index];
    if target.role_required != caller.role_id {
        return Err(AppError::Forbidden(format!(
            "stage '{}' requires a different role",
            target.stage_name
        )));
    }
    if target.status != StageStatus::InProgress || target.actioned_by.is_some() {
        return Err(AppError::Conflict(format!(
            "stage '{}' is {} and cannot be actioned",
            target.stage_name, target.status
        )));
    }

    let is_final = target.is_final_stage;
    let activate_next = decision == Decision::Approve && !is_final;
    if activate_next {
        match instances.get(index + 1) {
            Some(next) if next.status == StageStatus::Pending => {}
            _ => {
                return Err(AppError::InternalServerError(anyhow::anyhow!(
                    "etapa seguinte a '{}' ausente ou já iniciada",
                    target.stage_name
                )))
            }
        }
    }

    let target = &mut instances[index];
    target.status = match decision {
        Decision::Approve => StageStatus::Completed,
        Decision::Reject => StageStatus::Rejected,
    };
    target.action = Some(match decision {
        Decision::Approve => StageAction::Approved,
        Decision::Reject => StageAction::Rejected,
    });
    target.actioned_by = Some(caller.user_id);
    target.actioned_by_role = Some(caller.role_id);
    target.comment = Some(comment.to_string());
    target.completed_at = Some(now);
    let actioned = target.clone();

    let activated = if activate_next {
        let next = &mut instances[index + 1];
        next.status = StageStatus::InProgress;
        next.started_at = Some(now);
        Some(next.clone())
    } else {
        None
    };

    Ok(StageActionResult {
        actioned,
        activated,
        fully_approved: decision == Decision::Approve && is_final,
    })
}

// src/engine/aggregation.rs
//
// Campos derivados da atribuição. Sempre recalculados na leitura, nunca gravados.

use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use crate::{
    engine::pipeline,
    models::{
        approval::{ApprovalStageInstance, StageStatus},
        assignment::{
            Assignment, AssignmentRow, AssignmentStatus, StageProgress, VendorStatusCount,
            WorkflowProgress,
        },
        store_assignment::{StoreAssignment, VendorWorkStatus},
        workflow::WorkflowStage,
    },
};

pub fn derive_status(total_stores: i64, completed_stores: i64, cancelled: bool) -> AssignmentStatus {
    if cancelled {
        AssignmentStatus::Cancelled
    } else if total_stores > 0 && completed_stores >= total_stores {
        AssignmentStatus::Completed
    } else {
        AssignmentStatus::Active
    }
}

/// Percentual com duas casas. Sem lojas, 0%.
pub fn progress_percent(total_stores: i64, completed_stores: i64) -> f64 {
    if total_stores <= 0 {
        return 0.0;
    }
    let ratio = completed_stores.min(total_stores) as f64 / total_stores as f64;
    (ratio * 10_000.0).round() / 100.0
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        let completed = row.completed_stores.min(row.total_stores);
        Assignment {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            description: row.description,
            vendor_id: row.vendor_id,
            workflow_definition_id: row.workflow_definition_id,
            assigned_by: row.assigned_by,
            status: derive_status(row.total_stores, completed, row.cancelled_at.is_some()),
            total_stores: row.total_stores,
            completed_stores: completed,
            progress_percent: progress_percent(row.total_stores, completed),
            created_dt: row.created_dt,
            updated_dt: row.updated_dt,
        }
    }
}

fn group_by_store(instances: &[ApprovalStageInstance]) -> HashMap<Uuid, Vec<ApprovalStageInstance>> {
    let mut pipelines: HashMap<Uuid, Vec<ApprovalStageInstance>> = HashMap::new();
    for instance in instances {
        pipelines
            .entry(instance.store_assignment_id)
            .or_default()
            .push(instance.clone());
    }
    pipelines
}

/// Quantas lojas têm a etapa final concluída.
pub fn count_completed(instances: &[ApprovalStageInstance]) -> i64 {
    group_by_store(instances)
        .values()
        .filter(|pipeline| pipeline::is_fully_approved(pipeline))
        .count() as i64
}

fn empty_bucket(stage_order: i32, stage_name: &str, role_required: Uuid, is_final_stage: bool) -> StageProgress {
    StageProgress {
        stage_order,
        stage_name: stage_name.to_string(),
        role_required,
        is_final_stage,
        pending: 0,
        in_progress: 0,
        completed: 0,
        rejected: 0,
    }
}

/// Quebra etapa a etapa para todas as lojas da atribuição.
/// Cada instância conta sob a própria cópia (ordem, nome, cargo, final), então
/// pipelines em andamento não herdam edições do template. Etapas do template
/// só aparecem, zeradas, nas ordens que nenhuma instância ocupa.
pub fn workflow_progress(
    assignment_id: Uuid,
    total_stores: i64,
    template: &[WorkflowStage],
    instances: &[ApprovalStageInstance],
) -> WorkflowProgress {
    let mut stages: BTreeMap<(i32, String, Uuid, bool), StageProgress> = BTreeMap::new();

    for instance in instances {
        let key = (
            instance.stage_order,
            instance.stage_name.clone(),
            instance.role_required,
            instance.is_final_stage,
        );
        let entry = stages.entry(key).or_insert_with(|| {
            empty_bucket(
                instance.stage_order,
                &instance.stage_name,
                instance.role_required,
                instance.is_final_stage,
            )
        });
        match instance.status {
            StageStatus::Pending => entry.pending += 1,
            StageStatus::InProgress => entry.in_progress += 1,
            StageStatus::Completed => entry.completed += 1,
            StageStatus::Rejected => entry.rejected += 1,
        }
    }

    let covered: HashSet<i32> = instances.iter().map(|i| i.stage_order).collect();
    for stage in template.iter().filter(|s| !covered.contains(&s.stage_order)) {
        stages
            .entry((
                stage.stage_order,
                stage.stage_name.clone(),
                stage.role_required,
                stage.is_final_stage,
            ))
            .or_insert_with(|| {
                empty_bucket(
                    stage.stage_order,
                    &stage.stage_name,
                    stage.role_required,
                    stage.is_final_stage,
                )
            });
    }

    let stores_in_pipeline = group_by_store(instances).len() as i64;

    WorkflowProgress {
        assignment_id,
        total_stores,
        awaiting_vendor: (total_stores - stores_in_pipeline).max(0),
        completed_stores: count_completed(instances),
        stages: stages.into_values().collect(),
    }
}

pub fn vendor_breakdown(stores: &[StoreAssignment]) -> Vec<VendorStatusCount> {
    VendorWorkStatus::ALL
        .iter()
        .map(|status| VendorStatusCount {
            status: *status,
            count: stores.iter().filter(|s| s.vendor_work_status == *status).count() as i64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(total: i64, completed: i64) -> AssignmentRow {
        let now = Utc::now();
        AssignmentRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Campanha".into(),
            description: None,
            vendor_id: Uuid::new_v4(),
            workflow_definition_id: Uuid::new_v4(),
            assigned_by: Uuid::new_v4(),
            cancelled_at: None,
            created_dt: now,
            updated_dt: now,
            total_stores: total,
            completed_stores: completed,
        }
    }

    #[test]
    fn zero_stores_is_zero_percent_and_active() {
        let assignment = Assignment::from(row(0, 0));
        assert_eq!(assignment.progress_percent, 0.0);
        assert_eq!(assignment.status, AssignmentStatus::Active);
    }

    #[test]
    fn status_completes_only_when_every_store_is_approved() {
        assert_eq!(Assignment::from(row(2, 1)).status, AssignmentStatus::Active);
        assert_eq!(Assignment::from(row(2, 2)).status, AssignmentStatus::Completed);
        assert_eq!(derive_status(2, 2, true), AssignmentStatus::Cancelled);
    }

    #[test]
    fn percent_is_rounded_to_two_places() {
        assert_eq!(progress_percent(2, 1), 50.0);
        assert_eq!(progress_percent(3, 1), 33.33);
        assert_eq!(progress_percent(3, 3), 100.0);
    }

    #[test]
    fn completed_never_exceeds_total() {
        let assignment = Assignment::from(row(1, 5));
        assert_eq!(assignment.completed_stores, 1);
        assert_eq!(assignment.progress_percent, 100.0);
    }

    #[test]
    fn breakdown_lists_every_status() {
        let breakdown = vendor_breakdown(&[]);
        assert_eq!(breakdown.len(), VendorWorkStatus::ALL.len());
        assert!(breakdown.iter().all(|b| b.count == 0));
    }
}

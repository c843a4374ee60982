// src/engine/definition.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::workflow::{PlannedStage, StageDraft, WorkflowStage},
};

/// Texto obrigatório depois do trim; só espaços conta como ausente.
pub fn required_text<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::invalid_field(field, "required"));
    }
    Ok(value)
}

/// Lista completa de etapas montada em memória antes de ir para o banco.
/// Toda operação renumera 1..N e recalcula a etapa final; o repositório
/// troca a lista inteira de uma vez, dentro de uma transação.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagePlan {
    stages: Vec<PlannedStage>,
}

impl StagePlan {
    /// A ordem sugerida pelo cliente só decide a posição; empates e etapas
    /// sem ordem mantêm a sequência em que chegaram.
    pub fn from_drafts(drafts: Vec<StageDraft>) -> Result<Self, AppError> {
        if drafts.is_empty() {
            return Err(AppError::invalid_field("stages", "at least one stage is required"));
        }

        let mut indexed: Vec<(usize, StageDraft)> = drafts.into_iter().enumerate().collect();
        indexed.sort_by_key(|(position, draft)| (draft.stage_order.unwrap_or(i32::MAX), *position));

        let mut plan = StagePlan::default();
        for (_, draft) in indexed {
            plan.push(&draft.stage_name, draft.role_required)?;
        }
        Ok(plan)
    }

    pub fn from_stages(stages: &[WorkflowStage]) -> Self {
        let mut sorted: Vec<&WorkflowStage> = stages.iter().collect();
        sorted.sort_by_key(|s| s.stage_order);

        let mut plan = StagePlan {
            stages: sorted
                .into_iter()
                .map(|s| PlannedStage {
                    stage_name: s.stage_name.clone(),
                    stage_order: s.stage_order,
                    role_required: s.role_required,
                    is_final_stage: s.is_final_stage,
                })
                .collect(),
        };
        plan.renumber();
        plan
    }

    pub fn push(&mut self, stage_name: &str, role_required: Uuid) -> Result<(), AppError> {
        let stage_name = required_text("stageName", stage_name)?;

        self.stages.push(PlannedStage {
            stage_name: stage_name.to_string(),
            stage_order: 0,
            role_required,
            is_final_stage: false,
        });
        self.renumber();
        Ok(())
    }

    pub fn remove(&mut self, stage_order: i32) -> Result<PlannedStage, AppError> {
        let index = self.index_of(stage_order)?;
        if self.stages.len() == 1 {
            return Err(AppError::invalid_field("stages", "at least one stage is required"));
        }

        let removed = self.stages.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Move a etapa `from_order` para a posição `to_order` (ambas 1-based).
    pub fn move_stage(&mut self, from_order: i32, to_order: i32) -> Result<(), AppError> {
        let from = self.index_of(from_order)?;
        let to = self
            .index_of(to_order)
            .map_err(|_| AppError::invalid_field("toOrder", "out of range"))?;

        let stage = self.stages.remove(from);
        self.stages.insert(to, stage);
        self.renumber();
        Ok(())
    }

    pub fn stages(&self) -> &[PlannedStage] {
        &self.stages
    }

    fn index_of(&self, stage_order: i32) -> Result<usize, AppError> {
        if stage_order < 1 || stage_order as usize > self.stages.len() {
            return Err(AppError::invalid_field("stageOrder", "out of range"));
        }
        Ok(stage_order as usize - 1)
    }

    fn renumber(&mut self) {
        let last = self.stages.len();
        for (index, stage) in self.stages.iter_mut().enumerate() {
            stage.stage_order = index as i32 + 1;
            stage.is_final_stage = index + 1 == last;
        }
    }
}

/// Confere um template lido do banco antes de materializá-lo:
/// ordens 1..N sem buracos e só a última marcada como final.
pub fn verify_stages(stages: &[WorkflowStage]) -> Result<(), AppError> {
    if stages.is_empty() {
        return Err(AppError::invalid_field("stages", "workflow has no stages"));
    }

    let mut orders: Vec<(i32, bool)> = stages.iter().map(|s| (s.stage_order, s.is_final_stage)).collect();
    orders.sort_by_key(|(order, _)| *order);

    let last = orders.len();
    for (index, (order, is_final)) in orders.into_iter().enumerate() {
        if order != index as i32 + 1 {
            return Err(AppError::invalid_field("stageOrder", "stage orders must be contiguous from 1"));
        }
        if is_final != (index + 1 == last) {
            return Err(AppError::invalid_field("isFinalStage", "only the last stage may be final"));
        }
    }
    Ok(())
}

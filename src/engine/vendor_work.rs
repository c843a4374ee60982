// src/engine/vendor_work.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    engine::gps,
    models::store_assignment::{
        ImageUrls, PoleSpec, PoleSpecInput, StoreAssignment, StoreForm, StoreFormPayload,
        VendorWorkStatus,
    },
};

// =============================================================================
//  TRANSIÇÕES
// =============================================================================

/// Avança `vendor_work_status` exatamente um passo.
/// Pular estados, voltar ou repetir o estado atual é `InvalidTransition`.
pub fn transition(
    sa: &mut StoreAssignment,
    target: VendorWorkStatus,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let current = sa.vendor_work_status;
    if current.next() != Some(target) {
        return Err(AppError::InvalidTransition {
            from: current.to_string(),
            to: target.to_string(),
        });
    }

    // O carimbo nunca fica antes do anterior, mesmo com relógio adiantado no passado.
    let at = previous_timestamp(sa).map_or(now, |prev| prev.max(now));

    match target {
        VendorWorkStatus::Pending => {}
        VendorWorkStatus::Started => {
            sa.started_date = Some(at);
        }
        VendorWorkStatus::BeforeExecution => {
            if sa.board_id.is_none() {
                return Err(AppError::precondition("boardId", "board specification required"));
            }
            require_image(&sa.before_image_url, "beforeImageUrl")?;
            sa.before_execution_date = Some(at);
        }
        VendorWorkStatus::AfterExecution => {
            require_image(&sa.before_image_url, "beforeImageUrl")?;
            require_image(&sa.after_image_url, "afterImageUrl")?;
            sa.after_execution_date = Some(at);
        }
        VendorWorkStatus::Completed => {
            require_image(&sa.before_image_url, "beforeImageUrl")?;
            require_image(&sa.after_image_url, "afterImageUrl")?;
            sa.completed_date = Some(at);
        }
    }

    sa.vendor_work_status = target;
    sa.updated_at = now;
    Ok(())
}

fn previous_timestamp(sa: &StoreAssignment) -> Option<DateTime<Utc>> {
    [
        sa.completed_date,
        sa.after_execution_date,
        sa.before_execution_date,
        sa.started_date,
    ]
    .into_iter()
    .flatten()
    .next()
}

fn require_image(url: &Option<String>, field: &str) -> Result<(), AppError> {
    match url {
        Some(u) if !u.trim().is_empty() => Ok(()),
        _ => Err(AppError::precondition(field, "image required")),
    }
}

// =============================================================================
//  FORMULÁRIO
// =============================================================================

/// Valida o payload na fronteira. Nada é gravado se qualquer campo falhar.
pub fn validate_form(payload: StoreFormPayload) -> Result<StoreForm, AppError> {
    let board = payload.board;
    non_negative(board.board_width, "boardWidth")?;
    non_negative(board.board_height, "boardHeight")?;
    non_negative(board.board_cost, "boardCost")?;

    let pole = resolve_pole(payload.pole.unwrap_or_default())?;

    let images = payload.images.unwrap_or_default();
    let images = ImageUrls {
        banner_image_url: clean_url(images.banner_image_url, "bannerImageUrl")?,
        before_image_url: clean_url(images.before_image_url, "beforeImageUrl")?,
        after_image_url: clean_url(images.after_image_url, "afterImageUrl")?,
    };

    let gps_location = payload.gps_location.map(gps::normalize).transpose()?;

    let notes = payload
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(StoreForm { board, pole, images, gps_location, notes })
}

/// Poste é tudo ou nada: os quatro campos juntos ou nenhum.
pub fn resolve_pole(input: PoleSpecInput) -> Result<Option<PoleSpec>, AppError> {
    match (input.pole_quantity, input.pole_width, input.pole_height, input.pole_cost) {
        (None, None, None, None) => Ok(None),
        (Some(quantity), Some(width), Some(height), Some(cost)) => {
            if quantity < 1 {
                return Err(AppError::invalid_field("poleQuantity", "must be at least 1"));
            }
            non_negative(width, "poleWidth")?;
            non_negative(height, "poleHeight")?;
            non_negative(cost, "poleCost")?;
            Ok(Some(PoleSpec { quantity, width, height, cost }))
        }
        (quantity, width, height, cost) => {
            let missing: Vec<&str> = [
                ("poleQuantity", quantity.is_none()),
                ("poleWidth", width.is_none()),
                ("poleHeight", height.is_none()),
                ("poleCost", cost.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();

            Err(AppError::invalid_field(
                missing.join(","),
                "pole fields must be all present or all absent",
            ))
        }
    }
}

fn non_negative(value: Decimal, field: &str) -> Result<(), AppError> {
    if value < Decimal::ZERO {
        return Err(AppError::invalid_field(field, "must not be negative"));
    }
    Ok(())
}

fn clean_url(url: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match url {
        None => Ok(None),
        Some(u) if u.trim().is_empty() => Err(AppError::invalid_field(field, "must not be blank")),
        Some(u) => Ok(Some(u.trim().to_string())),
    }
}

/// Aplica o formulário e avança o status até onde o conteúdo permite.
/// Retorna os estados pelos quais passou (vazio se só editou campos).
/// Concluir a loja nunca acontece por aqui: exige a chamada explícita de status.
pub fn apply_form(
    sa: &mut StoreAssignment,
    form: StoreForm,
    now: DateTime<Utc>,
) -> Result<Vec<VendorWorkStatus>, AppError> {
    if sa.vendor_work_status == VendorWorkStatus::Completed {
        return Err(AppError::precondition(
            "vendorWorkStatus",
            "store work is already completed",
        ));
    }

    let has_before = form.images.before_image_url.is_some() || sa.before_image_url.is_some();
    if form.images.after_image_url.is_some() && !has_before {
        return Err(AppError::precondition("beforeImageUrl", "before image must be uploaded first"));
    }

    // Checagens feitas; daqui em diante só escrita.
    sa.board_id = Some(form.board.board_id);
    sa.board_width = Some(form.board.board_width);
    sa.board_height = Some(form.board.board_height);
    sa.board_cost = Some(form.board.board_cost);

    match form.pole {
        Some(pole) => {
            sa.pole_quantity = Some(pole.quantity);
            sa.pole_width = Some(pole.width);
            sa.pole_height = Some(pole.height);
            sa.pole_cost = Some(pole.cost);
        }
        None => {
            sa.pole_quantity = None;
            sa.pole_width = None;
            sa.pole_height = None;
            sa.pole_cost = None;
        }
    }

    if let Some(url) = form.images.banner_image_url {
        sa.banner_image_url = Some(url);
    }
    if let Some(url) = form.images.before_image_url {
        sa.before_image_url = Some(url);
    }
    if let Some(url) = form.images.after_image_url {
        sa.after_image_url = Some(url);
    }
    if let Some(location) = form.gps_location {
        sa.gps_location = Some(gps::encode(&location));
    }
    if let Some(notes) = form.notes {
        sa.vendor_notes = Some(notes);
    }
    sa.updated_at = now;

    let mut passed = Vec::new();
    loop {
        let next = match sa.vendor_work_status {
            VendorWorkStatus::Pending => VendorWorkStatus::Started,
            VendorWorkStatus::Started if sa.before_image_url.is_some() => VendorWorkStatus::BeforeExecution,
            VendorWorkStatus::BeforeExecution if sa.after_image_url.is_some() => VendorWorkStatus::AfterExecution,
            _ => break,
        };
        transition(sa, next, now)?;
        passed.push(next);
    }
    Ok(passed)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::store_assignment::{BoardSpec, Coords, GpsInput, GpsLocation};
    use chrono::Duration;
    use uuid::Uuid;

    pub(crate) fn blank_store(assignment_id: Uuid) -> StoreAssignment {
        let now = Utc::now();
        StoreAssignment {
            id: Uuid::new_v4(),
            assignment_id,
            store_id: Uuid::new_v4(),
            vendor_work_status: VendorWorkStatus::Pending,
            board_id: None,
            board_width: None,
            board_height: None,
            board_cost: None,
            pole_quantity: None,
            pole_width: None,
            pole_height: None,
            pole_cost: None,
            banner_image_url: None,
            before_image_url: None,
            after_image_url: None,
            gps_location: None,
            vendor_notes: None,
            started_date: None,
            before_execution_date: None,
            after_execution_date: None,
            completed_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn board() -> BoardSpec {
        BoardSpec {
            board_id: Uuid::new_v4(),
            board_width: Decimal::new(350, 2),
            board_height: Decimal::new(120, 2),
            board_cost: Decimal::new(85000, 2),
        }
    }

    pub(crate) fn form_with(before: Option<&str>, after: Option<&str>) -> StoreForm {
        StoreForm {
            board: board(),
            pole: None,
            images: ImageUrls {
                banner_image_url: None,
                before_image_url: before.map(str::to_string),
                after_image_url: after.map(str::to_string),
            },
            gps_location: None,
            notes: None,
        }
    }

    fn payload() -> StoreFormPayload {
        StoreFormPayload {
            board: board(),
            pole: None,
            images: None,
            gps_location: None,
            notes: None,
        }
    }

    #[test]
    fn cannot_skip_states() {
        let mut sa = blank_store(Uuid::new_v4());
        let err = transition(&mut sa, VendorWorkStatus::BeforeExecution, Utc::now()).unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition { .. }));
        assert_eq!(sa.vendor_work_status, VendorWorkStatus::Pending);
        assert!(sa.started_date.is_none());
    }

    #[test]
    fn cannot_regress_or_repeat() {
        let mut sa = blank_store(Uuid::new_v4());
        transition(&mut sa, VendorWorkStatus::Started, Utc::now()).unwrap();

        assert!(transition(&mut sa, VendorWorkStatus::Started, Utc::now()).is_err());
        assert!(transition(&mut sa, VendorWorkStatus::Pending, Utc::now()).is_err());
        assert_eq!(sa.vendor_work_status, VendorWorkStatus::Started);
    }

    #[test]
    fn completing_without_after_image_names_the_missing_field() {
        let mut sa = blank_store(Uuid::new_v4());
        apply_form(&mut sa, form_with(Some("https://cdn/antes.jpg"), None), Utc::now()).unwrap();
        assert_eq!(sa.vendor_work_status, VendorWorkStatus::BeforeExecution);

        // Força o estado para testar o gate de conclusão isoladamente.
        sa.vendor_work_status = VendorWorkStatus::AfterExecution;
        let err = transition(&mut sa, VendorWorkStatus::Completed, Utc::now()).unwrap_err();

        assert!(matches!(err, AppError::PreconditionFailed { ref field, .. } if field == "afterImageUrl"));
        assert!(sa.completed_date.is_none());
    }

    #[test]
    fn explicit_after_execution_requires_the_after_image() {
        let mut sa = blank_store(Uuid::new_v4());
        apply_form(&mut sa, form_with(Some("https://cdn/antes.jpg"), None), Utc::now()).unwrap();

        let err = transition(&mut sa, VendorWorkStatus::AfterExecution, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed { ref field, .. } if field == "afterImageUrl"));
        assert_eq!(sa.vendor_work_status, VendorWorkStatus::BeforeExecution);
        assert!(sa.after_execution_date.is_none());

        sa.after_image_url = Some("https://cdn/depois.jpg".into());
        transition(&mut sa, VendorWorkStatus::AfterExecution, Utc::now()).unwrap();
        assert!(sa.after_execution_date.is_some());
    }

    #[test]
    fn form_auto_advances_through_satisfied_stages() {
        let mut sa = blank_store(Uuid::new_v4());

        let passed = apply_form(&mut sa, form_with(None, None), Utc::now()).unwrap();
        assert_eq!(passed, [VendorWorkStatus::Started]);

        let passed = apply_form(
            &mut sa,
            form_with(Some("https://cdn/antes.jpg"), Some("https://cdn/depois.jpg")),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(passed, [VendorWorkStatus::BeforeExecution, VendorWorkStatus::AfterExecution]);

        // Reedição no mesmo estágio não muda o status.
        let passed = apply_form(&mut sa, form_with(None, Some("https://cdn/depois2.jpg")), Utc::now()).unwrap();
        assert!(passed.is_empty());
        assert_eq!(sa.vendor_work_status, VendorWorkStatus::AfterExecution);
        assert_eq!(sa.after_image_url.as_deref(), Some("https://cdn/depois2.jpg"));
    }

    #[test]
    fn after_image_requires_before_image() {
        let mut sa = blank_store(Uuid::new_v4());
        let err = apply_form(&mut sa, form_with(None, Some("https://cdn/depois.jpg")), Utc::now()).unwrap_err();

        assert!(matches!(err, AppError::PreconditionFailed { ref field, .. } if field == "beforeImageUrl"));
        assert_eq!(sa.vendor_work_status, VendorWorkStatus::Pending);
        assert!(sa.board_id.is_none());
    }

    #[test]
    fn completed_store_rejects_form_edits() {
        let mut sa = blank_store(Uuid::new_v4());
        sa.vendor_work_status = VendorWorkStatus::Completed;
        assert!(apply_form(&mut sa, form_with(None, None), Utc::now()).is_err());
    }

    #[test]
    fn timestamps_stay_monotonic_under_clock_skew() {
        let mut sa = blank_store(Uuid::new_v4());
        let t0 = Utc::now();

        transition(&mut sa, VendorWorkStatus::Started, t0).unwrap();
        sa.board_id = Some(Uuid::new_v4());
        sa.before_image_url = Some("https://cdn/antes.jpg".into());
        transition(&mut sa, VendorWorkStatus::BeforeExecution, t0 - Duration::minutes(5)).unwrap();

        assert!(sa.started_date.unwrap() <= sa.before_execution_date.unwrap());
    }

    #[test]
    fn partial_pole_spec_is_rejected_naming_missing_fields() {
        let err = resolve_pole(PoleSpecInput {
            pole_quantity: Some(2),
            pole_width: Some(Decimal::new(10, 2)),
            pole_height: None,
            pole_cost: None,
        })
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidField { ref field, .. } if field == "poleHeight,poleCost"));
    }

    #[test]
    fn complete_or_absent_pole_spec_is_accepted() {
        assert_eq!(resolve_pole(PoleSpecInput::default()).unwrap(), None);

        let pole = resolve_pole(PoleSpecInput {
            pole_quantity: Some(2),
            pole_width: Some(Decimal::new(10, 2)),
            pole_height: Some(Decimal::new(300, 2)),
            pole_cost: Some(Decimal::new(12000, 2)),
        })
        .unwrap()
        .unwrap();
        assert_eq!(pole.quantity, 2);
    }

    #[test]
    fn form_validation_normalizes_gps_and_trims_notes() {
        let mut p = payload();
        p.gps_location = Some(GpsInput::Structured(GpsLocation {
            address: " Rua das Flores, 123 ".into(),
            coords: Coords { lat: -23.5, lng: -46.6 },
        }));
        p.notes = Some("   ".into());

        let form = validate_form(p).unwrap();
        let mut sa = blank_store(Uuid::new_v4());
        apply_form(&mut sa, form, Utc::now()).unwrap();

        assert_eq!(sa.gps_location.as_deref(), Some("Rua das Flores, 123|-23.5|-46.6"));
        assert!(sa.vendor_notes.is_none());
    }

    #[test]
    fn negative_board_values_are_rejected() {
        let mut p = payload();
        p.board.board_cost = Decimal::new(-1, 0);
        assert!(matches!(validate_form(p), Err(AppError::InvalidField { .. })));
    }

    #[test]
    fn blank_image_urls_are_rejected() {
        let mut p = payload();
        p.images = Some(ImageUrls {
            banner_image_url: None,
            before_image_url: Some("  ".into()),
            after_image_url: None,
        });
        assert!(validate_form(p).is_err());
    }
}

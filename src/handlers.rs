use crate::controller::SelectorEvent;
use crate::date_key::DateKey;
use crate::errors::AppError;
use crate::models::{DateRequest, IngestRequest, PointerKind, PointerRequest, RangeRequest, Record};
use crate::state::AppState;
use crate::ui::{render_index, DashboardView};
use axum::{extract::State, response::Html, Json};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    Html(render_index(session.renderer()))
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.view().await)
}

pub async fn pointer(
    State(state): State<AppState>,
    Json(payload): Json<PointerRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let event = match payload.kind {
        PointerKind::Up => SelectorEvent::PointerUp,
        PointerKind::Down => SelectorEvent::PointerDown(required_date(payload.date.as_deref())?),
        PointerKind::Enter => SelectorEvent::PointerEnter(required_date(payload.date.as_deref())?),
    };
    Ok(Json(apply_event(&state, event).await))
}

pub async fn toggle(
    State(state): State<AppState>,
    Json(payload): Json<DateRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let key = parse_date(&payload.date)?;
    Ok(Json(apply_event(&state, SelectorEvent::Toggle(key)).await))
}

pub async fn pick(
    State(state): State<AppState>,
    Json(payload): Json<DateRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let key = parse_date(&payload.date)?;
    Ok(Json(apply_event(&state, SelectorEvent::Pick(key)).await))
}

pub async fn range(
    State(state): State<AppState>,
    Json(payload): Json<RangeRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let start = parse_date(&payload.start)?;
    let end = parse_date(&payload.end)?;
    Ok(Json(apply_event(&state, SelectorEvent::Range(start, end)).await))
}

/// Push boundary: an upstream insert was committed somewhere.
pub async fn notify(State(state): State<AppState>) -> Json<DashboardView> {
    state.refresh().await;
    Json(state.view().await)
}

pub async fn ingest(
    State(state): State<AppState>,
    Json(payload): Json<IngestRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let brand = payload.brand.trim();
    if brand.is_empty() {
        return Err(AppError::bad_request("brand must not be empty"));
    }
    let day = parse_date(&payload.day)?;
    let horizon = state.session.lock().await.horizon();
    if day > horizon {
        return Err(AppError::bad_request(format!(
            "day {day} lies past {horizon}, the newest day the dashboard accepts"
        )));
    }

    state
        .source
        .insert(Record::new(day, brand, payload.count))
        .await?;
    // the insert listener refreshes too; a second refetch is harmless
    state.refresh().await;
    Ok(Json(state.view().await))
}

async fn apply_event(state: &AppState, event: SelectorEvent) -> DashboardView {
    let mut session = state.session.lock().await;
    session.handle(event);
    session.renderer().clone()
}

fn parse_date(value: &str) -> Result<DateKey, AppError> {
    Ok(value.parse()?)
}

fn required_date(value: Option<&str>) -> Result<DateKey, AppError> {
    let value = value.ok_or_else(|| AppError::bad_request("date is required"))?;
    parse_date(value)
}

use crate::errors::StoreError;
use crate::ids::new_id;
use crate::models::{Response, ResponsePayload};
use crate::storage::Collection;
use chrono::Utc;
use tracing::info;

pub async fn submit_response(
    responses: &dyn Collection<Response>,
    payload: ResponsePayload,
) -> Result<Response, StoreError> {
    let response = Response {
        id: new_id(),
        form_id: payload.form_id,
        answers: payload.answers,
        submitted_at: Utc::now(),
    };

    responses.put(response.clone()).await?;
    info!(
        response_id = %response.id,
        form_id = %response.form_id,
        answers = response.answers.len(),
        "response submitted"
    );
    Ok(response)
}

/// Responses tied to `form_id`, in submission order. Unknown forms yield an
/// empty list.
pub async fn list_responses(
    responses: &dyn Collection<Response>,
    form_id: &str,
) -> Result<Vec<Response>, StoreError> {
    let mut all = responses.list().await?;
    all.retain(|response| response.form_id == form_id);
    Ok(all)
}

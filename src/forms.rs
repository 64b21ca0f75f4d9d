use crate::errors::StoreError;
use crate::ids::new_id;
use crate::models::{Form, FormPayload};
use crate::storage::Collection;
use chrono::Utc;
use tracing::info;

pub async fn list_forms(forms: &dyn Collection<Form>) -> Result<Vec<Form>, StoreError> {
    forms.list().await
}

pub async fn get_form(forms: &dyn Collection<Form>, id: &str) -> Result<Option<Form>, StoreError> {
    forms.get(id).await
}

pub async fn create_form(
    forms: &dyn Collection<Form>,
    payload: FormPayload,
) -> Result<Form, StoreError> {
    let now = Utc::now();
    let mut form = Form {
        id: new_id(),
        title: String::new(),
        description: None,
        theme: None,
        header_image: None,
        header_video: None,
        questions: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    apply_payload(&mut form, payload);

    forms.put(form.clone()).await?;
    info!(form_id = %form.id, questions = form.questions.len(), "form created");
    Ok(form)
}

/// Merges the supplied fields over the stored form. `id` and `created_at`
/// never change; `updated_at` never moves backwards.
pub async fn update_form(
    forms: &dyn Collection<Form>,
    id: &str,
    payload: FormPayload,
) -> Result<Option<Form>, StoreError> {
    let updated = forms
        .update(
            id,
            Box::new(move |form: &mut Form| {
                apply_payload(form, payload);
                form.updated_at = Utc::now().max(form.updated_at);
            }),
        )
        .await?;

    if updated.is_some() {
        info!(form_id = %id, "form updated");
    }
    Ok(updated)
}

pub async fn delete_form(forms: &dyn Collection<Form>, id: &str) -> Result<bool, StoreError> {
    let removed = forms.delete(id).await?;
    if removed {
        info!(form_id = %id, "form deleted");
    }
    Ok(removed)
}

fn apply_payload(form: &mut Form, payload: FormPayload) {
    let FormPayload {
        title,
        description,
        theme,
        header_image,
        header_video,
        questions,
        ..
    } = payload;

    if let Some(title) = title {
        form.title = title;
    }
    if description.is_some() {
        form.description = description;
    }
    if theme.is_some() {
        form.theme = theme;
    }
    if header_image.is_some() {
        form.header_image = header_image;
    }
    if header_video.is_some() {
        form.header_video = header_video;
    }
    if let Some(questions) = questions {
        form.questions = questions;
    }
}

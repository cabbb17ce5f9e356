use anyhow::{anyhow, Result};
use tally_core::error::CoreError;
use tally_core::repository::TemplateRepository;
use uuid::Uuid;

pub async fn resolve_template_id(repo: &impl TemplateRepository, short_id: &str) -> Result<Uuid> {
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    let templates = repo.find_templates_by_short_id_prefix(short_id).await?;
    if templates.len() == 1 {
        Ok(templates[0].id)
    } else if templates.is_empty() {
        Err(anyhow!(CoreError::NotFound(format!(
            "No recurring transaction found with ID prefix '{}'",
            short_id
        ))))
    } else {
        let template_info: Vec<(String, String)> = templates
            .into_iter()
            .map(|t| (t.id.to_string(), t.title))
            .collect();
        Err(anyhow!(CoreError::AmbiguousId(template_info)))
    }
}

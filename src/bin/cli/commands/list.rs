use anyhow::{Context, Result};

use flashdeck_lib::flashcards::validation::parse_list_query;
use flashdeck_lib::ListFlashcardsQuery;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

/// Parse the raw flags, falling back to the configured order
fn query(
    app: &App,
    order: Option<&str>,
    limit: Option<&str>,
    offset: Option<&str>,
) -> Result<ListFlashcardsQuery> {
    let mut query = parse_list_query(order, limit, offset)?;
    query.order.get_or_insert(app.config.default_order);
    Ok(query)
}

pub async fn run(
    app: &App,
    order: Option<&str>,
    limit: Option<&str>,
    offset: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let query = query(app, order, limit, offset)?;
    let response = app
        .api
        .list(&query)
        .await
        .context("Failed to list flashcards")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Plain => {
            if response.data.is_empty() {
                println!("(no flashcards)");
            }
            for card in &response.data {
                println!("{}", terminal::render_row(card, use_color));
            }
            let summary = format!("{} of {} flashcards", response.data.len(), response.count);
            println!("{}", terminal::paint(&summary, Color::DIM, use_color));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashdeck_lib::config::ClientConfig;
    use flashdeck_lib::{ErrorCode, InMemoryFlashcardsApi, ListOrder};
    use std::sync::Arc;

    fn app(default_order: ListOrder) -> App {
        App {
            config: ClientConfig {
                default_order,
                ..ClientConfig::default()
            },
            api: Arc::new(InMemoryFlashcardsApi::new()),
        }
    }

    #[test]
    fn test_query_falls_back_to_configured_order() {
        let app = app(ListOrder::Random);
        let parsed = query(&app, None, Some("5"), None).unwrap();
        assert_eq!(parsed.order, Some(ListOrder::Random));
        assert_eq!(parsed.limit, Some(5));

        let parsed = query(&app, Some("id"), None, Some("2")).unwrap();
        assert_eq!(parsed.order, Some(ListOrder::Id));
        assert_eq!(parsed.offset, Some(2));
    }

    #[test]
    fn test_query_rejects_out_of_range_limit() {
        let err = query(&app(ListOrder::Id), None, Some("0"), None).unwrap_err();
        let api_error = err.downcast_ref::<flashdeck_lib::ApiError>().unwrap();
        assert_eq!(api_error.code, ErrorCode::ValidationError);
    }
}

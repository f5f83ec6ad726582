use std::sync::Arc;

use anyhow::anyhow;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::calendar::{to_ethiopian, try_to_ethiopian, EthiopianDate, GregorianDate};
use crate::config::Config;
use crate::months::MonthNameTable;

pub struct AppState {
    pub months: MonthNameTable,
    pub default_language: String,
    pub strict: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            months: MonthNameTable::with_languages(&config.languages),
            default_language: config.default_language.clone(),
            strict: config.strict,
        }
    }

    fn convert(&self, date: GregorianDate) -> Result<EthiopianDate, AppError> {
        if self.strict {
            try_to_ethiopian(date).map_err(AppError::bad_request)
        } else {
            Ok(to_ethiopian(date))
        }
    }

    /// Requested language, or the configured default when none was given.
    fn requested_language<'a>(&'a self, query: &'a DateQuery) -> &'a str {
        non_empty(&query.lang).unwrap_or(&self.default_language)
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/ethiopian", get(convert))
        .route("/api/months/:lang", get(months))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub language: String,
    pub gregorian: String,
    pub ethiopian: String,
    pub calendar_valid: bool,
    pub languages: Vec<LanguageOption>,
}

pub struct LanguageOption {
    pub code: String,
    pub selected: bool,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: err.into(),
        }
    }

    pub fn not_found(err: impl Into<anyhow::Error>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: err.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed: {}", self.error);
        } else {
            warn!("Rejected request: {}", self.error);
        }
        (self.status, format!("Error: {}", self.error)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

/// Which date to convert. `timestamp` wins over `date`, which wins over the
/// `year`/`month`/`day` triple; with none of them, today's UTC date is used.
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
    pub timestamp: Option<String>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
    pub lang: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DateQuery {
    pub fn gregorian(&self) -> Result<GregorianDate, AppError> {
        if let Some(timestamp) = non_empty(&self.timestamp) {
            let parsed = DateTime::parse_from_rfc3339(timestamp).map_err(|e| {
                AppError::bad_request(anyhow!("invalid timestamp '{}': {}", timestamp, e))
            })?;
            return Ok(parsed.into());
        }

        if let Some(date) = non_empty(&self.date) {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| AppError::bad_request(anyhow!("invalid date '{}': {}", date, e)))?;
            return Ok(parsed.into());
        }

        match (self.year, self.month, self.day) {
            (Some(year), Some(month), Some(day)) => Ok(GregorianDate::new(year, month, day)),
            (None, None, None) => Ok(Utc::now().date_naive().into()),
            _ => Err(AppError::bad_request(anyhow!(
                "year, month and day must be given together"
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversionResponse {
    pub gregorian: GregorianDate,
    pub ethiopian: EthiopianDate,
    pub formatted: String,
    /// Language of the month names actually used
    pub language: String,
    pub calendar_valid: bool,
}

#[derive(Debug, Serialize)]
pub struct MonthsResponse {
    pub language: String,
    pub months: Vec<String>,
}

// Route handlers
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let gregorian = query.gregorian()?;
    let ethiopian = state.convert(gregorian)?;
    let (language, _) = state.months.resolve(state.requested_language(&query));

    let languages = state
        .months
        .languages()
        .into_iter()
        .map(|code| LanguageOption {
            code: code.to_string(),
            selected: code == language,
        })
        .collect();

    Ok(HtmlTemplate(IndexTemplate {
        language: language.to_string(),
        gregorian: gregorian.to_string(),
        ethiopian: state.months.format_ethiopian(&ethiopian, language),
        calendar_valid: ethiopian.is_calendar_valid(),
        languages,
    }))
}

pub async fn convert(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ConversionResponse>, AppError> {
    let gregorian = query.gregorian()?;
    let ethiopian = state.convert(gregorian)?;
    let (language, _) = state.months.resolve(state.requested_language(&query));

    Ok(Json(ConversionResponse {
        gregorian,
        ethiopian,
        formatted: state.months.format_ethiopian(&ethiopian, language),
        language: language.to_string(),
        calendar_valid: ethiopian.is_calendar_valid(),
    }))
}

pub async fn months(
    State(state): State<Arc<AppState>>,
    Path(language): Path<String>,
) -> Result<Json<MonthsResponse>, AppError> {
    let names = state
        .months
        .get(&language)
        .ok_or_else(|| AppError::not_found(anyhow!("unknown language '{}'", language)))?;

    Ok(Json(MonthsResponse {
        months: names.to_vec(),
        language,
    }))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn create_test_app(config: Config) -> Router {
        app(Arc::new(AppState::from_config(&config)))
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> Value {
        let (status, body) = fetch(app, uri).await;
        assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
        serde_json::from_str(&body).unwrap()
    }

    mod health_tests {
        use super::*;

        #[tokio::test]
        async fn test_health_endpoint() {
            let (status, body) = fetch(create_test_app(Config::default()), "/health").await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK");
        }
    }

    mod convert_tests {
        use super::*;

        #[tokio::test]
        async fn test_convert_date() {
            let json = get_json(
                create_test_app(Config::default()),
                "/api/ethiopian?date=2024-09-11",
            )
            .await;

            assert_eq!(json["ethiopian"]["year"], 2017);
            assert_eq!(json["ethiopian"]["month"], 1);
            assert_eq!(json["ethiopian"]["day"], 1);
            assert_eq!(json["formatted"], "Meskerem 1, 2017");
            assert_eq!(json["language"], "en");
            assert_eq!(json["calendar_valid"], true);
        }

        #[tokio::test]
        async fn test_convert_amharic() {
            let json = get_json(
                create_test_app(Config::default()),
                "/api/ethiopian?date=2024-01-09&lang=am",
            )
            .await;

            assert_eq!(json["formatted"], "ታኅሣሥ 30, 2016");
            assert_eq!(json["language"], "am");
        }

        #[tokio::test]
        async fn test_unknown_language_reports_fallback() {
            let json = get_json(
                create_test_app(Config::default()),
                "/api/ethiopian?date=2024-09-11&lang=xx",
            )
            .await;

            assert_eq!(json["formatted"], "Meskerem 1, 2017");
            assert_eq!(json["language"], "en");
        }

        #[tokio::test]
        async fn test_configured_default_language() {
            let config = Config {
                default_language: "am".to_string(),
                ..Config::default()
            };
            let json = get_json(create_test_app(config), "/api/ethiopian?date=2024-09-11").await;

            assert_eq!(json["formatted"], "መስከረም 1, 2017");
        }

        #[tokio::test]
        async fn test_convert_timestamp() {
            let json = get_json(
                create_test_app(Config::default()),
                "/api/ethiopian?timestamp=2024-10-11T08:30:00%2B03:00",
            )
            .await;

            assert_eq!(json["gregorian"]["day"], 11);
            assert_eq!(json["formatted"], "Tikimt 1, 2017");
        }

        #[tokio::test]
        async fn test_linear_mapping_is_flagged_invalid() {
            let json = get_json(
                create_test_app(Config::default()),
                "/api/ethiopian?date=2024-01-10",
            )
            .await;

            assert_eq!(json["ethiopian"]["month"], 5);
            assert_eq!(json["ethiopian"]["day"], 31);
            assert_eq!(json["calendar_valid"], false);
        }

        #[tokio::test]
        async fn test_without_date_uses_today() {
            let (status, _) = fetch(create_test_app(Config::default()), "/api/ethiopian").await;
            assert_eq!(status, StatusCode::OK);
        }

        #[tokio::test]
        async fn test_invalid_date_string_is_bad_request() {
            let (status, body) = fetch(
                create_test_app(Config::default()),
                "/api/ethiopian?date=2024-02-30",
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body.contains("invalid date"));
        }

        #[tokio::test]
        async fn test_invalid_timestamp_is_bad_request() {
            let (status, _) = fetch(
                create_test_app(Config::default()),
                "/api/ethiopian?timestamp=yesterday",
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    mod strict_mode_tests {
        use super::*;

        #[tokio::test]
        async fn test_lenient_mode_converts_impossible_date() {
            let json = get_json(
                create_test_app(Config::default()),
                "/api/ethiopian?year=2024&month=1&day=32",
            )
            .await;

            assert_eq!(json["ethiopian"]["day"], 53);
            assert_eq!(json["calendar_valid"], false);
        }

        #[tokio::test]
        async fn test_lenient_mode_survives_extreme_year() {
            let json = get_json(
                create_test_app(Config::default()),
                "/api/ethiopian?year=-2147483648&month=1&day=1",
            )
            .await;

            assert_eq!(json["ethiopian"]["year"], i64::from(i32::MIN.wrapping_sub(8)));
            assert_eq!(json["ethiopian"]["month"], 4);
            assert_eq!(json["ethiopian"]["day"], 22);
        }

        #[tokio::test]
        async fn test_strict_mode_rejects_impossible_date() {
            let config = Config {
                strict: true,
                ..Config::default()
            };
            let (status, body) = fetch(
                create_test_app(config),
                "/api/ethiopian?year=2024&month=1&day=32",
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body.contains("day 32"));
        }

        #[tokio::test]
        async fn test_partial_triple_is_bad_request() {
            let (status, _) = fetch(
                create_test_app(Config::default()),
                "/api/ethiopian?year=2024&month=1",
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    mod months_tests {
        use super::*;

        #[tokio::test]
        async fn test_months_for_amharic() {
            let json = get_json(create_test_app(Config::default()), "/api/months/am").await;

            assert_eq!(json["language"], "am");
            assert_eq!(json["months"].as_array().unwrap().len(), 13);
            assert_eq!(json["months"][0], "መስከረም");
        }

        #[tokio::test]
        async fn test_months_unknown_language() {
            let (status, _) = fetch(create_test_app(Config::default()), "/api/months/xx").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    mod index_tests {
        use super::*;

        #[tokio::test]
        async fn test_index_today() {
            let (status, _) = fetch(create_test_app(Config::default()), "/").await;
            assert_eq!(status, StatusCode::OK);
        }

        #[tokio::test]
        async fn test_index_shows_both_calendars() {
            let (status, body) = fetch(
                create_test_app(Config::default()),
                "/?date=2024-09-11&lang=am",
            )
            .await;

            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("መስከረም 1, 2017"));
            assert!(body.contains("2024-09-11"));
            assert!(body.contains(r#"<option value="am" selected>"#));
        }

        #[tokio::test]
        async fn test_index_empty_form_field_uses_today() {
            let (status, _) =
                fetch(create_test_app(Config::default()), "/?date=&lang=en").await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    mod date_query_tests {
        use super::*;

        #[test]
        fn test_query_defaults() {
            let query: DateQuery = serde_urlencoded::from_str("").unwrap();
            assert!(query.date.is_none());
            assert!(query.lang.is_none());
        }

        #[test]
        fn test_query_triple() {
            let query: DateQuery =
                serde_urlencoded::from_str("year=2024&month=12&day=10").unwrap();
            assert!(matches!(
                query.gregorian(),
                Ok(date) if date == GregorianDate::new(2024, 12, 10)
            ));
        }

        #[test]
        fn test_timestamp_takes_precedence() {
            let query: DateQuery = serde_urlencoded::from_str(
                "timestamp=2024-09-11T00:00:00Z&date=2020-01-01",
            )
            .unwrap();
            assert!(matches!(
                query.gregorian(),
                Ok(date) if date == GregorianDate::new(2024, 9, 11)
            ));
        }
    }
}

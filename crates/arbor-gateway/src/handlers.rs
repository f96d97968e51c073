use arbor_core::snippet::escape_html;
use arbor_core::{SearchError, SearchHit};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::html::render_form_page;
use super::server::AppState;

const APP_HTML: &str = include_str!("../assets/app.html");
const APP_JS: &str = include_str!("../assets/app.js");

/// `topk` as sent by clients: a number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TopK {
    Number(u64),
    Text(String),
}

impl TopK {
    fn value(&self) -> Option<usize> {
        match self {
            Self::Number(n) => usize::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub topk: Option<TopK>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HitResponse {
    rank: usize,
    doc_idx: usize,
    title: String,
    score: f32,
    snippet: String,
}

impl From<&SearchHit> for HitResponse {
    fn from(hit: &SearchHit) -> Self {
        Self {
            rank: hit.rank,
            doc_idx: hit.doc_idx,
            title: escape_html(&hit.title),
            score: hit.score,
            snippet: escape_html(&hit.snippet),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchResponse {
    bm25: Vec<HitResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sbert: Option<Vec<HitResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sbert_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

fn bad_request(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

pub(crate) async fn search_handler(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.status(), rejection.body_text()),
    };

    let settings = state.engine.settings();
    let top_k = match payload.topk {
        None => settings.retrieve_top_k,
        Some(ref raw) => match raw.value() {
            Some(k) => k,
            None => return bad_request(StatusCode::BAD_REQUEST, "topk must be an integer."),
        },
    };
    let query = payload.query.unwrap_or_default();

    match state.engine.search(&query, top_k, top_k).await {
        Ok(outcome) => {
            let bm25 = outcome.lexical.iter().map(HitResponse::from).collect();
            let (sbert, sbert_error) = match outcome.rerank {
                Ok(hits) => (Some(hits.iter().map(HitResponse::from).collect()), None),
                Err(e) => (None, Some(e)),
            };
            Json(SearchResponse {
                bm25,
                sbert,
                sbert_error,
            })
            .into_response()
        }
        Err(e @ SearchError::EmptyQuery) => bad_request(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FormParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub topk: Option<String>,
}

pub(crate) async fn form_handler(
    State(state): State<AppState>,
    Query(params): Query<FormParams>,
) -> Html<String> {
    let settings = state.engine.settings();
    let top_k = params
        .topk
        .as_deref()
        .and_then(|t| t.trim().parse().ok())
        .map_or(settings.retrieve_top_k, |k| state.engine.clamp_top_k(k));
    let query = params.q.unwrap_or_default();

    let outcome = match state
        .engine
        .search(&query, top_k, settings.form_rerank_top_k)
        .await
    {
        Ok(outcome) => Some(outcome),
        Err(SearchError::EmptyQuery) => None,
    };
    Html(render_form_page(query.trim(), top_k, outcome.as_ref()))
}

pub(crate) async fn app_handler() -> Html<&'static str> {
    Html(APP_HTML)
}

pub(crate) async fn app_js_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        APP_JS,
    )
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok",
            uptime_secs: 42,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
    }

    #[test]
    fn topk_accepts_number_or_numeric_string() {
        let req: SearchRequest = serde_json::from_str(r#"{"query":"a","topk":3}"#).unwrap();
        assert_eq!(req.topk.unwrap().value(), Some(3));
        let req: SearchRequest = serde_json::from_str(r#"{"query":"a","topk":" 7 "}"#).unwrap();
        assert_eq!(req.topk.unwrap().value(), Some(7));
        let req: SearchRequest = serde_json::from_str(r#"{"query":"a","topk":"many"}"#).unwrap();
        assert_eq!(req.topk.unwrap().value(), None);
        let req: SearchRequest = serde_json::from_str("{}").unwrap();
        assert!(req.query.is_none());
        assert!(req.topk.is_none());
    }

    #[test]
    fn hit_response_escapes_text() {
        let hit = SearchHit {
            rank: 1,
            doc_idx: 4,
            title: "<script>".into(),
            score: 0.5,
            snippet: "a & b".into(),
        };
        let resp = HitResponse::from(&hit);
        assert_eq!(resp.title, "&lt;script&gt;");
        assert_eq!(resp.snippet, "a &amp; b");
    }

    #[test]
    fn rerank_error_omits_sbert_list() {
        let resp = SearchResponse {
            bm25: Vec::new(),
            sbert: None,
            sbert_error: Some("down".into()),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("sbert").is_none());
        assert_eq!(json["sbert_error"], "down");
    }
}

//! Server-rendered search page for the form view.

use arbor_core::SearchOutcome;
use arbor_core::snippet::escape_html;

const EMPTY_QUERY_MESSAGE: &str = "Please enter a query.";
const TOP_K_CHOICES: [usize; 4] = [3, 5, 10, 20];

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0 auto;max-width:1100px;padding:1.5rem;color:#222}\
h1{text-align:center}\
form{display:flex;gap:.5rem;justify-content:center;margin-bottom:1.5rem}\
input[type=text]{flex:1;max-width:600px;padding:.5rem}\
.columns{display:grid;grid-template-columns:1fr 1fr;gap:2rem}\
.hit h3{margin:.2rem 0;font-size:1.05rem}\
.score{color:#666;font-size:.9rem}\
.notice{color:#b00}\
footer{text-align:center;margin-top:2rem;font-size:.85rem}";

/// Full HTML page: search form plus the lexical and reranked columns.
/// `outcome` is `None` when no (or a blank) query was submitted.
pub(crate) fn render_form_page(
    query: &str,
    top_k: usize,
    outcome: Option<&SearchOutcome>,
) -> String {
    let (lexical, rerank) = match outcome {
        None => (notice(EMPTY_QUERY_MESSAGE), notice(EMPTY_QUERY_MESSAGE)),
        Some(outcome) => {
            let lexical = render_hits(&outcome.lexical, "BM25 score");
            let rerank = match &outcome.rerank {
                Ok(hits) => render_hits(hits, "Cosine"),
                Err(e) => notice(&format!("Embedding rerank failed: {e}")),
            };
            (lexical, rerank)
        }
    };

    let options: String = TOP_K_CHOICES
        .iter()
        .map(|&k| {
            let selected = if k == top_k { " selected" } else { "" };
            format!("<option value=\"{k}\"{selected}>top {k}</option>")
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>arbor search</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>Retrieve then rerank</h1>\n\
         <form method=\"get\" action=\"/\">\n\
         <input type=\"text\" name=\"q\" value=\"{query}\" placeholder=\"Ask anything\" autofocus>\n\
         <select name=\"topk\">{options}</select>\n\
         <button type=\"submit\">Search</button>\n</form>\n\
         <div class=\"columns\">\n\
         <section><h2>BM25 Retrieval</h2>\n{lexical}</section>\n\
         <section><h2>Embedding Rerank</h2>\n{rerank}</section>\n\
         </div>\n<footer><a href=\"/app\">JSON client</a></footer>\n</body>\n</html>\n",
        query = escape_html(query),
    )
}

fn notice(message: &str) -> String {
    format!("<p class=\"notice\">{}</p>\n", escape_html(message))
}

fn render_hits(hits: &[arbor_core::SearchHit], score_label: &str) -> String {
    if hits.is_empty() {
        return "<p>No results.</p>\n".to_owned();
    }
    hits.iter()
        .map(|hit| {
            format!(
                "<div class=\"hit\"><h3>{rank}. {title}</h3>\
                 <div class=\"score\">{score_label}: {score:.2}</div>\
                 <p>{snippet}...</p></div><hr>\n",
                rank = hit.rank,
                title = escape_html(&hit.title),
                score = hit.score,
                snippet = escape_html(&hit.snippet),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use arbor_core::SearchHit;

    use super::*;

    fn hit(rank: usize, title: &str) -> SearchHit {
        SearchHit {
            rank,
            doc_idx: rank - 1,
            title: title.into(),
            score: 1.234,
            snippet: "some <b>text</b>".into(),
        }
    }

    #[test]
    fn empty_query_shows_notice_in_both_columns() {
        let page = render_form_page("", 5, None);
        assert_eq!(page.matches(EMPTY_QUERY_MESSAGE).count(), 2);
        assert!(page.contains("BM25 Retrieval"));
        assert!(page.contains("Embedding Rerank"));
        assert!(page.contains("<option value=\"5\" selected>"));
    }

    #[test]
    fn renders_hits_escaped() {
        let outcome = SearchOutcome {
            query: "q".into(),
            lexical: vec![hit(1, "A & B"), hit(2, "C")],
            rerank: Ok(vec![hit(1, "A & B")]),
        };
        let page = render_form_page("\"q\"", 5, Some(&outcome));
        assert!(page.contains("1. A &amp; B"));
        assert!(page.contains("BM25 score: 1.23"));
        assert!(page.contains("Cosine: 1.23"));
        assert!(page.contains("some &lt;b&gt;text&lt;/b&gt;..."));
        assert!(page.contains("value=\"&quot;q&quot;\""));
    }

    #[test]
    fn rerank_failure_is_reported() {
        let outcome = SearchOutcome {
            query: "q".into(),
            lexical: vec![hit(1, "A")],
            rerank: Err("model offline".into()),
        };
        let page = render_form_page("q", 5, Some(&outcome));
        assert!(page.contains("Embedding rerank failed: model offline"));
        assert!(page.contains("1. A"));
    }
}

use axum::{response::Html, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{api, AppState};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dashboard page
        .route("/", get(serve_dashboard))
        // API endpoints
        .route("/api/health", get(api::health_check))
        .route("/api/options", get(api::get_options))
        .route("/api/pages/:page", get(api::get_page))
        // Analytics endpoints
        .route("/api/metrics", get(api::get_metrics))
        .route("/api/streaks", get(api::get_streaks))
        .route("/api/intervals", get(api::get_intervals))
        .route("/api/windows", get(api::get_windows))
        // Export
        .route("/api/export", get(api::export_csv))
        .layer(cors)
        .with_state(state)
}

pub async fn start_dashboard_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let records = state.dataset.len();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(
        "Dashboard server starting on http://{} ({} records)",
        listener.local_addr()?,
        records
    );
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Prediction Dashboard</title>
    <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            background: #0f1419;
            color: #e7e9ea;
            min-height: 100vh;
        }
        .header {
            background: #16202a;
            padding: 1rem 2rem;
            border-bottom: 1px solid #2f3336;
            display: flex;
            justify-content: space-between;
            align-items: center;
            gap: 2rem;
            flex-wrap: wrap;
        }
        .header h1 { font-size: 1.5rem; color: #1da1f2; }
        .nav { display: flex; gap: 0.5rem; flex-wrap: wrap; }
        .nav button, .filters button {
            background: #22303c; color: #e7e9ea; border: 1px solid #2f3336;
            padding: 0.4rem 0.9rem; border-radius: 6px; cursor: pointer;
        }
        .nav button.active { background: #1da1f2; border-color: #1da1f2; }
        .filters {
            display: flex; gap: 1rem; flex-wrap: wrap; align-items: end;
            padding: 1rem 2rem; background: #16202a; border-bottom: 1px solid #2f3336;
        }
        .filters label { display: flex; flex-direction: column; font-size: 0.8rem; color: #8b98a5; gap: 0.25rem; }
        .filters select, .filters input {
            background: #0f1419; color: #e7e9ea; border: 1px solid #2f3336;
            padding: 0.35rem 0.5rem; border-radius: 6px;
        }
        .container { padding: 1.5rem; max-width: 1600px; margin: 0 auto; }
        .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 1rem; margin-bottom: 1.5rem; }
        .card { background: #16202a; border: 1px solid #2f3336; border-radius: 12px; padding: 1rem; }
        .card .label { color: #8b98a5; font-size: 0.8rem; }
        .card .value { font-size: 1.4rem; font-weight: 600; margin-top: 0.25rem; }
        .charts { display: grid; grid-template-columns: repeat(auto-fit, minmax(560px, 1fr)); gap: 1.5rem; }
        .chart { background: #16202a; border: 1px solid #2f3336; border-radius: 12px; padding: 0.5rem; min-height: 380px; }
        .error { color: #f4212e; padding: 1rem 0; }
    </style>
</head>
<body>
    <div class="header">
        <h1>Prediction Dashboard</h1>
        <div class="nav" id="nav"></div>
    </div>
    <div class="filters">
        <label>Pair <select id="pair"><option value="">All</option></select></label>
        <label>Start <input type="date" id="start_date"></label>
        <label>End <input type="date" id="end_date"></label>
        <label>Day <select id="day"><option value="">All</option></select></label>
        <label>Hit column
            <select id="column">
                <option value="without_delta">Without Delta</option>
                <option value="with_delta">With Delta</option>
            </select>
        </label>
        <button id="apply">Apply</button>
        <button id="export">Export CSV</button>
    </div>
    <div class="container">
        <div class="error" id="error"></div>
        <div class="cards" id="cards"></div>
        <div class="charts" id="charts"></div>
    </div>
    <script>
        const PAGE_TITLES = {
            'summary': 'Summary', 'temporal': 'Temporal', 'hour-day': 'Hour & Day',
            'pair': 'Pair', 'errors': 'Errors', 'advanced': 'Advanced'
        };
        let currentPage = 'summary';

        function queryString() {
            const params = new URLSearchParams();
            for (const id of ['pair', 'start_date', 'end_date', 'day', 'column']) {
                const value = document.getElementById(id).value;
                if (value) params.set(id, value);
            }
            return params.toString();
        }

        function renderChart(chart) {
            const el = document.createElement('div');
            el.className = 'chart';
            document.getElementById('charts').appendChild(el);

            const type = { bar: 'bar', line: 'scatter', scatter: 'scatter', heatmap: 'heatmap', histogram: 'bar', pie: 'pie' }[chart.kind];
            const traces = chart.traces.map(t => {
                if (chart.kind === 'pie') return { type, labels: t.x, values: t.y, name: t.name };
                const trace = { type, name: t.name, x: t.x, y: t.y, text: t.text };
                if (chart.kind === 'line') trace.mode = 'lines+markers';
                if (chart.kind === 'scatter') {
                    trace.mode = 'markers';
                    if (t.size) trace.marker = { size: t.size.map(s => 6 + Math.sqrt(s) * 2) };
                }
                if (t.z) trace.z = t.z;
                return trace;
            });

            Plotly.newPlot(el, traces, {
                title: chart.title,
                barmode: chart.barmode || undefined,
                xaxis: { title: chart.x_title || '' },
                yaxis: { title: chart.y_title || '' },
                paper_bgcolor: '#16202a', plot_bgcolor: '#16202a',
                font: { color: '#e7e9ea' }
            }, { responsive: true });
        }

        async function loadPage(slug) {
            currentPage = slug;
            document.querySelectorAll('.nav button').forEach(b => b.classList.toggle('active', b.dataset.page === slug));
            document.getElementById('error').textContent = '';
            document.getElementById('cards').innerHTML = '';
            document.getElementById('charts').innerHTML = '';

            const response = await fetch('/api/pages/' + slug + '?' + queryString());
            const body = await response.json();
            if (!response.ok) {
                document.getElementById('error').textContent = body.error;
                return;
            }

            for (const card of body.cards) {
                const el = document.createElement('div');
                el.className = 'card';
                el.innerHTML = '<div class="label"></div><div class="value"></div>';
                el.querySelector('.label').textContent = card.label;
                el.querySelector('.value').textContent = card.value;
                document.getElementById('cards').appendChild(el);
            }
            body.charts.forEach(renderChart);
        }

        async function init() {
            const options = await fetch('/api/options').then(r => r.json());
            const pair = document.getElementById('pair');
            options.pairs.forEach(p => pair.add(new Option(p, p)));
            const day = document.getElementById('day');
            options.all_days.forEach(d => day.add(new Option(d, d)));
            if (options.start) document.getElementById('start_date').value = options.start.slice(0, 10);
            if (options.end) document.getElementById('end_date').value = options.end.slice(0, 10);

            const nav = document.getElementById('nav');
            options.pages.forEach(slug => {
                const button = document.createElement('button');
                button.textContent = PAGE_TITLES[slug] || slug;
                button.dataset.page = slug;
                button.onclick = () => loadPage(slug);
                nav.appendChild(button);
            });

            document.getElementById('apply').onclick = () => loadPage(currentPage);
            document.getElementById('export').onclick = () => {
                window.location = '/api/export?' + queryString();
            };
            loadPage(currentPage);
        }

        init();
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisSettings;
    use crate::dataset::Dataset;
    use crate::types::fixtures::{record, ts};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let dataset = Dataset::new(vec![
            record(ts(1, 9, 0), "EURUSD", true, true),
            record(ts(1, 9, 30), "EURUSD", true, false),
            record(ts(1, 10, 0), "GBPUSD", false, true),
            record(ts(2, 14, 0), "EURUSD", true, true),
            record(ts(3, 8, 0), "EURUSD", false, false),
        ]);
        build_router(AppState::new(dataset, AnalysisSettings::default()))
    }

    async fn get(uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, headers, body)
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = get(uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_dashboard_shell() {
        let (status, _, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("/api/pages/"));
    }

    #[tokio::test]
    async fn test_health_and_options() {
        let (status, health) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "ok");
        assert_eq!(health["records"], 5);

        let (_, options) = get_json("/api/options").await;
        assert_eq!(options["pairs"], serde_json::json!(["EURUSD", "GBPUSD"]));
        assert_eq!(options["pages"][2], "hour-day");
    }

    #[tokio::test]
    async fn test_page_routes() {
        let (status, page) = get_json("/api/pages/summary?pair=Todos").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["records"], 5);

        let (status, page) = get_json("/api/pages/hour-day?day=Monday&column=with_delta").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["records"], 3);
        assert_eq!(page["column"], "with_delta");

        let (status, body) = get_json("/api/pages/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let (status, body) = get_json("/api/metrics?group_by=pair").await;
        assert_eq!(status, StatusCode::OK);
        let metrics = body["metrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0]["label"], "EURUSD");
        assert_eq!(metrics[0]["hit_rate_without_delta"], 75.0);
        assert_eq!(metrics[0]["total_without_delta"], 4);
    }

    #[tokio::test]
    async fn test_bad_parameters_are_rejected() {
        for uri in [
            "/api/metrics?group_by=weather",
            "/api/metrics?start_date=2024-01-05&end_date=2024-01-01",
            "/api/streaks?column=sometimes",
            "/api/windows?minutes=0",
            "/api/windows?minutes=soon",
            "/api/windows?minutes=1000000000000000",
            "/api/export?day=Someday",
        ] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].is_string(), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_streaks_intervals_windows() {
        let (_, streaks) = get_json("/api/streaks").await;
        assert_eq!(streaks["summary"]["max_hit_streak"], 2);

        let (_, intervals) = get_json("/api/intervals?column=without_delta").await;
        let minutes: Vec<f64> = intervals["intervals"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["minutes"].as_f64().unwrap())
            .collect();
        assert!(minutes.iter().all(|m| *m > 0.0));
        assert_eq!(minutes.first(), Some(&30.0));

        let (_, windows) = get_json("/api/windows?minutes=60").await;
        assert_eq!(windows["minutes"], 60);
        assert_eq!(windows["windows"][0]["hits"], 2);
    }

    #[tokio::test]
    async fn test_export_filtered_csv() {
        let (status, headers, body) =
            get("/api/export?pair=EURUSD&start_date=2024-01-01&end_date=2024-01-02").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"filtered_data.csv\""
        );
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));

        let text = String::from_utf8(body).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 3);
        assert!(lines[1..].iter().all(|line| line.contains("EURUSD")));
    }
}

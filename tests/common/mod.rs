#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use macro_pulse::app::pipeline::Sources;
use macro_pulse::config::PipelineConfig;
use macro_pulse::data::{HttpResponse, Transport};
use macro_pulse::domain::Aggregation;
use macro_pulse::error::TransportError;

pub const BCRA_URL: &str = "https://bcra.test/DatosVariable";
pub const ROFEX_URL: &str = "https://rofex.test/securities";
pub const INDEC_INDEX_URL: &str = "https://indec.test/Nivel4/Tema/3/5/31";
pub const INDEC_HOST: &str = "https://indec.test";

#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    Status(u16),
    Timeout,
}

/// Transport answering by URL substring; the first matching route wins and
/// unmatched URLs get a 404. Every request is recorded, and URLs matching a
/// delay pattern sleep before answering.
pub struct ScriptedTransport {
    routes: Vec<(String, Reply)>,
    delays: Vec<(String, Duration)>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            delays: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn route(mut self, pattern: &str, reply: Reply) -> Self {
        self.routes.push((pattern.to_string(), reply));
        self
    }

    pub fn delay(mut self, pattern: &str, delay: Duration) -> Self {
        self.delays.push((pattern.to_string(), delay));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.requests().iter().filter(|u| u.contains(pattern)).count()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        for (pattern, delay) in &self.delays {
            if url.contains(pattern.as_str()) {
                std::thread::sleep(*delay);
            }
        }
        let reply = self
            .routes
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Status(404));
        match reply {
            Reply::Body(body) => Ok(HttpResponse::ok(body)),
            Reply::Status(status) => Ok(HttpResponse {
                status,
                body: b"scripted failure".to_vec(),
            }),
            Reply::Timeout => Err(TransportError::Timeout),
        }
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn config(aggregation: Aggregation) -> PipelineConfig {
    PipelineConfig {
        bcra_base_url: BCRA_URL.to_string(),
        rofex_base_url: ROFEX_URL.to_string(),
        indec_index_url: INDEC_INDEX_URL.to_string(),
        indec_host: INDEC_HOST.to_string(),
        timeout: Duration::from_secs(1),
        money_aggregation: aggregation,
        ..PipelineConfig::default()
    }
}

pub fn sources(
    config: &PipelineConfig,
    bcra: &Arc<ScriptedTransport>,
    public: &Arc<ScriptedTransport>,
) -> Sources {
    let bcra: Arc<dyn Transport> = bcra.clone();
    let public: Arc<dyn Transport> = public.clone();
    Sources::with_transports(config, bcra, public)
}

/// BCRA `DatosVariable` body for `(YYYY-MM-DD, value)` pairs.
pub fn bcra_body(id: u32, points: &[(&str, f64)]) -> Reply {
    let results: Vec<String> = points
        .iter()
        .map(|(date, value)| format!(r#"{{"idVariable":{id},"fecha":"{date}","valor":{value:?}}}"#))
        .collect();
    Reply::Body(format!(r#"{{"status":200,"results":[{}]}}"#, results.join(",")))
}

/// ROFEX series body with one candle per close.
pub fn rofex_body(closes: &[f64]) -> Reply {
    let candles: Vec<String> = closes.iter().map(|c| format!(r#"{{"c":{c:?}}}"#)).collect();
    Reply::Body(format!(r#"{{"series":[{}]}}"#, candles.join(",")))
}

pub fn rofex_empty() -> Reply {
    Reply::Body(r#"{"series":[]}"#.to_string())
}

/// Base money 100/110/121 and deposits 200/220/242 over Jan..Mar 2025, plus
/// policy rate 40, survey 25 and spot 1000.
pub fn healthy_bcra() -> ScriptedTransport {
    ScriptedTransport::new()
        .route(
            "/15/",
            bcra_body(15, &[("2025-01-15", 100.0), ("2025-02-14", 110.0), ("2025-03-14", 121.0)]),
        )
        .route(
            "/21/",
            bcra_body(21, &[("2025-01-15", 200.0), ("2025-02-14", 220.0), ("2025-03-14", 242.0)]),
        )
        .route("/6/", bcra_body(6, &[("2025-03-12", 39.0), ("2025-03-13", 40.0)]))
        .route("/29/", bcra_body(29, &[("2025-02-28", 25.0)]))
        .route("/4/", bcra_body(4, &[("2025-03-13", 1000.0)]))
}

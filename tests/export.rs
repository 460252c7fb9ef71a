use chrono::NaiveDate;
use macro_pulse::aggregate;
use macro_pulse::app::pipeline::PipelineOutput;
use macro_pulse::domain::{Aggregation, InflationRow, InflationTable, Observation, Series};
use macro_pulse::error::{PipelineError, Provider, SourceError};
use macro_pulse::indicators::{self, RateInputs};
use macro_pulse::io::{write_inflation_csv, write_json, write_money_csv};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn series(name: &str, points: &[(NaiveDate, f64)]) -> Series {
    Series::new(name, points.iter().map(|&(date, v)| Observation::new(date, v)).collect())
}

fn output() -> PipelineOutput {
    let base = series("base", &[(d(2025, 1, 15), 100.0), (d(2025, 2, 14), 110.0)]);
    let deposits = series("deposits", &[(d(2025, 1, 15), 200.0), (d(2025, 2, 14), 220.0)]);
    let failed = || {
        Err(PipelineError::from(SourceError::Exhausted {
            provider: Provider::Rofex,
            key: "rx_DDF_DLR_FEB26".into(),
            attempts: 9,
        }))
    };

    PipelineOutput {
        as_of: d(2025, 3, 14),
        money: aggregate::combine(&base, &deposits, Aggregation::Mean),
        inflation: Ok(InflationTable {
            rows: vec![InflationRow {
                month: d(2025, 1, 1),
                general: 0.022,
                core: 0.024,
                seasonal: 0.015,
                regulated: 0.02,
            }],
        }),
        indicators: indicators::compute(&RateInputs {
            policy_rate: Ok(40.0),
            expected_inflation: Ok(25.0),
            spot: Ok(1000.0),
            futures_close: failed(),
        }),
    }
}

#[test]
fn json_export_carries_products_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");

    write_json(&path, &output()).unwrap();

    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["as_of"], "2025-03-14");
    assert_eq!(doc["money"].as_array().unwrap().len(), 3);
    assert_eq!(doc["money"][2]["type"], "M2");
    assert_eq!(doc["inflation"][0]["core"], 0.024);

    let indicators = doc["indicators"].as_array().unwrap();
    assert_eq!(indicators.len(), 4);
    assert_eq!(indicators[2]["display"], "15.0%");
    assert_eq!(indicators[3]["display"], "N/A");
    assert!(indicators[3]["value"].is_null());
    assert!(indicators[3]["reason"].as_str().unwrap().contains("9 attempt"));

    let branches = doc["branches"].as_array().unwrap();
    assert_eq!(branches.len(), 4);
    assert_eq!(branches[0]["ok"], true);
    assert_eq!(branches[3]["ok"], false);
}

#[test]
fn csv_exports_have_headers_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let money = dir.path().join("money.csv");
    let inflation = dir.path().join("inflation.csv");
    let out = output();

    write_money_csv(&money, &out).unwrap();
    write_inflation_csv(&inflation, &out).unwrap();

    let money = std::fs::read_to_string(money).unwrap();
    let lines: Vec<&str> = money.lines().collect();
    assert_eq!(lines[0], "month,variation,type");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].ends_with(",Base Money"));
    assert!(lines[3].ends_with(",M2"));

    let inflation = std::fs::read_to_string(inflation).unwrap();
    let lines: Vec<&str> = inflation.lines().collect();
    assert_eq!(lines[0], "month,general,core,seasonal,regulated");
    assert_eq!(lines[1], "2025-01-01,0.022,0.024,0.015,0.02");
}

#[test]
fn failed_branch_exports_an_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inflation.csv");
    let mut out = output();
    out.inflation = Err(PipelineError::from(SourceError::LinkNotFound {
        provider: Provider::Indec,
    }));

    write_inflation_csv(&path, &out).unwrap();

    assert_eq!(
        std::fs::read_to_string(path).unwrap().trim_end(),
        "month,general,core,seasonal,regulated"
    );
}

#[test]
fn unwritable_path_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("run.json");

    let err = write_json(&path, &output()).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

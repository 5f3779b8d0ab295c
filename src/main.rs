use std::env;
use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;

use calcdeck::api::registry;
use calcdeck::core::CalcError;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "calcdeck", version, about = "Everyday calculators over HTTP and the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, env = "CALCDECK_BIND", default_value = "0.0.0.0")]
        bind: IpAddr,
        #[arg(long, env = "CALCDECK_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// List the available calculators.
    List,
    /// Run one calculation and print the result as JSON.
    Run {
        id: String,
        #[arg(long, conflicts_with = "query", help = "Input record as a JSON object")]
        json: Option<String>,
        #[arg(long, help = "Input record as a share-link query string, e.g. bill=100&tipPercent=18")]
        query: Option<String>,
    },
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);
    if env_bool("CALCDECK_LOG_JSON", false) {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_once(id: &str, json: Option<&str>, query: Option<&str>) -> Result<Value, CalcError> {
    let calculator = registry::find(id)?;
    match (json, query) {
        (Some(json), _) => {
            let input = serde_json::from_str::<Value>(json)
                .map_err(|e| CalcError::Payload(e.to_string()))?;
            calculator.evaluate(input)
        }
        (None, Some(query)) => calculator.evaluate_query(query.trim_start_matches('?')),
        (None, None) => calculator.evaluate(Value::Object(Default::default())),
    }
}

fn print_json(value: &impl serde::Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, port } => {
            let addr = SocketAddr::new(bind, port);
            if let Err(e) = calcdeck::api::run_http_server(addr).await {
                tracing::error!(error = %e, "server error");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Command::List => print_json(&registry::catalog()),
        Command::Run { id, json, query } => {
            match run_once(&id, json.as_deref(), query.as_deref()) {
                Ok(result) => print_json(&result),
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_serve_flags() {
        let cli = Cli::try_parse_from(["calcdeck", "serve", "--bind", "127.0.0.1", "--port", "9000"])
            .expect("valid args");
        match cli.command {
            Command::Serve { bind, port } => {
                assert_eq!(bind, IpAddr::from([127, 0, 0, 1]));
                assert_eq!(port, 9000);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_json_with_query() {
        assert!(
            Cli::try_parse_from(["calcdeck", "run", "tip", "--json", "{}", "--query", "bill=1"])
                .is_err()
        );
    }

    #[test]
    fn run_once_accepts_json_and_query() {
        let from_json = run_once("tip", Some(r#"{"bill": 50, "tipPercent": 20}"#), None)
            .expect("json input");
        let from_query = run_once("tip", None, Some("?bill=50&tipPercent=20")).expect("query input");
        assert_eq!(from_json, from_query);
        assert_eq!(from_json["total"], serde_json::json!(60.0));
    }

    #[test]
    fn run_once_reports_unknown_calculator_and_missing_input() {
        assert!(matches!(
            run_once("nope", None, None),
            Err(CalcError::UnknownCalculator(_))
        ));
        assert!(matches!(
            run_once("tip", None, None),
            Err(CalcError::Payload(_))
        ));
    }
}

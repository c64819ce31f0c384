use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use scipnet::rpc::RpcClient;

#[derive(Parser)]
#[command(name = "scipnet-rpc")]
#[command(about = "Call the scipnet JSON-RPC binding", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081/")]
    url: String,

    /// Request timeout in seconds.
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch one route or page by name (e.g. `sys/login`, `scp-173`)
    Call {
        method: String,

        /// Body field, repeatable
        #[arg(long = "body", value_parser = parse_pair)]
        body: Vec<(String, String)>,

        /// Cookie, repeatable
        #[arg(long = "cookie", value_parser = parse_pair)]
        cookies: Vec<(String, String)>,

        /// Path parameter, repeatable
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,

        /// Client address to dispatch as
        #[arg(long)]
        ip: Option<String>,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {:?}", s))
}

fn to_object(pairs: Vec<(String, String)>) -> Value {
    Value::Object(pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect::<Map<_, _>>())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = RpcClient::new(cli.url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Call {
            method,
            body,
            cookies,
            params,
            ip,
        } => {
            let mut args = Map::new();
            args.insert("body".into(), to_object(body));
            args.insert("cookies".into(), to_object(cookies));
            args.insert("params".into(), to_object(params));
            if let Some(ip) = ip {
                args.insert("ip".into(), Value::String(ip));
            }

            match client.call(&method, Value::Object(args)).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

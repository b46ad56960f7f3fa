//! # voz: REPL driver for the conversational sales engine
//!
//! Reads one utterance per line, runs it through `Engine::handle_turn`, and
//! prints the structured acknowledgment. The session context lives in this
//! process for the duration of the run - exactly the ownership model the
//! engine expects from any caller.
//!
//! ## Environment
//! - `VOZ_DB_PATH`    SQLite file (default: ./voz.db)
//! - `VOZ_TENANT_ID`  tenant to operate as (default: demo tenant)
//! - `ORACLE_API_KEY` / `ORACLE_API_URL` / `ORACLE_MODEL` - see voz-oracle

use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use voz_core::session::SessionContext;
use voz_db::{Database, DbConfig};
use voz_engine::Engine;
use voz_oracle::{HttpOracle, OracleConfig};

const DEFAULT_TENANT: &str = "00000000-0000-0000-0000-000000000001";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; real deployments set the environment themselves
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db_path = env::var("VOZ_DB_PATH").unwrap_or_else(|_| "./voz.db".to_string());
    let tenant_id = env::var("VOZ_TENANT_ID").unwrap_or_else(|_| DEFAULT_TENANT.to_string());

    let db = Database::new(DbConfig::new(&db_path)).await?;
    db.methods().seed_defaults(&tenant_id).await?;

    let oracle = HttpOracle::new(OracleConfig::load()?)?;
    let engine = Engine::new(db, Arc::new(oracle));

    info!(tenant_id = %tenant_id, db_path = %db_path, "voz ready");
    println!("voz - dictate sales, or commands like \"anulá la venta\". Ctrl-D to exit.");

    let stdin = io::stdin();
    let mut session = SessionContext::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }

        match engine.handle_turn(&tenant_id, utterance, session.clone()).await {
            Ok(outcome) => {
                session = outcome.session;
                println!("{}", outcome.ack.summary());
                println!("{}", serde_json::to_string_pretty(&outcome.ack)?);
            }
            Err(err) => {
                eprintln!("turn failed: {err}");
            }
        }
    }

    println!();
    Ok(())
}

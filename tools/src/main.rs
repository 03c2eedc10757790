//! dash-runner: headless driver for the founder dashboard core.
//!
//! Usage:
//!   dash-runner --email founder@aiviator.app
//!   dash-runner --config dash.json --email me@x.com --password secret
//!   dash-runner --ipc-mode            (JSON lines on stdin/stdout)

use anyhow::Result;
use founder_dash_core::{
    auth::Identity,
    calculator::quarterly_view,
    command::DashCommand,
    config::DashboardConfig,
    dashboard::{Dashboard, DashboardSnapshot},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Login {
        email: String,
        #[serde(default)]
        password: String,
    },
    Logout,
    Command {
        command: DashCommand,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    authenticated: bool,
    identity: Option<Identity>,
    error: Option<String>,
    snapshot: Option<DashboardSnapshot>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let config_path = arg_value(&args, "--config");
    let email = arg_value(&args, "--email");
    let password = arg_value(&args, "--password").unwrap_or_default();

    let config = match &config_path {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::builtin()?,
    };
    let mut dashboard = Dashboard::build(&config)?;

    if ipc_mode {
        log::info!("dash-runner: ipc mode on stdin/stdout");
        return run_ipc_loop(&mut dashboard);
    }

    println!("founder-dash: dash-runner");
    println!("  config:    {}", config_path.as_deref().unwrap_or("(builtin)"));
    println!("  auth:      {}", dashboard.gate().provider_name());
    println!();

    let Some(email) = email else {
        println!("No --email given; dashboard stays locked.");
        return Ok(());
    };
    if let Err(e) = dashboard.login(&email, &password) {
        println!("Login failed: {}", dashboard.gate().last_error().unwrap_or_else(|| e.to_string()));
        return Ok(());
    }

    let snapshot = dashboard.snapshot()?;
    print_summary(&snapshot);
    Ok(())
}

fn run_ipc_loop(dashboard: &mut Dashboard) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("dash-runner: malformed ipc command: {e}");
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let error = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => None,
            IpcCommand::Login { email, password } => dashboard
                .login(&email, &password)
                .err()
                .map(|_| dashboard.gate().last_error().unwrap_or_default()),
            IpcCommand::Logout => dashboard.logout().err().map(|e| e.to_string()),
            IpcCommand::Command { command } => dashboard.apply(command).err().map(|e| e.to_string()),
        };

        let state = build_ui_state(dashboard, error);
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(dashboard: &mut Dashboard, error: Option<String>) -> UiState {
    let snapshot = dashboard.snapshot().ok();
    UiState {
        authenticated: snapshot.is_some(),
        identity: snapshot.as_ref().map(|s| s.identity.clone()),
        error,
        snapshot,
    }
}

fn print_summary(s: &DashboardSnapshot) {
    let d = &s.derived;
    let c = &s.metrics.counters;
    let na = || "n/a".to_string();

    println!("=== OVERVIEW ({}) ===", s.identity.email);
    println!("  total users:     {}", c.total_users);
    println!("  paid users:      {}", c.paid_users);
    println!("  active schools:  {}", c.active_schools);
    println!("  penetration:     {}", d.market_penetration.clone().unwrap_or_else(na));
    println!(
        "  vs {}:   {}",
        founder_dash_core::calculator::BENCHMARK_COMPETITOR,
        d.share_of_benchmark_pct.map(|p| format!("{p:.1}%")).unwrap_or_else(na)
    );

    println!();
    println!("=== FINANCIALS ===");
    println!("  MRR:             ${:.0}", s.metrics.mrr);
    println!("  ARR:             ${:.0}", d.annual_revenue);
    println!("  ARPU:            ${:.0}/yr", d.arpu);
    println!("  monthly costs:   ${:.0}/mo", d.total_monthly_cost);
    println!(
        "  break-even:      {} paid ({} tier)",
        d.break_even_users.map(|u| u.to_string()).unwrap_or_else(|| "unreachable".into()),
        d.reference_tier
    );
    if let Some(progress) = d.break_even_progress_pct {
        println!("  progress:        {progress:.0}%");
    }

    println!();
    println!("=== REVENUE SCENARIOS ===");
    for r in &d.revenue_scenarios {
        println!(
            "  {:<12} | users {:>6} | paid {:>5} | ARR ${:>9.0} | market {}",
            r.label,
            r.users,
            r.paid_users,
            r.arr,
            r.market_share_pct.map(|p| format!("{p:.2}%")).unwrap_or_else(na)
        );
    }

    println!();
    println!(
        "=== 12-MONTH PROJECTION (net growth {:.1}%/mo) ===",
        d.net_monthly_growth_pct
    );
    for p in quarterly_view(&d.projection).iter().map(|p| p.display()) {
        println!(
            "  Month {:>2} | users {:>7} | paid {:>6} | MRR ${:>8} | ARR ${:>9}",
            p.month, p.total_users, p.paid_users, p.mrr, p.arr
        );
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
}

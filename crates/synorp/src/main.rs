// # synorp - Synology reverse proxy reconciler
//
// This binary is a THIN integration layer: all reconciliation logic lives in
// synorp-core, all remote execution in synorp-gateway-webapi.
//
// It is responsible for:
// 1. Parsing flags and `SYNORP_*` environment variables
// 2. Initializing logging (stderr only; stdout carries the result)
// 3. Loading and validating the declared entry
// 4. Creating the gateway through the registry
// 5. Running one reconciliation and printing its result object
//
// ## Example
//
// ```bash
// cat > dsm.json <<'EOF'
// {
//   "name": "DSM",
//   "backend": {"fqdn": "localhost", "port": 5000},
//   "frontend": {"fqdn": "dsm.my.local.network", "https": true}
// }
// EOF
//
// export SYNORP_HOST=nas.lan
// export SYNORP_USER=admin
// synorp --sudo --check dsm.json
// ```

mod cli;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use synorp_core::{GatewayRegistry, InvocationContext, ModuleResult, Reconciler};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Result reported (changed or not)
/// - 1: Configuration or argument error
/// - 2: Reconciliation failed (ambiguous entry, remote failure)
#[derive(Debug, Clone, Copy)]
enum SynorpExitCode {
    Success = 0,
    ConfigError = 1,
    ReconcileError = 2,
}

impl From<SynorpExitCode> for ExitCode {
    fn from(code: SynorpExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SynorpExitCode::ConfigError.into();
    }

    let (ctx, reconciler) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("{:#}", e);
            report(&ModuleResult::failed(format!("{:#}", e)));
            return SynorpExitCode::ConfigError.into();
        }
    };

    // At most two sequential remote calls: one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            report(&ModuleResult::failed(format!("Failed to create runtime: {}", e)));
            return SynorpExitCode::ReconcileError.into();
        }
    };

    let result = rt.block_on(ctx.run(&reconciler));
    report(&result);

    if result.is_failed() {
        SynorpExitCode::ReconcileError.into()
    } else {
        SynorpExitCode::Success.into()
    }
}

/// Validate arguments and build the reconciler
fn prepare(cli: &Cli) -> anyhow::Result<(InvocationContext, Reconciler)> {
    let input = cli.read_args()?;
    let ctx = InvocationContext::from_json(&input, cli.check)?;
    info!(
        "Reconciling reverse proxy entry '{}'{}",
        ctx.args().name,
        if ctx.check_mode() { " (check mode)" } else { "" }
    );

    let config = cli.resolve_config()?;
    debug!("Transport: {:?}", config.transport);

    let registry = GatewayRegistry::new();
    synorp_gateway_webapi::register(&registry);
    let gateway = registry.create_gateway(&config)?;

    Ok((ctx, Reconciler::new(gateway)))
}

/// Print the result object on stdout
fn report(result: &ModuleResult) {
    match result.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            println!(r#"{{"failed": true, "msg": "failed to serialize result"}}"#);
        }
    }
}

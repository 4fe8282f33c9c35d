//! CLI command implementations.

use std::net::{IpAddr, SocketAddr};
use std::process::Command;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use animcalc_core::CalculationResult;
use animcalc_server::{Server, ServerConfig};

/// Start the HTTP server.
pub async fn serve(host: String, port: u16, cors: bool) -> Result<()> {
    let config = ServerConfig::builder()
        .addr(socket_addr(&host, port)?)
        .cors(cors)
        .build();

    print_banner(config.addr);

    Server::new(config).run().await?;

    Ok(())
}

fn print_banner(addr: SocketAddr) {
    eprintln!();
    eprintln!("  ╔════════════════════════════════════════════╗");
    eprintln!("  ║   Animation Calculator                     ║");
    eprintln!("  ╚════════════════════════════════════════════╝");
    eprintln!("  Binding {addr}");
}

/// Run one calculation from the command line.
///
/// Operands are passed as strings so they go through the same numeric
/// coercion as HTTP payloads.
pub fn calc(num1: String, operator: String, num2: String) -> Result<()> {
    let result = evaluate(&num1, &operator, &num2)?;
    println!("{:?}", result.result);
    Ok(())
}

fn evaluate(num1: &str, operator: &str, num2: &str) -> Result<CalculationResult> {
    let payload = json!({
        "num1": num1,
        "num2": num2,
        "operator": operator,
    });

    animcalc_core::calculate(payload.to_string().as_bytes()).map_err(|e| eyre!("{e}"))
}

/// Desktop shell: serve on a local address and open the page once the
/// listener accepts connections.
pub async fn desktop(
    host: String,
    port: u16,
    ready_timeout: Duration,
    open_browser: bool,
) -> Result<()> {
    let config = ServerConfig::builder()
        .addr(socket_addr(&host, port)?)
        .ready_timeout(ready_timeout)
        .build();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .wrap_err("invalid spinner template")?,
    );
    spinner.set_message(format!("Starting Animation Calculator on {}...", config.addr));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let running = Server::new(config).spawn().await;
    spinner.finish_and_clear();
    let running = running?;

    let url = running.base_url();
    tracing::info!(url = %url, "Desktop server ready");
    println!("Animation Calculator running at {url}");

    if open_browser {
        if let Err(e) = open_in_browser(&url) {
            tracing::warn!(error = %e, "Could not open a browser");
            println!("Open {url} in your browser.");
        }
    }

    println!("Press Ctrl+C to quit.");
    animcalc_server::shutdown_signal().await;

    running.shutdown().await?;
    Ok(())
}

/// Hands `url` to the platform's default browser.
fn open_in_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let command = {
        let mut command = Command::new("open");
        command.arg(url);
        command
    };

    #[cfg(target_os = "windows")]
    let command = {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", url]);
        command
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let command = {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        command
    };

    launch(command)
}

/// Starts `command` and reaps it on a background thread.
fn launch(mut command: Command) -> std::io::Result<()> {
    let mut child = command.spawn()?;
    std::thread::spawn(move || {
        if let Err(e) = child.wait() {
            tracing::debug!(error = %e, "Browser launcher did not exit cleanly");
        }
    });
    Ok(())
}

fn socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host
        .parse()
        .wrap_err_with(|| format!("invalid host address: {host}"))?;
    Ok(SocketAddr::new(ip, port))
}

/// Display version information.
pub fn version() {
    println!("Animcalc {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Animation Calculator: two numbers, one operator, one result.");
    println!();
    println!("Components:");
    println!("  animcalc-core       - Validation and arithmetic");
    println!("  animcalc-server     - HTTP API and calculator page");
    println!("  animcalc-telemetry  - Logging and counters");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        assert_eq!(
            socket_addr("127.0.0.1", 5000).unwrap(),
            "127.0.0.1:5000".parse().unwrap()
        );
        assert_eq!(socket_addr("::1", 80).unwrap(), "[::1]:80".parse().unwrap());
        assert!(socket_addr("localhost:80", 80).is_err());
    }

    #[test]
    fn test_launch_missing_program_fails() {
        assert!(launch(Command::new("animcalc-no-such-launcher")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_returns_without_blocking() {
        let mut command = Command::new("sh");
        command.args(["-c", "exit 0"]);
        assert!(launch(command).is_ok());
    }

    #[test]
    fn test_evaluate() {
        assert_eq!(evaluate("10", "+", "5").unwrap().result, 15.0);
        assert_eq!(evaluate("-10", "+", "5").unwrap().result, -5.0);
        assert_eq!(evaluate("2", "pow", "8").unwrap().result, 256.0);
    }

    #[test]
    fn test_evaluate_errors() {
        let err = evaluate("10", "/", "0").unwrap_err();
        assert_eq!(err.to_string(), "Division by zero is not allowed");

        let err = evaluate("abc", "+", "1").unwrap_err();
        assert_eq!(err.to_string(), "num1 and num2 must be valid numbers");

        let err = evaluate("1", "%", "1").unwrap_err();
        assert!(err.to_string().starts_with("Invalid operator"));
    }
}

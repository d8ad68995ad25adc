use std::process::ExitCode;

use echoping::config::{ConfigError, PingConfig};
use echoping::logging::init_logging;
use echoping::net::{resolve, socket::IcmpSocket};
use echoping::ping::{shutdown_signal, PingError, Pinger};

fn print_usage(cmd: &str) {
    eprint!("Usage\n  {} [-s packetsize] target\n", cmd)
}

fn main() -> ExitCode {
    let mut args = std::env::args();
    let cmd = args.next().unwrap_or_else(|| "echoping".to_string());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{cmd}: {}", e);
            if matches!(
                e,
                PingError::Config(ConfigError::MissingTarget | ConfigError::MissingPayloadSize)
            ) {
                print_usage(&cmd);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: impl Iterator<Item = String>) -> Result<(), PingError> {
    let config = PingConfig::from_args(args)?;
    init_logging(&config.log_level);

    let target = resolve(&config.target)?;
    let socket =
        IcmpSocket::new(config.recv_buffer_hint, config.poll_interval).map_err(PingError::Socket)?;
    let shutdown = shutdown_signal()?;

    println!(
        "PING {}({}): {} data bytes",
        config.target, target, config.payload_size
    );

    let mut pinger = Pinger::new(socket, target, &config);
    let stats = pinger.stats();
    pinger.run(&shutdown);

    println!();
    println!("{}", stats.report());
    Ok(())
}

use std::process::ExitCode;

use clap::Parser;

use accel_capture_core::models::error::CaptureError;
use accel_capture_core::session::controller::CaptureSession;
use accel_capture_net::cli::Args;
use accel_capture_net::{SimulatedSensor, TcpServer};

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), CaptureError> {
    let config = args.configuration()?;
    log::info!(
        "{:?} mode, {} Hz, ±{} g, {:?} reads, {} samples per axis",
        config.use_mode,
        config.sample_rate_hz(),
        config.g_range.g(),
        config.read_mode,
        config.buffer_capacity
    );

    let server = TcpServer::bind(args.listen_addr())?;
    log::info!("Waiting for a client on {}", server.local_addr()?);
    let (sink, commands) = server.accept()?;
    log::info!("Sending results to {}", sink.peer_addr());
    let closer = commands.closer()?;

    let sensor = SimulatedSensor::new(config.output_data_rate, config.g_range);
    let session = CaptureSession::new(sensor, sink, config)?;

    let command_thread = session.command_processor(commands).spawn()?;
    let acquisition_thread = session.spawn()?;

    let acquisition = acquisition_thread
        .join()
        .map_err(|_| CaptureError::Unknown("acquisition thread panicked".into()))?;

    // The command thread may still be blocked reading from the client.
    closer.close();
    match command_thread.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("Command channel ended with error: {}", e),
        Err(_) => log::error!("Command thread panicked"),
    }

    let diagnostics = acquisition?;
    log::info!(
        "Shut down after {} samples: {} triggers, {} captures ({} truncated), {} streamed, {} commands",
        diagnostics.samples_acquired,
        diagnostics.triggers,
        diagnostics.captures_emitted,
        diagnostics.truncated_windows,
        diagnostics.samples_streamed,
        diagnostics.commands_applied
    );
    Ok(())
}

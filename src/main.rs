use std::io::{Read, Write};

use anyhow::Context;
use fixed_mandelbrot::{
    pool,
    priority::MAX_SLOTS,
    stream::{BeatQueue, ByteQueue},
    Device,
};
use log::{debug, info};

/// Reads command records from stdin and writes the result stream to stdout.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let interleave = pool::DEFAULT_INTERLEAVE;
    let engines = num_cpus::get().clamp(1, MAX_SLOTS / interleave);
    let pool = pool::Builder::new()
        .with_engines(engines)
        .with_interleave(interleave)
        .with_parallel(engines > 1)
        .create()
        .context("building engine pool")?;
    info!("{} engines with {} lanes each", engines, interleave);

    let mut commands = Vec::new();
    std::io::stdin()
        .lock()
        .read_to_end(&mut commands)
        .context("reading commands from stdin")?;
    debug!("read {} command bytes", commands.len());

    let mut device = Device::new(pool);
    let mut input = ByteQueue::from(commands);
    let mut output = BeatQueue::unbounded();
    let ticks = device.run_until_idle(&mut input, &mut output);
    info!(
        "{} sweeps in {} ticks, {} malformed commands",
        device.completed_sweeps(),
        ticks,
        device.parser().malformed()
    );

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output.drain_payload())
        .context("writing results to stdout")?;
    stdout.flush().context("flushing stdout")?;

    Ok(())
}

//! sockdiag command - sample established TCP connections.
//!
//! Opens one sock_diag session and samples IPv4 and/or IPv6 connections,
//! either once or on a fixed interval until interrupted.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tcpdiag::{AddressFamily, SampleStore, Session};
use tokio::time::Interval;
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "sockdiag",
    version,
    about = "Sample established TCP connections and their tcp_info"
)]
struct Cli {
    /// Sample IPv4 connections only.
    #[arg(short = '4', long)]
    ipv4: bool,

    /// Sample IPv6 connections only.
    #[arg(short = '6', long)]
    ipv6: bool,

    /// Repeat sampling every MS milliseconds.
    #[arg(short, long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Stop after N sampling rounds.
    #[arg(
        short,
        long,
        value_name = "N",
        requires = "interval",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    count: Option<u64>,

    /// Log every sampled connection.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn families(&self) -> Vec<AddressFamily> {
        match (self.ipv4, self.ipv6) {
            (true, false) => vec![AddressFamily::Inet],
            (false, true) => vec![AddressFamily::Inet6],
            _ => vec![AddressFamily::Inet, AddressFamily::Inet6],
        }
    }

    fn rounds_done(&self, rounds: u64) -> bool {
        self.interval.is_none() || self.count.is_some_and(|n| rounds >= n)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let families = cli.families();
    let period = Duration::from_millis(cli.interval.unwrap_or(1));
    let mut ticker = tokio::time::interval(period);

    let mut session = Session::open().context("failed to open sock_diag socket")?;
    let mut rounds = 0u64;

    // One listener for the whole run, so a Ctrl-C during a round is kept.
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        if !next_tick(&mut ticker, interrupt.as_mut()).await? {
            break;
        }

        let (returned, result) = sample_round(session, families.clone()).await?;
        session = returned;

        match result {
            Ok(stores) => report(&families, &stores),
            Err(e) => {
                session.close();
                return Err(e).context("sampling failed");
            }
        }

        rounds += 1;
        if cli.rounds_done(rounds) {
            break;
        }
    }

    session.close();
    Ok(())
}

/// Wait for the next tick. Returns `false` once `interrupt` has fired.
///
/// `interrupt` is polled first, so a pending Ctrl-C wins over a due tick.
async fn next_tick<F>(ticker: &mut Interval, interrupt: Pin<&mut F>) -> Result<bool>
where
    F: Future<Output = io::Result<()>>,
{
    tokio::select! {
        biased;
        res = interrupt => {
            res.context("failed to listen for Ctrl-C")?;
            info!("interrupted");
            Ok(false)
        }
        _ = ticker.tick() => Ok(true),
    }
}

/// Run one blocking sampling round off the async runtime, handing the
/// session back afterwards.
async fn sample_round(
    mut session: Session,
    families: Vec<AddressFamily>,
) -> Result<(Session, tcpdiag::Result<Vec<SampleStore>>)> {
    let round = tokio::task::spawn_blocking(move || {
        let result = session.sample_all(&families);
        (session, result)
    })
    .await
    .context("sampling task panicked")?;
    Ok(round)
}

fn report(families: &[AddressFamily], stores: &[SampleStore]) {
    for (family, store) in families.iter().zip(stores) {
        info!(
            %family,
            samples = store.len(),
            elapsed = ?store.elapsed(),
            "sampled established connections"
        );

        for sample in store {
            let tcp = sample.info();
            debug!(
                local = %sample.local(),
                remote = %sample.remote(),
                rtt = ?tcp.rtt(),
                cwnd = tcp.snd_cwnd,
                "connection"
            );
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into())
        .add_directive(format!("sockdiag={level}").parse()?);
    if verbose {
        filter = filter.add_directive("tcpdiag=debug".parse()?);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

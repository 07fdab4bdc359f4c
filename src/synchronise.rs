//! Driver loop: fetch → convert → publish, then sleep, forever.
//!
//! # Responsibilities
//! - [`run_cycle`] performs one RUNNING iteration and reports what happened
//!   or which stage failed, as a typed [`CycleError`].
//! - [`run_forever`] alternates RUNNING and SLEEPING with no terminal state.
//!   A failed iteration is logged with its category and the loop carries on;
//!   the fixed sleep is the only recovery mechanism.
//!
//! # Callable From
//! - The CLI (`run` and `once` subcommands) and the integration tests, which
//!   drive it with `MockFetcher`/`MockVersionControl`.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, info_span, Instrument};

use crate::contract::{Fetcher, VersionControl};
use crate::convert::Converter;
use crate::error::CycleError;
use crate::publish::{PublishOutcome, Publisher};

/// What a successful iteration produced.
#[derive(Debug)]
pub struct CycleReport {
    pub features: usize,
    pub placemarks: usize,
    pub output_path: PathBuf,
    pub outcome: PublishOutcome,
}

/// The three stages of one iteration, wired together.
pub struct Pipeline<F, V> {
    pub fetcher: F,
    pub converter: Converter,
    pub publisher: Publisher<V>,
}

impl<F, V> Pipeline<F, V>
where
    F: Fetcher,
    V: VersionControl,
{
    pub fn new(fetcher: F, converter: Converter, publisher: Publisher<V>) -> Self {
        Self {
            fetcher,
            converter,
            publisher,
        }
    }
}

pub async fn run_cycle<F, V>(pipeline: &Pipeline<F, V>) -> Result<CycleReport, CycleError>
where
    F: Fetcher,
    V: VersionControl,
{
    let collection = pipeline.fetcher.fetch().await?;
    let document = pipeline.converter.convert(&collection)?;
    let outcome = pipeline.publisher.publish(&document)?;

    Ok(CycleReport {
        features: collection.features.len(),
        placemarks: document.len(),
        output_path: pipeline.publisher.config().output_path(),
        outcome,
    })
}

pub async fn run_forever<F, V>(pipeline: &Pipeline<F, V>, interval: Duration)
where
    F: Fetcher,
    V: VersionControl,
{
    info!(interval_secs = interval.as_secs(), "Starting polling loop");
    let mut iteration: u64 = 0;
    loop {
        iteration += 1;
        let span = info_span!("cycle", iteration);
        match run_cycle(pipeline).instrument(span).await {
            Ok(report) => info!(
                iteration,
                placemarks = report.placemarks,
                outcome = ?report.outcome,
                "Cycle complete"
            ),
            Err(e) => error!(
                iteration,
                category = e.category(),
                error = %e,
                "Cycle failed, waiting for next run"
            ),
        }
        info!(
            interval_secs = interval.as_secs(),
            "Sleeping until next cycle"
        );
        tokio::time::sleep(interval).await;
    }
}

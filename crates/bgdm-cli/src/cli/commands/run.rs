//! `bgdm run`: drive a full pipeline over a numbered scenario range and
//! print the event stream.

use anyhow::Result;
use bgdm_core::config;
use bgdm_core::controller::{PipelineController, RunOptions};
use bgdm_core::discovery::RangeSource;
use bgdm_core::event::{EventSink, PipelineEvent};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct RunArgs {
    pub output: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub batch_size: Option<usize>,
    pub start: u32,
    pub end: u32,
    pub flat: bool,
}

pub async fn run_pipeline(args: RunArgs) -> Result<()> {
    let cfg = config::load_or_init()?;

    let mut opts = RunOptions::from_config(&cfg);
    if let Some(output) = args.output {
        opts.output_dir = output;
    }
    if let Some(concurrency) = args.concurrency {
        opts.concurrency = concurrency;
    }
    if let Some(batch_size) = args.batch_size {
        opts.batch_size = batch_size;
    }
    if args.flat {
        opts.split_by_scenario = false;
    }

    let (events, mut rx) = EventSink::channel();
    let controller = Arc::new(PipelineController::new(cfg, events));
    let source = Arc::new(RangeSource::new(args.start, args.end));
    controller.start(opts, source)?;

    // First Ctrl-C drains gracefully; a second one kills the process.
    {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping");
                controller.stop();
            }
        });
    }

    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::Log(line) => println!("{line}"),
            PipelineEvent::Progress { scanned, total } => {
                println!("[scan] {scanned}/{total} scenarios")
            }
            PipelineEvent::Done(snapshot) => {
                if snapshot.failed > 0 {
                    println!(
                        "finished with {} failed of {} images",
                        snapshot.failed, snapshot.total
                    );
                } else {
                    println!("finished: all {} images accounted for", snapshot.total);
                }
                break;
            }
        }
    }
    Ok(())
}

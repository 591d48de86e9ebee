//! Orchestrates the Reader, Batch Queue, Filter Stage, Filtered Writer,
//! Chunker, Request Dispatcher pool, and Summary Writer for one run.
//!
//! The Reader runs on its own `std::thread`, since it blocks on file I/O
//! and on the Batch Queue filling up. The processor section owns a
//! `tokio::runtime::Runtime` and bounds dispatcher concurrency to
//! `num_threads` with a `tokio::sync::Semaphore`, spawning one task per
//! in-flight chunk so dispatch runs across the runtime's worker threads.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::chunk;
use crate::client::Client;
use crate::config::Config;
use crate::demux::DemuxContext;
use crate::dispatch::dispatch_chunk;
use crate::error::AnnotatorError;
use crate::filter::FilterChain;
use crate::queue;
use crate::vcf::VcfReader;
use crate::writer::FilteredWriter;

/// Final tallies returned after a run completes (or aborts the batch loop
/// early on a dispatch failure; the summary is still written either way).
pub struct RunSummary {
    pub counts: std::collections::HashMap<String, u64>,
    pub batches_processed: u64,
}

/// Builder for assembling a [`Pipeline`] from its configured collaborators.
#[must_use = "builders do nothing unless you call .build()"]
pub struct PipelineBuilder {
    config: Config,
    filter_chain: FilterChain,
    vcf_path: std::path::PathBuf,
}

impl PipelineBuilder {
    pub fn new(config: Config, vcf_path: std::path::PathBuf) -> Self {
        Self {
            config,
            filter_chain: FilterChain::empty(),
            vcf_path,
        }
    }

    pub fn filter_chain(mut self, filter_chain: FilterChain) -> Self {
        self.filter_chain = filter_chain;
        self
    }

    pub fn build(self) -> Result<Pipeline, AnnotatorError> {
        let client = Client::builder().build()?;
        Ok(Pipeline {
            config: self.config,
            filter_chain: self.filter_chain,
            vcf_path: self.vcf_path,
            client,
        })
    }
}

/// A fully configured, ready-to-run annotation pipeline.
pub struct Pipeline {
    config: Config,
    filter_chain: FilterChain,
    vcf_path: std::path::PathBuf,
    client: Client,
}

impl Pipeline {
    pub fn builder(config: Config, vcf_path: std::path::PathBuf) -> PipelineBuilder {
        PipelineBuilder::new(config, vcf_path)
    }

    /// Run the pipeline to completion.
    ///
    /// Fatal configuration/URL/HTTP-init errors abort before any work
    /// starts. A fatal reader error or a dispatch failure partway through
    /// breaks the batch loop early, but the summary is still written.
    pub fn run(self) -> Result<RunSummary, AnnotatorError> {
        let service_url = self
            .config
            .service_url()
            .map_err(AnnotatorError::UrlComposition)?;

        crate::config::prepare_output_directory(&self.config.output_directory)
            .map_err(AnnotatorError::Config)?;

        let demux = DemuxContext::new(&self.config.output_directory)?;

        let mut reader = VcfReader::open(&self.vcf_path)?;
        let header = reader.header().to_vec();

        let mut filtered_writer = match &self.config.output_filename {
            Some(filename) => {
                let mut writer = FilteredWriter::open(&self.config.output_directory, filename)?;
                writer.write_header(&header)?;
                Some(writer)
            }
            None => None,
        };

        let (sender, receiver) = queue::channel(self.config.max_batches);
        let batch_size = self.config.batch_size;
        let reader_handle = std::thread::spawn(move || run_reader(&mut reader, batch_size, sender));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.num_threads)
            .enable_all()
            .build()
            .map_err(AnnotatorError::HttpInit)?;

        let semaphore = Arc::new(Semaphore::new(self.config.num_threads));
        let mut batches_processed = 0u64;
        let mut abort = false;

        while let Some(batch) = receiver.take() {
            let (passed, failed) = self.filter_chain.partition(batch);

            if let Some(writer) = filtered_writer.as_mut() {
                writer.write_batch(&passed, &failed)?;
            }

            if !passed.is_empty() {
                let chunks: Vec<Vec<_>> = chunk::chunks(&passed, self.config.variants_per_request)
                    .into_iter()
                    .map(|c| c.to_vec())
                    .collect();

                let result = runtime.block_on(dispatch_batch(
                    chunks,
                    &self.client,
                    &service_url,
                    &demux,
                    Arc::clone(&semaphore),
                ));

                if let Err(err) = result {
                    tracing::error!(error = %err, "dispatch failed, aborting further batch processing for this run");
                    abort = true;
                }
            }

            batches_processed += 1;
            if abort {
                break;
            }
        }

        if abort {
            // Drain whatever the reader already queued so it can observe a
            // closed queue and terminate, instead of blocking on `put`
            // forever against a processor that has stopped consuming.
            while receiver.take().is_some() {}
        }

        if let Ok(Err(read_err)) = reader_handle.join() {
            tracing::error!(error = %read_err, "VCF reader terminated with an error");
        }

        if let Some(writer) = filtered_writer.as_mut() {
            writer.flush()?;
        }
        demux.write_summary()?;

        Ok(RunSummary {
            counts: demux.counts(),
            batches_processed,
        })
    }
}

fn run_reader(
    reader: &mut VcfReader,
    batch_size: usize,
    sender: queue::BatchSender,
) -> Result<(), crate::error::VcfReadError> {
    loop {
        let batch = reader.read_batch(batch_size)?;
        if batch.is_empty() {
            return Ok(());
        }
        if sender.put(batch).is_err() {
            // Every receiver has gone away; nothing left to do.
            return Ok(());
        }
    }
}

/// Dispatch every chunk in a batch concurrently, bounded to `num_threads`
/// in-flight requests at once via `semaphore`. Returns the first error
/// encountered, if any, after all spawned tasks have finished.
async fn dispatch_batch(
    chunks: Vec<Vec<crate::vcf::VcfRecord>>,
    client: &Client,
    service_url: &str,
    demux: &DemuxContext,
    semaphore: Arc<Semaphore>,
) -> Result<(), crate::error::DispatchError> {
    let mut tasks = Vec::with_capacity(chunks.len());

    for (worker, chunk) in chunks.into_iter().enumerate() {
        let client = client.clone();
        let service_url = service_url.to_string();
        let demux = demux.clone();
        let semaphore = Arc::clone(&semaphore);

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore is never closed during a run");
            dispatch_chunk(&client, &service_url, &chunk, &demux, worker).await
        }));
    }

    let mut first_error = None;
    for task in tasks {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
            Err(join_err) => {
                tracing::error!(error = %join_err, "dispatcher task panicked");
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

//! The end-to-end conversion: download, extract, read, assemble and write.

use crate::assemble::assemble_dataset;
use crate::config::ConverterConfig;
use crate::error::CamelsError;
use crate::extract::extract_archives;
use crate::fetch::downloader::{Downloader, FetchReport};
use crate::progress::{NoProgress, ProgressSink};
use crate::readers::attributes::{read_attributes, BasinAttributes};
use crate::readers::geometry::{read_basin_geometries, BasinGeometries};
use crate::readers::streamflow::{read_streamflow, StreamflowTable};
use crate::types::dataset::CamelsDataset;
use crate::types::source::DataSource;
use crate::utils::timed_stage;
use crate::writers::table::write_table;
use crate::writers::write_array;
use bon::bon;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;
use tokio_util::sync::CancellationToken;

/// What a completed conversion produced.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    /// `None` when downloading was skipped.
    pub fetch: Option<FetchReport>,
    pub extracted: Vec<PathBuf>,
    pub stations: usize,
    pub days: usize,
    pub table_output: PathBuf,
    pub array_output: PathBuf,
}

/// Runs the CAMELS conversion described by a [`ConverterConfig`].
///
/// Every stage can also be called on its own, which is how the integration
/// tests drive the pipeline against a synthetic data directory.
///
/// # Examples
///
/// ```rust,no_run
/// # use camels_convert::{CamelsConverter, CamelsError, ConverterConfig};
/// # async fn run() -> Result<(), CamelsError> {
/// let converter = CamelsConverter::new(ConverterConfig::default());
/// let summary = converter.run().call().await?;
/// println!("{} stations over {} days", summary.stations, summary.days);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CamelsConverter {
    config: ConverterConfig,
}

async fn blocking<T, E, F>(work: F) -> Result<T, CamelsError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<CamelsError> + Send + 'static,
{
    task::spawn_blocking(work).await?.map_err(Into::into)
}

#[bon]
impl CamelsConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Runs every stage in order.
    ///
    /// # Arguments
    ///
    /// * `.progress(Arc<dyn ProgressSink>)`: Optional. Receives download and stage reports. Defaults to [`NoProgress`].
    /// * `.cancel(CancellationToken)`: Optional. Cancelling it stops in-flight downloads at the next chunk
    ///   and ends the run with [`CamelsError::Cancelled`]. It has no effect once the fetch stage is over
    ///   or when downloads are skipped.
    ///
    /// # Errors
    ///
    /// Fails on the first stage error. Outputs written before the failure are kept.
    #[builder]
    pub async fn run(
        &self,
        progress: Option<Arc<dyn ProgressSink>>,
        cancel: Option<CancellationToken>,
    ) -> Result<ConversionSummary, CamelsError> {
        let progress = progress.unwrap_or_else(|| Arc::new(NoProgress));
        let cancel = cancel.unwrap_or_default();

        let fetch = if self.config.skip_download {
            info!("Skipping download, using files in {:?}", self.config.data_dir());
            None
        } else {
            Some(self.fetch(Arc::clone(&progress), &cancel).await?)
        };

        // cancellation only reaches the downloads; later stages run to completion
        let extracted = self.extract(progress.as_ref()).await?;

        let geometries = self.read_geometries(progress.as_ref()).await?;
        let attributes = self.read_attributes(progress.as_ref(), geometries).await?;
        let streamflow = self.read_streamflow(progress.as_ref(), attributes.clone()).await?;

        let stations = streamflow.stations().len();
        let days = streamflow.dates().len();
        let dataset = self
            .assemble(progress.as_ref(), attributes.clone(), streamflow)
            .await?;

        self.write_table(progress.as_ref(), attributes).await?;
        self.write_array(progress.as_ref(), dataset).await?;

        Ok(ConversionSummary {
            fetch,
            extracted,
            stations,
            days,
            table_output: self.config.table_output.clone(),
            array_output: self.config.array_output.clone(),
        })
    }

    /// Downloads every configured source missing from the data directory.
    pub async fn fetch(
        &self,
        progress: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<FetchReport, CamelsError> {
        let sources = self
            .config
            .sources
            .iter()
            .map(|raw| DataSource::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        let downloader = Downloader::new(self.config.data_dir())
            .with_workers(self.config.download_workers)
            .with_chunk_size(self.config.chunk_size);

        let stage = progress.clone();
        let report = timed_stage(stage.as_ref(), "Downloading CAMELS archives", async {
            Ok::<_, CamelsError>(downloader.fetch_all(&sources, progress, cancel).await?)
        })
        .await?;

        if report.was_cancelled() || cancel.is_cancelled() {
            warn!("Download cancelled: {:?}", report.cancelled);
            return Err(CamelsError::Cancelled(report.cancelled.len()));
        }
        info!(
            "{} archive(s) downloaded, {} already present",
            report.downloaded.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    pub async fn extract(&self, progress: &dyn ProgressSink) -> Result<Vec<PathBuf>, CamelsError> {
        let dir = self.config.data_dir().to_path_buf();
        timed_stage(
            progress,
            "Extracting archives",
            blocking(move || extract_archives(&dir)),
        )
        .await
    }

    pub async fn read_geometries(&self, progress: &dyn ProgressSink) -> Result<BasinGeometries, CamelsError> {
        let path = self.config.basin_shapefile();
        let field = self.config.layout.basin_id_field.clone();
        timed_stage(
            progress,
            "Reading basin geometries",
            blocking(move || read_basin_geometries(&path, &field)),
        )
        .await
    }

    pub async fn read_attributes(
        &self,
        progress: &dyn ProgressSink,
        geometries: BasinGeometries,
    ) -> Result<BasinAttributes, CamelsError> {
        let dir = self.config.attributes_dir();
        timed_stage(
            progress,
            "Reading catchment attributes",
            blocking(move || read_attributes(&dir, &geometries)),
        )
        .await
    }

    pub async fn read_streamflow(
        &self,
        progress: &dyn ProgressSink,
        attributes: BasinAttributes,
    ) -> Result<StreamflowTable, CamelsError> {
        let dir = self.config.streamflow_dir();
        timed_stage(
            progress,
            "Reading streamflow",
            blocking(move || read_streamflow(&dir, &attributes)),
        )
        .await
    }

    pub async fn assemble(
        &self,
        progress: &dyn ProgressSink,
        attributes: BasinAttributes,
        streamflow: StreamflowTable,
    ) -> Result<CamelsDataset, CamelsError> {
        timed_stage(
            progress,
            "Assembling dataset",
            blocking(move || assemble_dataset(&attributes, &streamflow)),
        )
        .await
    }

    pub async fn write_table(
        &self,
        progress: &dyn ProgressSink,
        attributes: BasinAttributes,
    ) -> Result<(), CamelsError> {
        let path = self.config.table_output.clone();
        let format = self.config.table_format;
        timed_stage(
            progress,
            "Writing attribute table",
            blocking(move || write_table(&mut attributes.into_frame(), &path, format)),
        )
        .await
    }

    pub async fn write_array(&self, progress: &dyn ProgressSink, dataset: CamelsDataset) -> Result<(), CamelsError> {
        let path = self.config.array_output.clone();
        let format = self.config.array_format;
        let mode = self.config.write_mode;
        let time_chunk = self.config.time_chunk;
        timed_stage(
            progress,
            "Writing array dataset",
            blocking(move || write_array(&dataset, &path, format, mode, time_chunk)),
        )
        .await
    }
}

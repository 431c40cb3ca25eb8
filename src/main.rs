use camels_convert::{
    ArrayFormat, CamelsConverter, CamelsError, ConsoleProgress, ConverterConfig, TableFormat,
    WriteMode, DEFAULT_DOWNLOAD_WORKERS,
};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const TABLE_STEM: &str = "camels_attributes_v2.0";
const ARRAY_STEM: &str = "camels_attrs_v2_streamflow_v1p2";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TableFormatArg {
    Feather,
    Parquet,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ArrayFormatArg {
    Zarr,
    Netcdf,
}

#[derive(Parser)]
#[command(name = "camels-convert")]
#[command(about = "Download the CAMELS dataset and convert it to a Feather table and a Zarr store", long_about = None)]
struct Cli {
    /// Directory holding the downloaded and extracted CAMELS files
    #[arg(long, env = "CAMELS_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Attribute table output (default: camels_attributes_v2.0.<format>)
    #[arg(long)]
    table_output: Option<PathBuf>,

    /// Array dataset output (default: camels_attrs_v2_streamflow_v1p2.<format>)
    #[arg(long)]
    array_output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "feather")]
    table_format: TableFormatArg,

    #[arg(long, value_enum, default_value = "zarr")]
    array_format: ArrayFormatArg,

    /// Number of parallel downloads
    #[arg(long, default_value_t = DEFAULT_DOWNLOAD_WORKERS)]
    workers: usize,

    /// Use the files already in the data directory
    #[arg(long)]
    skip_download: bool,

    /// Fail instead of replacing an existing array output
    #[arg(long)]
    no_overwrite: bool,
}

impl Cli {
    fn into_config(self) -> ConverterConfig {
        let table_format = match self.table_format {
            TableFormatArg::Feather => TableFormat::Feather,
            TableFormatArg::Parquet => TableFormat::Parquet,
        };
        let array_format = match self.array_format {
            ArrayFormatArg::Zarr => ArrayFormat::Zarr,
            ArrayFormatArg::Netcdf => ArrayFormat::NetCdf,
        };
        let table_output = self
            .table_output
            .unwrap_or_else(|| PathBuf::from(format!("{TABLE_STEM}.{}", table_format.extension())));
        let array_output = self
            .array_output
            .unwrap_or_else(|| PathBuf::from(format!("{ARRAY_STEM}.{}", array_format.extension())));
        let write_mode = if self.no_overwrite {
            WriteMode::FailIfExists
        } else {
            WriteMode::Overwrite
        };

        ConverterConfig::builder()
            .data_dir(self.data_dir)
            .table_output(table_output)
            .table_format(table_format)
            .array_output(array_output)
            .array_format(array_format)
            .write_mode(write_mode)
            .download_workers(self.workers)
            .skip_download(self.skip_download)
            .build()
    }
}

#[tokio::main]
async fn main() -> Result<(), CamelsError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping downloads");
            on_ctrl_c.cancel();
        }
    });

    let converter = CamelsConverter::new(config);
    let summary = converter
        .run()
        .progress(Arc::new(ConsoleProgress::new()))
        .cancel(cancel)
        .call()
        .await?;

    info!(
        "Converted {} stations over {} days into {:?} and {:?}",
        summary.stations, summary.days, summary.table_output, summary.array_output
    );
    Ok(())
}

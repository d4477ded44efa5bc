mod config;
mod error;
mod fetch;
mod matcher;
mod model;
mod parser;
mod pipeline;
mod pnu;
mod server;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use soil_common::juso::JusoClient;
use soil_common::soil_api::SoilApiClient;

use config::Config;
use fetch::SoilRecordFetcher;
use model::Resolution;
use pipeline::SoilInfoPipeline;

/// Resolve free-text Korean addresses to legal-district soil-examination
/// records by chaining the juso.go.kr address lookup and the data.go.kr
/// soil-examination services.
#[derive(Parser)]
#[command(name = "soil-info", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP front-end.
    Serve,
    /// Resolve one address and print the soil-examination report.
    Resolve { address: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    info!(
        juso_url = %config.juso.base_url,
        soil_url = %config.soil.base_url,
        verify_certs = config.soil.verify_certificates,
        "configuration loaded"
    );

    let juso = Arc::new(JusoClient::new(config.juso.clone())?);
    let soil = Arc::new(SoilApiClient::new(config.soil.clone())?);
    let pipeline = Arc::new(SoilInfoPipeline::new(juso, SoilRecordFetcher::new(soil)));

    match cli.command {
        Command::Serve => server::serve(pipeline, &config.bind_addr).await,
        Command::Resolve { address } => {
            match pipeline.resolve(&address).await? {
                Resolution::Found { record, .. } => print_report(&record),
                Resolution::NotFound => error!("토양 정보를 조회할 수 없습니다."),
            }
            Ok(())
        }
    }
}

fn print_report(record: &model::SoilRecord) {
    println!("\n===토양 검사 세부내용===");
    println!("검사일자: {}", record.test_date);
    println!("검사유형: {}", record.exam_type);
    println!("주소: {}", record.address);
    println!("pH(산도): {:.1}", record.ph);
    println!("유기물(OM): {:.1} g/kg", record.om);
    println!("유효인산(P2O5): {:.1} mg/kg", record.p2o5);
    println!("칼륨(K): {:.3} cmol/kg", record.k);
    println!("칼슘(Ca): {:.1} cmol/kg", record.ca);
    println!("마그네슘(Mg): {:.3} cmol/kg", record.mg);
    println!("전기전도도(EC): {:.3} dS/m", record.ec);
    println!("\n===토양 검사 세부내용 끝===");
}

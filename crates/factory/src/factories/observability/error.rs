use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObservabilityError {
    #[error("ExporterBuildError, {0}")]
    ExporterBuildError(#[from] opentelemetry_otlp::ExporterBuildError),
    #[error("SubscriberInitError, {0}")]
    SubscriberInitError(#[from] tracing_subscriber::util::TryInitError),
}

//! Parsing uploaded documents
//!
//! Uploads arrive as byte streams. They are materialized into a temporary
//! file carrying the upload's extension, parsed on the blocking pool and
//! the temporary file is removed on every exit path. Cleanup problems are
//! logged, never returned.

use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::app::models::CargoRecord;
use crate::app::parser::{ManifestParser, ParseOutcome};
use crate::errors::UploadError;

/// Parse an uploaded document, returning its records or an empty vector
pub async fn parse_upload<R>(
    reader: R,
    file_name: &str,
    period_id: &str,
    parser: Arc<ManifestParser>,
) -> Vec<CargoRecord>
where
    R: AsyncRead + Unpin,
{
    match run_upload(reader, file_name, period_id, parser).await {
        Ok(outcome) => outcome.into_records(),
        Err(e) => {
            tracing::error!("Failed to process upload '{}': {}", file_name, e);
            Vec::new()
        }
    }
}

/// Like [`parse_upload`] but keeps the full outcome
///
/// # Errors
///
/// Returns `UploadError` if the upload cannot be written to a temporary
/// file or the parse task dies
pub async fn run_upload<R>(
    mut reader: R,
    file_name: &str,
    period_id: &str,
    parser: Arc<ManifestParser>,
) -> Result<ParseOutcome, UploadError>
where
    R: AsyncRead + Unpin,
{
    let temp = temp_file_for(file_name)?;

    let written = copy_into(&mut reader, &temp).await;
    let outcome = match written {
        Ok(bytes) => {
            tracing::debug!(
                "Materialized {} bytes of '{}' at {}",
                bytes,
                file_name,
                temp.path().display()
            );
            let path = temp.path().to_path_buf();
            let period_id = period_id.to_string();
            tokio::task::spawn_blocking(move || parser.run_path(&path, &period_id))
                .await
                .map_err(|e| UploadError::TaskFailed {
                    reason: e.to_string(),
                })
        }
        Err(e) => Err(UploadError::TempFile(e)),
    };

    cleanup(temp);
    outcome
}

fn temp_file_for(file_name: &str) -> Result<NamedTempFile, UploadError> {
    let suffix = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let temp = tempfile::Builder::new()
        .prefix("manifest-upload-")
        .suffix(&suffix)
        .tempfile()?;
    Ok(temp)
}

async fn copy_into<R>(reader: &mut R, temp: &NamedTempFile) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut file = tokio::fs::File::from_std(temp.reopen()?);
    let bytes = tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;
    Ok(bytes)
}

fn cleanup(temp: NamedTempFile) {
    let path = temp.path().to_path_buf();
    if let Err(e) = temp.close() {
        tracing::warn!("Failed to remove temporary file {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::translate::PassthroughTranslator;

    #[test]
    fn test_temp_file_keeps_extension() {
        let temp = temp_file_for("partner manifest.XLSX").unwrap();
        assert!(temp.path().to_string_lossy().ends_with(".XLSX"));

        let temp = temp_file_for("no_extension").unwrap();
        assert!(temp.path().extension().is_none());
    }

    #[tokio::test]
    async fn test_garbage_upload_yields_nothing() {
        let parser = Arc::new(ManifestParser::with_translator(Arc::new(
            PassthroughTranslator,
        )));
        let records = parse_upload(&b"definitely not xlsx"[..], "a.xlsx", "p", parser).await;
        assert!(records.is_empty());
    }
}

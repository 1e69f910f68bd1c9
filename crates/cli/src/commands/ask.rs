//! Ask command handler.
//!
//! Answers a question against already-extracted documents and prints the
//! citation-checked result.

use super::{build_client, load_profiles, load_registry, print_json};
use clap::Args;
use pipewrench_answer::{AnswerPipeline, PipelineOptions, QueryRequest};
use pipewrench_core::{config::AppConfig, AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ask a question with optional document context
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Plain-text document to use as context (repeatable)
    #[arg(short, long = "document")]
    pub documents: Vec<PathBuf>,

    /// Department profile id (unknown ids fall back to the default)
    #[arg(long)]
    pub department: Option<String>,

    /// Job role profile id
    #[arg(long)]
    pub role: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let document_context = read_documents(&self.documents)?;

        let pipeline = AnswerPipeline::builder()
            .registry(Arc::new(load_registry(config)?))
            .profiles(Arc::new(load_profiles(config)?))
            .maybe_client(build_client(config))
            .model(&config.model)
            .options(PipelineOptions {
                max_context_chars: config.compliance.max_context_chars,
                max_tokens: config.compliance.max_tokens,
                temperature: self.temperature,
            })
            .build()?;

        let mut request =
            QueryRequest::new(&self.question).with_document_context(document_context);
        request.department_id = self.department.clone();
        request.role_id = self.role.clone();

        let result = pipeline.answer(&request).await?;

        if self.json {
            print_json(&serde_json::to_value(&result)?)?;
        } else {
            println!("{}", result.render());
            tracing::debug!(
                "Request {} answered in {:?} mode with {} citations",
                result.request_id,
                result.mode,
                result.citations.len()
            );
        }

        Ok(())
    }
}

/// Concatenate documents into one context block, each under its file name.
fn read_documents(paths: &[PathBuf]) -> AppResult<String> {
    let mut sections = Vec::with_capacity(paths.len());

    for path in paths {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Validation(format!("Cannot read document {:?}: {}", path, e))
        })?;
        tracing::debug!("Read {} characters from {:?}", text.chars().count(), path);
        sections.push(format!("Document: {}\n{}", display_name(path), text.trim_end()));
    }

    Ok(sections.join("\n\n"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_documents_concatenates_with_names() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("sop.txt");
        let second = temp.path().join("permit.txt");
        std::fs::write(&first, "Section 4: entry requires a permit.\n").unwrap();
        std::fs::write(&second, "Permit form B.").unwrap();

        let context = read_documents(&[first, second]).unwrap();
        assert_eq!(
            context,
            "Document: sop.txt\nSection 4: entry requires a permit.\n\nDocument: permit.txt\nPermit form B."
        );
    }

    #[test]
    fn test_read_documents_empty() {
        assert_eq!(read_documents(&[]).unwrap(), "");
    }

    #[test]
    fn test_read_documents_missing_file() {
        let result = read_documents(&[PathBuf::from("/no/such/document.txt")]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

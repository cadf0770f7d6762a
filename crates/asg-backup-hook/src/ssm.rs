use std::time::Duration;

use asg_backup_core::CommandStatus;
use async_trait::async_trait;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::operation::list_command_invocations::ListCommandInvocationsOutput;
use aws_sdk_ssm::operation::list_documents::ListDocumentsOutput;
use aws_sdk_ssm::operation::send_command::SendCommandOutput;
use aws_sdk_ssm::types::DocumentKeyValuesFilter;
use tracing::debug;

use crate::errors::BackupError;
use crate::services::CommandService;

/// SSM Run Command client wrapper.
#[derive(Clone)]
pub struct SsmCommands {
    client: Client,
}

impl SsmCommands {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommandService for SsmCommands {
    async fn list_documents(&self, name: &str) -> Result<Vec<String>, BackupError> {
        let filter = DocumentKeyValuesFilter::builder()
            .key("Name")
            .values(name)
            .build();

        let names = find_document(name, |next_token| {
            let request = self
                .client
                .list_documents()
                .filters(filter.clone())
                .set_next_token(next_token);
            async move {
                request
                    .send()
                    .await
                    .map_err(|e| BackupError::from(aws_sdk_ssm::Error::from(e)))
            }
        })
        .await?;

        debug!(document = name, matches = names.len(), "listed documents");
        Ok(names)
    }

    async fn send_command(
        &self,
        instance_id: &str,
        document_name: &str,
        timeout: Duration,
    ) -> Result<String, BackupError> {
        let timeout_secs = i32::try_from(timeout.as_secs()).unwrap_or(i32::MAX);

        let output = self
            .client
            .send_command()
            .instance_ids(instance_id)
            .document_name(document_name)
            .timeout_seconds(timeout_secs)
            .send()
            .await
            .map_err(aws_sdk_ssm::Error::from)?;

        command_id(&output)
    }

    async fn invocation_status(
        &self,
        command_id: &str,
        instance_id: &str,
    ) -> Result<Option<CommandStatus>, BackupError> {
        let output = self
            .client
            .list_command_invocations()
            .command_id(command_id)
            .instance_id(instance_id)
            .details(false)
            .send()
            .await
            .map_err(aws_sdk_ssm::Error::from)?;

        Ok(invocation_status(&output))
    }
}

/// Page through ListDocuments until a page holds an exact match for `name`.
///
/// The `Name` filter is a prefix match, so the exact document can sit on a
/// later page behind others sharing its prefix.
async fn find_document<F, Fut>(name: &str, mut fetch_page: F) -> Result<Vec<String>, BackupError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListDocumentsOutput, BackupError>>,
{
    let mut next_token = None;

    loop {
        let page = fetch_page(next_token.take()).await?;

        let names = document_names(&page, name);
        if !names.is_empty() {
            return Ok(names);
        }

        match page.next_token() {
            Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
            _ => return Ok(Vec::new()),
        }
    }
}

/// Names of the listed documents that exactly match `name`.
///
/// The `Name` filter is a prefix match, so `ASGLogBackupV2` would otherwise
/// count as `ASGLogBackup`.
fn document_names(output: &ListDocumentsOutput, name: &str) -> Vec<String> {
    output
        .document_identifiers()
        .iter()
        .filter_map(|doc| doc.name())
        .filter(|listed| *listed == name)
        .map(str::to_owned)
        .collect()
}

fn command_id(output: &SendCommandOutput) -> Result<String, BackupError> {
    output
        .command()
        .and_then(|command| command.command_id())
        .map(str::to_owned)
        .ok_or(BackupError::MissingField("Command.CommandId"))
}

/// Status of the first invocation. Filtering by instance id leaves at most one.
fn invocation_status(output: &ListCommandInvocationsOutput) -> Option<CommandStatus> {
    output
        .command_invocations()
        .first()
        .and_then(|invocation| invocation.status())
        .map(|status| CommandStatus::from(status.as_str()))
}

#[cfg(test)]
mod tests {
    use aws_sdk_ssm::types::{Command, CommandInvocation, CommandInvocationStatus, DocumentIdentifier};

    use super::*;

    fn page(names: &[&str], next_token: Option<&str>) -> ListDocumentsOutput {
        names
            .iter()
            .fold(ListDocumentsOutput::builder(), |builder, name| {
                builder.document_identifiers(DocumentIdentifier::builder().name(*name).build())
            })
            .set_next_token(next_token.map(str::to_owned))
            .build()
    }

    fn documents(names: &[&str]) -> ListDocumentsOutput {
        page(names, None)
    }

    #[tokio::test]
    async fn find_document_follows_next_token() {
        let pages = [
            page(&["ASGLogBackupArchive", "ASGLogBackupV2"], Some("p2")),
            page(&["ASGLogBackup"], Some("p3")),
            page(&["ASGLogBackupZ"], None),
        ];
        let mut requested = Vec::new();

        let names = find_document("ASGLogBackup", |token: Option<String>| {
            requested.push(token.clone());
            let output = match token.as_deref() {
                None => pages[0].clone(),
                Some("p2") => pages[1].clone(),
                _ => pages[2].clone(),
            };
            async move { Ok(output) }
        })
        .await
        .unwrap();

        assert_eq!(names, vec!["ASGLogBackup"]);
        // Stops at the page holding the match
        assert_eq!(requested, vec![None, Some("p2".to_string())]);
    }

    #[tokio::test]
    async fn find_document_missing_after_last_page() {
        let pages = [
            page(&["ASGLogBackupV2"], Some("p2")),
            page(&["ASGLogBackupV3"], None),
        ];
        let mut calls = 0;

        let names = find_document("ASGLogBackup", |token: Option<String>| {
            calls += 1;
            let output = if token.is_none() { pages[0].clone() } else { pages[1].clone() };
            async move { Ok(output) }
        })
        .await
        .unwrap();

        assert!(names.is_empty());
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn find_document_propagates_page_error() {
        let result = find_document("ASGLogBackup", |_token: Option<String>| async {
            Err(BackupError::MissingField("DocumentIdentifiers"))
        })
        .await;

        assert!(matches!(
            result,
            Err(BackupError::MissingField("DocumentIdentifiers"))
        ));
    }

    #[test]
    fn document_names_keeps_exact_matches() {
        let output = documents(&["ASGLogBackup", "ASGLogBackupV2"]);
        assert_eq!(document_names(&output, "ASGLogBackup"), vec!["ASGLogBackup"]);
    }

    #[test]
    fn document_names_empty_listing() {
        let output = documents(&[]);
        assert!(document_names(&output, "ASGLogBackup").is_empty());
    }

    #[test]
    fn command_id_from_output() {
        let output = SendCommandOutput::builder()
            .command(Command::builder().command_id("cmd-1").build())
            .build();
        assert_eq!(command_id(&output).unwrap(), "cmd-1");
    }

    #[test]
    fn command_id_missing() {
        let output = SendCommandOutput::builder().build();
        assert!(matches!(
            command_id(&output),
            Err(BackupError::MissingField("Command.CommandId"))
        ));
    }

    #[test]
    fn invocation_status_maps_first_invocation() {
        let output = ListCommandInvocationsOutput::builder()
            .command_invocations(
                CommandInvocation::builder()
                    .command_id("cmd-1")
                    .instance_id("i-123")
                    .status(CommandInvocationStatus::InProgress)
                    .build(),
            )
            .build();
        assert_eq!(invocation_status(&output), Some(CommandStatus::InProgress));
    }

    #[test]
    fn invocation_status_not_registered() {
        let output = ListCommandInvocationsOutput::builder().build();
        assert_eq!(invocation_status(&output), None);
    }
}

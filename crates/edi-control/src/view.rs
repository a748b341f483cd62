//! Presentation of registry state for inspect calls.
//!
//! The same report backs both forms of output: JSON for machine callers
//! that need field-level access, and a column-aligned table for humans.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::types::DeploymentRecord;

/// Serializable projection of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentView {
    /// Model identifier.
    pub model_id: String,
    /// Model version.
    pub model_version: String,
    /// Image reference supplied at deploy time.
    pub image: String,
    /// Desired replica count.
    pub desired_replicas: u32,
    /// Enclave the deployment lives in.
    pub enclave: String,
}

impl From<&DeploymentRecord> for DeploymentView {
    fn from(record: &DeploymentRecord) -> Self {
        Self {
            model_id: record.model_id.to_string(),
            model_version: record.model_version.to_string(),
            image: record.image.clone(),
            desired_replicas: record.desired_replicas,
            enclave: record.enclave.to_string(),
        }
    }
}

impl From<DeploymentRecord> for DeploymentView {
    fn from(record: DeploymentRecord) -> Self {
        Self::from(&record)
    }
}

const TABLE_HEADERS: [&str; 5] = ["Model ID", "Image", "Version", "Scale", "Enclave"];

/// Result of an inspect call: the deployments of one enclave, ordered by
/// model id then version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectReport {
    /// Deployment views, in stable order.
    pub deployments: Vec<DeploymentView>,
}

impl InspectReport {
    /// Build a report from registry records.
    #[must_use]
    pub fn from_records(records: Vec<DeploymentRecord>) -> Self {
        let mut deployments: Vec<DeploymentView> =
            records.iter().map(DeploymentView::from).collect();
        deployments.sort_by(|a, b| {
            (&a.model_id, &a.model_version).cmp(&(&b.model_id, &b.model_version))
        });

        Self { deployments }
    }

    /// Look up the first deployment of a model id.
    #[must_use]
    pub fn get(&self, model_id: &str) -> Option<&DeploymentView> {
        self.deployments.iter().find(|d| d.model_id == model_id)
    }

    /// Look up an exact (model id, version) deployment.
    #[must_use]
    pub fn find(&self, model_id: &str, model_version: &str) -> Option<&DeploymentView> {
        self.deployments
            .iter()
            .find(|d| d.model_id == model_id && d.model_version == model_version)
    }

    /// Number of deployments in the report.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    /// Whether the report holds no deployments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }

    /// Render the report as a column-aligned table.
    ///
    /// Column widths are computed from headers and content. An empty report
    /// renders as an empty string; the caller decides what to print instead.
    #[must_use]
    pub fn render_table(&self) -> String {
        if self.deployments.is_empty() {
            return String::new();
        }

        let rows: Vec<[String; 5]> = self
            .deployments
            .iter()
            .map(|d| {
                [
                    d.model_id.clone(),
                    d.image.clone(),
                    d.model_version.clone(),
                    d.desired_replicas.to_string(),
                    d.enclave.clone(),
                ]
            })
            .collect();

        let mut widths: [usize; 5] = TABLE_HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        let mut output = String::new();
        render_row(&mut output, &TABLE_HEADERS.map(|h| h.to_owned()), &widths);
        for row in &rows {
            render_row(&mut output, row, &widths);
        }

        output
    }
}

fn render_row(output: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| {
            let width = *width;
            format!("{cell:width$} ")
        })
        .collect();
    let _ = writeln!(output, "{}", line.join("|"));
}

//! Handler for `artiflow audit`.

use miette::Result;

use artiflow_core::scan::Severity;
use artiflow_ops::ops_audit::{self, AuditOptions, OutputFormat};
use artiflow_util::errors::ArtiflowError;

use crate::cli::TreeInputArgs;

pub async fn exec(
    input: TreeInputArgs,
    min_severity: Option<String>,
    fixable_only: bool,
    format: &str,
    flat: bool,
    project: Option<String>,
) -> Result<()> {
    let inputs = super::tree_inputs(input)?;
    let min_severity = match min_severity {
        Some(level) => Some(Severity::from_str(&level).ok_or_else(|| ArtiflowError::Generic {
            message: format!("Invalid severity '{level}': expected low, medium, high or critical"),
        })?),
        None => None,
    };
    let format = OutputFormat::from_str(format).ok_or_else(|| ArtiflowError::Generic {
        message: format!("Invalid format '{format}': expected table or json"),
    })?;

    let opts = AuditOptions {
        min_severity,
        fixable_only,
        format,
        flat,
        project,
    };
    ops_audit::audit(&inputs, &opts).await
}
